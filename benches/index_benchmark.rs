use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrodex::core::config::IndexConfig;
use ferrodex::query::parser;
use ferrodex::reader::index_reader::IndexReader;
use ferrodex::schema::schema::SearchType;
use ferrodex::search::searcher::Searcher;
use ferrodex::storage::layout::IndexLayout;
use ferrodex::writer::index_writer::IndexWriter;
use rand::Rng;

fn random_source_file(rng: &mut impl Rng, lines: usize) -> String {
    let words = ["fn", "let", "mut", "struct", "impl", "match", "return", "self", "Vec", "Option"];
    let mut out = String::new();
    for _ in 0..lines {
        for _ in 0..8 {
            out.push_str(words[rng.gen_range(0..words.len())]);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

fn bench_add_and_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("writer_add_commit");
    for &file_count in &[100usize, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(file_count), &file_count, |b, &file_count| {
            b.iter(|| {
                let dir = tempfile::tempdir().unwrap();
                let config = IndexConfig::default().with_storage_path(dir.path());
                let mut writer = IndexWriter::open_or_create(&config).unwrap();
                let mut rng = rand::thread_rng();
                let now = Utc::now();
                for i in 0..file_count {
                    let contents = random_source_file(&mut rng, 20);
                    writer
                        .add(&format!("/src/file_{}.rs", i), now, contents.len() as i64, &contents)
                        .unwrap();
                }
                writer.commit().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());
    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        for i in 0..1000 {
            let contents = random_source_file(&mut rng, 30);
            writer
                .add(&format!("/src/file_{}.rs", i), now, contents.len() as i64, &contents)
                .unwrap();
        }
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);
    let query = parser::parse("fn AND struct").unwrap();

    c.bench_function("search_and_query", |b| {
        b.iter(|| {
            searcher
                .search(&query, SearchType::Contents, true, &[], 20)
                .unwrap()
                .hits
        });
    });
}

criterion_group!(benches, bench_add_and_commit, bench_search);
criterion_main!(benches);
