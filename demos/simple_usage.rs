//! End-to-end walkthrough: open a writer, index a few files, commit, then
//! open a reader and run searches across all three search types.

use chrono::Utc;
use ferrodex::core::config::IndexConfig;
use ferrodex::query::parser;
use ferrodex::reader::index_reader::IndexReader;
use ferrodex::schema::schema::SearchType;
use ferrodex::search::searcher::{DirectoryFilter, Searcher};
use ferrodex::storage::layout::IndexLayout;
use ferrodex::writer::index_writer::IndexWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = IndexConfig::default().with_storage_path(dir.path());
    let now = Utc::now();

    println!("Indexing files...");
    {
        let mut writer = IndexWriter::open_or_create(&config)?;
        writer.add(
            "/src/main.rs",
            now,
            42,
            "fn main() {\n    // +#Entrypoint#+[https://example.com/docs]<program entry>\n    run();\n}",
        )?;
        writer.add("/src/lib.rs", now, 30, "pub fn run() { println!(\"hi\"); }")?;
        writer.add("/README.md", now, 10, "# Demo project\nSee main.rs for the entry point.")?;
        writer.commit()?;
    }
    println!("  indexed 3 files\n");

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout)?;
    let searcher = Searcher::new(&reader);

    println!("Searching Contents for \"run\"...");
    let query = parser::parse("run")?;
    let results = searcher.search(&query, SearchType::Contents, true, &[], 10)?;
    for hit in &results.hits {
        println!("  hit: score={:.3} occurrences={}", hit.score, hit.occurrences.len());
    }

    println!("\nSearching Tags for \"Entrypoint\"...");
    let tag_query = parser::parse("Entrypoint")?;
    let tag_results = searcher.search(&tag_query, SearchType::Tags, true, &[], 10)?;
    println!("  {} hit(s)", tag_results.hits.len());
    if let Some(info) = reader.get_tag_info("Entrypoint") {
        println!("  total_count={} document_count={}", info.total_count, info.document_count);
        for link in &info.links {
            println!("  link: {} ({:?})", link.url, link.caption);
        }
    }

    println!("\nSearching Path under /src...");
    let path_query = parser::parse("src")?;
    let path_results = searcher.search(&path_query, SearchType::Path, false, &[DirectoryFilter::new("/src", true, false)], 10)?;
    println!("  {} hit(s)", path_results.hits.len());

    println!("\nfile_types: {:?}", reader.file_types());
    println!("total files in index: {}", reader.files().len());

    Ok(())
}
