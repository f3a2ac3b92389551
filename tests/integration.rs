use chrono::{TimeZone, Utc};
use ferrodex::core::config::IndexConfig;
use ferrodex::query::parser;
use ferrodex::reader::index_reader::IndexReader;
use ferrodex::schema::schema::SearchType;
use ferrodex::search::searcher::{DirectoryFilter, Searcher};
use ferrodex::storage::layout::IndexLayout;
use ferrodex::writer::index_writer::IndexWriter;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn basic_add_and_search_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer
            .add("/src/main.rs", now(), 64, "fn main() { let result = compute(); }")
            .unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let query = parser::parse("compute").unwrap();
    let results = searcher.search(&query, SearchType::Contents, true, &[], 10).unwrap();
    assert_eq!(results.hits.len(), 1);
}

#[test]
fn case_insensitive_search_ignores_term_case() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer.add("/src/main.rs", now(), 1, "struct Widget { Name: String }").unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let sensitive_query = parser::parse("widget").unwrap();
    let sensitive_results = searcher
        .search(&sensitive_query, SearchType::Contents, true, &[], 10)
        .unwrap();
    assert!(sensitive_results.hits.is_empty(), "exact-case search should miss differently-cased term");

    let insensitive_query = parser::parse("widget").unwrap();
    let insensitive_results = searcher
        .search(&insensitive_query, SearchType::Contents, false, &[], 10)
        .unwrap();
    assert_eq!(insensitive_results.hits.len(), 1);
}

#[test]
fn update_replaces_old_content_and_keeps_path_unique() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer.add("/src/main.rs", now(), 1, "fn alpha() {}").unwrap();
        writer.commit().unwrap();
        writer.update("/src/main.rs", now(), 1, "fn beta() {}").unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    assert_eq!(reader.files().len(), 1);

    let old_query = parser::parse("alpha").unwrap();
    assert!(searcher
        .search(&old_query, SearchType::Contents, true, &[], 10)
        .unwrap()
        .hits
        .is_empty());

    let new_query = parser::parse("beta").unwrap();
    assert_eq!(
        searcher
            .search(&new_query, SearchType::Contents, true, &[], 10)
            .unwrap()
            .hits
            .len(),
        1
    );
}

#[test]
fn tags_are_extracted_and_searchable_independently_of_contents() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer
            .add(
                "/src/main.rs",
                now(),
                1,
                "// +#Important#+[https://example.com/doc]<reference>\nfn main() {}",
            )
            .unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    assert_eq!(reader.tags().len(), 1);
    let tag_doc = reader.tags()[0];
    assert_eq!(
        tag_doc.get(ferrodex::schema::schema::URL).unwrap().as_text(),
        Some("https://example.com/doc")
    );

    let query = parser::parse("Important").unwrap();
    let results = searcher.search(&query, SearchType::Tags, true, &[], 10).unwrap();
    assert_eq!(results.hits.len(), 1);

    let content_query = parser::parse("Important").unwrap();
    let content_results = searcher
        .search(&content_query, SearchType::Contents, true, &[], 10)
        .unwrap();
    assert!(content_results.hits.is_empty());
}

#[test]
fn directory_filter_scopes_search_to_matching_paths() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer.add("/src/core/lib.rs", now(), 1, "shared logic here").unwrap();
        writer.add("/tests/smoke.rs", now(), 1, "shared logic here").unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let query = parser::parse("shared").unwrap();
    let results = searcher
        .search(&query, SearchType::Contents, true, &[DirectoryFilter::new("/src", true, false)], 10)
        .unwrap();
    assert_eq!(results.hits.len(), 1);
}

#[test]
fn exclusive_directory_filter_vetoes_matching_non_exclusive_entries() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer.add("/a/x.c", now(), 1, "q").unwrap();
        writer.add("/a/gen/x.c", now(), 1, "q").unwrap();
        writer.add("/b/x.c", now(), 1, "q").unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let query = parser::parse("q").unwrap();

    // Non-recursive: only the file directly under /a/ matches, not /a/gen/.
    let results = searcher
        .search(&query, SearchType::Contents, true, &[DirectoryFilter::new("/a", false, false)], 10)
        .unwrap();
    assert_eq!(results.hits.len(), 1);

    // Recursive /a/ include, but exclusive /a/gen/ vetoes that subtree.
    let results = searcher
        .search(
            &query,
            SearchType::Contents,
            true,
            &[
                DirectoryFilter::new("/a", true, false),
                DirectoryFilter::new("/a/gen", true, true),
            ],
            10,
        )
        .unwrap();
    assert_eq!(results.hits.len(), 1);
}

#[test]
fn contents_match_reports_line_and_column_of_the_occurrence() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path().join("index"));
    let source_path = dir.path().join("a.txt");
    let contents = "Hello world\nfoo bar";
    std::fs::write(&source_path, contents).unwrap();

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer
            .add(source_path.to_str().unwrap(), now(), contents.len() as i64, contents)
            .unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(config.storage_path.clone());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let query = parser::parse("world").unwrap();
    let results = searcher.search(&query, SearchType::Contents, true, &[], 10).unwrap();
    assert_eq!(results.hits.len(), 1);
    let occurrences = &results.hits[0].occurrences;
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].line, 0);
    assert_eq!(occurrences[0].column, 6);
    assert_eq!(&contents[occurrences[0].match_start..occurrences[0].match_end], "world");
}

#[test]
fn case_insensitive_contents_match_reports_original_casing() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path().join("index"));
    let source_path = dir.path().join("a.txt");
    let contents = "Hello world\nfoo bar";
    std::fs::write(&source_path, contents).unwrap();

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer
            .add(source_path.to_str().unwrap(), now(), contents.len() as i64, contents)
            .unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(config.storage_path.clone());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let query = parser::parse("HELLO").unwrap();
    let results = searcher
        .search(&query, SearchType::Contents, false, &[], 10)
        .unwrap();
    assert_eq!(results.hits.len(), 1);
    let occurrences = &results.hits[0].occurrences;
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].line, 0);
    assert_eq!(occurrences[0].column, 0);
}

#[test]
fn tag_info_reports_total_count_document_count_and_links() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer
            .add(
                "/src/parser.rs",
                now(),
                1,
                "// +#Parser#+[http://x/p]<Parser docs>\nfn parse() {}",
            )
            .unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();

    let info = reader.get_tag_info("Parser").unwrap();
    assert_eq!(info.total_count, 1);
    assert_eq!(info.document_count, 1);
    assert_eq!(info.links.len(), 1);
    assert_eq!(info.links[0].url, "http://x/p");
    assert_eq!(info.links[0].caption.as_deref(), Some("Parser docs"));

    let searcher = Searcher::new(&reader);
    let query = parser::parse("Parser").unwrap();
    let results = searcher.search(&query, SearchType::Tags, true, &[], 10).unwrap();
    assert_eq!(results.hits.len(), 1);
}

#[test]
fn path_search_type_matches_on_indexed_path_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer.add("/src/core/widget.rs", now(), 1, "struct Widget;").unwrap();
        writer.add("/src/core/gadget.rs", now(), 1, "struct Gadget;").unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let query = parser::parse("widget").unwrap();
    let results = searcher.search(&query, SearchType::Path, false, &[], 10).unwrap();
    assert_eq!(results.hits.len(), 1);
}

#[test]
fn field_scoped_query_overrides_the_default_search_field() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer.add("/src/core/widget.rs", now(), 1, "fn render() {}").unwrap();
        writer.add("/src/core/other.rs", now(), 1, "fn render() {}").unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();
    let searcher = Searcher::new(&reader);

    let query = parser::parse("Path:widget").unwrap();
    let results = searcher.search(&query, SearchType::Contents, false, &[], 10).unwrap();
    assert_eq!(results.hits.len(), 1);
}

#[test]
fn file_list_mapping_skips_interleaved_tag_documents() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::default().with_storage_path(dir.path());

    {
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer
            .add("/a.rs", now(), 1, "// +#One#+[http://a] +#Two#+[http://b]\nfn a() {}")
            .unwrap();
        writer.add("/b.rs", now(), 1, "fn b() {}").unwrap();
        writer.commit().unwrap();
    }

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout).unwrap();

    assert_eq!(reader.tags().len(), 2);
    assert_eq!(reader.files().len(), 2);

    let first = reader.file_at(0).unwrap();
    let second = reader.file_at(1).unwrap();
    assert_ne!(first.doc_id, second.doc_id);
    assert!(reader.file_at(2).is_none());
}
