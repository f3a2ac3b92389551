//! Demonstrates committing in small batches instead of accumulating one
//! huge in-memory segment -- useful when indexing a large tree under a
//! constrained memory budget. Each `commit()` freezes the active segment to
//! disk and starts a fresh, empty one (§4.2), so peak memory is bounded by
//! `writer_batch_size` documents rather than the whole corpus.

use chrono::Utc;
use ferrodex::core::config::IndexConfig;
use ferrodex::reader::index_reader::IndexReader;
use ferrodex::storage::layout::IndexLayout;
use ferrodex::writer::index_writer::IndexWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = IndexConfig::default().with_storage_path(dir.path());
    let now = Utc::now();
    let batch_size = config.writer_batch_size;

    println!("committing every {} documents", batch_size);

    let mut writer = IndexWriter::open_or_create(&config)?;
    let total_files = 2500;
    for i in 0..total_files {
        let contents = format!("fn handler_{i}() {{ /* generated */ }}");
        writer.add(&format!("/src/generated_{i}.rs"), now, contents.len() as i64, &contents)?;
        if (i + 1) % batch_size == 0 {
            writer.commit()?;
            println!("  committed through file {}", i + 1);
        }
    }
    writer.commit()?;

    let layout = IndexLayout::new(dir.path());
    let reader = IndexReader::open(&layout)?;
    println!("\nfinal file count: {}", reader.files().len());

    Ok(())
}
