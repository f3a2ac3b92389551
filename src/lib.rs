//! A source-code-oriented full-text indexing and search engine.
//!
//! ```text
//! file_source  -> enumerates and filters candidate paths
//! analysis     -> tokenizers + analyzers turn file text into terms
//! schema       -> the fixed set of fields file/tag documents carry
//! index        -> per-field term dictionaries and posting lists
//! storage      -> segment framing, compression, the write lock
//! writer       -> IndexWriter: add/update/remove/clear/commit
//! reader       -> IndexReader: immutable snapshot over committed segments
//! query        -> parses query strings into an AST
//! search       -> Searcher evaluates the AST, scores hits, highlights
//! ```
//!
//! A typical session opens an [`writer::index_writer::IndexWriter`], adds
//! or updates files, commits, then opens an
//! [`reader::index_reader::IndexReader`] against the same directory to run
//! queries through [`search::searcher::Searcher`].

pub mod analysis;
pub mod core;
pub mod file_source;
pub mod index;
pub mod query;
pub mod reader;
pub mod schema;
pub mod search;
pub mod storage;
pub mod writer;
