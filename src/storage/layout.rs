//! On-disk directory layout for an index: one lock file, one manifest, and
//! one file per segment. Adapted from the teacher's `storage::layout`, cut
//! down to the single-segment-directory shape this crate's writer uses
//! (no generational/merge-policy file naming).

use std::path::{Path, PathBuf};

pub struct IndexLayout {
    root: PathBuf,
}

impl IndexLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        IndexLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.bin")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("write.lock")
    }

    pub fn segment_path(&self, segment_id: u64) -> PathBuf {
        self.root.join(format!("segment-{:020}.seg", segment_id))
    }

    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}
