use anyhow::Result;
use std::path::Path;

use crate::build::digest_file;
use crate::db::{FileEntry, RepoDb};

#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub files_ok: u64,
    pub files_bad: u64,
    pub files_missing: u64,
}

impl VerifyReport {
    pub fn clean(&self) -> bool {
        self.files_bad == 0 && self.files_missing == 0
    }
}

/// Check an installed tree under `root` against the database at `db_path`:
/// every file entry, top-level and zip-internal, is re-hashed and
/// size-checked at its install key.
pub fn verify(db_path: &Path, root: &Path) -> Result<VerifyReport> {
    let db = RepoDb::read(db_path)?;
    let mut report = VerifyReport::default();

    let mut check = |key: &str, fe: &FileEntry| -> Result<()> {
        let path = root.join(key);
        if !path.exists() {
            report.files_missing += 1;
            return Ok(());
        }
        let (hash, size) = digest_file(&path)?;
        if hash == fe.hash && size == fe.size {
            report.files_ok += 1;
        } else {
            report.files_bad += 1;
        }
        Ok(())
    };

    for (key, fe) in &db.files {
        check(key, fe)?;
    }
    for z in db.zips.values() {
        for (key, fe) in &z.internal_summary.files {
            check(key, fe)?;
        }
    }
    Ok(report)
}
