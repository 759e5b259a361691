use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

/// Database schema revision. V1/V2 emit per-file download URLs and differ
/// only in tagging; V3 wraps all files inside one referenced archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Per-file URLs, each file tagged with its own name minus extension.
    V1,
    /// Per-file URLs, fixed database label as tag, reboot flag set.
    V2,
    /// Zip-wrapped: files are extracted from one referenced archive.
    V3,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RepoDb {
    pub db_id: String,
    /// Generation time, seconds since the epoch.
    pub timestamp: i64,
    pub files: BTreeMap<String, FileEntry>,
    pub folders: BTreeMap<String, FolderEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_files_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zips: BTreeMap<String, ZipEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileEntry {
    /// Lowercase MD5 hex digest of the file's exact bytes.
    pub hash: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reboot: Option<bool>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_id: Option<String>,
    /// Path of this file inside the containing archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_path: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FolderEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_id: Option<String>,
}

/// Descriptor of a companion archive holding the actual payload files.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ZipEntry {
    pub contents_file: ZipContentsFile,
    pub description: String,
    pub internal_summary: ZipSummary,
    pub kind: ZipKind,
}

/// The archive itself: where to fetch it and how to check it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ZipContentsFile {
    pub hash: String,
    pub size: u64,
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ZipSummary {
    pub files: BTreeMap<String, FileEntry>,
    pub folders: BTreeMap<String, FolderEntry>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ZipKind {
    ExtractSingleFiles,
}

impl RepoDb {
    /// Render as 4-space-indented JSON. Absent optional fields are omitted
    /// per the serde attributes on the schema, so the document never
    /// contains a `null`.
    pub fn to_json(&self) -> Result<String> {
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.serialize(&mut ser).context("serialize database")?;
        Ok(String::from_utf8(buf)?)
    }

    /// Serialize first, then write in one shot. A failed build can never
    /// leave a partial database on disk.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<RepoDb> {
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        serde_json::from_reader(f).with_context(|| format!("parse {}", path.display()))
    }

    /// Count of file entries across the top level and all zip summaries.
    pub fn file_count(&self) -> usize {
        self.files.len()
            + self.zips.values().map(|z| z.internal_summary.files.len()).sum::<usize>()
    }
}
