use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::db::{
    FileEntry, FolderEntry, RepoDb, SchemaVersion, ZipContentsFile, ZipEntry, ZipKind, ZipSummary,
};

/// Everything the builder needs to know about one release line. The CLI
/// supplies a default set and flags to override each field.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// Database identifier, e.g. `mrext/tapto`.
    pub db_id: String,
    /// Fixed label used as file tag (V2/V3) and as the zip id (V3).
    pub label: String,
    /// Release download URL prefix; the tag and asset name are appended.
    pub url_prefix: String,
    /// Archive name stem; the release version and `.zip` are appended.
    pub zip_stem: String,
    /// Install directory key prefix, with trailing slash, e.g. `Scripts/`.
    pub install_dir: String,
    /// Expected release file names, relative to the scratch directory.
    pub files: Vec<String>,
    pub base_files_url: Option<String>,
    pub overwrite: Option<bool>,
    pub schema: SchemaVersion,
}

impl BuildConfig {
    /// Release version: the tag with its leading `v` stripped.
    pub fn version(tag: &str) -> &str {
        tag.strip_prefix('v').unwrap_or(tag)
    }

    /// Archive filename for a release tag, e.g. `app-mister_arm-1.2.3.zip`.
    pub fn zip_filename(&self, tag: &str) -> String {
        format!("{}-{}.zip", self.zip_stem, Self::version(tag))
    }

    /// Base URL of the release the tag points at.
    pub fn release_url(&self, tag: &str) -> String {
        format!("{}/{}", self.url_prefix, tag)
    }

    fn asset_url(&self, tag: &str, name: &str) -> String {
        format!("{}/{}", self.release_url(tag), name)
    }

    /// Database key for an installed file: install dir + base name.
    fn install_key(&self, name: &str) -> String {
        format!("{}{}", self.install_dir, name)
    }

    fn file_tags(&self, name: &str) -> Vec<String> {
        match self.schema {
            SchemaVersion::V1 => {
                let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
                vec![stem.to_string()]
            }
            _ => vec![self.label.clone()],
        }
    }
}

/// MD5 and byte size of the file at `path`. The whole content is read into
/// memory; release artifacts are small scripts and binaries.
pub fn digest_file(path: &Path) -> Result<(String, u64)> {
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok((format!("{:x}", md5::compute(&data)), data.len() as u64))
}

/// Build the database for one release from files staged under `scratch`.
/// Fails on the first missing or unreadable expected file; there is no
/// partial-manifest fallback.
pub fn build(cfg: &BuildConfig, tag: &str, scratch: &Path) -> Result<RepoDb> {
    let timestamp = chrono::Utc::now().timestamp();
    match cfg.schema {
        SchemaVersion::V1 | SchemaVersion::V2 => build_direct(cfg, tag, scratch, timestamp),
        SchemaVersion::V3 => build_zip_wrapped(cfg, tag, scratch, timestamp),
    }
}

fn build_direct(cfg: &BuildConfig, tag: &str, scratch: &Path, timestamp: i64) -> Result<RepoDb> {
    let mut files = BTreeMap::new();
    for name in &cfg.files {
        let (hash, size) = digest_file(&scratch.join(name))?;
        files.insert(
            cfg.install_key(name),
            FileEntry {
                hash,
                size,
                url: Some(cfg.asset_url(tag, name)),
                overwrite: cfg.overwrite,
                reboot: match cfg.schema {
                    SchemaVersion::V1 => None,
                    _ => Some(true),
                },
                tags: cfg.file_tags(name),
                zip_id: None,
                zip_path: None,
            },
        );
    }

    let mut folders = BTreeMap::new();
    folders.insert(cfg.install_dir.clone(), FolderEntry::default());

    Ok(RepoDb {
        db_id: cfg.db_id.clone(),
        timestamp,
        files,
        folders,
        base_files_url: cfg.base_files_url.clone(),
        zips: BTreeMap::new(),
    })
}

fn build_zip_wrapped(
    cfg: &BuildConfig,
    tag: &str,
    scratch: &Path,
    timestamp: i64,
) -> Result<RepoDb> {
    let zip_name = cfg.zip_filename(tag);
    let (zip_hash, zip_size) = digest_file(&scratch.join(&zip_name))?;

    let mut files = BTreeMap::new();
    for name in &cfg.files {
        let (hash, size) = digest_file(&scratch.join(name))?;
        files.insert(
            cfg.install_key(name),
            FileEntry {
                hash,
                size,
                url: None,
                overwrite: cfg.overwrite,
                reboot: Some(true),
                tags: vec![cfg.label.clone()],
                zip_id: Some(cfg.label.clone()),
                zip_path: Some(name.clone()),
            },
        );
    }

    let mut folders = BTreeMap::new();
    folders.insert(
        cfg.install_dir.clone(),
        FolderEntry { tags: None, zip_id: Some(cfg.label.clone()) },
    );

    let mut zips = BTreeMap::new();
    zips.insert(
        cfg.label.clone(),
        ZipEntry {
            contents_file: ZipContentsFile {
                hash: zip_hash,
                size: zip_size,
                url: cfg.asset_url(tag, &zip_name),
            },
            description: format!("Extracting {} release", cfg.label),
            internal_summary: ZipSummary { files, folders },
            kind: ZipKind::ExtractSingleFiles,
        },
    );

    Ok(RepoDb {
        db_id: cfg.db_id.clone(),
        timestamp,
        files: BTreeMap::new(),
        folders: BTreeMap::new(),
        base_files_url: cfg.base_files_url.clone(),
        zips,
    })
}
