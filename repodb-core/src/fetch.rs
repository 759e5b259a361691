use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::build::BuildConfig;

/// Download `url` to `dest` via wget. No retries; a non-zero exit aborts
/// the run.
pub fn download(url: &str, dest: &Path) -> Result<()> {
    let status = Command::new("wget")
        .arg(url)
        .arg("-O")
        .arg(dest)
        .status()
        .context("spawn wget")?;
    if !status.success() {
        bail!("wget {} failed: {}", url, status);
    }
    Ok(())
}

/// Extract every entry of `archive` under `dest`. Entries whose names
/// would escape the destination are skipped; unix permission bits are
/// restored.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let f = File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip =
        zip::ZipArchive::new(f).with_context(|| format!("read archive {}", archive.display()))?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let rel = match entry.enclosed_name() {
            Some(p) => p,
            None => continue,
        };
        let out = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile =
            File::create(&out).with_context(|| format!("create {}", out.display()))?;
        io::copy(&mut entry, &mut outfile)?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

/// Download the release archive named by `cfg` for `tag` and extract it
/// into `scratch`. Returns the local archive path.
pub fn fetch_release(cfg: &BuildConfig, tag: &str, scratch: &Path) -> Result<PathBuf> {
    fs::create_dir_all(scratch).with_context(|| format!("create {}", scratch.display()))?;
    let zip_name = cfg.zip_filename(tag);
    let archive = scratch.join(&zip_name);
    download(&format!("{}/{}", cfg.release_url(tag), zip_name), &archive)?;
    extract_zip(&archive, scratch)?;
    Ok(archive)
}
