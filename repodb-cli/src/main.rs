use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use repodb_core::build::{self, BuildConfig};
use repodb_core::db::SchemaVersion;
use repodb_core::fetch;
use repodb_core::verify;

const DEFAULT_DB_ID: &str = "mrext/tapto";
const DEFAULT_LABEL: &str = "tapto";
const DEFAULT_URL_PREFIX: &str =
    "https://github.com/ZaparooProject/zaparoo-core/releases/download";
const DEFAULT_ZIP_STEM: &str = "zaparoo-mister_arm";
const DEFAULT_INSTALL_DIR: &str = "Scripts/";
const DEFAULT_FILES: &[&str] = &["zaparoo.sh"];
const DEFAULT_SCRATCH: &str = "_scratch";
const DEFAULT_OUT: &str = "tapto.json";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Schema {
    V1,
    V2,
    V3,
}

impl From<Schema> for SchemaVersion {
    fn from(s: Schema) -> Self {
        match s {
            Schema::V1 => SchemaVersion::V1,
            Schema::V2 => SchemaVersion::V2,
            Schema::V3 => SchemaVersion::V3,
        }
    }
}

#[derive(Parser)]
#[command(name = "repodb", version, about = "Generate update-repository databases for release artifacts")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch a release and write its repository database
    Generate {
        /// Release tag, e.g. v1.2.3
        tag: String,
        #[arg(long, value_enum, default_value_t = Schema::V3)]
        schema: Schema,
        #[arg(long, default_value = DEFAULT_SCRATCH)]
        scratch: PathBuf,
        #[arg(long, default_value = DEFAULT_OUT)]
        out: PathBuf,
        /// Use files already staged in the scratch dir; skip the download
        #[arg(long, default_value_t = false)]
        offline: bool,
        #[arg(long, default_value = DEFAULT_DB_ID)]
        db_id: String,
        #[arg(long, default_value = DEFAULT_LABEL)]
        label: String,
        #[arg(long, default_value = DEFAULT_URL_PREFIX)]
        url_prefix: String,
        #[arg(long, default_value = DEFAULT_ZIP_STEM)]
        zip_stem: String,
        #[arg(long, default_value = DEFAULT_INSTALL_DIR)]
        install_dir: String,
        /// Expected release file (repeatable); replaces the default list
        #[arg(long = "file")]
        files: Vec<String>,
        #[arg(long)]
        base_files_url: Option<String>,
        /// Mark entries as overwriting files already on the target
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Check an installed tree against a database
    Verify { db: PathBuf, root: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate {
            tag,
            schema,
            scratch,
            out,
            offline,
            db_id,
            label,
            url_prefix,
            zip_stem,
            install_dir,
            files,
            base_files_url,
            overwrite,
        } => {
            let cfg = BuildConfig {
                db_id,
                label,
                url_prefix,
                zip_stem,
                install_dir,
                files: if files.is_empty() {
                    DEFAULT_FILES.iter().map(|s| s.to_string()).collect()
                } else {
                    files
                },
                base_files_url,
                overwrite: overwrite.then_some(true),
                schema: schema.into(),
            };
            generate(&cfg, &tag, &scratch, &out, offline)?;
        }
        Cmd::Verify { db, root } => run_verify(&db, &root)?,
    }
    Ok(())
}

fn generate(cfg: &BuildConfig, tag: &str, scratch: &Path, out: &Path, offline: bool) -> Result<()> {
    if !offline {
        let archive = fetch::fetch_release(cfg, tag, scratch)?;
        eprintln!("Fetched {}", archive.display());
    }
    let db = build::build(cfg, tag, scratch)?;
    db.write(out)?;
    eprintln!("Wrote {} file entry(ies) to {}", db.file_count(), out.display());
    Ok(())
}

fn run_verify(db: &Path, root: &Path) -> Result<()> {
    let report = verify::verify(db, root)?;
    eprintln!(
        "Files ok={}, bad={}, missing={}",
        report.files_ok, report.files_bad, report.files_missing
    );
    if report.clean() {
        println!("OK");
    } else {
        println!("BAD");
    }
    Ok(())
}
