//! Workspace bundles: a zip holding a manifest and the timetable database.
//!
//! The manifest pins the database by SHA-256. Import extracts to a side file,
//! checks the digest, and only then swaps it in. A bare sqlite file is also
//! accepted and copied as-is.

use crate::db::DB_FILE;
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/timetable.sqlite3";
pub const BUNDLE_FORMAT: &str = "timetable-workspace-v1";
const RAW_SQLITE_FORMAT: &str = "sqlite3";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleManifest {
    format: String,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    app_version: String,
    #[serde(default)]
    exported_at: String,
    #[serde(default)]
    source_workspace: String,
    db_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub db_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Bundle,
    RawSqlite,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn sniff(path: &Path) -> anyhow::Result<InputKind> {
    let mut head = Vec::with_capacity(SQLITE_MAGIC.len());
    File::open(path)
        .with_context(|| format!("failed to open {}", path.to_string_lossy()))?
        .take(SQLITE_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .context("failed to read file signature")?;
    if head.starts_with(ZIP_MAGIC) {
        Ok(InputKind::Bundle)
    } else if head.starts_with(SQLITE_MAGIC) {
        Ok(InputKind::RawSqlite)
    } else {
        bail!("{} is neither a workspace bundle nor a sqlite database", path.to_string_lossy())
    }
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join(DB_FILE);
    if !db_path.is_file() {
        bail!("workspace database not found: {}", db_path.to_string_lossy());
    }
    let db_bytes = std::fs::read(&db_path)
        .with_context(|| format!("failed to read database {}", db_path.to_string_lossy()))?;
    let manifest = BundleManifest {
        format: BUNDLE_FORMAT.to_string(),
        version: 1,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        source_workspace: workspace_path.to_string_lossy().to_string(),
        db_sha256: sha256_hex(&db_bytes),
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create bundle {}", out_path.to_string_lossy()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 2] = [(MANIFEST_ENTRY, &manifest_bytes), (DB_ENTRY, &db_bytes)];
    for (name, bytes) in parts {
        zip.start_file(name, opts)
            .with_context(|| format!("failed to start bundle entry {}", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write bundle entry {}", name))?;
    }
    zip.finish().context("failed to finalize bundle")?;

    Ok(ExportSummary {
        bundle_format: manifest.format,
        entry_count: parts.len(),
        db_sha256: manifest.db_sha256,
    })
}

/// Database bytes of a bundle, after checking them against the manifest.
fn verified_database(in_path: &Path) -> anyhow::Result<Vec<u8>> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let manifest: BundleManifest = {
        let entry = archive
            .by_name(MANIFEST_ENTRY)
            .context("bundle missing manifest.json")?;
        serde_json::from_reader(entry).context("manifest.json is invalid")?
    };
    if manifest.format != BUNDLE_FORMAT {
        bail!("unsupported bundle format: {}", manifest.format);
    }

    let mut db_bytes = Vec::new();
    archive
        .by_name(DB_ENTRY)
        .with_context(|| format!("bundle missing {}", DB_ENTRY))?
        .read_to_end(&mut db_bytes)
        .context("failed to extract database entry")?;

    let expected = manifest.db_sha256.to_ascii_lowercase();
    let actual = sha256_hex(&db_bytes);
    if actual != expected {
        return Err(anyhow!(
            "database checksum mismatch (manifest {}, bundle {})",
            expected,
            actual
        ));
    }
    Ok(db_bytes)
}

/// Writes next to the live database, then renames over it.
fn swap_in_database(workspace_path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dst = workspace_path.join(DB_FILE);
    let staged = workspace_path.join(format!("{}.importing", DB_FILE));
    let mut out = File::create(&staged)
        .with_context(|| format!("failed to stage database {}", staged.to_string_lossy()))?;
    out.write_all(bytes)
        .and_then(|_| out.sync_all())
        .context("failed to write staged database")?;
    drop(out);
    std::fs::rename(&staged, &dst)
        .with_context(|| format!("failed to move staged database to {}", dst.to_string_lossy()))
}

/// Restores a bundle (or a bare sqlite file) into `workspace_path`. Nothing
/// in the workspace changes unless the input is fully valid.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let kind = sniff(in_path)?;
    let db_bytes = match kind {
        InputKind::Bundle => verified_database(in_path)?,
        InputKind::RawSqlite => std::fs::read(in_path)
            .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?,
    };

    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!("failed to create workspace {}", workspace_path.to_string_lossy())
    })?;
    swap_in_database(workspace_path, &db_bytes)?;

    let detected = match kind {
        InputKind::Bundle => BUNDLE_FORMAT,
        InputKind::RawSqlite => RAW_SQLITE_FORMAT,
    };
    Ok(ImportSummary {
        bundle_format_detected: detected.to_string(),
    })
}
