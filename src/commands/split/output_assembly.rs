use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::model::{DepartmentBuckets, Metadata, SplitWarning, UNKNOWN_DEPARTMENT};
use crate::pdf::ReportDocument;
use crate::util::{ensure_directory, write_bytes};

pub const UNKNOWN_OUTPUT_PREFIX: &str = "Unknown";
pub const OUTPUT_EXTENSION: &str = "pdf";

pub struct OutputEntry {
    pub filename: String,
    pub department: String,
    pub pages: Vec<usize>,
    pub bytes: Vec<u8>,
}

pub struct AssembledOutput {
    pub entries: Vec<OutputEntry>,
    pub warnings: Vec<SplitWarning>,
}

pub fn output_filename(metadata: &Metadata, department: &str) -> String {
    if department == UNKNOWN_DEPARTMENT {
        return format!(
            "{}_{}.{}",
            UNKNOWN_OUTPUT_PREFIX, metadata.customer_id, OUTPUT_EXTENSION
        );
    }

    format!(
        "{}_{}_{}_{}.{}",
        metadata.customer_id,
        metadata.report_period,
        metadata.invoice_number,
        department,
        OUTPUT_EXTENSION
    )
}

pub fn archive_filename(metadata: &Metadata) -> String {
    format!("Split_{}_{}.zip", metadata.customer_id, metadata.report_period)
}

pub fn bucket_warnings(buckets: &DepartmentBuckets) -> Vec<SplitWarning> {
    buckets
        .unknown()
        .map(|bucket| SplitWarning::UnassignedPages {
            count: bucket.pages.len(),
        })
        .into_iter()
        .collect()
}

/// Serializes every non-empty bucket, in bucket order, as one output document.
pub fn assemble<D: ReportDocument + ?Sized>(
    document: &D,
    metadata: &Metadata,
    buckets: &DepartmentBuckets,
) -> Result<AssembledOutput> {
    let mut entries = Vec::with_capacity(buckets.len());

    for bucket in buckets.iter().filter(|bucket| !bucket.pages.is_empty()) {
        let bytes = document.render_pages(&bucket.pages).with_context(|| {
            format!("failed to assemble output for department {}", bucket.department)
        })?;
        entries.push(OutputEntry {
            filename: output_filename(metadata, &bucket.department),
            department: bucket.department.clone(),
            pages: bucket.pages.clone(),
            bytes,
        });
    }

    Ok(AssembledOutput {
        entries,
        warnings: bucket_warnings(buckets),
    })
}

/// Writes one file per entry into `output_dir`. When a write fails, every
/// file this call already wrote is removed before the error is returned.
pub fn write_loose_files(output_dir: &Path, entries: &[OutputEntry]) -> Result<Vec<PathBuf>> {
    ensure_directory(output_dir)?;

    let mut written = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = output_dir.join(&entry.filename);
        if let Err(err) = write_bytes(&path, &entry.bytes) {
            written.push(path);
            remove_outputs(&written);
            return Err(err);
        }
        written.push(path);
    }

    Ok(written)
}

/// Writes the zip archive to `path`; a half-written archive is removed on failure.
pub fn write_archive(path: &Path, entries: &[OutputEntry]) -> Result<()> {
    let bytes = build_archive(entries)?;
    if let Err(err) = write_bytes(path, &bytes) {
        remove_outputs(&[path.to_path_buf()]);
        return Err(err);
    }

    Ok(())
}

/// Best-effort removal of output files. Paths that are not regular files are left alone.
pub fn remove_outputs(paths: &[PathBuf]) {
    for path in paths.iter().filter(|path| path.is_file()) {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "failed to remove partial output");
        }
    }
}

/// Packs the entries into one zip archive. An empty entry list yields an empty archive.
pub fn build_archive(entries: &[OutputEntry]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer
            .start_file(entry.filename.as_str(), options)
            .with_context(|| format!("failed to add {} to archive", entry.filename))?;
        writer
            .write_all(&entry.bytes)
            .with_context(|| format!("failed to write {} into archive", entry.filename))?;
    }

    let cursor = writer.finish().context("failed to finalize archive")?;
    Ok(cursor.into_inner())
}
