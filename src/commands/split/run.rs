use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use super::classifier::DepartmentClassifier;
use super::metadata::MetadataExtractor;
use super::output_assembly::{
    AssembledOutput, archive_filename, assemble, remove_outputs, write_archive,
    write_loose_files,
};
use super::segmentation::{PageProgress, segment};
use super::text_locator::TextLocator;
use crate::cli::{ExtractionArgs, SplitArgs};
use crate::model::{
    BucketSummary, Metadata, SourceEntry, SplitRunManifest, SplitSettings, SplitWarning,
    ToolVersions,
};
use crate::pdf::{PdfReport, ReportDocument, command_version};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

pub fn run(args: SplitArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    info!(input = %args.input.display(), run_id = %run_id, "starting split");

    let mut document = PdfReport::open(&args.input, args.extraction.text_mode)?;
    ensure_processable(&document, &args.input)?;

    let locator = TextLocator::new(args.extraction.reading_direction);
    let extractor = MetadataExtractor::new(locator, args.extraction.metadata_search_width)?;
    let classifier = DepartmentClassifier::new(
        locator,
        args.extraction.department_search_width,
        args.extraction.department_vertical_tolerance,
    )?;

    let metadata = extractor.extract(&document);
    info!(
        customer_id = %metadata.customer_id,
        invoice_number = %metadata.invoice_number,
        report_period = %metadata.report_period,
        "extracted report metadata"
    );

    let mut warnings = metadata
        .missing_fields()
        .into_iter()
        .map(|field| SplitWarning::MetadataFieldMissing { field })
        .collect::<Vec<SplitWarning>>();

    let segmentation = segment(&mut document, &classifier, args.footer_margin, log_progress)?;
    let assembled = assemble(&document, &metadata, &segmentation.buckets)?;
    warnings.extend(assembled.warnings.iter().cloned());

    for warning in &warnings {
        warn!(warning = %warning, "split warning");
    }
    log_summary(&assembled, document.page_count());

    if args.dry_run {
        info!(
            outputs = assembled.entries.len(),
            "dry-run complete; no files written"
        );
        return Ok(());
    }

    // Manifest inputs are gathered before any output reaches the disk.
    let tool_versions = ToolVersions {
        pdftotext: command_version("pdftotext", &["-v"])?,
    };
    let source_sha256 = sha256_file(&args.input)?;

    let written = write_outputs(&args, &metadata, &assembled)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output_dir.join("manifests").join(format!(
            "split_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    let manifest = SplitRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        finished_at: now_utc_string(),
        command: render_split_command(&args),
        tool_versions,
        source: SourceEntry {
            path: args.input.display().to_string(),
            sha256: source_sha256,
            page_count: document.page_count(),
        },
        settings: settings_for(&args),
        metadata: metadata.clone(),
        buckets: bucket_summaries(&assembled),
        archive_path: written
            .archive_path
            .as_ref()
            .map(|path| path.display().to_string()),
        outputs: written.names.clone(),
        warnings: warnings.iter().map(ToString::to_string).collect(),
    };
    if let Err(err) = write_json_pretty(&manifest_path, &manifest) {
        remove_outputs(&written.paths);
        return Err(err);
    }

    info!(path = %manifest_path.display(), "wrote split run manifest");
    info!(
        departments = assembled.entries.len(),
        pages = document.page_count(),
        "split completed"
    );

    Ok(())
}

struct WrittenOutputs {
    archive_path: Option<PathBuf>,
    paths: Vec<PathBuf>,
    names: Vec<String>,
}

fn write_outputs(
    args: &SplitArgs,
    metadata: &Metadata,
    assembled: &AssembledOutput,
) -> Result<WrittenOutputs> {
    ensure_directory(&args.output_dir)?;

    if args.archive {
        let archive_path = args.output_dir.join(archive_filename(metadata));
        write_archive(&archive_path, &assembled.entries)?;
        info!(path = %archive_path.display(), "wrote output archive");

        return Ok(WrittenOutputs {
            paths: vec![archive_path.clone()],
            archive_path: Some(archive_path),
            names: assembled
                .entries
                .iter()
                .map(|entry| entry.filename.clone())
                .collect(),
        });
    }

    let written = write_loose_files(&args.output_dir, &assembled.entries)?;
    for path in &written {
        info!(path = %path.display(), "wrote output document");
    }

    Ok(WrittenOutputs {
        archive_path: None,
        names: written.iter().map(|path| path.display().to_string()).collect(),
        paths: written,
    })
}

/// Zero pages or no text layer at all (scanned input) fail the whole run.
pub fn ensure_processable<D: ReportDocument + ?Sized>(document: &D, input: &Path) -> Result<()> {
    let page_count = document.page_count();
    if page_count == 0 {
        bail!("no pages found in {}", input.display());
    }

    let has_text = (0..page_count)
        .filter_map(|index| document.page(index))
        .any(|page| !page.words.is_empty() || !page.text.trim().is_empty());
    if !has_text {
        bail!(
            "no extractable text in {}; image-only documents are not supported",
            input.display()
        );
    }

    Ok(())
}

fn log_progress(progress: &PageProgress<'_>) {
    let percent = (progress.page_index + 1) * 100 / progress.total_pages.max(1);
    info!(
        page = progress.page_index + 1,
        total = progress.total_pages,
        percent = percent,
        department = %progress.current_department,
        matched_by = progress.hit.map(|hit| hit.strategy.as_str()).unwrap_or("carried"),
        "processing page"
    );
}

fn log_summary(assembled: &AssembledOutput, total_pages: usize) {
    for entry in &assembled.entries {
        info!(
            department = %entry.department,
            pages = entry.pages.len(),
            output = %entry.filename,
            "department output"
        );
    }
    info!(
        departments = assembled.entries.len(),
        pages = total_pages,
        "segmentation summary"
    );
}

fn bucket_summaries(assembled: &AssembledOutput) -> Vec<BucketSummary> {
    assembled
        .entries
        .iter()
        .map(|entry| BucketSummary {
            department: entry.department.clone(),
            page_numbers: entry.pages.iter().map(|index| index + 1).collect(),
            output_name: entry.filename.clone(),
        })
        .collect()
}

fn settings_for(args: &SplitArgs) -> SplitSettings {
    SplitSettings {
        footer_margin: args.footer_margin,
        reading_direction: args.extraction.reading_direction.as_str().to_string(),
        text_mode: args.extraction.text_mode.as_str().to_string(),
        metadata_search_width: args.extraction.metadata_search_width,
        department_search_width: args.extraction.department_search_width,
        department_vertical_tolerance: args.extraction.department_vertical_tolerance,
    }
}

pub(super) fn render_split_command(args: &SplitArgs) -> String {
    let mut command = vec![
        "deptsplit".to_string(),
        "split".to_string(),
        args.input.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
    ];

    if args.archive {
        command.push("--archive".to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    command.push("--footer-margin".to_string());
    command.push(args.footer_margin.to_string());
    push_extraction_args(&mut command, &args.extraction);

    command.join(" ")
}

fn push_extraction_args(command: &mut Vec<String>, extraction: &ExtractionArgs) {
    command.push("--reading-direction".to_string());
    command.push(extraction.reading_direction.as_str().to_string());
    command.push("--text-mode".to_string());
    command.push(extraction.text_mode.as_str().to_string());
    command.push("--metadata-search-width".to_string());
    command.push(extraction.metadata_search_width.to_string());
    command.push("--department-search-width".to_string());
    command.push(extraction.department_search_width.to_string());
    command.push("--department-vertical-tolerance".to_string());
    command.push(extraction.department_vertical_tolerance.to_string());
}
