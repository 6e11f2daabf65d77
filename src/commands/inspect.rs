use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::InspectArgs;
use crate::commands::split::{
    ClassificationHit, ClassificationStrategy, DepartmentClassifier, MetadataExtractor,
    TextLocator, classify_pages, ensure_processable, fold_classifications,
};
use crate::model::{DepartmentBuckets, Metadata, UNKNOWN_DEPARTMENT};
use crate::pdf::{PdfReport, ReportDocument};

#[derive(Debug, Serialize)]
struct PageInspection {
    page_number: usize,
    department: String,
    matched_department: Option<String>,
    strategy: Option<ClassificationStrategy>,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    source: String,
    page_count: usize,
    metadata: Metadata,
    missing_metadata: Vec<String>,
    pages: Vec<PageInspection>,
    buckets: DepartmentBuckets,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let document = PdfReport::open(&args.input, args.extraction.text_mode)?;
    ensure_processable(&document, &args.input)?;

    let locator = TextLocator::new(args.extraction.reading_direction);
    let extractor = MetadataExtractor::new(locator, args.extraction.metadata_search_width)?;
    let classifier = DepartmentClassifier::new(
        locator,
        args.extraction.department_search_width,
        args.extraction.department_vertical_tolerance,
    )?;

    let metadata = extractor.extract(&document);
    let hits = classify_pages(&document, &classifier);
    let report = build_report(
        args.input.display().to_string(),
        document.page_count(),
        metadata,
        hits,
    );

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialize inspect report")?;
        println!("{rendered}");
        return Ok(());
    }

    info!(
        source = %report.source,
        pages = report.page_count,
        customer_id = %report.metadata.customer_id,
        invoice_number = %report.metadata.invoice_number,
        report_period = %report.metadata.report_period,
        "inspected report"
    );
    for field in &report.missing_metadata {
        warn!(field = %field, "metadata field missing");
    }
    for page in &report.pages {
        info!(
            page = page.page_number,
            department = %page.department,
            matched = %page.matched_department.as_deref().unwrap_or("-"),
            strategy = page.strategy.map(ClassificationStrategy::as_str).unwrap_or("carried"),
            "page classification"
        );
    }
    for bucket in report.buckets.iter() {
        info!(
            department = %bucket.department,
            pages = bucket.pages.len(),
            "department bucket"
        );
    }

    Ok(())
}

fn build_report(
    source: String,
    page_count: usize,
    metadata: Metadata,
    hits: Vec<Option<ClassificationHit>>,
) -> InspectReport {
    let buckets = fold_classifications(
        hits.iter()
            .map(|hit| hit.as_ref().map(|hit| hit.department.as_str())),
    );

    let pages = hits
        .into_iter()
        .enumerate()
        .map(|(index, hit)| PageInspection {
            page_number: index + 1,
            department: buckets
                .department_of(index)
                .unwrap_or(UNKNOWN_DEPARTMENT)
                .to_string(),
            matched_department: hit.as_ref().map(|hit| hit.department.clone()),
            strategy: hit.map(|hit| hit.strategy),
        })
        .collect();

    InspectReport {
        source,
        page_count,
        missing_metadata: metadata
            .missing_fields()
            .into_iter()
            .map(|field| field.as_str().to_string())
            .collect(),
        metadata,
        pages,
        buckets,
    }
}
