use std::fmt;

use serde::Serialize;

pub const UNKNOWN_DEPARTMENT: &str = "UNKNOWN";
pub const UNKNOWN_CUSTOMER_ID: &str = "99999";
pub const UNKNOWN_INVOICE_NUMBER: &str = "0000";
pub const UNKNOWN_REPORT_PERIOD: &str = "00-0000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub customer_id: String,
    pub invoice_number: String,
    pub report_period: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            customer_id: UNKNOWN_CUSTOMER_ID.to_string(),
            invoice_number: UNKNOWN_INVOICE_NUMBER.to_string(),
            report_period: UNKNOWN_REPORT_PERIOD.to_string(),
        }
    }
}

impl Metadata {
    pub fn missing_fields(&self) -> Vec<MetadataField> {
        let mut missing = Vec::new();
        if self.customer_id == UNKNOWN_CUSTOMER_ID {
            missing.push(MetadataField::CustomerId);
        }
        if self.invoice_number == UNKNOWN_INVOICE_NUMBER {
            missing.push(MetadataField::InvoiceNumber);
        }
        if self.report_period == UNKNOWN_REPORT_PERIOD {
            missing.push(MetadataField::ReportPeriod);
        }
        missing
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    CustomerId,
    InvoiceNumber,
    ReportPeriod,
}

impl MetadataField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomerId => "customer_id",
            Self::InvoiceNumber => "invoice_number",
            Self::ReportPeriod => "report_period",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitWarning {
    MetadataFieldMissing { field: MetadataField },
    UnassignedPages { count: usize },
}

impl fmt::Display for SplitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetadataFieldMissing { field } => {
                write!(f, "{} not found on first page; using placeholder", field.as_str())
            }
            Self::UnassignedPages { count } => {
                write!(f, "{} pages could not be assigned to a department", count)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentBucket {
    pub department: String,
    pub pages: Vec<usize>,
}

/// Department code to ordered page indices, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DepartmentBuckets {
    buckets: Vec<DepartmentBucket>,
}

impl DepartmentBuckets {
    pub fn push_page(&mut self, department: &str, page_index: usize) {
        match self
            .buckets
            .iter_mut()
            .find(|bucket| bucket.department == department)
        {
            Some(bucket) => bucket.pages.push(page_index),
            None => self.buckets.push(DepartmentBucket {
                department: department.to_string(),
                pages: vec![page_index],
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepartmentBucket> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, department: &str) -> Option<&DepartmentBucket> {
        self.buckets
            .iter()
            .find(|bucket| bucket.department == department)
    }

    pub fn unknown(&self) -> Option<&DepartmentBucket> {
        self.get(UNKNOWN_DEPARTMENT)
            .filter(|bucket| !bucket.pages.is_empty())
    }

    pub fn total_pages(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.pages.len()).sum()
    }

    pub fn department_of(&self, page_index: usize) -> Option<&str> {
        self.buckets
            .iter()
            .find(|bucket| bucket.pages.contains(&page_index))
            .map(|bucket| bucket.department.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    pub path: String,
    pub sha256: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitSettings {
    pub footer_margin: f32,
    pub reading_direction: String,
    pub text_mode: String,
    pub metadata_search_width: f32,
    pub department_search_width: f32,
    pub department_vertical_tolerance: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketSummary {
    pub department: String,
    pub page_numbers: Vec<usize>,
    pub output_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub source: SourceEntry,
    pub settings: SplitSettings,
    pub metadata: Metadata,
    pub buckets: Vec<BucketSummary>,
    pub archive_path: Option<String>,
    pub outputs: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metadata_reports_every_field_missing() {
        let metadata = Metadata::default();
        assert_eq!(
            metadata.missing_fields(),
            vec![
                MetadataField::CustomerId,
                MetadataField::InvoiceNumber,
                MetadataField::ReportPeriod
            ]
        );
    }

    #[test]
    fn buckets_preserve_first_encounter_order() {
        let mut buckets = DepartmentBuckets::default();
        buckets.push_page("40010", 0);
        buckets.push_page("30063", 1);
        buckets.push_page("40010", 2);

        let order = buckets
            .iter()
            .map(|bucket| bucket.department.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(order, vec!["40010", "30063"]);
        assert_eq!(buckets.get("40010").map(|b| b.pages.clone()), Some(vec![0, 2]));
        assert_eq!(buckets.department_of(1), Some("30063"));
        assert_eq!(buckets.total_pages(), 3);
        assert!(buckets.unknown().is_none());
    }

    #[test]
    fn warnings_render_readable_messages() {
        let missing = SplitWarning::MetadataFieldMissing {
            field: MetadataField::ReportPeriod,
        };
        assert_eq!(
            missing.to_string(),
            "report_period not found on first page; using placeholder"
        );
        assert_eq!(
            SplitWarning::UnassignedPages { count: 3 }.to_string(),
            "3 pages could not be assigned to a department"
        );
    }
}
