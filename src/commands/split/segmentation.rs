use anyhow::{Context, Result};

use super::classifier::{ClassificationHit, DepartmentClassifier};
use crate::model::{DepartmentBuckets, UNKNOWN_DEPARTMENT};
use crate::pdf::ReportDocument;

/// Carry-forward scan state: the department of the most recent classified page.
#[derive(Debug, Clone)]
pub struct SegmentationState {
    current_department: String,
    buckets: DepartmentBuckets,
}

impl Default for SegmentationState {
    fn default() -> Self {
        Self {
            current_department: UNKNOWN_DEPARTMENT.to_string(),
            buckets: DepartmentBuckets::default(),
        }
    }
}

impl SegmentationState {
    pub fn advance(&mut self, page_index: usize, classified: Option<&str>) {
        if let Some(department) = classified {
            self.current_department = department.to_string();
        }
        self.buckets.push_page(&self.current_department, page_index);
    }

    pub fn current_department(&self) -> &str {
        &self.current_department
    }

    pub fn finish(self) -> DepartmentBuckets {
        self.buckets
    }
}

pub struct PageProgress<'a> {
    pub page_index: usize,
    pub total_pages: usize,
    pub current_department: &'a str,
    pub hit: Option<&'a ClassificationHit>,
}

pub struct Segmentation {
    pub buckets: DepartmentBuckets,
    pub hits: Vec<Option<ClassificationHit>>,
}

/// Folds per-page classifications, in page order, into department buckets.
pub fn fold_classifications<I, S>(classifications: I) -> DepartmentBuckets
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    classifications
        .into_iter()
        .enumerate()
        .fold(SegmentationState::default(), |mut state, (page_index, classified)| {
            state.advance(page_index, classified.as_ref().map(|code| code.as_ref()));
            state
        })
        .finish()
}

pub fn classify_pages<D: ReportDocument + ?Sized>(
    document: &D,
    classifier: &DepartmentClassifier,
) -> Vec<Option<ClassificationHit>> {
    (0..document.page_count())
        .map(|index| document.page(index).and_then(|page| classifier.classify(page)))
        .collect()
}

/// Crops the footer of every page, classifies it and assigns it to a bucket,
/// strictly in ascending page order.
pub fn segment<D, F>(
    document: &mut D,
    classifier: &DepartmentClassifier,
    footer_margin: f32,
    mut on_page: F,
) -> Result<Segmentation>
where
    D: ReportDocument + ?Sized,
    F: FnMut(&PageProgress<'_>),
{
    let total_pages = document.page_count();
    let mut state = SegmentationState::default();
    let mut hits = Vec::with_capacity(total_pages);

    for page_index in 0..total_pages {
        document.crop_footer(page_index, footer_margin)?;

        let page = document
            .page(page_index)
            .with_context(|| format!("missing text layer for page {}", page_index + 1))?;
        let hit = classifier.classify(page);
        state.advance(page_index, hit.as_ref().map(|hit| hit.department.as_str()));

        on_page(&PageProgress {
            page_index,
            total_pages,
            current_department: state.current_department(),
            hit: hit.as_ref(),
        });
        hits.push(hit);
    }

    Ok(Segmentation {
        buckets: state.finish(),
        hits,
    })
}
