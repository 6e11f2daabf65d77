use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use super::labels::{DEPARTMENT_CODE_LEN, DEPARTMENT_LABEL, department_adjacent_code, digit_run};
use super::text_locator::TextLocator;
use crate::pdf::PageLayout;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStrategy {
    DirectText,
    TableCell,
    Spatial,
}

impl ClassificationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectText => "direct_text",
            Self::TableCell => "table_cell",
            Self::Spatial => "spatial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationHit {
    pub department: String,
    pub strategy: ClassificationStrategy,
}

type Strategy = fn(&DepartmentClassifier, &PageLayout) -> Option<String>;

// Cheapest and most reliable first; later entries only recover from layout damage.
const CASCADE: [(ClassificationStrategy, Strategy); 3] = [
    (
        ClassificationStrategy::DirectText,
        DepartmentClassifier::from_direct_text,
    ),
    (
        ClassificationStrategy::TableCell,
        DepartmentClassifier::from_table_cells,
    ),
    (
        ClassificationStrategy::Spatial,
        DepartmentClassifier::from_spatial_proximity,
    ),
];

pub struct DepartmentClassifier {
    adjacent_code: Regex,
    code_run: Regex,
    label: Regex,
    locator: TextLocator,
    horizontal_reach: f32,
    vertical_reach: f32,
}

impl DepartmentClassifier {
    pub fn new(locator: TextLocator, horizontal_reach: f32, vertical_reach: f32) -> Result<Self> {
        Ok(Self {
            adjacent_code: Regex::new(&department_adjacent_code())
                .context("failed to compile department code regex")?,
            code_run: Regex::new(&digit_run(DEPARTMENT_CODE_LEN))
                .context("failed to compile department digit regex")?,
            label: Regex::new(DEPARTMENT_LABEL)
                .context("failed to compile department label regex")?,
            locator,
            horizontal_reach,
            vertical_reach,
        })
    }

    pub fn classify(&self, page: &PageLayout) -> Option<ClassificationHit> {
        CASCADE.iter().find_map(|(strategy, run)| {
            run(self, page).map(|department| ClassificationHit {
                department,
                strategy: *strategy,
            })
        })
    }

    pub fn from_direct_text(&self, page: &PageLayout) -> Option<String> {
        let captures = self.adjacent_code.captures(&page.text)?;
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|value| value.as_str().to_string())
    }

    /// Only the first cell carrying the label is considered, and only its own text.
    pub fn from_table_cells(&self, page: &PageLayout) -> Option<String> {
        let labeled_cell = page
            .tables
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .find(|cell| self.label.is_match(cell))?;

        self.department_code_in(labeled_cell)
    }

    pub fn from_spatial_proximity(&self, page: &PageLayout) -> Option<String> {
        self.locator
            .surrounding(page, &self.label, self.horizontal_reach, self.vertical_reach)
            .iter()
            .find_map(|fragment| self.department_code_in(fragment))
    }

    /// First digit run of exactly the code length; longer runs are skipped.
    fn department_code_in(&self, text: &str) -> Option<String> {
        self.code_run
            .find_iter(text)
            .map(|run| run.as_str())
            .find(|run| run.len() == DEPARTMENT_CODE_LEN)
            .map(str::to_string)
    }
}
