use anyhow::{Context, Result};
use regex::Regex;

use super::labels::{
    CUSTOMER_ID_DIRECT_MIN_DIGITS, CUSTOMER_ID_SPATIAL_MIN_DIGITS, CUSTOMER_LABEL,
    INVOICE_NUMBER_MIN_DIGITS, REPORT_DATE, REPORT_LABEL, digit_run, label_then_digits,
};
use super::text_locator::{SearchDirection, TextLocator};
use crate::model::{Metadata, UNKNOWN_CUSTOMER_ID, UNKNOWN_INVOICE_NUMBER, UNKNOWN_REPORT_PERIOD};
use crate::pdf::{PageLayout, ReportDocument};

struct LabeledNumber {
    direct: Regex,
    label: Regex,
    spatial_digits: Regex,
}

pub struct MetadataExtractor {
    customer: LabeledNumber,
    invoice: LabeledNumber,
    date_regex: Regex,
    locator: TextLocator,
    search_width: f32,
}

impl MetadataExtractor {
    pub fn new(locator: TextLocator, search_width: f32) -> Result<Self> {
        Ok(Self {
            customer: LabeledNumber {
                direct: Regex::new(&label_then_digits(
                    CUSTOMER_LABEL,
                    CUSTOMER_ID_DIRECT_MIN_DIGITS,
                ))
                .context("failed to compile customer id regex")?,
                label: Regex::new(CUSTOMER_LABEL).context("failed to compile customer label regex")?,
                spatial_digits: Regex::new(&digit_run(CUSTOMER_ID_SPATIAL_MIN_DIGITS))
                    .context("failed to compile customer id digit regex")?,
            },
            invoice: LabeledNumber {
                direct: Regex::new(&label_then_digits(REPORT_LABEL, INVOICE_NUMBER_MIN_DIGITS))
                    .context("failed to compile invoice number regex")?,
                label: Regex::new(REPORT_LABEL).context("failed to compile report label regex")?,
                spatial_digits: Regex::new(&digit_run(INVOICE_NUMBER_MIN_DIGITS))
                    .context("failed to compile invoice number digit regex")?,
            },
            date_regex: Regex::new(REPORT_DATE)
                .context("failed to compile report date regex")?,
            locator,
            search_width,
        })
    }

    /// Reads metadata from the first page. Every field falls back to its
    /// placeholder independently; a document without pages yields all three.
    pub fn extract<D: ReportDocument + ?Sized>(&self, document: &D) -> Metadata {
        if document.page_count() == 0 {
            return Metadata::default();
        }

        match document.page(0) {
            Some(page) => self.extract_from_page(page),
            None => Metadata::default(),
        }
    }

    pub fn extract_from_page(&self, page: &PageLayout) -> Metadata {
        Metadata {
            customer_id: self
                .labeled_number(page, &self.customer)
                .unwrap_or_else(|| UNKNOWN_CUSTOMER_ID.to_string()),
            invoice_number: self
                .labeled_number(page, &self.invoice)
                .unwrap_or_else(|| UNKNOWN_INVOICE_NUMBER.to_string()),
            report_period: report_period(&self.date_regex, &page.text)
                .unwrap_or_else(|| UNKNOWN_REPORT_PERIOD.to_string()),
        }
    }

    fn labeled_number(&self, page: &PageLayout, field: &LabeledNumber) -> Option<String> {
        if let Some(value) = field
            .direct
            .captures(&page.text)
            .and_then(|captures| captures.get(1))
        {
            return Some(value.as_str().to_string());
        }

        // Values follow their label in reading order; the opposite side is a fallback.
        let mut nearby = self.locator.locate(
            page,
            &field.label,
            SearchDirection::After,
            self.search_width,
        );
        nearby.extend(self.locator.locate(
            page,
            &field.label,
            SearchDirection::Before,
            self.search_width,
        ));

        nearby
            .iter()
            .find_map(|fragment| field.spatial_digits.find(fragment))
            .map(|run| run.as_str().to_string())
    }
}

/// `MM-YYYY` from the first `D/D/YYYY` token. The second component is the
/// month unless it cannot be one while the first can.
fn report_period(date_regex: &Regex, text: &str) -> Option<String> {
    let captures = date_regex.captures(text)?;
    let first = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let second = captures.get(2)?.as_str().parse::<u32>().ok()?;
    let year = captures.get(3)?.as_str();

    let month = if second > 12 && first <= 12 { first } else { second };
    Some(format!("{:02}-{}", month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_regex() -> Regex {
        Regex::new(REPORT_DATE).expect("date regex")
    }

    #[test]
    fn report_period_takes_second_component_as_month() {
        let regex = date_regex();
        assert_eq!(report_period(&regex, "11/12/2025").as_deref(), Some("12-2025"));
        assert_eq!(report_period(&regex, "3/4/2024").as_deref(), Some("04-2024"));
        assert_eq!(report_period(&regex, "25/03/2024").as_deref(), Some("03-2024"));
        assert_eq!(report_period(&regex, "5-1-2023").as_deref(), Some("01-2023"));
    }

    #[test]
    fn report_period_falls_back_to_first_component_when_second_is_not_a_month() {
        let regex = date_regex();
        assert_eq!(report_period(&regex, "12/25/2024").as_deref(), Some("12-2024"));
    }

    #[test]
    fn report_period_uses_first_date_only() {
        let regex = date_regex();
        assert_eq!(
            report_period(&regex, "from 01/02/2024 to 28/02/2024").as_deref(),
            Some("02-2024")
        );
        assert!(report_period(&regex, "no date here 2024").is_none());
    }
}
