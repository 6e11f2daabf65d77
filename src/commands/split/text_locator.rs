use regex::Regex;

use crate::cli::ReadingDirection;
use crate::pdf::{BoundingBox, PageLayout, Word};

pub const VERTICAL_TOLERANCE: f32 = 2.0;

/// `Before` is the reading-start side of a label, `After` the reading-end side.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SearchDirection {
    Before,
    After,
}

#[derive(Copy, Clone, Debug)]
pub struct TextLocator {
    reading_direction: ReadingDirection,
}

impl TextLocator {
    pub fn new(reading_direction: ReadingDirection) -> Self {
        Self { reading_direction }
    }

    /// Text found `width` units beside each word matching `label`, one entry
    /// per occurrence that yielded text. Regions leaving the page are skipped.
    pub fn locate(
        &self,
        page: &PageLayout,
        label: &Regex,
        direction: SearchDirection,
        width: f32,
    ) -> Vec<String> {
        label_words(page, label)
            .filter_map(|word| page.text_in_region(&self.region_beside(&word.bbox, direction, width)))
            .filter(|text| !text.trim().is_empty())
            .collect()
    }

    /// Text inside a box extending `horizontal` units both ways and
    /// `vertical` units above and below each label occurrence.
    pub fn surrounding(
        &self,
        page: &PageLayout,
        label: &Regex,
        horizontal: f32,
        vertical: f32,
    ) -> Vec<String> {
        label_words(page, label)
            .filter_map(|word| {
                let region = BoundingBox::new(
                    word.bbox.x0 - horizontal,
                    word.bbox.top - vertical,
                    word.bbox.x1 + horizontal,
                    word.bbox.bottom + vertical,
                );
                page.text_in_region(&region)
            })
            .filter(|text| !text.trim().is_empty())
            .collect()
    }

    fn region_beside(
        &self,
        label: &BoundingBox,
        direction: SearchDirection,
        width: f32,
    ) -> BoundingBox {
        let top = label.top - VERTICAL_TOLERANCE;
        let bottom = label.bottom + VERTICAL_TOLERANCE;

        if self.searches_left(direction) {
            BoundingBox::new(label.x0 - width, top, label.x0, bottom)
        } else {
            BoundingBox::new(label.x1, top, label.x1 + width, bottom)
        }
    }

    fn searches_left(&self, direction: SearchDirection) -> bool {
        matches!(
            (self.reading_direction, direction),
            (ReadingDirection::Ltr, SearchDirection::Before)
                | (ReadingDirection::Rtl, SearchDirection::After)
        )
    }
}

fn label_words<'a>(page: &'a PageLayout, label: &'a Regex) -> impl Iterator<Item = &'a Word> {
    page.words.iter().filter(move |word| label.is_match(&word.text))
}
