use anyhow::Result;

mod layout;
mod poppler;
mod report;
mod tables;

pub use poppler::command_version;
pub use report::PdfReport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Overlap with positive area; boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.top < other.bottom && other.top < self.bottom
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.top >= self.top && other.bottom <= self.bottom
    }

    pub fn vertically_overlaps(&self, other: &BoundingBox) -> bool {
        self.top < other.bottom && other.top < self.bottom
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBlock {
    pub bbox: BoundingBox,
    pub lines: Vec<String>,
}

pub type TableGrid = Vec<Vec<Option<String>>>;

/// Text-layer view of one page. Coordinates use a top-left origin in PDF units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub text: String,
    pub words: Vec<Word>,
    pub tables: Vec<TableGrid>,
}

impl PageLayout {
    pub fn empty(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Text of every word intersecting `region`, in reading rows.
    /// Returns `None` when `region` is not fully inside the page.
    pub fn text_in_region(&self, region: &BoundingBox) -> Option<String> {
        if !self.bounds().contains(region) {
            return None;
        }

        let mut hits = self
            .words
            .iter()
            .filter(|word| word.bbox.intersects(region))
            .collect::<Vec<&Word>>();
        hits.sort_by(|left, right| {
            left.bbox
                .top
                .total_cmp(&right.bbox.top)
                .then(left.bbox.x0.total_cmp(&right.bbox.x0))
        });

        Some(
            hits.iter()
                .map(|word| word.text.as_str())
                .collect::<Vec<&str>>()
                .join(" "),
        )
    }
}

/// A source report: text-layer analysis plus croppable, serializable pages.
pub trait ReportDocument {
    fn page_count(&self) -> usize;

    fn page(&self, index: usize) -> Option<&PageLayout>;

    /// Raises the visible lower bound of the page by `margin` units. Not idempotent.
    fn crop_footer(&mut self, index: usize, margin: f32) -> Result<()>;

    /// Serializes the given pages, in order, as one standalone document.
    fn render_pages(&self, indices: &[usize]) -> Result<Vec<u8>>;
}
