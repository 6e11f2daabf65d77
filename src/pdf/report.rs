use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};

use super::layout::{BboxLayoutParser, ParsedPage};
use super::poppler::{extract_bbox_layout, extract_page_texts};
use super::tables::reconstruct_tables;
use super::{PageLayout, ReportDocument};
use crate::cli::TextMode;

const MAX_PAGE_TREE_DEPTH: usize = 64;

/// A PDF opened twice: `lopdf` owns the page objects used for cropping and
/// serialization, pdftotext supplies the text layer. Both are indexed by
/// 0-based page position.
pub struct PdfReport {
    document: Document,
    page_ids: Vec<ObjectId>,
    layouts: Vec<PageLayout>,
}

impl PdfReport {
    pub fn open(pdf_path: &Path, text_mode: TextMode) -> Result<Self> {
        let document = Document::load(pdf_path)
            .with_context(|| format!("failed to load PDF: {}", pdf_path.display()))?;
        if document.is_encrypted() {
            bail!(
                "encrypted PDFs are not supported: {}",
                pdf_path.display()
            );
        }

        let texts = extract_page_texts(pdf_path, text_mode)?;
        let parser = BboxLayoutParser::new()?;
        let parsed = parser.parse(&extract_bbox_layout(pdf_path)?);

        let page_count = document.get_pages().len();
        if parsed.len() != page_count || texts.len() != page_count {
            warn!(
                path = %pdf_path.display(),
                pdf_pages = page_count,
                layout_pages = parsed.len(),
                text_pages = texts.len(),
                "text layer page count differs from document page count"
            );
        }

        let layouts = (0..page_count)
            .map(|index| build_layout(index, parsed.get(index), texts.get(index)))
            .collect::<Vec<PageLayout>>();

        Self::from_parts(document, layouts)
    }

    pub fn from_parts(document: Document, mut layouts: Vec<PageLayout>) -> Result<Self> {
        let page_ids = document.get_pages().into_values().collect::<Vec<ObjectId>>();

        layouts.truncate(page_ids.len());
        for (index, page_id) in page_ids.iter().enumerate() {
            if index < layouts.len() && layouts[index].width > 0.0 {
                continue;
            }

            let [x0, y0, x1, y1] = effective_box(&document, *page_id, b"MediaBox")?
                .with_context(|| format!("page {} has no MediaBox", index + 1))?;
            if index < layouts.len() {
                layouts[index].width = x1 - x0;
                layouts[index].height = y1 - y0;
            } else {
                layouts.push(PageLayout::empty(index, x1 - x0, y1 - y0));
            }
        }

        Ok(Self {
            document,
            page_ids,
            layouts,
        })
    }

    /// Visible region as `[x0, y0, x1, y1]` in PDF user space (bottom-left origin).
    pub fn visible_box(&self, index: usize) -> Result<[f32; 4]> {
        let page_id = self.page_id(index)?;
        let cropped = effective_box(&self.document, page_id, b"CropBox")?;
        match cropped {
            Some(value) => Ok(value),
            None => effective_box(&self.document, page_id, b"MediaBox")?
                .with_context(|| format!("page {} has no MediaBox", index + 1)),
        }
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids
            .get(index)
            .copied()
            .with_context(|| format!("page index {} out of range", index))
    }
}

impl ReportDocument for PdfReport {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page(&self, index: usize) -> Option<&PageLayout> {
        self.layouts.get(index)
    }

    fn crop_footer(&mut self, index: usize, margin: f32) -> Result<()> {
        let page_id = self.page_id(index)?;
        let [x0, y0, x1, y1] = self.visible_box(index)?;

        let lowered = y0 + margin;
        if lowered >= y1 {
            bail!(
                "footer margin {} leaves no visible area on page {}",
                margin,
                index + 1
            );
        }

        let page = self
            .document
            .get_dictionary_mut(page_id)
            .with_context(|| format!("failed to read page dictionary for page {}", index + 1))?;
        page.set(
            "CropBox",
            Object::Array(vec![
                Object::Real(x0),
                Object::Real(lowered),
                Object::Real(x1),
                Object::Real(y1),
            ]),
        );

        debug!(page = index + 1, lower_bound = lowered, "cropped footer band");
        Ok(())
    }

    fn render_pages(&self, indices: &[usize]) -> Result<Vec<u8>> {
        if indices.is_empty() {
            bail!("cannot render an empty page selection");
        }
        if let Some(index) = indices.iter().find(|index| **index >= self.page_ids.len()) {
            bail!("page index {} out of range", index);
        }

        let keep = indices
            .iter()
            .map(|index| *index as u32 + 1)
            .collect::<HashSet<u32>>();
        let removed = (1..=self.page_ids.len() as u32)
            .filter(|number| !keep.contains(number))
            .collect::<Vec<u32>>();

        let mut subset = self.document.clone();
        subset.delete_pages(&removed);
        subset.prune_objects();
        subset.compress();

        let mut buffer = Vec::new();
        subset
            .save_to(&mut buffer)
            .context("failed to serialize page selection")?;

        Ok(buffer)
    }
}

fn build_layout(index: usize, parsed: Option<&ParsedPage>, text: Option<&String>) -> PageLayout {
    let Some(parsed) = parsed else {
        return PageLayout {
            index,
            text: text.cloned().unwrap_or_default(),
            ..PageLayout::default()
        };
    };

    PageLayout {
        index,
        width: parsed.width,
        height: parsed.height,
        text: text.cloned().unwrap_or_else(|| parsed.plain_text()),
        words: parsed.words.clone(),
        tables: reconstruct_tables(&parsed.blocks),
    }
}

/// Resolves a page box, following inherited attributes up the page tree.
fn effective_box(document: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<[f32; 4]>> {
    let mut current = page_id;

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let node = document
            .get_dictionary(current)
            .with_context(|| format!("failed to read page tree node {:?}", current))?;

        if let Ok(value) = node.get(key) {
            return parse_box(document, value).map(Some);
        }

        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Ok(None),
        }
    }

    bail!("page tree deeper than {} levels", MAX_PAGE_TREE_DEPTH)
}

fn parse_box(document: &Document, value: &Object) -> Result<[f32; 4]> {
    let (_, value) = document
        .dereference(value)
        .context("failed to resolve page box")?;
    let entries = value.as_array().context("page box is not an array")?;
    if entries.len() != 4 {
        bail!("page box has {} entries, expected 4", entries.len());
    }

    let mut coords = [0.0_f32; 4];
    for (slot, entry) in coords.iter_mut().zip(entries) {
        let (_, entry) = document
            .dereference(entry)
            .context("failed to resolve page box entry")?;
        *slot = entry.as_float().context("page box entry is not a number")?;
    }

    Ok([
        coords[0].min(coords[2]),
        coords[1].min(coords[3]),
        coords[0].max(coords[2]),
        coords[1].max(coords[3]),
    ])
}

#[cfg(test)]
mod tests {
    use lopdf::{Stream, dictionary};

    use super::*;

    fn sample_document(page_count: usize) -> Document {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let mut kids = Vec::new();
        for _ in 0..page_count {
            let content_id = document.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        };
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        document
    }

    #[test]
    fn from_parts_sizes_missing_layouts_from_inherited_media_box() {
        let report = PdfReport::from_parts(sample_document(2), Vec::new())
            .expect("report should build");

        assert_eq!(report.page_count(), 2);
        let page = report.page(1).expect("second page layout");
        assert_eq!(page.index, 1);
        assert_eq!(page.width, 595.0);
        assert_eq!(page.height, 842.0);
        assert!(page.words.is_empty());
    }

    #[test]
    fn crop_footer_raises_lower_bound_by_margin() {
        let mut report = PdfReport::from_parts(sample_document(1), Vec::new())
            .expect("report should build");
        let before = report.visible_box(0).expect("visible box before crop");

        report.crop_footer(0, 40.0).expect("crop should succeed");

        let after = report.visible_box(0).expect("visible box after crop");
        assert_eq!(after[1] - before[1], 40.0);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[3], before[3]);

        let reread = report.visible_box(0).expect("visible box reread");
        assert_eq!(reread, after);
    }

    #[test]
    fn crop_footer_applied_twice_crops_twice() {
        let mut report = PdfReport::from_parts(sample_document(1), Vec::new())
            .expect("report should build");

        report.crop_footer(0, 40.0).expect("first crop");
        report.crop_footer(0, 40.0).expect("second crop");

        let after = report.visible_box(0).expect("visible box");
        assert_eq!(after[1], 80.0);
    }

    #[test]
    fn crop_footer_rejects_margin_taller_than_page() {
        let mut report = PdfReport::from_parts(sample_document(1), Vec::new())
            .expect("report should build");
        assert!(report.crop_footer(0, 900.0).is_err());
    }

    #[test]
    fn render_pages_keeps_only_selected_pages_with_crop() {
        let mut report = PdfReport::from_parts(sample_document(3), Vec::new())
            .expect("report should build");
        report.crop_footer(2, 40.0).expect("crop should succeed");

        let bytes = report.render_pages(&[0, 2]).expect("render should succeed");
        let rendered = Document::load_mem(&bytes).expect("rendered PDF should load");
        let pages = rendered.get_pages();
        assert_eq!(pages.len(), 2);

        let last_id = *pages.get(&2).expect("second rendered page");
        let crop = effective_box(&rendered, last_id, b"CropBox")
            .expect("crop box lookup")
            .expect("crop box present");
        assert_eq!(crop, [0.0, 40.0, 595.0, 842.0]);
    }

    #[test]
    fn render_pages_rejects_empty_and_out_of_range_selection() {
        let report = PdfReport::from_parts(sample_document(1), Vec::new())
            .expect("report should build");
        assert!(report.render_pages(&[]).is_err());
        assert!(report.render_pages(&[1]).is_err());
    }
}
