use anyhow::{Context, Result};
use regex::{Captures, Regex};

use super::{BoundingBox, LayoutBlock, Word};
use crate::util::decode_xml_entities;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
    pub blocks: Vec<LayoutBlock>,
}

impl ParsedPage {
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter().map(String::as_str))
            .collect::<Vec<&str>>()
            .join("\n")
    }
}

pub struct BboxLayoutParser {
    page_regex: Regex,
    block_regex: Regex,
    line_regex: Regex,
    word_regex: Regex,
}

impl BboxLayoutParser {
    pub fn new() -> Result<Self> {
        let coords = r#"xMin="([-0-9.]+)" yMin="([-0-9.]+)" xMax="([-0-9.]+)" yMax="([-0-9.]+)""#;

        Ok(Self {
            page_regex: Regex::new(r#"(?s)<page width="([0-9.]+)" height="([0-9.]+)">(.*?)</page>"#)
                .context("failed to compile bbox page regex")?,
            block_regex: Regex::new(&format!(r"(?s)<block {coords}>(.*?)</block>"))
                .context("failed to compile bbox block regex")?,
            line_regex: Regex::new(&format!(r"(?s)<line {coords}>(.*?)</line>"))
                .context("failed to compile bbox line regex")?,
            word_regex: Regex::new(&format!(r"(?s)<word {coords}>(.*?)</word>"))
                .context("failed to compile bbox word regex")?,
        })
    }

    pub fn parse(&self, xhtml: &str) -> Vec<ParsedPage> {
        self.page_regex
            .captures_iter(xhtml)
            .map(|captures| {
                let width = capture_f32(&captures, 1);
                let height = capture_f32(&captures, 2);
                let body = captures.get(3).map(|value| value.as_str()).unwrap_or("");
                self.parse_page(width, height, body)
            })
            .collect()
    }

    fn parse_page(&self, width: f32, height: f32, body: &str) -> ParsedPage {
        let mut page = ParsedPage {
            width,
            height,
            ..ParsedPage::default()
        };

        for block in self.block_regex.captures_iter(body) {
            let block_body = block.get(5).map(|value| value.as_str()).unwrap_or("");
            let mut lines = Vec::new();

            for line in self.line_regex.captures_iter(block_body) {
                let line_body = line.get(5).map(|value| value.as_str()).unwrap_or("");
                let words = self.parse_words(line_body);
                if words.is_empty() {
                    continue;
                }

                lines.push(
                    words
                        .iter()
                        .map(|word| word.text.as_str())
                        .collect::<Vec<&str>>()
                        .join(" "),
                );
                page.words.extend(words);
            }

            if lines.is_empty() {
                continue;
            }
            page.blocks.push(LayoutBlock {
                bbox: capture_bbox(&block),
                lines,
            });
        }

        page
    }

    fn parse_words(&self, line_body: &str) -> Vec<Word> {
        self.word_regex
            .captures_iter(line_body)
            .filter_map(|captures| {
                let raw = captures.get(5).map(|value| value.as_str()).unwrap_or("");
                let text = decode_xml_entities(raw).trim().to_string();
                if text.is_empty() {
                    return None;
                }
                Some(Word {
                    text,
                    bbox: capture_bbox(&captures),
                })
            })
            .collect()
    }
}

fn capture_f32(captures: &Captures<'_>, index: usize) -> f32 {
    captures
        .get(index)
        .and_then(|value| value.as_str().parse::<f32>().ok())
        .unwrap_or(0.0)
}

fn capture_bbox(captures: &Captures<'_>) -> BoundingBox {
    BoundingBox::new(
        capture_f32(captures, 1),
        capture_f32(captures, 2),
        capture_f32(captures, 3),
        capture_f32(captures, 4),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
<doc>
  <page width="595.276000" height="841.890000">
    <flow>
      <block xMin="400.000000" yMin="50.000000" xMax="520.000000" yMax="80.000000">
        <line xMin="400.000000" yMin="50.000000" xMax="520.000000" yMax="62.000000">
          <word xMin="480.000000" yMin="50.000000" xMax="520.000000" yMax="62.000000">לקוח</word>
          <word xMin="470.000000" yMin="50.000000" xMax="475.000000" yMax="62.000000">:</word>
          <word xMin="400.000000" yMin="50.000000" xMax="460.000000" yMax="62.000000">13548</word>
        </line>
        <line xMin="400.000000" yMin="66.000000" xMax="520.000000" yMax="78.000000">
          <word xMin="480.000000" yMin="66.000000" xMax="520.000000" yMax="78.000000">דו&quot;ח</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="595.276000" height="841.890000">
  </page>
</doc>
</body>
</html>"#;

    #[test]
    fn parse_extracts_pages_words_and_blocks() {
        let parser = BboxLayoutParser::new().expect("parser should compile");
        let pages = parser.parse(SAMPLE);

        assert_eq!(pages.len(), 2);
        let first = &pages[0];
        assert!((first.width - 595.276).abs() < 0.01);
        assert_eq!(first.words.len(), 4);
        assert_eq!(first.words[2].text, "13548");
        assert_eq!(first.words[2].bbox, BoundingBox::new(400.0, 50.0, 460.0, 62.0));
        assert_eq!(first.words[3].text, "דו\"ח");

        assert_eq!(first.blocks.len(), 1);
        assert_eq!(first.blocks[0].lines, vec!["לקוח : 13548", "דו\"ח"]);
        assert_eq!(first.plain_text(), "לקוח : 13548\nדו\"ח");

        assert!(pages[1].words.is_empty());
        assert!(pages[1].blocks.is_empty());
    }
}
