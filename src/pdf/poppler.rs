use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::cli::TextMode;

pub fn extract_page_texts(pdf_path: &Path, text_mode: TextMode) -> Result<Vec<String>> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(text_mode.as_flag())
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_form_feed_pages(&String::from_utf8_lossy(&output.stdout)))
}

pub fn extract_bbox_layout(pdf_path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-bbox-layout")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| {
            format!(
                "failed to execute pdftotext -bbox-layout for {}",
                pdf_path.display()
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext -bbox-layout returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// pdftotext terminates every page with a form feed, blank pages included.
fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect::<Vec<String>>();

    if raw.ends_with('\u{000C}') {
        pages.pop();
    }

    pages
}

pub fn command_version(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {} {}", program, args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} {} failed: {}", program, args.join(" "), stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    let version_line = source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("unknown");

    Ok(version_line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_form_feed_pages_keeps_blank_pages() {
        let pages = split_form_feed_pages("first\n\u{000C}\u{000C}third\n\u{000C}");
        assert_eq!(pages, vec!["first\n", "", "third\n"]);
    }

    #[test]
    fn split_form_feed_pages_keeps_unterminated_tail() {
        let pages = split_form_feed_pages("only page");
        assert_eq!(pages, vec!["only page"]);
    }
}
