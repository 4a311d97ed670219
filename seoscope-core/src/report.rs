// Report rendering for a finished crawl

use crate::crawl::{CrawlSummary, extract_url_path};
use chrono::{DateTime, Utc};
use seoscope_scanner::result::{CrawlResult, FoundOn, LinkMap, PageRecord};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Json,
    Text,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "text" | "txt" => Some(ReportFormat::Text),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Text => "txt",
        }
    }
}

/// Pretty-printed crawl artifact.
pub fn generate_json_report(result: &CrawlResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

pub fn generate_text_report(result: &CrawlResult, generated_at: DateTime<Utc>) -> String {
    let summary = CrawlSummary::from_result(result);
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                          SEO Crawl Report\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("  Seed URL:     {}\n", result.url));
    report.push_str(&format!("  Domain:       {}\n", result.domain));
    report.push_str(&format!("  Root status:  {}\n", result.status));
    report.push_str(&format!(
        "  Generated:    {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages crawled:    {}\n", summary.pages));
    report.push_str(&format!("  Failed pages:     {}\n", summary.failed_pages));
    report.push_str(&format!("  Internal links:   {}\n", summary.internal_links));
    report.push_str(&format!("  External links:   {}\n", summary.external_links));
    report.push_str(&format!("  Broken links:     {}\n", summary.broken_links));
    report.push('\n');
    report.push_str(RULE);
    report.push_str("\n\n");

    for page in &result.pages {
        push_page_section(&mut report, page);
    }

    report.push_str("# Broken links:\n");
    push_link_list(&mut report, &result.broken, &result.found_on);
    report.push('\n');

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                          End of Report\n");
    report.push_str(RULE);
    report.push_str("\n\nGenerated by seoscope\n");

    report
}

fn push_page_section(report: &mut String, page: &PageRecord) {
    report.push_str(&format!(
        "## {} [{}]\n",
        extract_url_path(&page.url),
        page.status
    ));
    report.push_str(&format!("  {}\n", page.url));

    let findings: Vec<String> = [
        &page.meta_title.errors,
        &page.meta_title.warnings,
        &page.meta_description.errors,
        &page.meta_description.warnings,
        &page.headings.errors,
        &page.headings.warnings,
    ]
    .into_iter()
    .flatten()
    .cloned()
    .collect();

    if page.meta_title.valid {
        report.push_str(&format!(
            "  Title:        {} ({} chars)\n",
            page.meta_title.content, page.meta_title.length
        ));
    }
    report.push_str(&format!(
        "  Words: {}  H1: {}  Internal: {}  External: {}  Broken: {}\n",
        page.word_count,
        page.headings.h1_count,
        page.internal_links.len(),
        page.external_links.len(),
        page.broken_links.len()
    ));
    if page.images.total_images > 0 {
        report.push_str(&format!(
            "  Images: {}\n",
            page.images.alt_text_analysis.message
        ));
    }

    for finding in findings {
        report.push_str(&format!("    ! {}\n", finding));
    }
    for src in &page.images.alt_text_analysis.images_without_alt_details {
        report.push_str(&format!("    - missing alt: {}\n", src));
    }
    report.push('\n');
}

fn push_link_list(report: &mut String, links: &LinkMap, found_on: &FoundOn) {
    if links.is_empty() {
        report.push_str("  (none)\n");
        return;
    }
    for (target, anchors) in links {
        report.push_str(&format!("  {}\n", target));
        report.push_str(&format!("      anchors: {}\n", anchors.join(", ")));
        if let Some(sources) = found_on.get(target) {
            report.push_str(&format!("      found on: {}\n", sources.join(", ")));
        }
    }
}

/// Write `content` to `path`, creating parent directories as needed.
pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
