//! Per-page SEO extraction.
//!
//! Markup analysis ([`analyze_markup`]) is synchronous and network free; the
//! [`PageAnalyzer`] adds broken-link probing on top and produces the final
//! [`PageRecord`].

use crate::checker::LinkChecker;
use crate::fetch::{FetchResponse, Fetcher};
use crate::markup::{self, Document};
use crate::normalize::{LinkScope, NormalizedUrl, ResolvedHref, classify, resolve_href};
use crate::result::{
    AltTextAnalysis, HeadingReport, ImageReport, LinkMap, MetaData, MetaField, PageRecord, PageStatus,
};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub const TITLE_MIN_LENGTH: usize = 30;
pub const TITLE_MAX_LENGTH: usize = 65;
pub const DESCRIPTION_MIN_LENGTH: usize = 120;
pub const DESCRIPTION_MAX_LENGTH: usize = 320;

/// Anchor text recorded for links without any text.
pub const NO_ANCHOR_TEXT: &str = "[No Text]";

const HEAD_MISSING: &str = "Head tag is missing";
const NO_H1: &str = "No H1 heading found";

/// An outbound link found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdge {
    /// Normalized target, or the raw href when it could not be resolved.
    pub target: String,
    pub anchor_text: String,
    pub scope: LinkScope,
    /// The href could not be turned into a URL. Always external and broken.
    pub malformed: bool,
}

/// Everything extracted from a page's markup.
#[derive(Debug, Clone, Default)]
pub struct PageAnalysis {
    pub meta_title: MetaField,
    pub meta_description: MetaField,
    pub meta_data: MetaData,
    pub headings: HeadingReport,
    pub images: ImageReport,
    pub word_count: usize,
    pub links: Vec<LinkEdge>,
}

/// Extract SEO signals and outbound links from `markup`.
///
/// `base` is the URL relative references resolve against (usually the URL
/// after redirects); `root_location` is the crawl's `host[:port]`.
pub fn analyze_markup(base: &Url, markup: &str, root_location: &str) -> PageAnalysis {
    let document = Document::parse(markup);
    let (meta_title, meta_description) = analyze_meta(&document);

    PageAnalysis {
        meta_title,
        meta_description,
        meta_data: collect_meta_data(&document),
        headings: analyze_headings(&document),
        images: analyze_images(&document, base),
        word_count: count_words(&document),
        links: extract_links(&document, base, root_location),
    }
}

fn analyze_meta(document: &Document) -> (MetaField, MetaField) {
    let Some(head) = document.head() else {
        let missing = MetaField {
            errors: vec![HEAD_MISSING.to_string()],
            ..MetaField::default()
        };
        return (missing.clone(), missing);
    };

    let title = markup::find_all_in(head, "title").next().map(markup::text);
    let description = markup::find_all_in(head, "meta")
        .find(|meta| {
            markup::attr(*meta, "name")
                .map(|name| name.trim().eq_ignore_ascii_case("description"))
                .unwrap_or(false)
        })
        .and_then(|meta| markup::attr(meta, "content"))
        .map(str::to_string);

    (
        validate_meta_field("Meta title", title.as_deref(), TITLE_MIN_LENGTH, TITLE_MAX_LENGTH),
        validate_meta_field(
            "Meta description",
            description.as_deref(),
            DESCRIPTION_MIN_LENGTH,
            DESCRIPTION_MAX_LENGTH,
        ),
    )
}

/// Every head `<meta>` keyed by `name`, or `property` when there is no name.
/// A later tag with the same key wins.
fn collect_meta_data(document: &Document) -> MetaData {
    let Some(head) = document.head() else {
        return MetaData::new();
    };

    markup::find_all_in(head, "meta")
        .filter_map(|meta| {
            let key = markup::attr(meta, "name").or_else(|| markup::attr(meta, "property"))?;
            let content = markup::attr(meta, "content").unwrap_or_default();
            Some((key.to_string(), content.to_string()))
        })
        .collect()
}

/// Presence and length rules shared by the title and the description.
pub fn validate_meta_field(label: &str, content: Option<&str>, min: usize, max: usize) -> MetaField {
    let content = content.map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return MetaField {
            errors: vec![format!("{} is missing", label)],
            ..MetaField::default()
        };
    }

    let length = content.chars().count();
    let mut warnings = Vec::new();
    if length < min {
        warnings.push(format!(
            "{} is too short ({} characters, minimum {})",
            label, length, min
        ));
    } else if length > max {
        warnings.push(format!(
            "{} is too long ({} characters, maximum {})",
            label, length, max
        ));
    }

    MetaField {
        content: content.to_string(),
        valid: true,
        length,
        errors: Vec::new(),
        warnings,
    }
}

fn analyze_headings(document: &Document) -> HeadingReport {
    let count = |tag: &str| document.find_all(tag).count();
    let h1: Vec<String> = document.find_all("h1").map(markup::text).collect();

    let mut report = HeadingReport {
        h1_count: h1.len(),
        h2_count: count("h2"),
        h3_count: count("h3"),
        h4_count: count("h4"),
        h5_count: count("h5"),
        h6_count: count("h6"),
        valid: true,
        ..HeadingReport::default()
    };

    match report.h1_count {
        0 => {
            report.valid = false;
            report.errors.push(NO_H1.to_string());
        }
        1 => {}
        n => report
            .warnings
            .push(format!("Multiple H1 headings found ({})", n)),
    }
    report.h1 = h1;
    report
}

fn analyze_images(document: &Document, base: &Url) -> ImageReport {
    let mut total = 0;
    let mut with_alt = 0;
    let mut missing_details = Vec::new();

    for img in document.find_all("img") {
        total += 1;
        let has_alt = markup::attr(img, "alt")
            .map(|alt| !alt.trim().is_empty())
            .unwrap_or(false);
        if has_alt {
            with_alt += 1;
            continue;
        }

        if let Some(src) = markup::attr(img, "src").map(str::trim).filter(|s| !s.is_empty()) {
            let resolved = base
                .join(src)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| src.to_string());
            missing_details.push(resolved);
        }
    }

    let without_alt = total - with_alt;
    ImageReport {
        total_images: total,
        images_with_alt: with_alt,
        images_without_alt: without_alt,
        alt_text_analysis: AltTextAnalysis {
            missing_alt_text: without_alt,
            message: format!("{} images found, {} missing alt text", total, without_alt),
            images_without_alt_details: missing_details,
        },
    }
}

fn count_words(document: &Document) -> usize {
    document
        .body()
        .map(|body| markup::visible_text(body).split_whitespace().count())
        .unwrap_or(0)
}

fn extract_links(document: &Document, base: &Url, root_location: &str) -> Vec<LinkEdge> {
    let mut links = Vec::new();

    for anchor in document.find_all("a") {
        let Some(href) = markup::attr(anchor, "href") else {
            continue;
        };

        let (target, scope, malformed) = match resolve_href(base, href) {
            ResolvedHref::Skip => continue,
            ResolvedHref::Target(url) => {
                let scope = classify(&url, root_location);
                (url.to_string(), scope, false)
            }
            ResolvedHref::Malformed(raw) => (raw, LinkScope::External, true),
        };

        let text = markup::text(anchor);
        let anchor_text = if text.is_empty() {
            NO_ANCHOR_TEXT.to_string()
        } else {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        };

        links.push(LinkEdge {
            target,
            anchor_text,
            scope,
            malformed,
        });
    }

    links
}

/// A finished page plus the internal URLs it links to.
#[derive(Debug, Clone)]
pub struct AnalyzedPage {
    pub record: PageRecord,
    pub internal_targets: Vec<NormalizedUrl>,
}

/// Turns fetch responses into page records, probing every discovered link.
pub struct PageAnalyzer<F> {
    checker: Arc<LinkChecker<F>>,
    root_location: String,
    probe_concurrency: usize,
}

impl<F: Fetcher> PageAnalyzer<F> {
    pub fn new(checker: Arc<LinkChecker<F>>, root_location: String, probe_concurrency: usize) -> Self {
        Self {
            checker,
            root_location,
            probe_concurrency: probe_concurrency.max(1),
        }
    }

    pub async fn analyze(&self, page_url: &NormalizedUrl, response: FetchResponse) -> AnalyzedPage {
        let status = PageStatus::Code(response.status);

        if !response.is_html() {
            debug!("Skipping analysis of non-HTML page {}", page_url);
            return AnalyzedPage {
                record: PageRecord::new(page_url.to_string(), status),
                internal_targets: Vec::new(),
            };
        }

        let Some(base) = Url::parse(&response.final_url)
            .ok()
            .or_else(|| page_url.to_url())
        else {
            return AnalyzedPage {
                record: PageRecord::new(page_url.to_string(), status),
                internal_targets: Vec::new(),
            };
        };

        let analysis = analyze_markup(&base, &response.body, &self.root_location);

        // Probe futures must not borrow `analysis` or `self`; the page task is spawned.
        let jobs: Vec<(String, bool)> = analysis
            .links
            .iter()
            .map(|edge| (edge.target.clone(), edge.malformed))
            .collect();
        let verdicts: Vec<bool> = stream::iter(jobs.into_iter().map(|(target, malformed)| {
            let checker = Arc::clone(&self.checker);
            async move {
                if malformed {
                    true
                } else {
                    checker.is_broken(&target).await
                }
            }
        }))
        .buffered(self.probe_concurrency)
        .collect()
        .await;

        let mut internal_links = LinkMap::new();
        let mut external_links = LinkMap::new();
        let mut broken_links = LinkMap::new();
        let mut internal_targets = Vec::new();
        let mut seen = HashSet::new();

        for (edge, broken) in analysis.links.into_iter().zip(verdicts) {
            if broken {
                broken_links
                    .entry(edge.target.clone())
                    .or_insert_with(Vec::new)
                    .push(edge.anchor_text.clone());
            }

            match edge.scope {
                LinkScope::Internal => {
                    if seen.insert(edge.target.clone())
                        && let Ok(url) = NormalizedUrl::parse(&edge.target)
                    {
                        internal_targets.push(url);
                    }
                    internal_links
                        .entry(edge.target)
                        .or_insert_with(Vec::new)
                        .push(edge.anchor_text);
                }
                LinkScope::External => {
                    external_links
                        .entry(edge.target)
                        .or_insert_with(Vec::new)
                        .push(edge.anchor_text);
                }
            }
        }

        debug!(
            "{}: {} internal, {} external, {} broken links",
            page_url,
            internal_links.len(),
            external_links.len(),
            broken_links.len()
        );

        AnalyzedPage {
            record: PageRecord {
                url: page_url.to_string(),
                status,
                meta_title: analysis.meta_title,
                meta_description: analysis.meta_description,
                meta_data: analysis.meta_data,
                headings: analysis.headings,
                external_links,
                internal_links,
                broken_links,
                word_count: analysis.word_count,
                images: analysis.images,
            },
            internal_targets,
        }
    }
}
