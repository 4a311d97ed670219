use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Target URL -> anchor texts, in the order the anchors were found.
pub type LinkMap = BTreeMap<String, Vec<String>>;

/// Target URL -> pages the link was found on, deduplicated, in discovery order.
pub type FoundOn = BTreeMap<String, Vec<String>>;

/// Head `<meta>` name (or property) -> content.
pub type MetaData = BTreeMap<String, String>;

/// HTTP status of a fetch, or `Error` when no response was obtained.
///
/// Serializes as the bare status code or the string `"Error"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Code(u16),
    Error,
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStatus::Code(code) => write!(f, "{}", code),
            PageStatus::Error => f.write_str("Error"),
        }
    }
}

impl Serialize for PageStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageStatus::Code(code) => serializer.serialize_u16(*code),
            PageStatus::Error => serializer.serialize_str("Error"),
        }
    }
}

impl<'de> Deserialize<'de> for PageStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u16),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Ok(PageStatus::Code(code)),
            Repr::Text(text) if text == "Error" => Ok(PageStatus::Error),
            Repr::Text(text) => Err(de::Error::custom(format!("unknown status '{}'", text))),
        }
    }
}

/// Validation outcome for the page title or meta description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaField {
    pub content: String,
    pub valid: bool,
    pub length: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingReport {
    pub h1: Vec<String>,
    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub h4_count: usize,
    pub h5_count: usize,
    pub h6_count: usize,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AltTextAnalysis {
    pub missing_alt_text: usize,
    pub message: String,
    pub images_without_alt_details: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub total_images: usize,
    pub images_with_alt: usize,
    pub images_without_alt: usize,
    pub alt_text_analysis: AltTextAnalysis,
}

/// SEO findings for one fetched URL. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(rename = "page_url")]
    pub url: String,
    pub status: PageStatus,
    pub meta_title: MetaField,
    pub meta_description: MetaField,
    #[serde(default)]
    pub meta_data: MetaData,
    pub headings: HeadingReport,
    #[serde(rename = "external")]
    pub external_links: LinkMap,
    #[serde(rename = "internal")]
    pub internal_links: LinkMap,
    #[serde(rename = "broken")]
    pub broken_links: LinkMap,
    pub word_count: usize,
    pub images: ImageReport,
}

impl PageRecord {
    pub fn new(url: String, status: PageStatus) -> Self {
        Self {
            url,
            status,
            meta_title: MetaField::default(),
            meta_description: MetaField::default(),
            meta_data: MetaData::new(),
            headings: HeadingReport::default(),
            external_links: LinkMap::new(),
            internal_links: LinkMap::new(),
            broken_links: LinkMap::new(),
            word_count: 0,
            images: ImageReport::default(),
        }
    }

    pub fn with_error(url: String) -> Self {
        Self::new(url, PageStatus::Error)
    }
}

/// The final report of one crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Status of the root probe, recorded separately from page fetches.
    pub status: PageStatus,
    pub domain: String,
    pub url: String,
    pub pages: Vec<PageRecord>,
    /// External links across every page, keyed by target.
    pub external: LinkMap,
    /// Broken links across every page, keyed by target.
    pub broken: LinkMap,
    /// Pages each external or broken target was found on.
    #[serde(default)]
    pub found_on: FoundOn,
}

impl CrawlResult {
    pub fn internal_link_count(&self) -> usize {
        self.pages.iter().map(|p| p.internal_links.len()).sum()
    }

    pub fn failed_page_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.status == PageStatus::Error)
            .count()
    }

    pub fn has_broken_links(&self) -> bool {
        !self.broken.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_as_code_or_error() {
        assert_eq!(serde_json::to_string(&PageStatus::Code(200)).unwrap(), "200");
        assert_eq!(serde_json::to_string(&PageStatus::Error).unwrap(), "\"Error\"");

        let status: PageStatus = serde_json::from_str("404").unwrap();
        assert_eq!(status, PageStatus::Code(404));
        let status: PageStatus = serde_json::from_str("\"Error\"").unwrap();
        assert_eq!(status, PageStatus::Error);
        assert!(serde_json::from_str::<PageStatus>("\"Teapot\"").is_err());
    }

    #[test]
    fn test_page_record_field_names() {
        let record = PageRecord::with_error("https://example.com/x".to_string());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["page_url"], "https://example.com/x");
        assert_eq!(value["status"], "Error");
        for key in ["internal", "external", "broken", "word_count", "headings", "meta_data"] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert!(value["images"]["alt_text_analysis"]["images_without_alt_details"].is_array());
        assert!(value["headings"].get("h6_count").is_some());
    }
}
