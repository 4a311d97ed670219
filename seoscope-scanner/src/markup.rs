//! Thin query layer over `scraper`.
//!
//! html5ever always synthesizes `<head>` and `<body>`, so whether the author
//! actually wrote those elements is detected from the raw markup.

use scraper::{ElementRef, Html, Node};

pub struct Document {
    html: Html,
    has_head: bool,
    has_body: bool,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        let (has_head, has_body) = explicit_head_body(markup);
        Self {
            html: Html::parse_document(markup),
            has_head,
            has_body,
        }
    }

    /// All elements named `tag`, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        find_all_in(self.html.root_element(), tag)
    }

    pub fn head(&self) -> Option<ElementRef<'_>> {
        if !self.has_head {
            return None;
        }
        self.find_all("head").next()
    }

    pub fn body(&self) -> Option<ElementRef<'_>> {
        if !self.has_body {
            return None;
        }
        self.find_all("body").next()
    }
}

/// Elements named `tag` under (and including) `element`, in document order.
pub fn find_all_in<'a>(element: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name().eq_ignore_ascii_case(tag))
}

/// Text content of `element`, trimmed.
pub fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of `element` with tags stripped and text nodes concatenated as-is,
/// so inline markup never splits a word. Text inside script, style or
/// noscript is excluded.
pub fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|parent| match parent.value() {
                    Node::Element(el) => Some(matches!(el.name(), "script" | "style" | "noscript")),
                    _ => None,
                })
                .unwrap_or(false);
            (!hidden).then_some(&**text)
        })
        .collect()
}

pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// Whether the author wrote `<head>` and `<body>` opening tags, in one pass.
/// Comments and script or style contents are skipped.
pub fn explicit_head_body(markup: &str) -> (bool, bool) {
    let (mut head, mut body) = (false, false);
    let mut pos = 0;

    while !(head && body) {
        let Some(offset) = markup[pos..].find('<') else {
            break;
        };
        let start = pos + offset;
        let rest = &markup[start..];

        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => {
                    pos = start + end + 3;
                    continue;
                }
                None => break,
            }
        }

        let name_len = rest[1..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        let name = &rest[1..1 + name_len];
        let terminated = rest[1 + name_len..]
            .chars()
            .next()
            .map(|c| c == '>' || c == '/' || c.is_whitespace())
            .unwrap_or(false);

        if terminated {
            if name.eq_ignore_ascii_case("head") {
                head = true;
            } else if name.eq_ignore_ascii_case("body") {
                body = true;
            } else if name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style") {
                let close = format!("</{}", name);
                match find_ignore_case(&markup[start + 1..], &close) {
                    Some(end) => {
                        pos = start + 1 + end;
                        continue;
                    }
                    None => break,
                }
            }
        }
        pos = start + 1;
    }

    (head, body)
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_tag_detection() {
        assert_eq!(explicit_head_body("<html><HEAD></HEAD><Body></Body></html>"), (true, true));
        assert_eq!(explicit_head_body("<head lang=\"en\">"), (true, false));
        assert_eq!(explicit_head_body("<html><header>x</header></html>"), (false, false));
        assert_eq!(explicit_head_body("<p>no body here</p>"), (false, false));
    }

    #[test]
    fn test_tags_in_comments_and_scripts_are_ignored() {
        let markup = "<!-- <head></head> --><title>x</title>\
                      <script>document.write('<body>');</script><p>text</p>";
        assert_eq!(explicit_head_body(markup), (false, false));

        let markup = "<SCRIPT>var s = '<head>';</SCRIPT><body><p>x</p></body>";
        assert_eq!(explicit_head_body(markup), (false, true));
    }

    #[test]
    fn test_unterminated_comment_stops_scan() {
        assert_eq!(explicit_head_body("<!-- <head> <body>"), (false, false));
    }

    #[test]
    fn test_synthesized_head_is_not_reported() {
        let doc = Document::parse("<title>x</title><p>text</p>");
        assert!(doc.head().is_none());
        assert!(doc.body().is_none());

        let doc = Document::parse("<html><head></head><body><p>x</p></body></html>");
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_find_all_in_document_order() {
        let doc = Document::parse("<body><a href='/1'>one</a><div><a href='/2'>two</a></div></body>");
        let hrefs: Vec<&str> = doc.find_all("a").filter_map(|a| attr(a, "href")).collect();
        assert_eq!(hrefs, vec!["/1", "/2"]);
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let doc = Document::parse(
            "<html><body><p>one two</p> <script>var x = 1;</script><p>th<b>re</b>e</p></body></html>",
        );
        let body = doc.body().unwrap();
        assert_eq!(visible_text(body), "one two three");
    }
}
