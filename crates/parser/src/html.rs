use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use sitecrawler_core::{normalize_url, HtmlExtract};

/// Tags whose entire subtree is excluded from visible body text.
const STRIPPED_TAGS: &[&str] = &["script", "style", "meta", "link", "noscript"];

/// Extract the title, visible body text, and same-host outbound links from
/// an HTML document.
///
/// Body text is collected with a manual tree walk rather than
/// `ElementRef::text()`: `.text()` yields every descendant text node, and
/// html5ever parses `<script>`/`<style>` contents as child text nodes, so
/// naively collecting it would leak inline JS/CSS source into the page
/// text. `collect_visible_text` skips the `STRIPPED_TAGS` subtrees
/// entirely instead.
pub fn parse_html(html_str: &str, final_url: &Url) -> HtmlExtract {
    let document = Html::parse_document(html_str);

    let title = selector("title")
        .and_then(|s| document.select(&s).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let mut chunks = Vec::new();
    match selector("body").and_then(|s| document.select(&s).next()) {
        Some(body) => collect_visible_text(body, &mut chunks),
        None => collect_visible_text(document.root_element(), &mut chunks),
    }
    let body_text = collapse_whitespace(&chunks.join(" "));

    let links = extract_links(&document, final_url);

    HtmlExtract { title, body_text, links }
}

/// Recursively collect visible text nodes under `element`, skipping the
/// subtree rooted at any `STRIPPED_TAGS` element without descending into it.
fn collect_visible_text<'a>(element: ElementRef<'a>, out: &mut Vec<String>) {
    if STRIPPED_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(text.to_string()),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    collect_visible_text(el, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

fn extract_links(document: &Html, final_url: &Url) -> Vec<String> {
    let Some(sel) = selector("a[href]") else {
        return Vec::new();
    };
    let host = final_url.host_str().unwrap_or("").to_string();

    document
        .select(&sel)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
                || href.starts_with("data:")
            {
                return None;
            }
            let canonical = normalize_url(href, final_url)?;
            let resolved = Url::parse(canonical.as_str()).ok()?;
            if resolved.host_str().unwrap_or("") != host {
                return None;
            }
            Some(canonical.as_str().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_body_text() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = "<html><head><title> Hi There </title><style>.a{}</style></head>\
                    <body>  Hello   <b>World</b>  </body></html>";
        let result = parse_html(html, &base);
        assert_eq!(result.title.as_deref(), Some("Hi There"));
        assert_eq!(result.body_text, "Hello World");
    }

    #[test]
    fn strips_script_and_style_from_body_text() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = "<html><body>Hello\
                    <script>var x = 'leak';</script>\
                    <style>.a{color:red}</style>\
                    <noscript>enable js</noscript>\
                    World</body></html>";
        let result = parse_html(html, &base);
        assert_eq!(result.body_text, "Hello World");
    }

    #[test]
    fn keeps_only_same_host_links() {
        let base = Url::parse("https://example.com/a/").unwrap();
        let html = r#"<html><body>
            <a href="/b">internal</a>
            <a href="https://other.com/c">external</a>
            <a href="#frag">fragment</a>
        </body></html>"#;
        let result = parse_html(html, &base);
        assert_eq!(result.links, vec!["https://example.com/b".to_string()]);
    }
}
