use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

/// Scan a robots.txt body for `Sitemap:` directives, case-insensitively.
pub fn parse_robots_txt(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| {
            let line = line.trim();
            let lower = line.to_lowercase();
            lower
                .strip_prefix("sitemap:")
                .map(|_| line[line.find(':').unwrap() + 1..].trim().to_string())
        })
        .collect()
}

/// Parse `<url><loc>` entries out of a sitemap XML document under the
/// `sitemap/0.9` namespace. Namespace prefixes are ignored (matched by
/// local name only) so this works whether or not the document declares one
/// explicitly — the common case is the default (unprefixed) namespace.
pub fn parse_sitemap_xml(body: &str) -> Vec<String> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if local_name(&e.name().as_ref().to_vec()) == "loc" => {
                in_loc = true;
            }
            Ok(Event::Text(t)) if in_loc => {
                if let Ok(text) = t.unescape() {
                    locs.push(text.trim().to_string());
                }
            }
            Ok(Event::End(e)) if local_name(&e.name().as_ref().to_vec()) == "loc" => {
                in_loc = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "malformed sitemap xml, stopping parse");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    locs
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    s.rsplit(':').next().unwrap_or(&s).to_string()
}

/// True if a Content-Type header value looks like XML.
pub fn content_type_is_xml(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_lowercase().contains("xml"))
        .unwrap_or(false)
}
