use sitecrawler_core::{ClassifyAction, FileCategory};

/// Suffix → category table, verbatim from the crawler this was distilled
/// from. A suffix outside this table still counts as a file ("other"); no
/// suffix at all means "crawl it as a page".
fn category_for_suffix(suffix: &str) -> FileCategory {
    match suffix {
        "pdf" | "doc" | "docx" | "txt" | "rtf" | "odt" => FileCategory::Document,
        "xls" | "xlsx" | "csv" | "ods" => FileCategory::Spreadsheet,
        "ppt" | "pptx" | "odp" => FileCategory::Presentation,
        "zip" | "rar" | "7z" | "tar" | "gz" => FileCategory::Archive,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" => FileCategory::Image,
        "mp3" | "wav" | "ogg" | "m4a" => FileCategory::Audio,
        "mp4" | "avi" | "mkv" | "mov" => FileCategory::Video,
        "py" | "js" | "html" | "css" | "java" | "cpp" | "h" => FileCategory::Code,
        "json" | "xml" | "yaml" | "sql" => FileCategory::Data,
        "epub" | "mobi" | "azw" => FileCategory::Ebook,
        _ => FileCategory::Other,
    }
}

/// Classify a URL path into a crawl action, based solely on its suffix.
pub fn classify(path: &str) -> ClassifyAction {
    match suffix_of(path) {
        Some(suffix) => ClassifyAction::DownloadFile(category_for_suffix(&suffix)),
        None => ClassifyAction::CrawlPage,
    }
}

fn suffix_of(path: &str) -> Option<String> {
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = last_segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_is_document() {
        assert!(matches!(
            classify("/reports/q1.pdf"),
            ClassifyAction::DownloadFile(FileCategory::Document)
        ));
    }

    #[test]
    fn unknown_suffix_is_other() {
        assert!(matches!(
            classify("/weird.xyz"),
            ClassifyAction::DownloadFile(FileCategory::Other)
        ));
    }

    #[test]
    fn no_suffix_is_crawl_page() {
        assert!(matches!(classify("/about"), ClassifyAction::CrawlPage));
    }

    #[test]
    fn trailing_dot_segment_without_extension_is_page() {
        assert!(matches!(classify("/v1.0/about"), ClassifyAction::CrawlPage));
    }
}
