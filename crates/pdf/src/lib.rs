use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PdfBackendError {
    #[error("{0}")]
    Failed(String),
}

/// One PDF text-extraction engine. Backends are tried independently and
/// never abort each other; a backend erroring out just yields no
/// candidate from it.
pub trait PdfBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Result<String, PdfBackendError>;
}

/// Wraps `pdf-extract`'s pure-Rust text extraction. Always available —
/// this is the one backend this crate ships enabled by default.
pub struct NativeBackend;

impl PdfBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, PdfBackendError> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| PdfBackendError::Failed(e.to_string()))
    }
}

/// Outcome of a full extraction attempt across every registered backend.
pub struct PdfExtraction {
    pub text: String,
    pub backend: String,
}

/// Runs every registered backend over the same bytes and keeps whichever
/// produced the longest stripped text; ties go to the earlier-declared
/// backend. This, not "first non-empty", is the rule: a fast backend can
/// return a short garbled fragment while a slower one recovers the full
/// document.
///
/// Extension point: additional backends (a second native engine, an OCR
/// pipeline) register here as further `PdfBackend` trait objects without
/// touching the selection logic. Only `NativeBackend` ships by default, to
/// avoid depending on engines this workspace cannot fetch or run.
pub struct PdfExtractor {
    backends: Vec<Box<dyn PdfBackend>>,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self { backends: vec![Box::new(NativeBackend)] }
    }
}

impl PdfExtractor {
    pub fn new(backends: Vec<Box<dyn PdfBackend>>) -> Self {
        Self { backends }
    }

    /// Extract text from `bytes`, returning the raw text of whichever
    /// backend wins — no provenance or other text is injected, since this
    /// is exactly what gets persisted to `<md5>_pdf.txt`.
    pub fn extract(&self, bytes: &[u8]) -> Option<PdfExtraction> {
        let mut best: Option<PdfExtraction> = None;

        for backend in &self.backends {
            match backend.extract(bytes) {
                Ok(text) if !text.trim().is_empty() => {
                    let longer = best
                        .as_ref()
                        .map(|b| text.trim().len() > b.text.trim().len())
                        .unwrap_or(true);
                    if longer {
                        best = Some(PdfExtraction { text, backend: backend.name().to_string() });
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(backend = backend.name(), error = %e, "pdf backend failed"),
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub(&'static str, &'static str);

    impl PdfBackend for Stub {
        fn name(&self) -> &'static str {
            self.0
        }
        fn extract(&self, _bytes: &[u8]) -> Result<String, PdfBackendError> {
            Ok(self.1.to_string())
        }
    }

    struct Failing;
    impl PdfBackend for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn extract(&self, _bytes: &[u8]) -> Result<String, PdfBackendError> {
            Err(PdfBackendError::Failed("boom".into()))
        }
    }

    #[test]
    fn longest_wins() {
        let extractor = PdfExtractor::new(vec![
            Box::new(Stub("short", "hi")),
            Box::new(Stub("long", "hello world, this is much longer")),
        ]);
        let result = extractor.extract(b"").unwrap();
        assert_eq!(result.backend, "long");
    }

    #[test]
    fn ties_go_to_earlier_backend() {
        let extractor = PdfExtractor::new(vec![
            Box::new(Stub("first", "abcd")),
            Box::new(Stub("second", "wxyz")),
        ]);
        let result = extractor.extract(b"").unwrap();
        assert_eq!(result.backend, "first");
    }

    #[test]
    fn failing_backend_does_not_abort_others() {
        let extractor = PdfExtractor::new(vec![Box::new(Failing), Box::new(Stub("ok", "text"))]);
        let result = extractor.extract(b"").unwrap();
        assert_eq!(result.backend, "ok");
    }

    #[test]
    fn all_empty_yields_none() {
        let extractor = PdfExtractor::new(vec![Box::new(Stub("empty", "   "))]);
        assert!(extractor.extract(b"").is_none());
    }

    #[test]
    fn returns_raw_text_without_provenance() {
        let extractor = PdfExtractor::new(vec![Box::new(Stub("one", "body"))]);
        let result = extractor.extract(b"").unwrap();
        assert_eq!(result.text, "body");
    }
}
