use std::sync::atomic::{AtomicUsize, Ordering};

use super::ExtractionError;

/// PDF text extraction abstraction (allows mocking).
pub trait PdfExtractor: Send + Sync {
    /// Text of every page that has any, in page order.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Join page texts with single spaces, skipping blank pages.
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Mock extractor returning fixed pages, or a parse failure.
pub struct MockPdfExtractor {
    pages: Option<Vec<String>>,
    calls: AtomicUsize,
}

impl MockPdfExtractor {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: Some(pages.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            pages: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfExtractor for MockPdfExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.pages {
            Some(pages) => Ok(pages
                .iter()
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .collect()),
            None => Err(ExtractionError::PdfParsing("mock parse failure".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_pages_skips_blank_pages() {
        let pages = vec![
            "Page one".to_string(),
            "   ".to_string(),
            "\nPage three\n".to_string(),
        ];
        assert_eq!(join_pages(&pages), "Page one Page three");
    }

    #[test]
    fn join_pages_of_nothing_is_empty() {
        assert_eq!(join_pages(&[]), "");
        assert_eq!(join_pages(&["".to_string()]), "");
    }

    #[test]
    fn mock_extractor_drops_blank_pages() {
        let mock = MockPdfExtractor::new(&["a", " ", "b"]);
        assert_eq!(mock.extract_pages(b"").unwrap(), vec!["a", "b"]);
        assert!(MockPdfExtractor::failing().extract_pages(b"").is_err());
    }

    #[test]
    fn mock_extractor_counts_calls() {
        let mock = MockPdfExtractor::new(&["a"]);
        assert_eq!(mock.call_count(), 0);
        let _ = mock.extract_pages(b"");
        let _ = mock.extract_pages(b"");
        assert_eq!(mock.call_count(), 2);
    }
}
