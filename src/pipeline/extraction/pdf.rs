use std::panic::{self, AssertUnwindSafe};

use super::types::PdfExtractor;
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; scanned pages come back blank.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        // pdf-extract panics on some malformed inputs instead of returning Err.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        }));

        let page_texts = match outcome {
            Ok(result) => result.map_err(|e| ExtractionError::PdfParsing(e.to_string()))?,
            Err(_) => {
                return Err(ExtractionError::PdfParsing(
                    "PDF parser aborted on malformed input".into(),
                ))
            }
        };

        let total = page_texts.len();
        let pages: Vec<String> = page_texts
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .collect();

        tracing::debug!(
            total_pages = total,
            text_pages = pages.len(),
            "PDF text extracted"
        );

        Ok(pages)
    }
}
