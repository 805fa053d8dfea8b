use crate::error::IngestError;
use lopdf::Document;

/// Turns raw PDF bytes into plain text.
///
/// Implementations concatenate per-page text in page order with no added
/// separator. A well-formed document with no extractable text yields an
/// empty string, not an error; callers decide what that means.
pub trait PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestError> {
        let document =
            Document::load_mem(bytes).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut text = String::new();
        for (page_no, _page_id) in document.get_pages() {
            let page_text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;
            text.push_str(&page_text);
        }

        Ok(text)
    }
}
