use common::error::AppError;

use super::TextExtractor;

/// PDF text-layer extraction via `pdf-extract`. Scanned documents without a
/// text layer come back empty, which the pipeline treats as zero chunks.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, AppError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|err| AppError::Processing(format!("Failed to extract text from PDF: {err}")))?;
        Ok(text.trim().to_owned())
    }
}
