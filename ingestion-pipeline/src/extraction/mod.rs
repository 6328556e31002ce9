use std::path::Path;

use common::error::AppError;

mod docx;
mod pdf;

/// Capability interface for format-specific plain-text extraction. Keeps the
/// ingestion pipeline format-agnostic; implementations run on the blocking
/// pool since the underlying parsers are synchronous.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, AppError>;
}

/// Supported upload formats, detected from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    pub fn from_filename(filename: &str) -> Result<Self, AppError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("docx") => Ok(Self::Docx),
            Some("txt") => Ok(Self::Txt),
            _ => Err(AppError::UnsupportedFormat(filename.to_owned())),
        }
    }

    fn extractor(self) -> &'static dyn TextExtractor {
        match self {
            Self::Pdf => &pdf::PdfExtractor,
            Self::Docx => &docx::DocxExtractor,
            Self::Txt => &PlainTextExtractor,
        }
    }
}

/// Runs the format's extractor off the async executor.
pub async fn extract_text(format: DocumentFormat, bytes: Vec<u8>) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || format.extractor().extract(&bytes)).await?
}

struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, AppError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_supported_extensions_case_insensitively() {
        assert_eq!(DocumentFormat::from_filename("report.pdf").ok(), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_filename("notes.DOCX").ok(), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_filename("readme.Txt").ok(), Some(DocumentFormat::Txt));
    }

    #[test]
    fn rejects_unknown_or_missing_extensions() {
        assert!(matches!(
            DocumentFormat::from_filename("archive.zip"),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            DocumentFormat::from_filename("no_extension"),
            Err(AppError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn plain_text_extraction_is_lossy_utf8() {
        let text = extract_text(DocumentFormat::Txt, b"plain text \xf0\x28 body".to_vec())
            .await
            .expect("extract");

        assert!(text.starts_with("plain text"));
        assert!(text.ends_with("body"));
    }
}
