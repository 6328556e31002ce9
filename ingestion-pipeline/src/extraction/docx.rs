use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use common::error::AppError;

use super::TextExtractor;

/// DOCX extraction: the file is a zip archive and the body text lives in
/// `word/document.xml` as `w:t` runs grouped into `w:p` paragraphs.
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, AppError> {
        let xml = read_document_xml(bytes)?;
        paragraphs_from_xml(&xml)
    }
}

fn read_document_xml(bytes: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| AppError::Processing(format!("Failed to open DOCX archive: {err}")))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|err| AppError::Processing(format!("DOCX is missing its document body: {err}")))?;

    let mut xml = String::new();
    document.read_to_string(&mut xml)?;
    Ok(xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<String, AppError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.local_name().as_ref() == b"t" => {
                in_text_run = true;
            }
            Ok(Event::End(element)) if element.local_name().as_ref() == b"t" => {
                in_text_run = false;
            }
            Ok(Event::End(element)) if element.local_name().as_ref() == b"p" => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Ok(Event::Text(event)) if in_text_run => {
                let run = event
                    .decode()
                    .map_err(|err| AppError::Processing(format!("Invalid DOCX text run: {err}")))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(AppError::Processing(format!(
                    "Failed to parse DOCX body: {err}"
                )))
            }
        }
    }

    Ok(text.trim_end().to_owned())
}
