use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, Write};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the body paragraphs of a DOCX upload, one per line.
///
/// The bytes are staged in a uniquely named file under `work_dir` and
/// parsed from there. The staged file is deleted when the guard drops, so
/// every return path cleans up, including parse failures.
pub fn extract(bytes: &[u8], work_dir: &Path) -> Result<String, ExtractError> {
    let mut staged = tempfile::Builder::new()
        .prefix("temp_")
        .suffix(".docx")
        .tempfile_in(work_dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;

    let file = File::open(staged.path())?;
    let paragraphs = read_body_paragraphs(file)?;
    Ok(paragraphs.join("\n"))
}

/// Read the non-empty top-level paragraphs from a DOCX archive.
pub fn read_body_paragraphs<R: Read + Seek>(archive: R) -> Result<Vec<String>, ExtractError> {
    let mut zip = zip::ZipArchive::new(archive)?;
    let part = zip.by_name(DOCUMENT_PART)?;
    parse_document_xml(BufReader::new(part))
}

/// Walk `word/document.xml` and collect the text of each paragraph that is
/// a direct child of `w:body`.
///
/// Paragraphs nested in tables or text boxes are not body paragraphs and are
/// left out, as are deleted runs (`w:delText`) and field codes.
fn parse_document_xml<B: BufRead>(input: B) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<String> = None;
    let mut paragraphs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" && is_body_level(&stack) {
                    current = Some(String::new());
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                // Only run children are content; `w:pPr/w:tabs/w:tab` defines tab stops.
                let in_run = stack.last().is_some_and(|name| name == b"r");
                if let Some(text) = current.as_mut().filter(|_| in_run && !in_text_box(&stack)) {
                    match e.local_name().as_ref() {
                        b"tab" => text.push('\t'),
                        b"br" | b"cr" => text.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(t) => {
                let in_run_text = stack.last().is_some_and(|name| name == b"t");
                if in_run_text && !in_text_box(&stack) {
                    if let Some(text) = current.as_mut() {
                        text.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(_) => {
                if let Some(name) = stack.pop() {
                    if name == b"p" && is_body_level(&stack) {
                        if let Some(text) = current.take().filter(|t| !t.is_empty()) {
                            paragraphs.push(text);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn is_body_level(stack: &[Vec<u8>]) -> bool {
    stack.last().is_some_and(|name| name == b"body")
}

fn in_text_box(stack: &[Vec<u8>]) -> bool {
    stack.iter().any(|name| name == b"txbxContent")
}

#[cfg(test)]
mod tests {
    use super::{extract, read_body_paragraphs, ExtractError};
    use std::io::{Cursor, Write};

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(xml.as_bytes()).expect("write entry");
        writer.finish().expect("finish zip").into_inner()
    }

    fn assert_dir_empty(dir: &std::path::Path) {
        let leftovers: Vec<_> = std::fs::read_dir(dir).unwrap().collect();
        assert!(leftovers.is_empty(), "staged files left behind: {leftovers:?}");
    }

    #[test]
    fn joins_non_empty_body_paragraphs() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>First </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t></w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second &amp; last.</w:t></w:r></w:p>",
        );
        let dir = tempfile::tempdir().expect("tempdir");
        let text = extract(&bytes, dir.path()).expect("extract");
        assert_eq!(text, "First paragraph.\nSecond & last.");
        assert_dir_empty(dir.path());
    }

    #[test]
    fn tabs_and_breaks_become_whitespace() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t><w:br/><w:t>Next</w:t></w:r></w:p>",
        );
        let paragraphs = read_body_paragraphs(Cursor::new(bytes)).expect("parse");
        assert_eq!(paragraphs, vec!["Name\tValue\nNext".to_string()]);
    }

    #[test]
    fn tab_stop_definitions_are_not_text() {
        let bytes = docx_with_body(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr><w:r><w:t>Hello</w:t></w:r></w:p>\
             <w:p><w:pPr><w:tabs><w:tab w:val=\"center\" w:pos=\"4680\"/></w:tabs></w:pPr></w:p>\
             <w:p><w:r><w:t>World</w:t></w:r></w:p>",
        );
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(extract(&bytes, dir.path()).expect("extract"), "Hello\nWorld");
    }

    #[test]
    fn table_and_text_box_paragraphs_are_not_body_paragraphs() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Body text</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell text</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>Caption</w:t><w:drawing><w:txbxContent><w:p><w:r><w:t>Boxed</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r></w:p>\
             <w:p><w:del><w:r><w:delText>gone</w:delText></w:r></w:del><w:r><w:t>kept</w:t></w:r></w:p>",
        );
        let paragraphs = read_body_paragraphs(Cursor::new(bytes)).expect("parse");
        assert_eq!(
            paragraphs,
            vec![
                "Body text".to_string(),
                "Caption".to_string(),
                "kept".to_string()
            ]
        );
    }

    #[test]
    fn staged_file_is_removed_when_parsing_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = extract(b"PK\x03\x04 truncated", dir.path());
        assert!(matches!(result, Err(ExtractError::Zip(_))));
        assert_dir_empty(dir.path());
    }

    #[test]
    fn archive_without_document_part_is_an_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(b"<w:styles/>").expect("write entry");
        let bytes = writer.finish().expect("finish zip").into_inner();

        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            extract(&bytes, dir.path()),
            Err(ExtractError::Zip(zip::result::ZipError::FileNotFound))
        ));
        assert_dir_empty(dir.path());
    }
}
