//! Minimal OOXML readers for Word and PowerPoint files.
//!
//! Only text structure is kept: paragraph styles become headings, numbered
//! paragraphs become list items, slides become `## Slide N` sections.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::ConvertError;

/// Convert a `.docx` file to Markdown
pub fn docx_to_markdown(path: &Path) -> Result<String, ConvertError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let xml = read_entry(&mut archive, "word/document.xml")?;
    docx_xml_to_markdown(&xml)
}

/// Convert a `.pptx` file to Markdown, one section per slide
pub fn pptx_to_markdown(path: &Path) -> Result<String, ConvertError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    if slides.is_empty() {
        return Err(ConvertError::failed("Presentation contains no slides"));
    }

    let mut sections = Vec::with_capacity(slides.len());
    for (number, name) in slides {
        let xml = read_entry(&mut archive, &name)?;
        let mut section = format!("## Slide {}", number);
        for paragraph in slide_paragraphs(&xml)? {
            section.push_str("\n\n");
            section.push_str(&paragraph);
        }
        sections.push(section);
    }

    tracing::debug!("Converted {} slides", sections.len());

    Ok(sections.join("\n\n"))
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ConvertError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|_| ConvertError::failed(format!("Missing '{}' in document archive", name)))?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

/// `ppt/slides/slide12.xml` -> 12
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.to_string()))
}

#[derive(Debug, Default)]
struct Paragraph {
    style: Option<String>,
    list_item: bool,
    text: String,
}

impl Paragraph {
    fn heading_level(&self) -> Option<usize> {
        let style = self.style.as_deref()?;
        if style.eq_ignore_ascii_case("title") {
            return Some(1);
        }
        let level = style
            .get(..7)
            .filter(|prefix| prefix.eq_ignore_ascii_case("heading"))
            .and_then(|_| style[7..].trim().parse::<usize>().ok())?;
        (1..=6).contains(&level).then_some(level)
    }

    fn render(self) -> Option<String> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(level) = self.heading_level() {
            return Some(format!("{} {}", "#".repeat(level), text));
        }
        if self.list_item {
            return Some(format!("- {}", text));
        }
        Some(text.to_string())
    }
}

fn docx_xml_to_markdown(xml: &str) -> Result<String, ConvertError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut blocks = Vec::new();
    // Text boxes (w:txbxContent) nest whole paragraphs inside a run
    let mut open: Vec<Paragraph> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(Paragraph::default()),
                b"w:t" => in_text = true,
                b"w:pStyle" => {
                    if let Some(paragraph) = open.last_mut() {
                        paragraph.style = attr_value(&e, b"w:val");
                    }
                }
                b"w:numPr" => {
                    if let Some(paragraph) = open.last_mut() {
                        paragraph.list_item = true;
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(paragraph) = open.last_mut() {
                    match e.name().as_ref() {
                        b"w:pStyle" => paragraph.style = attr_value(&e, b"w:val"),
                        b"w:tab" => paragraph.text.push('\t'),
                        b"w:br" => paragraph.text.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(e) if in_text => {
                if let Some(paragraph) = open.last_mut() {
                    paragraph.text.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(block) = open.pop().and_then(Paragraph::render) {
                        blocks.push(block);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(blocks.join("\n\n"))
}

fn slide_paragraphs(xml: &str) -> Result<Vec<String>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"a:p" => current.clear(),
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"a:br" => current.push('\n'),
            Event::Text(e) if in_text => current.push_str(&e.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    const DOCX_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>Quarterly Report</w:t></w:r></w:p>
    <w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Summary</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Revenue grew </w:t></w:r><w:r><w:t>&amp; costs fell.</w:t></w:r></w:p>
    <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>First point</w:t></w:r></w:p>
    <w:p></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_docx_structure_to_markdown() {
        let markdown = docx_xml_to_markdown(DOCX_BODY).unwrap();

        assert_eq!(
            markdown,
            "# Quarterly Report\n\n## Summary\n\nRevenue grew & costs fell.\n\n- First point"
        );
    }

    #[test]
    fn test_docx_text_box_keeps_outer_paragraph() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
    <w:p>
      <w:r><w:t xml:space="preserve">Before the box. </w:t></w:r>
      <w:r><w:pict><w:txbxContent>
        <w:p><w:r><w:t>Boxed note</w:t></w:r></w:p>
      </w:txbxContent></w:pict></w:r>
      <w:r><w:t>After the box.</w:t></w:r>
    </w:p>
  </w:body></w:document>"#;

        let markdown = docx_xml_to_markdown(xml).unwrap();

        assert_eq!(markdown, "Boxed note\n\nBefore the box. After the box.");
    }

    #[test]
    fn test_docx_file_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("report.docx");
        write_zip(&path, &[("word/document.xml", DOCX_BODY)]);

        let markdown = docx_to_markdown(&path).unwrap();

        assert!(markdown.starts_with("# Quarterly Report"));
    }

    #[test]
    fn test_docx_without_document_part_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.docx");
        write_zip(&path, &[("[Content_Types].xml", "<Types/>")]);

        let err = docx_to_markdown(&path).unwrap_err();

        assert!(err.to_string().contains("word/document.xml"));
    }

    fn slide(texts: &[&str]) -> String {
        let paragraphs: String = texts
            .iter()
            .map(|t| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", t))
            .collect();
        format!(
            r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            paragraphs
        )
    }

    #[test]
    fn test_pptx_slides_in_numeric_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deck.pptx");
        let slide1 = slide(&["Welcome", "Agenda"]);
        let slide2 = slide(&["Details"]);
        let slide10 = slide(&["Questions"]);
        write_zip(
            &path,
            &[
                ("ppt/slides/slide10.xml", slide10.as_str()),
                ("ppt/slides/slide2.xml", slide2.as_str()),
                ("ppt/slides/slide1.xml", slide1.as_str()),
                ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
            ],
        );

        let markdown = pptx_to_markdown(&path).unwrap();

        assert_eq!(
            markdown,
            "## Slide 1\n\nWelcome\n\nAgenda\n\n## Slide 2\n\nDetails\n\n## Slide 10\n\nQuestions"
        );
    }

    #[test]
    fn test_pptx_without_slides_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.pptx");
        write_zip(&path, &[("ppt/presentation.xml", "<p:presentation/>")]);

        assert!(matches!(
            pptx_to_markdown(&path),
            Err(ConvertError::Failed(_))
        ));
    }

    #[test]
    fn test_slide_number_parsing() {
        assert_eq!(slide_number("ppt/slides/slide3.xml"), Some(3));
        assert_eq!(slide_number("ppt/slides/_rels/slide3.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }
}
