//! OOXML (`.docx`) paragraph extraction.
//!
//! Reads `word/document.xml` out of the zip container and walks it with
//! `quick-xml`'s pull parser. Only paragraphs that are direct children of
//! `w:body` are returned; table cells, text boxes and drawings are skipped.

use std::io::{Read, Seek};

use quick_xml::events::Event;

use crate::error::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the paragraphs of a `.docx` archive.
pub fn paragraphs_from_docx<R: Read + Seek>(reader: R) -> Result<Vec<String>> {
  let mut archive = zip::ZipArchive::new(reader)?;
  let mut part = match archive.by_name(DOCUMENT_PART) {
    Ok(part) => part,
    Err(zip::result::ZipError::FileNotFound) => {
      return Err(Error::MissingPart(DOCUMENT_PART));
    }
    Err(e) => return Err(e.into()),
  };

  let mut xml = Vec::with_capacity(part.size() as usize);
  part.read_to_end(&mut xml)?;
  paragraphs_from_document_xml(&xml)
}

/// Extract paragraph texts from the bytes of a `word/document.xml` part.
///
/// Each paragraph is the concatenation of its `w:t` runs, with `w:tab` as a
/// tab and `w:br` / `w:cr` as a newline. Paragraphs are trimmed; empty ones
/// are dropped.
pub fn paragraphs_from_document_xml(xml: &[u8]) -> Result<Vec<String>> {
  let mut reader = quick_xml::Reader::from_reader(xml);

  let mut paragraphs = Vec::new();
  let mut stack: Vec<Vec<u8>> = Vec::new();
  let mut buf = Vec::new();

  // Depth of the body-level `w:p` being read, and its text so far.
  let mut current: Option<(usize, String)> = None;
  let mut in_text = false;
  let mut skip_depth = 0usize;

  loop {
    match reader.read_event_into(&mut buf)? {
      Event::Start(ref e) => {
        let local = e.local_name().as_ref().to_vec();
        let parent_is_body = stack.last().is_some_and(|p| p == b"body");

        if is_skipped_container(&local) {
          skip_depth += 1;
        }

        if let Some((_, text)) = &mut current {
          if skip_depth == 0 {
            if local == b"t" {
              in_text = true;
            } else {
              push_special(text, &local);
            }
          }
        } else if local == b"p" && parent_is_body {
          current = Some((stack.len() + 1, String::new()));
        }

        stack.push(local);
      }
      Event::Empty(ref e) => {
        if let Some((_, text)) = &mut current
          && skip_depth == 0
        {
          push_special(text, e.local_name().as_ref());
        }
      }
      Event::Text(ref t) if in_text => {
        if let Some((_, text)) = &mut current {
          text.push_str(&t.unescape()?);
        }
      }
      Event::CData(ref t) if in_text => {
        if let Some((_, text)) = &mut current {
          text.push_str(&String::from_utf8_lossy(t));
        }
      }
      Event::End(_) => {
        let depth = stack.len();
        let Some(local) = stack.pop() else { continue };

        if is_skipped_container(&local) {
          skip_depth = skip_depth.saturating_sub(1);
        }
        if local == b"t" {
          in_text = false;
        }
        if local == b"p"
          && let Some((_, text)) = current.take_if(|(d, _)| *d == depth)
        {
          let trimmed = text.trim();
          if !trimmed.is_empty() {
            paragraphs.push(trimmed.to_owned());
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

/// Subtrees whose content never reaches the paragraph text. Property
/// blocks are included: `w:pPr/w:tabs` holds `w:tab` stop definitions.
fn is_skipped_container(local: &[u8]) -> bool {
  matches!(
    local,
    b"drawing" | b"pict" | b"txbxContent" | b"AlternateContent" | b"pPr" | b"rPr"
  )
}

fn push_special(text: &mut String, local: &[u8]) {
  match local {
    b"tab" => text.push('\t'),
    b"br" | b"cr" => text.push('\n'),
    _ => {}
  }
}
