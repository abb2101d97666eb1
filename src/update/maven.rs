//! Maven pom updater.
//!
//! Rewrites the text of one element addressed by a slash path such as
//! `//project/properties/revision`. The element is located by streaming
//! the document and splicing the new version into its byte span, which
//! keeps formatting, comments and entity usage outside the span intact.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::config::UpdateSpec;
use crate::error::UpdateError;

enum Target {
    Element { start: usize, end: usize },
    SelfClosing { start: usize, end: usize, name: String },
}

pub(crate) fn run(
    spec: &UpdateSpec,
    content: &str,
    new_version: &str,
) -> Result<String, UpdateError> {
    let segments: Vec<&str> = spec.pom_path.trim_start_matches('/').split('/').collect();

    let mut reader = Reader::from_str(content);
    let mut stack: Vec<String> = Vec::new();
    let mut pending: Option<usize> = None;
    let mut target: Option<Target> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|source| UpdateError::XmlRewrite {
                file: spec.file_path.clone(),
                source,
            })?;

        match event {
            Event::Start(start) => {
                stack.push(element_name(start.name().as_ref()));
                if target.is_none() && pending.is_none() && at_path(&stack, &segments) {
                    pending = Some(reader.buffer_position() as usize);
                }
            }
            Event::End(_) => {
                if target.is_none() && at_path(&stack, &segments) {
                    if let Some(start) = pending.take() {
                        target = Some(Target::Element { start, end: before });
                    }
                }
                stack.pop();
            }
            Event::Empty(empty) => {
                let name = element_name(empty.name().as_ref());
                stack.push(name.clone());
                if target.is_none() && pending.is_none() && at_path(&stack, &segments) {
                    target = Some(Target::SelfClosing {
                        start: before,
                        end: reader.buffer_position() as usize,
                        name,
                    });
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match target {
        Some(Target::Element { start, end }) => Ok(format!(
            "{}{}{}",
            &content[..start],
            new_version,
            &content[end..]
        )),
        Some(Target::SelfClosing { start, end, name }) => {
            let tag = &content[start..end];
            let opened = tag[..tag.len() - 2].trim_end();
            Ok(format!(
                "{}{}>{}</{}>{}",
                &content[..start],
                opened,
                new_version,
                name,
                &content[end..]
            ))
        }
        None => Err(UpdateError::ElementNotFound {
            file: spec.file_path.clone(),
            path: spec.pom_path.clone(),
        }),
    }
}

fn element_name(qname: &[u8]) -> String {
    String::from_utf8_lossy(qname).into_owned()
}

fn at_path(stack: &[String], segments: &[&str]) -> bool {
    stack.len() == segments.len() && stack.iter().zip(segments).all(|(a, b)| a.as_str() == *b)
}
