//! package.json updater.
//!
//! Replaces the top level `"version"` value by splicing the raw text, so
//! indentation style and key order stay exactly as committed. A file
//! without a top level version is passed through unchanged.

use serde_json::{Map, Value};

use crate::config::UpdateSpec;
use crate::error::UpdateError;

pub(crate) fn run(
    spec: &UpdateSpec,
    content: &str,
    new_version: &str,
) -> Result<String, UpdateError> {
    let parsed: Map<String, Value> =
        serde_json::from_str(content).map_err(|source| UpdateError::InvalidJson {
            file: spec.file_path.clone(),
            source,
        })?;

    if !parsed.contains_key("version") {
        return Ok(content.to_string());
    }

    let (start, end) =
        top_level_value_span(content, "version").ok_or_else(|| UpdateError::PathNotFound {
            file: spec.file_path.clone(),
            path: "version".to_string(),
        })?;

    Ok(format!(
        "{}\"{}\"{}",
        &content[..start],
        new_version,
        &content[end..]
    ))
}

/// Byte span of the value belonging to `key` in the top level object.
fn top_level_value_span(content: &str, key: &str) -> Option<(usize, usize)> {
    let bytes = content.as_bytes();
    let mut i = skip_ws(bytes, 0);

    if *bytes.get(i)? != b'{' {
        return None;
    }
    i += 1;

    loop {
        i = skip_ws(bytes, i);
        match *bytes.get(i)? {
            b'}' => return None,
            b',' => i += 1,
            b'"' => {
                let key_end = end_of_string(bytes, i)?;
                let name = &content[i + 1..key_end - 1];

                i = skip_ws(bytes, key_end);
                if *bytes.get(i)? != b':' {
                    return None;
                }
                i = skip_ws(bytes, i + 1);

                let value_end = end_of_value(bytes, i)?;
                if name == key {
                    return Some((i, value_end));
                }
                i = value_end;
            }
            _ => return None,
        }
    }
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r') {
        i += 1;
    }
    i
}

/// Index one past the closing quote of the string starting at `start`.
fn end_of_string(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn end_of_value(bytes: &[u8], start: usize) -> Option<usize> {
    match *bytes.get(start)? {
        b'"' => end_of_string(bytes, start),
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut i = start;
            while i < bytes.len() {
                match bytes[i] {
                    b'"' => {
                        i = end_of_string(bytes, i)?;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            None
        }
        _ => {
            let mut i = start;
            while i < bytes.len() && !matches!(bytes[i], b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r')
            {
                i += 1;
            }
            Some(i)
        }
    }
}
