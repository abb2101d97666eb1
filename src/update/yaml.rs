//! YAML updater.
//!
//! Rewrites the value of one mapping key addressed by a dotted path such
//! as `.info.version`. The file is edited line by line instead of being
//! parsed and re-rendered, so quoting, comments and block scalars survive
//! untouched.

use crate::config::UpdateSpec;
use crate::error::UpdateError;

struct KeyLine {
    /// Unquoted key text, for path matching.
    name: String,
    /// Byte index of the separating `:` within the trimmed line.
    colon: usize,
    /// Trimmed text after the colon.
    value: String,
}

pub(crate) fn run(
    spec: &UpdateSpec,
    content: &str,
    new_version: &str,
) -> Result<String, UpdateError> {
    let segments: Vec<&str> = spec.yaml_path.trim_start_matches('.').split('.').collect();

    let mut rendered: Vec<String> = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut block_indent: Option<usize> = None;
    let mut matched = false;

    for line in content.split('\n') {
        if matched {
            rendered.push(line.to_string());
            continue;
        }

        let indent = line.len() - line.trim_start_matches(' ').len();
        let trimmed = &line[indent..];

        // leave literal and folded block bodies alone
        if let Some(limit) = block_indent {
            if trimmed.is_empty() || indent > limit {
                rendered.push(line.to_string());
                continue;
            }
            block_indent = None;
        }

        let Some(key) = parse_key(trimmed) else {
            rendered.push(line.to_string());
            continue;
        };

        while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
            stack.pop();
        }
        stack.push((indent, key.name.clone()));

        if at_path(&stack, &segments) {
            rendered.push(rewrite(line, indent, key.colon, new_version));
            matched = true;
            continue;
        }

        if key.value.starts_with('|') || key.value.starts_with('>') {
            block_indent = Some(indent);
        }

        rendered.push(line.to_string());
    }

    if !matched {
        return Err(UpdateError::PathNotFound {
            file: spec.file_path.clone(),
            path: spec.yaml_path.clone(),
        });
    }

    Ok(rendered.join("\n"))
}

fn parse_key(trimmed: &str) -> Option<KeyLine> {
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
        return None;
    }

    let bytes = trimmed.as_bytes();
    let (name, colon) = match bytes[0] {
        quote @ (b'"' | b'\'') => {
            let close = trimmed[1..].find(quote as char)? + 1;
            let colon = close + 1;
            if bytes.get(colon) != Some(&b':') {
                return None;
            }
            if !matches!(bytes.get(colon + 1), None | Some(&b' ')) {
                return None;
            }
            (trimmed[1..close].to_string(), colon)
        }
        _ => {
            let colon = (0..bytes.len()).find(|&i| {
                bytes[i] == b':' && matches!(bytes.get(i + 1), None | Some(&b' '))
            })?;
            (trimmed[..colon].trim_end().to_string(), colon)
        }
    };

    // a colon inside a flow collection does not make this line a key
    if name.contains('{') || name.contains('[') {
        return None;
    }

    let value = trimmed[colon + 1..].trim().to_string();
    Some(KeyLine { name, colon, value })
}

fn at_path(stack: &[(usize, String)], segments: &[&str]) -> bool {
    stack.len() == segments.len()
        && stack.iter().zip(segments).all(|((_, key), s)| key.as_str() == *s)
}

fn rewrite(line: &str, indent: usize, colon: usize, new_version: &str) -> String {
    let head = &line[..indent + colon + 1];
    let after = &line[indent + colon + 1..];

    match trailing_comment(after) {
        Some(offset) => format!("{head} {new_version} {}", after[offset..].trim_end()),
        None => format!("{head} {new_version}"),
    }
}

fn trailing_comment(after: &str) -> Option<usize> {
    let bytes = after.as_bytes();
    let mut in_single = false;
    let mut in_double = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'#' if !in_single && !in_double => {
                if i == 0 || bytes[i - 1] == b' ' || bytes[i - 1] == b'\t' {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
