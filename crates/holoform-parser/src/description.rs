// ABOUTME: Description and purpose text pulled from docstrings and source comments
// ABOUTME: Falls back to a synthesized sentence built from the first operation

use holoform_core::schema::DEFAULT_DESCRIPTION;
use holoform_core::Operation;

/// Text after the first `#` that is not inside a string literal.
pub fn inline_comment(line: &str) -> Option<&str> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in line.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '#' => {
                let comment = line[idx + 1..].trim();
                return (!comment.is_empty()).then_some(comment);
            }
            _ => {}
        }
    }
    None
}

/// Contiguous `#` lines directly above `def_line`, blank lines skipped.
pub fn comment_block_above(lines: &[&str], def_line: usize) -> Option<String> {
    let mut block = Vec::new();
    let mut idx = def_line.min(lines.len());

    while idx > 0 {
        idx -= 1;
        let trimmed = lines[idx].trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') && !trimmed.starts_with("#!") {
            block.push(trimmed);
            continue;
        }
        break;
    }

    if block.is_empty() {
        return None;
    }
    block.reverse();
    Some(block.join("\n"))
}

/// Cleans raw description text.
///
/// A block made only of `#` lines loses the markers and one following
/// space per line; anything else is kept verbatim apart from wholly blank
/// leading and trailing lines.
pub fn normalize_description(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let mut content = lines.iter().filter(|l| !l.trim().is_empty()).peekable();
    let is_comment_block =
        content.peek().is_some() && content.all(|l| l.trim_start().starts_with('#'));

    if is_comment_block {
        let cleaned: Vec<&str> = lines
            .iter()
            .map(|line| {
                let line = line.trim_start();
                let body = line.strip_prefix('#').unwrap_or(line);
                body.strip_prefix(' ').unwrap_or(body).trim_end()
            })
            .collect();
        trim_blank_edges(&cleaned)
    } else {
        trim_blank_edges(&lines)
    }
}

fn trim_blank_edges(lines: &[&str]) -> String {
    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(start);
    lines[start..=end].join("\n")
}

/// Final description for a definition.
///
/// Empty or missing source text is replaced with a sentence naming the
/// first operation's purpose, or the default when there are no operations.
pub fn finalize_description(raw: Option<&str>, id: &str, operations: &[Operation]) -> String {
    if let Some(raw) = raw {
        let normalized = normalize_description(raw);
        if !normalized.is_empty() {
            return normalized;
        }
    }
    match operations.first() {
        Some(op) => format!(
            "Auto-generated Holoform for function {}. Primary action: {}",
            id, op.semantic_purpose
        ),
        None => DEFAULT_DESCRIPTION.to_string(),
    }
}
