// Clean patient-supplied text before it is placed in an LLM prompt.

/// Maximum characters of patient text forwarded to the LLM.
pub const MAX_INPUT_CHARS: usize = 50_000;

const TRUNCATION_MARKER: &str = "…[TRUNCATED]";

/// Strip invisible characters, normalize whitespace, and cap the length.
///
/// Never logs the text itself, only its size.
pub fn sanitize_for_llm(raw: &str) -> String {
    let visible = remove_invisible_chars(raw);
    let normalized = normalize_whitespace(&visible);
    let (out, truncated) = truncate_chars(&normalized, MAX_INPUT_CHARS);
    if truncated {
        tracing::warn!(
            original_chars = normalized.chars().count(),
            max_chars = MAX_INPUT_CHARS,
            "Prompt input truncated"
        );
    }
    out
}

fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| match *c {
            ' ' | '\n' | '\t' | '\r' => true,
            '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' => false,
            '\u{FEFF}' => false,
            c => !c.is_control(),
        })
        .collect()
}

/// Trim every line, collapse runs of inner spaces and blank lines.
fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut prev_blank = true;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !prev_blank {
                lines.push(String::new());
            }
            prev_blank = true;
        } else {
            lines.push(collapsed);
            prev_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Cut at a char boundary, preferring the last whitespace before the limit.
fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return (text.to_string(), false);
    };

    let head = &text[..cut];
    let end = head.rfind(char::is_whitespace).unwrap_or(head.len());
    (format!("{}{}", &head[..end], TRUNCATION_MARKER), true)
}
