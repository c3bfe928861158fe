//! Deterministic word-greedy text wrapping.

/// Character budget per generated line, independent of font size.
pub const DEFAULT_WRAP_WIDTH: usize = 60;

/// Wrap `text` greedily on single spaces.
///
/// A word joins the current line while `len + 1 + word_len <= max_chars`.
/// Words longer than the budget get a line of their own and are never split.
/// Runs of spaces are preserved inside a line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split(' ') {
        let word_len = word.chars().count();
        if current_len + word_len + 1 <= max_chars {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap each line of a multi-line block separately.
pub fn wrap_block(text: &str, max_chars: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| wrap_text(line, max_chars))
        .collect()
}

/// Wrap paragraphs, separating them with blank lines when there is more than one.
pub fn break_content_into_lines(paragraphs: &[String], max_chars: usize) -> Vec<String> {
    let separate = paragraphs.len() > 1;
    let mut lines = Vec::new();
    for paragraph in paragraphs {
        lines.extend(wrap_text(paragraph, max_chars));
        if separate {
            lines.push(String::new());
        }
    }
    lines
}
