//! Deterministic, line-oriented markdown-ish slide grammar.

use crate::slide::{CodeBlock, Slide};
use serde::{Deserialize, Serialize};

/// Language tag used when a code fence carries none.
pub const DEFAULT_CODE_LANGUAGE: &str = "text";

/// Options for the grammar parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// A line exactly equal to this separates slides.
    pub slide_delimiter: String,
    /// Repeated prefix marking a heading line (`#`, `##`, ...).
    pub title_prefix: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            slide_delimiter: "---".to_string(),
            title_prefix: "#".to_string(),
        }
    }
}

/// Line-level parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// No title found yet.
    SeekingTitle,
    /// Accumulating a run of bullet lines.
    InBullets,
    /// Inside a fenced code block.
    InCodeBlock,
    /// Title found; reading body text.
    InBody,
}

/// Grammar-based slide parser.
#[derive(Debug, Clone, Default)]
pub struct SlideParser {
    options: ParserOptions,
}

impl SlideParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse raw text into slides, dropping chunks without content.
    pub fn parse(&self, input: &str) -> Vec<Slide> {
        let chunks = self.split_into_chunks(input);
        let total = chunks.len();
        let slides: Vec<Slide> = chunks
            .into_iter()
            .map(|chunk| self.parse_chunk(&chunk))
            .filter(Slide::has_content)
            .collect();

        if slides.len() < total {
            log::debug!("Dropped {} empty slide chunk(s)", total - slides.len());
        }
        slides
    }

    /// Split the input into slide candidates.
    ///
    /// `**Frame N: ...**` markers take precedence over the delimiter line.
    fn split_into_chunks(&self, input: &str) -> Vec<String> {
        let pieces = match split_on_frame_markers(input) {
            Some(pieces) => pieces,
            None => self.split_on_delimiter(input),
        };
        pieces
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn split_on_delimiter(&self, input: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in input.split('\n') {
            if line.trim_end_matches('\r') == self.options.slide_delimiter {
                chunks.push(current.join("\n"));
                current.clear();
            } else {
                current.push(line);
            }
        }
        chunks.push(current.join("\n"));
        chunks
    }

    fn parse_chunk(&self, chunk: &str) -> Slide {
        let mut builder = ChunkBuilder::new(&self.options.title_prefix);
        for line in chunk.split('\n') {
            builder.feed(line.trim_end_matches('\r'));
        }
        builder.finish()
    }
}

/// Accumulates one chunk's lines into a slide.
struct ChunkBuilder<'a> {
    title_prefix: &'a str,
    state: ParseState,
    slide: Slide,
    bullets: Vec<String>,
    code_language: String,
    code_lines: Vec<String>,
}

impl<'a> ChunkBuilder<'a> {
    fn new(title_prefix: &'a str) -> Self {
        Self {
            title_prefix,
            state: ParseState::SeekingTitle,
            slide: Slide::default(),
            bullets: Vec::new(),
            code_language: String::new(),
            code_lines: Vec::new(),
        }
    }

    /// State to return to once a bullet run or code block ends.
    fn resting_state(&self) -> ParseState {
        if self.slide.title.is_some() {
            ParseState::InBody
        } else {
            ParseState::SeekingTitle
        }
    }

    fn feed(&mut self, raw: &str) {
        if self.state == ParseState::InCodeBlock {
            if raw.trim().starts_with("```") {
                self.close_code_block();
            } else {
                self.code_lines.push(raw.to_string());
            }
            return;
        }

        let line = raw.trim();

        if is_asterisk_rule(line) {
            return;
        }

        if let Some(item) = bullet_text(line) {
            if !item.is_empty() {
                self.bullets.push(strip_bullet_emphasis(item));
                self.state = ParseState::InBullets;
            }
            return;
        }

        if self.state == ParseState::InBullets {
            self.end_bullet_run();
            if line.is_empty() {
                return;
            }
        }

        if self.slide.title.is_none() {
            if let Some(title) = self.title_text(line) {
                if !title.is_empty() {
                    self.slide.title = Some(title.to_string());
                    self.state = ParseState::InBody;
                }
                return;
            }
        }

        if let Some(fence) = line.strip_prefix("```") {
            let language = fence.trim();
            self.code_language = if language.is_empty() {
                DEFAULT_CODE_LANGUAGE.to_string()
            } else {
                language.to_string()
            };
            self.code_lines.clear();
            self.state = ParseState::InCodeBlock;
            return;
        }

        if let Some(uri) = image_reference(line) {
            self.slide.image = Some(uri.to_string());
            return;
        }

        if line.is_empty() {
            return;
        }

        let clean = strip_emphasis(strip_cue_prefix(line));
        if !clean.is_empty() && !is_asterisk_rule(&clean) {
            self.slide.content.push(clean);
        }
    }

    /// Heading (`# Title`) or fully bold (`**Title**`) line.
    fn title_text<'l>(&self, line: &'l str) -> Option<&'l str> {
        if let Some(inner) = line
            .strip_prefix("**")
            .and_then(|rest| rest.strip_suffix("**"))
        {
            if !inner.is_empty() {
                return Some(inner.trim());
            }
        }

        if !self.title_prefix.is_empty() && line.starts_with(self.title_prefix) {
            let rest = line.trim_start_matches(self.title_prefix).trim();
            if !rest.is_empty() {
                return Some(rest);
            }
        }
        None
    }

    fn end_bullet_run(&mut self) {
        if !self.bullets.is_empty() {
            self.slide
                .bullets
                .get_or_insert_with(Vec::new)
                .append(&mut self.bullets);
        }
        self.state = self.resting_state();
    }

    fn close_code_block(&mut self) {
        self.slide.code = Some(CodeBlock {
            language: std::mem::take(&mut self.code_language),
            content: self.code_lines.join("\n"),
        });
        self.code_lines.clear();
        self.state = self.resting_state();
    }

    fn finish(mut self) -> Slide {
        match self.state {
            ParseState::InBullets => self.end_bullet_run(),
            ParseState::InCodeBlock => {
                log::debug!("Unterminated code fence; keeping captured lines");
                self.close_code_block();
            }
            ParseState::SeekingTitle | ParseState::InBody => {}
        }
        self.slide
    }
}

/// Split on `**Frame N: ...**` markers. Returns `None` when no marker is present.
fn split_on_frame_markers(input: &str) -> Option<Vec<String>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    let mut search = 0;
    let mut found = false;

    while let Some(offset) = input[search..].find("**Frame ") {
        let start = search + offset;
        match frame_marker_end(&input[start..]) {
            Some(len) => {
                pieces.push(input[last..start].to_string());
                last = start + len;
                search = last;
                found = true;
            }
            None => search = start + "**Frame ".len(),
        }
    }

    if !found {
        return None;
    }
    pieces.push(input[last..].to_string());
    Some(pieces)
}

/// Length of a `**Frame <digits>:<anything>**` marker at the start of `text`,
/// confined to one line.
fn frame_marker_end(text: &str) -> Option<usize> {
    let after = text.strip_prefix("**Frame ")?;
    let digits = after.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = after[digits..].strip_prefix(':')?;
    let line = rest.split('\n').next().unwrap_or("");
    let close = line.find("**")?;
    Some(text.len() - rest.len() + close + 2)
}

/// Lines made only of asterisks separate narration blocks.
fn is_asterisk_rule(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '*')
}

/// Text of a bullet line (`- x`, `* x`, `• x`, `12. x`), untrimmed marker removed.
fn bullet_text(line: &str) -> Option<&str> {
    let rest = if let Some(rest) = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('*'))
        .or_else(|| line.strip_prefix('•'))
    {
        rest
    } else {
        let digits = line.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        line[digits..].strip_prefix('.')?
    };

    let item = rest.trim_start();
    if item.len() == rest.len() || item.is_empty() {
        return None;
    }
    Some(item.trim())
}

/// `![alt](uri)` on a line of its own.
fn image_reference(line: &str) -> Option<&str> {
    let body = line.strip_prefix("![")?.strip_suffix(')')?;
    let split = body.rfind("](")?;
    Some(&body[split + 2..])
}

/// Remove a leading `Narration:` and/or `Visual:`/`Visuals:` cue.
fn strip_cue_prefix(line: &str) -> &str {
    let mut text = line;
    for cue in ["narration:", "visuals:", "visual:"] {
        let candidate = text.strip_prefix('*').unwrap_or(text).trim_start();
        if let Some(head) = candidate.get(..cue.len()) {
            if head.eq_ignore_ascii_case(cue) {
                text = candidate[cue.len()..].trim_start();
            }
        }
    }
    text
}

/// Bullet text: every `**` is dropped, then `*italic*` pairs unwrapped.
fn strip_bullet_emphasis(text: &str) -> String {
    unwrap_pairs(&text.replace("**", ""), "*")
}

/// Body text: `**bold**` then `*italic*` pairs unwrapped.
pub(crate) fn strip_emphasis(text: &str) -> String {
    unwrap_pairs(&unwrap_pairs(text, "**"), "*")
}

/// Replace every `<m>inner<m>` (non-empty inner, shortest match) with `inner`.
fn unwrap_pairs(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(marker) {
        let after_open = &rest[open + marker.len()..];
        let Some(first) = after_open.chars().next() else {
            break;
        };
        let skip = first.len_utf8();
        match after_open[skip..].find(marker) {
            Some(close) => {
                out.push_str(&rest[..open]);
                out.push_str(&after_open[..skip + close]);
                rest = &after_open[skip + close + marker.len()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Parse markdown-style input with default options.
pub fn parse_markdown_to_slides(input: &str) -> Vec<Slide> {
    SlideParser::default().parse(input)
}

/// Parse text where each slide starts with a `Slide N:` line.
pub fn parse_numbered_slides(input: &str) -> Vec<Slide> {
    let parser = SlideParser::default();
    let delimiter = &parser.options().slide_delimiter;
    let mut processed = String::with_capacity(input.len());
    for (i, line) in input.split('\n').enumerate() {
        if i > 0 {
            processed.push('\n');
        }
        if is_numbered_slide_heading(line) {
            processed.push_str(delimiter);
            processed.push('\n');
        }
        processed.push_str(line);
    }
    parser.parse(&processed)
}

fn is_numbered_slide_heading(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("Slide ") else {
        return false;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && rest[digits..].starts_with(':')
}
