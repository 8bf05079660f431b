//! The immutable script value and the small string helpers shared by the
//! detectors.

use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());

static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["'\u{201D}\u{2019})\]]*(?:\s+|$)"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Byte offset of the first non-blank character in the raw script.
    pub offset: usize,
    pub text: String,
    pub sentences: Vec<String>,
}

impl Paragraph {
    /// Index of the sentence containing the byte `pos` (relative to the paragraph).
    pub fn sentence_index_at(&self, pos: usize) -> usize {
        SENTENCE_END_RE
            .find_iter(&self.text)
            .take_while(|m| m.end() <= pos)
            .count()
    }
}

/// A draft script split into paragraphs and sentences. Never mutated; the
/// normalizer produces new values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptText {
    raw: String,
    paragraphs: Vec<Paragraph>,
}

impl ScriptText {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut paragraphs = Vec::new();
        let mut last = 0;
        for m in PARAGRAPH_BREAK_RE.find_iter(&raw) {
            push_paragraph(&mut paragraphs, &raw, last, m.start());
            last = m.end();
        }
        push_paragraph(&mut paragraphs, &raw, last, raw.len());
        Self { raw, paragraphs }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.raw)
    }

    /// Paragraph index holding byte `pos` of the raw text.
    pub fn paragraph_index_at(&self, pos: usize) -> Option<usize> {
        self.paragraphs
            .iter()
            .rposition(|p| p.offset <= pos && pos < p.offset + p.text.len())
    }
}

fn push_paragraph(out: &mut Vec<Paragraph>, raw: &str, start: usize, end: usize) {
    let segment = &raw[start..end];
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = segment.len() - segment.trim_start().len();
    out.push(Paragraph {
        offset: start + lead,
        text: trimmed.to_string(),
        sentences: split_sentences(trimmed),
    });
}

/// Split on sentence terminators, keeping the terminator with its sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        let s = text[last..m.end()].trim();
        if !s.is_empty() {
            sentences.push(s.to_string());
        }
        last = m.end();
    }
    let tail = text[last..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Byte ranges `(start, end)` of every sentence, terminator and trailing
/// whitespace included, covering the whole of `text`.
pub(crate) fn sentence_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        ranges.push((last, m.end()));
        last = m.end();
    }
    if last < text.len() {
        ranges.push((last, text.len()));
    }
    ranges
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The first `chars` characters of `text`.
pub fn char_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Shorten `text` to at most `chars` characters, marking the cut.
pub fn excerpt(text: &str, chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let prefix = char_prefix(&flat, chars);
    if prefix.len() < flat.len() {
        format!("{prefix}...")
    } else {
        flat
    }
}

/// Snap a byte offset to a valid char boundary.
/// If `forward` is true, snap forward; otherwise snap backward.
pub fn snap_to_char_boundary(text: &str, pos: usize, forward: bool) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    if forward {
        while p < text.len() && !text.is_char_boundary(p) {
            p += 1;
        }
    } else {
        while p > 0 && !text.is_char_boundary(p) {
            p -= 1;
        }
    }
    p
}

/// Byte range spanning `radius` characters on each side of `start..end`.
pub fn window_around(text: &str, start: usize, end: usize, radius: usize) -> (usize, usize) {
    let start = snap_to_char_boundary(text, start, false);
    let end = snap_to_char_boundary(text, end.max(start), true);
    let lo = match radius {
        0 => start,
        r => text[..start]
            .char_indices()
            .rev()
            .nth(r - 1)
            .map_or(0, |(i, _)| i),
    };
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    (lo, hi)
}

/// Uppercase the first character of `text`.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let script = ScriptText::parse("Primeiro. Segundo!\n\n  \n\nTerceiro?\nAinda terceiro.\n\n");
        let paras = script.paragraphs();
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].sentences, vec!["Primeiro.", "Segundo!"]);
        assert_eq!(paras[1].text, "Terceiro?\nAinda terceiro.");
        assert_eq!(paras[1].sentences.len(), 2);
        assert_eq!(&script.as_str()[paras[1].offset..paras[1].offset + 9], "Terceiro?");
    }

    #[test]
    fn blank_script_has_no_paragraphs() {
        let script = ScriptText::parse(" \n\n\t");
        assert!(script.is_blank());
        assert!(script.paragraphs().is_empty());
    }

    #[test]
    fn char_prefix_counts_characters_not_bytes() {
        assert_eq!(char_prefix("ação rápida", 4), "ação");
        assert_eq!(char_prefix("curto", 50), "curto");
    }

    #[test]
    fn window_radius_counts_characters() {
        let text = "ãããã Nome çççç";
        let (start, end) = (9, 13);
        assert_eq!(&text[start..end], "Nome");
        let (lo, hi) = window_around(text, start, end, 3);
        assert_eq!(&text[lo..hi], "ãã Nome çç");
        assert_eq!(window_around(text, start, end, 50), (0, text.len()));
        assert_eq!(window_around(text, start, end, 0), (start, end));
    }

    #[test]
    fn sentence_index_tracks_terminators() {
        let script = ScriptText::parse("Um. Dois? Três.");
        let para = &script.paragraphs()[0];
        assert_eq!(para.sentence_index_at(0), 0);
        assert_eq!(para.sentence_index_at(5), 1);
        assert_eq!(para.sentence_index_at(11), 2);
    }

    #[test]
    fn capitalize_handles_accents() {
        assert_eq!(capitalize_first("é assim"), "É assim");
        assert_eq!(capitalize_first(""), "");
    }
}
