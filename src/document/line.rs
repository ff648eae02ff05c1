//! Line classification for backlog documents.
//!
//! The parser never looks at raw text directly: every line is first mapped to a
//! [`LineKind`] and the scanning loops only decide what a kind means at their position.
//! The first matching rule wins, in the order the variants are declared.

use std::sync::LazyLock;

use regex::Regex;

use super::schema::DocumentSchema;

static LINKS_RE: LazyLock<Regex> = LazyLock::new(|| {
	let link = r"\[[^\]]*\]\([^)]*\)";
	Regex::new(&format!(r"^\s*{link}(?:\s*(?:•|\|\|)?\s*{link})*\s*$")).expect("static pattern")
});

/// Keys longer than this are prose that happens to contain a colon.
const MAX_KEY_WORDS: usize = 5;

/// What a single line is, before its position in the document is taken into account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineKind<'a> {
	/// Empty or whitespace-only.
	Blank,
	/// First line of the footer under the schema's footer pattern.
	FooterStart,
	/// Opens a section; `title` is the rest of the line after the prefix, trimmed.
	SectionStart { title: &'a str },
	/// `# text`
	Title { text: &'a str },
	/// Any other line starting with `#`.
	Heading,
	/// One or more `[text](url)` joined by `•` or `||`.
	Links,
	/// `key: value` with a short key.
	Metadata { key: &'a str, value: &'a str },
	Plain,
}

impl LineKind<'_> {
	pub fn is_blank(&self) -> bool {
		matches!(self, LineKind::Blank)
	}
}

pub fn classify_line<'a>(line: &'a str, schema: &DocumentSchema) -> LineKind<'a> {
	if line.trim().is_empty() {
		return LineKind::Blank;
	}
	if schema.is_footer_start(line) {
		return LineKind::FooterStart;
	}
	if let Some(title) = schema.section_title(line) {
		return LineKind::SectionStart { title };
	}
	if let Some(text) = line.strip_prefix("# ") {
		return LineKind::Title { text: text.trim() };
	}
	if line.starts_with('#') {
		return LineKind::Heading;
	}
	if LINKS_RE.is_match(line) {
		return LineKind::Links;
	}
	if let Some((key, value)) = split_metadata(line) {
		return LineKind::Metadata { key, value };
	}
	LineKind::Plain
}

/// Split a `key: value` line. Returns `None` for lines that only look like one.
pub fn split_metadata(line: &str) -> Option<(&str, &str)> {
	let (key, value) = line.split_once(':')?;
	let key = key.trim();
	if key.is_empty() || key.starts_with(['#', '-', '*', '>', '@', '[', '`', '~']) {
		return None;
	}
	if key.split_whitespace().count() > MAX_KEY_WORDS {
		return None;
	}
	// bare urls
	if value.starts_with("//") {
		return None;
	}
	Some((key, value.trim()))
}
