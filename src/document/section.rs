//! Named blocks of lines introduced by the schema's section prefix.

use serde::Serialize;

/// A section: its title and body lines, without the heading line itself.
///
/// Every mutator reports whether the body actually changed, and only a real change
/// marks the owning document dirty.
#[derive(Clone, Debug, Serialize)]
pub struct Section {
	title: String,
	lines: Vec<String>,
	/// Heading line as read, until the title changes.
	#[serde(skip)]
	heading: Option<String>,
	/// Blank lines that preceded the heading in the source. `None` means one.
	#[serde(skip)]
	pub(crate) gap: Option<usize>,
	#[serde(skip)]
	existed_on_load: bool,
	#[serde(skip)]
	modified: bool,
}

impl PartialEq for Section {
	fn eq(&self, other: &Self) -> bool {
		self.title == other.title && self.lines == other.lines
	}
}

impl Section {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			lines: Vec::new(),
			heading: None,
			gap: None,
			existed_on_load: false,
			modified: false,
		}
	}

	pub(crate) fn parsed(title: &str, heading: &str, gap: usize) -> Self {
		Self {
			existed_on_load: true,
			heading: Some(heading.to_string()),
			gap: Some(gap),
			..Self::new(title)
		}
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub(crate) fn set_title(&mut self, title: &str) {
		self.title = title.to_string();
		self.heading = None;
		self.modified = true;
	}

	/// The source heading line, if the section was parsed and not renamed since.
	pub(crate) fn heading(&self) -> Option<&str> {
		self.heading.as_deref()
	}

	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	/// Whether the heading was present in the file this section was parsed from.
	pub fn existed_on_load(&self) -> bool {
		self.existed_on_load
	}

	/// No line with visible content.
	pub fn is_empty(&self) -> bool {
		self.lines.iter().all(|l| l.trim().is_empty())
	}

	pub fn contains_line(&self, line: &str) -> bool {
		self.lines.iter().any(|l| l == line)
	}

	pub fn set_lines(&mut self, lines: Vec<String>) -> bool {
		if self.lines == lines {
			return false;
		}
		self.lines = lines;
		self.modified = true;
		true
	}

	pub fn push_line(&mut self, line: impl Into<String>) {
		self.lines.push(line.into());
		self.modified = true;
	}

	/// Insert at `index`, or append when `index` is past the end.
	pub fn insert_line(&mut self, index: usize, line: impl Into<String>) {
		let index = index.min(self.lines.len());
		self.lines.insert(index, line.into());
		self.modified = true;
	}

	/// Remove the first line equal to `line`.
	pub fn remove_line(&mut self, line: &str) -> bool {
		let Some(i) = self.lines.iter().position(|l| l == line) else {
			return false;
		};
		self.lines.remove(i);
		self.modified = true;
		true
	}

	pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> bool {
		let before = self.lines.len();
		self.lines.retain(|l| keep(l));
		let changed = self.lines.len() != before;
		self.modified |= changed;
		changed
	}

	pub(crate) fn push_parsed(&mut self, line: &str) {
		self.lines.push(line.to_string());
	}

	pub fn is_modified(&self) -> bool {
		self.modified
	}

	pub(crate) fn mark_clean(&mut self) {
		self.modified = false;
	}
}
