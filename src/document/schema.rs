//! Per-document-kind parsing rules.
//!
//! Every kind of file the backlog persists (items, overviews, ideas, ...) uses the same
//! structured-document engine, but with its own allow-lists, section prefix and footer
//! convention. A [`DocumentSchema`] carries those rules into the parser.

use std::sync::LazyLock;

use clap::ValueEnum;
use regex::{Regex, RegexBuilder};

use super::error::SchemaError;

static DEFAULT_COMMENTS_HEADING: LazyLock<Regex> = LazyLock::new(|| compile(r"^#+\s*comments\s*$").expect("static pattern"));
static DEFAULT_BOTTOM_HEADING: LazyLock<Regex> = LazyLock::new(|| compile(r"^##\s*metadata\s*$").expect("static pattern"));

/// Compile a user-supplied pattern, case-insensitively.
pub(crate) fn compile(pattern: &str) -> Result<Regex, SchemaError> {
	RegexBuilder::new(pattern).case_insensitive(true).build().map_err(|source| SchemaError::InvalidPattern {
		pattern: pattern.to_string(),
		source,
	})
}

/// Allow-list of metadata keys: exact names plus whole-key patterns, all case-insensitive.
#[derive(Clone, Debug, Default)]
pub struct KeyRules {
	exact: Vec<String>,
	patterns: Vec<Regex>,
}

impl KeyRules {
	pub fn new() -> Self {
		Self::default()
	}

	/// Rules accepting exactly the given keys.
	pub fn exact<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>, {
		Self {
			exact: keys.into_iter().map(Into::into).collect(),
			patterns: Vec::new(),
		}
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.exact.push(key.into());
		self
	}

	/// Add a pattern. It is anchored, so `due .+` accepts `Due date` but not `Overdue date`.
	pub fn with_pattern(mut self, pattern: &str) -> Result<Self, SchemaError> {
		// Validate as written first, so errors name the user's pattern rather than the anchored wrapper.
		compile(pattern)?;
		self.patterns.push(compile(&format!("^(?:{pattern})$"))?);
		Ok(self)
	}

	pub fn matches(&self, key: &str) -> bool {
		let key = key.trim();
		self.exact.iter().any(|k| k.eq_ignore_ascii_case(key)) || self.patterns.iter().any(|p| p.is_match(key))
	}

	pub fn is_empty(&self) -> bool {
		self.exact.is_empty() && self.patterns.is_empty()
	}
}

/// The kinds of files persisted in a backlog repository.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, ValueEnum)]
pub enum DocumentKind {
	/// A single backlog item (story, bug, chore).
	#[default]
	Item,
	/// A project overview listing items by status section.
	Overview,
	Idea,
	User,
	/// The global index linking every project.
	Index,
	/// Generated pages: velocity, tags, timeline.
	Page,
}

impl DocumentKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			DocumentKind::Item => "item",
			DocumentKind::Overview => "overview",
			DocumentKind::Idea => "idea",
			DocumentKind::User => "user",
			DocumentKind::Index => "index",
			DocumentKind::Page => "page",
		}
	}

	pub fn all() -> [DocumentKind; 6] {
		[DocumentKind::Item, DocumentKind::Overview, DocumentKind::Idea, DocumentKind::User, DocumentKind::Index, DocumentKind::Page]
	}
}

/// Parsing and serialization rules for one kind of document.
#[derive(Clone, Debug)]
pub struct DocumentSchema {
	/// Keys allowed in the block under the title/header/links.
	pub top_keys: KeyRules,
	/// Keys allowed only under the trailing `## Metadata` heading.
	pub bottom_keys: KeyRules,
	/// Heading prefix opening a section, e.g. `### `. Empty disables sectioning.
	pub section_prefix: String,
	/// Matches the first line of the footer.
	pub footer: Option<Regex>,
	pub comments_heading: Regex,
	pub bottom_heading: Regex,
	/// Drop sections created in this session that never received a line.
	pub hide_empty_sections: bool,
}

impl Default for DocumentSchema {
	fn default() -> Self {
		Self {
			top_keys: KeyRules::default(),
			bottom_keys: KeyRules::default(),
			section_prefix: String::new(),
			footer: None,
			comments_heading: DEFAULT_COMMENTS_HEADING.clone(),
			bottom_heading: DEFAULT_BOTTOM_HEADING.clone(),
			hide_empty_sections: false,
		}
	}
}

impl DocumentSchema {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_top_keys(mut self, rules: KeyRules) -> Self {
		self.top_keys = rules;
		self
	}

	pub fn with_bottom_keys(mut self, rules: KeyRules) -> Self {
		self.bottom_keys = rules;
		self
	}

	pub fn with_section_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.section_prefix = prefix.into();
		self
	}

	pub fn with_footer(mut self, pattern: &str) -> Result<Self, SchemaError> {
		self.footer = Some(compile(pattern)?);
		Ok(self)
	}

	pub fn with_comments_heading(mut self, pattern: &str) -> Result<Self, SchemaError> {
		self.comments_heading = compile(pattern)?;
		Ok(self)
	}

	pub fn with_bottom_heading(mut self, pattern: &str) -> Result<Self, SchemaError> {
		self.bottom_heading = compile(pattern)?;
		Ok(self)
	}

	pub fn hide_empty_sections(mut self, hide: bool) -> Self {
		self.hide_empty_sections = hide;
		self
	}

	/// The rules the backlog ships with for each kind of document.
	pub fn builtin(kind: DocumentKind) -> Self {
		let base = Self::default();
		match kind {
			DocumentKind::Item => base
				.with_top_keys(KeyRules::exact(["Created", "Modified", "Status", "Assigned", "Points", "Tags", "Iteration"]))
				.with_bottom_keys(KeyRules::exact(["Finished", "Archived", "Imported from"]).with_pattern(r".+ date").expect("static pattern")),
			DocumentKind::Overview => base
				.with_top_keys(KeyRules::exact(["Created", "Modified", "Status", "Owner", "Iteration", "Velocity"]))
				.with_section_prefix("### ")
				.with_footer(r"^\[Archived stories\]")
				.expect("static pattern")
				.hide_empty_sections(true),
			DocumentKind::Idea => base.with_top_keys(KeyRules::exact(["Created", "Modified", "Status", "Author", "Tags"])),
			DocumentKind::User => base
				.with_top_keys(KeyRules::exact(["Name", "Email", "Created", "Modified"]))
				.with_bottom_keys(KeyRules::new().with_pattern(r"notify .+").expect("static pattern"))
				.with_section_prefix("## ")
				.hide_empty_sections(true),
			DocumentKind::Index => base.with_top_keys(KeyRules::exact(["Modified"])).with_section_prefix("## ").hide_empty_sections(true),
			DocumentKind::Page => base.with_top_keys(KeyRules::exact(["Generated"])).with_section_prefix("## "),
		}
	}

	/// Allowed in either partition. Used to tell a metadata line from a free-standing header.
	pub fn is_known_key(&self, key: &str) -> bool {
		self.top_keys.matches(key) || self.bottom_keys.matches(key)
	}

	/// Section title if `line` opens a section under this schema.
	pub fn section_title<'a>(&self, line: &'a str) -> Option<&'a str> {
		if self.section_prefix.is_empty() {
			return None;
		}
		line.strip_prefix(self.section_prefix.as_str()).map(str::trim)
	}

	/// Render a section heading for `title`.
	pub fn section_heading(&self, title: &str) -> String {
		format!("{}{title}", self.section_prefix)
	}

	pub fn is_footer_start(&self, line: &str) -> bool {
		self.footer.as_ref().is_some_and(|re| re.is_match(line))
	}

	pub fn is_comments_heading(&self, line: &str) -> bool {
		self.comments_heading.is_match(line.trim_end())
	}

	pub fn is_bottom_heading(&self, line: &str) -> bool {
		self.bottom_heading.is_match(line.trim_end())
	}
}
