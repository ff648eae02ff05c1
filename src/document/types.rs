//! The in-memory model of one backlog markdown file.

use std::{
	fmt, fs, io,
	path::{Path, PathBuf},
	sync::Arc,
};

use serde::{Serialize, Serializer};

use super::{
	comments::{self, Comment},
	error::DocumentError,
	metadata::{MetadataEntry, MetadataStore},
	schema::DocumentSchema,
	section::Section,
};

/// Blank lines that preceded each block in the source. `None` renders the canonical single blank line.
#[derive(Clone, Debug, Default)]
pub(super) struct Spacing {
	/// Blank lines before the first block.
	pub leading: usize,
	pub header: Option<usize>,
	pub links: Option<usize>,
	pub top_metadata: Option<usize>,
	pub free_text: Option<usize>,
	pub footer: Option<usize>,
	pub bottom_metadata: Option<usize>,
	/// Blank lines after the last bottom metadata entry.
	pub bottom_trailing: usize,
}

/// A parsed document.
///
/// Rendered in a fixed order: title, header, links, top metadata, free text, sections,
/// footer, bottom metadata. Every setter reports whether it changed anything, and
/// [`Document::save`] only touches the file when something did.
#[derive(Clone, Debug)]
pub struct Document {
	pub(super) schema: Arc<DocumentSchema>,
	pub(super) path: Option<PathBuf>,
	/// The whole `# ...` line.
	pub(super) title_line: Option<String>,
	pub(super) header: Option<String>,
	pub(super) links: Option<String>,
	pub(super) metadata: MetadataStore,
	pub(super) free_text: Vec<String>,
	pub(super) sections: Vec<Section>,
	pub(super) footer: Vec<String>,
	/// Bottom metadata heading as written in the source.
	pub(super) bottom_heading: Option<String>,
	pub(super) spacing: Spacing,
	pub(super) trailing_newline: bool,
	pub(super) dirty: bool,
}

fn has_visible(lines: &[String]) -> bool {
	lines.iter().any(|l| !l.trim().is_empty())
}

impl Document {
	/// An empty document for a new entity.
	pub fn new(schema: Arc<DocumentSchema>) -> Self {
		let metadata = MetadataStore::new(schema.top_keys.clone(), schema.bottom_keys.clone());
		Self {
			schema,
			path: None,
			title_line: None,
			header: None,
			links: None,
			metadata,
			free_text: Vec::new(),
			sections: Vec::new(),
			footer: Vec::new(),
			bottom_heading: None,
			spacing: Spacing::default(),
			trailing_newline: true,
			dirty: false,
		}
	}

	/// Read and parse `path`. A missing file yields an empty document bound to that path.
	pub fn load(path: impl AsRef<Path>, schema: Arc<DocumentSchema>) -> Result<Self, DocumentError> {
		let path = path.as_ref();
		let mut doc = match fs::read_to_string(path) {
			Ok(text) => Self::parse(&text, schema),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				tracing::debug!("[load] {} does not exist, starting empty", path.display());
				Self::new(schema)
			}
			Err(source) => {
				return Err(DocumentError::Read {
					path: path.to_path_buf(),
					source,
				});
			}
		};
		doc.path = Some(path.to_path_buf());
		Ok(doc)
	}

	/// Write back to the path this document was loaded from, if anything changed.
	///
	/// Returns whether the file was written.
	pub fn save(&mut self) -> Result<bool, DocumentError> {
		let Some(path) = self.path.clone() else {
			tracing::debug!("[save] document has no path, nothing to do");
			return Ok(false);
		};
		if !self.is_dirty() {
			tracing::debug!("[save] {} unchanged, skipping write", path.display());
			return Ok(false);
		}
		self.write_to(&path)?;
		Ok(true)
	}

	/// Write to `path` unconditionally and bind the document to it.
	pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
		let path = path.as_ref().to_path_buf();
		self.write_to(&path)?;
		self.path = Some(path);
		Ok(())
	}

	fn write_to(&mut self, path: &Path) -> Result<(), DocumentError> {
		let write_err = |source| DocumentError::Write { path: path.to_path_buf(), source };
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(write_err)?;
		}
		fs::write(path, self.to_markdown()).map_err(write_err)?;
		tracing::debug!("[save] wrote {}", path.display());
		self.mark_clean();
		Ok(())
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn schema(&self) -> &DocumentSchema {
		&self.schema
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty || self.metadata.is_modified() || self.sections.iter().any(Section::is_modified)
	}

	/// Forget pending changes, as after a save.
	pub fn mark_clean(&mut self) {
		self.dirty = false;
		self.metadata.mark_clean();
		self.sections.iter_mut().for_each(Section::mark_clean);
	}

	//==============================================================================
	// Title, header, links
	//==============================================================================

	pub fn title(&self) -> Option<&str> {
		self.title_line.as_deref().map(|l| l.strip_prefix("# ").unwrap_or(l).trim())
	}

	pub fn set_title(&mut self, title: Option<&str>) -> bool {
		if self.title() == title {
			return false;
		}
		self.title_line = title.map(|t| format!("# {t}"));
		self.dirty = true;
		true
	}

	pub fn header(&self) -> Option<&str> {
		self.header.as_deref()
	}

	pub fn set_header(&mut self, header: Option<&str>) -> bool {
		if self.header.as_deref() == header {
			return false;
		}
		if self.header.is_none() {
			self.spacing.header = None;
		}
		self.header = header.map(str::to_string);
		self.dirty = true;
		true
	}

	pub fn links(&self) -> Option<&str> {
		self.links.as_deref()
	}

	pub fn set_links(&mut self, links: Option<&str>) -> bool {
		if self.links.as_deref() == links {
			return false;
		}
		if self.links.is_none() {
			self.spacing.links = None;
		}
		self.links = links.map(str::to_string);
		self.dirty = true;
		true
	}

	//==============================================================================
	// Metadata
	//==============================================================================

	pub fn metadata(&self) -> &MetadataStore {
		&self.metadata
	}

	/// Direct access to the store. Changes made through it mark the document dirty.
	pub fn metadata_mut(&mut self) -> &mut MetadataStore {
		&mut self.metadata
	}

	pub fn value(&self, key: &str) -> &str {
		self.metadata.value(key)
	}

	/// See [`MetadataStore::set_value`].
	pub fn set_value(&mut self, key: &str, value: &str) -> bool {
		if self.metadata.top_empty() && self.metadata.is_allowed(key).is_some() {
			self.spacing.top_metadata = None;
		}
		self.metadata.set_value(key, value)
	}

	pub fn remove_value(&mut self, key: &str) -> bool {
		self.metadata.remove(key)
	}

	pub fn replace_key(&mut self, old: &str, new: &str) -> bool {
		self.metadata.replace_key(old, new)
	}

	//==============================================================================
	// Free text and footer
	//==============================================================================

	pub fn free_text(&self) -> &[String] {
		&self.free_text
	}

	pub fn set_free_text(&mut self, lines: Vec<String>) -> bool {
		if self.free_text == lines {
			return false;
		}
		if !has_visible(&self.free_text) {
			self.spacing.free_text = None;
		}
		self.free_text = lines;
		self.dirty = true;
		true
	}

	pub fn footer(&self) -> &[String] {
		&self.footer
	}

	pub fn set_footer(&mut self, lines: Vec<String>) -> bool {
		if self.footer == lines {
			return false;
		}
		if !has_visible(&self.footer) {
			self.spacing.footer = None;
		}
		self.footer = lines;
		self.dirty = true;
		true
	}

	//==============================================================================
	// Sections
	//==============================================================================

	pub fn sections(&self) -> &[Section] {
		&self.sections
	}

	fn section_index(&self, title: &str) -> Option<usize> {
		let title = title.trim();
		self.sections.iter().position(|s| s.title().eq_ignore_ascii_case(title))
	}

	pub fn has_section(&self, title: &str) -> bool {
		self.section_index(title).is_some()
	}

	pub fn section(&self, title: &str) -> Option<&Section> {
		self.section_index(title).map(|i| &self.sections[i])
	}

	pub fn section_mut(&mut self, title: &str) -> Option<&mut Section> {
		self.section_index(title).map(|i| &mut self.sections[i])
	}

	/// The section titled `title`, appended after the existing ones if missing.
	pub fn ensure_section(&mut self, title: &str) -> &mut Section {
		let i = match self.section_index(title) {
			Some(i) => i,
			None => {
				self.sections.push(Section::new(title.trim()));
				// An empty new section is only written once it gains a line, unless shown anyway.
				self.dirty |= !self.schema.hide_empty_sections;
				self.sections.len() - 1
			}
		};
		&mut self.sections[i]
	}

	pub fn remove_section(&mut self, title: &str) -> Option<Section> {
		let i = self.section_index(title)?;
		self.dirty = true;
		Some(self.sections.remove(i))
	}

	/// Rename a section in place. Fails if `new` names a different existing section.
	pub fn rename_section(&mut self, old: &str, new: &str) -> bool {
		let Some(i) = self.section_index(old) else {
			return false;
		};
		let new = new.trim();
		if self.sections[i].title() == new {
			return false;
		}
		if self.section_index(new).is_some_and(|j| j != i) {
			return false;
		}
		self.sections[i].set_title(new);
		true
	}

	//==============================================================================
	// Comment threads
	//==============================================================================

	/// Comment threads under the last comments heading of the free text, derived fresh on every call.
	pub fn comments(&self) -> Vec<Comment> {
		comments::parse_comments(&self.free_text, &self.schema)
	}

	/// Replace the comment block of the free text with `comments`. Everything around it is kept.
	pub fn set_comments(&mut self, comments: &[Comment]) -> bool {
		let lines = comments::replace_comments(&self.free_text, &self.schema, comments);
		self.set_free_text(lines)
	}
}

impl fmt::Display for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_markdown())
	}
}

impl Serialize for Document {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		#[derive(Serialize)]
		struct View<'a> {
			path: Option<&'a Path>,
			title: Option<&'a str>,
			header: Option<&'a str>,
			links: Option<&'a str>,
			metadata: Vec<&'a MetadataEntry>,
			free_text: &'a [String],
			sections: &'a [Section],
			footer: &'a [String],
		}

		View {
			path: self.path(),
			title: self.title(),
			header: self.header(),
			links: self.links(),
			metadata: self.metadata.iter().collect(),
			free_text: &self.free_text,
			sections: &self.sections,
			footer: &self.footer,
		}
		.serialize(serializer)
	}
}
