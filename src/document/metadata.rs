//! Ordered key/value metadata of a document.
//!
//! Entries live in one of two partitions: the top block under the title, or the bottom
//! block under the trailing `## Metadata` heading. Writes of brand-new keys are checked
//! against the schema's allow-lists; anything already present, including keys the
//! allow-lists do not know, can always be read and updated.

use serde::Serialize;

use super::schema::KeyRules;

/// Where an entry is rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
	Top,
	Bottom,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetadataEntry {
	pub key: String,
	pub value: String,
	pub partition: Partition,
	/// Source line, re-emitted as long as the entry is untouched.
	#[serde(skip)]
	raw: Option<String>,
	/// Blank lines in front of the entry inside its block.
	#[serde(skip)]
	gap: usize,
}

impl MetadataEntry {
	fn new(key: impl Into<String>, value: impl Into<String>, partition: Partition) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
			partition,
			raw: None,
			gap: 0,
		}
	}

	pub fn render(&self) -> String {
		match &self.raw {
			Some(raw) => raw.clone(),
			None if self.value.is_empty() => format!("{}:", self.key),
			None => format!("{}: {}", self.key, self.value),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct MetadataStore {
	entries: Vec<MetadataEntry>,
	top_rules: KeyRules,
	bottom_rules: KeyRules,
	modified: bool,
}

impl MetadataStore {
	pub fn new(top_rules: KeyRules, bottom_rules: KeyRules) -> Self {
		Self {
			entries: Vec::new(),
			top_rules,
			bottom_rules,
			modified: false,
		}
	}

	/// Record an entry read from a file. Bypasses the allow-lists and does not count as a change.
	///
	/// `gap` is the number of blank lines between this entry and the previous one of the block.
	pub(crate) fn push_parsed(&mut self, key: &str, value: &str, partition: Partition, raw: &str, gap: usize) {
		let mut entry = MetadataEntry::new(key, value, partition);
		entry.raw = Some(raw.to_string());
		entry.gap = gap;
		self.entries.push(entry);
	}

	fn position(&self, key: &str) -> Option<usize> {
		let key = key.trim();
		self.entries.iter().position(|e| e.key.eq_ignore_ascii_case(key))
	}

	/// Partition a brand-new key would be stored in, if the allow-lists accept it.
	pub fn is_allowed(&self, key: &str) -> Option<Partition> {
		if self.top_rules.matches(key) {
			Some(Partition::Top)
		} else if self.bottom_rules.matches(key) {
			Some(Partition::Bottom)
		} else {
			None
		}
	}

	pub fn get(&self, key: &str) -> Option<&MetadataEntry> {
		self.position(key).map(|i| &self.entries[i])
	}

	/// Value of `key`, or `""` when absent.
	pub fn value(&self, key: &str) -> &str {
		self.get(key).map(|e| e.value.as_str()).unwrap_or("")
	}

	pub fn contains(&self, key: &str) -> bool {
		self.position(key).is_some()
	}

	/// Set `key` to `value`.
	///
	/// Returns `false`, leaving the store untouched, when the key is absent and neither
	/// allow-list accepts it. Setting a key to its current value is not a change.
	pub fn set_value(&mut self, key: &str, value: &str) -> bool {
		let value = value.trim();
		if let Some(i) = self.position(key) {
			let entry = &mut self.entries[i];
			if entry.value != value {
				entry.value = value.to_string();
				entry.raw = None;
				self.modified = true;
			}
			return true;
		}

		let Some(partition) = self.is_allowed(key) else {
			tracing::debug!("[metadata] rejected key {key:?}: not in any allow-list");
			return false;
		};
		self.entries.push(MetadataEntry::new(key.trim(), value, partition));
		self.modified = true;
		true
	}

	/// Remove every entry for `key`. Returns whether anything was removed.
	pub fn remove(&mut self, key: &str) -> bool {
		let key = key.trim();
		let before = self.entries.len();
		self.entries.retain(|e| !e.key.eq_ignore_ascii_case(key));
		let removed = self.entries.len() != before;
		self.modified |= removed;
		removed
	}

	/// Rename `old` to `new` in place, keeping its value and position.
	///
	/// The new name must be accepted by an allow-list unless it only differs in case.
	/// An existing entry already named `new` is replaced.
	pub fn replace_key(&mut self, old: &str, new: &str) -> bool {
		let new = new.trim();
		let Some(mut i) = self.position(old) else {
			return false;
		};
		if self.entries[i].key == new {
			return false;
		}

		if !self.entries[i].key.eq_ignore_ascii_case(new) {
			let Some(partition) = self.is_allowed(new) else {
				return false;
			};
			if let Some(j) = self.position(new) {
				self.entries.remove(j);
				if j < i {
					i -= 1;
				}
			}
			if self.entries[i].partition != partition {
				self.entries[i].partition = partition;
				self.entries[i].gap = 0;
			}
		}

		let entry = &mut self.entries[i];
		entry.key = new.to_string();
		entry.raw = None;
		self.modified = true;
		true
	}

	pub fn iter(&self) -> impl Iterator<Item = &MetadataEntry> {
		self.entries.iter()
	}

	pub fn top(&self) -> impl Iterator<Item = &MetadataEntry> {
		self.entries.iter().filter(|e| e.partition == Partition::Top)
	}

	pub fn bottom(&self) -> impl Iterator<Item = &MetadataEntry> {
		self.entries.iter().filter(|e| e.partition == Partition::Bottom)
	}

	/// Lines of one partition with the recorded spacing between entries. The spacing in
	/// front of the first entry is only emitted when `lead` is set.
	pub(crate) fn render_block(&self, partition: Partition, lead: bool) -> Vec<String> {
		let mut lines = Vec::new();
		for (i, entry) in self.entries.iter().filter(|e| e.partition == partition).enumerate() {
			if i > 0 || lead {
				lines.extend(std::iter::repeat_n(String::new(), entry.gap));
			}
			lines.push(entry.render());
		}
		lines
	}

	pub fn top_empty(&self) -> bool {
		self.top().next().is_none()
	}

	pub fn bottom_empty(&self) -> bool {
		self.bottom().next().is_none()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn is_modified(&self) -> bool {
		self.modified
	}

	pub(crate) fn mark_clean(&mut self) {
		self.modified = false;
	}
}
