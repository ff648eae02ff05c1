//! Schema configuration files.
//!
//! A TOML file holds one table per document kind. Every field is optional and
//! overrides the built-in schema of that kind:
//!
//! ```toml
//! [overview]
//! section_prefix = "## "
//! footer = '^\[Archived\]'
//!
//! [item.bottom_keys]
//! keys = ["Finished", "Archived"]
//! patterns = ['.+ date']
//! ```
#![allow(unused_assignments)] // Fields are read by miette's derive macro via attributes

use std::{
	collections::HashMap,
	path::Path,
	sync::Arc,
};

use clap::ValueEnum;
use miette::Diagnostic;
use serde::Deserialize;

use crate::document::{DocumentKind, DocumentSchema, KeyRules, SchemaError};

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to load schema configuration from {origin}")]
	#[diagnostic(code(backlog::config::load))]
	Load {
		origin: String,
		#[source]
		source: config::ConfigError,
	},

	#[error("unknown document kind `{name}`")]
	#[diagnostic(code(backlog::config::unknown_kind), help("known kinds: item, overview, idea, user, index, page"))]
	UnknownKind { name: String },

	#[error("invalid schema for `{kind}`")]
	#[diagnostic(code(backlog::config::schema))]
	Schema {
		kind: &'static str,
		#[source]
		#[diagnostic_source]
		source: SchemaError,
	},
}

/// Allow-list as written in a config file. Replaces the built-in list as a whole.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyRulesConfig {
	pub keys: Vec<String>,
	pub patterns: Vec<String>,
}

impl KeyRulesConfig {
	fn build(&self) -> Result<KeyRules, SchemaError> {
		self.patterns.iter().try_fold(KeyRules::exact(self.keys.iter().cloned()), |rules, p| rules.with_pattern(p))
	}
}

/// One kind's table. Absent fields keep the value of the schema it is applied to.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
	pub top_keys: Option<KeyRulesConfig>,
	pub bottom_keys: Option<KeyRulesConfig>,
	pub section_prefix: Option<String>,
	pub footer: Option<String>,
	pub comments_heading: Option<String>,
	pub bottom_heading: Option<String>,
	pub hide_empty_sections: Option<bool>,
}

impl SchemaConfig {
	pub fn apply(&self, mut schema: DocumentSchema) -> Result<DocumentSchema, SchemaError> {
		if let Some(rules) = &self.top_keys {
			schema = schema.with_top_keys(rules.build()?);
		}
		if let Some(rules) = &self.bottom_keys {
			schema = schema.with_bottom_keys(rules.build()?);
		}
		if let Some(prefix) = &self.section_prefix {
			schema = schema.with_section_prefix(prefix.as_str());
		}
		if let Some(footer) = &self.footer {
			schema = match footer.is_empty() {
				true => DocumentSchema { footer: None, ..schema },
				false => schema.with_footer(footer)?,
			};
		}
		if let Some(pattern) = &self.comments_heading {
			schema = schema.with_comments_heading(pattern)?;
		}
		if let Some(pattern) = &self.bottom_heading {
			schema = schema.with_bottom_heading(pattern)?;
		}
		if let Some(hide) = self.hide_empty_sections {
			schema = schema.hide_empty_sections(hide);
		}
		Ok(schema)
	}
}

/// A schema for every [`DocumentKind`].
#[derive(Clone, Debug)]
pub struct SchemaSet {
	schemas: HashMap<DocumentKind, Arc<DocumentSchema>>,
}

impl Default for SchemaSet {
	fn default() -> Self {
		Self::builtin()
	}
}

impl SchemaSet {
	pub fn builtin() -> Self {
		let schemas = DocumentKind::all().into_iter().map(|kind| (kind, Arc::new(DocumentSchema::builtin(kind)))).collect();
		Self { schemas }
	}

	/// Built-in schemas overridden by the tables of the TOML file at `path`.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let source = config::File::from(path).format(config::FileFormat::Toml).required(true);
		Self::from_source(source, path.display().to_string())
	}

	pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
		Self::from_source(config::File::from_str(text, config::FileFormat::Toml), "inline configuration".to_string())
	}

	fn from_source<S>(source: S, origin: String) -> Result<Self, ConfigError>
	where
		S: config::Source + Send + Sync + 'static, {
		let tables: HashMap<String, SchemaConfig> = config::Config::builder()
			.add_source(source)
			.build()
			.and_then(|settings| settings.try_deserialize())
			.map_err(|source| ConfigError::Load { origin: origin.clone(), source })?;

		let mut set = Self::builtin();
		for (name, table) in &tables {
			let kind = DocumentKind::from_str(name, true).map_err(|_| ConfigError::UnknownKind { name: name.clone() })?;
			let base = DocumentSchema::builtin(kind);
			let schema = table.apply(base).map_err(|source| ConfigError::Schema { kind: kind.as_str(), source })?;
			tracing::debug!("[config] {origin}: overriding schema for {}", kind.as_str());
			set.schemas.insert(kind, Arc::new(schema));
		}
		Ok(set)
	}

	pub fn get(&self, kind: DocumentKind) -> Arc<DocumentSchema> {
		match self.schemas.get(&kind) {
			Some(schema) => Arc::clone(schema),
			None => Arc::new(DocumentSchema::builtin(kind)),
		}
	}
}
