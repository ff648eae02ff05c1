//! Error types for loading, saving and configuring documents.
//!
//! Structural problems inside a file are never errors: the parser folds anything it
//! cannot classify into free text. Only I/O and schema construction can fail.

#![allow(unused_assignments)] // Fields are read by miette's derive macro via attributes

use std::path::PathBuf;

use miette::Diagnostic;

/// Failure to move a document between disk and memory.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum DocumentError {
	#[error("failed to read document: {}", .path.display())]
	#[diagnostic(code(backlog::document::read))]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write document: {}", .path.display())]
	#[diagnostic(code(backlog::document::write), help("the document is still dirty, saving again will retry the write"))]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// A schema could not be built from its textual description.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum SchemaError {
	#[error("invalid pattern `{pattern}`")]
	#[diagnostic(code(backlog::schema::invalid_pattern), help("patterns use the `regex` crate syntax and are matched case-insensitively"))]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},
}
