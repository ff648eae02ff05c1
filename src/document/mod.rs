//! Structured markdown documents.
//!
//! Every file in a backlog repository (items, project overviews, ideas, users, indexes)
//! follows the same loose layout: a `# Title`, an optional header line and link line,
//! `key: value` metadata, free text, named sections, an optional footer and a trailing
//! `## Metadata` block. Boundaries are recognized by pattern alone, so a [`DocumentSchema`]
//! tells the parser which keys, prefixes and footers to expect for a given kind of file.
//!
//! Loading and saving an untouched document reproduces the file byte for byte, and
//! [`Document::save`] skips the write entirely when nothing changed.

mod comments;
pub use comments::{Comment, ThreadLine, classify_thread_line, parse_comments, replace_comments};

mod error;
pub use error::{DocumentError, SchemaError};

mod line;
pub use line::{LineKind, classify_line, split_metadata};

mod metadata;
pub use metadata::{MetadataEntry, MetadataStore, Partition};

mod parse;

mod schema;
pub use schema::{DocumentKind, DocumentSchema, KeyRules};

mod section;
pub use section::Section;

mod types;
pub use types::Document;
