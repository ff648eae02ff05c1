pub mod config;
pub mod document;

// Re-export the document model at crate root for convenience
pub use config::{ConfigError, SchemaConfig, SchemaSet};
pub use document::{
	Comment, Document, DocumentError, DocumentKind, DocumentSchema, KeyRules, LineKind, MetadataEntry, MetadataStore, Partition, SchemaError, Section, ThreadLine, classify_line,
	classify_thread_line,
};
