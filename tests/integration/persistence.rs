//! Load/save against the filesystem: missing files, no-op saves, write failures.

use backlog::{Document, DocumentError, DocumentKind};

use crate::common::{TestContext, schema};

#[test]
fn test_missing_file_loads_empty_and_save_creates_it() {
	let ctx = TestContext::new();
	let path = ctx.root().join("items/new-story.md");

	let mut doc = ctx.load(&path, DocumentKind::Item);
	assert_eq!(doc.path(), Some(path.as_path()));
	assert_eq!(doc.to_markdown(), "");
	assert!(!doc.save().unwrap(), "nothing to write yet");
	assert!(!path.exists());

	doc.set_title(Some("New story"));
	doc.set_value("Status", "planned");
	assert!(doc.save().unwrap());
	assert_eq!(ctx.read(&path), "# New story\n\nStatus: planned\n");
	assert!(!doc.is_dirty());
}

#[test]
fn test_noop_save_does_not_touch_the_file() {
	let ctx = TestContext::new();
	let path = ctx.write("items/fix-login.md", "# Fix login\n\nStatus: doing\nAssigned: alice\n");

	let mut doc = ctx.load(&path, DocumentKind::Item);
	doc.set_value("Status", "doing");
	doc.set_title(Some("Fix login"));
	doc.set_free_text(Vec::new());

	// A write would recreate the file.
	std::fs::remove_file(&path).unwrap();
	assert!(!doc.save().unwrap());
	assert!(!path.exists());
}

#[test]
fn test_second_save_is_a_noop() {
	let ctx = TestContext::new();
	let path = ctx.write("items/fix-login.md", "# Fix login\n\nStatus: doing\n");

	let mut doc = ctx.load(&path, DocumentKind::Item);
	doc.set_value("Status", "done");
	assert!(doc.save().unwrap());
	assert_eq!(ctx.read(&path), "# Fix login\n\nStatus: done\n");
	assert!(!doc.save().unwrap());
}

#[test]
fn test_loaded_empty_section_survives_noop_save() {
	let ctx = TestContext::new();
	let text = "# Apollo\n\n### Doing\n\n### Done\n- [Old](old.md)\n";
	let path = ctx.write("apollo/overview.md", text);

	let mut doc = ctx.load(&path, DocumentKind::Overview);
	doc.ensure_section("Planned");
	assert!(!doc.is_dirty(), "a hidden empty section is not a change");
	std::fs::remove_file(&path).unwrap();
	assert!(!doc.save().unwrap());
	assert!(!path.exists());

	doc.ensure_section("Planned").push_line("- [New](new.md)");
	assert!(doc.save().unwrap());
	assert_eq!(ctx.read(&path), format!("{text}\n### Planned\n- [New](new.md)\n"));
}

#[test]
fn test_save_as_creates_directories() {
	let ctx = TestContext::new();
	let mut doc = Document::parse("# Idea\n\nAuthor: dave\n", schema(DocumentKind::Idea));
	let target = ctx.root().join("ideas/2024/idea.md");
	doc.save_as(&target).unwrap();
	assert_eq!(ctx.read(&target), "# Idea\n\nAuthor: dave\n");
	assert_eq!(doc.path(), Some(target.as_path()));
}

#[test]
fn test_unreadable_path_is_an_error() {
	let ctx = TestContext::new();
	std::fs::create_dir_all(ctx.root().join("items/dir.md")).unwrap();
	let err = Document::load(ctx.root().join("items/dir.md"), schema(DocumentKind::Item)).unwrap_err();
	assert!(matches!(err, DocumentError::Read { .. }));
}

#[test]
fn test_failed_write_keeps_document_dirty() {
	let ctx = TestContext::new();
	let blocker = ctx.write("not-a-dir", "");
	let mut doc = Document::new(schema(DocumentKind::Item));
	doc.set_title(Some("Nowhere"));

	let err = doc.save_as(blocker.join("story.md")).unwrap_err();
	assert!(matches!(err, DocumentError::Write { .. }));
	assert!(doc.is_dirty());
	assert_eq!(doc.path(), None);
}
