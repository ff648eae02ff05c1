//! Comment threads read from and written back into real documents.

use backlog::{Comment, Document, DocumentKind};

use crate::common::{TestContext, schema};

const ITEM: &str = "\
# Fix login button

Status: doing

Clicking the login button does nothing.

## Comments

@bob please have a look.

@alice, @carol: I disagree
with that

## Links
- [Support ticket](https://support.example.com/t/42)
";

#[test]
fn test_threads_are_parsed_from_free_text() {
	let doc = Document::parse(ITEM, schema(DocumentKind::Item));
	let comments = doc.comments();
	assert_eq!(comments.len(), 2);
	assert_eq!(comments[0].users(), ["bob"]);
	assert_eq!(comments[0].text(), ["please have a look."]);
	assert_eq!(comments[1].users(), ["alice", "carol"]);
	assert_eq!(comments[1].text(), ["I disagree", "with that"]);
	assert!(comments.iter().all(|c| !c.is_closed() && !c.is_unsent()));
}

#[test]
fn test_writing_back_same_comments_is_not_a_change() {
	let mut doc = Document::parse(ITEM, schema(DocumentKind::Item));
	let comments = doc.comments();
	assert!(!doc.set_comments(&comments));
	assert!(!doc.is_dirty());
}

#[test]
fn test_notifier_annotations_survive_reload() {
	let ctx = TestContext::new();
	let path = ctx.write("items/fix-login.md", ITEM);

	let mut doc = ctx.load(&path, DocumentKind::Item);
	let mut comments = doc.comments();
	comments[0].mark_sent(&["bob"]);
	comments[1].mark_unsent(&["alice", "carol"]);
	assert!(doc.set_comments(&comments));
	assert!(doc.save().unwrap());

	let expected = ITEM
		.replace("@bob please have a look.\n", "@bob please have a look.\nSent by email to bob\n")
		.replace("with that\n", "with that\nCan't send by email to alice, carol\n");
	assert_eq!(ctx.read(&path), expected);

	let reloaded = ctx.load(&path, DocumentKind::Item);
	let comments = reloaded.comments();
	assert!(comments[0].is_closed());
	assert!(comments[1].is_unsent());
	assert!(!comments[1].is_closed());
}

#[test]
fn test_closing_and_adding_comments() {
	let mut doc = Document::parse(ITEM, schema(DocumentKind::Item));
	let mut comments = doc.comments();
	comments[0].close();
	comments.push(Comment::new(["bob"], "Fixed in 1.4").unwrap());
	assert!(doc.set_comments(&comments));

	let out = doc.to_markdown();
	assert!(out.contains("## Comments\n\n~@bob please have a look.\n\n@alice, @carol: I disagree\nwith that\n\n@bob Fixed in 1.4\n## Links\n"));
	assert!(out.ends_with("- [Support ticket](https://support.example.com/t/42)\n"), "text after the thread is untouched");

	let reparsed = Document::parse(&out, schema(DocumentKind::Item)).comments();
	assert_eq!(reparsed.len(), 3);
	assert!(reparsed[0].is_closed());
	assert_eq!(reparsed[2].text(), ["Fixed in 1.4"]);
}

#[test]
fn test_first_comment_adds_heading() {
	let mut doc = Document::parse("# Offline mode\n\nAuthor: dave\n\nDetails to follow.\n", schema(DocumentKind::Idea));
	assert!(doc.comments().is_empty());
	assert!(doc.set_comments(&[Comment::new(["@dave"], "Any progress?").unwrap()]));
	assert_eq!(doc.to_markdown(), "# Offline mode\n\nAuthor: dave\n\nDetails to follow.\n\n## Comments\n\n@dave Any progress?\n");
}

#[test]
fn test_only_the_last_comments_heading_counts() {
	let text = "# A\n\n## Comments\n@old archived thread\n\n## Comments\n@new current";
	let doc = Document::parse(text, schema(DocumentKind::Item));
	let comments = doc.comments();
	assert_eq!(comments.len(), 1);
	assert_eq!(comments[0].users(), ["new"]);
}
