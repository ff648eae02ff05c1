//! Round-trip and minimal-diff behavior on realistic backlog files.
//!
//! An untouched document must serialize back to its exact bytes; a mutated one must
//! only differ on the lines the mutation is about.

use backlog::{Document, DocumentKind, Partition};
use insta::assert_snapshot;
use rstest::rstest;

use crate::common::schema;

const ITEM: &str = "\
# Fix login button
[Project Apollo](../overview.md) • [Backlog](../../index.md)

Created: 2024-01-02
Modified: 2024-01-05
Status: doing
Assigned: alice
Points: 3
Tags: auth, ui

Clicking the login button on Safari does nothing.
Steps:

1. Open the site
2. Click *Login*

## Comments

@bob please have a look.
Sent by email to bob

~@alice: Reproduced on 17.2

## Metadata
Imported from: csv
";

const OVERVIEW: &str = "\
# Project Apollo
[Backlog](../index.md)

Status: active
Owner: carol

### Doing
- [Fix login button](items/fix-login.md)

### Planned
- [Add SSO](items/add-sso.md)
- [Dark mode](items/dark-mode.md)

### Done

[Archived stories](archive.md)
";

const IDEA: &str = "\
# Offline mode
Would let people triage on the train

Author: dave
Status: new

Details to follow.";

const USER: &str = "\
# alice

Name: Alice Liddell
Email: alice@example.com

## Assigned
- [Fix login button](../items/fix-login.md)

## Metadata
Notify comments: yes
";

const INDEX: &str = "\
# Backlog

Modified: 2024-02-01

## Apollo
- [Project Apollo](apollo/overview.md)

## Hermes
- [Project Hermes](hermes/overview.md)
";

const PAGE: &str = "\
# Velocity

Generated: 2024-02-01

## Iteration 12
| story | points |
|---|---|
| Fix login button | 3 |
";

#[rstest]
#[case::item(DocumentKind::Item, ITEM)]
#[case::overview(DocumentKind::Overview, OVERVIEW)]
#[case::idea(DocumentKind::Idea, IDEA)]
#[case::user(DocumentKind::User, USER)]
#[case::index(DocumentKind::Index, INDEX)]
#[case::page(DocumentKind::Page, PAGE)]
fn test_untouched_document_round_trips(#[case] kind: DocumentKind, #[case] text: &str) {
	let doc = Document::parse(text, schema(kind));
	assert!(!doc.is_dirty());
	assert_eq!(doc.to_markdown(), text);
}

#[test]
fn test_item_structure() {
	let doc = Document::parse(ITEM, schema(DocumentKind::Item));
	assert_eq!(doc.title(), Some("Fix login button"));
	assert_eq!(doc.header(), None);
	assert_eq!(doc.links(), Some("[Project Apollo](../overview.md) • [Backlog](../../index.md)"));
	let keys: Vec<_> = doc.metadata().top().map(|e| e.key.as_str()).collect();
	assert_eq!(keys, vec!["Created", "Modified", "Status", "Assigned", "Points", "Tags"]);
	assert_eq!(doc.metadata().get("imported from").unwrap().partition, Partition::Bottom);
	assert_eq!(doc.free_text().first().map(String::as_str), Some("Clicking the login button on Safari does nothing."));
	assert_eq!(doc.free_text().last().map(String::as_str), Some("~@alice: Reproduced on 17.2"));
}

#[test]
fn test_item_status_change_touches_only_its_lines() {
	let mut doc = Document::parse(ITEM, schema(DocumentKind::Item));
	assert!(doc.set_value("status", "done"));
	assert!(doc.set_value("Finished", "2024-01-09"));

	let expected = ITEM.replace("Status: doing", "Status: done").replace("Imported from: csv\n", "Imported from: csv\nFinished: 2024-01-09\n");
	assert_eq!(doc.to_markdown(), expected);
}

#[test]
fn test_overview_move_between_sections() {
	let mut doc = Document::parse(OVERVIEW, schema(DocumentKind::Overview));
	let line = "- [Fix login button](items/fix-login.md)";
	assert!(doc.section_mut("Doing").unwrap().remove_line(line));
	doc.section_mut("done").unwrap().push_line(line);

	assert_snapshot!(doc.to_markdown().trim_end(), @r"
	# Project Apollo
	[Backlog](../index.md)

	Status: active
	Owner: carol

	### Doing

	### Planned
	- [Add SSO](items/add-sso.md)
	- [Dark mode](items/dark-mode.md)

	### Done
	- [Fix login button](items/fix-login.md)

	[Archived stories](archive.md)
	");
}

#[test]
fn test_footer_with_trailing_blank_line() {
	let text = "# Project Apollo\n\n### Doing\n- [a](a.md)\n\n[Archived stories](archive.md)\n\n";
	let doc = Document::parse(text, schema(DocumentKind::Overview));
	assert_eq!(doc.footer(), ["[Archived stories](archive.md)", ""]);
	assert!(doc.free_text().is_empty());
	assert_eq!(doc.section("Doing").unwrap().lines(), ["- [a](a.md)"]);
	assert_eq!(doc.to_markdown(), text);
}

#[test]
fn test_new_sections_are_appended_after_existing_ones() {
	let mut doc = Document::parse(OVERVIEW, schema(DocumentKind::Overview));
	doc.ensure_section("Blocked").push_line("- [Wait for vendor](items/vendor.md)");
	doc.section_mut("Planned").unwrap().insert_line(0, "- [Urgent fix](items/urgent.md)");

	let titles: Vec<_> = doc.sections().iter().map(|s| s.title()).collect();
	assert_eq!(titles, vec!["Doing", "Planned", "Done", "Blocked"]);
	let out = doc.to_markdown();
	assert!(out.contains("### Planned\n- [Urgent fix](items/urgent.md)\n- [Add SSO]"));
	assert!(out.contains("### Done\n\n### Blocked\n- [Wait for vendor](items/vendor.md)\n\n[Archived stories]"));
}

#[test]
fn test_user_notification_preferences_go_to_bottom() {
	let mut doc = Document::parse(USER, schema(DocumentKind::User));
	assert!(doc.set_value("Notify assignments", "no"));
	assert!(!doc.set_value("Nickname", "al"), "not in any allow-list");
	assert!(doc.to_markdown().ends_with("## Metadata\nNotify comments: yes\nNotify assignments: no\n"));
}

#[test]
fn test_unknown_keys_survive_and_stay_editable() {
	let text = "# Offline mode\n\nAuthor: dave\nbogus-key: v\n";
	let mut doc = Document::parse(text, schema(DocumentKind::Idea));
	assert_eq!(doc.value("bogus-key"), "v");
	assert_eq!(doc.to_markdown(), text);
	assert!(doc.set_value("Bogus-Key", "w"));
	assert_eq!(doc.to_markdown(), "# Offline mode\n\nAuthor: dave\nbogus-key: w\n");
}

#[test]
fn test_blank_lines_inside_sections_are_dropped() {
	let text = "# Backlog\n\n## Apollo\n- a\n\n- b\n";
	let doc = Document::parse(text, schema(DocumentKind::Index));
	assert_eq!(doc.to_markdown(), "# Backlog\n\n## Apollo\n- a\n- b\n");
}
