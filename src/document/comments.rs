//! Comment threads kept under a `## Comments` heading in a document's free text.
//!
//! ```text
//! ## Comments
//!
//! @alice Hello there
//!
//! ~@bob, @carol: Fixed in the last deploy
//! Sent by email to bob, carol
//! ```
//!
//! A comment starts at a line of `@mentions` and runs until the next one, or the next
//! heading. A leading `~` marks it closed. Lines appended by the notifier
//! (`Sent by ...` / `Can't send by ...`) are recognized on re-parse.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::schema::DocumentSchema;

static COMMENT_START_RE: LazyLock<Regex> = LazyLock::new(|| {
	let user = r"@[\w.\-]+";
	let sep = r"(?:\s*[,&]\s*|\s+and\s+|\s+)";
	Regex::new(&format!(r"^(?P<closed>~\s*)?(?P<users>{user}(?:{sep}{user})*)(?:\s*:\s*|\s+|$)(?P<text>.*)$")).expect("static pattern")
});
static USER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.\-]+$").expect("static pattern"));
static USER_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[,&]\s*|\s+and\s+|\s+").expect("static pattern"));

const DEFAULT_HEADING: &str = "## Comments";
const SENT_PREFIX: &str = "sent by ";
const UNSENT_PREFIX: &str = "can't send by ";

/// One entry of a thread.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Comment {
	users: Vec<String>,
	/// Trimmed, non-blank lines.
	text: Vec<String>,
	#[serde(skip)]
	raw_lines: Vec<String>,
	closed: bool,
	unsent: bool,
}

impl Comment {
	/// A fresh comment addressed to `users`. Multi-line `text` continues on the lines below the mentions.
	///
	/// `None` when no user is given or a name could not be written as an `@mention`: the
	/// first line would not start a comment and would be read back as part of the previous one.
	pub fn new<I, S>(users: I, text: &str) -> Option<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>, {
		let mut comment = Self::default();
		for user in users {
			let user = normalize_user(user.as_ref());
			if !USER_NAME_RE.is_match(user) {
				tracing::debug!("[comments] cannot mention {user:?}");
				return None;
			}
			if !comment.users.iter().any(|u| u == user) {
				comment.users.push(user.to_string());
			}
		}
		if comment.users.is_empty() {
			return None;
		}
		let mentions = comment.users.iter().map(|u| format!("@{u}")).collect::<Vec<_>>().join(" ");

		let mut lines = text.lines();
		let first = lines.next().unwrap_or_default().trim();
		if first.is_empty() {
			comment.raw_lines.push(mentions);
		} else {
			comment.raw_lines.push(format!("{mentions} {first}"));
			comment.text.push(first.to_string());
		}
		for line in lines {
			comment.push_parsed(line);
		}
		Some(comment)
	}

	pub fn users(&self) -> &[String] {
		&self.users
	}

	pub fn text(&self) -> &[String] {
		&self.text
	}

	/// Lines exactly as written back to the document.
	pub fn raw_lines(&self) -> &[String] {
		&self.raw_lines
	}

	pub fn is_closed(&self) -> bool {
		self.closed
	}

	/// A notification for this comment failed.
	pub fn is_unsent(&self) -> bool {
		self.unsent
	}

	pub fn mentions(&self, user: &str) -> bool {
		let user = normalize_user(user);
		self.users.iter().any(|u| u.eq_ignore_ascii_case(user))
	}

	/// Append a line, keeping trailing blank lines at the end of the comment.
	pub fn append_line(&mut self, line: &str) {
		let trailing_blanks = self.raw_lines.iter().rev().take_while(|l| l.trim().is_empty()).count();
		let at = self.raw_lines.len() - trailing_blanks;
		self.raw_lines.insert(at, line.to_string());
		self.record(line);
	}

	/// Record a delivered notification. Marks the comment closed.
	pub fn mark_sent<S: AsRef<str>>(&mut self, recipients: &[S]) {
		self.append_line(&format!("Sent by email to {}", join(recipients)));
	}

	pub fn mark_unsent<S: AsRef<str>>(&mut self, recipients: &[S]) {
		self.append_line(&format!("Can't send by email to {}", join(recipients)));
	}

	/// Prefix the start line with `~`. Returns false if already closed.
	pub fn close(&mut self) -> bool {
		if self.closed {
			return false;
		}
		if let Some(start) = self.raw_lines.first_mut() {
			start.insert(0, '~');
		}
		self.closed = true;
		true
	}

	fn push_parsed(&mut self, line: &str) {
		self.raw_lines.push(line.to_string());
		self.record(line);
	}

	fn record(&mut self, line: &str) {
		let trimmed = line.trim();
		if trimmed.is_empty() {
			return;
		}
		let lower = trimmed.to_lowercase();
		if lower.starts_with(SENT_PREFIX) {
			self.closed = true;
		} else if lower.starts_with(UNSENT_PREFIX) {
			self.unsent = true;
		}
		self.text.push(trimmed.to_string());
	}
}

fn normalize_user(user: &str) -> &str {
	user.trim().trim_start_matches('@').trim_end_matches('.')
}

fn join<S: AsRef<str>>(recipients: &[S]) -> String {
	recipients.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}

/// A line of the comment range, classified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ThreadLine<'a> {
	Blank,
	/// Any line starting with `#`. Ends the thread.
	Heading,
	Start { closed: bool, users: Vec<String>, text: &'a str },
	Text,
}

pub fn classify_thread_line(line: &str) -> ThreadLine<'_> {
	if line.trim().is_empty() {
		return ThreadLine::Blank;
	}
	if line.starts_with('#') {
		return ThreadLine::Heading;
	}
	let Some(caps) = COMMENT_START_RE.captures(line) else {
		return ThreadLine::Text;
	};
	let mut users: Vec<String> = Vec::new();
	for token in USER_SEPARATOR_RE.split(&caps["users"]) {
		let user = normalize_user(token);
		if !user.is_empty() && !users.iter().any(|u| u == user) {
			users.push(user.to_string());
		}
	}
	ThreadLine::Start {
		closed: caps.name("closed").is_some(),
		users,
		text: caps.name("text").map_or("", |m| m.as_str().trim()),
	}
}

/// `start..end` of the lines below the last comments heading, up to the next heading.
fn comment_range(lines: &[String], schema: &DocumentSchema) -> Option<(usize, usize)> {
	let start = lines.iter().rposition(|l| schema.is_comments_heading(l))? + 1;
	let end = lines[start..].iter().position(|l| l.starts_with('#')).map_or(lines.len(), |i| start + i);
	Some((start, end))
}

pub fn parse_comments(lines: &[String], schema: &DocumentSchema) -> Vec<Comment> {
	let Some((start, end)) = comment_range(lines, schema) else {
		return Vec::new();
	};

	let mut comments = Vec::new();
	let mut current: Option<Comment> = None;
	for line in &lines[start..end] {
		match classify_thread_line(line) {
			ThreadLine::Blank =>
				if let Some(comment) = current.as_mut() {
					comment.raw_lines.push(line.clone());
				},
			ThreadLine::Heading => break,
			ThreadLine::Start { closed, users, text } => {
				comments.extend(current.take());
				let mut comment = Comment {
					users,
					closed,
					raw_lines: vec![line.clone()],
					..Comment::default()
				};
				if !text.is_empty() {
					comment.text.push(text.to_string());
				}
				current = Some(comment);
			}
			ThreadLine::Text =>
				if let Some(comment) = current.as_mut() {
					comment.push_parsed(line);
				},
		}
	}
	comments.extend(current);
	tracing::debug!("[comments] parsed {} comments from lines {start}..{end}", comments.len());
	comments
}

/// Raw lines of `comments`, separated by a blank line where a comment does not end in one.
fn render(comments: &[Comment]) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();
	for comment in comments {
		if out.last().is_some_and(|l| !l.trim().is_empty()) {
			out.push(String::new());
		}
		out.extend(comment.raw_lines.iter().cloned());
	}
	out
}

/// `lines` with the comment thread replaced by `comments`. Text around the thread is untouched.
pub fn replace_comments(lines: &[String], schema: &DocumentSchema, comments: &[Comment]) -> Vec<String> {
	let rendered = render(comments);
	let ends_in_text = |lines: &[String]| lines.last().is_some_and(|l| !l.trim().is_empty());

	let Some((start, end)) = comment_range(lines, schema) else {
		let mut out = lines.to_vec();
		if rendered.is_empty() {
			return out;
		}
		if ends_in_text(&out) {
			out.push(String::new());
		}
		out.push(DEFAULT_HEADING.to_string());
		out.push(String::new());
		out.extend(rendered);
		return out;
	};

	let first_comment = (start..end).find(|&i| matches!(classify_thread_line(&lines[i]), ThreadLine::Start { .. }));
	let from = first_comment.unwrap_or(end);
	let mut out = lines[..from].to_vec();
	if first_comment.is_none() && !rendered.is_empty() && ends_in_text(&out) {
		out.push(String::new());
	}
	out.extend(rendered);
	out.extend(lines[end..].iter().cloned());
	out
}
