//! Markdown <-> [`Document`].
//!
//! Parsing is a single forward pass over classified lines, after the bottom metadata block
//! has been cut off the end. Blank lines in front of a block are remembered as that block's
//! spacing, and metadata entries remember the blank lines between them, so an untouched
//! document serializes back to the bytes it was read from. Blank lines inside section
//! bodies are the one thing not preserved.

use std::sync::Arc;

use super::{
	line::{LineKind, classify_line, split_metadata},
	metadata::Partition,
	schema::DocumentSchema,
	section::Section,
	types::Document,
};

const DEFAULT_BOTTOM_HEADING: &str = "## Metadata";

fn count_blank(lines: &[&str], from: usize) -> usize {
	lines.get(from..).map_or(0, |rest| rest.iter().take_while(|l| l.trim().is_empty()).count())
}

fn pop_trailing_blanks(lines: &mut Vec<&str>) -> usize {
	let mut n = 0;
	while lines.last().is_some_and(|l| l.trim().is_empty()) {
		lines.pop();
		n += 1;
	}
	n
}

/// Index of the bottom metadata heading. The last matching heading only counts if
/// everything after it is blank or `key: value`.
fn find_bottom_block(lines: &[&str], schema: &DocumentSchema) -> Option<usize> {
	let start = lines.iter().rposition(|l| schema.is_bottom_heading(l))?;
	let well_formed = lines[start + 1..].iter().all(|l| l.trim().is_empty() || split_metadata(l).is_some());
	if !well_formed {
		tracing::debug!("[parse] heading at line {} is followed by non-metadata, treating it as body", start + 1);
		return None;
	}
	Some(start)
}

/// Append a parsed section, folding it into an earlier one with the same title.
fn push_section(sections: &mut Vec<Section>, section: Section) {
	match sections.iter_mut().find(|s| s.title().eq_ignore_ascii_case(section.title())) {
		Some(first) => {
			tracing::debug!("[parse] duplicate section {:?}, merging into the first", section.title());
			for line in section.lines() {
				first.push_parsed(line);
			}
		}
		None => sections.push(section),
	}
}

impl Document {
	pub fn parse(text: &str, schema: Arc<DocumentSchema>) -> Self {
		let mut doc = Self::new(schema);
		if text.is_empty() {
			doc.trailing_newline = false;
			return doc;
		}
		doc.trailing_newline = text.ends_with('\n');
		let schema = Arc::clone(&doc.schema);
		let mut lines: Vec<&str> = text.split('\n').collect();
		if doc.trailing_newline {
			lines.pop();
		}

		let bottom: Option<Vec<&str>> = find_bottom_block(&lines, &schema).map(|start| {
			doc.bottom_heading = Some(lines[start].to_string());
			lines.split_off(start).into_iter().skip(1).collect()
		});
		if let Some(bottom) = &bottom {
			let mut gap = 0;
			for line in bottom {
				match split_metadata(line) {
					Some((key, value)) => {
						doc.metadata.push_parsed(key, value, Partition::Bottom, line, gap);
						gap = 0;
					}
					None => gap += 1,
				}
			}
			doc.spacing.bottom_trailing = gap;
		}

		let leading = count_blank(&lines, 0);
		if leading < lines.len() || bottom.is_some() {
			lines.drain(..leading);
			doc.spacing.leading = leading;
		}

		let mut cursor = 0;
		if let Some(first) = lines.first()
			&& let LineKind::Title { .. } = classify_line(first, &schema)
		{
			doc.title_line = Some(first.to_string());
			cursor = 1;
		}

		// Header and links: at most one of each, header first.
		loop {
			let blanks = count_blank(&lines, cursor);
			let Some(line) = lines.get(cursor + blanks) else { break };
			match classify_line(line, &schema) {
				LineKind::Links => {
					doc.links = Some(line.to_string());
					doc.spacing.links = Some(blanks);
					cursor += blanks + 1;
					break;
				}
				LineKind::Plain if doc.header.is_none() => {}
				LineKind::Metadata { key, .. } if doc.header.is_none() && !schema.is_known_key(key) => {}
				_ => break,
			}
			doc.header = Some(line.to_string());
			doc.spacing.header = Some(blanks);
			cursor += blanks + 1;
		}

		// Top metadata, with the blank lines between entries recorded on each entry.
		let blanks = count_blank(&lines, cursor);
		let mut end = None;
		let mut gap = 0;
		for (i, line) in lines.iter().enumerate().skip(cursor + blanks) {
			match classify_line(line, &schema) {
				LineKind::Blank => gap += 1,
				LineKind::Metadata { key, value } => {
					doc.metadata.push_parsed(key, value, Partition::Top, line, gap);
					end = Some(i + 1);
					gap = 0;
				}
				_ => break,
			}
		}
		if let Some(end) = end {
			doc.spacing.top_metadata = Some(blanks);
			cursor = end;
		}

		let has_preamble = doc.title_line.is_some() || doc.header.is_some() || doc.links.is_some() || end.is_some();
		let mut free: Vec<&str> = Vec::new();
		let mut current: Option<Section> = None;
		let mut footer: Option<Vec<&str>> = None;
		let mut blank_run = 0;
		for &line in &lines[cursor..] {
			if let Some(footer) = footer.as_mut() {
				footer.push(line);
				continue;
			}
			match classify_line(line, &schema) {
				LineKind::Blank => {
					if current.is_none() {
						free.push(line);
					}
					blank_run += 1;
					continue;
				}
				LineKind::FooterStart => {
					if current.is_none() {
						free.truncate(free.len() - blank_run);
					}
					if let Some(section) = current.take() {
						push_section(&mut doc.sections, section);
					}
					doc.spacing.footer = Some(blank_run);
					footer = Some(vec![line]);
				}
				LineKind::SectionStart { title } => {
					if current.is_none() {
						free.truncate(free.len() - blank_run);
					}
					if let Some(section) = current.take() {
						push_section(&mut doc.sections, section);
					}
					current = Some(Section::parsed(title, line, blank_run));
				}
				_ => match current.as_mut() {
					Some(section) => section.push_parsed(line),
					None => free.push(line),
				},
			}
			blank_run = 0;
		}
		let in_section = current.is_some();
		if let Some(section) = current.take() {
			push_section(&mut doc.sections, section);
		}

		if bottom.is_some() {
			doc.spacing.bottom_metadata = Some(match footer.as_mut() {
				Some(footer) => pop_trailing_blanks(footer),
				None if in_section => blank_run,
				None => pop_trailing_blanks(&mut free),
			});
		}

		if has_preamble && !free.is_empty() {
			let leading = free.iter().take_while(|l| l.trim().is_empty()).count();
			if leading < free.len() {
				free.drain(..leading);
				doc.spacing.free_text = Some(leading);
			} else {
				// nothing but blank lines after the preamble: keep them as written
				doc.spacing.free_text = Some(0);
			}
		}
		doc.free_text = free.into_iter().map(str::to_string).collect();
		doc.footer = footer.unwrap_or_default().into_iter().map(str::to_string).collect();

		tracing::debug!(
			"[parse] title={:?} metadata={} sections={} footer_lines={}",
			doc.title(),
			doc.metadata.len(),
			doc.sections.len(),
			doc.footer.len()
		);
		doc
	}

	/// Render back to markdown.
	pub fn to_markdown(&self) -> String {
		let mut out = Writer::new(self.spacing.leading);
		if let Some(title) = &self.title_line {
			out.block(None, [title.clone()]);
		}
		if let Some(header) = &self.header {
			out.block(self.spacing.header, [header.clone()]);
		}
		if let Some(links) = &self.links {
			out.block(self.spacing.links, [links.clone()]);
		}
		out.block(self.spacing.top_metadata, self.metadata.render_block(Partition::Top, false));
		out.block(self.spacing.free_text, self.free_text.iter().cloned());
		for section in &self.sections {
			if self.schema.hide_empty_sections && section.is_empty() && !section.existed_on_load() {
				continue;
			}
			let heading = section.heading().map_or_else(|| self.schema.section_heading(section.title()), str::to_string);
			out.block(section.gap, std::iter::once(heading).chain(section.lines().iter().cloned()));
		}
		out.block(self.spacing.footer, self.footer.iter().cloned());
		if !self.metadata.bottom_empty() {
			let heading = self.bottom_heading.clone().unwrap_or_else(|| DEFAULT_BOTTOM_HEADING.to_string());
			let entries = self.metadata.render_block(Partition::Bottom, true);
			let trailing = std::iter::repeat_n(String::new(), self.spacing.bottom_trailing);
			out.block(self.spacing.bottom_metadata, std::iter::once(heading).chain(entries).chain(trailing));
		}
		out.finish(self.trailing_newline)
	}
}

struct Writer {
	lines: Vec<String>,
	started: bool,
}

impl Writer {
	fn new(leading: usize) -> Self {
		Self {
			lines: vec![String::new(); leading],
			started: false,
		}
	}

	/// Append a block, preceded by `gap` blank lines unless it is the first.
	fn block(&mut self, gap: Option<usize>, block: impl IntoIterator<Item = String>) {
		let mut block = block.into_iter().peekable();
		if block.peek().is_none() {
			return;
		}
		if self.started {
			self.lines.extend(std::iter::repeat_n(String::new(), gap.unwrap_or(1)));
		}
		self.started = true;
		self.lines.extend(block);
	}

	fn finish(self, trailing_newline: bool) -> String {
		if !self.started {
			return String::new();
		}
		let mut text = self.lines.join("\n");
		if trailing_newline {
			text.push('\n');
		}
		text
	}
}
