//! Structural pass over the small subset of markdown the constitution uses.
//!
//! A document is partitioned into typed blocks (frontmatter, heading, fenced
//! block, plain text), each spanning a range of source lines. Everything that
//! extracts meaning from a document folds over these blocks instead of
//! re-scanning raw text, so fenced code never leaks into definitions,
//! references, or section structure.
//!
//! This is not a markdown parser. Setext headings, indented code, nested
//! fences and inline markup are all treated as plain text.

use std::collections::BTreeMap;
use std::ops::Range;

const FRONTMATTER_DELIM: &str = "---";
const FENCE_MARKER: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind<'a> {
    /// Leading `---` delimited `key: value` block. Only recognized on line 1.
    Frontmatter,
    Heading { level: usize, text: &'a str },
    /// Backtick fence. `info` is the trimmed text after the opening marker.
    Fence { info: &'a str, closed: bool },
    Text,
}

/// One block and the source lines it covers, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind<'a>,
    pub lines: Range<usize>,
}

/// A heading plus everything up to the next heading of the same or a
/// shallower level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub title: &'a str,
    pub level: usize,
    /// Block index of the heading itself.
    pub heading: usize,
    /// Block indices of the body, heading excluded.
    pub body: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct Document<'a> {
    lines: Vec<&'a str>,
    blocks: Vec<Block<'a>>,
}

impl<'a> Document<'a> {
    pub fn parse(text: &'a str) -> Self {
        let lines: Vec<&'a str> = text.lines().collect();
        let blocks = partition(&lines);
        Self { lines, blocks }
    }

    pub fn blocks(&self) -> &[Block<'a>] {
        &self.blocks
    }

    pub fn lines_of(&self, block: &Block<'a>) -> &[&'a str] {
        &self.lines[block.lines.clone()]
    }

    /// Lines of a fence between its delimiters; the whole block for anything else.
    pub fn content_of(&self, block: &Block<'a>) -> &[&'a str] {
        let lines = self.lines_of(block);
        match block.kind {
            BlockKind::Fence { closed, .. } => {
                let end = if closed { lines.len().saturating_sub(1) } else { lines.len() };
                &lines[1.min(end)..end]
            }
            BlockKind::Frontmatter => &lines[1..lines.len().saturating_sub(1)],
            _ => lines,
        }
    }

    /// Source text with every fenced block removed.
    pub fn text_outside_fences(&self) -> String {
        let mut out = Vec::with_capacity(self.lines.len());
        for block in &self.blocks {
            if !matches!(block.kind, BlockKind::Fence { .. }) {
                out.extend_from_slice(self.lines_of(block));
            }
        }
        out.join("\n")
    }

    /// Parsed frontmatter, if the document opens with a closed `---` block.
    /// Keys are lower-cased, values trimmed of whitespace and surrounding quotes.
    pub fn frontmatter(&self) -> Option<BTreeMap<String, String>> {
        let block = self
            .blocks
            .first()
            .filter(|b| b.kind == BlockKind::Frontmatter)?;
        let mut fields = BTreeMap::new();
        for line in self.content_of(block) {
            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                fields.insert(key.trim().to_lowercase(), value.to_string());
            }
        }
        Some(fields)
    }

    /// First closed fence whose info string is exactly `info`.
    pub fn fence_with_info(&self, info: &str) -> Option<&Block<'a>> {
        self.blocks.iter().find(|b| {
            matches!(b.kind, BlockKind::Fence { info: i, closed: true } if i == info)
        })
    }

    /// Sections opened by headings of exactly `level` within the block range.
    pub fn sections_in(&self, range: Range<usize>, level: usize) -> Vec<Section<'a>> {
        let end = range.end.min(self.blocks.len());
        let mut sections = Vec::new();
        for idx in range.start..end {
            let BlockKind::Heading { level: l, text } = self.blocks[idx].kind else {
                continue;
            };
            if l != level {
                continue;
            }
            let body_end = (idx + 1..end)
                .find(|&j| {
                    matches!(self.blocks[j].kind, BlockKind::Heading { level: next, .. } if next <= level)
                })
                .unwrap_or(end);
            sections.push(Section {
                title: text,
                level,
                heading: idx,
                body: idx + 1..body_end,
            });
        }
        sections
    }

    pub fn sections(&self, level: usize) -> Vec<Section<'a>> {
        self.sections_in(0..self.blocks.len(), level)
    }

    /// Raw body text of a section, trimmed.
    pub fn section_text(&self, section: &Section<'a>) -> String {
        let blocks = &self.blocks[section.body.clone()];
        match (blocks.first(), blocks.last()) {
            (Some(first), Some(last)) => self.lines[first.lines.start..last.lines.end]
                .join("\n")
                .trim()
                .to_string(),
            _ => String::new(),
        }
    }
}

fn partition<'a>(lines: &[&'a str]) -> Vec<Block<'a>> {
    let mut blocks = Vec::new();
    let mut i = 0;

    if let Some(end) = frontmatter_end(lines) {
        blocks.push(Block {
            kind: BlockKind::Frontmatter,
            lines: 0..end + 1,
        });
        i = end + 1;
    }

    let mut text_start: Option<usize> = None;
    while i < lines.len() {
        let line = lines[i];
        let structural = if let Some(info) = fence_open(line) {
            let close = (i + 1..lines.len()).find(|&j| lines[j].trim_start().starts_with(FENCE_MARKER));
            let (end, closed) = match close {
                Some(j) => (j + 1, true),
                None => (lines.len(), false),
            };
            Some(Block {
                kind: BlockKind::Fence { info, closed },
                lines: i..end,
            })
        } else {
            parse_heading(line).map(|(level, text)| Block {
                kind: BlockKind::Heading { level, text },
                lines: i..i + 1,
            })
        };

        match structural {
            Some(block) => {
                if let Some(start) = text_start.take() {
                    blocks.push(Block {
                        kind: BlockKind::Text,
                        lines: start..i,
                    });
                }
                i = block.lines.end;
                blocks.push(block);
            }
            None => {
                text_start.get_or_insert(i);
                i += 1;
            }
        }
    }
    if let Some(start) = text_start {
        blocks.push(Block {
            kind: BlockKind::Text,
            lines: start..lines.len(),
        });
    }
    blocks
}

fn frontmatter_end(lines: &[&str]) -> Option<usize> {
    if lines.first()?.trim_end() != FRONTMATTER_DELIM {
        return None;
    }
    (1..lines.len()).find(|&j| lines[j].trim() == FRONTMATTER_DELIM)
}

fn fence_open(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(FENCE_MARKER)
        .map(|rest| rest.trim_start_matches('`').trim())
}

/// `(level, text)` for an ATX heading line: one to six `#`, whitespace, text.
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() { None } else { Some((level, text)) }
}

/// Convenience for callers that only need fence-free text.
pub fn strip_fences(text: &str) -> String {
    Document::parse(text).text_outside_fences()
}
