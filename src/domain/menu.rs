//! Menu parser: decomposes the body of an `@menu` block into entries.
//!
//! ```text
//! Optional leading comment
//! * Label: target-node.     Description text,
//!                           possibly continued.
//! * other-node::            Description.
//! ```
//!
//! The scanner moves through explicit states. Entries start only at a `*`
//! opening a line. A missing `:`, an empty label or an empty target is a
//! failed transition and aborts the run; nothing else is.

use generational_arena::Index;
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};

/// One `* ...` line of a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Display text when distinct from the target name
    pub label: Option<String>,
    /// Name of the node this entry points at
    pub target: String,
    pub description: Option<String>,
    /// Line on which the owning menu block ended
    pub line: usize,
    /// Set once a regenerated menu has used this entry
    pub consumed: bool,
    /// Node resolved by the linker
    pub node: Option<Index>,
}

impl MenuEntry {
    pub fn new(label: Option<&str>, target: &str, description: Option<&str>, line: usize) -> Self {
        Self {
            label: label.map(str::to_string),
            target: target.to_string(),
            description: description.map(str::to_string),
            line,
            consumed: false,
            node: None,
        }
    }
}

/// Result of parsing one menu block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMenu {
    /// Text preceding the first entry
    pub comment: Option<String>,
    pub entries: Vec<MenuEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingComment,
    SeekingEntry,
    InLabel,
    InTarget,
    InDescription,
    Done,
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    end_line: usize,
    label: Option<String>,
    target: Option<String>,
    menu: ParsedMenu,
}

/// Parse the raw text between `@menu` and `@end menu`.
///
/// `end_line` is the line of the closing `@end menu`; it is recorded on every
/// entry and used in error messages.
#[instrument(level = "debug", skip(text))]
pub fn parse_menu(text: &str, end_line: usize) -> DomainResult<ParsedMenu> {
    if text.trim().is_empty() {
        return Ok(ParsedMenu::default());
    }
    let text = text.strip_suffix('\n').unwrap_or(text);
    let text = text.strip_suffix('\r').unwrap_or(text);

    let mut scanner = Scanner {
        text,
        pos: 0,
        end_line,
        label: None,
        target: None,
        menu: ParsedMenu::default(),
    };
    let mut state = State::SeekingComment;
    while state != State::Done {
        trace!(?state, pos = scanner.pos, "menu scanner step");
        state = match state {
            State::SeekingComment => scanner.seek_comment(),
            State::SeekingEntry => scanner.seek_entry(),
            State::InLabel => scanner.read_label()?,
            State::InTarget => scanner.read_target()?,
            State::InDescription => scanner.read_description(),
            State::Done => State::Done,
        };
    }
    Ok(scanner.menu)
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn malformed(&self, reason: &str) -> DomainError {
        DomainError::MalformedMenu {
            line: self.end_line,
            reason: reason.to_string(),
        }
    }

    /// Position of the next `*` that starts a line, with the start of that line.
    fn next_marker(&self) -> Option<(usize, usize)> {
        let mut line_start = if self.pos == 0 || self.text[..self.pos].ends_with('\n') {
            Some(self.pos)
        } else {
            None
        };
        for (offset, c) in self.rest().char_indices() {
            let i = self.pos + offset;
            match c {
                '\n' => line_start = Some(i + 1),
                '*' => {
                    if let Some(start) = line_start {
                        return Some((start, i));
                    }
                }
                c if c.is_whitespace() => {}
                _ => line_start = None,
            }
        }
        None
    }

    fn seek_comment(&mut self) -> State {
        let start = self.pos;
        self.skip_whitespace();
        if self.peek() == Some('*') {
            return State::SeekingEntry;
        }
        self.pos = start;
        let (comment_end, resume) = match self.next_marker() {
            Some((line_start, star)) => (line_start, star),
            None => (self.text.len(), self.text.len()),
        };
        let comment = self.text[..comment_end].trim_end();
        if !comment.is_empty() {
            self.menu.comment = Some(comment.to_string());
        }
        self.pos = resume;
        State::SeekingEntry
    }

    /// Only entered at an entry `*` or at the end of the text.
    fn seek_entry(&mut self) -> State {
        self.skip_whitespace();
        if self.peek() != Some('*') {
            return State::Done;
        }
        self.pos += 1;
        self.skip_whitespace();
        State::InLabel
    }

    fn read_label(&mut self) -> DomainResult<State> {
        let rest = self.rest();
        let line = rest.split('\n').next().unwrap_or("");
        let colon = line
            .find(':')
            .ok_or_else(|| self.malformed("menu item without ':'"))?;
        let text = line[..colon].trim();
        if text.is_empty() {
            return Err(self.malformed("empty menu item"));
        }
        self.pos += colon + 1;
        if self.peek() == Some(':') {
            self.pos += 1;
            self.label = None;
            self.target = Some(text.to_string());
            return Ok(self.after_target());
        }
        self.label = Some(text.to_string());
        Ok(State::InTarget)
    }

    fn read_target(&mut self) -> DomainResult<State> {
        self.skip_whitespace();
        let rest = self.rest();
        let end = rest.find(['.', ',', '\t', '\n']).unwrap_or(rest.len());
        let target = rest[..end].trim_end();
        if target.is_empty() {
            return Err(self.malformed("menu item without a node name"));
        }
        self.target = Some(target.to_string());
        // The terminator belongs to the target.
        self.pos += (end + 1).min(rest.len());
        Ok(self.after_target())
    }

    fn after_target(&mut self) -> State {
        self.skip_whitespace();
        match self.peek() {
            None => {
                self.push_entry(None);
                State::Done
            }
            Some('*') => {
                self.push_entry(None);
                State::SeekingEntry
            }
            Some(_) => State::InDescription,
        }
    }

    fn read_description(&mut self) -> State {
        let (desc_end, resume) = match self.next_marker() {
            Some((line_start, star)) => (line_start, star),
            None => (self.text.len(), self.text.len()),
        };
        let description = self.text[self.pos..desc_end].trim_end().to_string();
        self.push_entry(Some(description).filter(|d| !d.is_empty()));
        self.pos = resume;
        if resume >= self.text.len() {
            State::Done
        } else {
            State::SeekingEntry
        }
    }

    fn push_entry(&mut self, description: Option<String>) {
        let target = self.target.take().unwrap_or_default();
        self.menu.entries.push(MenuEntry {
            label: self.label.take(),
            target,
            description,
            line: self.end_line,
            consumed: false,
            node: None,
        });
    }
}
