//! Recoverable structural mismatches.
//!
//! These are reported and the run goes on with best-effort output.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A new `@node` arrived while the previous one never got a heading.
    NodeWithoutTitle { node: String, line: usize },
    /// A new heading arrived while the previous one never got a node.
    TitleWithoutNode { title: String, line: usize },
    /// A node nests more than one level below its parent.
    TooFarDown { node: String, line: usize, levels: u8 },
    /// A node climbs back to an ancestor chain of a different level.
    LevelMismatch {
        node: String,
        line: usize,
        level: u8,
        sibling_level: u8,
    },
    /// Two menu entries point at the same node.
    DuplicateMenuTarget {
        target: String,
        first_line: usize,
        second_line: usize,
    },
    /// A menu entry no regenerated menu used.
    UnusedMenuEntry {
        label: Option<String>,
        target: String,
        line: usize,
    },
    /// A node below Top that no menu mentions.
    MissingMenuEntry { node: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NodeWithoutTitle { node, line } => write!(
                f,
                "line {}: new @node but no title for previous @node '{}'",
                line, node
            ),
            Diagnostic::TitleWithoutNode { title, line } => write!(
                f,
                "line {}: new title but no @node for previous title '{}'",
                line, title
            ),
            Diagnostic::TooFarDown { node, line, levels } => write!(
                f,
                "node '{}' at line {} is {} levels too far down",
                node, line, levels
            ),
            Diagnostic::LevelMismatch {
                node,
                line,
                level,
                sibling_level,
            } => write!(
                f,
                "node '{}' at line {} has level {} but follows siblings at level {}",
                node, line, level, sibling_level
            ),
            Diagnostic::DuplicateMenuTarget {
                target,
                first_line,
                second_line,
            } => write!(
                f,
                "duplicate menu entries for node '{}', near lines {} and {}",
                target, first_line, second_line
            ),
            Diagnostic::UnusedMenuEntry {
                label,
                target,
                line,
            } => {
                write!(f, "no @menu ")?;
                if let Some(label) = label {
                    write!(f, "for item '{}' ", label)?;
                }
                write!(f, "for node '{}', ending line {}", target, line)
            }
            Diagnostic::MissingMenuEntry { node } => write!(
                f,
                "no menu item for node '{}' - one will be generated if possible",
                node
            ),
        }
    }
}
