//! Tree builder: infers document structure from `@node`/heading pairs.
//!
//! Every node is placed relative to the previously inserted one (the cursor):
//! same level continues the sibling chain, a deeper level descends, a
//! shallower level climbs to the matching ancestor and appends to the end of
//! its sibling chain.

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::diagnostic::Diagnostic;
use crate::domain::heading::{ROOT_LEVEL, TOP_LEVEL};
use crate::domain::tree::DocumentTree;

/// A node marker waiting for its heading.
#[derive(Debug, Clone)]
enum PendingMarker {
    Node { name: String, line: usize },
    Placeholder,
}

#[derive(Debug, Clone)]
struct PendingHeading {
    level: u8,
    title: String,
    line: usize,
}

/// Builds a [`DocumentTree`] from markers and headings seen in document order.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: DocumentTree,
    cursor: Index,
    inserted: usize,
    pending_node: Option<PendingMarker>,
    pending_heading: Option<PendingHeading>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        let tree = DocumentTree::new();
        let cursor = tree.root();
        Self {
            tree,
            cursor,
            inserted: 0,
            pending_node: None,
            pending_heading: None,
            diagnostics: Vec::new(),
        }
    }

    /// An `@node` line.
    #[instrument(level = "trace", skip(self))]
    pub fn observe_node(&mut self, name: &str, line: usize) {
        if self.inserted == 0 {
            // The Top node never waits for a heading.
            self.insert(name.to_string(), None, TOP_LEVEL, line);
            let root = self.tree.root();
            if let Some(top) = self.tree.get_mut(self.cursor) {
                top.prev = Some(root);
            }
            self.try_pair();
            return;
        }
        self.flush_stale_node(line);
        self.pending_node = Some(PendingMarker::Node {
            name: name.to_string(),
            line,
        });
        self.try_pair();
    }

    /// A placeholder line: the next heading belongs to no node.
    #[instrument(level = "trace", skip(self))]
    pub fn observe_placeholder(&mut self, line: usize) {
        if self.inserted == 0 {
            trace!("placeholder before the Top node ignored");
            return;
        }
        self.flush_stale_node(line);
        self.pending_node = Some(PendingMarker::Placeholder);
        self.try_pair();
    }

    /// A sectioning command line.
    #[instrument(level = "trace", skip(self))]
    pub fn observe_heading(&mut self, level: u8, title: &str, line: usize) {
        if let Some(old) = self.pending_heading.take() {
            self.diagnostics.push(Diagnostic::TitleWithoutNode {
                title: old.title,
                line,
            });
        }
        self.pending_heading = Some(PendingHeading {
            level,
            title: title.to_string(),
            line,
        });
        if self.inserted > 0 {
            self.try_pair();
        }
    }

    /// Leading comment of a menu block read while the cursor node was open.
    pub fn set_menu_comment(&mut self, comment: String) {
        if let Some(node) = self.tree.get_mut(self.cursor) {
            node.menu_comment = Some(comment);
        }
    }

    /// Flush whatever is still pending and hand over the tree.
    pub fn finish(mut self) -> (DocumentTree, Vec<Diagnostic>) {
        if let Some(PendingMarker::Node { name, line }) = self.pending_node.take() {
            self.diagnostics.push(Diagnostic::NodeWithoutTitle {
                node: name.clone(),
                line,
            });
            let level = self.guess_level();
            self.insert(name, None, level, line);
        }
        if let Some(heading) = self.pending_heading.take() {
            self.diagnostics.push(Diagnostic::TitleWithoutNode {
                title: heading.title,
                line: heading.line,
            });
        }
        debug!("built tree with {} nodes", self.tree.len());
        (self.tree, self.diagnostics)
    }

    /// A new marker arrived while the previous one still lacks a heading.
    fn flush_stale_node(&mut self, line: usize) {
        match self.pending_node.take() {
            Some(PendingMarker::Node { name, line: node_line }) => {
                self.diagnostics.push(Diagnostic::NodeWithoutTitle {
                    node: name.clone(),
                    line,
                });
                let level = self.guess_level();
                self.insert(name, None, level, node_line);
            }
            Some(PendingMarker::Placeholder) => {
                trace!("placeholder without heading dropped");
            }
            None => {}
        }
    }

    fn try_pair(&mut self) {
        if self.pending_node.is_none() || self.pending_heading.is_none() {
            return;
        }
        let (Some(marker), Some(heading)) = (self.pending_node.take(), self.pending_heading.take())
        else {
            return;
        };
        match marker {
            PendingMarker::Node { name, line } => {
                self.insert(name, Some(heading.title), heading.level, line);
            }
            PendingMarker::Placeholder => {
                trace!(title = %heading.title, "heading hidden by placeholder");
            }
        }
    }

    /// Same level as the cursor, or Top's level when the cursor is the root.
    fn guess_level(&self) -> u8 {
        match self.tree.get(self.cursor).map(|n| n.level) {
            Some(level) if level != ROOT_LEVEL => level,
            _ => TOP_LEVEL,
        }
    }

    /// Link a new node into the tree relative to the cursor and move the cursor to it.
    #[instrument(level = "debug", skip(self))]
    pub fn insert(&mut self, name: String, title: Option<String>, level: u8, line: usize) -> Index {
        let cursor = self.cursor;
        let (cursor_level, cursor_parent) = match self.tree.get(cursor) {
            Some(n) => (n.level, n.parent),
            None => (ROOT_LEVEL, self.tree.root()),
        };
        let idx = self.tree.alloc(name, title, level, line);
        self.inserted += 1;

        if level == cursor_level {
            self.link_after(cursor, idx, cursor_parent);
        } else if level > cursor_level {
            self.link_child(cursor, idx);
            if self.inserted == 2 {
                // Top and the first chapter are chained so navigation leaves Top.
                self.link_siblings(cursor, idx);
            }
            if level > cursor_level + 1 {
                let node = self.node_name(idx);
                self.diagnostics.push(Diagnostic::TooFarDown {
                    node,
                    line,
                    levels: level - (cursor_level + 1),
                });
            }
        } else {
            let ancestor = self.ancestor_at_or_above(cursor, level);
            let last = self.chain_end(ancestor);
            let (last_level, last_parent) = match self.tree.get(last) {
                Some(n) => (n.level, n.parent),
                None => (level, self.tree.root()),
            };
            if last_level != level {
                let node = self.node_name(idx);
                self.diagnostics.push(Diagnostic::LevelMismatch {
                    node,
                    line,
                    level,
                    sibling_level: last_level,
                });
            }
            self.link_after(last, idx, last_parent);
        }

        self.cursor = idx;
        idx
    }

    /// Climb from the cursor's parent until reaching a node whose level is <= `level`.
    fn ancestor_at_or_above(&self, from: Index, level: u8) -> Index {
        let root = self.tree.root();
        let mut current = self.tree.get(from).map(|n| n.parent).unwrap_or(root);
        while let Some(node) = self.tree.get(current) {
            if node.level <= level || current == root {
                break;
            }
            current = node.parent;
        }
        current
    }

    /// End of the sibling chain to append to after climbing to `ancestor`.
    ///
    /// Top's `next` leads into its own children, so climbing back to Top
    /// continues along the chapter chain instead of leaving the document.
    fn chain_end(&self, ancestor: Index) -> Index {
        let root = self.tree.root();
        match self.tree.get(ancestor) {
            Some(node) if ancestor != root && node.parent == root => node
                .next
                .map(|chapter| self.tree.last_sibling(chapter))
                .unwrap_or(ancestor),
            _ => self.tree.last_sibling(ancestor),
        }
    }

    fn link_after(&mut self, prev: Index, idx: Index, parent: Index) {
        self.link_siblings(prev, idx);
        if let Some(node) = self.tree.get_mut(idx) {
            node.parent = parent;
        }
    }

    fn link_siblings(&mut self, prev: Index, next: Index) {
        if let Some(p) = self.tree.get_mut(prev) {
            p.next = Some(next);
        }
        if let Some(n) = self.tree.get_mut(next) {
            n.prev = Some(prev);
        }
    }

    fn link_child(&mut self, parent: Index, idx: Index) {
        if let Some(p) = self.tree.get_mut(parent) {
            p.first_child = Some(idx);
        }
        if let Some(n) = self.tree.get_mut(idx) {
            n.parent = parent;
        }
    }

    fn node_name(&self, idx: Index) -> String {
        self.tree.name(idx).unwrap_or_default().to_string()
    }
}
