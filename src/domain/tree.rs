use generational_arena::{Arena, Index};
use std::fmt;
use termtree::Tree;
use tracing::instrument;

use crate::domain::heading::ROOT_LEVEL;

/// Name of the synthetic root every document hangs from.
pub const ROOT_NAME: &str = "(dir)";

/// One `@node` of the document (or the synthetic root).
#[derive(Debug, Clone)]
pub struct TexiNode {
    /// Name from the `@node` line
    pub name: String,
    /// Text of the matching `@chapter`, `@section`, ...; None if it had no heading
    pub title: Option<String>,
    pub level: u8,
    /// Line of the `@node` marker
    pub line: usize,
    /// Leading comment of this node's own menu block
    pub menu_comment: Option<String>,
    pub next: Option<Index>,
    pub prev: Option<Index>,
    /// Up pointer; the root is its own parent
    pub parent: Index,
    pub first_child: Option<Index>,
    /// Position of the linked menu entry, set by the linker
    pub menu: Option<usize>,
}

impl fmt::Display for TexiNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} [{}] {}", self.name, self.level, title),
            None => write!(f, "{} [{}]", self.name, self.level),
        }
    }
}

/// Arena-backed node tree.
///
/// `order` keeps every node in creation order, root first, so the linker can
/// flatten the tree without walking it.
#[derive(Debug)]
pub struct DocumentTree {
    arena: Arena<TexiNode>,
    root: Index,
    order: Vec<Index>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert_with(|idx| TexiNode {
            name: ROOT_NAME.to_string(),
            title: None,
            level: ROOT_LEVEL,
            line: 0,
            menu_comment: None,
            next: None,
            prev: None,
            parent: idx,
            first_child: None,
            menu: None,
        });
        Self {
            arena,
            root,
            order: vec![root],
        }
    }

    /// Allocate a detached node; the builder wires its links afterwards.
    #[instrument(level = "trace", skip(self))]
    pub fn alloc(&mut self, name: String, title: Option<String>, level: u8, line: usize) -> Index {
        let root = self.root;
        let idx = self.arena.insert(TexiNode {
            name,
            title,
            level,
            line,
            menu_comment: None,
            next: None,
            prev: None,
            parent: root,
            first_child: None,
            menu: None,
        });
        self.order.push(idx);
        idx
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get(&self, idx: Index) -> Option<&TexiNode> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: Index) -> Option<&mut TexiNode> {
        self.arena.get_mut(idx)
    }

    /// Node count, root included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.len() <= 1
    }

    /// Indices in creation order, root first.
    pub fn allocation_order(&self) -> &[Index] {
        &self.order
    }

    pub fn name(&self, idx: Index) -> Option<&str> {
        self.get(idx).map(|n| n.name.as_str())
    }

    /// Walk a sibling chain starting at `first`.
    ///
    /// Stops where the chain leaves `first`'s parent: Top is chained to the
    /// first chapter, which is its child rather than its sibling.
    pub fn siblings(&self, first: Option<Index>) -> SiblingIter<'_> {
        SiblingIter {
            tree: self,
            current: first,
            parent: first.and_then(|idx| self.get(idx)).map(|n| n.parent),
        }
    }

    /// Children of `idx` in sibling order.
    pub fn children(&self, idx: Index) -> SiblingIter<'_> {
        self.siblings(self.get(idx).and_then(|n| n.first_child))
    }

    /// Last node of the sibling chain containing `idx`.
    pub fn last_sibling(&self, idx: Index) -> Index {
        self.siblings(Some(idx)).last().map(|(i, _)| i).unwrap_or(idx)
    }

    /// Maximum nesting depth below the root.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.depth_below(self.root)
    }

    fn depth_below(&self, idx: Index) -> usize {
        self.children(idx)
            .map(|(child, _)| 1 + self.depth_below(child))
            .max()
            .unwrap_or(0)
    }

    /// Render the structure for display.
    pub fn to_termtree(&self) -> Tree<String> {
        self.subtree(self.root)
    }

    fn subtree(&self, idx: Index) -> Tree<String> {
        let label = self
            .get(idx)
            .map(|n| n.to_string())
            .unwrap_or_default();
        let leaves: Vec<_> = self
            .children(idx)
            .map(|(child, _)| self.subtree(child))
            .collect();
        Tree::new(label).with_leaves(leaves)
    }
}

pub struct SiblingIter<'a> {
    tree: &'a DocumentTree,
    current: Option<Index>,
    parent: Option<Index>,
}

impl<'a> Iterator for SiblingIter<'a> {
    type Item = (Index, &'a TexiNode);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = self.tree.get(idx)?;
        if Some(node.parent) != self.parent {
            self.current = None;
            return None;
        }
        self.current = node.next;
        Some((idx, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_its_own_parent() {
        let tree = DocumentTree::new();
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.parent, tree.root());
        assert_eq!(root.name, ROOT_NAME);
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_allocation_order_is_creation_order() {
        let mut tree = DocumentTree::new();
        let a = tree.alloc("a".into(), None, 1, 1);
        let b = tree.alloc("b".into(), None, 2, 5);
        assert_eq!(tree.allocation_order(), &[tree.root(), a, b]);
    }

    #[test]
    fn test_siblings_and_last_sibling() {
        let mut tree = DocumentTree::new();
        let a = tree.alloc("a".into(), None, 2, 1);
        let b = tree.alloc("b".into(), None, 2, 2);
        tree.get_mut(a).unwrap().next = Some(b);
        tree.get_mut(b).unwrap().prev = Some(a);

        let names: Vec<_> = tree.siblings(Some(a)).map(|(_, n)| n.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(tree.last_sibling(a), b);
    }
}
