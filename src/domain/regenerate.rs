//! Regenerator: renders `@node` lines and menu blocks from the linked tree.

use generational_arena::Index;
use tracing::debug;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::linker::LinkedDocument;

/// Printed for an empty pointer field.
const BLANK: &str = " ";

/// The four pointer fields of a regenerated `@node` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePointers {
    pub name: String,
    pub next: Option<String>,
    /// Previous sibling, or the parent when there is none
    pub prev: Option<String>,
    pub up: Option<String>,
}

impl NodePointers {
    /// The `@node` line, ended by `eol`.
    pub fn render(&self, eol: &str) -> String {
        format!(
            "@node {}, {}, {}, {}{}",
            self.name,
            self.next.as_deref().unwrap_or(BLANK),
            self.prev.as_deref().unwrap_or(BLANK),
            self.up.as_deref().unwrap_or(BLANK),
            eol,
        )
    }
}

impl LinkedDocument {
    /// Pointer fields for the node called `name`.
    pub fn pointers(&self, name: &str) -> DomainResult<NodePointers> {
        let idx = self
            .lookup(name)
            .ok_or_else(|| DomainError::UnknownNode(name.to_string()))?;
        let node = self
            .node(idx)
            .ok_or_else(|| DomainError::UnknownNode(name.to_string()))?;
        let name_of = |i: Option<Index>| i.and_then(|i| self.tree.name(i)).map(str::to_string);

        let up = name_of(Some(node.parent));
        // The info readers want the up node in the prev slot when there is no prev.
        let prev = name_of(node.prev).or_else(|| up.clone());
        Ok(NodePointers {
            name: node.name.clone(),
            next: name_of(node.next),
            prev,
            up,
        })
    }

    /// A complete `@node` line for `name`, ended by `eol`.
    pub fn node_line(&self, name: &str, eol: &str) -> DomainResult<String> {
        self.pointers(name).map(|p| p.render(eol))
    }

    /// A fresh menu block listing the children of `anchor`.
    ///
    /// Entries that were linked to a child keep their label and description
    /// and are marked consumed; children nobody listed get a minimal entry.
    /// Every generated line ends with `eol`.
    pub fn menu_block(&mut self, anchor: Index, line: usize, eol: &str) -> DomainResult<String> {
        let node = self
            .node(anchor)
            .ok_or_else(|| DomainError::UnknownNode(format!("{:?}", anchor)))?;
        if node.first_child.is_none() {
            return Err(DomainError::NoInferiorNodes {
                node: node.name.clone(),
                line,
            });
        }

        let mut out = format!("@menu{}", eol);
        if let Some(comment) = &node.menu_comment {
            out.push_str(comment);
            out.push_str(eol);
        }

        let children: Vec<(String, Option<String>, Option<usize>)> = self
            .tree
            .children(anchor)
            .map(|(_, child)| (child.name.clone(), child.title.clone(), child.menu))
            .collect();
        debug!(anchor = %node.name, children = children.len(), "regenerating menu");

        for (name, title, menu) in children {
            match menu.and_then(|pos| self.entries.get_mut(pos)) {
                Some(entry) => {
                    entry.consumed = true;
                    match &entry.label {
                        Some(label) => out.push_str(&format!("* {}: {}.", label, name)),
                        None => out.push_str(&format!("* {}::", name)),
                    }
                    if let Some(description) = &entry.description {
                        out.push('\t');
                        out.push_str(description);
                    }
                    out.push_str(eol);
                }
                None => match title {
                    Some(title) => out.push_str(&format!("* {}::\t{}.{}", name, title, eol)),
                    None => out.push_str(&format!("* {}::{}", name, eol)),
                },
            }
        }
        out.push_str("@end menu");
        out.push_str(eol);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::TreeBuilder;
    use crate::domain::linker::link;
    use crate::domain::menu::MenuEntry;

    /// Top -> child1 -> child2, child1 -> grandchild
    fn sample(entries: Vec<MenuEntry>) -> LinkedDocument {
        let mut builder = TreeBuilder::new();
        builder.observe_node("Top", 1);
        builder.observe_node("child1", 2);
        builder.observe_heading(2, "Child One", 3);
        builder.observe_node("grandchild", 4);
        builder.observe_heading(3, "Grandchild", 5);
        builder.observe_node("child2", 6);
        builder.observe_heading(2, "Child Two", 7);
        let (tree, _) = builder.finish();
        link(tree, entries).0
    }

    #[test]
    fn test_pointers_follow_tree_adjacency() {
        let doc = sample(Vec::new());

        assert_eq!(doc.node_line("Top", "\n").unwrap(), "@node Top, child1, (dir), (dir)\n");
        assert_eq!(doc.node_line("child1", "\n").unwrap(), "@node child1, child2, Top, Top\n");
        assert_eq!(doc.node_line("child2", "\n").unwrap(), "@node child2,  , child1, Top\n");
        // first child: prev falls back to up
        assert_eq!(
            doc.node_line("grandchild", "\n").unwrap(),
            "@node grandchild,  , child1, child1\n"
        );
    }

    #[test]
    fn test_unknown_node_is_fatal() {
        let doc = sample(Vec::new());
        assert_eq!(
            doc.node_line("ghost", "\n"),
            Err(DomainError::UnknownNode("ghost".into()))
        );
    }

    #[test]
    fn test_menu_uses_linked_entries_and_synthesizes_missing() {
        let entries = vec![MenuEntry::new(Some("First"), "child1", Some("The first."), 9)];
        let mut doc = sample(entries);
        let top = doc.lookup("Top").unwrap();

        let menu = doc.menu_block(top, 9, "\n").unwrap();

        assert_eq!(
            menu,
            "@menu\n* First: child1.\tThe first.\n* child2::\tChild Two.\n@end menu\n"
        );
        assert!(doc.entries[0].consumed);
    }

    #[test]
    fn test_menu_for_leaf_is_fatal() {
        let mut doc = sample(Vec::new());
        let leaf = doc.lookup("child2").unwrap();
        assert_eq!(
            doc.menu_block(leaf, 30, "\n"),
            Err(DomainError::NoInferiorNodes {
                node: "child2".into(),
                line: 30
            })
        );
    }

    #[test]
    fn test_generated_lines_use_given_terminator() {
        let mut doc = sample(Vec::new());
        let top = doc.lookup("Top").unwrap();

        assert_eq!(
            doc.node_line("child2", "\r\n").unwrap(),
            "@node child2,  , child1, Top\r\n"
        );
        assert_eq!(
            doc.menu_block(top, 9, "\r\n").unwrap(),
            "@menu\r\n* child1::\tChild One.\r\n* child2::\tChild Two.\r\n@end menu\r\n"
        );
    }
}
