//! Linker: cross-references menu entries and nodes by name.
//!
//! Both sides are sorted by name and merge-joined, so every node ends up with
//! at most one menu entry and every entry with at most one node.

use std::cmp::Ordering;

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::diagnostic::Diagnostic;
use crate::domain::heading::TOP_LEVEL;
use crate::domain::menu::MenuEntry;
use crate::domain::tree::{DocumentTree, TexiNode};

/// The tree and its menu entries after linking; read-only apart from
/// marking entries consumed while menus are regenerated.
#[derive(Debug)]
pub struct LinkedDocument {
    pub tree: DocumentTree,
    /// Entries in parse order
    pub entries: Vec<MenuEntry>,
    /// Node indices sorted by name
    by_name: Vec<Index>,
}

/// Flatten, sort and merge-join nodes and menu entries.
#[instrument(level = "debug", skip_all)]
pub fn link(mut tree: DocumentTree, mut entries: Vec<MenuEntry>) -> (LinkedDocument, Vec<Diagnostic>) {
    let mut by_name: Vec<Index> = tree.allocation_order().to_vec();
    by_name.sort_by(|a, b| cmp_names(tree.name(*a), tree.name(*b)));

    let mut by_target: Vec<usize> = (0..entries.len()).collect();
    by_target.sort_by(|&a, &b| {
        entries[a]
            .target
            .cmp(&entries[b].target)
            .then(entries[a].line.cmp(&entries[b].line))
    });

    let diagnostics: Vec<Diagnostic> = by_target
        .iter()
        .tuple_windows()
        .filter(|&(a, b)| entries[*a].target == entries[*b].target)
        .map(|(a, b)| Diagnostic::DuplicateMenuTarget {
            target: entries[*a].target.clone(),
            first_line: entries[*a].line,
            second_line: entries[*b].line,
        })
        .collect();

    let (mut i, mut j) = (0, 0);
    let mut linked = 0;
    while i < by_name.len() && j < by_target.len() {
        let node_idx = by_name[i];
        let entry_pos = by_target[j];
        let order = cmp_names(tree.name(node_idx), Some(entries[entry_pos].target.as_str()));
        match order {
            Ordering::Equal => {
                if let Some(node) = tree.get_mut(node_idx) {
                    node.menu = Some(entry_pos);
                }
                entries[entry_pos].node = Some(node_idx);
                linked += 1;
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    debug!(
        nodes = by_name.len(),
        entries = entries.len(),
        linked,
        "linked menus to nodes"
    );

    (
        LinkedDocument {
            tree,
            entries,
            by_name,
        },
        diagnostics,
    )
}

fn cmp_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    a.unwrap_or_default()
        .as_bytes()
        .cmp(b.unwrap_or_default().as_bytes())
}

impl LinkedDocument {
    /// Binary search for a node by exact name.
    pub fn lookup(&self, name: &str) -> Option<Index> {
        self.by_name
            .binary_search_by(|idx| cmp_names(self.tree.name(*idx), Some(name)))
            .ok()
            .map(|pos| self.by_name[pos])
    }

    pub fn node(&self, idx: Index) -> Option<&TexiNode> {
        self.tree.get(idx)
    }

    /// Nodes sorted by name, root included.
    pub fn sorted_nodes(&self) -> impl Iterator<Item = &TexiNode> + '_ {
        self.by_name.iter().filter_map(|idx| self.tree.get(*idx))
    }

    /// Entries no regenerated menu used.
    pub fn unconsumed_entries(&self) -> Vec<Diagnostic> {
        self.entries
            .iter()
            .filter(|e| !e.consumed)
            .map(|e| Diagnostic::UnusedMenuEntry {
                label: e.label.clone(),
                target: e.target.clone(),
                line: e.line,
            })
            .collect()
    }

    /// Nodes below Top that no menu entry points at.
    pub fn nodes_without_entries(&self) -> Vec<Diagnostic> {
        self.sorted_nodes()
            .filter(|n| n.menu.is_none() && n.level > TOP_LEVEL)
            .map(|n| Diagnostic::MissingMenuEntry {
                node: n.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::TreeBuilder;

    fn sample_tree() -> DocumentTree {
        let mut builder = TreeBuilder::new();
        builder.observe_node("Top", 1);
        builder.observe_node("target-a", 2);
        builder.observe_heading(2, "A", 3);
        builder.observe_node("target-b", 4);
        builder.observe_heading(2, "B", 5);
        builder.finish().0
    }

    #[test]
    fn test_lookup_finds_every_node_and_rejects_others() {
        let (doc, _) = link(sample_tree(), Vec::new());
        for name in ["(dir)", "Top", "target-a", "target-b"] {
            let idx = doc.lookup(name).unwrap();
            assert_eq!(doc.node(idx).unwrap().name, name);
        }
        assert!(doc.lookup("missing").is_none());
        assert!(doc.lookup("").is_none());
    }

    #[test]
    fn test_entries_link_both_ways() {
        let entries = vec![
            MenuEntry::new(None, "target-b", None, 10),
            MenuEntry::new(Some("A"), "target-a", None, 10),
            MenuEntry::new(None, "nowhere", None, 10),
        ];
        let (doc, diags) = link(sample_tree(), entries);

        assert!(diags.is_empty());
        let a = doc.lookup("target-a").unwrap();
        assert_eq!(doc.node(a).unwrap().menu, Some(1));
        assert_eq!(doc.entries[1].node, Some(a));
        assert_eq!(doc.entries[2].node, None);
    }

    #[test]
    fn test_duplicate_targets_reported_once_with_both_lines() {
        let entries = vec![
            MenuEntry::new(None, "target-a", None, 30),
            MenuEntry::new(None, "target-b", None, 30),
            MenuEntry::new(Some("Again"), "target-a", None, 12),
        ];
        let (doc, diags) = link(sample_tree(), entries);

        assert_eq!(
            diags,
            vec![Diagnostic::DuplicateMenuTarget {
                target: "target-a".into(),
                first_line: 12,
                second_line: 30,
            }]
        );
        // the earlier entry wins the node
        let a = doc.lookup("target-a").unwrap();
        assert_eq!(doc.node(a).unwrap().menu, Some(2));
    }

    #[test]
    fn test_nodes_without_entries_skips_top_and_root() {
        let entries = vec![MenuEntry::new(None, "target-a", None, 10)];
        let (doc, _) = link(sample_tree(), entries);

        assert_eq!(
            doc.nodes_without_entries(),
            vec![Diagnostic::MissingMenuEntry {
                node: "target-b".into()
            }]
        );
    }
}
