//! Tests for menu parsing, linking and regeneration working together

use rstest::rstest;

use prepinfo::domain::{link, parse_menu, Diagnostic, DocumentTree, MenuEntry, TreeBuilder};

/// Top -> target-a, target-b
fn two_chapters() -> DocumentTree {
    let mut builder = TreeBuilder::new();
    builder.observe_node("Top", 1);
    builder.observe_node("target-a", 2);
    builder.observe_heading(2, "Chapter A", 3);
    builder.observe_node("target-b", 4);
    builder.observe_heading(2, "Chapter B", 5);
    builder.finish().0
}

#[test]
fn given_two_entry_menu_when_parsing_then_label_target_description_split() {
    // Act
    let menu = parse_menu("* Foo: target-a.\tDesc one.\n* target-b::\n", 12).unwrap();

    // Assert
    assert_eq!(menu.entries.len(), 2);
    let first = &menu.entries[0];
    assert_eq!(first.label.as_deref(), Some("Foo"));
    assert_eq!(first.target, "target-a");
    assert_eq!(first.description.as_deref(), Some("Desc one."));
    let second = &menu.entries[1];
    assert_eq!(second.label, None);
    assert_eq!(second.target, "target-b");
    assert_eq!(second.description, None);
}

#[test]
fn given_parsed_menu_when_regenerating_then_entries_are_equivalent() {
    // Arrange
    let original = "* Foo: target-a.\tDesc one.\n* target-b::\n";
    let menu = parse_menu(original, 8).unwrap();
    let (mut doc, diagnostics) = link(two_chapters(), menu.entries.clone());
    assert!(diagnostics.is_empty());
    let top = doc.lookup("Top").unwrap();

    // Act
    let block = doc.menu_block(top, 6, "\n").unwrap();

    // Assert: parsing the regenerated body gives back the same entries
    let body = block
        .strip_prefix("@menu\n")
        .and_then(|b| b.strip_suffix("@end menu\n"))
        .unwrap();
    let reparsed = parse_menu(body, 8).unwrap();
    assert_eq!(reparsed.entries, menu.entries);
    assert!(doc.unconsumed_entries().is_empty());
}

#[test]
fn given_two_entries_for_same_target_when_linking_then_one_duplicate_diagnostic() {
    let entries = vec![
        MenuEntry::new(Some("One"), "target-a", None, 10),
        MenuEntry::new(Some("Two"), "target-a", None, 25),
    ];

    let (_, diagnostics) = link(two_chapters(), entries);

    assert_eq!(
        diagnostics,
        vec![Diagnostic::DuplicateMenuTarget {
            target: "target-a".into(),
            first_line: 10,
            second_line: 25,
        }]
    );
}

#[rstest]
#[case("(dir)", true)]
#[case("Top", true)]
#[case("target-a", true)]
#[case("target-b", true)]
#[case("target-c", false)]
#[case("top", false)]
#[case("target", false)]
fn given_linked_document_when_looking_up_then_exact_names_only(
    #[case] name: &str,
    #[case] present: bool,
) {
    let (doc, _) = link(two_chapters(), Vec::new());

    let found = doc.lookup(name).and_then(|idx| doc.node(idx));

    assert_eq!(found.is_some(), present);
    if let Some(node) = found {
        assert_eq!(node.name, name);
    }
}

#[test]
fn given_entry_for_unknown_node_when_regenerating_then_reported_unused() {
    let entries = vec![
        MenuEntry::new(None, "target-a", None, 7),
        MenuEntry::new(Some("Old"), "renamed", Some("Gone now."), 7),
    ];
    let (mut doc, _) = link(two_chapters(), entries);
    let top = doc.lookup("Top").unwrap();

    let block = doc.menu_block(top, 3, "\n").unwrap();

    assert_eq!(
        block,
        "@menu\n* target-a::\n* target-b::\tChapter B.\n@end menu\n"
    );
    assert_eq!(
        doc.unconsumed_entries(),
        vec![Diagnostic::UnusedMenuEntry {
            label: Some("Old".into()),
            target: "renamed".into(),
            line: 7
        }]
    );
}
