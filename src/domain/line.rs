//! Line classification shared by both passes.

use regex::Regex;

use crate::domain::heading::parse_heading_line;

/// Default prefix marking a heading that deliberately has no node.
pub const DEFAULT_PLACEHOLDER: &str = "@c fakenode";

/// What a single input line means to the restructurer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `@node name, next, prev, up`
    Node { name: String },
    /// Placeholder standing in for a node the author does not want.
    Placeholder,
    /// `@menu`
    MenuOpen,
    /// `@end menu`
    MenuClose,
    /// `@chapter`, `@section`, ...
    Heading { level: u8, title: String },
    /// Anything else; copied through unchanged.
    Other,
}

/// Classifies input lines.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    placeholder: String,
    menu_close: Regex,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

impl LineClassifier {
    pub fn new(placeholder: &str) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            // static pattern, always valid
            menu_close: Regex::new(r"^@end\s*menu").expect("valid menu close pattern"),
        }
    }

    pub fn classify(&self, line: &str) -> LineKind {
        if !line.starts_with('@') {
            return LineKind::Other;
        }
        if line.starts_with("@menu") {
            return LineKind::MenuOpen;
        }
        if self.is_menu_close(line) {
            return LineKind::MenuClose;
        }
        if let Some(name) = node_name(line) {
            return LineKind::Node { name };
        }
        if line.starts_with(&self.placeholder) {
            return LineKind::Placeholder;
        }
        match parse_heading_line(line) {
            Some((level, title)) => LineKind::Heading { level, title },
            None => LineKind::Other,
        }
    }

    /// `@end menu`, tolerating whitespace between `@end` and `menu`.
    pub fn is_menu_close(&self, line: &str) -> bool {
        self.menu_close.is_match(line)
    }
}

/// Extract the node name from an `@node` line.
///
/// Names can contain spaces; they run up to the first comma.
pub fn node_name(line: &str) -> Option<String> {
    let rest = line.strip_prefix("@node")?;
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }
    let name = rest.split([',', '\n']).next().unwrap_or("").trim();
    Some(name.to_string())
}

/// The terminator a line was read with: `\r\n`, `\n`, or nothing at end of input.
pub fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("@node Top, Intro, (dir), (dir)\n", LineKind::Node { name: "Top".into() })]
    #[case("@node   Getting Started  ,x,y,z\n", LineKind::Node { name: "Getting Started".into() })]
    #[case("@node Lonely\n", LineKind::Node { name: "Lonely".into() })]
    #[case("@c fakenode - for prepinfo\n", LineKind::Placeholder)]
    #[case("@c just a comment\n", LineKind::Other)]
    #[case("@menu\n", LineKind::MenuOpen)]
    #[case("@end menu\n", LineKind::MenuClose)]
    #[case("@end   menu\n", LineKind::MenuClose)]
    #[case("@end example\n", LineKind::Other)]
    #[case("@chapter Overview\n", LineKind::Heading { level: 2, title: "Overview".into() })]
    #[case("@nodes are fun\n", LineKind::Other)]
    #[case("plain text @node inside\n", LineKind::Other)]
    fn test_classify(#[case] line: &str, #[case] expected: LineKind) {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify(line), expected);
    }

    #[rstest]
    #[case("@node a\r\n", "\r\n")]
    #[case("@node a\n", "\n")]
    #[case("@node a", "")]
    #[case("\r", "")]
    fn test_line_ending(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(line_ending(line), expected);
    }

    #[test]
    fn test_crlf_node_name_drops_carriage_return() {
        assert_eq!(node_name("@node Intro\r\n").as_deref(), Some("Intro"));
    }

    #[test]
    fn test_custom_placeholder() {
        let classifier = LineClassifier::new("@c nonode");
        assert_eq!(classifier.classify("@c nonode\n"), LineKind::Placeholder);
        assert_eq!(classifier.classify("@c fakenode\n"), LineKind::Other);
    }
}
