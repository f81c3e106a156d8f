//! Heading classifier: texinfo sectioning commands and their nesting level.
//!
//! The Top node is special-cased to be level 1, so a chapter is 2, a section 3
//! and so on down to 5. The synthetic `(dir)` root sits above everything at
//! level 0, meaning "no level".

/// Level of the synthetic `(dir)` root.
pub const ROOT_LEVEL: u8 = 0;

/// Level of the document's Top node.
pub const TOP_LEVEL: u8 = 1;

/// A sectioning command and the level it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingKind {
    pub name: &'static str,
    pub level: u8,
}

const fn kind(name: &'static str, level: u8) -> HeadingKind {
    HeadingKind { name, level }
}

/// Must stay sorted by name: lookups binary-search it.
pub static HEADINGS: [HeadingKind; 16] = [
    kind("appendix", 2),
    kind("appendixsec", 3),
    kind("appendixsubsec", 4),
    kind("appendixsubsubsec", 5),
    kind("chapter", 2),
    kind("heading", 3),
    kind("majorheading", 2),
    kind("section", 3),
    kind("subheading", 4),
    kind("subsection", 4),
    kind("subsubheading", 5),
    kind("subsubsection", 5),
    kind("unnumbered", 2),
    kind("unnumberedsec", 3),
    kind("unnumberedsubsec", 4),
    kind("unnumberedsubsubsec", 5),
];

/// Level of a sectioning command (without the leading `@`), if it is one.
pub fn classify(command: &str) -> Option<u8> {
    HEADINGS
        .binary_search_by(|h| h.name.cmp(command))
        .ok()
        .map(|i| HEADINGS[i].level)
}

/// Recognize `@<command> <title>` where the command is a heading.
///
/// Returns the level and the title text without the line terminator.
pub fn parse_heading_line(line: &str) -> Option<(u8, String)> {
    let rest = line.strip_prefix('@')?;
    let end = rest
        .find(|c: char| c.is_whitespace())
        .unwrap_or(rest.len());
    let level = classify(&rest[..end])?;
    Some((level, rest[end..].trim().to_string()))
}
