//! Domain layer: document tree, menus and the algorithms linking them
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod diagnostic;
pub mod error;
pub mod heading;
pub mod line;
pub mod linker;
pub mod menu;
pub mod regenerate;
pub mod tree;

pub use builder::TreeBuilder;
pub use diagnostic::Diagnostic;
pub use error::{DomainError, DomainResult};
pub use heading::{classify, ROOT_LEVEL, TOP_LEVEL};
pub use line::{line_ending, LineClassifier, LineKind};
pub use linker::{link, LinkedDocument};
pub use menu::{parse_menu, MenuEntry, ParsedMenu};
pub use tree::{DocumentTree, TexiNode, ROOT_NAME};
