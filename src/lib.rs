//! prepinfo: rebuild texinfo `@node` pointers and menus from heading structure.
//!
//! The document is read twice. The first pass infers the node tree from the
//! order and level of `@chapter`, `@section`, ... lines and collects every menu
//! entry; between passes menus and nodes are cross-linked; the second pass
//! copies the document, rewriting each `@node` line and each menu block.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
