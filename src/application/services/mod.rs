//! Application services
//!
//! Services depend on I/O boundary traits (LineSource, Reporter)
//! but are themselves concrete structs, not traits.

mod restructure;

pub use restructure::{Document, RestructureService, RunSummary};
