//! phpdocr-core: Core abstractions for PHPDoc generation
//!
//! This crate provides:
//! - `Edit`: A line-addressed text insertion or replacement
//! - `apply_edits()`: Function to apply edits bottom-up
//! - `LineIndex`: Byte offset to zero-based line lookup
//! - `Visitor`: Trait for walking the statements of one PHP scope

mod edit;
mod lines;
pub mod visitor;

pub use edit::{apply_edits, Edit, EditError, EditTarget};
pub use lines::{detect_line_ending, LineIndex};
pub use visitor::{visit_scope, Visitor};
