//! Parses POSIX / bash shell scripts into a diagnosing, annotated syntax
//! tree for static analysis.
//!
//! The parser never stops at the first oddity: suspect constructs become
//! [`diag::ParseNote`]s attached to tree nodes or source positions, and
//! parsing continues. Only inputs no grammar alternative accepts yield a
//! result without a tree.
//!
//! ```
//! use scour_parser::parse_shell;
//!
//! let result = parse_shell("setup.sh", "if true; then echo hi; fi");
//! assert!(result.tree.is_some());
//! assert!(result.notes.is_empty());
//! ```

pub mod ast;
pub mod diag;
pub mod source;

mod parser;

pub use diag::{notes_from_map, sort_notes};
pub use parser::{parse_shell, ParseResult};
