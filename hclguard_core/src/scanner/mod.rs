//! Block scanner
//!
//! Recovers the block structure of HCL text in a single left-to-right pass.
//! Quoting, comments, heredocs and template interpolations are handled by the
//! shared [`Cursor`], so a block header that only appears inside a string or
//! comment never opens a block. Malformed input degrades to warnings; the
//! scanner never fails.

pub mod analyzer;
pub mod block;
pub mod cursor;

pub use analyzer::{scan, BlockScanner};
pub use block::{Ancestors, Block, BlockId, Degradation, DegradedKind, ScanResult};
pub use cursor::{has_template_sequence, unquote, Cursor, Lexeme, LexemeKind};
