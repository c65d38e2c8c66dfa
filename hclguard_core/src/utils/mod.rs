//! Shared primitives used by the scanner and validators.

pub mod span;

pub use span::Span;
