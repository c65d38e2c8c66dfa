//! Convention checks over scanned HCL
//!
//! Per-file checks (`providers`, `ordering`, `tags`) take one file's text and
//! scan result and return findings. `conflicts` works across a whole batch of
//! module references. None of them fail on malformed input.

pub mod conflicts;
pub mod ordering;
pub mod providers;
pub mod tags;

pub use conflicts::{conflict_findings, detect, ConflictGroup, ConflictReport};
pub use ordering::{check_order, check_ordering, OrderViolation};
pub use providers::{check_providers, provider_context, ModuleHint, ProviderContext};
pub use tags::{check_resource_tags, check_tags};
