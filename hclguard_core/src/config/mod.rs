//! Configuration
//!
//! `constants` holds compile-time limits, `runtime` the environment-driven
//! preferences, and `rules` the user-supplied check configuration.

pub mod constants;
pub mod error;
pub mod rules;
pub mod runtime;
pub mod taggable;

pub use constants::compile_time;
pub use error::ConfigError;
pub use rules::{
    CheckKind, CheckToggles, LintConfig, ModuleRules, OrderingRules, ProviderRules, Ruleset,
    TagPolicy, TagRule, TagRuleConfig, TagRules,
};
pub use runtime::{BatchPreferences, FormatterPreferences, LoggingPreferences, ScanPreferences};
pub use taggable::default_taggable_resources;
