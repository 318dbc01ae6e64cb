//! Configuration for the classifier
//!
//! Three layers, from most to least static:
//! - `constants`: compile-time resource limits
//! - `runtime`: user preferences from `CSC_*` variables and `csclassify.toml`
//! - `options`: the explicit value handed to each classification request

pub mod constants;
pub mod options;
pub mod runtime;

pub use constants::compile_time;
pub use options::{ClassifierOptions, EmbeddedOptions};
pub use runtime::{ConfigError, ParseMode, RuntimeConfig};
