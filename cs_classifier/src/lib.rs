//! Static semantic classification of C# source text
//!
//! Text is lexed, parsed into a tolerant syntax tree and bound against the
//! declarations of the same text. Each span of interest then receives a
//! category such as `keyword`, `class name` or `regex - quantifier`.
//!
//! ```no_run
//! use cs_classifier::config::ClassifierOptions;
//!
//! let spans = cs_classifier::pipeline::classify_spans("class C { }", None, &ClassifierOptions::regular())?;
//! for span in spans {
//!     println!("{} {}", span.span, span.category);
//! }
//! # Ok::<(), cs_classifier::PipelineError>(())
//! ```

pub mod batch;
pub mod classification;
pub mod config;
pub mod embedded;
pub mod file_processor;
pub mod grammar;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod reference_resolution;
pub mod symbols;
pub mod syntax;
pub mod tokens;
pub mod utils;
pub mod validation;

// Re-export key types for library consumers
pub use batch::{BatchConfig, BatchError, BatchResults};
pub use classification::{CancellationToken, Category, ClassifiedSpan, IncrementalSession, TextChange};
pub use config::{ClassifierOptions, ParseMode};
pub use pipeline::output::PipelineOutput;
pub use pipeline::{classify, classify_spans, PipelineError, PipelineResult};
