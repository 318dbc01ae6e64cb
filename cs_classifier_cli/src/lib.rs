//! # csclassify
//!
//! Command line front end for the C# token classifier. Prints one
//! `start length tag` triple per classified span, or JSON.

pub mod args;
pub mod bridge;
pub mod report;
pub mod run;

pub use args::{Cli, OutputFormat};
pub use run::{run, RunSummary};
