//! Embedded languages inside string literals
//!
//! A literal marked as regex or JSON is decoded into virtual characters and
//! sub-classified with its own tag set. The resulting spans replace the
//! literal's string and escape spans between its delimiters.

pub mod detect;
pub mod hints;
pub mod json;
pub mod language;
pub mod regex;
pub mod virtual_chars;

use crate::classification::ClassificationResult;
use crate::config::ClassifierOptions;
use crate::grammar::ast::SyntaxTree;
use crate::log_success;
use crate::logging::codes;
use crate::reference_resolution::Bindings;

pub use detect::{DetectionSource, EmbeddedLiteral};
pub use hints::{parse_hint_comment, HintComment};
pub use language::{EmbeddedHint, EmbeddedLanguage, RegexOptions};
pub use virtual_chars::{virtual_chars, VirtualChar, VirtualCharSequence};

/// Sub-classify every embedded literal of `tree`
pub fn classify_embedded(
    tree: &SyntaxTree,
    bindings: Option<&Bindings>,
    options: &ClassifierOptions,
) -> ClassificationResult<Vec<EmbeddedLiteral>> {
    let literals = detect::detect_embedded(tree, bindings, options)?;
    if !literals.is_empty() {
        let spans: usize = literals.iter().map(|literal| literal.spans.len()).sum();
        log_success!(codes::success::EMBEDDED_CLASSIFICATION_COMPLETE,
            "Embedded language classification complete",
            "literals" => literals.len(),
            "spans" => spans
        );
    }
    Ok(literals)
}
