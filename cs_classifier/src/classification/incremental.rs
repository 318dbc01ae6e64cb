//! Incremental classification of an edited text
//!
//! An [`IncrementalSession`] keeps the lexemes and line checkpoints of the
//! current text. A change re-lexes from the last checkpoint before the
//! edit and stops as soon as a new checkpoint lines up with an old one
//! past the edit, with the same preprocessor state. Lexemes after that
//! point are reused, shifted by the length delta. Parsing, binding and
//! classification then run over the spliced stream.
//!
//! The result is always identical to classifying the new text from
//! scratch; only the lexing work is saved.

use super::category::ClassifiedSpan;
use super::{classify_tree, Classification};
use crate::config::ClassifierOptions;
use crate::lexical::{tokenize, LexCheckpoint, LexicalAnalyzer, LexicalDiagnostic};
use crate::logging::codes;
use crate::pipeline::PipelineError;
use crate::syntax::parse;
use crate::tokens::{SpannedToken, TokenStream};
use crate::utils::Span;
use crate::{log_debug, log_success};
use std::collections::HashMap;

/// Replace `span` of the current text with `new_text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub span: Span,
    pub new_text: String,
}

impl TextChange {
    pub fn new(span: Span, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(Span::empty(offset), text)
    }

    pub fn delete(span: Span) -> Self {
        Self::new(span, String::new())
    }

    fn delta(&self) -> isize {
        self.new_text.len() as isize - self.span.len() as isize
    }
}

/// What one change did to the classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationUpdate {
    /// Smallest range of the new text whose spans differ from the old
    /// output; `None` when the output is unchanged apart from shifting
    pub changed: Option<Span>,
    /// Lexemes produced by re-lexing
    pub relexed: usize,
    /// Old lexemes reused after re-synchronising
    pub reused: usize,
}

/// Live text plus everything needed to reclassify it after edits
#[derive(Debug, Clone)]
pub struct IncrementalSession {
    options: ClassifierOptions,
    text: String,
    tokens: Vec<SpannedToken>,
    diagnostics: Vec<LexicalDiagnostic>,
    checkpoints: Vec<LexCheckpoint>,
    classification: Classification,
}

impl IncrementalSession {
    /// Classify `text` from scratch and keep the state
    pub fn new(text: impl Into<String>, options: ClassifierOptions) -> Result<Self, PipelineError> {
        let text = text.into();
        let tokenized = tokenize(&text, &options)?;
        let checkpoints = tokenized.checkpoints;
        let diagnostics = tokenized.diagnostics;
        let tree = parse(tokenized.stream, &options);
        let classification = classify_tree(&tree, None, &options)?;
        let (_, tokens) = tree.into_tokens().into_parts();
        Ok(Self {
            options,
            text,
            tokens,
            diagnostics,
            checkpoints,
            classification,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[ClassifiedSpan] {
        &self.classification.spans
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn diagnostics(&self) -> &[LexicalDiagnostic] {
        &self.diagnostics
    }

    /// Spans of the current output that intersect `range`
    pub fn spans_in(&self, range: Span) -> Vec<ClassifiedSpan> {
        self.classification
            .spans
            .iter()
            .filter(|classified| range.intersects(&classified.span))
            .copied()
            .collect()
    }

    /// Apply one edit and reclassify
    pub fn apply_change(&mut self, change: TextChange) -> Result<ClassificationUpdate, PipelineError> {
        let span = change.span;
        if span.start > span.end
            || span.end > self.text.len()
            || !self.text.is_char_boundary(span.start)
            || !self.text.is_char_boundary(span.end)
        {
            return Err(PipelineError::InvalidChange {
                span,
                len: self.text.len(),
            });
        }

        let delta = change.delta();
        let mut text = String::with_capacity(self.text.len() + change.new_text.len());
        text.push_str(&self.text[..span.start]);
        text.push_str(&change.new_text);
        text.push_str(&self.text[span.end..]);

        let relexed = self.relex(&text, &change)?;
        let stream = TokenStream::new(text.clone(), relexed.tokens);
        let tree = parse(stream, &self.options);
        let classification = classify_tree(&tree, None, &self.options)?;
        let changed = changed_range(&self.classification.spans, &classification.spans, &change);

        let (_, tokens) = tree.into_tokens().into_parts();
        self.text = text;
        self.tokens = tokens;
        self.diagnostics = relexed.diagnostics;
        self.checkpoints = relexed.checkpoints;
        self.classification = classification;

        log_success!(codes::success::INCREMENTAL_UPDATE_COMPLETE,
            "Incremental update complete",
            "relexed" => relexed.relexed,
            "reused" => relexed.reused,
            "delta" => delta
        );
        Ok(ClassificationUpdate {
            changed,
            relexed: relexed.relexed,
            reused: relexed.reused,
        })
    }

    /// Lex the edited region and splice the result into the old lexemes
    fn relex(&self, text: &str, change: &TextChange) -> Result<Relexed, PipelineError> {
        let delta = change.delta();
        let edit_start = change.span.start;
        let edit_end_new = edit_start + change.new_text.len();

        // A checkpoint at the edit itself could merge with the previous line break
        let resume = self
            .checkpoints
            .iter()
            .rev()
            .find(|checkpoint| checkpoint.offset < edit_start || checkpoint.offset == 0)
            .cloned()
            .unwrap_or(LexCheckpoint {
                offset: 0,
                lexeme_index: 0,
                state: crate::lexical::PreprocessorState::with_symbols(
                    self.options.preprocessor_symbols.iter().cloned(),
                ),
            });

        let old_after: HashMap<usize, &LexCheckpoint> = self
            .checkpoints
            .iter()
            .filter(|checkpoint| checkpoint.offset >= change.span.end)
            .map(|checkpoint| (checkpoint.offset, checkpoint))
            .collect();

        let mut analyzer = LexicalAnalyzer::resume(text, &self.options, &resume)?;
        let mut matched: Option<LexCheckpoint> = None;
        let stopped = analyzer.run(&mut |checkpoint| {
            if checkpoint.offset <= resume.offset || checkpoint.offset < edit_end_new {
                return false;
            }
            let old_offset = (checkpoint.offset as isize - delta) as usize;
            match old_after.get(&old_offset) {
                Some(old) if old.state == checkpoint.state => {
                    matched = Some((*old).clone());
                    true
                }
                _ => false,
            }
        })?;
        let output = analyzer.finish();

        let relexed = output.tokens.len();
        let mut tokens: Vec<SpannedToken> = self.tokens[..resume.lexeme_index.min(self.tokens.len())].to_vec();
        tokens.extend(output.tokens);
        let mut diagnostics: Vec<LexicalDiagnostic> = self
            .diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.span.end <= resume.offset)
            .cloned()
            .collect();
        diagnostics.extend(output.diagnostics);
        let mut checkpoints: Vec<LexCheckpoint> = self
            .checkpoints
            .iter()
            .filter(|checkpoint| checkpoint.offset < resume.offset)
            .cloned()
            .collect();
        checkpoints.extend(output.checkpoints);

        let mut reused = 0;
        if let (true, Some(old)) = (stopped, matched) {
            let new_index = tokens.len();
            let index_delta = new_index as isize - old.lexeme_index as isize;
            let tail = self.tokens.get(old.lexeme_index..).unwrap_or_default();
            reused = tail.len();
            tokens.extend(
                tail.iter()
                    .map(|token| SpannedToken::new(token.value, token.span.shifted(delta))),
            );
            diagnostics.extend(
                self.diagnostics
                    .iter()
                    .filter(|diagnostic| diagnostic.span.start >= old.offset)
                    .map(|diagnostic| diagnostic.clone().shifted(delta)),
            );
            checkpoints.extend(
                self.checkpoints
                    .iter()
                    .filter(|checkpoint| checkpoint.offset > old.offset)
                    .map(|checkpoint| LexCheckpoint {
                        offset: (checkpoint.offset as isize + delta) as usize,
                        lexeme_index: (checkpoint.lexeme_index as isize + index_delta) as usize,
                        state: checkpoint.state.clone(),
                    }),
            );
        }

        log_debug!("Re-lexed edited region",
            "resume_offset" => resume.offset,
            "relexed" => relexed,
            "reused" => reused
        );
        Ok(Relexed {
            tokens,
            diagnostics,
            checkpoints,
            relexed,
            reused,
        })
    }
}

struct Relexed {
    tokens: Vec<SpannedToken>,
    diagnostics: Vec<LexicalDiagnostic>,
    checkpoints: Vec<LexCheckpoint>,
    relexed: usize,
    reused: usize,
}

/// Range of the new text covering every span that differs between the
/// outputs, old spans mapped through the change
fn changed_range(old: &[ClassifiedSpan], new: &[ClassifiedSpan], change: &TextChange) -> Option<Span> {
    let delta = change.delta();
    let map_old = |classified: &ClassifiedSpan| {
        if classified.span.start >= change.span.end {
            ClassifiedSpan::new(classified.span.shifted(delta), classified.category)
        } else {
            *classified
        }
    };

    let prefix = old
        .iter()
        .zip(new)
        .take_while(|(before, after)| before == after && before.span.end <= change.span.start)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(before, after)| before.span.start >= change.span.end && map_old(before) == **after)
        .count();

    let removed = &old[prefix..old.len() - suffix];
    let added = &new[prefix..new.len() - suffix];
    removed
        .iter()
        .map(map_old)
        .chain(added.iter().copied())
        .map(|classified| classified.span)
        .reduce(Span::merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::classify_tree;
    use crate::lexical::tokenize;
    use assert_matches::assert_matches;

    fn from_scratch(text: &str, options: &ClassifierOptions) -> Vec<ClassifiedSpan> {
        let tokenized = tokenize(text, options).unwrap();
        let tree = parse(tokenized.stream, options);
        classify_tree(&tree, None, options).unwrap().spans
    }

    fn assert_matches_scratch(session: &IncrementalSession) {
        assert_eq!(session.spans(), from_scratch(session.text(), &ClassifierOptions::regular()).as_slice());
    }

    const SOURCE: &str = "class C\n{\n    int x;\n    void M()\n    {\n        x = 1;\n    }\n}\n";

    #[test]
    fn test_insert_matches_full_classification() {
        let mut session = IncrementalSession::new(SOURCE, ClassifierOptions::regular()).unwrap();
        let offset = SOURCE.find("x = 1").unwrap();
        let update = session.apply_change(TextChange::insert(offset, "int y = 2; ")).unwrap();
        assert_matches_scratch(&session);
        assert!(update.changed.is_some());
        assert!(update.reused > 0);
    }

    #[test]
    fn test_delete_matches_full_classification() {
        let mut session = IncrementalSession::new(SOURCE, ClassifierOptions::regular()).unwrap();
        let start = SOURCE.find("int x;").unwrap();
        session.apply_change(TextChange::delete(Span::with_len(start, 6))).unwrap();
        assert_matches_scratch(&session);
    }

    #[test]
    fn test_opening_comment_relexes_to_end() {
        let mut session = IncrementalSession::new(SOURCE, ClassifierOptions::regular()).unwrap();
        let offset = SOURCE.find("void").unwrap();
        session.apply_change(TextChange::insert(offset, "/* ")).unwrap();
        assert_matches_scratch(&session);
        session.apply_change(TextChange::insert(session.text().len(), "*/")).unwrap();
        assert_matches_scratch(&session);
    }

    #[test]
    fn test_directive_changes_later_lines() {
        let source = "#if A\nclass C { }\n#endif\nclass D { }\n";
        let mut session = IncrementalSession::new(source, ClassifierOptions::regular()).unwrap();
        session.apply_change(TextChange::insert(0, "#define A\n")).unwrap();
        assert_matches_scratch(&session);
        assert!(session.spans().iter().any(|classified| classified.text(session.text()) == "C"));
    }

    #[test]
    fn test_semantic_change_far_from_edit() {
        let source = "class C\n{\n    void M()\n    {\n        T.F();\n    }\n}\n";
        let mut session = IncrementalSession::new(source, ClassifierOptions::regular()).unwrap();
        let update = session
            .apply_change(TextChange::insert(source.len(), "class T { public static void F() { } }\n"))
            .unwrap();
        assert_matches_scratch(&session);
        let changed = update.changed.unwrap();
        assert!(changed.start <= source.find("T.F").unwrap());
    }

    #[test]
    fn test_unchanged_output_has_no_changed_range() {
        let mut session = IncrementalSession::new(SOURCE, ClassifierOptions::regular()).unwrap();
        let offset = SOURCE.find("    int").unwrap();
        let update = session.apply_change(TextChange::insert(offset, "  ")).unwrap();
        assert_matches_scratch(&session);
        assert_eq!(update.changed, None);
    }

    #[test]
    fn test_sequence_of_edits() {
        let mut session = IncrementalSession::new(SOURCE, ClassifierOptions::regular()).unwrap();
        for (needle, insert) in [("x = 1", "\""), ("x = 1", "\""), ("class", "static ")] {
            let offset = session.text().find(needle).unwrap();
            session.apply_change(TextChange::insert(offset, insert)).unwrap();
            assert_matches_scratch(&session);
        }
    }

    #[test]
    fn test_invalid_change_rejected() {
        let mut session = IncrementalSession::new("class C { }", ClassifierOptions::regular()).unwrap();
        assert_matches!(
            session.apply_change(TextChange::insert(100, "x")),
            Err(PipelineError::InvalidChange { len: 11, .. })
        );
        assert_eq!(session.text(), "class C { }");
    }
}
