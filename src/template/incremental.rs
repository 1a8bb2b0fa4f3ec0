//! Incremental re-lexing of edited documents.
//!
//!     A [LexedDocument] keeps its tokens together with one resumable state per line start.
//!     Line starts are safe restart points: every token and every delimiter probe is decided
//!     by the newline before them, so the state there depends only on the text above.
//!
//! Relexing
//!
//!     After an edit, lexing restarts from the last line start at or before the edit. At
//!     every line start past the edit the fresh state is compared with the stored one for
//!     the same (shifted) line. The first `Equal` proves that the rest of the old tokens is
//!     still valid: they are spliced back and lexing stops there.

use crate::template::error::LexerError;
use crate::template::stream::{StateDiff, TokenStream};
use crate::template::switching::TemplateState;
use crate::template::token::{Token, TokenId};
use crate::template::Dialect;
use std::ops::Range;
use tracing::debug;

/// A replacement of `removed` bytes at `offset` by `inserted`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub removed: usize,
    pub inserted: Vec<u8>,
}

impl Edit {
    pub fn insert(offset: usize, text: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            removed: 0,
            inserted: text.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, Vec::new())
    }

    pub fn replace(range: Range<usize>, text: impl Into<Vec<u8>>) -> Self {
        Self {
            offset: range.start,
            removed: range.len(),
            inserted: text.into(),
        }
    }
}

/// The lexer state stored at a line start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub offset: usize,
    /// Index of the first token of the line.
    pub token_index: usize,
    pub state: TemplateState,
}

/// One state comparison made while relexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    /// Line start in the edited text.
    pub offset: usize,
    pub diff: StateDiff,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelexReport {
    /// Where lexing restarted.
    pub restart_offset: usize,
    pub comparisons: Vec<Comparison>,
    /// Line start where the old tokens were spliced back, if lexing converged.
    pub converged_at: Option<usize>,
    /// Tokens produced by the relex itself.
    pub relexed_tokens: usize,
}

/// A document together with its tokens and line states.
#[derive(Clone, Debug)]
pub struct LexedDocument {
    dialect: Dialect,
    text: Vec<u8>,
    tokens: Vec<Token>,
    checkpoints: Vec<Checkpoint>,
}

impl LexedDocument {
    pub fn lex(dialect: Dialect, text: impl Into<Vec<u8>>) -> Self {
        let text = text.into();
        let start = Checkpoint {
            offset: 0,
            token_index: 0,
            state: TemplateState::initial(),
        };
        let (tokens, mut checkpoints) = lex_lines(&dialect, &text, &start);
        checkpoints.insert(0, start);
        Self {
            dialect,
            text,
            tokens,
            checkpoints,
        }
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Tokens with the byte ranges they cover.
    pub fn spans(&self) -> impl Iterator<Item = (Token, Range<usize>)> + '_ {
        self.tokens.iter().scan(0, |cursor, token| {
            let start = *cursor;
            *cursor += token.len;
            Some((*token, start..*cursor))
        })
    }

    /// Applies `edit` and brings tokens and line states up to date.
    pub fn relex(&mut self, edit: Edit) -> Result<RelexReport, LexerError> {
        let removed_end = edit
            .offset
            .checked_add(edit.removed)
            .filter(|&end| end <= self.text.len())
            .ok_or(LexerError::InvalidEdit {
                offset: edit.offset,
                removed: edit.removed,
                len: self.text.len(),
            })?;
        let inserted_end = edit.offset + edit.inserted.len();
        self.text
            .splice(edit.offset..removed_end, edit.inserted.iter().copied());

        // Checkpoint 0 sits at offset 0, so there is always one.
        let restart = self
            .checkpoints
            .partition_point(|checkpoint| checkpoint.offset <= edit.offset)
            - 1;
        let from = self.checkpoints[restart].clone();
        debug!(restart_offset = from.offset, edit_offset = edit.offset, "relexing");

        let mut report = RelexReport {
            restart_offset: from.offset,
            comparisons: Vec::new(),
            converged_at: None,
            relexed_tokens: 0,
        };
        let mut tokens = Vec::new();
        let mut checkpoints = Vec::new();
        let mut converged = None;

        let mut lexer = self.dialect.lexer();
        lexer.load(
            Some(&from.state),
            &self.text,
            from.offset,
            self.text.len() - from.offset,
            true,
        );
        let mut cursor = from.offset;
        loop {
            let token = lexer.next_token();
            if token.is_end_of_chunk() {
                break;
            }
            tokens.push(token);
            cursor += token.len;
            if token.id != TokenId::END_OF_LINE {
                continue;
            }

            checkpoints.push(Checkpoint {
                offset: cursor,
                token_index: from.token_index + tokens.len(),
                state: lexer.store_state(),
            });
            if cursor < inserted_end {
                continue;
            }
            let old_offset = cursor - inserted_end + removed_end;
            let Ok(old) = self
                .checkpoints
                .binary_search_by_key(&old_offset, |checkpoint| checkpoint.offset)
            else {
                continue;
            };
            let diff = lexer.compare_state(&self.checkpoints[old].state);
            report.comparisons.push(Comparison {
                offset: cursor,
                diff,
            });
            if diff == StateDiff::Equal {
                converged = Some(old);
                break;
            }
        }
        report.relexed_tokens = tokens.len();

        let mut new_tokens = self.tokens[..from.token_index].to_vec();
        new_tokens.extend(tokens);
        let mut new_checkpoints = self.checkpoints[..=restart].to_vec();
        new_checkpoints.extend(checkpoints);

        if let Some(old) = converged {
            let resumed = &self.checkpoints[old];
            let token_index = new_tokens.len();
            new_tokens.extend_from_slice(&self.tokens[resumed.token_index..]);
            new_checkpoints.extend(self.checkpoints[old + 1..].iter().map(|checkpoint| {
                Checkpoint {
                    offset: checkpoint.offset - removed_end + inserted_end,
                    token_index: checkpoint.token_index - resumed.token_index + token_index,
                    state: checkpoint.state.clone(),
                }
            }));
            report.converged_at = Some(cursor);
            debug!(
                offset = cursor,
                comparisons = report.comparisons.len(),
                "relex converged"
            );
        } else {
            debug!(comparisons = report.comparisons.len(), "relexed to end of document");
        }

        self.tokens = new_tokens;
        self.checkpoints = new_checkpoints;
        Ok(report)
    }
}

/// Lexes from `from` to the end of `text`, recording a checkpoint after every newline.
fn lex_lines(dialect: &Dialect, text: &[u8], from: &Checkpoint) -> (Vec<Token>, Vec<Checkpoint>) {
    let mut lexer = dialect.lexer();
    lexer.load(Some(&from.state), text, from.offset, text.len() - from.offset, true);
    let mut tokens = Vec::new();
    let mut checkpoints = Vec::new();
    let mut cursor = from.offset;
    loop {
        let token = lexer.next_token();
        if token.is_end_of_chunk() {
            return (tokens, checkpoints);
        }
        tokens.push(token);
        cursor += token.len;
        if token.id == TokenId::END_OF_LINE {
            checkpoints.push(Checkpoint {
                offset: cursor,
                token_index: from.token_index + tokens.len(),
                state: lexer.store_state(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<p>a</p>\n<% int x = 1;\nx++; %>\n<b>b</b>\n";

    fn fresh(text: &[u8]) -> LexedDocument {
        LexedDocument::lex(Dialect::default(), text.to_vec())
    }

    #[test]
    fn test_checkpoints_follow_line_starts() {
        let document = fresh(PAGE.as_bytes());
        let offsets: Vec<usize> = document.checkpoints().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 9, 23, 31, 40]);
        let covered: usize = document.tokens().iter().map(|t| t.len).sum();
        assert_eq!(covered, PAGE.len());
    }

    #[test]
    fn test_edit_in_last_line_restarts_there() {
        let mut document = fresh(PAGE.as_bytes());
        let report = document.relex(Edit::insert(32, "i")).expect("edit fits");
        assert_eq!(report.restart_offset, 31);
        assert_eq!(document.tokens(), fresh(document.text()).tokens());
        assert_eq!(document.checkpoints(), fresh(document.text()).checkpoints());
    }

    #[test]
    fn test_edit_inside_script_converges_on_next_line() {
        let mut document = fresh(PAGE.as_bytes());
        let report = document.relex(Edit::replace(20..21, "2")).expect("edit fits");
        assert_eq!(report.restart_offset, 9);
        assert_eq!(
            report.comparisons,
            vec![Comparison {
                offset: 23,
                diff: StateDiff::Equal
            }]
        );
        assert_eq!(report.converged_at, Some(23));
        assert_eq!(document.tokens(), fresh(document.text()).tokens());
        assert_eq!(document.checkpoints(), fresh(document.text()).checkpoints());
    }

    #[test]
    fn test_closing_a_script_changes_downstream_states() {
        let mut document = fresh(PAGE.as_bytes());
        let report = document.relex(Edit::insert(22, " %>")).expect("edit fits");
        assert_eq!(report.restart_offset, 9);
        assert_eq!(report.comparisons[0].diff, StateDiff::Different);
        assert_eq!(document.tokens(), fresh(document.text()).tokens());
        assert_eq!(document.checkpoints(), fresh(document.text()).checkpoints());
    }

    #[test]
    fn test_edit_out_of_bounds_is_rejected() {
        let mut document = fresh(b"abc");
        let result = document.relex(Edit::delete(2..5));
        assert!(matches!(
            result,
            Err(LexerError::InvalidEdit { offset: 2, removed: 3, len: 3 })
        ));
        assert_eq!(document.text(), b"abc");
    }
}
