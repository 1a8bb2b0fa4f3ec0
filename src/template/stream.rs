//! The capability every lexer in the crate exposes.
//!
//!     A lexer is bound to a window of a caller-owned buffer with [TokenStream::load] and then
//!     pulled one token at a time. When the window runs out in the middle of a token the lexer
//!     answers [TokenId::END_OF_CHUNK](crate::template::token::TokenId::END_OF_CHUNK) and
//!     remembers how many characters of the unfinished token it already read (the prescan).
//!
//! Resumption Contract
//!
//!     To continue, the caller stores the state, then loads it again together with the next
//!     window. The `prescan` characters right before the new window's offset must still be
//!     present in the buffer and unchanged: they are re-read when the token is completed.
//!     This is a precondition, it is not checked at runtime.

use crate::template::token::{Token, TokenId};
use std::fmt::Debug;

/// Outcome of comparing a lexer's current state with a stored one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateDiff {
    Equal,
    Different,
}

impl StateDiff {
    pub fn of<T: PartialEq>(a: &T, b: &T) -> Self {
        if a == b {
            StateDiff::Equal
        } else {
            StateDiff::Different
        }
    }
}

/// A resumable lexer over a byte buffer.
pub trait TokenStream<'a> {
    /// Snapshot sufficient to resume scanning with identical results.
    type State: Clone + PartialEq + Debug;

    /// Binds the lexer to `buffer[offset..offset + len]`. `None` means the initial state.
    /// `last` tells the lexer that the end of this window is also the end of input.
    fn load(
        &mut self,
        state: Option<&Self::State>,
        buffer: &'a [u8],
        offset: usize,
        len: usize,
        last: bool,
    );

    /// Scans and returns the next token.
    fn next_token(&mut self) -> Token;

    fn store_state(&self) -> Self::State;

    /// Replaces the current state, keeping the window and cursor.
    fn load_state(&mut self, state: &Self::State);

    fn compare_state(&self, other: &Self::State) -> StateDiff {
        StateDiff::of(&self.store_state(), other)
    }

    /// Display name of a token id produced by this lexer.
    fn token_name(&self, id: TokenId) -> Option<&str>;

    /// Buffer offset where the next token will start.
    fn offset(&self) -> usize;
}
