//! Table-driven scanning engine shared by the host, tag and script lexers.
//!
//!     Each sub-language is an [Automaton]: a pure transition function from `(state, byte)`
//!     to `(state, action)`, plus a handful of classification hooks. The [Scanner] owns all
//!     the buffer, window and prescan bookkeeping, so every sub-language gets identical
//!     suspend/resume behavior for free.
//!
//! Newlines
//!
//!     The automata never see `\n`. The scanner ends the current token before it (classified
//!     by [Automaton::at_line_end]) and then returns it as an end-of-line marker, moving to
//!     [Automaton::settle] of the current state.
//!
//! Token Boundaries
//!
//!     A state reached through `Emit`/`EmitBefore`/`settle` is a boundary state: the next
//!     token starts in it. Boundary states must consume their first byte, otherwise the
//!     scanner would produce an empty token.

use crate::template::stream::TokenStream;
use crate::template::token::{Token, TokenId, TokenKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;

/// What the scanner does with the byte it just showed to the automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action<K> {
    /// Consume the byte, the token goes on.
    Continue,
    /// Consume the byte and end the token after it.
    Emit(K),
    /// End the token before the byte. The byte starts the next token.
    EmitBefore(K),
    /// Do not consume; show the same byte again in the new state.
    Reprocess,
}

pub trait Automaton: 'static {
    type State: Copy + Eq + Debug + Serialize + DeserializeOwned + Send + Sync;
    type Kind: TokenKind;

    const INITIAL: Self::State;

    fn transition(state: Self::State, byte: u8) -> (Self::State, Action<Self::Kind>);

    /// Classification of an unfinished token.
    fn in_progress(state: Self::State) -> Self::Kind;

    /// Classification of a token cut short by a newline.
    fn at_line_end(state: Self::State) -> Self::Kind {
        Self::in_progress(state)
    }

    /// Last-resort classification of a token cut short by the end of input.
    fn at_end_of_input(state: Self::State) -> Self::Kind {
        Self::in_progress(state)
    }

    /// Boundary state to continue from when a token is cut inside `state`.
    fn settle(state: Self::State) -> Self::State;

    /// Final reclassification once the token text is known.
    fn refine(kind: Self::Kind, _text: &[u8]) -> Self::Kind {
        kind
    }
}

/// Resumable state of a [Scanner].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanState<S> {
    pub state: S,
    /// Bytes of the unfinished token read before the current window.
    pub prescan: usize,
}

impl<S> ScanState<S> {
    pub fn at_boundary(state: S) -> Self {
        Self { state, prescan: 0 }
    }
}

/// A resumable lexer driven by an [Automaton].
pub struct Scanner<'a, A: Automaton> {
    buffer: &'a [u8],
    token_start: usize,
    pos: usize,
    stop: usize,
    last: bool,
    state: A::State,
    automaton: PhantomData<A>,
}

impl<'a, A: Automaton> Scanner<'a, A> {
    pub fn new() -> Self {
        Self {
            buffer: &[],
            token_start: 0,
            pos: 0,
            stop: 0,
            last: false,
            state: A::INITIAL,
            automaton: PhantomData,
        }
    }

    /// Kind the unfinished token would get if it were cut right here.
    pub fn pending_kind(&self) -> Option<A::Kind> {
        (self.pos > self.token_start)
            .then(|| A::refine(A::in_progress(self.state), self.token_text()))
    }

    /// The scanner's state projected onto a token boundary at the cursor.
    pub fn settled_state(&self) -> ScanState<A::State> {
        let state = if self.pos > self.token_start {
            A::settle(self.state)
        } else {
            self.state
        };
        ScanState::at_boundary(state)
    }

    fn token_text(&self) -> &'a [u8] {
        &self.buffer[self.token_start..self.pos]
    }

    fn finish(&mut self, kind: A::Kind) -> Token {
        debug_assert!(self.pos > self.token_start, "automaton emitted an empty token");
        let kind = A::refine(kind, self.token_text());
        let len = self.pos - self.token_start;
        self.token_start = self.pos;
        Token::new(kind.id(), len)
    }
}

impl<'a, A: Automaton> Default for Scanner<'a, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A: Automaton> TokenStream<'a> for Scanner<'a, A> {
    type State = ScanState<A::State>;

    fn load(
        &mut self,
        state: Option<&Self::State>,
        buffer: &'a [u8],
        offset: usize,
        len: usize,
        last: bool,
    ) {
        let state = state
            .copied()
            .unwrap_or_else(|| ScanState::at_boundary(A::INITIAL));
        debug_assert!(state.prescan <= offset, "prescan reaches before the buffer");
        self.buffer = buffer;
        self.pos = offset;
        self.stop = (offset + len).min(buffer.len());
        self.last = last;
        self.state = state.state;
        self.token_start = offset - state.prescan;
    }

    fn next_token(&mut self) -> Token {
        loop {
            if self.pos >= self.stop {
                if self.pos > self.token_start && self.last {
                    return self.finish(A::at_end_of_input(self.state));
                }
                return Token::end_of_chunk();
            }

            let byte = self.buffer[self.pos];
            if byte == b'\n' {
                if self.pos > self.token_start {
                    return self.finish(A::at_line_end(self.state));
                }
                self.pos += 1;
                self.token_start = self.pos;
                self.state = A::settle(self.state);
                return Token::end_of_line();
            }

            let (next, action) = A::transition(self.state, byte);
            self.state = next;
            match action {
                Action::Continue => self.pos += 1,
                Action::Reprocess => {}
                Action::Emit(kind) => {
                    self.pos += 1;
                    return self.finish(kind);
                }
                Action::EmitBefore(kind) => return self.finish(kind),
            }
        }
    }

    fn store_state(&self) -> Self::State {
        ScanState {
            state: self.state,
            prescan: self.pos - self.token_start,
        }
    }

    fn load_state(&mut self, state: &Self::State) {
        self.state = state.state;
        self.token_start = self.pos - state.prescan;
    }

    fn token_name(&self, id: TokenId) -> Option<&str> {
        A::Kind::local_name(id)
    }

    fn offset(&self) -> usize {
        self.token_start
    }
}
