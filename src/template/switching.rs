//! Language switching lexer
//!
//!     The orchestrator behind every template page. It composes the host, tag and script
//!     lexers into one token space and decides, token by token, whether the active
//!     sub-lexer's output is really the start of another sub-language.
//!
//! Algorithm
//!
//!     Each step pulls a candidate token from the active sub-lexer, then runs the delimiter
//!     probes of the active language over the bytes of that candidate. A probe may read past
//!     the candidate's end, as far as the current window allows.
//!
//!     - Nothing found: the candidate is emitted (shifted into the global space).
//!     - A delimiter confirmed inside the candidate: the candidate is cut right before it and
//!       the sub-lexer continues from a settled state; the delimiter is handled on the next
//!       step.
//!     - A delimiter confirmed at the candidate's start: the nest mode changes. Script
//!       delimiters are emitted as tokens of their own, tag fragments are lexed by the tag
//!       lexer starting at their `<`.
//!     - A probe still undecided at the end of a non-final window: the lexer suspends with
//!       end-of-chunk and records where the probe stood (see [Lookahead]).
//!
//!     The tag lexer closes its own fragments. Once it sits in `EndOfFragment` the mode
//!     falls back to the host, without any lookahead.
//!
//! Suspension
//!
//!     Whatever was read of the pending token is covered by [TemplateState::prescan], so the
//!     caller keeps those bytes in the buffer. The active sub-lexer's stored state is always
//!     the one it had when it was last loaded; the token is re-derived from it on resume,
//!     which makes a split run produce exactly the tokens of an unsplit one.
//!
//!     The delimiter search is not repeated: [TemplateState::probed] records how much of the
//!     pending token was already searched, and a resumed window continues from there. Every
//!     verdict reached inside a window is final, so a long token costs one pass in total.

pub mod delimiter;
pub mod mode;

use crate::template::composer::{KindSyntax, SyntaxComposer, SyntaxInfo};
use crate::template::error::LexerError;
use crate::template::lexers::{
    HostLexer, HostState, HostSyntax, HostToken, ScriptLexer, ScriptState, ScriptSyntax,
    ScriptToken, TagLexer, TagState, TagSyntax, TagToken,
};
use crate::template::scanner::{Automaton, ScanState, Scanner};
use crate::template::stream::TokenStream;
use crate::template::token::{Token, TokenId, TokenKind};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::trace;

pub use delimiter::{Delimiters, Probe, Switch, Verdict};
pub use mode::{Language, NestMode};

/// The composed token space of template pages.
pub struct TemplateSyntax {
    composer: SyntaxComposer,
    host: SyntaxInfo,
    tag: SyntaxInfo,
    script: SyntaxInfo,
}

impl TemplateSyntax {
    fn build() -> Self {
        let mut composer = SyntaxComposer::new();
        let host = composer.register(Box::new(KindSyntax::<HostToken>::new()));
        let tag = composer.register(Box::new(KindSyntax::<TagToken>::new()));
        let script = composer.register(Box::new(KindSyntax::<ScriptToken>::new()));
        composer.override_colliding_names(tag);
        composer.override_colliding_names(script);
        Self {
            composer,
            host,
            tag,
            script,
        }
    }

    /// Shared instance; the composition never changes at runtime.
    pub fn shared() -> &'static TemplateSyntax {
        static SHARED: Lazy<TemplateSyntax> = Lazy::new(TemplateSyntax::build);
        &SHARED
    }

    pub fn composer(&self) -> &SyntaxComposer {
        &self.composer
    }

    pub fn info(&self, language: Language) -> SyntaxInfo {
        match language {
            Language::Host => self.host,
            Language::Tag => self.tag,
            Language::Script => self.script,
        }
    }

    pub fn host(&self, kind: HostToken) -> TokenId {
        self.host.to_global(kind.id())
    }

    pub fn tag(&self, kind: TagToken) -> TokenId {
        self.tag.to_global(kind.id())
    }

    pub fn script(&self, kind: ScriptToken) -> TokenId {
        self.script.to_global(kind.id())
    }

    /// The sub-language a global id belongs to.
    pub fn language_of(&self, id: TokenId) -> Option<Language> {
        let (index, _) = self.composer.resolve(id)?;
        [Language::Host, Language::Tag, Language::Script]
            .get(index)
            .copied()
    }
}

/// A probe left undecided when the window ran out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookahead {
    /// The active sub-lexer's first token, if it was complete.
    pub candidate: Option<Token>,
    /// Distance from the pending token's start to the probe's first byte.
    pub probe_at: usize,
    pub probe: Probe,
}

/// Resumable state of a [TemplateLexer].
///
/// Sub-lexers that are not live in `mode` are `None`. While a lookahead is pending, the
/// active sub-lexer's entry is its state from before the lookahead began.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateState {
    pub mode: NestMode,
    pub host: ScanState<HostState>,
    pub tag: Option<ScanState<TagState>>,
    pub script: Option<ScanState<ScriptState>>,
    pub lookahead: Option<Lookahead>,
    /// Bytes of the pending token read before the current window.
    pub prescan: usize,
    /// Bytes of the pending token already searched for delimiters.
    #[serde(default)]
    pub probed: usize,
}

impl TemplateState {
    pub fn initial() -> Self {
        Self {
            mode: NestMode::Host,
            host: ScanState::at_boundary(HostSyntax::INITIAL),
            tag: None,
            script: None,
            lookahead: None,
            prescan: 0,
            probed: 0,
        }
    }

    pub fn to_json(&self) -> Result<String, LexerError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, LexerError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for TemplateState {
    fn default() -> Self {
        Self::initial()
    }
}

enum Outcome {
    Clear,
    Switch { at: usize, switch: Switch },
    Suspend { at: usize, probe: Probe },
}

/// Orchestrates host, tag and script lexing over one template page.
pub struct TemplateLexer<'a> {
    syntax: &'static TemplateSyntax,
    delimiters: Delimiters,
    switching: bool,
    host: HostLexer<'a>,
    tag: TagLexer<'a>,
    script: ScriptLexer<'a>,
    buffer: &'a [u8],
    /// Start of the pending token.
    start: usize,
    /// Read position; everything from `start` up to here is prescan.
    pos: usize,
    stop: usize,
    last: bool,
    state: TemplateState,
}

impl<'a> TemplateLexer<'a> {
    /// A lexer recognizing delimiters; with `switching == false` it only lexes the host.
    pub fn new(delimiters: Delimiters, switching: bool) -> Self {
        Self {
            syntax: TemplateSyntax::shared(),
            delimiters,
            switching,
            host: Scanner::new(),
            tag: Scanner::new(),
            script: Scanner::new(),
            buffer: &[],
            start: 0,
            pos: 0,
            stop: 0,
            last: false,
            state: TemplateState::initial(),
        }
    }

    pub fn syntax(&self) -> &'static TemplateSyntax {
        self.syntax
    }

    pub fn mode(&self) -> NestMode {
        self.state.mode
    }

    /// Prescan of the active sub-lexer's stored state, i.e. where it resumes reading.
    fn active_prescan(&self) -> usize {
        match self.state.mode.active() {
            Language::Host => self.state.host.prescan,
            Language::Tag => live(&self.state.tag, Language::Tag).prescan,
            Language::Script => live(&self.state.script, Language::Script).prescan,
        }
    }

    /// Loads the active sub-lexer from its stored state and scans one token up to `stop`.
    fn scan_active(&mut self, stop: usize, last: bool) -> Token {
        let buffer = self.buffer;
        let at = self.start + self.active_prescan();
        match self.state.mode.active() {
            Language::Host => scan(&mut self.host, &self.state.host, buffer, at, stop, last),
            Language::Tag => {
                let state = live(&self.state.tag, Language::Tag);
                scan(&mut self.tag, state, buffer, at, stop, last)
            }
            Language::Script => {
                let state = live(&self.state.script, Language::Script);
                scan(&mut self.script, state, buffer, at, stop, last)
            }
        }
    }

    /// Copies the active sub-lexer's current state into the composite state.
    fn store_active(&mut self) {
        match self.state.mode.active() {
            Language::Host => self.state.host = self.host.store_state(),
            Language::Tag => self.state.tag = Some(self.tag.store_state()),
            Language::Script => self.state.script = Some(self.script.store_state()),
        }
    }

    /// Kind of the active sub-lexer's unfinished token; its state is settled at the cursor.
    fn cut_active(&mut self) -> Option<TokenId> {
        match self.state.mode.active() {
            Language::Host => {
                self.state.host = self.host.settled_state();
                self.host.pending_kind().map(TokenKind::id)
            }
            Language::Tag => {
                self.state.tag = Some(self.tag.settled_state());
                self.tag.pending_kind().map(TokenKind::id)
            }
            Language::Script => {
                self.state.script = Some(self.script.settled_state());
                self.script.pending_kind().map(TokenKind::id)
            }
        }
    }

    fn find_delimiter(
        &self,
        language: Language,
        span_end: usize,
        resumed: Option<Lookahead>,
    ) -> Outcome {
        let (mut at, mut pending) = match resumed {
            Some(lookahead) => (self.start + lookahead.probe_at, Some(lookahead.probe)),
            None => (self.start + self.state.probed, None),
        };

        loop {
            let probe = match pending.take() {
                Some(probe) => probe,
                None if at >= span_end => return Outcome::Clear,
                None => match self.delimiters.start(language, self.buffer[at]) {
                    Some(probe) => probe,
                    None => {
                        at += 1;
                        continue;
                    }
                },
            };

            match self.run_probe(at, probe) {
                Verdict::Confirmed(switch) => return Outcome::Switch { at, switch },
                Verdict::Rejected => at += 1,
                Verdict::Undecided(probe) => return Outcome::Suspend { at, probe },
            }
        }
    }

    /// Tag comments are opaque: nothing inside them switches languages.
    fn is_tag_comment(&self, language: Language, token: Token) -> bool {
        if language != Language::Tag {
            return false;
        }
        if token.is_end_of_chunk() {
            self.tag.pending_kind() == Some(TagToken::Comment)
        } else {
            token.id == TagToken::Comment.id()
        }
    }

    fn run_probe(&self, at: usize, mut probe: Probe) -> Verdict {
        loop {
            let next = at + probe.consumed();
            if next >= self.stop {
                return if self.last {
                    self.delimiters.at_end_of_input(probe)
                } else {
                    Verdict::Undecided(probe)
                };
            }
            match self.delimiters.advance(probe, self.buffer[next]) {
                Verdict::Undecided(advanced) => probe = advanced,
                verdict => return verdict,
            }
        }
    }

    fn advance(&mut self, len: usize) {
        self.start += len;
        self.pos = self.start;
        self.state.probed = 0;
    }

    fn commit(&mut self, language: Language, token: Token) -> Token {
        self.store_active();
        self.advance(token.len);
        let id = self.syntax.info(language).to_global(token.id);

        if language == Language::Tag
            && self.state.tag.map(|tag| tag.state) == Some(TagState::EndOfFragment)
        {
            self.state.mode = self.state.mode.leave();
            self.state.tag = None;
            trace!(offset = self.start, mode = ?self.state.mode, "tag fragment closed");
        }
        Token::new(id, token.len)
    }

    /// Ends the pending token right before a delimiter found inside it.
    fn cut(&mut self, language: Language, at: usize) -> Token {
        let token = self.scan_active(at, false);
        if !token.is_end_of_chunk() {
            return self.commit(language, token);
        }
        let local = self
            .cut_active()
            .unwrap_or_else(|| unreachable!("cut at {at} left no pending token"));
        let len = at - self.start;
        self.advance(len);
        trace!(offset = at, %language, "token cut before delimiter");
        Token::new(self.syntax.info(language).to_global(local), len)
    }

    /// Applies a switch confirmed at the pending token's start.
    fn switch(&mut self, switch: Switch) -> Option<Token> {
        let from = self.state.mode;
        self.state.probed = 0;
        let token = match switch {
            Switch::EnterTag => {
                self.state.mode = from.enter(Language::Tag);
                self.state.tag = Some(ScanState::at_boundary(TagSyntax::INITIAL));
                None
            }
            Switch::EnterScript { len } => {
                self.state.mode = from.enter(Language::Script);
                self.state.script = Some(ScanState::at_boundary(ScriptSyntax::INITIAL));
                Some(self.delimiter_token(len))
            }
            Switch::LeaveScript { len } => {
                self.state.mode = from.leave();
                self.state.script = None;
                Some(self.delimiter_token(len))
            }
        };
        trace!(offset = self.start, ?from, to = ?self.state.mode, "nest mode switched");
        token
    }

    fn delimiter_token(&mut self, len: usize) -> Token {
        self.advance(len);
        Token::new(self.syntax.tag(TagToken::ScriptDelimiter), len)
    }
}

fn live<S>(state: &Option<S>, language: Language) -> &S {
    state
        .as_ref()
        .unwrap_or_else(|| unreachable!("{language} lexer is active but not live"))
}

fn scan<'a, A: Automaton>(
    lexer: &mut Scanner<'a, A>,
    state: &ScanState<A::State>,
    buffer: &'a [u8],
    at: usize,
    stop: usize,
    last: bool,
) -> Token {
    lexer.load(Some(state), buffer, at, stop.saturating_sub(at), last);
    lexer.next_token()
}

impl<'a> TokenStream<'a> for TemplateLexer<'a> {
    type State = TemplateState;

    fn load(
        &mut self,
        state: Option<&TemplateState>,
        buffer: &'a [u8],
        offset: usize,
        len: usize,
        last: bool,
    ) {
        self.buffer = buffer;
        self.pos = offset;
        self.stop = (offset + len).min(buffer.len());
        self.last = last;
        let state = state.cloned().unwrap_or_default();
        debug_assert!(state.prescan <= offset, "prescan reaches before the buffer");
        self.start = offset - state.prescan;
        if state.lookahead.is_some() {
            trace!(offset, prescan = state.prescan, "resuming delimiter lookahead");
        }
        self.state = state;
    }

    fn next_token(&mut self) -> Token {
        loop {
            let language = self.state.mode.active();
            let resumed = self.state.lookahead.take();
            let token = self.scan_active(self.stop, self.last);
            if let (Some(candidate), false) =
                (resumed.and_then(|lookahead| lookahead.candidate), token.is_end_of_chunk())
            {
                debug_assert_eq!(candidate, token, "resumed candidate differs");
            }

            let span_end = if token.is_end_of_chunk() {
                self.stop
            } else {
                self.start + token.len
            };
            let outcome = if self.switching && !self.is_tag_comment(language, token) {
                self.find_delimiter(language, span_end, resumed)
            } else {
                Outcome::Clear
            };

            match outcome {
                Outcome::Clear if token.is_end_of_chunk() => {
                    self.store_active();
                    self.pos = self.stop.max(self.start);
                    self.state.probed = self.pos - self.start;
                    return token;
                }
                Outcome::Clear => return self.commit(language, token),
                Outcome::Suspend { at, probe } => {
                    self.state.probed = at - self.start;
                    self.state.lookahead = Some(Lookahead {
                        candidate: (!token.is_end_of_chunk()).then_some(token),
                        probe_at: at - self.start,
                        probe,
                    });
                    self.pos = self.stop;
                    trace!(offset = self.start, probe = ?probe, "delimiter lookahead suspended");
                    return Token::end_of_chunk();
                }
                Outcome::Switch { at, .. } if at > self.start => return self.cut(language, at),
                Outcome::Switch { switch, .. } => {
                    if let Some(token) = self.switch(switch) {
                        return token;
                    }
                }
            }
        }
    }

    fn store_state(&self) -> TemplateState {
        TemplateState {
            prescan: self.pos - self.start,
            ..self.state.clone()
        }
    }

    fn load_state(&mut self, state: &TemplateState) {
        self.start = self.pos - state.prescan;
        self.state = state.clone();
    }

    fn token_name(&self, id: TokenId) -> Option<&str> {
        self.syntax.composer.token_name(id)
    }

    fn offset(&self) -> usize {
        self.start
    }
}
