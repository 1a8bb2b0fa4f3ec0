//! Template page lexing
//!
//!     Template pages mix three languages: markup (the host), directives and custom tags,
//!     and an embedded script language. This module lexes them incrementally: a document
//!     is fed in bounded windows, lexing stops at the end of each window with a resumable
//!     state and continues from it later, even when a delimiter straddles the boundary.
//!
//! Layout
//!
//!     - [token] and [stream]: the token model and the [TokenStream] capability every
//!       lexer implements.
//!     - [scanner]: the resumable engine behind the three sub-lexers in [lexers].
//!     - [composer]: places the sub-languages' token ids into one global space.
//!     - [switching]: the orchestrating [TemplateLexer] with its nest modes and delimiters.
//!     - [incremental]: re-lexing edited documents from stored line states.
//!     - [config] and [error]: configuration loading and recoverable errors.
//!     - [testing]: drivers and renderers used by the tests.
//!
//! Entry Points
//!
//!     [create_lexer] builds a lexer for a [LanguageVariant] with the default tag prefixes;
//!     [create_lexer_with] honors a loaded [LexerConfig].

pub mod composer;
pub mod config;
pub mod error;
pub mod incremental;
pub mod lexers;
pub mod scanner;
pub mod stream;
pub mod switching;
pub mod testing;
pub mod token;

pub use config::{LanguageVariant, LexerConfig, Loader};
pub use error::LexerError;
pub use stream::{StateDiff, TokenStream};
pub use switching::{Delimiters, NestMode, TemplateLexer, TemplateState};
pub use token::{Token, TokenId};

/// Everything needed to build lexers of one kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialect {
    delimiters: Delimiters,
    switching: bool,
}

impl Dialect {
    /// The variant with the default tag prefixes.
    pub fn new(variant: LanguageVariant) -> Self {
        Self {
            delimiters: Delimiters::default(),
            switching: variant == LanguageVariant::Page,
        }
    }

    pub fn from_config(config: &LexerConfig) -> Result<Self, LexerError> {
        Ok(Self {
            delimiters: config.delimiters()?,
            switching: config.lexer.variant == LanguageVariant::Page,
        })
    }

    pub fn lexer<'a>(&self) -> TemplateLexer<'a> {
        TemplateLexer::new(self.delimiters.clone(), self.switching)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new(LanguageVariant::Page)
    }
}

pub fn create_lexer<'a>(variant: LanguageVariant) -> TemplateLexer<'a> {
    Dialect::new(variant).lexer()
}

pub fn create_lexer_with<'a>(config: &LexerConfig) -> Result<TemplateLexer<'a>, LexerError> {
    Ok(Dialect::from_config(config)?.lexer())
}
