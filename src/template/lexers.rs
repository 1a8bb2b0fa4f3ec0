//! Sub-language lexers.
//!
//! Each one is a [Scanner](crate::template::scanner::Scanner) over its own automaton, numbers
//! its tokens from [TokenId::FIRST_LOCAL](crate::template::token::TokenId::FIRST_LOCAL), and
//! knows nothing about the other two.

pub mod host;
pub mod script;
pub mod tag;

pub use host::{HostLexer, HostState, HostSyntax, HostToken};
pub use script::{Keyword, ScriptLexer, ScriptState, ScriptSyntax, ScriptToken};
pub use tag::{TagLexer, TagState, TagSyntax, TagToken};
