//! Host (markup) language.
//!
//!     HTML-like text with tags, attributes, comments, declarations and character
//!     references. Text outside tags keeps its spaces; whitespace inside tags is its own token.
//!     Tags are not checked for balance or schema.

use crate::template::scanner::{Action, Automaton, Scanner};
use crate::template::token::token_kinds;
use serde::{Deserialize, Serialize};

token_kinds! {
    /// Token kinds of the host language.
    pub enum HostToken in "markup" {
        Text = 2 => "text",
        Whitespace = 3 => "whitespace",
        Symbol = 4 => "symbol",
        TagName = 5 => "tag-name",
        Attribute = 6 => "attribute",
        Value = 7 => "value",
        Comment = 8 => "comment",
        Declaration = 9 => "declaration",
        CharRef = 10 => "char-ref",
        Error = 11 => "error",
    }
}

/// Where a whitespace run inside a tag hands control back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gap {
    Tag,
    Attribute,
    Equals,
}

impl Gap {
    fn resume(self) -> HostState {
        match self {
            Gap::Tag => HostState::InTag,
            Gap::Attribute => HostState::AfterAttrName,
            Gap::Equals => HostState::AfterEquals,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostState {
    /// Boundary state between content tokens.
    Content,
    Text,
    AfterLt,
    AfterLtBang,
    AfterLtBangDash,
    Comment,
    CommentDash,
    CommentDashDash,
    Declaration,
    CharRef,
    TagNameStart,
    TagName,
    InTag,
    Blank(Gap),
    AttrName,
    AfterAttrName,
    AfterEquals,
    Quoted(u8),
    Unquoted,
    AfterSlash,
    ErrorInTag,
}

pub(crate) fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b':' | b'.') || byte >= 0x80
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

pub(crate) fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\x0c')
}

pub struct HostSyntax;

impl Automaton for HostSyntax {
    type State = HostState;
    type Kind = HostToken;

    const INITIAL: HostState = HostState::Content;

    fn transition(state: HostState, byte: u8) -> (HostState, Action<HostToken>) {
        use Action::*;
        use HostState as S;

        match state {
            S::Content => match byte {
                b'<' => (S::AfterLt, Continue),
                b'&' => (S::CharRef, Continue),
                _ => (S::Text, Continue),
            },
            S::Text => match byte {
                b'<' | b'&' => (S::Content, EmitBefore(HostToken::Text)),
                _ => (S::Text, Continue),
            },
            S::AfterLt => match byte {
                b'/' => (S::TagNameStart, Emit(HostToken::Symbol)),
                b'!' => (S::AfterLtBang, Continue),
                b if is_name_start(b) => (S::TagNameStart, EmitBefore(HostToken::Symbol)),
                _ => (S::Content, EmitBefore(HostToken::Error)),
            },
            S::AfterLtBang => match byte {
                b'-' => (S::AfterLtBangDash, Continue),
                b if b.is_ascii_alphabetic() => (S::Declaration, Continue),
                _ => (S::Content, EmitBefore(HostToken::Error)),
            },
            S::AfterLtBangDash => match byte {
                b'-' => (S::Comment, Continue),
                _ => (S::Content, EmitBefore(HostToken::Error)),
            },
            S::Comment => match byte {
                b'-' => (S::CommentDash, Continue),
                _ => (S::Comment, Continue),
            },
            S::CommentDash => match byte {
                b'-' => (S::CommentDashDash, Continue),
                _ => (S::Comment, Continue),
            },
            S::CommentDashDash => match byte {
                b'>' => (S::Content, Emit(HostToken::Comment)),
                b'-' => (S::CommentDashDash, Continue),
                _ => (S::Comment, Continue),
            },
            S::Declaration => match byte {
                b'>' => (S::Content, Emit(HostToken::Declaration)),
                _ => (S::Declaration, Continue),
            },
            S::CharRef => match byte {
                b';' => (S::Content, Emit(HostToken::CharRef)),
                b'#' => (S::CharRef, Continue),
                b if b.is_ascii_alphanumeric() => (S::CharRef, Continue),
                _ => (S::Content, EmitBefore(HostToken::Text)),
            },
            S::TagNameStart => match byte {
                b if is_name_byte(b) => (S::TagName, Continue),
                b'>' => (S::Content, Emit(HostToken::Symbol)),
                _ => (S::ErrorInTag, Continue),
            },
            S::TagName => match byte {
                b if is_name_byte(b) => (S::TagName, Continue),
                _ => (S::InTag, EmitBefore(HostToken::TagName)),
            },
            S::InTag => match byte {
                b if is_blank(b) => (S::Blank(Gap::Tag), Continue),
                b if is_name_start(b) => (S::AttrName, Continue),
                b'>' => (S::Content, Emit(HostToken::Symbol)),
                b'/' => (S::AfterSlash, Continue),
                _ => (S::ErrorInTag, Continue),
            },
            S::Blank(gap) => match byte {
                b if is_blank(b) => (S::Blank(gap), Continue),
                _ => (gap.resume(), EmitBefore(HostToken::Whitespace)),
            },
            S::AttrName => match byte {
                b if is_name_byte(b) => (S::AttrName, Continue),
                _ => (S::AfterAttrName, EmitBefore(HostToken::Attribute)),
            },
            S::AfterAttrName => match byte {
                b if is_blank(b) => (S::Blank(Gap::Attribute), Continue),
                b'=' => (S::AfterEquals, Emit(HostToken::Symbol)),
                b'>' => (S::Content, Emit(HostToken::Symbol)),
                b'/' => (S::AfterSlash, Continue),
                b if is_name_start(b) => (S::AttrName, Continue),
                _ => (S::ErrorInTag, Continue),
            },
            S::AfterEquals => match byte {
                b if is_blank(b) => (S::Blank(Gap::Equals), Continue),
                b'"' | b'\'' => (S::Quoted(byte), Continue),
                b'>' => (S::Content, Emit(HostToken::Symbol)),
                _ => (S::Unquoted, Continue),
            },
            S::Quoted(quote) => {
                if byte == quote {
                    (S::InTag, Emit(HostToken::Value))
                } else {
                    (S::Quoted(quote), Continue)
                }
            }
            S::Unquoted => match byte {
                b'>' => (S::InTag, EmitBefore(HostToken::Value)),
                b if is_blank(b) => (S::InTag, EmitBefore(HostToken::Value)),
                _ => (S::Unquoted, Continue),
            },
            S::AfterSlash => match byte {
                b'>' => (S::Content, Emit(HostToken::Symbol)),
                _ => (S::InTag, EmitBefore(HostToken::Error)),
            },
            S::ErrorInTag => match byte {
                b'>' => (S::InTag, EmitBefore(HostToken::Error)),
                b if is_blank(b) => (S::InTag, EmitBefore(HostToken::Error)),
                _ => (S::ErrorInTag, Continue),
            },
        }
    }

    fn in_progress(state: HostState) -> HostToken {
        use HostState as S;
        match state {
            S::Content | S::Text | S::CharRef => HostToken::Text,
            S::AfterLt | S::AfterSlash | S::TagNameStart => HostToken::Symbol,
            S::AfterLtBang | S::AfterLtBangDash | S::ErrorInTag => HostToken::Error,
            S::Comment | S::CommentDash | S::CommentDashDash => HostToken::Comment,
            S::Declaration => HostToken::Declaration,
            S::TagName => HostToken::TagName,
            S::InTag | S::Blank(_) => HostToken::Whitespace,
            S::AttrName | S::AfterAttrName => HostToken::Attribute,
            S::AfterEquals | S::Quoted(_) | S::Unquoted => HostToken::Value,
        }
    }

    fn at_end_of_input(state: HostState) -> HostToken {
        use HostState as S;
        match state {
            S::AfterLt | S::AfterSlash | S::Quoted(_) => HostToken::Error,
            _ => Self::in_progress(state),
        }
    }

    fn settle(state: HostState) -> HostState {
        use HostState as S;
        match state {
            S::Text | S::CharRef | S::AfterLt | S::AfterLtBang | S::AfterLtBangDash => S::Content,
            S::CommentDash | S::CommentDashDash => S::Comment,
            S::TagName | S::TagNameStart | S::Unquoted | S::AfterSlash | S::ErrorInTag => S::InTag,
            S::AttrName => S::AfterAttrName,
            S::Blank(gap) => gap.resume(),
            other => other,
        }
    }
}

pub type HostLexer<'a> = Scanner<'a, HostSyntax>;
