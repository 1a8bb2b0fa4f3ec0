//! Token identifiers shared by every lexer in the crate.
//!
//!     A token is just a classification plus a length. Its position is implicit: it starts
//!     where the previous token ended. This keeps tokens cheap and lets the caller decide
//!     how positions are tracked (see [tokenize_chunked](crate::template::testing::tokenize_chunked)).
//!
//! Id Space
//!
//!     Ids `0..=TokenId::RESERVED` are structural markers shared by all lexers and never
//!     shifted. Every sub-language declares its own kinds starting right after the reserved
//!     range; the [composer](crate::template::composer) later places them in one global space.

use serde::{Deserialize, Serialize};

/// Numeric token classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u16);

impl TokenId {
    /// The chunk ran out before a token could be completed.
    pub const END_OF_CHUNK: TokenId = TokenId(0);
    /// A single `\n`.
    pub const END_OF_LINE: TokenId = TokenId(1);
    /// Highest id of the structural range.
    pub const RESERVED: u16 = 1;
    /// First id a sub-language may use for its own kinds.
    pub const FIRST_LOCAL: u16 = Self::RESERVED + 1;

    pub fn is_structural(self) -> bool {
        self.0 <= Self::RESERVED
    }
}

/// Names of the structural markers, if `id` is one.
pub fn structural_name(id: TokenId) -> Option<&'static str> {
    match id {
        TokenId::END_OF_CHUNK => Some("end-of-chunk"),
        TokenId::END_OF_LINE => Some("end-of-line"),
        _ => None,
    }
}

/// A classified span, relative to the end of the previous token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub len: usize,
}

impl Token {
    pub const fn new(id: TokenId, len: usize) -> Self {
        Self { id, len }
    }

    pub const fn end_of_chunk() -> Self {
        Self::new(TokenId::END_OF_CHUNK, 0)
    }

    pub const fn end_of_line() -> Self {
        Self::new(TokenId::END_OF_LINE, 1)
    }

    pub fn is_end_of_chunk(&self) -> bool {
        self.id == TokenId::END_OF_CHUNK
    }
}

/// An enumerated set of token kinds belonging to one sub-language.
pub trait TokenKind: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// Short language tag used when names collide in a composed space.
    const LANGUAGE: &'static str;
    /// Every kind, in id order.
    const ALL: &'static [Self];

    fn id(self) -> TokenId;
    fn name(self) -> &'static str;
    fn from_id(id: TokenId) -> Option<Self>;

    /// Highest local id used by this language.
    fn max_id() -> TokenId {
        Self::ALL
            .iter()
            .map(|kind| kind.id())
            .max()
            .unwrap_or(TokenId(TokenId::RESERVED))
    }

    /// Local name lookup, total over `0..=max_id()`.
    fn local_name(id: TokenId) -> Option<&'static str> {
        structural_name(id).or_else(|| Self::from_id(id).map(Self::name))
    }
}

/// Declares a sub-language's token kinds together with their ids and display names.
macro_rules! token_kinds {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $language:literal {
            $($variant:ident = $id:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u16)]
        $vis enum $name {
            $($variant = $id,)+
        }

        impl $crate::template::token::TokenKind for $name {
            const LANGUAGE: &'static str = $language;
            const ALL: &'static [Self] = &[$($name::$variant,)+];

            fn id(self) -> $crate::template::token::TokenId {
                $crate::template::token::TokenId(self as u16)
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            fn from_id(id: $crate::template::token::TokenId) -> Option<Self> {
                match id.0 {
                    $($id => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use token_kinds;
