//! Embedded script language: a C-family expression/statement syntax.
//!
//!     Only lexical classes are recognized. Keywords are decided once an identifier is
//!     complete, using the logos-generated [Keyword] table.

use crate::template::lexers::host::is_blank;
use crate::template::scanner::{Action, Automaton, Scanner};
use crate::template::token::token_kinds;
use logos::Logos;
use serde::{Deserialize, Serialize};

token_kinds! {
    /// Token kinds of the script language.
    pub enum ScriptToken in "script" {
        Whitespace = 2 => "whitespace",
        Identifier = 3 => "identifier",
        Keyword = 4 => "keyword",
        Number = 5 => "number",
        String = 6 => "string",
        Char = 7 => "char",
        Comment = 8 => "comment",
        Operator = 9 => "operator",
        Separator = 10 => "separator",
        Error = 11 => "error",
    }
}

/// Reserved words of the script language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("new")]
    New,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("int")]
    Int,
    #[token("boolean")]
    Boolean,
    #[token("String")]
    String,
    #[token("var")]
    Var,
    #[token("final")]
    Final,
    #[token("this")]
    This,
    #[token("instanceof")]
    Instanceof,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("throw")]
    Throw,
}

impl Keyword {
    /// Whether `text` is exactly one keyword.
    pub fn matches(text: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(text) else {
            return false;
        };
        let mut lexer = Keyword::lexer(text);
        matches!(lexer.next(), Some(Ok(_))) && lexer.remainder().is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptState {
    Init,
    Blank,
    Ident,
    Number,
    Quoted(u8),
    QuotedEscape(u8),
    AfterSlash,
    LineComment,
    BlockComment,
    BlockCommentStar,
    Operator(u8),
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'_' | b'$') || byte >= 0x80
}

fn is_ident_byte(byte: u8) -> bool {
    is_ident_start(byte) || byte.is_ascii_digit()
}

const OPERATOR_BYTES: &[u8] = b"+-*%=<>!&|^~?:";
const DOUBLED_OPERATORS: &[u8] = b"+-&|<>=:";
const SEPARATOR_BYTES: &[u8] = b"(){}[];,.@";

pub struct ScriptSyntax;

impl Automaton for ScriptSyntax {
    type State = ScriptState;
    type Kind = ScriptToken;

    const INITIAL: ScriptState = ScriptState::Init;

    fn transition(state: ScriptState, byte: u8) -> (ScriptState, Action<ScriptToken>) {
        use Action::*;
        use ScriptState as S;

        match state {
            S::Init => match byte {
                b if is_blank(b) => (S::Blank, Continue),
                b if is_ident_start(b) => (S::Ident, Continue),
                b if b.is_ascii_digit() => (S::Number, Continue),
                b'"' | b'\'' => (S::Quoted(byte), Continue),
                b'/' => (S::AfterSlash, Continue),
                b if OPERATOR_BYTES.contains(&b) => (S::Operator(b), Continue),
                b if SEPARATOR_BYTES.contains(&b) => (S::Init, Emit(ScriptToken::Separator)),
                _ => (S::Init, Emit(ScriptToken::Error)),
            },
            S::Blank => match byte {
                b if is_blank(b) => (S::Blank, Continue),
                _ => (S::Init, EmitBefore(ScriptToken::Whitespace)),
            },
            S::Ident => match byte {
                b if is_ident_byte(b) => (S::Ident, Continue),
                _ => (S::Init, EmitBefore(ScriptToken::Identifier)),
            },
            S::Number => match byte {
                b if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' => (S::Number, Continue),
                _ => (S::Init, EmitBefore(ScriptToken::Number)),
            },
            S::Quoted(quote) => match byte {
                b'\\' => (S::QuotedEscape(quote), Continue),
                b if b == quote => (S::Init, Emit(quoted_kind(quote))),
                _ => (S::Quoted(quote), Continue),
            },
            S::QuotedEscape(quote) => (S::Quoted(quote), Continue),
            S::AfterSlash => match byte {
                b'/' => (S::LineComment, Continue),
                b'*' => (S::BlockComment, Continue),
                b'=' => (S::Init, Emit(ScriptToken::Operator)),
                _ => (S::Init, EmitBefore(ScriptToken::Operator)),
            },
            S::LineComment => (S::LineComment, Continue),
            S::BlockComment => match byte {
                b'*' => (S::BlockCommentStar, Continue),
                _ => (S::BlockComment, Continue),
            },
            S::BlockCommentStar => match byte {
                b'/' => (S::Init, Emit(ScriptToken::Comment)),
                b'*' => (S::BlockCommentStar, Continue),
                _ => (S::BlockComment, Continue),
            },
            S::Operator(first) => match byte {
                b'=' => (S::Init, Emit(ScriptToken::Operator)),
                b'>' if first == b'-' => (S::Init, Emit(ScriptToken::Operator)),
                b if b == first && DOUBLED_OPERATORS.contains(&b) => {
                    (S::Init, Emit(ScriptToken::Operator))
                }
                _ => (S::Init, EmitBefore(ScriptToken::Operator)),
            },
        }
    }

    fn in_progress(state: ScriptState) -> ScriptToken {
        use ScriptState as S;
        match state {
            S::Init => ScriptToken::Error,
            S::Blank => ScriptToken::Whitespace,
            S::Ident => ScriptToken::Identifier,
            S::Number => ScriptToken::Number,
            S::Quoted(quote) | S::QuotedEscape(quote) => quoted_kind(quote),
            S::AfterSlash | S::Operator(_) => ScriptToken::Operator,
            S::LineComment | S::BlockComment | S::BlockCommentStar => ScriptToken::Comment,
        }
    }

    fn at_line_end(state: ScriptState) -> ScriptToken {
        match state {
            ScriptState::Quoted(_) | ScriptState::QuotedEscape(_) => ScriptToken::Error,
            other => Self::in_progress(other),
        }
    }

    fn at_end_of_input(state: ScriptState) -> ScriptToken {
        Self::at_line_end(state)
    }

    fn settle(state: ScriptState) -> ScriptState {
        match state {
            ScriptState::BlockComment | ScriptState::BlockCommentStar => ScriptState::BlockComment,
            _ => ScriptState::Init,
        }
    }

    fn refine(kind: ScriptToken, text: &[u8]) -> ScriptToken {
        if kind == ScriptToken::Identifier && Keyword::matches(text) {
            ScriptToken::Keyword
        } else {
            kind
        }
    }
}

fn quoted_kind(quote: u8) -> ScriptToken {
    if quote == b'\'' {
        ScriptToken::Char
    } else {
        ScriptToken::String
    }
}

pub type ScriptLexer<'a> = Scanner<'a, ScriptSyntax>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::testing::lex_and_render;

    fn lex(source: &str) -> String {
        lex_and_render(&mut ScriptLexer::new(), source)
    }

    #[test]
    fn test_keywords_via_table() {
        assert!(Keyword::matches(b"while"));
        assert!(!Keyword::matches(b"whiles"));
        assert!(!Keyword::matches(b"whi"));
        assert!(!Keyword::matches(&[0xff, 0xfe]));
    }

    #[test]
    fn test_statement() {
        assert_eq!(
            lex("if (x >= 10) return \"a\";"),
            "keyword \"if\"\nwhitespace \" \"\nseparator \"(\"\nidentifier \"x\"\n\
             whitespace \" \"\noperator \">=\"\nwhitespace \" \"\nnumber \"10\"\n\
             separator \")\"\nwhitespace \" \"\nkeyword \"return\"\nwhitespace \" \"\n\
             string \"\\\"a\\\"\"\nseparator \";\""
        );
    }

    #[test]
    fn test_percent_then_gt_is_two_operators() {
        assert_eq!(lex("1%>2"), "number \"1\"\noperator \"%\"\noperator \">\"\nnumber \"2\"");
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("/* a\n*/ // b"),
            "comment \"/* a\"\nend-of-line \"\\n\"\ncomment \"*/\"\nwhitespace \" \"\ncomment \"// b\""
        );
    }

    #[test]
    fn test_unterminated_string_is_error_at_line_end() {
        assert_eq!(
            lex("\"abc\nx"),
            "error \"\\\"abc\"\nend-of-line \"\\n\"\nidentifier \"x\""
        );
    }
}
