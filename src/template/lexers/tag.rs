//! Tag language: directives, tag comments and prefixed custom tags.
//!
//!     `<%@ page import="a.b" %>`, `<%-- note --%>`, `<tpl:include file="x"/>`, `</tpl:each>`.
//!
//!     A fragment starts at its `<` and ends at its closing symbol; the lexer then sits in
//!     [TagState::EndOfFragment] so the orchestrator can hand control back to the host.
//!     Script delimiters are never recognized here: `<%` followed by anything other than `@`
//!     or `--` is an error as far as this lexer is concerned.

use crate::template::lexers::host::{is_blank, is_name_byte};
use crate::template::scanner::{Action, Automaton, Scanner};
use crate::template::token::token_kinds;
use serde::{Deserialize, Serialize};

token_kinds! {
    /// Token kinds of the tag language.
    pub enum TagToken in "tag" {
        Symbol = 2 => "symbol",
        ScriptDelimiter = 3 => "script-delimiter",
        TagName = 4 => "tag-name",
        Attribute = 5 => "attribute",
        Value = 6 => "value",
        Whitespace = 7 => "whitespace",
        Comment = 8 => "comment",
        Error = 9 => "error",
    }
}

/// Where a whitespace run hands control back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gap {
    Outside,
    Directive,
    Tag,
    Attribute,
    Equals,
}

impl Gap {
    fn resume(self) -> TagState {
        match self {
            Gap::Outside => TagState::Init,
            Gap::Directive => TagState::DirectiveStart,
            Gap::Tag => TagState::AfterTagName,
            Gap::Attribute => TagState::AfterAttrName,
            Gap::Equals => TagState::AfterEquals,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagState {
    Init,
    AfterLt,
    AfterLtPercent,
    AfterLtPercentDash,
    DirectiveStart,
    TagNameStart,
    InTagName,
    AfterTagName,
    InAttrName,
    AfterAttrName,
    AfterEquals,
    InQuotedValue(u8),
    InQuotedValueEscaped(u8),
    Blank(Gap),
    AfterEndSlash,
    AfterDirectiveEndPercent,
    InComment,
    InCommentDash,
    InCommentDashDash,
    InCommentDashDashPercent,
    /// The fragment closed; the orchestrator leaves the tag language.
    EndOfFragment,
    ErrorOutside,
    ErrorInTag,
}

pub struct TagSyntax;

impl TagSyntax {
    /// Shared by the states that wait for an attribute or the end of the tag.
    fn awaiting_attribute(byte: u8, gap: Gap) -> (TagState, Action<TagToken>) {
        use Action::*;
        use TagState as S;
        match byte {
            b if is_blank(b) => (S::Blank(gap), Continue),
            b'/' => (S::AfterEndSlash, Continue),
            b'%' => (S::AfterDirectiveEndPercent, Continue),
            b'>' => (S::EndOfFragment, Emit(TagToken::Symbol)),
            b if is_name_byte(b) => (S::InAttrName, Continue),
            _ => (S::ErrorInTag, Continue),
        }
    }
}

impl Automaton for TagSyntax {
    type State = TagState;
    type Kind = TagToken;

    const INITIAL: TagState = TagState::Init;

    fn transition(state: TagState, byte: u8) -> (TagState, Action<TagToken>) {
        use Action::*;
        use TagState as S;

        match state {
            S::Init | S::EndOfFragment => match byte {
                b'<' => (S::AfterLt, Continue),
                b if is_blank(b) => (S::Blank(Gap::Outside), Continue),
                _ => (S::ErrorOutside, Continue),
            },
            S::AfterLt => match byte {
                b'%' => (S::AfterLtPercent, Continue),
                b'/' => (S::TagNameStart, Emit(TagToken::Symbol)),
                b if is_name_byte(b) => (S::TagNameStart, EmitBefore(TagToken::Symbol)),
                _ => (S::Init, EmitBefore(TagToken::Error)),
            },
            S::AfterLtPercent => match byte {
                b'@' => (S::DirectiveStart, Emit(TagToken::Symbol)),
                b'-' => (S::AfterLtPercentDash, Continue),
                _ => (S::Init, EmitBefore(TagToken::Error)),
            },
            S::AfterLtPercentDash => match byte {
                b'-' => (S::InComment, Continue),
                _ => (S::Init, EmitBefore(TagToken::Error)),
            },
            S::DirectiveStart => match byte {
                b if is_blank(b) => (S::Blank(Gap::Directive), Continue),
                b'%' => (S::AfterDirectiveEndPercent, Continue),
                b if is_name_byte(b) => (S::InTagName, Continue),
                _ => (S::ErrorInTag, Continue),
            },
            S::TagNameStart => match byte {
                b if is_name_byte(b) => (S::InTagName, Continue),
                _ => (S::ErrorInTag, Continue),
            },
            S::InTagName => match byte {
                b if is_name_byte(b) => (S::InTagName, Continue),
                _ => (S::AfterTagName, EmitBefore(TagToken::TagName)),
            },
            S::AfterTagName => Self::awaiting_attribute(byte, Gap::Tag),
            S::InAttrName => match byte {
                b if is_name_byte(b) => (S::InAttrName, Continue),
                _ => (S::AfterAttrName, EmitBefore(TagToken::Attribute)),
            },
            S::AfterAttrName => match byte {
                b'=' => (S::AfterEquals, Emit(TagToken::Symbol)),
                _ => Self::awaiting_attribute(byte, Gap::Attribute),
            },
            S::AfterEquals => match byte {
                b if is_blank(b) => (S::Blank(Gap::Equals), Continue),
                b'"' | b'\'' => (S::InQuotedValue(byte), Continue),
                _ => (S::ErrorInTag, Continue),
            },
            S::InQuotedValue(quote) => match byte {
                b'\\' => (S::InQuotedValueEscaped(quote), Continue),
                b if b == quote => (S::AfterTagName, Emit(TagToken::Value)),
                _ => (S::InQuotedValue(quote), Continue),
            },
            S::InQuotedValueEscaped(quote) => match byte {
                b if b == quote || b == b'\\' => (S::InQuotedValue(quote), Continue),
                _ => (S::InQuotedValue(quote), Reprocess),
            },
            S::Blank(gap) => match byte {
                b if is_blank(b) => (S::Blank(gap), Continue),
                _ => (gap.resume(), EmitBefore(TagToken::Whitespace)),
            },
            S::AfterEndSlash => match byte {
                b'>' => (S::EndOfFragment, Emit(TagToken::Symbol)),
                _ => (S::AfterTagName, EmitBefore(TagToken::Error)),
            },
            S::AfterDirectiveEndPercent => match byte {
                b'>' => (S::EndOfFragment, Emit(TagToken::Symbol)),
                _ => (S::AfterTagName, EmitBefore(TagToken::Error)),
            },
            S::InComment => match byte {
                b'-' => (S::InCommentDash, Continue),
                _ => (S::InComment, Continue),
            },
            S::InCommentDash => match byte {
                b'-' => (S::InCommentDashDash, Continue),
                _ => (S::InComment, Continue),
            },
            S::InCommentDashDash => match byte {
                b'%' => (S::InCommentDashDashPercent, Continue),
                b'-' => (S::InCommentDashDash, Continue),
                _ => (S::InComment, Continue),
            },
            S::InCommentDashDashPercent => match byte {
                b'>' => (S::EndOfFragment, Emit(TagToken::Comment)),
                b'-' => (S::InCommentDash, Continue),
                _ => (S::InComment, Continue),
            },
            // Errors run to the end of the line or to a closing symbol.
            S::ErrorOutside => match byte {
                b'>' | b'/' | b'%' => (S::AfterTagName, EmitBefore(TagToken::Error)),
                _ => (S::ErrorOutside, Continue),
            },
            S::ErrorInTag => match byte {
                b'>' | b'/' | b'%' => (S::AfterTagName, EmitBefore(TagToken::Error)),
                _ => (S::ErrorInTag, Continue),
            },
        }
    }

    fn in_progress(state: TagState) -> TagToken {
        use TagState as S;
        match state {
            S::AfterLt | S::AfterLtPercent | S::AfterLtPercentDash => TagToken::Symbol,
            S::AfterEndSlash | S::AfterDirectiveEndPercent => TagToken::Symbol,
            S::DirectiveStart | S::TagNameStart | S::InTagName => TagToken::TagName,
            S::AfterTagName | S::InAttrName | S::AfterAttrName => TagToken::Attribute,
            S::AfterEquals | S::InQuotedValue(_) | S::InQuotedValueEscaped(_) => TagToken::Value,
            S::Blank(_) => TagToken::Whitespace,
            S::InComment | S::InCommentDash | S::InCommentDashDash => TagToken::Comment,
            S::InCommentDashDashPercent => TagToken::Comment,
            S::Init | S::EndOfFragment | S::ErrorOutside | S::ErrorInTag => TagToken::Error,
        }
    }

    fn at_end_of_input(state: TagState) -> TagToken {
        use TagState as S;
        match state {
            // An unterminated tag comment still reads as a comment.
            S::InComment | S::InCommentDash | S::InCommentDashDash => TagToken::Comment,
            S::InCommentDashDashPercent => TagToken::Comment,
            S::InTagName => TagToken::TagName,
            S::InAttrName => TagToken::Attribute,
            S::Blank(_) => TagToken::Whitespace,
            _ => TagToken::Error,
        }
    }

    fn settle(state: TagState) -> TagState {
        use TagState as S;
        match state {
            S::AfterLt | S::AfterLtPercent | S::AfterLtPercentDash | S::ErrorOutside => S::Init,
            S::TagNameStart | S::InTagName | S::AfterEndSlash => S::AfterTagName,
            S::AfterDirectiveEndPercent | S::ErrorInTag => S::AfterTagName,
            S::InAttrName => S::AfterAttrName,
            S::InQuotedValueEscaped(quote) => S::InQuotedValue(quote),
            S::InCommentDash | S::InCommentDashDash | S::InCommentDashDashPercent => S::InComment,
            S::Blank(gap) => gap.resume(),
            other => other,
        }
    }
}

pub type TagLexer<'a> = Scanner<'a, TagSyntax>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::stream::TokenStream;
    use crate::template::testing::lex_and_render;
    use crate::template::token::TokenKind;

    fn lex(source: &str) -> String {
        lex_and_render(&mut TagLexer::new(), source)
    }

    #[test]
    fn test_directive() {
        assert_eq!(
            lex("<%@ page import=\"a.b\" %>"),
            "symbol \"<%@\"\nwhitespace \" \"\ntag-name \"page\"\nwhitespace \" \"\n\
             attribute \"import\"\nsymbol \"=\"\nvalue \"\\\"a.b\\\"\"\nwhitespace \" \"\n\
             symbol \"%>\""
        );
    }

    #[test]
    fn test_custom_tag_self_closing() {
        assert_eq!(
            lex("<tpl:include file='x'/>"),
            "symbol \"<\"\ntag-name \"tpl:include\"\nwhitespace \" \"\nattribute \"file\"\n\
             symbol \"=\"\nvalue \"'x'\"\nsymbol \"/>\""
        );
    }

    #[test]
    fn test_comment_ends_fragment() {
        let source = b"<%-- a - -- b --%>";
        let mut lexer = TagLexer::new();
        lexer.load(None, source, 0, source.len(), true);
        let token = lexer.next_token();
        assert_eq!(token.id, TagToken::Comment.id());
        assert_eq!(token.len, source.len());
        assert_eq!(lexer.store_state().state, TagState::EndOfFragment);
    }

    #[test]
    fn test_unterminated_comment_at_end_is_comment() {
        assert_eq!(lex("<%-- open"), "comment \"<%-- open\"");
    }

    #[test]
    fn test_quotes_of_the_other_kind_are_literal() {
        assert_eq!(
            lex("<x a=\"it's\">"),
            "symbol \"<\"\ntag-name \"x\"\nwhitespace \" \"\nattribute \"a\"\nsymbol \"=\"\n\
             value \"\\\"it's\\\"\"\nsymbol \">\""
        );
    }

    #[test]
    fn test_escape_inside_value() {
        assert_eq!(
            lex("<x a=\"q\\\"\\n\">"),
            "symbol \"<\"\ntag-name \"x\"\nwhitespace \" \"\nattribute \"a\"\nsymbol \"=\"\n\
             value \"\\\"q\\\\\\\"\\\\n\\\"\"\nsymbol \">\""
        );
    }

    #[test]
    fn test_scriptlet_opener_is_rejected() {
        assert_eq!(lex("<%= x"), "error \"<%\"\nerror \"= x\"");
    }

    #[test]
    fn test_error_outside_clears_only_at_closing_symbol_or_newline() {
        assert_eq!(
            lex("<%= <y x%>"),
            "error \"<%\"\nerror \"= <y x\"\nsymbol \"%>\""
        );
        assert_eq!(
            lex("<%? a\n<b>"),
            "error \"<%\"\nerror \"? a\"\nend-of-line \"\\n\"\nsymbol \"<\"\n\
             tag-name \"b\"\nsymbol \">\""
        );
    }

    #[test]
    fn test_error_in_tag_clears_at_newline() {
        assert_eq!(
            lex("<x ?? \ny=\"1\">"),
            "symbol \"<\"\ntag-name \"x\"\nwhitespace \" \"\nerror \"?? \"\nend-of-line \"\\n\"\n\
             attribute \"y\"\nsymbol \"=\"\nvalue \"\\\"1\\\"\"\nsymbol \">\""
        );
    }
}
