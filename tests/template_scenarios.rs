//! End-to-end lexing of template pages through the public entry points.

use lex_template::template::testing::{lex_and_render, tokenize_chunked, tokenize_whole};
use lex_template::template::{create_lexer, create_lexer_with, LanguageVariant, Loader, NestMode};
use rstest::rstest;

const PAGE: &str = "<%@ page %>\n<p>Hi <%= name %>!</p>\n";

fn render_page(source: &str) -> String {
    lex_and_render(&mut create_lexer(LanguageVariant::Page), source)
}

#[test]
fn test_page_snapshot() {
    insta::assert_snapshot!(render_page(PAGE), @r###"
    tag-symbol "<%@"
    tag-whitespace " "
    tag-tag-name "page"
    tag-whitespace " "
    tag-symbol "%>"
    end-of-line "\n"
    symbol "<"
    tag-name "p"
    symbol ">"
    text "Hi "
    script-delimiter "<%="
    script-whitespace " "
    identifier "name"
    script-whitespace " "
    script-delimiter "%>"
    text "!"
    symbol "</"
    tag-name "p"
    symbol ">"
    end-of-line "\n"
    "###);
}

#[rstest]
#[case::plain_markup("plain <a href=\"x\">text", "text \"plain \"\nsymbol \"<\"\ntag-name \"a\"\nwhitespace \" \"\nattribute \"href\"\nsymbol \"=\"\nvalue \"\\\"x\\\"\"\nsymbol \">\"\ntext \"text\"")]
#[case::unterminated_comment("<!-- unterminated comment", "comment \"<!-- unterminated comment\"")]
#[case::char_ref("a&amp;b", "text \"a\"\nchar-ref \"&amp;\"\ntext \"b\"")]
#[case::declaration("<!DOCTYPE html>", "declaration \"<!DOCTYPE html>\"")]
#[case::closing_custom_tag("</tpl:each>", "tag-symbol \"</\"\ntag-tag-name \"tpl:each\"\ntag-symbol \">\"")]
#[case::declaration_scriptlet("<%! int n; %>", "script-delimiter \"<%!\"\nscript-whitespace \" \"\nkeyword \"int\"\nscript-whitespace \" \"\nidentifier \"n\"\nseparator \";\"\nscript-whitespace \" \"\nscript-delimiter \"%>\"")]
#[case::trimmed_scriptlet("<%- x %>", "script-delimiter \"<%\"\noperator \"-\"\nscript-whitespace \" \"\nidentifier \"x\"\nscript-whitespace \" \"\nscript-delimiter \"%>\"")]
#[case::partial_prefix_at_end("<tp", "symbol \"<\"\ntag-name \"tp\"")]
#[case::script_across_lines("<% a\nb %>", "script-delimiter \"<%\"\nscript-whitespace \" \"\nidentifier \"a\"\nend-of-line \"\\n\"\nidentifier \"b\"\nscript-whitespace \" \"\nscript-delimiter \"%>\"")]
fn test_rendered_tokens(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(render_page(source), expected);
}

#[rstest]
fn test_chunk_sizes_agree(#[values(1, 2, 3, 5, 8, 13)] chunk_size: usize) {
    let whole = tokenize_whole(&mut create_lexer(LanguageVariant::Page), PAGE.as_bytes());
    let chunked = tokenize_chunked(
        &mut create_lexer(LanguageVariant::Page),
        PAGE.as_bytes(),
        chunk_size,
    );
    assert_eq!(whole, chunked);
}

#[test]
fn test_markup_variant_from_config() {
    let config = Loader::new()
        .set_override("lexer.variant", "markup")
        .expect("override to apply")
        .build()
        .expect("config to build");
    let mut lexer = create_lexer_with(&config).expect("lexer to build");
    assert_eq!(
        lex_and_render(&mut lexer, "<%= x %>"),
        "error \"<\"\ntext \"%= x %>\""
    );
    assert_eq!(lexer.mode(), NestMode::Host);
}

#[test]
fn test_configured_tag_prefixes() {
    let config = Loader::new()
        .set_override("lexer.tag_prefixes", vec!["ui", "c"])
        .expect("override to apply")
        .build()
        .expect("config to build");
    let mut lexer = create_lexer_with(&config).expect("lexer to build");
    assert_eq!(
        lex_and_render(&mut lexer, "<c:if/><tpl:x/>"),
        "tag-symbol \"<\"\ntag-tag-name \"c:if\"\ntag-symbol \"/>\"\n\
         symbol \"<\"\ntag-name \"tpl:x\"\nsymbol \"/>\""
    );
}

#[test]
fn test_long_configured_tag_prefix() {
    let prefix = "p".repeat(300);
    let config = Loader::new()
        .set_override("lexer.tag_prefixes", vec![prefix.as_str()])
        .expect("override to apply")
        .build()
        .expect("config to build");
    let source = format!("<{prefix}:x/>");
    let mut lexer = create_lexer_with(&config).expect("lexer to build");
    assert_eq!(
        lex_and_render(&mut lexer, &source),
        format!("tag-symbol \"<\"\ntag-tag-name \"{prefix}:x\"\ntag-symbol \"/>\"")
    );
    assert_eq!(lexer.mode(), NestMode::Host);
}
