//! Drivers and renderers for exercising token streams
//!
//!     The drivers own the caller side of the resumption contract: they feed a buffer to a
//!     [TokenStream] one window at a time, hand the stored state from one window to the
//!     next and keep track of each token's position.
//!
//!     Rendering turns a token sequence into one `name "text"` line per token, which is the
//!     format every lexer test in the crate asserts against:
//!
//!         symbol "<"
//!         tag-name "a"
//!         end-of-line "\n"
//!
//! Chunk Independence
//!
//!     Every lexer must produce the same tokens no matter how the input is cut into
//!     windows. [tokenize_split] takes arbitrary cut points so tests can compare any split
//!     against [tokenize_whole].

use crate::template::config::LexerConfig;
use crate::template::create_lexer_with;
use crate::template::error::LexerError;
use crate::template::stream::TokenStream;
use crate::template::token::Token;
use std::ops::Range;

/// A token together with the bytes it covers.
pub type Spanned = (Token, Range<usize>);

/// Lexes `source` in a single final window.
pub fn tokenize_whole<'a, L: TokenStream<'a>>(lexer: &mut L, source: &'a [u8]) -> Vec<Spanned> {
    tokenize_split(lexer, source, &[])
}

/// Lexes `source` in windows of `chunk_size` bytes.
///
/// Panics if `chunk_size` is zero.
pub fn tokenize_chunked<'a, L: TokenStream<'a>>(
    lexer: &mut L,
    source: &'a [u8],
    chunk_size: usize,
) -> Vec<Spanned> {
    assert!(chunk_size > 0, "chunk size must be positive");
    let cuts: Vec<usize> = (chunk_size..source.len()).step_by(chunk_size).collect();
    tokenize_split(lexer, source, &cuts)
}

/// Lexes `source` with a lexer built from `config`, in windows of its `chunk_size`.
pub fn tokenize_with(config: &LexerConfig, source: &[u8]) -> Result<Vec<Spanned>, LexerError> {
    let mut lexer = create_lexer_with(config)?;
    Ok(tokenize_chunked(&mut lexer, source, config.lexer.chunk_size))
}

/// Lexes `source` with a window boundary at every offset in `cuts`.
///
/// Cuts outside `1..source.len()` and duplicates are ignored.
pub fn tokenize_split<'a, L: TokenStream<'a>>(
    lexer: &mut L,
    source: &'a [u8],
    cuts: &[usize],
) -> Vec<Spanned> {
    let mut bounds: Vec<usize> = cuts
        .iter()
        .copied()
        .filter(|&cut| cut > 0 && cut < source.len())
        .collect();
    bounds.sort_unstable();
    bounds.dedup();
    bounds.push(source.len());

    let mut tokens = Vec::new();
    let mut state = None;
    let mut cursor = 0;
    let mut window_start = 0;
    for end in bounds {
        lexer.load(
            state.as_ref(),
            source,
            window_start,
            end - window_start,
            end == source.len(),
        );
        loop {
            let token = lexer.next_token();
            if token.is_end_of_chunk() {
                break;
            }
            tokens.push((token, cursor..cursor + token.len));
            cursor += token.len;
        }
        state = Some(lexer.store_state());
        window_start = end;
    }
    tokens
}

/// One `name "text"` line per token.
pub fn render<'a, L: TokenStream<'a>>(lexer: &L, source: &[u8], tokens: &[Spanned]) -> String {
    tokens
        .iter()
        .map(|(token, range)| {
            let name = lexer.token_name(token.id).unwrap_or("?");
            let text = String::from_utf8_lossy(&source[range.clone()]);
            format!("{name} {text:?}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lexes `source` in one window and renders the result.
pub fn lex_and_render<'a, L: TokenStream<'a>>(lexer: &mut L, source: &'a str) -> String {
    let tokens = tokenize_whole(lexer, source.as_bytes());
    render(lexer, source.as_bytes(), &tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::lexers::HostLexer;

    #[test]
    fn test_positions_are_contiguous() {
        let source = b"a <b>\nc";
        let tokens = tokenize_chunked(&mut HostLexer::new(), source, 2);
        let mut cursor = 0;
        for (token, range) in &tokens {
            assert_eq!(range.start, cursor);
            assert_eq!(range.len(), token.len);
            cursor = range.end;
        }
        assert_eq!(cursor, source.len());
    }

    #[test]
    fn test_empty_source() {
        assert!(tokenize_whole(&mut HostLexer::new(), b"").is_empty());
    }

    #[test]
    fn test_cuts_are_normalized() {
        let source = b"<a>";
        let whole = tokenize_whole(&mut HostLexer::new(), source);
        let split = tokenize_split(&mut HostLexer::new(), source, &[9, 2, 0, 2, 1]);
        assert_eq!(whole, split);
    }

    #[test]
    fn test_configured_chunk_size_is_used() {
        let source = b"<p>a <%= b %></p>\n";
        let mut config = crate::template::config::load_defaults().expect("defaults");
        config.lexer.chunk_size = 3;
        let configured = tokenize_with(&config, source).expect("valid config");
        let mut lexer = create_lexer_with(&config).expect("lexer to build");
        assert_eq!(configured, tokenize_chunked(&mut lexer, source, 3));
        let mut lexer = create_lexer_with(&config).expect("lexer to build");
        assert_eq!(configured, tokenize_whole(&mut lexer, source));
    }

    #[test]
    fn test_zero_configured_chunk_size_is_an_error() {
        let mut config = crate::template::config::load_defaults().expect("defaults");
        config.lexer.chunk_size = 0;
        assert!(matches!(
            tokenize_with(&config, b"x"),
            Err(LexerError::ZeroChunkSize)
        ));
    }

    #[test]
    #[should_panic(expected = "chunk size")]
    fn test_zero_chunk_size_panics() {
        tokenize_chunked(&mut HostLexer::new(), b"x", 0);
    }
}
