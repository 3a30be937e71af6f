//! Lexing for the tag grammar.
//!
//! Prose is never tokenized: the parser scans it for `<` and `{` directly.
//! Inside a tag, logos does the work; `{...}` islands are skipped with a
//! brace matcher that understands strings and comments.

use crate::ast::Span;
use logos::Logos;

/// Tokens that can appear between `<` and `>`
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TagToken<'src> {
    #[token("/>")]
    SelfClose,

    #[token(">")]
    Close,

    #[token("/")]
    Slash,

    #[token("=")]
    Equals,

    #[token("{")]
    LBrace,

    // Tag and attribute names, including member access (`Tabs.Item`) and
    // namespaces (`xlink:href`, `aria-label`)
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$.:-]*", |lex| lex.slice())]
    Name(&'src str),

    // Quoted attribute values, quotes included
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| lex.slice())]
    Str(&'src str),
}

/// Logos lexer over a bounded window of the source that reports absolute
/// spans and can be repositioned after an expression island.
pub struct TagLexer<'src> {
    source: &'src str,
    base: usize,
    limit: usize,
    inner: logos::Lexer<'src, TagToken<'src>>,
}

impl<'src> TagLexer<'src> {
    pub fn new(source: &'src str, at: usize, limit: usize) -> Self {
        Self {
            source,
            base: at,
            limit,
            inner: TagToken::lexer(&source[at..limit]),
        }
    }

    /// Next token with its absolute span. Lex errors come back as `Err(())`.
    pub fn next_token(&mut self) -> Option<(Result<TagToken<'src>, ()>, Span)> {
        let token = self.inner.next()?;
        let range = self.inner.span();
        Some((
            token,
            Span::new(self.base + range.start, self.base + range.end),
        ))
    }

    /// Restart lexing at an absolute offset
    pub fn reset(&mut self, at: usize) {
        let at = at.min(self.limit);
        self.base = at;
        self.inner = TagToken::lexer(&self.source[at..self.limit]);
    }
}

pub fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$'
}

pub fn is_valid_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if is_name_start(first) => bytes.all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b':' | b'-')
        }),
        _ => false,
    }
}

/// Find the end (exclusive) of the `{...}` island opening at `open`.
///
/// Braces inside string literals, template literals and comments do not
/// count. Returns `None` when the island is not closed before `limit`.
pub fn scan_expression(bytes: &[u8], open: usize, limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;

    while i < limit {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < limit && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= limit {
                    return None;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let close = find(&bytes[i + 2..limit], b"*/")?;
                i += 2 + close + 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < limit && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
