//! Placeholder tokenizer with caching
//!
//! Splits template text on `{{ path }}` runs:
//! - Literal runs are kept verbatim (including empty runs at the edges)
//! - Expression runs keep only the trimmed dotted path
//! - Tokenized strings are cached and shared through `Arc`

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// `{{` + at least one character (non-greedy) + `}}`
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.+?)\}\}").expect("placeholder pattern is valid"));

/// Global tokenizer instance
static TOKENIZER: Lazy<Tokenizer> = Lazy::new(Tokenizer::new);

/// Token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Literal,
    Expression,
}

/// Token representing a parsed template fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal text, or the trimmed path of an expression
    pub text: String,
}

impl Token {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Literal,
            text: text.into(),
        }
    }

    pub fn expression(path: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Expression,
            text: path.into(),
        }
    }

    pub fn is_expression(&self) -> bool {
        self.kind == TokenKind::Expression
    }
}

/// Tokenizer with a per-input cache
pub struct Tokenizer {
    cache: DashMap<String, Arc<Vec<Token>>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Parse text into tokens (with caching)
    pub fn tokenize(&self, text: &str) -> Arc<Vec<Token>> {
        if let Some(cached) = self.cache.get(text) {
            return Arc::clone(&cached);
        }

        let tokens = Arc::new(split(text));
        self.cache.insert(text.to_string(), Arc::clone(&tokens));
        tokens
    }

    /// Number of distinct inputs cached
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Split text around placeholder matches, keeping the matches as expressions
fn split(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        tokens.push(Token::literal(&text[last..whole.start()]));
        tokens.push(Token::expression(inner.as_str().trim()));
        last = whole.end();
    }

    tokens.push(Token::literal(&text[last..]));
    tokens
}

/// Tokenize through the global cache
pub fn tokenize(text: &str) -> Arc<Vec<Token>> {
    TOKENIZER.tokenize(text)
}

/// True when the text is a single literal run
pub fn is_static(tokens: &[Token]) -> bool {
    matches!(tokens, [only] if !only.is_expression())
}
