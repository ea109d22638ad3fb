//! Lexical analysis for Asthra.
//!
//! Tokenizes Asthra source into a stream of [`Token`]s:
//!
//! - Keywords and identifiers (`Result`, `Option`, `TaskHandle`, and the
//!   `none`/`void` markers are grammar-level keywords)
//! - Integer literals (decimal, hex, octal, binary, with `_` separators)
//! - Float literals
//! - String and character literals with escape sequences
//! - Operators and punctuation
//! - Comments (line comments skipped, block comments nest)
//!
//! The iterator yields exactly one trailing [`TokenKind::Eof`] token.
//! Unrecognized input becomes [`TokenKind::Error`] tokens so the parser can
//! report them with a span.
//!
//! # Example
//!
//! ```rust
//! use asthrac::{Lexer, TokenKind};
//!
//! let source = "let x: i32 = 42;";
//! let tokens: Vec<_> = Lexer::new(source).collect();
//!
//! assert_eq!(tokens[0].kind, TokenKind::Let);
//! assert_eq!(tokens[1].kind, TokenKind::Ident);
//! assert_eq!(tokens[2].kind, TokenKind::Colon);
//! assert_eq!(tokens[3].kind, TokenKind::Ident);
//! assert_eq!(tokens[4].kind, TokenKind::Eq);
//! assert_eq!(tokens[5].kind, TokenKind::IntLit);
//! assert_eq!(tokens[6].kind, TokenKind::Semi);
//! ```

use crate::span::Span;
use logos::Logos;

/// Token kinds for the Asthra lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // ============================================================
    // Keywords
    // ============================================================
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("as")]
    As,
    #[token("pub")]
    Pub,
    #[token("priv")]
    Priv,
    #[token("fn")]
    Fn,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("extern")]
    Extern,
    #[token("impl")]
    Impl,
    #[token("let")]
    Let,
    #[token("mut")]
    Mut,
    #[token("const")]
    Const,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("match")]
    Match,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("spawn")]
    Spawn,
    #[token("spawn_with_handle")]
    SpawnWithHandle,
    #[token("await")]
    Await,
    #[token("unsafe")]
    Unsafe,
    #[token("self")]
    SelfLower,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("sizeof")]
    Sizeof,

    /// Semantic-clarity marker for empty parameter/argument/element lists.
    #[token("none")]
    NoneKw,
    /// Absent return type; also a hard error inside array literals.
    #[token("void")]
    Void,

    // Built-in generic types are grammar keywords, not plain identifiers.
    #[token("Result")]
    Result,
    #[token("Option")]
    Option,
    #[token("TaskHandle")]
    TaskHandle,

    // ============================================================
    // Literals
    // ============================================================
    /// Integer literal (decimal, hex, octal, or binary).
    #[regex(r"0x[0-9a-fA-F][0-9a-fA-F_]*")]
    #[regex(r"0o[0-7][0-7_]*")]
    #[regex(r"0b[01][01_]*")]
    #[regex(r"[0-9][0-9_]*")]
    IntLit,

    /// Float literal with optional exponent.
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    FloatLit,

    /// String literal.
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLit,

    /// Character literal.
    #[regex(r"'([^'\\]|\\.)'")]
    CharLit,

    // ============================================================
    // Identifiers
    // ============================================================
    /// Identifier. Casing is significant only to the enum-constructor
    /// heuristic, which inspects the text, so one kind covers both cases.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // ============================================================
    // Operators
    // ============================================================
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Not,

    #[token("&")]
    And,
    #[token("|")]
    Or,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,

    #[token("=")]
    Eq,

    // ============================================================
    // Punctuation
    // ============================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("#")]
    Hash,

    // ============================================================
    // Comments
    // ============================================================
    /// Line comment (skipped).
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    /// Block comment (nests, handled by callback).
    #[token("/*", block_comment)]
    BlockComment,

    /// Unclosed block comment (error token).
    UnclosedBlockComment,

    // ============================================================
    // Special
    // ============================================================
    /// End of file marker (added by the Lexer wrapper, not logos).
    Eof,

    /// Lexer error.
    Error,
}

/// Callback for nested block comment parsing.
/// Skips properly closed comments, emits `UnclosedBlockComment` otherwise.
fn block_comment(lexer: &mut logos::Lexer<TokenKind>) -> logos::Filter<TokenKind> {
    let mut depth = 1;
    let remainder = lexer.remainder();

    let mut chars = remainder.chars().peekable();
    let mut consumed = 0;

    while depth > 0 {
        match chars.next() {
            Some('/') if chars.peek() == Some(&'*') => {
                chars.next();
                consumed += 2;
                depth += 1;
            }
            Some('*') if chars.peek() == Some(&'/') => {
                chars.next();
                consumed += 2;
                depth -= 1;
            }
            Some(c) => {
                consumed += c.len_utf8();
            }
            None => {
                lexer.bump(consumed);
                return logos::Filter::Emit(TokenKind::UnclosedBlockComment);
            }
        }
    }

    lexer.bump(consumed);
    logos::Filter::Skip
}

impl TokenKind {
    /// Whether this token kind carries source text worth displaying.
    pub fn has_text(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::StringLit
                | TokenKind::CharLit
                | TokenKind::Ident
        )
    }

    /// The keyword string if this is a keyword token.
    pub fn as_keyword_str(&self) -> Option<&'static str> {
        match self {
            TokenKind::Package => Some("package"),
            TokenKind::Import => Some("import"),
            TokenKind::As => Some("as"),
            TokenKind::Pub => Some("pub"),
            TokenKind::Priv => Some("priv"),
            TokenKind::Fn => Some("fn"),
            TokenKind::Struct => Some("struct"),
            TokenKind::Enum => Some("enum"),
            TokenKind::Extern => Some("extern"),
            TokenKind::Impl => Some("impl"),
            TokenKind::Let => Some("let"),
            TokenKind::Mut => Some("mut"),
            TokenKind::Const => Some("const"),
            TokenKind::If => Some("if"),
            TokenKind::Else => Some("else"),
            TokenKind::For => Some("for"),
            TokenKind::In => Some("in"),
            TokenKind::Match => Some("match"),
            TokenKind::Return => Some("return"),
            TokenKind::Break => Some("break"),
            TokenKind::Continue => Some("continue"),
            TokenKind::Spawn => Some("spawn"),
            TokenKind::SpawnWithHandle => Some("spawn_with_handle"),
            TokenKind::Await => Some("await"),
            TokenKind::Unsafe => Some("unsafe"),
            TokenKind::SelfLower => Some("self"),
            TokenKind::True => Some("true"),
            TokenKind::False => Some("false"),
            TokenKind::Sizeof => Some("sizeof"),
            TokenKind::NoneKw => Some("none"),
            TokenKind::Void => Some("void"),
            TokenKind::Result => Some("Result"),
            TokenKind::Option => Some("Option"),
            TokenKind::TaskHandle => Some("TaskHandle"),
            _ => None,
        }
    }

    /// Human-readable description for diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            TokenKind::Package => "keyword `package`",
            TokenKind::Import => "keyword `import`",
            TokenKind::As => "keyword `as`",
            TokenKind::Pub => "keyword `pub`",
            TokenKind::Priv => "keyword `priv`",
            TokenKind::Fn => "keyword `fn`",
            TokenKind::Struct => "keyword `struct`",
            TokenKind::Enum => "keyword `enum`",
            TokenKind::Extern => "keyword `extern`",
            TokenKind::Impl => "keyword `impl`",
            TokenKind::Let => "keyword `let`",
            TokenKind::Mut => "keyword `mut`",
            TokenKind::Const => "keyword `const`",
            TokenKind::If => "keyword `if`",
            TokenKind::Else => "keyword `else`",
            TokenKind::For => "keyword `for`",
            TokenKind::In => "keyword `in`",
            TokenKind::Match => "keyword `match`",
            TokenKind::Return => "keyword `return`",
            TokenKind::Break => "keyword `break`",
            TokenKind::Continue => "keyword `continue`",
            TokenKind::Spawn => "keyword `spawn`",
            TokenKind::SpawnWithHandle => "keyword `spawn_with_handle`",
            TokenKind::Await => "keyword `await`",
            TokenKind::Unsafe => "keyword `unsafe`",
            TokenKind::SelfLower => "keyword `self`",
            TokenKind::True => "keyword `true`",
            TokenKind::False => "keyword `false`",
            TokenKind::Sizeof => "keyword `sizeof`",
            TokenKind::NoneKw => "keyword `none`",
            TokenKind::Void => "keyword `void`",
            TokenKind::Result => "keyword `Result`",
            TokenKind::Option => "keyword `Option`",
            TokenKind::TaskHandle => "keyword `TaskHandle`",
            TokenKind::IntLit => "integer literal",
            TokenKind::FloatLit => "float literal",
            TokenKind::StringLit => "string literal",
            TokenKind::CharLit => "character literal",
            TokenKind::Ident => "identifier",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Not => "`!`",
            TokenKind::And => "`&`",
            TokenKind::Or => "`|`",
            TokenKind::Caret => "`^`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::Eq => "`=`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semi => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::ColonColon => "`::`",
            TokenKind::Dot => "`.`",
            TokenKind::Arrow => "`->`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::Hash => "`#`",
            TokenKind::LineComment => "line comment",
            TokenKind::BlockComment => "block comment",
            TokenKind::UnclosedBlockComment => "unclosed block comment",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "error",
        }
    }

    /// Whether this token can start an expression.
    pub fn can_start_expr(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::StringLit
                | TokenKind::CharLit
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Ident
                | TokenKind::SelfLower
                | TokenKind::Result
                | TokenKind::Option
                | TokenKind::TaskHandle
                | TokenKind::Sizeof
                | TokenKind::Await
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Not
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::And
        )
    }

    /// Whether this token can start a top-level declaration.
    pub fn starts_declaration(&self) -> bool {
        matches!(
            self,
            TokenKind::Pub
                | TokenKind::Priv
                | TokenKind::Fn
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Extern
                | TokenKind::Const
                | TokenKind::Impl
                | TokenKind::Hash
        )
    }
}

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn dummy(kind: TokenKind) -> Self {
        Self {
            kind,
            span: Span::dummy(),
        }
    }
}

/// The lexer for Asthra source code.
#[derive(Clone)]
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    /// Precomputed line index for O(log n) line/column lookup.
    line_index: crate::span::LineIndex,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            line_index: crate::span::LineIndex::new(source),
            finished: false,
        }
    }

    /// Get the source text for a span.
    pub fn slice(&self, span: &Span) -> &'src str {
        &self.source[span.start..span.end]
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let logos_span = self.inner.span();
                let (line, col) = self.line_index.line_col(logos_span.start);
                let span = Span::new(logos_span.start, logos_span.end, line, col);
                Some(Token::new(kind, span))
            }
            Some(Err(())) => {
                let logos_span = self.inner.span();
                let (line, col) = self.line_index.line_col(logos_span.start);
                let span = Span::new(logos_span.start, logos_span.end, line, col);
                Some(Token::new(TokenKind::Error, span))
            }
            None => {
                self.finished = true;
                // Return EOF token once, then None
                let span = Span::new(self.source.len(), self.source.len(), 0, 0);
                Some(Token::new(TokenKind::Eof, span))
            }
        }
    }
}
