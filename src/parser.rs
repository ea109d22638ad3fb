//! Parser for Asthra.
//!
//! This module implements a hand-written recursive descent parser with
//! precedence climbing for expressions. The parser produces one [`Program`]
//! per source file.
//!
//! # Parser Architecture
//!
//! The parser is organized into several submodules:
//!
//! - `expr` - Expression parsing with precedence climbing
//! - `stmt` - Statement and block parsing
//! - `item` - Declaration parsing (functions, structs, enums, etc.)
//! - `pattern` - Pattern parsing for match arms and if-let
//! - `types` - Type expression parsing
//! - `annotations` - `#[...]` annotation parsing and validation
//!
//! # Example
//!
//! ```rust
//! use asthrac::Parser;
//! use asthrac::ast::Declaration;
//!
//! let source = r#"
//! package math;
//!
//! pub fn add(a: i32, b: i32) -> i32 {
//!     return a + b;
//! }
//! "#;
//! let mut parser = Parser::new(source);
//!
//! let program = parser.parse_program().expect("parse failed");
//! assert_eq!(program.declarations.len(), 1);
//!
//! match &program.declarations[0] {
//!     Declaration::Function(f) => {
//!         assert_eq!(f.params.len(), 2);
//!     }
//!     _ => panic!("expected function"),
//! }
//! ```
//!
//! # Error Recovery
//!
//! The parser implements panic-mode error recovery. When an error is
//! encountered, it enters "panic mode" and skips tokens until it finds
//! a synchronization point (a semicolon or a keyword that starts a new
//! statement or declaration). Productions report through the shared
//! diagnostic collector and return a placeholder node, so a single parse
//! can surface every syntax error in the file.

mod annotations;
mod expr;
mod item;
mod pattern;
mod stmt;
mod types;


use crate::ast::*;
use crate::diagnostics::{Diagnostic, ErrorCode, ParseError};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::span::{Span, Spanned};
use string_interner::DefaultStringInterner;

pub use self::expr::Precedence;

/// Format a list of expected items in natural English.
///
/// - Empty list: ""
/// - Single item: "X"
/// - Two items: "X or Y"
/// - Multiple items: "X, Y, or Z"
fn format_expected_list(items: &[&str]) -> String {
    match items.len() {
        0 => String::new(),
        1 => items[0].to_string(),
        2 => format!("{} or {}", items[0], items[1]),
        _ => {
            // Safe: we're in the _ arm so items.len() >= 3, meaning split_last() returns Some
            let (last, rest) = items
                .split_last()
                .expect("BUG: items.len() >= 3 but split_last() returned None");
            format!("{}, or {}", rest.join(", "), last)
        }
    }
}

/// The Asthra parser.
pub struct Parser<'src> {
    /// The lexer producing tokens.
    lexer: Lexer<'src>,
    /// The source text (for extracting lexemes).
    source: &'src str,
    /// String interner for symbols.
    interner: DefaultStringInterner,
    /// Current token.
    current: Token,
    /// Next token (for one-token lookahead).
    next: Token,
    /// Previous token.
    previous: Token,
    /// Accumulated errors.
    errors: Vec<Diagnostic>,
    /// Whether we're in panic mode (error recovery).
    panic_mode: bool,
    /// Pending `>` token from splitting `>>` in type argument contexts.
    /// When we consume a `>` from `>>`, we set this to the span of the
    /// second `>`.
    pending_gt: Option<Span>,
}

/// A saved parser position for speculative parsing.
///
/// Snapshots are immutable: taking one never changes parser state, and
/// restoring one rewinds the token cursor, the diagnostic count, and the
/// pending `>` so a failed speculation leaves no trace.
struct ParserSnapshot<'src> {
    lexer: Lexer<'src>,
    current: Token,
    next: Token,
    previous: Token,
    error_count: usize,
    panic_mode: bool,
    pending_gt: Option<Span>,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(source: &'src str) -> Self {
        Self::with_interner(source, DefaultStringInterner::new())
    }

    /// Create a parser with an existing string interner.
    ///
    /// This is useful for parsing several files of one package while
    /// sharing a single symbol table.
    pub fn with_interner(source: &'src str, interner: DefaultStringInterner) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next().unwrap_or(Token::dummy(TokenKind::Error));
        let next = lexer.next().unwrap_or(Token::dummy(TokenKind::Eof));

        Self {
            lexer,
            source,
            interner,
            current,
            next,
            previous: Token::dummy(TokenKind::Error),
            errors: Vec::new(),
            panic_mode: false,
            pending_gt: None,
        }
    }

    /// Parse a complete program.
    ///
    /// Returns the parsed program, or every diagnostic collected while
    /// recovering if any syntax error occurred.
    #[must_use = "parsing has no effect if the result is not used"]
    pub fn parse_program(&mut self) -> Result<Program, Vec<Diagnostic>> {
        let start = self.current.span;

        // The package declaration is mandatory and must come first.
        let package = self.parse_package_decl();

        let mut imports = Vec::new();
        while self.check(TokenKind::Import) {
            imports.push(self.parse_import_decl());
        }

        let mut declarations = Vec::new();
        while !self.is_at_end() {
            if self.check(TokenKind::Import) {
                self.error_at_current(
                    "import declarations must appear before all other declarations",
                    ErrorCode::UnexpectedToken,
                );
                self.synchronize();
                continue;
            }
            if let Some(decl) = self.parse_declaration() {
                declarations.push(decl);
            }
        }

        if self.errors.is_empty() {
            let end = self.previous.span;
            Ok(Program {
                package,
                imports,
                declarations,
                span: start.merge(end),
            })
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    // ============================================================
    // Token handling
    // ============================================================

    /// Check if the current token matches the given kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Check if the next token (lookahead) matches the given kind.
    fn check_next(&self, kind: TokenKind) -> bool {
        self.next.kind == kind
    }

    /// Check if we've reached the end of input.
    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// Advance to the next token, returning the previous.
    fn advance(&mut self) -> Token {
        self.previous = self.current.clone();

        // Don't advance past EOF
        if self.current.kind == TokenKind::Eof {
            return self.previous.clone();
        }

        // Shift: current <- next, next <- lexer.next()
        self.current = self.next.clone();

        loop {
            self.next = self.lexer.next().unwrap_or_else(|| {
                Token::new(
                    TokenKind::Eof,
                    Span::new(self.source.len(), self.source.len(), 0, 0),
                )
            });

            // Report lexer error tokens here so the rest of the parser
            // never sees them.
            match self.next.kind {
                TokenKind::Error => {
                    self.error_at(
                        self.next.span,
                        "unexpected character",
                        ErrorCode::UnexpectedCharacter,
                    );
                }
                TokenKind::UnclosedBlockComment => {
                    self.error_hard(ParseError::UnclosedBlockComment {
                        span: self.next.span,
                    });
                }
                _ => break,
            }
        }
        self.previous.clone()
    }

    /// Consume a token of the expected kind, or error.
    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error_expected(kind.description());
            None
        }
    }

    /// Try to consume a token of the expected kind.
    fn try_consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume an identifier and intern it, describing the position in the
    /// error message otherwise.
    fn expect_ident(&mut self, what: &str) -> Option<Spanned<Symbol>> {
        if self.check(TokenKind::Ident) {
            self.advance();
            Some(self.spanned_symbol())
        } else {
            let found = self.current.kind.description();
            self.error_at_current(
                &format!("expected {what}, found {found}"),
                ErrorCode::ExpectedIdentifier,
            );
            None
        }
    }

    /// Get the text of a span.
    fn text(&self, span: &Span) -> &'src str {
        &self.source[span.start..span.end]
    }

    /// Get the text of the current token.
    fn current_text(&self) -> &'src str {
        self.text(&self.current.span)
    }

    /// Intern a string and return its symbol.
    fn intern(&mut self, s: &str) -> Symbol {
        self.interner.get_or_intern(s)
    }

    /// Take ownership of the string interner.
    pub fn take_interner(&mut self) -> DefaultStringInterner {
        std::mem::take(&mut self.interner)
    }

    /// Check if there are any parsing errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of any accumulated errors.
    pub fn take_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.errors)
    }

    /// Create a spanned symbol from the previous token.
    fn spanned_symbol(&mut self) -> Spanned<Symbol> {
        let text = self.text(&self.previous.span);
        let symbol = self.intern(text);
        Spanned::new(symbol, self.previous.span)
    }

    // ============================================================
    // Speculative parsing
    // ============================================================

    /// Take an immutable snapshot of the parser position.
    fn snapshot(&self) -> ParserSnapshot<'src> {
        ParserSnapshot {
            lexer: self.lexer.clone(),
            current: self.current.clone(),
            next: self.next.clone(),
            previous: self.previous.clone(),
            error_count: self.errors.len(),
            panic_mode: self.panic_mode,
            pending_gt: self.pending_gt,
        }
    }

    /// Rewind to a previously taken snapshot, dropping any diagnostics
    /// reported since.
    fn restore(&mut self, snapshot: ParserSnapshot<'src>) {
        self.lexer = snapshot.lexer;
        self.current = snapshot.current;
        self.next = snapshot.next;
        self.previous = snapshot.previous;
        self.errors.truncate(snapshot.error_count);
        self.panic_mode = snapshot.panic_mode;
        self.pending_gt = snapshot.pending_gt;
    }

    /// Run a speculative parse. If the closure returns `None`, the parser
    /// rewinds to where it was and reports nothing; on `Some` the consumed
    /// tokens and any diagnostics stay committed.
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let snapshot = self.snapshot();
        match f(self) {
            Some(value) => Some(value),
            None => {
                self.restore(snapshot);
                None
            }
        }
    }

    // ============================================================
    // Type argument `>` handling (for `>>` disambiguation)
    // ============================================================

    /// Check if we're at a closing angle bracket for type arguments.
    /// This handles `>`, `>>`, and `>=`, as well as a pending `>` from a
    /// previous split.
    fn check_closing_angle(&self) -> bool {
        if self.pending_gt.is_some() {
            return true;
        }
        matches!(
            self.current.kind,
            TokenKind::Gt | TokenKind::Shr | TokenKind::GtEq
        )
    }

    /// Consume a single `>` for closing type arguments.
    /// If the current token is `>>`, this splits it and leaves a pending `>`.
    /// If the current token is `>=`, this splits it and converts current to `=`.
    /// Returns the span of the consumed `>`.
    fn consume_closing_angle(&mut self) -> Option<Span> {
        // First check for pending `>` from a previous split
        if let Some(span) = self.pending_gt.take() {
            self.previous = Token::new(TokenKind::Gt, span);
            return Some(span);
        }

        match self.current.kind {
            TokenKind::Gt => {
                let span = self.current.span;
                self.advance();
                Some(span)
            }
            TokenKind::Shr => {
                // `>>` - consume first `>`, leave second as pending
                let full_span = self.current.span;
                let first_span = Span::new(
                    full_span.start,
                    full_span.start + 1,
                    full_span.start_line,
                    full_span.start_col,
                );
                let second_span = Span::new(
                    full_span.start + 1,
                    full_span.end,
                    full_span.start_line,
                    full_span.start_col + 1,
                );
                self.pending_gt = Some(second_span);
                self.previous = Token::new(TokenKind::Gt, first_span);
                // Advance past the `>>` token
                self.current = self.next.clone();
                self.next = self.lexer.next().unwrap_or_else(|| {
                    Token::new(
                        TokenKind::Eof,
                        Span::new(self.source.len(), self.source.len(), 0, 0),
                    )
                });
                Some(first_span)
            }
            TokenKind::GtEq => {
                // `>=` in type context - consume `>`, convert current to `=`
                let full_span = self.current.span;
                let gt_span = Span::new(
                    full_span.start,
                    full_span.start + 1,
                    full_span.start_line,
                    full_span.start_col,
                );
                let eq_span = Span::new(
                    full_span.start + 1,
                    full_span.end,
                    full_span.start_line,
                    full_span.start_col + 1,
                );
                self.previous = Token::new(TokenKind::Gt, gt_span);
                self.current = Token::new(TokenKind::Eq, eq_span);
                Some(gt_span)
            }
            _ => {
                self.error_expected("`>`");
                None
            }
        }
    }

    /// Expect a closing angle bracket `>` for type arguments.
    /// This is like `expect(TokenKind::Gt)` but handles `>>` splitting.
    fn expect_closing_angle(&mut self) -> Option<Span> {
        if self.check_closing_angle() {
            self.consume_closing_angle()
        } else {
            self.error_expected("`>`");
            None
        }
    }

    // ============================================================
    // Error handling
    // ============================================================

    fn error_at_current(&mut self, message: &str, code: ErrorCode) {
        self.error_at(self.current.span, message, code);
    }

    fn error_at(&mut self, span: Span, message: &str, code: ErrorCode) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors
            .push(Diagnostic::error(message, span).with_error_code(code));
    }

    /// Report an error with an attached suggestion.
    fn error_at_with_help(&mut self, span: Span, message: &str, code: ErrorCode, help: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors.push(
            Diagnostic::error(message, span)
                .with_error_code(code)
                .with_suggestion(help),
        );
    }

    /// Report a hard failure that has a dedicated [`ParseError`] variant.
    fn error_hard(&mut self, err: ParseError) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors.push(err.into());
    }

    fn error_expected(&mut self, expected: &str) {
        let found = self.current.kind.description();
        let message = format!("expected {}, found {}", expected, found);
        let code = if self.is_at_end() {
            ErrorCode::UnexpectedEof
        } else {
            ErrorCode::UnexpectedToken
        };
        self.error_at_current(&message, code);
    }

    /// Report an error expecting one of several things.
    fn error_expected_one_of(&mut self, expected: &[&str]) {
        let found = self.current.kind.description();
        let expected_msg = format_expected_list(expected);
        let message = format!("expected {}, found {}", expected_msg, found);
        let code = if self.is_at_end() {
            ErrorCode::UnexpectedEof
        } else {
            ErrorCode::UnexpectedToken
        };
        self.error_at_current(&message, code);
    }

    /// Synchronize after an error by skipping to a recovery point.
    ///
    /// A recovery point is either:
    /// 1. A keyword that starts a new top-level declaration
    /// 2. EOF
    ///
    /// The synchronization logic skips tokens until it finds a valid
    /// recovery point, skipping over whole brace blocks so it never gets
    /// stuck inside function bodies.
    fn synchronize(&mut self) {
        self.panic_mode = false;

        while !self.is_at_end() {
            if self.current.kind.starts_declaration() {
                return;
            }
            match self.current.kind {
                // Skip entire blocks so recovery lands between declarations
                TokenKind::LBrace => {
                    self.advance();
                    self.skip_to_closing(TokenKind::RBrace);
                    if self.check(TokenKind::RBrace) {
                        self.advance();
                    }
                    continue;
                }
                // Skip closing delimiters to avoid infinite loops
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            self.advance();
        }
    }

    /// Skip tokens until we find a closing delimiter, handling nested
    /// delimiters. Returns true if the closing delimiter was found.
    fn skip_to_closing(&mut self, closing: TokenKind) -> bool {
        let opening = match closing {
            TokenKind::RParen => TokenKind::LParen,
            TokenKind::RBracket => TokenKind::LBracket,
            TokenKind::RBrace => TokenKind::LBrace,
            _ => return false,
        };

        let mut depth = 1;
        while !self.is_at_end() && depth > 0 {
            if self.current.kind == opening {
                depth += 1;
            } else if self.current.kind == closing {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
            self.advance();
        }
        false
    }

    /// Synchronize within a block after a statement-level error.
    /// Skips to a semicolon (consumed), the start of a new statement, or a
    /// closing delimiter.
    fn synchronize_stmt(&mut self) {
        self.panic_mode = false;

        while !self.is_at_end() {
            match self.current.kind {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    return;
                }
                TokenKind::Let
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::For
                | TokenKind::Match
                | TokenKind::Spawn
                | TokenKind::SpawnWithHandle
                | TokenKind::Unsafe
                | TokenKind::Break
                | TokenKind::Continue => {
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ============================================================
    // Package and import parsing
    // ============================================================

    /// Parse the mandatory `package name;` header.
    fn parse_package_decl(&mut self) -> PackageDecl {
        let start = self.current.span;

        if !self.try_consume(TokenKind::Package) {
            self.error_at(
                start,
                "expected `package` declaration",
                ErrorCode::MissingPackageDecl,
            );
            let name = self.intern("");
            return PackageDecl {
                name: Spanned::new(name, start),
                span: start,
            };
        }

        let name = match self.expect_ident("package name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.previous.span),
        };
        self.expect(TokenKind::Semi);

        PackageDecl {
            name,
            span: start.merge(self.previous.span),
        }
    }

    /// Parse `import "path";` or `import "path" as alias;`.
    fn parse_import_decl(&mut self) -> ImportDecl {
        let start = self.current.span;
        self.advance(); // consume 'import'

        let path = if self.check(TokenKind::StringLit) {
            let span = self.current.span;
            let text = self.text(&span);
            let decoded = self.parse_string_literal(text, span);
            self.advance();
            Spanned::new(decoded, span)
        } else {
            self.error_expected("import path string");
            Spanned::new(String::new(), self.current.span)
        };

        let alias = if self.try_consume(TokenKind::As) {
            self.expect_ident("import alias")
        } else {
            None
        };

        self.expect(TokenKind::Semi);

        ImportDecl {
            path,
            alias,
            span: start.merge(self.previous.span),
        }
    }

    // ============================================================
    // Visibility
    // ============================================================

    /// Parse an optional `pub` or `priv` modifier. Omitted means private.
    fn parse_visibility(&mut self) -> Visibility {
        if self.try_consume(TokenKind::Pub) {
            Visibility::Public
        } else if self.try_consume(TokenKind::Priv) {
            Visibility::Private
        } else {
            Visibility::Private
        }
    }

    // ============================================================
    // Literal parsing
    // ============================================================

    fn parse_literal(&mut self) -> Literal {
        let span = self.current.span;
        let text = self.text(&span);

        let kind = match self.current.kind {
            TokenKind::IntLit => LiteralKind::Int(self.parse_int_literal(text, span)),
            TokenKind::FloatLit => LiteralKind::Float(self.parse_float_literal(text, span).into()),
            TokenKind::StringLit => {
                let s = self.parse_string_literal(text, span);
                LiteralKind::String(s)
            }
            TokenKind::CharLit => {
                let c = self.parse_char_literal(text, span);
                LiteralKind::Char(c)
            }
            TokenKind::True => LiteralKind::Bool(true),
            TokenKind::False => LiteralKind::Bool(false),
            _ => {
                self.error_expected("literal");
                LiteralKind::Int(0)
            }
        };

        self.advance();
        Literal { kind, span }
    }

    fn parse_int_literal(&mut self, text: &str, span: Span) -> i64 {
        let text = text.replace('_', "");

        let result = if let Some(hex) = text.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else if let Some(oct) = text.strip_prefix("0o") {
            i64::from_str_radix(oct, 8)
        } else if let Some(bin) = text.strip_prefix("0b") {
            i64::from_str_radix(bin, 2)
        } else {
            text.parse()
        };

        match result {
            Ok(value) => value,
            Err(_) => {
                // The lexer only accepts valid digits, so the sole failure
                // mode is overflow.
                self.error_at(
                    span,
                    "integer literal out of range for i64",
                    ErrorCode::InvalidInteger,
                );
                0
            }
        }
    }

    fn parse_float_literal(&mut self, text: &str, span: Span) -> f64 {
        let text = text.replace('_', "");
        match text.parse() {
            Ok(value) => value,
            Err(_) => {
                self.error_hard(ParseError::InvalidFloat { span });
                0.0
            }
        }
    }

    fn parse_string_literal(&mut self, text: &str, span: Span) -> String {
        // Remove quotes and process escape sequences
        let inner = &text[1..text.len() - 1];
        let mut result = String::new();
        let mut chars = inner.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => result.push('\n'),
                    Some('r') => result.push('\r'),
                    Some('t') => result.push('\t'),
                    Some('\\') => result.push('\\'),
                    Some('\'') => result.push('\''),
                    Some('"') => result.push('"'),
                    Some('0') => result.push('\0'),
                    Some('x') => {
                        // Hex escape \xNN
                        let mut hex = String::new();
                        for _ in 0..2 {
                            if let Some(h) = chars.next() {
                                hex.push(h);
                            }
                        }
                        if let Ok(n) = u8::from_str_radix(&hex, 16) {
                            result.push(n as char);
                        }
                    }
                    Some('u') => {
                        // Unicode escape \u{NNNN}
                        if chars.next() == Some('{') {
                            let mut hex = String::new();
                            while let Some(&c) = chars.peek() {
                                if c == '}' {
                                    chars.next();
                                    break;
                                }
                                // Safe: we just peeked Some(&c)
                                hex.push(
                                    chars
                                        .next()
                                        .expect("BUG: peek() returned Some but next() was None"),
                                );
                            }
                            if let Ok(n) = u32::from_str_radix(&hex, 16) {
                                if let Some(c) = char::from_u32(n) {
                                    result.push(c);
                                }
                            }
                        }
                    }
                    Some(c) => {
                        // Escape errors don't enter panic mode; the literal
                        // is still usable for further analysis.
                        self.errors.push(
                            Diagnostic::error(format!("unknown escape sequence `\\{c}`"), span)
                                .with_error_code(ErrorCode::InvalidEscape),
                        );
                        result.push(c);
                    }
                    None => {}
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    fn parse_char_literal(&mut self, text: &str, span: Span) -> char {
        let inner = &text[1..text.len() - 1];
        let mut chars = inner.chars();

        match chars.next() {
            Some('\\') => match chars.next() {
                Some('n') => '\n',
                Some('r') => '\r',
                Some('t') => '\t',
                Some('\\') => '\\',
                Some('\'') => '\'',
                Some('"') => '"',
                Some('0') => '\0',
                Some('x') => {
                    let mut hex = String::new();
                    for _ in 0..2 {
                        if let Some(h) = chars.next() {
                            hex.push(h);
                        }
                    }
                    if let Ok(n) = u8::from_str_radix(&hex, 16) {
                        n as char
                    } else {
                        '\0'
                    }
                }
                Some('u') => {
                    if chars.next() == Some('{') {
                        let mut hex = String::new();
                        for c in chars {
                            if c == '}' {
                                break;
                            }
                            hex.push(c);
                        }
                        if let Ok(n) = u32::from_str_radix(&hex, 16) {
                            char::from_u32(n).unwrap_or('\0')
                        } else {
                            '\0'
                        }
                    } else {
                        '\0'
                    }
                }
                Some(c) => {
                    self.errors.push(
                        Diagnostic::error(format!("unknown escape sequence `\\{c}`"), span)
                            .with_error_code(ErrorCode::InvalidEscape),
                    );
                    c
                }
                None => '\0',
            },
            Some(c) => c,
            None => '\0',
        }
    }
}
