//! Diagnostic reporting infrastructure.
//!
//! Structured errors and warnings with source locations, suggestions, and
//! pretty-printed terminal output.
//!
//! # Error Codes
//!
//! Asthra error codes are organized by compilation phase:
//!
//! - **E0001-E0099**: Lexical errors (unexpected characters, unclosed comments, etc.)
//! - **E0100-E0199**: Syntax errors (unexpected tokens, invalid forms, annotation conflicts)
//! - **E0200-E0299**: Semantic errors (type mismatches, unresolved names, exhaustiveness)

use crate::span::Span;
use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Compiler error codes.
///
/// - E0001-E0099: lexical errors
/// - E0100-E0199: syntax errors
/// - E0200-E0299: semantic errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // ============================================================
    // Lexical errors (E0001-E0099)
    // ============================================================
    /// Unexpected character in source.
    UnexpectedCharacter = 1,
    /// Unclosed block comment.
    UnclosedBlockComment = 2,
    /// Unclosed string literal.
    UnclosedString = 3,
    /// Invalid escape sequence.
    InvalidEscape = 4,
    /// Invalid integer literal.
    InvalidInteger = 5,
    /// Invalid float literal.
    InvalidFloat = 6,
    /// Unclosed character literal.
    UnclosedChar = 7,
    /// Empty character literal.
    EmptyChar = 8,

    // ============================================================
    // Syntax errors (E0100-E0199)
    // ============================================================
    /// Unexpected token.
    UnexpectedToken = 100,
    /// Unexpected end of file.
    UnexpectedEof = 101,
    /// Expected identifier.
    ExpectedIdentifier = 102,
    /// Expected type.
    ExpectedType = 103,
    /// Expected expression.
    ExpectedExpression = 104,
    /// Expected pattern.
    ExpectedPattern = 105,
    /// Missing closing delimiter.
    UnclosedDelimiter = 106,
    /// Variable declaration without a type annotation.
    MissingTypeAnnotation = 107,
    /// Variable declaration without an initializer.
    MissingInitializer = 108,
    /// `return` without a value.
    MissingReturnValue = 109,
    /// `void` used inside an array literal.
    VoidInArrayLiteral = 110,
    /// Unknown or malformed AI annotation.
    InvalidAnnotation = 111,
    /// Conflicting FFI transfer annotations on one declaration.
    ConflictingFfiAnnotations = 112,
    /// Struct patterns were removed from match statements.
    StructPatternUnsupported = 113,
    /// Enum variant pattern without its enum name.
    UnqualifiedVariantPattern = 114,
    /// `::` used where `.` separates enum and variant.
    PathSeparatorInPattern = 115,
    /// `()` is not a valid type.
    EmptyTupleType = 116,
    /// Expected a top-level declaration.
    ExpectedDeclaration = 117,
    /// Source file missing its `package` header.
    MissingPackageDecl = 118,

    // ============================================================
    // Semantic errors (E0200-E0299)
    // ============================================================
    /// Type mismatch between expected and actual.
    TypeMismatch = 200,
    /// Unresolved value name.
    UndefinedName = 201,
    /// Unresolved type name.
    UndefinedType = 202,
    /// Same-scope duplicate definition.
    DuplicateDefinition = 203,
    /// Wrong number of generic type arguments.
    WrongTypeArgCount = 204,
    /// Duplicate type parameter in one declaration.
    DuplicateTypeParam = 205,
    /// Match does not cover all variants.
    NonExhaustiveMatch = 206,
    /// Match arm can never be reached.
    UnreachableMatchArm = 207,
    /// Assignment to an immutable binding.
    ImmutableAssign = 208,
    /// Binary operator applied to incompatible operands.
    InvalidBinaryOp = 209,
    /// Unary operator applied to an incompatible operand.
    InvalidUnaryOp = 210,
    /// Call with the wrong number of arguments.
    WrongArgCount = 211,
    /// Struct has no such field.
    UnknownField = 212,
    /// Struct literal missing a field.
    MissingField = 213,
    /// Struct literal initializes a field twice.
    DuplicateField = 214,
    /// Enum has no such variant.
    UnknownVariant = 215,
    /// Variant payload does not match its declaration.
    VariantPayloadMismatch = 216,
    /// Called a value that is not a function.
    NotCallable = 217,
    /// Indexed a value that is not an array or slice.
    NotIndexable = 218,
    /// AI annotation parameter fails its validation rule.
    InvalidAnnotationParam = 219,
    /// FFI annotation in a position it does not apply to.
    InvalidAnnotationContext = 220,
    /// Operation requires an unsafe block.
    UnsafeRequired = 221,
    /// Constant initializer is not a compile-time constant.
    NonConstExpr = 222,
    /// Assignment target is not an lvalue.
    InvalidAssignmentTarget = 223,
    /// `break` or `continue` outside a loop body.
    OutsideLoop = 224,
}

impl ErrorCode {
    /// Formatted error code string (e.g., "E0205").
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexical errors
            ErrorCode::UnexpectedCharacter => "unexpected character in source",
            ErrorCode::UnclosedBlockComment => "unclosed block comment",
            ErrorCode::UnclosedString => "unclosed string literal",
            ErrorCode::InvalidEscape => "invalid escape sequence",
            ErrorCode::InvalidInteger => "invalid integer literal",
            ErrorCode::InvalidFloat => "invalid float literal",
            ErrorCode::UnclosedChar => "unclosed character literal",
            ErrorCode::EmptyChar => "empty character literal",
            // Syntax errors
            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::UnexpectedEof => "unexpected end of file",
            ErrorCode::ExpectedIdentifier => "expected identifier",
            ErrorCode::ExpectedType => "expected type",
            ErrorCode::ExpectedExpression => "expected expression",
            ErrorCode::ExpectedPattern => "expected pattern",
            ErrorCode::UnclosedDelimiter => "unclosed delimiter",
            ErrorCode::MissingTypeAnnotation => "variable declaration requires a type annotation",
            ErrorCode::MissingInitializer => "variable declaration requires an initializer",
            ErrorCode::MissingReturnValue => "return statement requires a value",
            ErrorCode::VoidInArrayLiteral => "`void` is not allowed in array literals",
            ErrorCode::InvalidAnnotation => "unknown or malformed annotation",
            ErrorCode::ConflictingFfiAnnotations => "conflicting FFI transfer annotations",
            ErrorCode::StructPatternUnsupported => "struct patterns are not supported",
            ErrorCode::UnqualifiedVariantPattern => "unqualified enum variant pattern",
            ErrorCode::PathSeparatorInPattern => "invalid `::` in pattern",
            ErrorCode::EmptyTupleType => "empty parentheses are not a valid type",
            ErrorCode::ExpectedDeclaration => "expected a top-level declaration",
            ErrorCode::MissingPackageDecl => "missing package declaration",
            // Semantic errors
            ErrorCode::TypeMismatch => "type mismatch",
            ErrorCode::UndefinedName => "cannot find value in this scope",
            ErrorCode::UndefinedType => "cannot find type in this scope",
            ErrorCode::DuplicateDefinition => "duplicate definition",
            ErrorCode::WrongTypeArgCount => "wrong number of type arguments",
            ErrorCode::DuplicateTypeParam => "duplicate type parameter",
            ErrorCode::NonExhaustiveMatch => "non-exhaustive match",
            ErrorCode::UnreachableMatchArm => "unreachable match arm",
            ErrorCode::ImmutableAssign => "assignment to immutable binding",
            ErrorCode::InvalidBinaryOp => "invalid operands for binary operator",
            ErrorCode::InvalidUnaryOp => "invalid operand for unary operator",
            ErrorCode::WrongArgCount => "wrong number of arguments",
            ErrorCode::UnknownField => "no such field",
            ErrorCode::MissingField => "missing field in struct literal",
            ErrorCode::DuplicateField => "field initialized more than once",
            ErrorCode::UnknownVariant => "no such enum variant",
            ErrorCode::VariantPayloadMismatch => "enum variant payload mismatch",
            ErrorCode::NotCallable => "value is not callable",
            ErrorCode::NotIndexable => "value cannot be indexed",
            ErrorCode::InvalidAnnotationParam => "invalid annotation parameter",
            ErrorCode::InvalidAnnotationContext => "annotation not valid in this position",
            ErrorCode::UnsafeRequired => "operation requires an unsafe block",
            ErrorCode::NonConstExpr => "expression is not a compile-time constant",
            ErrorCode::InvalidAssignmentTarget => "invalid assignment target",
            ErrorCode::OutsideLoop => "`break` or `continue` outside a loop",
        }
    }

    /// Help message suggesting how to fix the error.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnclosedBlockComment => Some("add `*/` to close the block comment"),
            ErrorCode::UnclosedString => Some("add a closing `\"` to complete the string"),
            ErrorCode::UnclosedChar => Some("add a closing `'` to complete the character literal"),
            ErrorCode::EmptyChar => Some("character literals must contain exactly one character"),
            ErrorCode::InvalidEscape => {
                Some("valid escape sequences are: \\n, \\r, \\t, \\\\, \\', \\\", \\0, \\x##, \\u{####}")
            }
            ErrorCode::UnclosedDelimiter => {
                Some("check for matching opening and closing delimiters")
            }
            ErrorCode::MissingTypeAnnotation => {
                Some("write `let name: Type = value;` with an explicit type")
            }
            ErrorCode::MissingInitializer => Some("every `let` must be initialized at declaration"),
            ErrorCode::MissingReturnValue => {
                Some("return the unit value explicitly: `return ();`")
            }
            ErrorCode::VoidInArrayLiteral => {
                Some("use `[none]` for an empty array; `void` only marks absent return types")
            }
            ErrorCode::StructPatternUnsupported => Some(
                "bind the value to a name (e.g. `p`) and access fields in the arm body (e.g. `p.x`)",
            ),
            ErrorCode::UnqualifiedVariantPattern => {
                Some("use qualified syntax like `Option.Some(x)` or `Option.None`")
            }
            ErrorCode::PathSeparatorInPattern => {
                Some("use `.` for enum variants (e.g. `Result.Ok` instead of `Result::Ok`)")
            }
            ErrorCode::MissingPackageDecl => {
                Some("every source file starts with `package <name>;`")
            }
            ErrorCode::ConflictingFfiAnnotations => Some(
                "`#[transfer_full]`, `#[transfer_none]`, and `#[borrowed]` are mutually exclusive",
            ),
            ErrorCode::UnsafeRequired => Some("wrap the operation in an `unsafe { ... }` block"),
            _ => None,
        }
    }
}

/// The kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An error that prevents compilation.
    Error,
    /// A warning that doesn't prevent compilation.
    Warning,
    /// An informational note.
    Note,
    /// A hint for fixing the issue.
    Help,
}

impl DiagnosticKind {
    fn to_report_kind(self) -> ReportKind<'static> {
        match self {
            DiagnosticKind::Error => ReportKind::Error,
            DiagnosticKind::Warning => ReportKind::Warning,
            DiagnosticKind::Note => ReportKind::Advice,
            DiagnosticKind::Help => ReportKind::Advice,
        }
    }

    fn color(self) -> Color {
        match self {
            DiagnosticKind::Error => Color::Red,
            DiagnosticKind::Warning => Color::Yellow,
            DiagnosticKind::Note => Color::Cyan,
            DiagnosticKind::Help => Color::Green,
        }
    }
}

/// A compiler diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The kind of diagnostic.
    pub kind: DiagnosticKind,
    /// The error code (e.g., "E0200").
    pub code: Option<String>,
    /// The main message.
    pub message: String,
    /// The primary span where the problem occurred.
    pub span: Span,
    /// Additional labels pointing to relevant code.
    pub labels: Vec<DiagnosticLabel>,
    /// Suggestions for fixing the problem.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code: None,
            message: message.into(),
            span,
            labels: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code: None,
            message: message.into(),
            span,
            labels: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Whether this diagnostic blocks compilation.
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    /// Set the error code from a string.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the error code from an [`ErrorCode`], attaching its help text.
    pub fn with_error_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code.as_str());
        if let Some(help) = code.help() {
            self.suggestions.push(help.to_string());
        }
        self
    }

    /// Build an error straight from an [`ErrorCode`] and span.
    pub fn from_error_code(code: ErrorCode, span: Span) -> Self {
        let mut diag = Self::error(code.description(), span);
        diag.code = Some(code.as_str());
        if let Some(help) = code.help() {
            diag.suggestions.push(help.to_string());
        }
        diag
    }

    /// Add a note pointing at related code.
    pub fn with_note(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(DiagnosticLabel::secondary(span, message));
        self
    }

    /// Add a primary label with a custom message.
    pub fn with_primary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(DiagnosticLabel::primary(span, message));
        self
    }

    /// Add a label.
    pub fn with_label(mut self, label: DiagnosticLabel) -> Self {
        self.labels.push(label);
        self
    }

    /// Add a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

/// A label in a diagnostic.
#[derive(Debug, Clone)]
pub struct DiagnosticLabel {
    /// The span this label points to.
    pub span: Span,
    /// The label message.
    pub message: String,
    /// Whether this is the primary label.
    pub primary: bool,
}

impl DiagnosticLabel {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            primary: false,
        }
    }
}

/// Diagnostic emitter that prints diagnostics to stderr.
pub struct DiagnosticEmitter<'a> {
    filename: &'a str,
    source: &'a str,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self { filename, source }
    }

    /// Emit a diagnostic to stderr.
    pub fn emit(&self, diagnostic: &Diagnostic) {
        let mut builder = Report::build(
            diagnostic.kind.to_report_kind(),
            self.filename,
            diagnostic.span.start,
        );

        let message = if let Some(code) = &diagnostic.code {
            format!("[{}] {}", code, diagnostic.message)
        } else {
            diagnostic.message.clone()
        };
        builder = builder.with_message(&message);

        builder = builder.with_label(
            Label::new((self.filename, diagnostic.span.start..diagnostic.span.end))
                .with_color(diagnostic.kind.color())
                .with_message(&diagnostic.message),
        );

        for label in &diagnostic.labels {
            let color = if label.primary {
                diagnostic.kind.color()
            } else {
                Color::Blue
            };
            builder = builder.with_label(
                Label::new((self.filename, label.span.start..label.span.end))
                    .with_color(color)
                    .with_message(&label.message),
            );
        }

        if !diagnostic.suggestions.is_empty() {
            let help = diagnostic.suggestions.join("\n");
            builder = builder.with_help(help);
        }

        let report = builder.finish();

        report
            .eprint((self.filename, Source::from(self.source)))
            .expect("failed to write diagnostic");
    }

    /// Emit every diagnostic in order.
    pub fn emit_all(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }
}

/// Hard failures shared by the lexer and parser.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of file")]
    UnexpectedEof { span: Span },

    #[error("invalid integer literal")]
    InvalidInteger { span: Span },

    #[error("invalid float literal")]
    InvalidFloat { span: Span },

    #[error("unclosed string literal")]
    UnclosedString { span: Span },

    #[error("unclosed block comment")]
    UnclosedBlockComment { span: Span },

    #[error("invalid escape sequence")]
    InvalidEscape { span: Span },
}

impl ParseError {
    /// The span where the error occurred.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span }
            | ParseError::InvalidInteger { span }
            | ParseError::InvalidFloat { span }
            | ParseError::UnclosedString { span }
            | ParseError::UnclosedBlockComment { span }
            | ParseError::InvalidEscape { span } => *span,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        let code = match &err {
            ParseError::UnexpectedToken { .. } => ErrorCode::UnexpectedToken,
            ParseError::UnexpectedEof { .. } => ErrorCode::UnexpectedEof,
            ParseError::InvalidInteger { .. } => ErrorCode::InvalidInteger,
            ParseError::InvalidFloat { .. } => ErrorCode::InvalidFloat,
            ParseError::UnclosedString { .. } => ErrorCode::UnclosedString,
            ParseError::UnclosedBlockComment { .. } => ErrorCode::UnclosedBlockComment,
            ParseError::InvalidEscape { .. } => ErrorCode::InvalidEscape,
        };
        Diagnostic::error(err.to_string(), err.span()).with_error_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_formatting() {
        assert_eq!(ErrorCode::UnexpectedCharacter.as_str(), "E0001");
        assert_eq!(ErrorCode::UnexpectedToken.as_str(), "E0100");
        assert_eq!(ErrorCode::TypeMismatch.as_str(), "E0200");
        assert_eq!(ErrorCode::NonExhaustiveMatch.as_str(), "E0206");
    }

    #[test]
    fn error_code_phases_do_not_overlap() {
        // Lexical < 100, syntax in [100, 200), semantic in [200, 300)
        assert!((ErrorCode::EmptyChar as u16) < 100);
        assert!((ErrorCode::MissingPackageDecl as u16) < 200);
        assert!((ErrorCode::OutsideLoop as u16) < 300);
    }

    #[test]
    fn with_error_code_attaches_help() {
        let diag = Diagnostic::error("bad array", Span::dummy())
            .with_error_code(ErrorCode::VoidInArrayLiteral);
        assert_eq!(diag.code.as_deref(), Some("E0110"));
        assert!(!diag.suggestions.is_empty());
    }

    #[test]
    fn parse_error_converts_to_diagnostic() {
        let err = ParseError::UnexpectedEof { span: Span::dummy() };
        let diag: Diagnostic = err.into();
        assert_eq!(diag.code.as_deref(), Some("E0101"));
        assert!(diag.is_error());
    }
}
