//! Semantic error type shared by the analysis passes.
//!
//! Checks return [`SemaResult`], and the pass drivers convert failures
//! into [`Diagnostic`]s so analysis can continue with sibling nodes.

use crate::diagnostics::{Diagnostic, ErrorCode};
use crate::span::Span;

use super::types::Type;

/// Result alias for semantic checks.
///
/// Errors are boxed because `SemanticError` carries formatted type
/// descriptors and would otherwise dominate the stack frame of every
/// check function.
pub type SemaResult<T> = Result<T, Box<SemanticError>>;

/// A semantic error at a specific source location.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub span: Span,
    /// Optional extra suggestion beyond the error-code help text.
    pub help: Option<String>,
}

/// Everything the analyzer can reject.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticErrorKind {
    /// Two types were required to match exactly and did not.
    Mismatch { expected: Type, found: Type },
    /// A `return` value disagrees with the declared return type.
    ReturnMismatch { expected: Type, found: Type },
    /// An `if`, `while`-style, or guard condition is not `bool`.
    ConditionNotBool { found: Type },
    /// `expr as T` between types with no conversion.
    InvalidCast { from: Type, to: Type },
    /// `for` over a value that is not an array or slice.
    NotIterable { ty: Type },
    /// A pattern's shape does not fit the matched type.
    PatternMismatch { expected: Type },
    /// Tuple pattern arity differs from the matched tuple.
    TuplePatternArity { expected: usize, found: usize },
    /// `await` on something that is not a task handle.
    AwaitNotTask { found: Type },
    /// Name lookup failed in the value namespace.
    UndefinedName { name: String },
    /// Method or associated-function lookup failed.
    NoMethod { ty: Type, method: String },
    /// Name lookup failed in the type namespace.
    UndefinedType { name: String },
    /// Struct literal named a type that is not a struct.
    NotAStruct { name: String },
    /// Enum constructor named a type that is not an enum.
    NotAnEnum { name: String },
    /// Same name defined twice in one scope.
    DuplicateDefinition { name: String },
    /// Generic instantiated with the wrong number of type arguments.
    WrongTypeArgCount {
        name: String,
        expected: usize,
        found: usize,
    },
    /// Type arguments required but not inferrable from context.
    CannotInferTypeArgs { name: String },
    /// Type parameter list repeats a name.
    DuplicateTypeParam { name: String },
    /// `match` does not cover every value of the scrutinee type.
    NonExhaustiveMatch { missing: Vec<String> },
    /// Assignment to a binding not declared `mut`.
    ImmutableAssign { name: String },
    /// Assignment to a constant.
    AssignToConst { name: String },
    /// Assignment through a `*const` pointer.
    AssignThroughConstPointer { ty: Type },
    /// Binary operator applied to unsupported operand types.
    InvalidBinaryOp {
        op: &'static str,
        left: Type,
        right: Type,
    },
    /// Unary operator applied to an unsupported operand type.
    InvalidUnaryOp { op: &'static str, ty: Type },
    /// Call with the wrong number of arguments.
    WrongArgCount { expected: usize, found: usize },
    /// `len` applied to a type without a length.
    InvalidLenArgument { ty: Type },
    /// Field access that names no field of the base type.
    UnknownField { ty: Type, field: String },
    /// Struct literal left a declared field uninitialized.
    MissingField { struct_name: String, field: String },
    /// Struct literal initialized a field twice.
    DuplicateFieldInit { field: String },
    /// Enum constructor or pattern named no declared variant.
    UnknownVariant { enum_name: String, variant: String },
    /// Payload presence disagrees with the variant declaration.
    VariantPayloadMismatch {
        enum_name: String,
        variant: String,
        takes_payload: bool,
    },
    /// Call on a value whose type is not a function.
    NotCallable { ty: Type },
    /// Index on a value that is not an array or slice.
    NotIndexable { ty: Type },
    /// `#[borrowed]` somewhere other than a parameter.
    BorrowedOutsideParam,
    /// Pointer operation outside an `unsafe` block.
    UnsafeRequired { what: &'static str },
    /// Expression required to be compile-time constant is not.
    NonConstExpr { context: &'static str },
    /// Array size evaluated to a negative value.
    NegativeArraySize { value: i64 },
    /// Assignment target is not a variable, field, index, or deref.
    InvalidAssignmentTarget,
    /// `break` or `continue` outside a loop body.
    OutsideLoop { keyword: &'static str },
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, span: Span) -> Self {
        SemanticError {
            kind,
            span,
            help: None,
        }
    }

    /// Shorthand for `Err(Box::new(self))`.
    pub fn into_err<T>(self) -> SemaResult<T> {
        Err(Box::new(self))
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render as a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        use SemanticErrorKind::*;

        let (code, message) = match &self.kind {
            Mismatch { expected, found } => (
                ErrorCode::TypeMismatch,
                format!("mismatched types: expected `{expected}`, found `{found}`"),
            ),
            ReturnMismatch { expected, found } => (
                ErrorCode::TypeMismatch,
                format!("mismatched return type: expected `{expected}`, found `{found}`"),
            ),
            ConditionNotBool { found } => (
                ErrorCode::TypeMismatch,
                format!("condition must be `bool`, found `{found}`"),
            ),
            InvalidCast { from, to } => (
                ErrorCode::TypeMismatch,
                format!("cannot cast `{from}` to `{to}`"),
            ),
            NotIterable { ty } => (
                ErrorCode::TypeMismatch,
                format!("cannot iterate over a value of type `{ty}`"),
            ),
            PatternMismatch { expected } => (
                ErrorCode::TypeMismatch,
                format!("pattern does not match the matched type `{expected}`"),
            ),
            TuplePatternArity { expected, found } => (
                ErrorCode::TypeMismatch,
                format!(
                    "tuple pattern has {found} elements but the matched tuple has {expected}"
                ),
            ),
            AwaitNotTask { found } => (
                ErrorCode::TypeMismatch,
                format!("`await` requires a task handle, found `{found}`"),
            ),
            UndefinedName { name } => (
                ErrorCode::UndefinedName,
                format!("cannot find `{name}` in this scope"),
            ),
            NoMethod { ty, method } => (
                ErrorCode::UndefinedName,
                format!("no method named `{method}` on type `{ty}`"),
            ),
            UndefinedType { name } => (
                ErrorCode::UndefinedType,
                format!("cannot find type `{name}`"),
            ),
            NotAStruct { name } => (
                ErrorCode::TypeMismatch,
                format!("`{name}` is not a struct"),
            ),
            NotAnEnum { name } => {
                (ErrorCode::TypeMismatch, format!("`{name}` is not an enum"))
            }
            DuplicateDefinition { name } => (
                ErrorCode::DuplicateDefinition,
                format!("duplicate definition of `{name}`"),
            ),
            WrongTypeArgCount {
                name,
                expected,
                found,
            } => (
                ErrorCode::WrongTypeArgCount,
                format!(
                    "wrong number of type arguments for `{name}`: expected {expected}, found {found}"
                ),
            ),
            CannotInferTypeArgs { name } => (
                ErrorCode::WrongTypeArgCount,
                format!("cannot infer type arguments for `{name}`"),
            ),
            DuplicateTypeParam { name } => (
                ErrorCode::DuplicateTypeParam,
                format!("duplicate type parameter `{name}`"),
            ),
            NonExhaustiveMatch { missing } => {
                let list = missing
                    .iter()
                    .map(|p| format!("`{p}`"))
                    .collect::<Vec<_>>()
                    .join(", ");
                (
                    ErrorCode::NonExhaustiveMatch,
                    format!("non-exhaustive match: {list} not covered"),
                )
            }
            ImmutableAssign { name } => (
                ErrorCode::ImmutableAssign,
                format!("cannot assign to `{name}`: binding is not declared `mut`"),
            ),
            AssignToConst { name } => (
                ErrorCode::ImmutableAssign,
                format!("cannot assign to constant `{name}`"),
            ),
            AssignThroughConstPointer { ty } => (
                ErrorCode::ImmutableAssign,
                format!("cannot assign through `{ty}`: pointer is not `*mut`"),
            ),
            InvalidBinaryOp { op, left, right } => (
                ErrorCode::InvalidBinaryOp,
                format!("binary `{op}` cannot be applied to `{left}` and `{right}`"),
            ),
            InvalidUnaryOp { op, ty } => (
                ErrorCode::InvalidUnaryOp,
                format!("unary `{op}` cannot be applied to `{ty}`"),
            ),
            WrongArgCount { expected, found } => (
                ErrorCode::WrongArgCount,
                format!("wrong number of arguments: expected {expected}, found {found}"),
            ),
            InvalidLenArgument { ty } => (
                ErrorCode::TypeMismatch,
                format!("`len` expects an array, slice, or string, found `{ty}`"),
            ),
            UnknownField { ty, field } => (
                ErrorCode::UnknownField,
                format!("no field `{field}` on type `{ty}`"),
            ),
            MissingField { struct_name, field } => (
                ErrorCode::MissingField,
                format!("missing field `{field}` in initializer of `{struct_name}`"),
            ),
            DuplicateFieldInit { field } => (
                ErrorCode::DuplicateField,
                format!("field `{field}` initialized more than once"),
            ),
            UnknownVariant { enum_name, variant } => (
                ErrorCode::UnknownVariant,
                format!("no variant `{variant}` on enum `{enum_name}`"),
            ),
            VariantPayloadMismatch {
                enum_name,
                variant,
                takes_payload,
            } => {
                let message = if *takes_payload {
                    format!("variant `{enum_name}.{variant}` requires a payload")
                } else {
                    format!("variant `{enum_name}.{variant}` does not take a payload")
                };
                (ErrorCode::VariantPayloadMismatch, message)
            }
            NotCallable { ty } => (
                ErrorCode::NotCallable,
                format!("value of type `{ty}` is not callable"),
            ),
            NotIndexable { ty } => (
                ErrorCode::NotIndexable,
                format!("value of type `{ty}` cannot be indexed"),
            ),
            BorrowedOutsideParam => (
                ErrorCode::InvalidAnnotationContext,
                "`#[borrowed]` is only valid on function parameters".to_string(),
            ),
            UnsafeRequired { what } => (
                ErrorCode::UnsafeRequired,
                format!("{what} requires an unsafe block"),
            ),
            NonConstExpr { context } => (
                ErrorCode::NonConstExpr,
                format!("{context} must be a compile-time constant"),
            ),
            NegativeArraySize { value } => (
                ErrorCode::NonConstExpr,
                format!("array size must be non-negative, found {value}"),
            ),
            InvalidAssignmentTarget => (
                ErrorCode::InvalidAssignmentTarget,
                "invalid assignment target: expected a variable, field, index, or dereference"
                    .to_string(),
            ),
            OutsideLoop { keyword } => (
                ErrorCode::OutsideLoop,
                format!("`{keyword}` outside a loop"),
            ),
        };

        let mut diag = Diagnostic::error(message, self.span).with_error_code(code);

        match &self.kind {
            ImmutableAssign { name } => {
                diag = diag.with_suggestion(format!(
                    "declare the binding as `let mut {name}` to allow assignment"
                ));
            }
            CannotInferTypeArgs { name } => {
                diag = diag.with_suggestion(format!(
                    "write the type arguments explicitly, e.g. `{name}<i32>`"
                ));
            }
            _ => {}
        }

        if let Some(help) = &self.help {
            diag = diag.with_suggestion(help.clone());
        }

        diag
    }
}

impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_diagnostic().message)
    }
}

impl std::error::Error for SemanticError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_renders_both_types() {
        let err = SemanticError::new(
            SemanticErrorKind::Mismatch {
                expected: Type::bool(),
                found: Type::i32(),
            },
            Span::dummy(),
        );
        let diag = err.to_diagnostic();
        assert!(diag.message.contains("expected `bool`"));
        assert!(diag.message.contains("found `i32`"));
        assert_eq!(diag.code.as_deref(), Some("E0200"));
    }

    #[test]
    fn immutable_assign_suggests_let_mut() {
        let err = SemanticError::new(
            SemanticErrorKind::ImmutableAssign {
                name: "x".to_string(),
            },
            Span::dummy(),
        );
        let diag = err.to_diagnostic();
        assert!(diag.suggestions.iter().any(|s| s.contains("let mut x")));
    }

    #[test]
    fn non_exhaustive_lists_missing_patterns() {
        let err = SemanticError::new(
            SemanticErrorKind::NonExhaustiveMatch {
                missing: vec!["Color.Blue".to_string(), "Color.Green".to_string()],
            },
            Span::dummy(),
        );
        let diag = err.to_diagnostic();
        assert!(diag.message.contains("`Color.Blue`, `Color.Green`"));
        assert_eq!(diag.code.as_deref(), Some("E0206"));
    }

    #[test]
    fn unsafe_required_carries_code_help() {
        let err = SemanticError::new(
            SemanticErrorKind::UnsafeRequired {
                what: "dereferencing a raw pointer",
            },
            Span::dummy(),
        );
        let diag = err.to_diagnostic();
        assert!(diag.message.contains("requires an unsafe block"));
        assert!(diag.suggestions.iter().any(|s| s.contains("unsafe {")));
    }

    #[test]
    fn extra_help_is_appended() {
        let err = SemanticError::new(
            SemanticErrorKind::UndefinedName {
                name: "foo".to_string(),
            },
            Span::dummy(),
        )
        .with_help("did you mean `for`?");
        let diag = err.to_diagnostic();
        assert!(diag.suggestions.iter().any(|s| s.contains("did you mean")));
    }
}
