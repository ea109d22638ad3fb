//! Abstract Syntax Tree for Asthra.
//!
//! This module defines the AST data structures that represent parsed Asthra
//! programs. The AST closely mirrors the surface syntax: a [`Program`] holds
//! the mandatory package declaration, imports, and top-level declarations.
//!
//! # AST Structure
//!
//! - [`Program`] - Root node: package declaration, imports, declarations
//! - [`Declaration`] - Top-level items (functions, structs, enums, extern
//!   functions, constants, impl blocks)
//! - [`Statement`] - Block-level constructs (let, assignment, control flow,
//!   spawn, unsafe)
//! - [`Expr`] - Expressions (literals, operations, calls, constructors)
//! - [`Pattern`] - Match and if-let patterns
//! - [`Type`] - Type expressions (named, pointer, slice, array, tuple,
//!   `Result`/`Option`/`TaskHandle`)
//!
//! # Design Notes
//!
//! - All AST nodes derive `Debug`, `Clone`, `PartialEq`, and `Eq` for testing.
//! - Floating-point values use the `OrderedFloat` wrapper for total ordering.
//! - Source locations are tracked via `Span` on each node.
//! - Identifiers are interned as `Symbol` for efficient comparison.
//! - Enum constructor payloads are the explicit sum type
//!   [`EnumVariantValue`]: no payload, one value expression, or explicit type
//!   arguments, never more than one of these at once.
//!
//! # Example
//!
//! ```rust
//! use asthrac::Parser;
//! use asthrac::ast::Declaration;
//!
//! let source = r#"
//! package demo;
//!
//! pub fn main(none) -> i32 {
//!     return 0;
//! }
//! "#;
//! let mut parser = Parser::new(source);
//! let program = parser.parse_program().expect("parse failed");
//!
//! let Declaration::Function(func) = &program.declarations[0] else {
//!     panic!("expected function");
//! };
//! assert_eq!(func.params.len(), 0); // `none` marks an empty parameter list
//! assert_eq!(func.body.statements.len(), 1);
//! ```

use crate::span::{Span, Spanned};
use serde::{Deserialize, Serialize};
use string_interner::DefaultSymbol;

/// A symbol representing an interned string.
pub type Symbol = DefaultSymbol;

/// Wrapper for f64 that provides total ordering and Eq.
///
/// This allows AST nodes containing floats to derive Eq for testing.
/// NaN values are considered equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        // NaN == NaN for our purposes
        if self.0.is_nan() && other.0.is_nan() {
            return true;
        }
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for OrderedFloat {
    fn from(f: f64) -> Self {
        OrderedFloat(f)
    }
}

impl From<OrderedFloat> for f64 {
    fn from(f: OrderedFloat) -> Self {
        f.0
    }
}

/// A program is a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// The mandatory package declaration.
    pub package: PackageDecl,
    /// Import statements.
    pub imports: Vec<ImportDecl>,
    /// Top-level declarations.
    pub declarations: Vec<Declaration>,
    /// The span of the entire program.
    pub span: Span,
}

/// Package declaration: `package name;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: Spanned<Symbol>,
    pub span: Span,
}

/// Import statement: `import "path";` or `import "path" as alias;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub path: Spanned<String>,
    pub alias: Option<Spanned<Symbol>>,
    pub span: Span,
}

// ============================================================
// Visibility
// ============================================================

/// Declaration visibility. Asthra requires an explicit `pub` or `priv` on
/// top-level declarations; fields and variants default to private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

// ============================================================
// Declarations
// ============================================================

/// Top-level declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Function(FnDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    ExternFn(ExternDecl),
    Const(ConstDecl),
    Impl(ImplBlock),
}

impl Declaration {
    pub fn span(&self) -> Span {
        match self {
            Declaration::Function(d) => d.span,
            Declaration::Struct(d) => d.span,
            Declaration::Enum(d) => d.span,
            Declaration::ExternFn(d) => d.span,
            Declaration::Const(d) => d.span,
            Declaration::Impl(d) => d.span,
        }
    }

    /// The declared name, if the declaration form has one.
    pub fn name(&self) -> Option<Spanned<Symbol>> {
        match self {
            Declaration::Function(d) => Some(d.name.clone()),
            Declaration::Struct(d) => Some(d.name.clone()),
            Declaration::Enum(d) => Some(d.name.clone()),
            Declaration::ExternFn(d) => Some(d.name.clone()),
            Declaration::Const(d) => Some(d.name.clone()),
            Declaration::Impl(_) => None,
        }
    }
}

// ============================================================
// Function Declaration
// ============================================================

/// Function declaration. Also used for methods inside `impl` blocks, where
/// `takes_self` marks instance methods. The `self` parameter is not part of
/// `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDecl {
    pub annotations: Vec<Annotation>,
    pub vis: Visibility,
    pub name: Spanned<Symbol>,
    pub takes_self: bool,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Block,
    pub span: Span,
}

/// A function or extern parameter: `name: Type`, with optional FFI
/// annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub annotations: Vec<Annotation>,
    pub name: Spanned<Symbol>,
    pub ty: Type,
    pub span: Span,
}

// ============================================================
// Type Declarations
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub annotations: Vec<Annotation>,
    pub vis: Visibility,
    pub name: Spanned<Symbol>,
    /// Generic type parameters: `struct Pair<A, B>`.
    pub type_params: Vec<Spanned<Symbol>>,
    pub fields: Vec<StructField>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub vis: Visibility,
    pub name: Spanned<Symbol>,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub annotations: Vec<Annotation>,
    pub vis: Visibility,
    pub name: Spanned<Symbol>,
    pub type_params: Vec<Spanned<Symbol>>,
    pub variants: Vec<EnumVariantDecl>,
    pub span: Span,
}

/// One enum variant: `Name`, `Name(Type)`, or `Name = const-expr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariantDecl {
    pub vis: Visibility,
    pub name: Spanned<Symbol>,
    /// Payload type for data-carrying variants.
    pub payload: Option<Type>,
    /// Explicit discriminant value.
    pub discriminant: Option<Expr>,
    pub span: Span,
}

// ============================================================
// Extern, Const, Impl
// ============================================================

/// External function declaration:
/// `pub extern "lib" fn name(params) -> Type;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternDecl {
    pub annotations: Vec<Annotation>,
    pub vis: Visibility,
    /// The library string, e.g. `"libc"`. Optional in the grammar.
    pub extern_name: Option<Spanned<String>>,
    pub name: Spanned<Symbol>,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub span: Span,
}

/// Constant declaration: `pub const NAME: Type = value;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub annotations: Vec<Annotation>,
    pub vis: Visibility,
    pub name: Spanned<Symbol>,
    pub ty: Type,
    pub value: Expr,
    pub span: Span,
}

/// Method block: `impl StructName { fns }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplBlock {
    pub annotations: Vec<Annotation>,
    pub struct_name: Spanned<Symbol>,
    pub methods: Vec<FnDecl>,
    pub span: Span,
}

// ============================================================
// Annotations
// ============================================================

/// A `#[...]` annotation attached to a declaration or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationKind {
    /// A recognized `ai_*` annotation, validated at parse time.
    Ai(AiAnnotation),
    /// FFI ownership-transfer marker: `#[transfer_full]`, `#[transfer_none]`,
    /// `#[borrowed]`.
    FfiTransfer(FfiTransfer),
    /// Memory management strategy: `#[ownership(gc|c|pinned)]`.
    Ownership(OwnershipKind),
    /// Any other annotation, carried through for downstream tools.
    Other {
        name: Spanned<Symbol>,
        params: Vec<AnnotationParam>,
    },
}

/// A recognized AI annotation with its validated parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiAnnotation {
    pub kind: AiAnnotationKind,
    pub params: Vec<AnnotationParam>,
}

/// The recognized `ai_*` annotation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAnnotationKind {
    /// `#[ai_confidence(0.9)]` - float in [0.0, 1.0]
    Confidence,
    /// `#[ai_hypothesis("...")]`
    Hypothesis,
    /// `#[ai_review_needed("...")]`
    ReviewNeeded,
    /// `#[ai_todo("...")]`
    Todo,
    /// `#[ai_optimize("...")]`
    Optimize,
    /// `#[ai_test_coverage("...")]`
    TestCoverage,
    /// `#[ai_security_review("...")]`
    SecurityReview,
    /// `#[ai_pattern("...")]`
    Pattern,
    /// `#[ai_complexity("...")]`
    Complexity,
    /// `#[ai_refinement_step(3)]` - positive integer
    RefinementStep,
}

impl AiAnnotationKind {
    /// Map an annotation name to its kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ai_confidence" => Some(Self::Confidence),
            "ai_hypothesis" => Some(Self::Hypothesis),
            "ai_review_needed" => Some(Self::ReviewNeeded),
            "ai_todo" => Some(Self::Todo),
            "ai_optimize" => Some(Self::Optimize),
            "ai_test_coverage" => Some(Self::TestCoverage),
            "ai_security_review" => Some(Self::SecurityReview),
            "ai_pattern" => Some(Self::Pattern),
            "ai_complexity" => Some(Self::Complexity),
            "ai_refinement_step" => Some(Self::RefinementStep),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Confidence => "ai_confidence",
            Self::Hypothesis => "ai_hypothesis",
            Self::ReviewNeeded => "ai_review_needed",
            Self::Todo => "ai_todo",
            Self::Optimize => "ai_optimize",
            Self::TestCoverage => "ai_test_coverage",
            Self::SecurityReview => "ai_security_review",
            Self::Pattern => "ai_pattern",
            Self::Complexity => "ai_complexity",
            Self::RefinementStep => "ai_refinement_step",
        }
    }
}

/// One annotation parameter value with its span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationParam {
    pub value: AnnotationValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    String(String),
    Ident(Symbol),
    Int(i64),
    Float(OrderedFloat),
    Bool(bool),
}

/// FFI ownership-transfer annotations. At most one per declaration or
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FfiTransfer {
    /// `#[transfer_full]`: receiver takes ownership.
    Full,
    /// `#[transfer_none]`: sender keeps ownership.
    None,
    /// `#[borrowed]`: temporary loan; valid on parameters only.
    Borrowed,
}

impl FfiTransfer {
    pub fn name(&self) -> &'static str {
        match self {
            FfiTransfer::Full => "transfer_full",
            FfiTransfer::None => "transfer_none",
            FfiTransfer::Borrowed => "borrowed",
        }
    }
}

/// `#[ownership(...)]` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipKind {
    /// Garbage-collected (default).
    Gc,
    /// C-managed memory.
    C,
    /// Pinned, never moved by the runtime.
    Pinned,
}

impl OwnershipKind {
    pub fn name(&self) -> &'static str {
        match self {
            OwnershipKind::Gc => "gc",
            OwnershipKind::C => "c",
            OwnershipKind::Pinned => "pinned",
        }
    }
}

// ============================================================
// Statements and Blocks
// ============================================================

/// A brace-delimited statement list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Variable declaration: `let mut? name: Type = value;`
    Let {
        name: Spanned<Symbol>,
        mutable: bool,
        ty: Type,
        value: Expr,
        span: Span,
    },

    /// Assignment: `target = value;`
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },

    /// Expression statement: `foo();`
    Expr { expr: Expr, span: Span },

    /// Return: `return value;`
    Return { value: Expr, span: Span },

    /// If: `if cond { } else { }`
    If(IfStmt),

    /// If-let: `if let pattern = value { } else { }`
    IfLet {
        pattern: Pattern,
        value: Expr,
        then_block: Block,
        else_branch: Option<ElseBranch>,
        span: Span,
    },

    /// For loop: `for x in iterable { }`
    For {
        variable: Spanned<Symbol>,
        iterable: Expr,
        body: Block,
        span: Span,
    },

    /// Match: `match scrutinee { arms }`
    Match {
        scrutinee: Expr,
        arms: Vec<MatchArm>,
        span: Span,
    },

    /// Fire-and-forget task: `spawn call;`
    Spawn { call: Expr, span: Span },

    /// Task with handle: `spawn_with_handle h = call;`
    SpawnWithHandle {
        handle: Spanned<Symbol>,
        call: Expr,
        span: Span,
    },

    /// Unsafe block: `unsafe { }`
    Unsafe { block: Block, span: Span },

    Break { span: Span },

    Continue { span: Span },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Let { span, .. }
            | Statement::Assign { span, .. }
            | Statement::Expr { span, .. }
            | Statement::Return { span, .. }
            | Statement::IfLet { span, .. }
            | Statement::For { span, .. }
            | Statement::Match { span, .. }
            | Statement::Spawn { span, .. }
            | Statement::SpawnWithHandle { span, .. }
            | Statement::Unsafe { span, .. }
            | Statement::Break { span }
            | Statement::Continue { span } => *span,
            Statement::If(stmt) => stmt.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElseBranch {
    Block(Block),
    If(Box<IfStmt>),
}

/// One match arm: `pattern (if guard)? => block`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

// ============================================================
// Expressions
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// Literal: `42`, `"hello"`, `true`, `()`
    Literal(Literal),

    /// Name reference, including `self` in method bodies.
    Identifier(Symbol),

    /// Binary operation: `a + b`
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: `!x`, `-x`, `*p`, `&x`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Function call: `f(x, y)`
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Associated function call: `Type::function(args)`, optionally with
    /// explicit type arguments: `Vec<i32>::new(none)`.
    AssociatedCall {
        ty: Spanned<Symbol>,
        type_args: Vec<Type>,
        function: Spanned<Symbol>,
        args: Vec<Expr>,
    },

    /// Method call: `value.method(args)`
    MethodCall {
        base: Box<Expr>,
        method: Spanned<Symbol>,
        args: Vec<Expr>,
    },

    /// Field access: `point.x`. Also covers the built-in `.len` on slices
    /// and arrays, resolved during analysis.
    Field {
        base: Box<Expr>,
        field: Spanned<Symbol>,
    },

    /// Index: `a[i]`
    Index { base: Box<Expr>, index: Box<Expr> },

    /// Slice: `a[start:end]`, either bound optional.
    Slice {
        base: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },

    /// Enum constructor: `Status.Active`, `Option.Some(42)`,
    /// `Result<i32, string>.Ok(7)`.
    EnumConstructor {
        enum_name: Spanned<Symbol>,
        variant: Spanned<Symbol>,
        value: EnumVariantValue,
    },

    /// Struct literal: `Point { x: 1, y: 2 }`, optionally generic:
    /// `Pair<i32, bool> { first: 1, second: true }`.
    StructLiteral {
        name: Spanned<Symbol>,
        type_args: Vec<Type>,
        fields: Vec<FieldInit>,
    },

    /// Tuple: `(x, y)`. Never empty and never a single element.
    Tuple(Vec<Expr>),

    /// Array literal: `[1, 2, 3]`, `[none]`, `[0; 16]`
    Array(ArrayExpr),

    /// Cast: `x as i64`
    Cast { expr: Box<Expr>, ty: Type },

    /// Await a task handle: `await handle`
    Await { task: Box<Expr> },

    /// `sizeof(Type)`
    SizeOf(Type),

    /// Parenthesized: `(x)`
    Paren(Box<Expr>),
}

/// Payload of an enum constructor expression. Exactly one shape at a time:
/// no payload, one value expression, or explicit type arguments (for
/// payload-less variants of generic enums, e.g. `Option<i32>.None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumVariantValue {
    NoValue,
    Value(Box<Expr>),
    TypeArgs(Vec<Type>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayExpr {
    /// `[1, 2, 3]`; empty arrays are written `[none]`.
    List(Vec<Expr>),
    /// `[0; 16]`
    Repeat { value: Box<Expr>, count: Box<Expr> },
}

/// `name: value` in a struct literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInit {
    pub name: Spanned<Symbol>,
    pub value: Expr,
    pub span: Span,
}

// ============================================================
// Operators
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }

    /// `+ - * / %` require numeric operands of one type.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    /// `== != < <= > >=` yield `bool`.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    /// `&& ||` require `bool` operands.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    /// `& | ^ << >>` require integer operands.
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    Deref,
    AddrOf,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
        }
    }
}

// ============================================================
// Literals
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Int(i64),
    Float(OrderedFloat),
    String(String),
    Char(char),
    Bool(bool),
    /// The unit value `()`.
    Unit,
}

// ============================================================
// Patterns
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// Wildcard: `_`. Also the unit pattern `()`.
    Wildcard,

    /// Literal: `42`, `"active"`, `true`
    Literal(Literal),

    /// Binding: `x`, `mut x`
    Binding {
        mutable: bool,
        name: Spanned<Symbol>,
    },

    /// Tuple: `(a, b, c)`
    Tuple(Vec<Pattern>),

    /// Enum variant: `Status.Active`, `Option.Some(value)`
    EnumVariant {
        enum_name: Spanned<Symbol>,
        variant: Spanned<Symbol>,
        payload: Option<Box<Pattern>>,
    },
}

impl Pattern {
    /// Whether this pattern matches every value of its type.
    pub fn is_irrefutable(&self) -> bool {
        match &self.kind {
            PatternKind::Wildcard | PatternKind::Binding { .. } => true,
            PatternKind::Tuple(elements) => elements.iter().all(Pattern::is_irrefutable),
            PatternKind::Literal(_) | PatternKind::EnumVariant { .. } => false,
        }
    }

    /// Collect the names this pattern binds, in source order.
    pub fn bound_names(&self, out: &mut Vec<(Spanned<Symbol>, bool)>) {
        match &self.kind {
            PatternKind::Binding { name, mutable } => out.push((name.clone(), *mutable)),
            PatternKind::Tuple(elements) => {
                for element in elements {
                    element.bound_names(out);
                }
            }
            PatternKind::EnumVariant {
                payload: Some(inner),
                ..
            } => inner.bound_names(out),
            _ => {}
        }
    }
}

// ============================================================
// Types
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Named type, possibly generic: `i32`, `Point`, `Pair<A, B>`
    Named {
        name: Spanned<Symbol>,
        type_args: Vec<Type>,
    },

    /// Pointer: `*const T`, `*mut T`
    Pointer { mutable: bool, pointee: Box<Type> },

    /// Slice: `[]T`
    Slice(Box<Type>),

    /// Fixed-size array: `[N]T` with a constant size expression.
    Array { size: Box<Expr>, element: Box<Type> },

    /// Tuple: `(T1, T2)`. At least two elements; `(T)` is a parenthesized
    /// type and `()` is rejected at parse time.
    Tuple(Vec<Type>),

    /// `Result<T, E>`
    Result { ok: Box<Type>, err: Box<Type> },

    /// `Option<T>`
    Option(Box<Type>),

    /// `TaskHandle<T>`
    TaskHandle(Box<Type>),

    /// `void`, valid in return position only.
    Void,
}
