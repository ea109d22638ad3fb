//! Resolved type descriptors.
//!
//! The parser's type nodes are lowered into these descriptors during
//! declaration registration. Descriptors are structural: two types are
//! interchangeable only when their kinds match exactly, except for the
//! error sentinel which is compatible with everything so one failure
//! does not cascade into follow-on diagnostics.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::Visibility;
use crate::span::Span;

/// A resolved type. Cheap to clone; the kind is shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type {
    kind: Arc<TypeKind>,
}

/// The structural kinds of the language's types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveTy),
    /// A declared struct, possibly instantiated: `Pair<i32, bool>`.
    Struct { name: String, args: Vec<Type> },
    /// A declared enum, possibly instantiated.
    Enum { name: String, args: Vec<Type> },
    /// A function signature.
    Fn { params: Vec<Type>, ret: Type },
    /// Raw pointer: `*mut T` or `*const T`.
    Pointer { mutable: bool, pointee: Type },
    /// Dynamically sized view: `[]T`.
    Slice { element: Type },
    /// Fixed-size array: `[N]T`.
    Array { element: Type, size: u64 },
    /// Tuple of two or more elements.
    Tuple(Vec<Type>),
    /// Built-in `Result<T, E>`.
    Result { ok: Type, err: Type },
    /// Built-in `Option<T>`.
    Option { inner: Type },
    /// Built-in `TaskHandle<T>` produced by `spawn_with_handle`.
    TaskHandle { inner: Type },
    /// An in-scope generic type parameter, by declared name.
    Param(String),
    /// Sentinel recorded for nodes whose type could not be determined.
    Error,
}

/// Built-in scalar and textual types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTy {
    Int(IntTy),
    Uint(UintTy),
    Float(FloatTy),
    Bool,
    Char,
    String,
    /// The `void` type. Also the type of the unit literal `()`.
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    Isize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UintTy {
    U8,
    U16,
    U32,
    U64,
    Usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatTy {
    F32,
    F64,
}

impl PrimitiveTy {
    /// Resolve a primitive by source name. `int` and `float` are
    /// aliases for `i32` and `f32`.
    pub fn from_name(name: &str) -> Option<PrimitiveTy> {
        let ty = match name {
            "i8" => PrimitiveTy::Int(IntTy::I8),
            "i16" => PrimitiveTy::Int(IntTy::I16),
            "i32" | "int" => PrimitiveTy::Int(IntTy::I32),
            "i64" => PrimitiveTy::Int(IntTy::I64),
            "isize" => PrimitiveTy::Int(IntTy::Isize),
            "u8" => PrimitiveTy::Uint(UintTy::U8),
            "u16" => PrimitiveTy::Uint(UintTy::U16),
            "u32" => PrimitiveTy::Uint(UintTy::U32),
            "u64" => PrimitiveTy::Uint(UintTy::U64),
            "usize" => PrimitiveTy::Uint(UintTy::Usize),
            "f32" | "float" => PrimitiveTy::Float(FloatTy::F32),
            "f64" => PrimitiveTy::Float(FloatTy::F64),
            "bool" => PrimitiveTy::Bool,
            "char" => PrimitiveTy::Char,
            "string" => PrimitiveTy::String,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveTy::Int(_) | PrimitiveTy::Uint(_) | PrimitiveTy::Float(_)
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, PrimitiveTy::Int(_) | PrimitiveTy::Uint(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveTy::Float(_))
    }

    /// Size in bytes, for `sizeof` in constant initializers. Pointer
    /// width is 8.
    pub fn byte_size(&self) -> u64 {
        match self {
            PrimitiveTy::Int(IntTy::I8) | PrimitiveTy::Uint(UintTy::U8) => 1,
            PrimitiveTy::Int(IntTy::I16) | PrimitiveTy::Uint(UintTy::U16) => 2,
            PrimitiveTy::Int(IntTy::I32) | PrimitiveTy::Uint(UintTy::U32) => 4,
            PrimitiveTy::Int(IntTy::I64) | PrimitiveTy::Uint(UintTy::U64) => 8,
            PrimitiveTy::Int(IntTy::Isize) | PrimitiveTy::Uint(UintTy::Usize) => 8,
            PrimitiveTy::Float(FloatTy::F32) => 4,
            PrimitiveTy::Float(FloatTy::F64) => 8,
            PrimitiveTy::Bool => 1,
            PrimitiveTy::Char => 4,
            // Pointer plus length.
            PrimitiveTy::String => 16,
            PrimitiveTy::Unit => 0,
        }
    }
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type {
            kind: Arc::new(kind),
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn primitive(p: PrimitiveTy) -> Self {
        Type::new(TypeKind::Primitive(p))
    }

    pub fn unit() -> Self {
        Type::primitive(PrimitiveTy::Unit)
    }

    pub fn error() -> Self {
        Type::new(TypeKind::Error)
    }

    pub fn bool() -> Self {
        Type::primitive(PrimitiveTy::Bool)
    }

    pub fn char_ty() -> Self {
        Type::primitive(PrimitiveTy::Char)
    }

    pub fn string() -> Self {
        Type::primitive(PrimitiveTy::String)
    }

    pub fn i32() -> Self {
        Type::primitive(PrimitiveTy::Int(IntTy::I32))
    }

    pub fn i64() -> Self {
        Type::primitive(PrimitiveTy::Int(IntTy::I64))
    }

    pub fn usize() -> Self {
        Type::primitive(PrimitiveTy::Uint(UintTy::Usize))
    }

    pub fn f32() -> Self {
        Type::primitive(PrimitiveTy::Float(FloatTy::F32))
    }

    pub fn f64() -> Self {
        Type::primitive(PrimitiveTy::Float(FloatTy::F64))
    }

    pub fn pointer(mutable: bool, pointee: Type) -> Self {
        Type::new(TypeKind::Pointer { mutable, pointee })
    }

    pub fn slice(element: Type) -> Self {
        Type::new(TypeKind::Slice { element })
    }

    pub fn array(element: Type, size: u64) -> Self {
        Type::new(TypeKind::Array { element, size })
    }

    pub fn tuple(elements: Vec<Type>) -> Self {
        Type::new(TypeKind::Tuple(elements))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::new(TypeKind::Fn { params, ret })
    }

    pub fn struct_ref(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::new(TypeKind::Struct {
            name: name.into(),
            args,
        })
    }

    pub fn enum_ref(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::new(TypeKind::Enum {
            name: name.into(),
            args,
        })
    }

    pub fn result(ok: Type, err: Type) -> Self {
        Type::new(TypeKind::Result { ok, err })
    }

    pub fn option(inner: Type) -> Self {
        Type::new(TypeKind::Option { inner })
    }

    pub fn task_handle(inner: Type) -> Self {
        Type::new(TypeKind::TaskHandle { inner })
    }

    pub fn type_param(name: impl Into<String>) -> Self {
        Type::new(TypeKind::Param(name.into()))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind(), TypeKind::Error)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(PrimitiveTy::Unit))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(PrimitiveTy::Bool))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(PrimitiveTy::String))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(p) if p.is_numeric())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(p) if p.is_integer())
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(p) if p.is_float())
    }

    /// Structural equality with the error sentinel compatible with
    /// everything, recursively.
    pub fn compatible(&self, other: &Type) -> bool {
        use TypeKind::*;

        match (self.kind(), other.kind()) {
            (Error, _) | (_, Error) => true,
            (Primitive(a), Primitive(b)) => a == b,
            (
                Struct { name: a, args: x },
                Struct { name: b, args: y },
            )
            | (Enum { name: a, args: x }, Enum { name: b, args: y }) => {
                a == b && x.len() == y.len() && x.iter().zip(y).all(|(l, r)| l.compatible(r))
            }
            (
                Fn {
                    params: pa,
                    ret: ra,
                },
                Fn {
                    params: pb,
                    ret: rb,
                },
            ) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(l, r)| l.compatible(r))
                    && ra.compatible(rb)
            }
            (
                Pointer {
                    mutable: ma,
                    pointee: a,
                },
                Pointer {
                    mutable: mb,
                    pointee: b,
                },
            ) => ma == mb && a.compatible(b),
            (Slice { element: a }, Slice { element: b }) => a.compatible(b),
            (
                Array {
                    element: a,
                    size: na,
                },
                Array {
                    element: b,
                    size: nb,
                },
            ) => na == nb && a.compatible(b),
            (Tuple(a), Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(l, r)| l.compatible(r))
            }
            (Result { ok: oa, err: ea }, Result { ok: ob, err: eb }) => {
                oa.compatible(ob) && ea.compatible(eb)
            }
            (Option { inner: a }, Option { inner: b })
            | (TaskHandle { inner: a }, TaskHandle { inner: b }) => a.compatible(b),
            (Param(a), Param(b)) => a == b,
            _ => false,
        }
    }

    /// Assignability into a target slot. Equal to [`compatible`] plus
    /// the one coercion the language has: a fixed array decays to a
    /// slice of the same element type.
    ///
    /// [`compatible`]: Type::compatible
    pub fn assignable_to(&self, target: &Type) -> bool {
        if self.compatible(target) {
            return true;
        }
        match (self.kind(), target.kind()) {
            (TypeKind::Array { element, .. }, TypeKind::Slice { element: t }) => {
                element.compatible(t)
            }
            _ => false,
        }
    }

    /// Replace named type parameters with their instantiations.
    pub fn substitute(&self, map: &HashMap<String, Type>) -> Type {
        use TypeKind::*;

        match self.kind() {
            Param(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            Primitive(_) | Error => self.clone(),
            Struct { name, args } => Type::new(Struct {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
            }),
            Enum { name, args } => Type::new(Enum {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
            }),
            Fn { params, ret } => Type::new(Fn {
                params: params.iter().map(|p| p.substitute(map)).collect(),
                ret: ret.substitute(map),
            }),
            Pointer { mutable, pointee } => Type::pointer(*mutable, pointee.substitute(map)),
            Slice { element } => Type::slice(element.substitute(map)),
            Array { element, size } => Type::array(element.substitute(map), *size),
            Tuple(elements) => {
                Type::tuple(elements.iter().map(|e| e.substitute(map)).collect())
            }
            Result { ok, err } => Type::result(ok.substitute(map), err.substitute(map)),
            Option { inner } => Type::option(inner.substitute(map)),
            TaskHandle { inner } => Type::task_handle(inner.substitute(map)),
        }
    }

    /// Size in bytes when statically known. Aggregates with layout the
    /// front end does not compute return `None`.
    pub fn byte_size(&self) -> Option<u64> {
        match self.kind() {
            TypeKind::Primitive(p) => Some(p.byte_size()),
            TypeKind::Pointer { .. } => Some(8),
            // Pointer plus length.
            TypeKind::Slice { .. } => Some(16),
            TypeKind::Array { element, size } => {
                element.byte_size().map(|e| e.saturating_mul(*size))
            }
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveTy::Int(IntTy::I8) => "i8",
            PrimitiveTy::Int(IntTy::I16) => "i16",
            PrimitiveTy::Int(IntTy::I32) => "i32",
            PrimitiveTy::Int(IntTy::I64) => "i64",
            PrimitiveTy::Int(IntTy::Isize) => "isize",
            PrimitiveTy::Uint(UintTy::U8) => "u8",
            PrimitiveTy::Uint(UintTy::U16) => "u16",
            PrimitiveTy::Uint(UintTy::U32) => "u32",
            PrimitiveTy::Uint(UintTy::U64) => "u64",
            PrimitiveTy::Uint(UintTy::Usize) => "usize",
            PrimitiveTy::Float(FloatTy::F32) => "f32",
            PrimitiveTy::Float(FloatTy::F64) => "f64",
            PrimitiveTy::Bool => "bool",
            PrimitiveTy::Char => "char",
            PrimitiveTy::String => "string",
            PrimitiveTy::Unit => "void",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_args(f: &mut fmt::Formatter<'_>, args: &[Type]) -> fmt::Result {
            if args.is_empty() {
                return Ok(());
            }
            write!(f, "<")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")
        }

        match self {
            TypeKind::Primitive(p) => write!(f, "{p}"),
            TypeKind::Struct { name, args } | TypeKind::Enum { name, args } => {
                write!(f, "{name}")?;
                write_args(f, args)
            }
            TypeKind::Fn { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            TypeKind::Pointer { mutable, pointee } => {
                let qual = if *mutable { "mut" } else { "const" };
                write!(f, "*{qual} {pointee}")
            }
            TypeKind::Slice { element } => write!(f, "[]{element}"),
            TypeKind::Array { element, size } => write!(f, "[{size}]{element}"),
            TypeKind::Tuple(elements) => {
                write!(f, "(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            TypeKind::Result { ok, err } => write!(f, "Result<{ok}, {err}>"),
            TypeKind::Option { inner } => write!(f, "Option<{inner}>"),
            TypeKind::TaskHandle { inner } => write!(f, "TaskHandle<{inner}>"),
            TypeKind::Param(name) => f.write_str(name),
            TypeKind::Error => f.write_str("{error}"),
        }
    }
}

// ============================================================
// Declared-type metadata
// ============================================================

/// A registered struct declaration.
#[derive(Debug, Clone)]
pub struct StructInfo {
    pub name: String,
    pub vis: Visibility,
    pub type_params: Vec<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldInfo>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub vis: Visibility,
    pub ty: Type,
    pub span: Span,
}

impl StructInfo {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A registered enum declaration.
#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub name: String,
    pub vis: Visibility,
    pub type_params: Vec<String>,
    /// Variants in declaration order.
    pub variants: Vec<VariantInfo>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariantInfo {
    pub name: String,
    pub payload: Option<Type>,
    pub discriminant: Option<i64>,
    pub span: Span,
}

impl EnumInfo {
    pub fn variant(&self, name: &str) -> Option<&VariantInfo> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_names(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.name.clone()).collect()
    }
}

/// A method registered from an `impl` block.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub vis: Visibility,
    pub takes_self: bool,
    pub params: Vec<Type>,
    pub ret: Type,
    pub span: Span,
}
