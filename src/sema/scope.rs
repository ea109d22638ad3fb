//! Lexical scopes and the symbol table.
//!
//! Scopes live in an arena indexed by position; the active chain is a
//! stack of indices. Popping a scope removes it from the stack but not
//! from the arena, so bindings stay inspectable after analysis.

use std::collections::HashMap;

use crate::ast::Visibility;
use crate::span::Span;

use super::error::{SemaResult, SemanticError, SemanticErrorKind};
use super::types::Type;

/// What kind of region a scope covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Predeclared names: built-in functions.
    Root,
    /// Top-level declarations of the compiled file.
    Module,
    /// A function or method body, including its parameters.
    Function,
    /// A brace-delimited block inside a body.
    Block,
    /// A `for` loop body.
    Loop,
    /// One arm of a `match`, holding its pattern bindings.
    MatchArm,
    /// An `unsafe` block.
    Unsafe,
    /// An `impl` block, while its methods are analyzed.
    Impl,
}

/// One lexical scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Value namespace: variables, functions, constants.
    pub bindings: HashMap<String, Binding>,
    /// Type namespace: structs, enums, in-scope type parameters.
    pub type_bindings: HashMap<String, TypeDef>,
    pub parent: Option<usize>,
    pub span: Span,
}

/// A name in the value namespace.
#[derive(Debug, Clone)]
pub struct Binding {
    pub kind: BindingKind,
    pub ty: Type,
    pub mutable: bool,
    pub vis: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `let` binding, parameter, loop variable, or pattern binding.
    Variable,
    /// Declared function or extern function.
    Function,
    /// Predeclared function available without declaration.
    Builtin(BuiltinFn),
    /// `const` declaration.
    Constant,
}

/// Functions available in every program without declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFn {
    /// `log(message: string) -> void`
    Log,
    /// `range(start: i32, end: i32) -> []i32`
    Range,
    /// `panic(message: string) -> void`
    Panic,
    /// `args() -> []string`
    Args,
    /// `len(collection) -> i32`, over arrays, slices, and strings.
    Len,
    /// `infinite() -> []i32`
    Infinite,
}

impl BuiltinFn {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFn::Log => "log",
            BuiltinFn::Range => "range",
            BuiltinFn::Panic => "panic",
            BuiltinFn::Args => "args",
            BuiltinFn::Len => "len",
            BuiltinFn::Infinite => "infinite",
        }
    }

    pub fn all() -> [BuiltinFn; 6] {
        [
            BuiltinFn::Log,
            BuiltinFn::Range,
            BuiltinFn::Panic,
            BuiltinFn::Args,
            BuiltinFn::Len,
            BuiltinFn::Infinite,
        ]
    }

    /// Nominal signature. `len` accepts any array, slice, or string
    /// argument; the call checker special-cases it and the slot here
    /// only names the result type.
    pub fn signature(&self) -> Type {
        match self {
            BuiltinFn::Log => Type::function(vec![Type::string()], Type::unit()),
            BuiltinFn::Range => {
                Type::function(vec![Type::i32(), Type::i32()], Type::slice(Type::i32()))
            }
            BuiltinFn::Panic => Type::function(vec![Type::string()], Type::unit()),
            BuiltinFn::Args => Type::function(Vec::new(), Type::slice(Type::string())),
            BuiltinFn::Len => Type::function(vec![Type::error()], Type::i32()),
            BuiltinFn::Infinite => Type::function(Vec::new(), Type::slice(Type::i32())),
        }
    }
}

/// A name in the type namespace. Struct and enum metadata lives in the
/// analyzer's registries; this tag only resolves the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Struct,
    Enum,
    /// Generic type parameter, in scope while its declaration is
    /// lowered.
    Param,
}

/// The scope arena plus the active-scope stack.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    scope_stack: Vec<usize>,
}

impl SymbolTable {
    /// Create a table containing only the root scope.
    pub fn new() -> Self {
        let root = Scope {
            kind: ScopeKind::Root,
            bindings: HashMap::new(),
            type_bindings: HashMap::new(),
            parent: None,
            span: Span::dummy(),
        };
        SymbolTable {
            scopes: vec![root],
            scope_stack: vec![0],
        }
    }

    fn current_idx(&self) -> usize {
        *self
            .scope_stack
            .last()
            .expect("BUG: scope stack should never be empty - root scope must always be present")
    }

    pub fn current_scope(&self) -> &Scope {
        &self.scopes[self.current_idx()]
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        let idx = self.current_idx();
        &mut self.scopes[idx]
    }

    /// Open a child of the current scope and make it active.
    pub fn push_scope(&mut self, kind: ScopeKind, span: Span) {
        let parent = Some(self.current_idx());
        let idx = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            bindings: HashMap::new(),
            type_bindings: HashMap::new(),
            parent,
            span,
        });
        self.scope_stack.push(idx);
    }

    /// Close the current scope. The root scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scope_stack.len() > 1 {
            self.scope_stack.pop();
        }
    }

    /// Define a value-namespace name in the current scope. Duplicates
    /// within one scope are rejected; shadowing an outer scope is fine.
    pub fn define(&mut self, name: &str, binding: Binding) -> SemaResult<()> {
        let span = binding.span;
        let scope = self.current_scope_mut();
        if scope.bindings.contains_key(name) {
            return SemanticError::new(
                SemanticErrorKind::DuplicateDefinition {
                    name: name.to_string(),
                },
                span,
            )
            .into_err();
        }
        scope.bindings.insert(name.to_string(), binding);
        Ok(())
    }

    /// Define a type-namespace name in the current scope.
    pub fn define_type(&mut self, name: &str, def: TypeDef, span: Span) -> SemaResult<()> {
        let scope = self.current_scope_mut();
        if scope.type_bindings.contains_key(name) {
            return SemanticError::new(
                SemanticErrorKind::DuplicateDefinition {
                    name: name.to_string(),
                },
                span,
            )
            .into_err();
        }
        scope.type_bindings.insert(name.to_string(), def);
        Ok(())
    }

    /// Look a name up in the value namespace, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        let mut idx = Some(self.current_idx());
        while let Some(i) = idx {
            let scope = &self.scopes[i];
            if let Some(binding) = scope.bindings.get(name) {
                return Some(binding.clone());
            }
            idx = scope.parent;
        }
        None
    }

    /// Look a name up in the type namespace, innermost scope first.
    pub fn lookup_type(&self, name: &str) -> Option<TypeDef> {
        let mut idx = Some(self.current_idx());
        while let Some(i) = idx {
            let scope = &self.scopes[i];
            if let Some(def) = scope.type_bindings.get(name) {
                return Some(def.clone());
            }
            idx = scope.parent;
        }
        None
    }

    /// Whether the active chain sits inside a loop, without crossing a
    /// function boundary.
    pub fn in_loop(&self) -> bool {
        for &idx in self.scope_stack.iter().rev() {
            match self.scopes[idx].kind {
                ScopeKind::Loop => return true,
                ScopeKind::Function => return false,
                _ => {}
            }
        }
        false
    }

    /// Whether the active chain sits inside an `unsafe` block, without
    /// crossing a function boundary.
    pub fn in_unsafe(&self) -> bool {
        for &idx in self.scope_stack.iter().rev() {
            match self.scopes[idx].kind {
                ScopeKind::Unsafe => return true,
                ScopeKind::Function => return false,
                _ => {}
            }
        }
        false
    }

    /// Number of scopes on the active chain.
    pub fn depth(&self) -> usize {
        self.scope_stack.len()
    }

    /// All scopes ever opened, for inspection after analysis.
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(ty: Type, mutable: bool) -> Binding {
        Binding {
            kind: BindingKind::Variable,
            ty,
            mutable,
            vis: Visibility::Private,
            span: Span::dummy(),
        }
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Module, Span::dummy());
        table.define("x", variable(Type::i32(), false)).unwrap();
        table.push_scope(ScopeKind::Function, Span::dummy());
        table.push_scope(ScopeKind::Block, Span::dummy());

        let found = table.lookup("x").unwrap();
        assert!(found.ty.compatible(&Type::i32()));
    }

    #[test]
    fn same_scope_duplicate_is_rejected() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Function, Span::dummy());
        table.define("x", variable(Type::i32(), false)).unwrap();
        let err = table.define("x", variable(Type::bool(), false));
        assert!(err.is_err());
    }

    #[test]
    fn shadowing_in_nested_scope_is_allowed() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Function, Span::dummy());
        table.define("x", variable(Type::i32(), false)).unwrap();
        table.push_scope(ScopeKind::Block, Span::dummy());
        assert!(table.define("x", variable(Type::bool(), true)).is_ok());

        let found = table.lookup("x").unwrap();
        assert!(found.ty.is_bool());
        assert!(found.mutable);
    }

    #[test]
    fn popped_scope_bindings_are_invisible() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Function, Span::dummy());
        table.push_scope(ScopeKind::Block, Span::dummy());
        table.define("inner", variable(Type::i32(), false)).unwrap();
        table.pop_scope();
        assert!(table.lookup("inner").is_none());
    }

    #[test]
    fn loop_detection_stops_at_function_boundary() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Function, Span::dummy());
        table.push_scope(ScopeKind::Loop, Span::dummy());
        assert!(table.in_loop());

        // A nested function body does not inherit the loop.
        table.push_scope(ScopeKind::Function, Span::dummy());
        assert!(!table.in_loop());
    }

    #[test]
    fn unsafe_detection_sees_nested_blocks() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Function, Span::dummy());
        assert!(!table.in_unsafe());
        table.push_scope(ScopeKind::Unsafe, Span::dummy());
        table.push_scope(ScopeKind::Block, Span::dummy());
        assert!(table.in_unsafe());
        table.pop_scope();
        table.pop_scope();
        assert!(!table.in_unsafe());
    }
}
