//! Semantic analysis: turns a parsed program into a validated, typed
//! program or a list of diagnostics.
//!
//! Analysis runs as cooperating passes over one shared [`Analyzer`]:
//!
//! 1. **Declaration registration** ([`resolve`]): struct and enum names
//!    first, then constants, then field, variant, and signature types,
//!    so declarations can reference each other in any order.
//! 2. **Body checking** ([`check`]): every function and method body is
//!    checked statement by statement against the registered
//!    signatures.
//!
//! Each stage runs only if the previous stage recorded no errors;
//! warnings pass through freely. Individual checks return
//! [`SemaResult`] and the pass drivers convert failures into
//! diagnostics, so one bad declaration never hides its siblings.

pub mod check;
pub mod error;
pub mod exhaustiveness;
pub mod resolve;
pub mod scope;
pub mod types;

#[cfg(test)]
mod tests;

pub use check::ConstValue;
pub use error::{SemaResult, SemanticError, SemanticErrorKind};
pub use exhaustiveness::{check_exhaustiveness, EnumVariantInfo, ExhaustivenessResult};
pub use scope::{Binding, BindingKind, BuiltinFn, Scope, ScopeKind, SymbolTable, TypeDef};
pub use types::{
    EnumInfo, FieldInfo, MethodInfo, PrimitiveTy, StructInfo, Type, TypeKind, VariantInfo,
};

use std::collections::HashMap;
use std::sync::Arc;

use string_interner::DefaultStringInterner;

use crate::ast;
use crate::diagnostics::Diagnostic;
use crate::span::Span;

/// Progress of the analysis pipeline over one program.
///
/// The pipeline is linear: `Init` -> `DeclarationsRegistered` ->
/// `BodiesAnalyzed` -> `Succeeded`, bailing to `Failed` from any stage
/// that records an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Init,
    DeclarationsRegistered,
    BodiesAnalyzed,
    Succeeded,
    Failed,
}

/// The result of successful analysis.
#[derive(Debug)]
pub struct AnalyzedProgram {
    /// Every scope opened during analysis, with the module scope still
    /// on the active chain.
    pub symbols: SymbolTable,
    /// Registered struct declarations by name.
    pub structs: HashMap<String, Arc<StructInfo>>,
    /// Registered enum declarations by name.
    pub enums: HashMap<String, Arc<EnumInfo>>,
    /// Methods registered from `impl` blocks, by struct name.
    pub methods: HashMap<String, Vec<MethodInfo>>,
    /// Resolved type of every expression, keyed by source span.
    pub expr_types: HashMap<Span, Type>,
    /// Non-fatal diagnostics: unreachable arms and similar notices.
    pub warnings: Vec<Diagnostic>,
    /// The interner the parser handed over, for resolving names
    /// downstream.
    pub interner: DefaultStringInterner,
}

/// Shared state of the analysis passes.
pub struct Analyzer {
    pub(crate) interner: DefaultStringInterner,
    pub(crate) table: SymbolTable,
    pub(crate) structs: HashMap<String, Arc<StructInfo>>,
    pub(crate) enums: HashMap<String, Arc<EnumInfo>>,
    pub(crate) methods: HashMap<String, Vec<MethodInfo>>,
    /// Values of constants evaluated so far, for array sizes and later
    /// initializers.
    pub(crate) const_values: HashMap<String, ConstValue>,
    pub(crate) expr_types: HashMap<Span, Type>,
    /// Errors and warnings in emission order.
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) error_count: usize,
    pub(crate) state: AnalysisState,
    /// Declared return type of the body currently being checked.
    pub(crate) current_return: Option<Type>,
}

impl Analyzer {
    pub fn new(interner: DefaultStringInterner) -> Self {
        let mut table = SymbolTable::new();

        // The root scope holds the functions every program can call
        // without declaring them.
        for builtin in BuiltinFn::all() {
            let binding = Binding {
                kind: BindingKind::Builtin(builtin),
                ty: builtin.signature(),
                mutable: false,
                vis: ast::Visibility::Public,
                span: Span::dummy(),
            };
            table
                .define(builtin.name(), binding)
                .expect("BUG: builtin names are distinct and the root scope starts empty");
        }

        Analyzer {
            interner,
            table,
            structs: HashMap::new(),
            enums: HashMap::new(),
            methods: HashMap::new(),
            const_values: HashMap::new(),
            expr_types: HashMap::new(),
            diagnostics: Vec::new(),
            error_count: 0,
            state: AnalysisState::Init,
            current_return: None,
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// Resolve an interned symbol back to its text.
    pub(crate) fn name(&self, symbol: ast::Symbol) -> String {
        self.interner
            .resolve(symbol)
            .expect("BUG: every symbol in the tree was interned by the parser")
            .to_string()
    }

    /// Record a semantic error and keep going.
    pub(crate) fn error(&mut self, err: Box<SemanticError>) {
        self.diagnostics.push(err.to_diagnostic());
        self.error_count += 1;
    }

    /// Record a warning.
    pub(crate) fn warn(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Convert a check result into a diagnostic, keeping the value.
    pub(crate) fn report<T>(&mut self, result: SemaResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.error(err);
                None
            }
        }
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn into_analyzed(self) -> AnalyzedProgram {
        AnalyzedProgram {
            symbols: self.table,
            structs: self.structs,
            enums: self.enums,
            methods: self.methods,
            expr_types: self.expr_types,
            // No errors were recorded, so everything left is a
            // warning.
            warnings: self.diagnostics,
            interner: self.interner,
        }
    }
}

/// Analyze a parsed program.
///
/// Takes the interner the parser used so names resolve consistently;
/// [`crate::parser::Parser::take_interner`] hands it over. On failure
/// the full diagnostic list is returned, warnings included.
pub fn analyze_program(
    program: &ast::Program,
    interner: DefaultStringInterner,
) -> Result<AnalyzedProgram, Vec<Diagnostic>> {
    let mut analyzer = Analyzer::new(interner);

    // Phase 1: register every top-level declaration so bodies can
    // reference declarations in any order.
    analyzer.register_declarations(program);
    if analyzer.has_errors() {
        analyzer.state = AnalysisState::Failed;
        return Err(analyzer.into_diagnostics());
    }
    analyzer.state = AnalysisState::DeclarationsRegistered;

    // Phase 2: check every function and method body.
    analyzer.check_bodies(program);
    analyzer.state = AnalysisState::BodiesAnalyzed;
    if analyzer.has_errors() {
        analyzer.state = AnalysisState::Failed;
        return Err(analyzer.into_diagnostics());
    }

    analyzer.state = AnalysisState::Succeeded;
    Ok(analyzer.into_analyzed())
}
