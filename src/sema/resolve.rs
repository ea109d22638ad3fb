//! Declaration registration.
//!
//! Registration is ordered so that every later step sees every name it
//! may legally reference: type names first, then constants (array
//! sizes in types may use them), then field and variant types, then
//! function and method signatures. Bodies are not touched here.

use std::collections::HashSet;
use std::sync::Arc;

use crate::ast::{
    self, Annotation, AnnotationKind, ConstDecl, Declaration, EnumDecl, ExternDecl, FfiTransfer,
    FnDecl, ImplBlock, StructDecl, Symbol,
};
use crate::span::Spanned;

use super::check::ConstValue;
use super::error::{SemaResult, SemanticError, SemanticErrorKind};
use super::scope::{Binding, BindingKind, ScopeKind, TypeDef};
use super::types::{
    EnumInfo, FieldInfo, MethodInfo, PrimitiveTy, StructInfo, Type, VariantInfo,
};
use super::Analyzer;

impl Analyzer {
    /// Phase 1 entry: open the module scope and register every
    /// top-level declaration. The module scope stays active for body
    /// checking.
    pub(crate) fn register_declarations(&mut self, program: &ast::Program) {
        self.table.push_scope(ScopeKind::Module, program.span);

        // Type names first so any signature can reference any struct
        // or enum regardless of declaration order.
        for decl in &program.declarations {
            match decl {
                Declaration::Struct(decl) => self.register_struct_name(decl),
                Declaration::Enum(decl) => self.register_enum_name(decl),
                _ => {}
            }
        }

        // Constants next, in declaration order: a constant's type and
        // initializer may use constants declared above it.
        for decl in &program.declarations {
            if let Declaration::Const(decl) = decl {
                self.register_const(decl);
            }
        }

        // Field and variant types, now that every type name resolves.
        for decl in &program.declarations {
            match decl {
                Declaration::Struct(decl) => self.register_struct_fields(decl),
                Declaration::Enum(decl) => self.register_enum_variants(decl),
                _ => {}
            }
        }

        // Function-like declarations last.
        for decl in &program.declarations {
            match decl {
                Declaration::Function(decl) => self.register_function(decl),
                Declaration::ExternFn(decl) => self.register_extern(decl),
                Declaration::Impl(decl) => self.register_impl(decl),
                _ => {}
            }
        }
    }

    fn register_struct_name(&mut self, decl: &StructDecl) {
        self.check_decl_annotations(&decl.annotations);
        let name = self.name(decl.name.node);

        let placeholder = StructInfo {
            name: name.clone(),
            vis: decl.vis,
            type_params: self.param_names(&decl.type_params),
            fields: Vec::new(),
            span: decl.span,
        };
        self.structs.insert(name.clone(), Arc::new(placeholder));

        let result = self
            .table
            .define_type(&name, TypeDef::Struct, decl.name.span);
        self.report(result);
    }

    fn register_enum_name(&mut self, decl: &EnumDecl) {
        self.check_decl_annotations(&decl.annotations);
        let name = self.name(decl.name.node);

        let placeholder = EnumInfo {
            name: name.clone(),
            vis: decl.vis,
            type_params: self.param_names(&decl.type_params),
            variants: Vec::new(),
            span: decl.span,
        };
        self.enums.insert(name.clone(), Arc::new(placeholder));

        let result = self.table.define_type(&name, TypeDef::Enum, decl.name.span);
        self.report(result);
    }

    /// Register a constant and evaluate its initializer. Evaluation in
    /// declaration order means a constant may only use constants
    /// declared above it.
    fn register_const(&mut self, decl: &ConstDecl) {
        self.check_decl_annotations(&decl.annotations);
        let name = self.name(decl.name.node);
        let declared = self.lower_type_or_error(&decl.ty);

        let binding = Binding {
            kind: BindingKind::Constant,
            ty: declared.clone(),
            mutable: false,
            vis: decl.vis,
            span: decl.name.span,
        };
        let result = self.table.define(&name, binding);
        self.report(result);

        let value = match self.const_eval(&decl.value, "constant initializer") {
            Ok(value) => value,
            Err(err) => {
                self.error(err);
                return;
            }
        };

        if !const_value_fits(&value, &declared) {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::Mismatch {
                    expected: declared,
                    found: super::check::const_value_type(&value),
                },
                decl.value.span,
            )));
            return;
        }

        self.const_values.insert(name, value);
    }

    fn register_struct_fields(&mut self, decl: &StructDecl) {
        let name = self.name(decl.name.node);

        self.table.push_scope(ScopeKind::Block, decl.span);
        self.bind_type_params(&decl.type_params);

        let mut fields = Vec::with_capacity(decl.fields.len());
        let mut seen = HashSet::new();
        for field in &decl.fields {
            let field_name = self.name(field.name.node);
            if !seen.insert(field_name.clone()) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::DuplicateDefinition { name: field_name },
                    field.name.span,
                )));
                continue;
            }
            fields.push(FieldInfo {
                name: field_name,
                vis: field.vis,
                ty: self.lower_type_or_error(&field.ty),
                span: field.span,
            });
        }

        self.table.pop_scope();

        let info = StructInfo {
            name: name.clone(),
            vis: decl.vis,
            type_params: self.param_names(&decl.type_params),
            fields,
            span: decl.span,
        };
        self.structs.insert(name, Arc::new(info));
    }

    fn register_enum_variants(&mut self, decl: &EnumDecl) {
        let name = self.name(decl.name.node);

        self.table.push_scope(ScopeKind::Block, decl.span);
        self.bind_type_params(&decl.type_params);

        let mut variants = Vec::with_capacity(decl.variants.len());
        let mut seen = HashSet::new();
        for variant in &decl.variants {
            let variant_name = self.name(variant.name.node);
            if !seen.insert(variant_name.clone()) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::DuplicateDefinition { name: variant_name },
                    variant.name.span,
                )));
                continue;
            }

            let payload = variant
                .payload
                .as_ref()
                .map(|ty| self.lower_type_or_error(ty));

            let discriminant = variant
                .discriminant
                .as_ref()
                .and_then(|expr| self.eval_discriminant(expr));

            variants.push(VariantInfo {
                name: variant_name,
                payload,
                discriminant,
                span: variant.span,
            });
        }

        self.table.pop_scope();

        let info = EnumInfo {
            name: name.clone(),
            vis: decl.vis,
            type_params: self.param_names(&decl.type_params),
            variants,
            span: decl.span,
        };
        self.enums.insert(name, Arc::new(info));
    }

    fn eval_discriminant(&mut self, expr: &ast::Expr) -> Option<i64> {
        match self.const_eval(expr, "enum discriminant") {
            Ok(ConstValue::Int(value)) => Some(value),
            Ok(other) => {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::Mismatch {
                        expected: Type::i32(),
                        found: super::check::const_value_type(&other),
                    },
                    expr.span,
                )));
                None
            }
            Err(err) => {
                self.error(err);
                None
            }
        }
    }

    fn register_function(&mut self, decl: &FnDecl) {
        self.check_decl_annotations(&decl.annotations);
        let name = self.name(decl.name.node);
        let ty = self.lower_signature(&decl.params, &decl.return_type);

        let binding = Binding {
            kind: BindingKind::Function,
            ty,
            mutable: false,
            vis: decl.vis,
            span: decl.name.span,
        };
        let result = self.table.define(&name, binding);
        self.report(result);
    }

    fn register_extern(&mut self, decl: &ExternDecl) {
        self.check_decl_annotations(&decl.annotations);
        let name = self.name(decl.name.node);
        let ty = self.lower_signature(&decl.params, &decl.return_type);

        let binding = Binding {
            kind: BindingKind::Function,
            ty,
            mutable: false,
            vis: decl.vis,
            span: decl.name.span,
        };
        let result = self.table.define(&name, binding);
        self.report(result);
    }

    /// Register the methods of an `impl` block. Methods live in their
    /// own registry keyed by struct name, not in the value namespace.
    fn register_impl(&mut self, decl: &ImplBlock) {
        self.check_decl_annotations(&decl.annotations);
        let struct_name = self.name(decl.struct_name.node);

        match self.table.lookup_type(&struct_name) {
            Some(TypeDef::Struct) => {}
            Some(_) => {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::NotAStruct {
                        name: struct_name.clone(),
                    },
                    decl.struct_name.span,
                )));
                return;
            }
            None => {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::UndefinedType {
                        name: struct_name.clone(),
                    },
                    decl.struct_name.span,
                )));
                return;
            }
        }

        for method in &decl.methods {
            self.check_decl_annotations(&method.annotations);
            let method_name = self.name(method.name.node);

            let already = self
                .methods
                .get(&struct_name)
                .is_some_and(|ms| ms.iter().any(|m| m.name == method_name));
            if already {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::DuplicateDefinition { name: method_name },
                    method.name.span,
                )));
                continue;
            }

            let params = method
                .params
                .iter()
                .map(|p| self.lower_type_or_error(&p.ty))
                .collect();
            let ret = self.lower_type_or_error(&method.return_type);

            self.methods
                .entry(struct_name.clone())
                .or_default()
                .push(MethodInfo {
                    name: method_name,
                    vis: method.vis,
                    takes_self: method.takes_self,
                    params,
                    ret,
                    span: method.name.span,
                });
        }
    }

    fn lower_signature(&mut self, params: &[ast::Param], return_type: &ast::Type) -> Type {
        let param_tys = params
            .iter()
            .map(|p| self.lower_type_or_error(&p.ty))
            .collect();
        let ret = self.lower_type_or_error(return_type);
        Type::function(param_tys, ret)
    }

    /// `#[borrowed]` marks a parameter-level loan; anywhere else it is
    /// an error.
    fn check_decl_annotations(&mut self, annotations: &[Annotation]) {
        for annotation in annotations {
            if matches!(
                annotation.kind,
                AnnotationKind::FfiTransfer(FfiTransfer::Borrowed)
            ) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::BorrowedOutsideParam,
                    annotation.span,
                )));
            }
        }
    }

    fn param_names(&self, params: &[Spanned<Symbol>]) -> Vec<String> {
        params.iter().map(|p| self.name(p.node)).collect()
    }

    /// Put a declaration's type parameters in scope, rejecting
    /// repeats: `struct Pair<A, A>` is an error.
    fn bind_type_params(&mut self, params: &[Spanned<Symbol>]) {
        let mut seen = HashSet::new();
        for param in params {
            let name = self.name(param.node);
            if !seen.insert(name.clone()) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::DuplicateTypeParam { name },
                    param.span,
                )));
                continue;
            }
            let result = self.table.define_type(&name, TypeDef::Param, param.span);
            self.report(result);
        }
    }

    /// Lower a syntactic type to a descriptor, reporting failures and
    /// substituting the error sentinel so one bad type does not kill
    /// the declaration around it.
    pub(crate) fn lower_type_or_error(&mut self, ty: &ast::Type) -> Type {
        match self.lower_type(ty) {
            Ok(lowered) => lowered,
            Err(err) => {
                self.error(err);
                Type::error()
            }
        }
    }

    /// Lower a syntactic type to a descriptor.
    pub(crate) fn lower_type(&self, ty: &ast::Type) -> SemaResult<Type> {
        match &ty.kind {
            ast::TypeKind::Named { name, type_args } => self.lower_named(name, type_args),
            ast::TypeKind::Pointer { mutable, pointee } => {
                Ok(Type::pointer(*mutable, self.lower_type(pointee)?))
            }
            ast::TypeKind::Slice(element) => Ok(Type::slice(self.lower_type(element)?)),
            ast::TypeKind::Array { size, element } => {
                let element = self.lower_type(element)?;
                match self.const_eval(size, "array size")? {
                    ConstValue::Int(n) if n >= 0 => Ok(Type::array(element, n as u64)),
                    ConstValue::Int(n) => SemanticError::new(
                        SemanticErrorKind::NegativeArraySize { value: n },
                        size.span,
                    )
                    .into_err(),
                    other => SemanticError::new(
                        SemanticErrorKind::Mismatch {
                            expected: Type::i32(),
                            found: super::check::const_value_type(&other),
                        },
                        size.span,
                    )
                    .into_err(),
                }
            }
            ast::TypeKind::Tuple(elements) => {
                let elements = elements
                    .iter()
                    .map(|e| self.lower_type(e))
                    .collect::<SemaResult<Vec<_>>>()?;
                Ok(Type::tuple(elements))
            }
            ast::TypeKind::Result { ok, err } => {
                Ok(Type::result(self.lower_type(ok)?, self.lower_type(err)?))
            }
            ast::TypeKind::Option(inner) => Ok(Type::option(self.lower_type(inner)?)),
            ast::TypeKind::TaskHandle(inner) => Ok(Type::task_handle(self.lower_type(inner)?)),
            ast::TypeKind::Void => Ok(Type::unit()),
        }
    }

    fn lower_named(
        &self,
        name: &Spanned<Symbol>,
        type_args: &[ast::Type],
    ) -> SemaResult<Type> {
        let text = self.name(name.node);

        if let Some(primitive) = PrimitiveTy::from_name(&text) {
            if !type_args.is_empty() {
                return SemanticError::new(
                    SemanticErrorKind::WrongTypeArgCount {
                        name: text,
                        expected: 0,
                        found: type_args.len(),
                    },
                    name.span,
                )
                .into_err();
            }
            return Ok(Type::primitive(primitive));
        }

        match self.table.lookup_type(&text) {
            Some(TypeDef::Param) => {
                if !type_args.is_empty() {
                    return SemanticError::new(
                        SemanticErrorKind::WrongTypeArgCount {
                            name: text,
                            expected: 0,
                            found: type_args.len(),
                        },
                        name.span,
                    )
                    .into_err();
                }
                Ok(Type::type_param(text))
            }
            Some(TypeDef::Struct) => {
                let declared = self
                    .structs
                    .get(&text)
                    .map(|info| info.type_params.len())
                    .unwrap_or(0);
                let args = self.lower_type_args(&text, type_args, declared, name.span)?;
                Ok(Type::struct_ref(text, args))
            }
            Some(TypeDef::Enum) => {
                let declared = self
                    .enums
                    .get(&text)
                    .map(|info| info.type_params.len())
                    .unwrap_or(0);
                let args = self.lower_type_args(&text, type_args, declared, name.span)?;
                Ok(Type::enum_ref(text, args))
            }
            None => SemanticError::new(
                SemanticErrorKind::UndefinedType { name: text },
                name.span,
            )
            .into_err(),
        }
    }

    fn lower_type_args(
        &self,
        name: &str,
        type_args: &[ast::Type],
        declared: usize,
        span: crate::span::Span,
    ) -> SemaResult<Vec<Type>> {
        if type_args.len() != declared {
            return SemanticError::new(
                SemanticErrorKind::WrongTypeArgCount {
                    name: name.to_string(),
                    expected: declared,
                    found: type_args.len(),
                },
                span,
            )
            .into_err();
        }
        type_args.iter().map(|arg| self.lower_type(arg)).collect()
    }
}

/// Whether a constant value satisfies a declared type. Integer and
/// float literals adopt any type of their own numeric family.
fn const_value_fits(value: &ConstValue, declared: &Type) -> bool {
    if declared.is_error() {
        return true;
    }
    match value {
        ConstValue::Int(_) => declared.is_integer(),
        ConstValue::Float(_) => declared.is_float(),
        ConstValue::Bool(_) => declared.is_bool(),
        ConstValue::Str(_) => declared.is_string(),
        ConstValue::Char(_) => matches!(
            declared.kind(),
            super::types::TypeKind::Primitive(PrimitiveTy::Char)
        ),
        ConstValue::Unit => declared.is_unit(),
    }
}
