//! Body checking: the second analysis pass.
//!
//! Every function and method body is walked statement by statement
//! against the signatures pass one registered. Expression inference
//! threads an optional expected type downward so untyped literals can
//! adopt the type the context wants, and records the resolved type of
//! every expression in a side table keyed by span. The error sentinel
//! type is compatible with everything, so one bad subexpression
//! produces exactly one diagnostic instead of a cascade.
//!
//! Constant evaluation also lives here: constant initializers, array
//! sizes, and enum discriminants all go through [`Analyzer::const_eval`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ast::{
    self, ArrayExpr, BinOp, Block, Declaration, ElseBranch, EnumVariantValue, Expr, ExprKind,
    FieldInit, FnDecl, IfStmt, ImplBlock, Literal, LiteralKind, MatchArm, Pattern, PatternKind,
    Statement, Symbol, UnaryOp,
};
use crate::diagnostics::{Diagnostic, ErrorCode};
use crate::span::{Span, Spanned};

use super::error::{SemaResult, SemanticError, SemanticErrorKind};
use super::exhaustiveness::{check_exhaustiveness, EnumVariantInfo};
use super::scope::{Binding, BindingKind, BuiltinFn, ScopeKind, TypeDef};
use super::types::{EnumInfo, PrimitiveTy, Type, TypeKind, VariantInfo};
use super::Analyzer;

/// A compile-time value produced by [`Analyzer::const_eval`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Char(char),
    Unit,
}

/// The semantic type a constant value defaults to.
pub(crate) fn const_value_type(value: &ConstValue) -> Type {
    match value {
        ConstValue::Int(_) => Type::i32(),
        ConstValue::Float(_) => Type::f32(),
        ConstValue::Bool(_) => Type::bool(),
        ConstValue::Str(_) => Type::string(),
        ConstValue::Char(_) => Type::char_ty(),
        ConstValue::Unit => Type::unit(),
    }
}

impl Analyzer {
    /// Phase 2 entry: check every function and method body against the
    /// registered signatures.
    pub(crate) fn check_bodies(&mut self, program: &ast::Program) {
        for decl in &program.declarations {
            match decl {
                Declaration::Function(decl) => self.check_function(decl, None),
                Declaration::Impl(block) => self.check_impl(block),
                _ => {}
            }
        }
    }

    fn check_impl(&mut self, block: &ImplBlock) {
        let struct_name = self.name(block.struct_name.node);
        let self_ty = Type::struct_ref(struct_name, Vec::new());
        for method in &block.methods {
            self.check_function(method, Some(self_ty.clone()));
        }
    }

    /// Check one body. The function scope holds the parameters and the
    /// body's own statements; `self_ty` is present for methods.
    fn check_function(&mut self, decl: &FnDecl, self_ty: Option<Type>) {
        self.table.push_scope(ScopeKind::Function, decl.span);

        if decl.takes_self {
            if let Some(ty) = self_ty {
                let binding = Binding {
                    kind: BindingKind::Variable,
                    ty,
                    mutable: true,
                    vis: ast::Visibility::Private,
                    span: decl.name.span,
                };
                let result = self.table.define("self", binding);
                self.report(result);
            }
        }

        for param in &decl.params {
            let name = self.name(param.name.node);
            let ty = self.lower_type_or_error(&param.ty);
            let binding = Binding {
                kind: BindingKind::Variable,
                ty,
                mutable: false,
                vis: ast::Visibility::Private,
                span: param.name.span,
            };
            let result = self.table.define(&name, binding);
            self.report(result);
        }

        let ret = self.lower_type_or_error(&decl.return_type);
        let saved = self.current_return.replace(ret);

        for statement in &decl.body.statements {
            self.check_statement(statement);
        }

        self.current_return = saved;
        self.table.pop_scope();
    }

    // === Statements ===

    fn check_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Let {
                name,
                mutable,
                ty,
                value,
                ..
            } => self.check_let(name, *mutable, ty, value),
            Statement::Assign { target, value, .. } => self.check_assign(target, value),
            Statement::Expr { expr, .. } => {
                self.infer_or_error(expr, None);
            }
            Statement::Return { value, .. } => self.check_return(value),
            Statement::If(stmt) => self.check_if(stmt),
            Statement::IfLet {
                pattern,
                value,
                then_block,
                else_branch,
                ..
            } => self.check_if_let(pattern, value, then_block, else_branch.as_ref()),
            Statement::For {
                variable,
                iterable,
                body,
                ..
            } => self.check_for(variable, iterable, body),
            Statement::Match {
                scrutinee, arms, ..
            } => self.check_match(scrutinee, arms),
            Statement::Spawn { call, .. } => {
                // The task's result is discarded; the call itself still
                // has to type-check.
                self.infer_or_error(call, None);
            }
            Statement::SpawnWithHandle { handle, call, .. } => {
                self.check_spawn_with_handle(handle, call)
            }
            Statement::Unsafe { block, .. } => self.check_block(block, ScopeKind::Unsafe),
            Statement::Break { span } => self.check_loop_exit("break", *span),
            Statement::Continue { span } => self.check_loop_exit("continue", *span),
        }
    }

    fn check_block(&mut self, block: &Block, kind: ScopeKind) {
        self.table.push_scope(kind, block.span);
        for statement in &block.statements {
            self.check_statement(statement);
        }
        self.table.pop_scope();
    }

    fn check_let(&mut self, name: &Spanned<Symbol>, mutable: bool, ty: &ast::Type, value: &Expr) {
        let declared = self.lower_type_or_error(ty);
        let found = self.infer_or_error(value, Some(&declared));
        if !found.assignable_to(&declared) {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::Mismatch {
                    expected: declared.clone(),
                    found,
                },
                value.span,
            )));
        }

        // The initializer is checked before the name is in scope, so
        // `let x: i32 = x;` refers to an outer `x` or nothing.
        let text = self.name(name.node);
        let binding = Binding {
            kind: BindingKind::Variable,
            ty: declared,
            mutable,
            vis: ast::Visibility::Private,
            span: name.span,
        };
        let result = self.table.define(&text, binding);
        self.report(result);
    }

    fn check_assign(&mut self, target: &Expr, value: &Expr) {
        match self.resolve_assign_target(target) {
            Ok(target_ty) => {
                let found = self.infer_or_error(value, Some(&target_ty));
                if !found.assignable_to(&target_ty) {
                    self.error(Box::new(SemanticError::new(
                        SemanticErrorKind::Mismatch {
                            expected: target_ty,
                            found,
                        },
                        value.span,
                    )));
                }
            }
            Err(err) => {
                self.error(err);
                self.infer_or_error(value, None);
            }
        }
    }

    /// Resolve the type of an assignment target. Mutability and unsafe
    /// violations are reported in place so the value expression is
    /// still checked against the right type; only structural failures
    /// propagate.
    fn resolve_assign_target(&mut self, target: &Expr) -> SemaResult<Type> {
        match &target.kind {
            ExprKind::Identifier(sym) => {
                let name = self.name(*sym);
                let binding = match self.table.lookup(&name) {
                    Some(binding) => binding,
                    None => {
                        return SemanticError::new(
                            SemanticErrorKind::UndefinedName { name },
                            target.span,
                        )
                        .into_err();
                    }
                };
                match binding.kind {
                    BindingKind::Constant => {
                        SemanticError::new(SemanticErrorKind::AssignToConst { name }, target.span)
                            .into_err()
                    }
                    BindingKind::Function | BindingKind::Builtin(_) => SemanticError::new(
                        SemanticErrorKind::InvalidAssignmentTarget,
                        target.span,
                    )
                    .into_err(),
                    BindingKind::Variable => {
                        if !binding.mutable {
                            self.error(Box::new(SemanticError::new(
                                SemanticErrorKind::ImmutableAssign { name },
                                target.span,
                            )));
                        }
                        Ok(binding.ty)
                    }
                }
            }
            ExprKind::Field { base, field } => {
                let base_ty = self.resolve_assign_target(base)?;
                let fname = self.name(field.node);
                if fname == "len" && is_len_compatible(&base_ty) {
                    return SemanticError::new(
                        SemanticErrorKind::InvalidAssignmentTarget,
                        target.span,
                    )
                    .into_err();
                }
                self.field_type(&base_ty, &fname, field.span)
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.resolve_assign_target(base)?;
                self.check_index_expr(index);
                self.element_type(&base_ty, base.span)
            }
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => {
                // The pointer itself is read, not written.
                let pointer = self.infer_expr(operand, None)?;
                match pointer.kind() {
                    TypeKind::Pointer { mutable, pointee } => {
                        let mutable = *mutable;
                        let pointee = pointee.clone();
                        if !self.table.in_unsafe() {
                            self.error(Box::new(SemanticError::new(
                                SemanticErrorKind::UnsafeRequired {
                                    what: "assigning through a raw pointer",
                                },
                                target.span,
                            )));
                        }
                        if !mutable {
                            self.error(Box::new(SemanticError::new(
                                SemanticErrorKind::AssignThroughConstPointer {
                                    ty: pointer.clone(),
                                },
                                target.span,
                            )));
                        }
                        Ok(pointee)
                    }
                    TypeKind::Error => Ok(Type::error()),
                    _ => SemanticError::new(
                        SemanticErrorKind::InvalidUnaryOp {
                            op: "*",
                            ty: pointer.clone(),
                        },
                        operand.span,
                    )
                    .into_err(),
                }
            }
            ExprKind::Paren(inner) => self.resolve_assign_target(inner),
            _ => SemanticError::new(SemanticErrorKind::InvalidAssignmentTarget, target.span)
                .into_err(),
        }
    }

    fn check_return(&mut self, value: &Expr) {
        let expected = match self.current_return.clone() {
            Some(ty) => ty,
            None => return,
        };
        let found = self.infer_or_error(value, Some(&expected));
        if !found.assignable_to(&expected) {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::ReturnMismatch { expected, found },
                value.span,
            )));
        }
    }

    fn check_if(&mut self, stmt: &IfStmt) {
        self.check_condition(&stmt.condition);
        self.check_block(&stmt.then_block, ScopeKind::Block);
        match &stmt.else_branch {
            Some(ElseBranch::Block(block)) => self.check_block(block, ScopeKind::Block),
            Some(ElseBranch::If(nested)) => self.check_if(nested),
            None => {}
        }
    }

    fn check_if_let(
        &mut self,
        pattern: &Pattern,
        value: &Expr,
        then_block: &Block,
        else_branch: Option<&ElseBranch>,
    ) {
        let scrutinee = self.infer_or_error(value, None);

        // Pattern bindings are visible in the then-block only.
        self.table.push_scope(ScopeKind::Block, then_block.span);
        self.check_pattern(pattern, &scrutinee);
        for statement in &then_block.statements {
            self.check_statement(statement);
        }
        self.table.pop_scope();

        match else_branch {
            Some(ElseBranch::Block(block)) => self.check_block(block, ScopeKind::Block),
            Some(ElseBranch::If(nested)) => self.check_if(nested),
            None => {}
        }
    }

    fn check_for(&mut self, variable: &Spanned<Symbol>, iterable: &Expr, body: &Block) {
        let iter_ty = self.infer_or_error(iterable, None);
        let element = match iter_ty.kind() {
            TypeKind::Slice { element } | TypeKind::Array { element, .. } => element.clone(),
            TypeKind::Error => Type::error(),
            _ => {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::NotIterable {
                        ty: iter_ty.clone(),
                    },
                    iterable.span,
                )));
                Type::error()
            }
        };

        self.table.push_scope(ScopeKind::Loop, body.span);
        let name = self.name(variable.node);
        let binding = Binding {
            kind: BindingKind::Variable,
            ty: element,
            mutable: false,
            vis: ast::Visibility::Private,
            span: variable.span,
        };
        let result = self.table.define(&name, binding);
        self.report(result);

        for statement in &body.statements {
            self.check_statement(statement);
        }
        self.table.pop_scope();
    }

    fn check_loop_exit(&mut self, keyword: &'static str, span: Span) {
        if !self.table.in_loop() {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::OutsideLoop { keyword },
                span,
            )));
        }
    }

    fn check_spawn_with_handle(&mut self, handle: &Spanned<Symbol>, call: &Expr) {
        let result_ty = self.infer_or_error(call, None);
        let name = self.name(handle.node);
        let binding = Binding {
            kind: BindingKind::Variable,
            ty: Type::task_handle(result_ty),
            mutable: false,
            vis: ast::Visibility::Private,
            span: handle.span,
        };
        let result = self.table.define(&name, binding);
        self.report(result);
    }

    // === Match ===

    fn check_match(&mut self, scrutinee: &Expr, arms: &[MatchArm]) {
        let scrutinee_ty = self.infer_or_error(scrutinee, None);

        for arm in arms {
            self.table.push_scope(ScopeKind::MatchArm, arm.span);
            self.check_pattern(&arm.pattern, &scrutinee_ty);
            if let Some(guard) = &arm.guard {
                self.check_condition(guard);
            }
            for statement in &arm.body.statements {
                self.check_statement(statement);
            }
            self.table.pop_scope();
        }

        if scrutinee_ty.is_error() {
            return;
        }

        let enum_info = match scrutinee_ty.kind() {
            TypeKind::Enum { name, .. } => self.enums.get(name).map(|info| EnumVariantInfo {
                enum_name: name.clone(),
                variant_names: info.variant_names(),
            }),
            TypeKind::Option { .. } => Some(EnumVariantInfo {
                enum_name: "Option".to_string(),
                variant_names: vec!["Some".to_string(), "None".to_string()],
            }),
            TypeKind::Result { .. } => Some(EnumVariantInfo {
                enum_name: "Result".to_string(),
                variant_names: vec!["Ok".to_string(), "Err".to_string()],
            }),
            _ => None,
        };

        let result = check_exhaustiveness(arms, &scrutinee_ty, enum_info.as_ref(), &self.interner);
        if !result.is_exhaustive {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::NonExhaustiveMatch {
                    missing: result.missing_patterns,
                },
                scrutinee.span,
            )));
        }
        for index in result.unreachable_arms {
            self.warn(
                Diagnostic::warning("unreachable match arm", arms[index].span)
                    .with_error_code(ErrorCode::UnreachableMatchArm),
            );
        }
    }

    /// Check a pattern against the type it matches and bring its
    /// bindings into the current scope.
    fn check_pattern(&mut self, pattern: &Pattern, scrutinee: &Type) {
        match &pattern.kind {
            PatternKind::Wildcard => {}
            PatternKind::Literal(lit) => {
                let found = self.literal_type(lit, Some(scrutinee));
                if !found.compatible(scrutinee) {
                    self.error(Box::new(SemanticError::new(
                        SemanticErrorKind::PatternMismatch {
                            expected: scrutinee.clone(),
                        },
                        pattern.span,
                    )));
                }
            }
            PatternKind::Binding { mutable, name } => {
                let text = self.name(name.node);
                let binding = Binding {
                    kind: BindingKind::Variable,
                    ty: scrutinee.clone(),
                    mutable: *mutable,
                    vis: ast::Visibility::Private,
                    span: name.span,
                };
                let result = self.table.define(&text, binding);
                self.report(result);
            }
            PatternKind::Tuple(elements) => match scrutinee.kind() {
                TypeKind::Tuple(tys) if tys.len() == elements.len() => {
                    let tys = tys.clone();
                    for (element, ty) in elements.iter().zip(&tys) {
                        self.check_pattern(element, ty);
                    }
                }
                TypeKind::Tuple(tys) => {
                    let expected = tys.len();
                    self.error(Box::new(SemanticError::new(
                        SemanticErrorKind::TuplePatternArity {
                            expected,
                            found: elements.len(),
                        },
                        pattern.span,
                    )));
                }
                TypeKind::Error => {
                    for element in elements {
                        self.check_pattern(element, &Type::error());
                    }
                }
                _ => {
                    self.error(Box::new(SemanticError::new(
                        SemanticErrorKind::PatternMismatch {
                            expected: scrutinee.clone(),
                        },
                        pattern.span,
                    )));
                }
            },
            PatternKind::EnumVariant {
                enum_name,
                variant,
                payload,
            } => {
                self.check_variant_pattern(
                    pattern.span,
                    enum_name,
                    variant,
                    payload.as_deref(),
                    scrutinee,
                );
            }
        }
    }

    fn check_variant_pattern(
        &mut self,
        span: Span,
        enum_name: &Spanned<Symbol>,
        variant: &Spanned<Symbol>,
        payload: Option<&Pattern>,
        scrutinee: &Type,
    ) {
        let ename = self.name(enum_name.node);
        let vname = self.name(variant.node);

        match scrutinee.kind() {
            TypeKind::Option { inner } => {
                if ename != "Option" {
                    self.pattern_mismatch(scrutinee, span);
                    return;
                }
                let inner = inner.clone();
                match vname.as_str() {
                    "Some" => match payload {
                        Some(pattern) => self.check_pattern(pattern, &inner),
                        None => self.variant_payload_error(&ename, &vname, true, span),
                    },
                    "None" => {
                        if let Some(pattern) = payload {
                            self.variant_payload_error(&ename, &vname, false, pattern.span);
                        }
                    }
                    _ => self.unknown_variant_error(&ename, &vname, variant.span),
                }
            }
            TypeKind::Result { ok, err } => {
                if ename != "Result" {
                    self.pattern_mismatch(scrutinee, span);
                    return;
                }
                let (ok, err) = (ok.clone(), err.clone());
                match vname.as_str() {
                    "Ok" => match payload {
                        Some(pattern) => self.check_pattern(pattern, &ok),
                        None => self.variant_payload_error(&ename, &vname, true, span),
                    },
                    "Err" => match payload {
                        Some(pattern) => self.check_pattern(pattern, &err),
                        None => self.variant_payload_error(&ename, &vname, true, span),
                    },
                    _ => self.unknown_variant_error(&ename, &vname, variant.span),
                }
            }
            TypeKind::Enum { name, args } => {
                if ename != *name {
                    self.pattern_mismatch(scrutinee, span);
                    return;
                }
                let args = args.clone();
                let info = Arc::clone(
                    self.enums
                        .get(&ename)
                        .expect("BUG: enum type refers to an unregistered enum"),
                );
                let vinfo = match info.variant(&vname) {
                    Some(vinfo) => vinfo.clone(),
                    None => {
                        self.unknown_variant_error(&ename, &vname, variant.span);
                        return;
                    }
                };
                match (&vinfo.payload, payload) {
                    (Some(payload_ty), Some(pattern)) => {
                        let ty = payload_ty.substitute(&param_map(&info.type_params, &args));
                        self.check_pattern(pattern, &ty);
                    }
                    (Some(_), None) => self.variant_payload_error(&ename, &vname, true, span),
                    (None, Some(pattern)) => {
                        self.variant_payload_error(&ename, &vname, false, pattern.span)
                    }
                    (None, None) => {}
                }
            }
            TypeKind::Error => {
                if let Some(pattern) = payload {
                    self.check_pattern(pattern, &Type::error());
                }
            }
            _ => self.pattern_mismatch(scrutinee, span),
        }
    }

    fn pattern_mismatch(&mut self, expected: &Type, span: Span) {
        self.error(Box::new(SemanticError::new(
            SemanticErrorKind::PatternMismatch {
                expected: expected.clone(),
            },
            span,
        )));
    }

    fn variant_payload_error(
        &mut self,
        enum_name: &str,
        variant: &str,
        takes_payload: bool,
        span: Span,
    ) {
        self.error(Box::new(SemanticError::new(
            SemanticErrorKind::VariantPayloadMismatch {
                enum_name: enum_name.to_string(),
                variant: variant.to_string(),
                takes_payload,
            },
            span,
        )));
    }

    fn unknown_variant_error(&mut self, enum_name: &str, variant: &str, span: Span) {
        self.error(Box::new(SemanticError::new(
            SemanticErrorKind::UnknownVariant {
                enum_name: enum_name.to_string(),
                variant: variant.to_string(),
            },
            span,
        )));
    }

    fn check_condition(&mut self, condition: &Expr) {
        let ty = self.infer_or_error(condition, Some(&Type::bool()));
        if !ty.is_bool() && !ty.is_error() {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::ConditionNotBool { found: ty },
                condition.span,
            )));
        }
    }

    // === Expressions ===

    /// Infer an expression's type, converting any failure into a
    /// diagnostic and the error sentinel so checking continues.
    pub(crate) fn infer_or_error(&mut self, expr: &Expr, expected: Option<&Type>) -> Type {
        match self.infer_expr(expr, expected) {
            Ok(ty) => ty,
            Err(err) => {
                self.error(err);
                let ty = Type::error();
                self.expr_types.insert(expr.span, ty.clone());
                ty
            }
        }
    }

    /// Infer an expression's type and record it in the side table.
    /// `expected` lets literals and constructors adopt the type the
    /// context wants; it is a hint, not a check.
    fn infer_expr(&mut self, expr: &Expr, expected: Option<&Type>) -> SemaResult<Type> {
        let ty = self.infer_expr_inner(expr, expected)?;
        self.expr_types.insert(expr.span, ty.clone());
        Ok(ty)
    }

    fn infer_expr_inner(&mut self, expr: &Expr, expected: Option<&Type>) -> SemaResult<Type> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(self.literal_type(lit, expected)),
            ExprKind::Identifier(sym) => self.check_identifier(*sym, expr.span),
            ExprKind::Binary { op, left, right } => {
                self.check_binary(*op, left, right, expr.span, expected)
            }
            ExprKind::Unary { op, operand } => {
                self.check_unary(*op, operand, expr.span, expected)
            }
            ExprKind::Call { callee, args } => self.check_call(callee, args, expr.span),
            ExprKind::AssociatedCall {
                ty,
                type_args,
                function,
                args,
            } => self.check_associated_call(ty, type_args, function, args, expr.span),
            ExprKind::MethodCall { base, method, args } => {
                self.check_method_call(base, method, args, expr.span)
            }
            ExprKind::Field { base, field } => {
                let base_ty = self.infer_expr(base, None)?;
                let fname = self.name(field.node);
                self.field_type(&base_ty, &fname, field.span)
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.infer_expr(base, None)?;
                self.check_index_expr(index);
                self.element_type(&base_ty, base.span)
            }
            ExprKind::Slice { base, start, end } => {
                self.check_slice(base, start.as_deref(), end.as_deref())
            }
            ExprKind::EnumConstructor {
                enum_name,
                variant,
                value,
            } => self.check_enum_constructor(expr.span, enum_name, variant, value, expected),
            ExprKind::StructLiteral {
                name,
                type_args,
                fields,
            } => self.check_struct_literal(expr.span, name, type_args, fields, expected),
            ExprKind::Tuple(elements) => self.check_tuple(elements, expected),
            ExprKind::Array(array) => self.check_array(array, expected),
            ExprKind::Cast { expr: inner, ty } => self.check_cast(inner, ty, expr.span),
            ExprKind::Await { task } => self.check_await(task),
            ExprKind::SizeOf(ty) => {
                self.lower_type(ty)?;
                Ok(Type::usize())
            }
            ExprKind::Paren(inner) => self.infer_expr(inner, expected),
        }
    }

    /// Untyped integer and float literals adopt an expected type of
    /// their own numeric family; otherwise they default to `i32` and
    /// `f32`.
    fn literal_type(&self, lit: &Literal, expected: Option<&Type>) -> Type {
        match &lit.kind {
            LiteralKind::Int(_) => match expected {
                Some(ty) if ty.is_integer() => ty.clone(),
                _ => Type::i32(),
            },
            LiteralKind::Float(_) => match expected {
                Some(ty) if ty.is_float() => ty.clone(),
                _ => Type::f32(),
            },
            LiteralKind::String(_) => Type::string(),
            LiteralKind::Char(_) => Type::char_ty(),
            LiteralKind::Bool(_) => Type::bool(),
            LiteralKind::Unit => Type::unit(),
        }
    }

    fn check_identifier(&self, symbol: Symbol, span: Span) -> SemaResult<Type> {
        let name = self.name(symbol);
        match self.table.lookup(&name) {
            Some(binding) => Ok(binding.ty),
            None => SemanticError::new(SemanticErrorKind::UndefinedName { name }, span).into_err(),
        }
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        span: Span,
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        // Arithmetic and bitwise results have the operand type, so the
        // context's expected type flows into the operands; comparison
        // and logical operands are unrelated to the `bool` result.
        let operand_hint = if op.is_arithmetic() || op.is_bitwise() {
            expected.filter(|ty| ty.is_numeric())
        } else {
            None
        };
        let lt = self.infer_expr(left, operand_hint)?;
        let rt = self.infer_expr(right, Some(&lt))?;

        if lt.is_error() || rt.is_error() {
            return Ok(if op.is_comparison() || op.is_logical() {
                Type::bool()
            } else {
                Type::error()
            });
        }

        // `1 + x` where `x: i64`: retry the untyped literal side
        // against the other operand's type.
        let lt = if !lt.compatible(&rt) && literal_adopts(left, &rt) {
            self.infer_expr(left, Some(&rt))?
        } else {
            lt
        };

        if op.is_logical() {
            if lt.is_bool() && rt.is_bool() {
                return Ok(Type::bool());
            }
            return invalid_binary(op, &lt, &rt, span);
        }

        if op.is_comparison() {
            let comparable = match op {
                BinOp::Eq | BinOp::Ne => {
                    lt.is_numeric() || lt.is_bool() || lt.is_string() || is_char(&lt)
                }
                _ => lt.is_numeric() || is_char(&lt),
            };
            if comparable && lt.compatible(&rt) {
                return Ok(Type::bool());
            }
            return invalid_binary(op, &lt, &rt, span);
        }

        if op.is_bitwise() {
            if lt.is_integer() && lt.compatible(&rt) {
                return Ok(lt);
            }
            return invalid_binary(op, &lt, &rt, span);
        }

        // Arithmetic: numeric operands of the same type. `%` is
        // integer-only.
        if lt.is_numeric() && lt.compatible(&rt) {
            if op == BinOp::Rem && !lt.is_integer() {
                return invalid_binary(op, &lt, &rt, span);
            }
            return Ok(lt);
        }
        invalid_binary(op, &lt, &rt, span)
    }

    fn check_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        span: Span,
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        match op {
            UnaryOp::Neg => {
                let hint = expected.filter(|ty| ty.is_numeric());
                let ty = self.infer_expr(operand, hint)?;
                if ty.is_numeric() || ty.is_error() {
                    Ok(ty)
                } else {
                    SemanticError::new(SemanticErrorKind::InvalidUnaryOp { op: "-", ty }, span)
                        .into_err()
                }
            }
            UnaryOp::Not => {
                let ty = self.infer_expr(operand, Some(&Type::bool()))?;
                if ty.is_bool() || ty.is_error() {
                    Ok(Type::bool())
                } else {
                    SemanticError::new(SemanticErrorKind::InvalidUnaryOp { op: "!", ty }, span)
                        .into_err()
                }
            }
            UnaryOp::Deref => {
                let pointer = self.infer_expr(operand, None)?;
                match pointer.kind() {
                    TypeKind::Pointer { pointee, .. } => {
                        let pointee = pointee.clone();
                        if !self.table.in_unsafe() {
                            self.error(Box::new(SemanticError::new(
                                SemanticErrorKind::UnsafeRequired {
                                    what: "dereferencing a raw pointer",
                                },
                                span,
                            )));
                        }
                        Ok(pointee)
                    }
                    TypeKind::Error => Ok(Type::error()),
                    _ => SemanticError::new(
                        SemanticErrorKind::InvalidUnaryOp {
                            op: "*",
                            ty: pointer.clone(),
                        },
                        span,
                    )
                    .into_err(),
                }
            }
            UnaryOp::AddrOf => {
                // `&x` always yields a const pointer; mutable pointers
                // only come from FFI.
                let ty = self.infer_expr(operand, None)?;
                Ok(Type::pointer(false, ty))
            }
        }
    }

    // === Calls ===

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> SemaResult<Type> {
        // Builtins resolve by name before normal inference so `len`
        // can keep its shape-polymorphic argument.
        if let ExprKind::Identifier(sym) = &callee.kind {
            let name = self.name(*sym);
            if let Some(binding) = self.table.lookup(&name) {
                if let BindingKind::Builtin(builtin) = binding.kind {
                    self.expr_types.insert(callee.span, binding.ty.clone());
                    return self.check_builtin_call(builtin, args, span);
                }
            }
        }

        let callee_ty = self.infer_expr(callee, None)?;
        if callee_ty.is_error() {
            for arg in args {
                self.infer_or_error(arg, None);
            }
            return Ok(Type::error());
        }
        match callee_ty.kind() {
            TypeKind::Fn { params, ret } => {
                let params = params.clone();
                let ret = ret.clone();
                self.check_args(args, &params, span);
                Ok(ret)
            }
            _ => {
                for arg in args {
                    self.infer_or_error(arg, None);
                }
                SemanticError::new(
                    SemanticErrorKind::NotCallable {
                        ty: callee_ty.clone(),
                    },
                    callee.span,
                )
                .into_err()
            }
        }
    }

    fn check_builtin_call(
        &mut self,
        builtin: BuiltinFn,
        args: &[Expr],
        span: Span,
    ) -> SemaResult<Type> {
        // `len` accepts any array, slice, or string, which the
        // signature table cannot express.
        if builtin == BuiltinFn::Len {
            if args.len() != 1 {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::WrongArgCount {
                        expected: 1,
                        found: args.len(),
                    },
                    span,
                )));
                for arg in args {
                    self.infer_or_error(arg, None);
                }
                return Ok(Type::i32());
            }
            let ty = self.infer_or_error(&args[0], None);
            if !ty.is_error() && !is_len_compatible(&ty) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::InvalidLenArgument { ty },
                    args[0].span,
                )));
            }
            return Ok(Type::i32());
        }

        let signature = builtin.signature();
        match signature.kind() {
            TypeKind::Fn { params, ret } => {
                let params = params.clone();
                let ret = ret.clone();
                self.check_args(args, &params, span);
                Ok(ret)
            }
            // Builtin signatures are always function types.
            _ => Ok(Type::error()),
        }
    }

    /// Check a call's arguments against the parameter types. Arity and
    /// per-argument mismatches are reported in place so one call can
    /// surface several problems.
    fn check_args(&mut self, args: &[Expr], params: &[Type], span: Span) {
        if args.len() != params.len() {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::WrongArgCount {
                    expected: params.len(),
                    found: args.len(),
                },
                span,
            )));
        }
        for (arg, param) in args.iter().zip(params) {
            let found = self.infer_or_error(arg, Some(param));
            if !found.assignable_to(param) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::Mismatch {
                        expected: param.clone(),
                        found,
                    },
                    arg.span,
                )));
            }
        }
        for arg in args.iter().skip(params.len()) {
            self.infer_or_error(arg, None);
        }
    }

    fn check_method_call(
        &mut self,
        base: &Expr,
        method: &Spanned<Symbol>,
        args: &[Expr],
        span: Span,
    ) -> SemaResult<Type> {
        let base_ty = self.infer_expr(base, None)?;
        if base_ty.is_error() {
            for arg in args {
                self.infer_or_error(arg, None);
            }
            return Ok(Type::error());
        }

        let mname = self.name(method.node);
        let sname = match base_ty.kind() {
            TypeKind::Struct { name, .. } => name.clone(),
            _ => {
                return SemanticError::new(
                    SemanticErrorKind::NoMethod {
                        ty: base_ty.clone(),
                        method: mname,
                    },
                    method.span,
                )
                .into_err();
            }
        };

        let found = self
            .methods
            .get(&sname)
            .and_then(|methods| methods.iter().find(|m| m.name == mname))
            .cloned();
        match found {
            Some(info) if info.takes_self => {
                self.check_args(args, &info.params, span);
                Ok(info.ret)
            }
            Some(_) => SemanticError::new(
                SemanticErrorKind::NoMethod {
                    ty: base_ty,
                    method: mname.clone(),
                },
                method.span,
            )
            .with_help(format!(
                "`{mname}` is an associated function; call it as `{sname}::{mname}(...)`"
            ))
            .into_err(),
            None => SemanticError::new(
                SemanticErrorKind::NoMethod {
                    ty: base_ty,
                    method: mname,
                },
                method.span,
            )
            .into_err(),
        }
    }

    fn check_associated_call(
        &mut self,
        ty: &Spanned<Symbol>,
        type_args: &[ast::Type],
        function: &Spanned<Symbol>,
        args: &[Expr],
        span: Span,
    ) -> SemaResult<Type> {
        let tname = self.name(ty.node);
        match self.table.lookup_type(&tname) {
            Some(TypeDef::Struct) => {}
            Some(_) => {
                return SemanticError::new(
                    SemanticErrorKind::NotAStruct { name: tname },
                    ty.span,
                )
                .into_err();
            }
            None => {
                return SemanticError::new(
                    SemanticErrorKind::UndefinedType { name: tname },
                    ty.span,
                )
                .into_err();
            }
        }

        let info = Arc::clone(
            self.structs
                .get(&tname)
                .expect("BUG: type tagged as a struct has no registered metadata"),
        );
        let declared = info.type_params.len();
        let mut lowered = Vec::new();
        if !type_args.is_empty() {
            if type_args.len() != declared {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::WrongTypeArgCount {
                        name: tname.clone(),
                        expected: declared,
                        found: type_args.len(),
                    },
                    ty.span,
                )));
            }
            for arg in type_args {
                lowered.push(self.lower_type_or_error(arg));
            }
        }
        lowered.resize(declared, Type::error());

        let fname = self.name(function.node);
        let found = self
            .methods
            .get(&tname)
            .and_then(|methods| methods.iter().find(|m| m.name == fname))
            .cloned();
        match found {
            Some(info) if !info.takes_self => {
                self.check_args(args, &info.params, span);
                Ok(info.ret)
            }
            Some(_) => SemanticError::new(
                SemanticErrorKind::NoMethod {
                    ty: Type::struct_ref(tname.clone(), lowered),
                    method: fname.clone(),
                },
                function.span,
            )
            .with_help(format!(
                "`{fname}` is a method; call it as `value.{fname}(...)`"
            ))
            .into_err(),
            None => SemanticError::new(
                SemanticErrorKind::NoMethod {
                    ty: Type::struct_ref(tname, lowered),
                    method: fname,
                },
                function.span,
            )
            .into_err(),
        }
    }

    // === Field and index access ===

    fn field_type(&self, base: &Type, field: &str, span: Span) -> SemaResult<Type> {
        if base.is_error() {
            return Ok(Type::error());
        }
        match base.kind() {
            TypeKind::Struct { name, args } => {
                let info = Arc::clone(
                    self.structs
                        .get(name)
                        .expect("BUG: struct type refers to an unregistered struct"),
                );
                match info.field(field) {
                    Some(field_info) => {
                        if info.type_params.is_empty() {
                            Ok(field_info.ty.clone())
                        } else {
                            Ok(field_info
                                .ty
                                .substitute(&param_map(&info.type_params, args)))
                        }
                    }
                    None => SemanticError::new(
                        SemanticErrorKind::UnknownField {
                            ty: base.clone(),
                            field: field.to_string(),
                        },
                        span,
                    )
                    .into_err(),
                }
            }
            TypeKind::Tuple(elements) => match field.parse::<usize>() {
                Ok(index) if index < elements.len() => Ok(elements[index].clone()),
                _ => SemanticError::new(
                    SemanticErrorKind::UnknownField {
                        ty: base.clone(),
                        field: field.to_string(),
                    },
                    span,
                )
                .into_err(),
            },
            _ if field == "len" && is_len_compatible(base) => Ok(Type::i32()),
            _ => SemanticError::new(
                SemanticErrorKind::UnknownField {
                    ty: base.clone(),
                    field: field.to_string(),
                },
                span,
            )
            .into_err(),
        }
    }

    fn element_type(&self, base: &Type, span: Span) -> SemaResult<Type> {
        match base.kind() {
            TypeKind::Slice { element } | TypeKind::Array { element, .. } => Ok(element.clone()),
            TypeKind::Error => Ok(Type::error()),
            _ => SemanticError::new(
                SemanticErrorKind::NotIndexable { ty: base.clone() },
                span,
            )
            .into_err(),
        }
    }

    fn check_index_expr(&mut self, index: &Expr) {
        let ty = self.infer_or_error(index, Some(&Type::i32()));
        if !ty.is_integer() && !ty.is_error() {
            self.error(Box::new(SemanticError::new(
                SemanticErrorKind::Mismatch {
                    expected: Type::i32(),
                    found: ty,
                },
                index.span,
            )));
        }
    }

    fn check_slice(
        &mut self,
        base: &Expr,
        start: Option<&Expr>,
        end: Option<&Expr>,
    ) -> SemaResult<Type> {
        let base_ty = self.infer_expr(base, None)?;
        for bound in [start, end].into_iter().flatten() {
            self.check_index_expr(bound);
        }
        let element = self.element_type(&base_ty, base.span)?;
        Ok(Type::slice(element))
    }

    // === Constructors ===

    fn check_enum_constructor(
        &mut self,
        span: Span,
        enum_name: &Spanned<Symbol>,
        variant: &Spanned<Symbol>,
        value: &EnumVariantValue,
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        let ename = self.name(enum_name.node);
        if ename == "Option" {
            return self.check_option_constructor(span, variant, value, expected);
        }
        if ename == "Result" {
            return self.check_result_constructor(span, variant, value, expected);
        }
        self.check_user_constructor(span, ename, enum_name.span, variant, value, expected)
    }

    fn check_option_constructor(
        &mut self,
        span: Span,
        variant: &Spanned<Symbol>,
        value: &EnumVariantValue,
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        let vname = self.name(variant.node);

        if vname == "Some" {
            return match value {
                EnumVariantValue::Value(expr) => {
                    let hint = match expected.map(Type::kind) {
                        Some(TypeKind::Option { inner }) => Some(inner.clone()),
                        _ => None,
                    };
                    let inner = self.infer_expr(expr, hint.as_ref())?;
                    Ok(Type::option(inner))
                }
                _ => variant_payload_err("Option", "Some", true, span),
            };
        }

        if vname == "None" {
            return match value {
                EnumVariantValue::NoValue => {
                    if let Some(TypeKind::Option { inner }) = expected.map(Type::kind) {
                        return Ok(Type::option(inner.clone()));
                    }
                    SemanticError::new(
                        SemanticErrorKind::CannotInferTypeArgs {
                            name: "Option".to_string(),
                        },
                        span,
                    )
                    .into_err()
                }
                EnumVariantValue::TypeArgs(args) => {
                    if args.len() != 1 {
                        return SemanticError::new(
                            SemanticErrorKind::WrongTypeArgCount {
                                name: "Option".to_string(),
                                expected: 1,
                                found: args.len(),
                            },
                            span,
                        )
                        .into_err();
                    }
                    Ok(Type::option(self.lower_type(&args[0])?))
                }
                EnumVariantValue::Value(_) => variant_payload_err("Option", "None", false, span),
            };
        }

        SemanticError::new(
            SemanticErrorKind::UnknownVariant {
                enum_name: "Option".to_string(),
                variant: vname,
            },
            variant.span,
        )
        .into_err()
    }

    fn check_result_constructor(
        &mut self,
        span: Span,
        variant: &Spanned<Symbol>,
        value: &EnumVariantValue,
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        let vname = self.name(variant.node);
        let sides = match expected.map(Type::kind) {
            Some(TypeKind::Result { ok, err }) => Some((ok.clone(), err.clone())),
            _ => None,
        };

        // The constructor names one side; the other comes from the
        // expected type, or stays the error sentinel when there is no
        // context to take it from.
        if vname == "Ok" {
            return match value {
                EnumVariantValue::Value(expr) => {
                    let (hint, err_side) = match &sides {
                        Some((ok, err)) => (Some(ok.clone()), err.clone()),
                        None => (None, Type::error()),
                    };
                    let ok = self.infer_expr(expr, hint.as_ref())?;
                    Ok(Type::result(ok, err_side))
                }
                _ => variant_payload_err("Result", "Ok", true, span),
            };
        }

        if vname == "Err" {
            return match value {
                EnumVariantValue::Value(expr) => {
                    let (hint, ok_side) = match &sides {
                        Some((ok, err)) => (Some(err.clone()), ok.clone()),
                        None => (None, Type::error()),
                    };
                    let err = self.infer_expr(expr, hint.as_ref())?;
                    Ok(Type::result(ok_side, err))
                }
                _ => variant_payload_err("Result", "Err", true, span),
            };
        }

        SemanticError::new(
            SemanticErrorKind::UnknownVariant {
                enum_name: "Result".to_string(),
                variant: vname,
            },
            variant.span,
        )
        .into_err()
    }

    fn check_user_constructor(
        &mut self,
        span: Span,
        ename: String,
        name_span: Span,
        variant: &Spanned<Symbol>,
        value: &EnumVariantValue,
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        let info = match self.enums.get(&ename) {
            Some(info) => Arc::clone(info),
            None => {
                return if self.structs.contains_key(&ename) {
                    SemanticError::new(SemanticErrorKind::NotAnEnum { name: ename }, name_span)
                        .into_err()
                } else {
                    SemanticError::new(SemanticErrorKind::UndefinedType { name: ename }, name_span)
                        .into_err()
                };
            }
        };

        let vname = self.name(variant.node);
        let vinfo = match info.variant(&vname) {
            Some(vinfo) => vinfo.clone(),
            None => {
                return SemanticError::new(
                    SemanticErrorKind::UnknownVariant {
                        enum_name: ename,
                        variant: vname,
                    },
                    variant.span,
                )
                .into_err();
            }
        };

        if info.type_params.is_empty() {
            return self.check_plain_constructor(span, ename, &vname, &vinfo, value);
        }
        self.check_generic_constructor(span, &info, &vname, &vinfo, value, expected)
    }

    fn check_plain_constructor(
        &mut self,
        span: Span,
        ename: String,
        vname: &str,
        vinfo: &VariantInfo,
        value: &EnumVariantValue,
    ) -> SemaResult<Type> {
        match (&vinfo.payload, value) {
            (Some(payload_ty), EnumVariantValue::Value(expr)) => {
                let found = self.infer_or_error(expr, Some(payload_ty));
                if !found.assignable_to(payload_ty) {
                    self.error(Box::new(SemanticError::new(
                        SemanticErrorKind::Mismatch {
                            expected: payload_ty.clone(),
                            found,
                        },
                        expr.span,
                    )));
                }
                Ok(Type::enum_ref(ename, Vec::new()))
            }
            (Some(_), _) => variant_payload_err(&ename, vname, true, span),
            (None, EnumVariantValue::NoValue) => Ok(Type::enum_ref(ename, Vec::new())),
            (None, EnumVariantValue::Value(_)) => variant_payload_err(&ename, vname, false, span),
            (None, EnumVariantValue::TypeArgs(args)) => SemanticError::new(
                SemanticErrorKind::WrongTypeArgCount {
                    name: ename,
                    expected: 0,
                    found: args.len(),
                },
                span,
            )
            .into_err(),
        }
    }

    fn check_generic_constructor(
        &mut self,
        span: Span,
        info: &EnumInfo,
        vname: &str,
        vinfo: &VariantInfo,
        value: &EnumVariantValue,
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        let ename = info.name.clone();
        let declared = info.type_params.len();

        let expected_args = match expected.map(Type::kind) {
            Some(TypeKind::Enum { name, args }) if *name == ename && args.len() == declared => {
                Some(args.clone())
            }
            _ => None,
        };

        match value {
            // `Wrap<i32>.Empty`: spelled-out arguments, no payload.
            EnumVariantValue::TypeArgs(type_args) => {
                if type_args.len() != declared {
                    return SemanticError::new(
                        SemanticErrorKind::WrongTypeArgCount {
                            name: ename,
                            expected: declared,
                            found: type_args.len(),
                        },
                        span,
                    )
                    .into_err();
                }
                if vinfo.payload.is_some() {
                    return variant_payload_err(&ename, vname, true, span);
                }
                let args = type_args
                    .iter()
                    .map(|arg| self.lower_type(arg))
                    .collect::<SemaResult<Vec<_>>>()?;
                Ok(Type::enum_ref(ename, args))
            }
            EnumVariantValue::NoValue => {
                if vinfo.payload.is_some() {
                    return variant_payload_err(&ename, vname, true, span);
                }
                match expected_args {
                    Some(args) => Ok(Type::enum_ref(ename, args)),
                    None => SemanticError::new(
                        SemanticErrorKind::CannotInferTypeArgs { name: ename },
                        span,
                    )
                    .into_err(),
                }
            }
            EnumVariantValue::Value(expr) => {
                let payload_ty = match &vinfo.payload {
                    Some(ty) => ty.clone(),
                    None => return variant_payload_err(&ename, vname, false, span),
                };
                if let Some(args) = expected_args {
                    let want = payload_ty.substitute(&param_map(&info.type_params, &args));
                    let found = self.infer_or_error(expr, Some(&want));
                    if !found.assignable_to(&want) {
                        self.error(Box::new(SemanticError::new(
                            SemanticErrorKind::Mismatch {
                                expected: want,
                                found,
                            },
                            expr.span,
                        )));
                    }
                    return Ok(Type::enum_ref(ename, args));
                }
                // `Wrap.Of(x)` where the payload is exactly the single
                // parameter: take the argument from the payload.
                if declared == 1
                    && matches!(payload_ty.kind(), TypeKind::Param(p) if *p == info.type_params[0])
                {
                    let arg = self.infer_expr(expr, None)?;
                    return Ok(Type::enum_ref(ename, vec![arg]));
                }
                SemanticError::new(SemanticErrorKind::CannotInferTypeArgs { name: ename }, span)
                    .into_err()
            }
        }
    }

    fn check_struct_literal(
        &mut self,
        span: Span,
        name: &Spanned<Symbol>,
        type_args: &[ast::Type],
        fields: &[FieldInit],
        expected: Option<&Type>,
    ) -> SemaResult<Type> {
        let sname = self.name(name.node);
        match self.table.lookup_type(&sname) {
            Some(TypeDef::Struct) => {}
            Some(_) => {
                return SemanticError::new(SemanticErrorKind::NotAStruct { name: sname }, name.span)
                    .into_err();
            }
            None => {
                return SemanticError::new(
                    SemanticErrorKind::UndefinedType { name: sname },
                    name.span,
                )
                .into_err();
            }
        }
        let info = Arc::clone(
            self.structs
                .get(&sname)
                .expect("BUG: type tagged as a struct has no registered metadata"),
        );

        let declared = info.type_params.len();
        let mut args: Vec<Type> = Vec::new();
        if !type_args.is_empty() {
            if type_args.len() != declared {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::WrongTypeArgCount {
                        name: sname.clone(),
                        expected: declared,
                        found: type_args.len(),
                    },
                    name.span,
                )));
            }
            for arg in type_args {
                args.push(self.lower_type_or_error(arg));
            }
        } else if declared > 0 {
            if let Some(TypeKind::Struct {
                name: expected_name,
                args: expected_args,
            }) = expected.map(Type::kind)
            {
                if *expected_name == sname && expected_args.len() == declared {
                    args = expected_args.clone();
                }
            }
            if args.is_empty() {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::CannotInferTypeArgs {
                        name: sname.clone(),
                    },
                    name.span,
                )));
            }
        }
        args.resize(declared, Type::error());

        let map = param_map(&info.type_params, &args);
        let mut seen: HashSet<String> = HashSet::new();
        for init in fields {
            let fname = self.name(init.name.node);
            if !seen.insert(fname.clone()) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::DuplicateFieldInit { field: fname },
                    init.name.span,
                )));
                self.infer_or_error(&init.value, None);
                continue;
            }
            match info.field(&fname) {
                Some(field_info) => {
                    let want = field_info.ty.substitute(&map);
                    let found = self.infer_or_error(&init.value, Some(&want));
                    if !found.assignable_to(&want) {
                        self.error(Box::new(SemanticError::new(
                            SemanticErrorKind::Mismatch {
                                expected: want,
                                found,
                            },
                            init.value.span,
                        )));
                    }
                }
                None => {
                    self.error(Box::new(SemanticError::new(
                        SemanticErrorKind::UnknownField {
                            ty: Type::struct_ref(sname.clone(), args.clone()),
                            field: fname,
                        },
                        init.name.span,
                    )));
                    self.infer_or_error(&init.value, None);
                }
            }
        }

        for field_info in &info.fields {
            if !seen.contains(&field_info.name) {
                self.error(Box::new(SemanticError::new(
                    SemanticErrorKind::MissingField {
                        struct_name: sname.clone(),
                        field: field_info.name.clone(),
                    },
                    span,
                )));
            }
        }

        Ok(Type::struct_ref(sname, args))
    }

    fn check_tuple(&mut self, elements: &[Expr], expected: Option<&Type>) -> SemaResult<Type> {
        // The parser yields an empty tuple as its recovery
        // placeholder; give it the error sentinel so nothing
        // downstream reports on it again.
        if elements.is_empty() {
            return Ok(Type::error());
        }

        let hints = match expected.map(Type::kind) {
            Some(TypeKind::Tuple(tys)) if tys.len() == elements.len() => Some(tys.as_slice()),
            _ => None,
        };

        let mut tys = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let hint = hints.map(|h| &h[index]);
            tys.push(self.infer_or_error(element, hint));
        }
        Ok(Type::tuple(tys))
    }

    fn check_array(&mut self, array: &ArrayExpr, expected: Option<&Type>) -> SemaResult<Type> {
        let element_hint = match expected.map(Type::kind) {
            Some(TypeKind::Array { element, .. }) | Some(TypeKind::Slice { element }) => {
                Some(element.clone())
            }
            _ => None,
        };

        match array {
            ArrayExpr::List(elements) => {
                if elements.is_empty() {
                    // `[none]`: the element type must come from
                    // context.
                    let element = element_hint.unwrap_or_else(Type::error);
                    return Ok(Type::array(element, 0));
                }
                let first = self.infer_or_error(&elements[0], element_hint.as_ref());
                for element in &elements[1..] {
                    let ty = self.infer_or_error(element, Some(&first));
                    if !ty.assignable_to(&first) {
                        self.error(Box::new(SemanticError::new(
                            SemanticErrorKind::Mismatch {
                                expected: first.clone(),
                                found: ty,
                            },
                            element.span,
                        )));
                    }
                }
                Ok(Type::array(first, elements.len() as u64))
            }
            ArrayExpr::Repeat { value, count } => {
                let element = self.infer_or_error(value, element_hint.as_ref());
                match self.const_eval(count, "array length")? {
                    ConstValue::Int(n) if n >= 0 => Ok(Type::array(element, n as u64)),
                    ConstValue::Int(n) => SemanticError::new(
                        SemanticErrorKind::NegativeArraySize { value: n },
                        count.span,
                    )
                    .into_err(),
                    other => SemanticError::new(
                        SemanticErrorKind::Mismatch {
                            expected: Type::i32(),
                            found: const_value_type(&other),
                        },
                        count.span,
                    )
                    .into_err(),
                }
            }
        }
    }

    fn check_cast(&mut self, inner: &Expr, ty: &ast::Type, span: Span) -> SemaResult<Type> {
        let source = self.infer_expr(inner, None)?;
        let target = self.lower_type(ty)?;
        if source.is_error() || target.is_error() {
            return Ok(target);
        }

        let numeric_source = source.is_numeric() || source.is_bool() || is_char(&source);
        let allowed = (numeric_source && target.is_numeric())
            || matches!(
                (source.kind(), target.kind()),
                (TypeKind::Pointer { .. }, TypeKind::Pointer { .. })
            )
            || source.compatible(&target);
        if allowed {
            Ok(target)
        } else {
            SemanticError::new(
                SemanticErrorKind::InvalidCast {
                    from: source,
                    to: target,
                },
                span,
            )
            .into_err()
        }
    }

    fn check_await(&mut self, task: &Expr) -> SemaResult<Type> {
        let ty = self.infer_expr(task, None)?;
        match ty.kind() {
            TypeKind::TaskHandle { inner } => Ok(inner.clone()),
            TypeKind::Error => Ok(Type::error()),
            _ => SemanticError::new(
                SemanticErrorKind::AwaitNotTask { found: ty.clone() },
                task.span,
            )
            .into_err(),
        }
    }

    // === Constant evaluation ===

    /// Evaluate a constant expression.
    ///
    /// Only literal arithmetic, references to previously evaluated
    /// constants, `sizeof` on fixed-size types, and numeric casts are
    /// constant. `context` names the surrounding construct for the
    /// diagnostic.
    pub(crate) fn const_eval(&self, expr: &Expr, context: &'static str) -> SemaResult<ConstValue> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match &lit.kind {
                LiteralKind::Int(value) => ConstValue::Int(*value),
                LiteralKind::Float(value) => ConstValue::Float(value.0),
                LiteralKind::Bool(value) => ConstValue::Bool(*value),
                LiteralKind::String(value) => ConstValue::Str(value.clone()),
                LiteralKind::Char(value) => ConstValue::Char(*value),
                LiteralKind::Unit => ConstValue::Unit,
            }),
            ExprKind::Identifier(sym) => {
                let name = self.name(*sym);
                if let Some(value) = self.const_values.get(&name) {
                    return Ok(value.clone());
                }
                match self.table.lookup(&name) {
                    Some(binding) if matches!(binding.kind, BindingKind::Constant) => {
                        SemanticError::new(
                            SemanticErrorKind::NonConstExpr { context },
                            expr.span,
                        )
                        .with_help(format!(
                            "`{name}` is declared below this point; constants evaluate in declaration order"
                        ))
                        .into_err()
                    }
                    Some(_) => {
                        SemanticError::new(SemanticErrorKind::NonConstExpr { context }, expr.span)
                            .with_help(format!("`{name}` is not a constant"))
                            .into_err()
                    }
                    None => SemanticError::new(SemanticErrorKind::UndefinedName { name }, expr.span)
                        .into_err(),
                }
            }
            ExprKind::Unary { op, operand } => {
                let value = self.const_eval(operand, context)?;
                match (*op, value) {
                    (UnaryOp::Neg, ConstValue::Int(v)) => Ok(ConstValue::Int(v.wrapping_neg())),
                    (UnaryOp::Neg, ConstValue::Float(v)) => Ok(ConstValue::Float(-v)),
                    (UnaryOp::Not, ConstValue::Bool(v)) => Ok(ConstValue::Bool(!v)),
                    _ => SemanticError::new(SemanticErrorKind::NonConstExpr { context }, expr.span)
                        .into_err(),
                }
            }
            ExprKind::Binary { op, left, right } => {
                let lhs = self.const_eval(left, context)?;
                let rhs = self.const_eval(right, context)?;
                eval_const_binary(*op, &lhs, &rhs, expr.span, context)
            }
            ExprKind::Cast { expr: inner, ty } => {
                let value = self.const_eval(inner, context)?;
                let target = self.lower_type(ty)?;
                cast_const(&value, &target, expr.span, context)
            }
            ExprKind::SizeOf(ty) => {
                let target = self.lower_type(ty)?;
                match target.byte_size() {
                    Some(size) => Ok(ConstValue::Int(size as i64)),
                    None => SemanticError::new(
                        SemanticErrorKind::NonConstExpr { context },
                        expr.span,
                    )
                    .with_help(format!(
                        "the size of `{target}` is not known at compile time"
                    ))
                    .into_err(),
                }
            }
            ExprKind::Paren(inner) => self.const_eval(inner, context),
            _ => SemanticError::new(SemanticErrorKind::NonConstExpr { context }, expr.span)
                .into_err(),
        }
    }
}

// === Helpers ===

/// Whether an expression is an untyped numeric literal that could
/// adopt `ty`, looking through parentheses and negation.
fn literal_adopts(expr: &Expr, ty: &Type) -> bool {
    match &expr.kind {
        ExprKind::Literal(lit) => match lit.kind {
            LiteralKind::Int(_) => ty.is_integer(),
            LiteralKind::Float(_) => ty.is_float(),
            _ => false,
        },
        ExprKind::Paren(inner) => literal_adopts(inner, ty),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => literal_adopts(operand, ty),
        _ => false,
    }
}

fn is_char(ty: &Type) -> bool {
    matches!(ty.kind(), TypeKind::Primitive(PrimitiveTy::Char))
}

fn is_len_compatible(ty: &Type) -> bool {
    matches!(ty.kind(), TypeKind::Slice { .. } | TypeKind::Array { .. }) || ty.is_string()
}

fn param_map(params: &[String], args: &[Type]) -> HashMap<String, Type> {
    params.iter().cloned().zip(args.iter().cloned()).collect()
}

fn invalid_binary(op: BinOp, left: &Type, right: &Type, span: Span) -> SemaResult<Type> {
    SemanticError::new(
        SemanticErrorKind::InvalidBinaryOp {
            op: op.as_str(),
            left: left.clone(),
            right: right.clone(),
        },
        span,
    )
    .into_err()
}

fn variant_payload_err(
    enum_name: &str,
    variant: &str,
    takes_payload: bool,
    span: Span,
) -> SemaResult<Type> {
    SemanticError::new(
        SemanticErrorKind::VariantPayloadMismatch {
            enum_name: enum_name.to_string(),
            variant: variant.to_string(),
            takes_payload,
        },
        span,
    )
    .into_err()
}

/// Apply a binary operator to two constant values. Operands must be of
/// the same kind; there is no implicit widening.
fn eval_const_binary(
    op: BinOp,
    lhs: &ConstValue,
    rhs: &ConstValue,
    span: Span,
    context: &'static str,
) -> SemaResult<ConstValue> {
    match (lhs, rhs) {
        (ConstValue::Int(a), ConstValue::Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinOp::Eq => return Ok(ConstValue::Bool(a == b)),
                BinOp::Ne => return Ok(ConstValue::Bool(a != b)),
                BinOp::Lt => return Ok(ConstValue::Bool(a < b)),
                BinOp::Le => return Ok(ConstValue::Bool(a <= b)),
                BinOp::Gt => return Ok(ConstValue::Bool(a > b)),
                BinOp::Ge => return Ok(ConstValue::Bool(a >= b)),
                BinOp::And | BinOp::Or => return invalid_const_binary(op, lhs, rhs, span),
                _ => {}
            }
            let value = match op {
                BinOp::Add => a.checked_add(b),
                BinOp::Sub => a.checked_sub(b),
                BinOp::Mul => a.checked_mul(b),
                BinOp::Div => a.checked_div(b),
                BinOp::Rem => a.checked_rem(b),
                BinOp::BitAnd => Some(a & b),
                BinOp::BitOr => Some(a | b),
                BinOp::BitXor => Some(a ^ b),
                BinOp::Shl => u32::try_from(b).ok().and_then(|shift| a.checked_shl(shift)),
                BinOp::Shr => u32::try_from(b).ok().and_then(|shift| a.checked_shr(shift)),
                _ => None,
            };
            match value {
                Some(v) => Ok(ConstValue::Int(v)),
                None => SemanticError::new(SemanticErrorKind::NonConstExpr { context }, span)
                    .with_help("the value overflows or divides by zero")
                    .into_err(),
            }
        }
        (ConstValue::Float(a), ConstValue::Float(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinOp::Add => Ok(ConstValue::Float(a + b)),
                BinOp::Sub => Ok(ConstValue::Float(a - b)),
                BinOp::Mul => Ok(ConstValue::Float(a * b)),
                BinOp::Div => Ok(ConstValue::Float(a / b)),
                BinOp::Eq => Ok(ConstValue::Bool(a == b)),
                BinOp::Ne => Ok(ConstValue::Bool(a != b)),
                BinOp::Lt => Ok(ConstValue::Bool(a < b)),
                BinOp::Le => Ok(ConstValue::Bool(a <= b)),
                BinOp::Gt => Ok(ConstValue::Bool(a > b)),
                BinOp::Ge => Ok(ConstValue::Bool(a >= b)),
                _ => invalid_const_binary(op, lhs, rhs, span),
            }
        }
        (ConstValue::Bool(a), ConstValue::Bool(b)) => match op {
            BinOp::And => Ok(ConstValue::Bool(*a && *b)),
            BinOp::Or => Ok(ConstValue::Bool(*a || *b)),
            BinOp::Eq => Ok(ConstValue::Bool(a == b)),
            BinOp::Ne => Ok(ConstValue::Bool(a != b)),
            _ => invalid_const_binary(op, lhs, rhs, span),
        },
        (ConstValue::Str(a), ConstValue::Str(b)) => match op {
            BinOp::Eq => Ok(ConstValue::Bool(a == b)),
            BinOp::Ne => Ok(ConstValue::Bool(a != b)),
            _ => invalid_const_binary(op, lhs, rhs, span),
        },
        (ConstValue::Char(a), ConstValue::Char(b)) => match op {
            BinOp::Eq => Ok(ConstValue::Bool(a == b)),
            BinOp::Ne => Ok(ConstValue::Bool(a != b)),
            BinOp::Lt => Ok(ConstValue::Bool(a < b)),
            BinOp::Le => Ok(ConstValue::Bool(a <= b)),
            BinOp::Gt => Ok(ConstValue::Bool(a > b)),
            BinOp::Ge => Ok(ConstValue::Bool(a >= b)),
            _ => invalid_const_binary(op, lhs, rhs, span),
        },
        _ => invalid_const_binary(op, lhs, rhs, span),
    }
}

fn invalid_const_binary(
    op: BinOp,
    lhs: &ConstValue,
    rhs: &ConstValue,
    span: Span,
) -> SemaResult<ConstValue> {
    SemanticError::new(
        SemanticErrorKind::InvalidBinaryOp {
            op: op.as_str(),
            left: const_value_type(lhs),
            right: const_value_type(rhs),
        },
        span,
    )
    .into_err()
}

/// Constant casts: numeric conversions only.
fn cast_const(
    value: &ConstValue,
    target: &Type,
    span: Span,
    context: &'static str,
) -> SemaResult<ConstValue> {
    if target.is_integer() {
        let converted = match value {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Float(v) => Some(*v as i64),
            ConstValue::Char(c) => Some(*c as i64),
            ConstValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        };
        if let Some(v) = converted {
            return Ok(ConstValue::Int(v));
        }
    } else if target.is_float() {
        let converted = match value {
            ConstValue::Int(v) => Some(*v as f64),
            ConstValue::Float(v) => Some(*v),
            _ => None,
        };
        if let Some(v) = converted {
            return Ok(ConstValue::Float(v));
        }
    }
    SemanticError::new(SemanticErrorKind::NonConstExpr { context }, span).into_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::OrderedFloat;

    fn span() -> Span {
        Span::dummy()
    }

    fn int_expr(value: i64) -> Expr {
        Expr {
            kind: ExprKind::Literal(Literal {
                kind: LiteralKind::Int(value),
                span: span(),
            }),
            span: span(),
        }
    }

    #[test]
    fn int_arithmetic_folds() {
        let result = eval_const_binary(
            BinOp::Mul,
            &ConstValue::Int(6),
            &ConstValue::Int(7),
            span(),
            "test",
        );
        assert_eq!(result.ok(), Some(ConstValue::Int(42)));
    }

    #[test]
    fn int_division_by_zero_is_rejected() {
        let result = eval_const_binary(
            BinOp::Div,
            &ConstValue::Int(1),
            &ConstValue::Int(0),
            span(),
            "test",
        );
        let err = result.err().unwrap();
        assert!(matches!(err.kind, SemanticErrorKind::NonConstExpr { .. }));
    }

    #[test]
    fn int_overflow_is_rejected() {
        let result = eval_const_binary(
            BinOp::Add,
            &ConstValue::Int(i64::MAX),
            &ConstValue::Int(1),
            span(),
            "test",
        );
        assert!(result.is_err());
    }

    #[test]
    fn shift_out_of_range_is_rejected() {
        let result = eval_const_binary(
            BinOp::Shl,
            &ConstValue::Int(1),
            &ConstValue::Int(64),
            span(),
            "test",
        );
        assert!(result.is_err());
    }

    #[test]
    fn comparison_yields_bool() {
        let result = eval_const_binary(
            BinOp::Lt,
            &ConstValue::Int(1),
            &ConstValue::Int(2),
            span(),
            "test",
        );
        assert_eq!(result.ok(), Some(ConstValue::Bool(true)));
    }

    #[test]
    fn mixed_operand_kinds_are_rejected() {
        let result = eval_const_binary(
            BinOp::Add,
            &ConstValue::Int(1),
            &ConstValue::Float(2.0),
            span(),
            "test",
        );
        let err = result.err().unwrap();
        assert!(matches!(
            err.kind,
            SemanticErrorKind::InvalidBinaryOp { .. }
        ));
    }

    #[test]
    fn logical_ops_fold_on_bools() {
        let result = eval_const_binary(
            BinOp::And,
            &ConstValue::Bool(true),
            &ConstValue::Bool(false),
            span(),
            "test",
        );
        assert_eq!(result.ok(), Some(ConstValue::Bool(false)));
    }

    #[test]
    fn const_cast_truncates_float_to_int() {
        let result = cast_const(&ConstValue::Float(3.9), &Type::i64(), span(), "test");
        assert_eq!(result.ok(), Some(ConstValue::Int(3)));
    }

    #[test]
    fn const_cast_rejects_string_to_int() {
        let result = cast_const(
            &ConstValue::Str("x".to_string()),
            &Type::i32(),
            span(),
            "test",
        );
        assert!(result.is_err());
    }

    #[test]
    fn integer_literal_adopts_integer_type() {
        assert!(literal_adopts(&int_expr(1), &Type::i64()));
        assert!(!literal_adopts(&int_expr(1), &Type::f32()));
    }

    #[test]
    fn negated_literal_adopts_through_the_sign() {
        let negated = Expr {
            kind: ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(int_expr(1)),
            },
            span: span(),
        };
        assert!(literal_adopts(&negated, &Type::i64()));
    }

    #[test]
    fn float_literal_does_not_adopt_integer_type() {
        let float = Expr {
            kind: ExprKind::Literal(Literal {
                kind: LiteralKind::Float(OrderedFloat(1.5)),
                span: span(),
            }),
            span: span(),
        };
        assert!(literal_adopts(&float, &Type::f64()));
        assert!(!literal_adopts(&float, &Type::i32()));
    }

    #[test]
    fn const_value_default_types() {
        assert!(const_value_type(&ConstValue::Int(1)).is_integer());
        assert!(const_value_type(&ConstValue::Float(1.0)).is_float());
        assert!(const_value_type(&ConstValue::Bool(true)).is_bool());
        assert!(const_value_type(&ConstValue::Str(String::new())).is_string());
        assert!(const_value_type(&ConstValue::Unit).is_unit());
    }
}
