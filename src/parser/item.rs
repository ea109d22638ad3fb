//! Declaration parsing: functions, structs, enums, extern functions,
//! constants, and impl blocks.

use super::Parser;
use crate::ast::*;
use crate::diagnostics::{Diagnostic, ErrorCode};
use crate::lexer::TokenKind;
use crate::span::{Span, Spanned};

impl<'src> Parser<'src> {
    /// Parse a top-level declaration.
    ///
    /// Returns `None` when no declaration could be started; recovery has
    /// already skipped to the next plausible declaration boundary.
    pub(super) fn parse_declaration(&mut self) -> Option<Declaration> {
        let start = self.current.span;
        let annotations = self.parse_annotations();
        let explicit_vis = self.check(TokenKind::Pub) || self.check(TokenKind::Priv);
        let vis_span = self.current.span;
        let vis = self.parse_visibility();

        match self.current.kind {
            TokenKind::Fn => Some(Declaration::Function(
                self.parse_fn_decl(annotations, vis, start, false),
            )),
            TokenKind::Struct => Some(Declaration::Struct(
                self.parse_struct_decl(annotations, vis, start),
            )),
            TokenKind::Enum => Some(Declaration::Enum(
                self.parse_enum_decl(annotations, vis, start),
            )),
            TokenKind::Extern => Some(Declaration::ExternFn(
                self.parse_extern_decl(annotations, vis, start),
            )),
            TokenKind::Const => Some(Declaration::Const(
                self.parse_const_decl(annotations, vis, start),
            )),
            TokenKind::Impl => {
                if explicit_vis {
                    // The stream is coherent, so no panic mode here.
                    self.errors.push(
                        Diagnostic::error(
                            "`impl` blocks do not take a visibility modifier",
                            vis_span,
                        )
                        .with_error_code(ErrorCode::UnexpectedToken),
                    );
                }
                Some(Declaration::Impl(self.parse_impl_block(annotations, start)))
            }
            _ => {
                let found = self.current.kind.description();
                self.error_at_current(
                    &format!("expected declaration, found {found}"),
                    ErrorCode::ExpectedDeclaration,
                );
                self.synchronize();
                None
            }
        }
    }

    /// Consume the explicit `none` marker when it is the entire content of a
    /// delimited list.
    fn consume_none_marker(&mut self, closing: TokenKind) -> bool {
        if self.check(TokenKind::NoneKw) && self.check_next(closing) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ============================================================
    // Function declarations
    // ============================================================

    /// Parse `fn name(params) -> Type { body }`. Inside an impl block a
    /// leading `self` parameter marks an instance method.
    fn parse_fn_decl(
        &mut self,
        annotations: Vec<Annotation>,
        vis: Visibility,
        start: Span,
        in_impl: bool,
    ) -> FnDecl {
        self.advance();

        let name = match self.expect_ident("function name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let (takes_self, params) = self.parse_fn_params(in_impl);
        let return_type = self.parse_return_type();
        let body = self.parse_block();

        FnDecl {
            annotations,
            vis,
            name,
            takes_self,
            params,
            return_type,
            body,
            span: start.merge(self.previous.span),
        }
    }

    /// Parse a parenthesized parameter list. Empty lists may be written
    /// `()` or with the explicit `(none)` marker.
    fn parse_fn_params(&mut self, in_impl: bool) -> (bool, Vec<Param>) {
        let mut takes_self = false;
        let mut params = Vec::new();

        if self.expect(TokenKind::LParen).is_none() {
            return (takes_self, params);
        }

        if self.consume_none_marker(TokenKind::RParen) {
            self.expect(TokenKind::RParen);
            return (takes_self, params);
        }

        if self.check(TokenKind::SelfLower) {
            let self_span = self.current.span;
            self.advance();
            if in_impl {
                takes_self = true;
            } else {
                self.errors.push(
                    Diagnostic::error("`self` is only valid inside an `impl` block", self_span)
                        .with_error_code(ErrorCode::UnexpectedToken),
                );
            }
            if !self.try_consume(TokenKind::Comma) {
                self.expect(TokenKind::RParen);
                return (takes_self, params);
            }
        }

        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let Some(param) = self.parse_param() else {
                break;
            };
            params.push(param);
            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen);

        (takes_self, params)
    }

    /// Parse one `name: Type` parameter with optional annotations.
    fn parse_param(&mut self) -> Option<Param> {
        let start = self.current.span;
        let annotations = self.parse_annotations();
        let name = self.expect_ident("parameter name")?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type();

        Some(Param {
            annotations,
            name,
            ty,
            span: start.merge(self.previous.span),
        })
    }

    /// Parse the mandatory `-> Type` return clause. A missing arrow reports
    /// an error and yields `void` so the body still parses.
    fn parse_return_type(&mut self) -> Type {
        if self.try_consume(TokenKind::Arrow) {
            self.parse_type()
        } else {
            self.error_expected("`->`");
            Type {
                kind: TypeKind::Void,
                span: self.current.span,
            }
        }
    }

    // ============================================================
    // Struct and enum declarations
    // ============================================================

    fn parse_struct_decl(
        &mut self,
        annotations: Vec<Annotation>,
        vis: Visibility,
        start: Span,
    ) -> StructDecl {
        self.advance();

        let name = match self.expect_ident("struct name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let type_params = self.parse_type_params();

        let mut fields = Vec::new();
        if self.expect(TokenKind::LBrace).is_some() {
            if !self.consume_none_marker(TokenKind::RBrace) {
                while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                    let Some(field) = self.parse_struct_field() else {
                        break;
                    };
                    fields.push(field);
                    if !self.try_consume(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBrace);
        }

        StructDecl {
            annotations,
            vis,
            name,
            type_params,
            fields,
            span: start.merge(self.previous.span),
        }
    }

    fn parse_struct_field(&mut self) -> Option<StructField> {
        let start = self.current.span;
        let vis = self.parse_visibility();
        let name = self.expect_ident("field name")?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type();

        Some(StructField {
            vis,
            name,
            ty,
            span: start.merge(self.previous.span),
        })
    }

    fn parse_enum_decl(
        &mut self,
        annotations: Vec<Annotation>,
        vis: Visibility,
        start: Span,
    ) -> EnumDecl {
        self.advance();

        let name = match self.expect_ident("enum name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let type_params = self.parse_type_params();

        let mut variants = Vec::new();
        if self.expect(TokenKind::LBrace).is_some() {
            if !self.consume_none_marker(TokenKind::RBrace) {
                while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                    let Some(variant) = self.parse_enum_variant() else {
                        break;
                    };
                    variants.push(variant);
                    if !self.try_consume(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBrace);
        }

        EnumDecl {
            annotations,
            vis,
            name,
            type_params,
            variants,
            span: start.merge(self.previous.span),
        }
    }

    /// Parse one enum variant: `Name`, `Name(Type)`, or `Name = const-expr`.
    /// Whether the discriminant is actually constant is checked during
    /// analysis.
    fn parse_enum_variant(&mut self) -> Option<EnumVariantDecl> {
        let start = self.current.span;
        let vis = self.parse_visibility();
        let name = self.expect_ident("variant name")?;

        let payload = if self.try_consume(TokenKind::LParen) {
            let ty = self.parse_type();
            self.expect(TokenKind::RParen);
            Some(ty)
        } else {
            None
        };

        let discriminant = if self.try_consume(TokenKind::Eq) {
            Some(self.parse_expr())
        } else {
            None
        };

        Some(EnumVariantDecl {
            vis,
            name,
            payload,
            discriminant,
            span: start.merge(self.previous.span),
        })
    }

    /// Parse optional `<T, U, ...>` type parameters on a declaration.
    fn parse_type_params(&mut self) -> Vec<Spanned<Symbol>> {
        let mut type_params = Vec::new();
        if !self.try_consume(TokenKind::Lt) {
            return type_params;
        }

        loop {
            match self.expect_ident("type parameter") {
                Some(param) => type_params.push(param),
                None => break,
            }
            if self.check_closing_angle() {
                break;
            }
            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect_closing_angle();

        type_params
    }

    // ============================================================
    // Extern, const, impl
    // ============================================================

    /// Parse `extern "lib" fn name(params) -> Type;`. The library string is
    /// optional.
    fn parse_extern_decl(
        &mut self,
        annotations: Vec<Annotation>,
        vis: Visibility,
        start: Span,
    ) -> ExternDecl {
        self.advance();

        let extern_name = if self.check(TokenKind::StringLit) {
            let span = self.current.span;
            let text = self.current_text();
            let name = self.parse_string_literal(text, span);
            self.advance();
            Some(Spanned::new(name, span))
        } else {
            None
        };

        self.expect(TokenKind::Fn);

        let name = match self.expect_ident("function name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let (_, params) = self.parse_fn_params(false);
        let return_type = self.parse_return_type();
        self.expect(TokenKind::Semi);

        ExternDecl {
            annotations,
            vis,
            extern_name,
            name,
            params,
            return_type,
            span: start.merge(self.previous.span),
        }
    }

    /// Parse `const NAME: Type = expr;`.
    fn parse_const_decl(
        &mut self,
        annotations: Vec<Annotation>,
        vis: Visibility,
        start: Span,
    ) -> ConstDecl {
        self.advance();

        let name = match self.expect_ident("constant name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let ty = if self.expect(TokenKind::Colon).is_some() {
            self.parse_type()
        } else {
            Type {
                kind: TypeKind::Void,
                span: self.current.span,
            }
        };

        let value = if self.expect(TokenKind::Eq).is_some() {
            self.parse_expr()
        } else {
            Expr {
                kind: ExprKind::Tuple(Vec::new()),
                span: self.current.span,
            }
        };

        self.expect(TokenKind::Semi);

        ConstDecl {
            annotations,
            vis,
            name,
            ty,
            value,
            span: start.merge(self.previous.span),
        }
    }

    /// Parse `impl StructName { methods }`.
    fn parse_impl_block(&mut self, annotations: Vec<Annotation>, start: Span) -> ImplBlock {
        self.advance();

        let struct_name = match self.expect_ident("struct name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let mut methods = Vec::new();
        if self.expect(TokenKind::LBrace).is_some() {
            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                let method_start = self.current.span;
                let method_annotations = self.parse_annotations();
                let method_vis = self.parse_visibility();

                if self.check(TokenKind::Fn) {
                    methods.push(self.parse_fn_decl(
                        method_annotations,
                        method_vis,
                        method_start,
                        true,
                    ));
                } else {
                    self.error_expected("`fn`");
                    self.skip_to_next_method();
                }
            }
            self.expect(TokenKind::RBrace);
        }

        ImplBlock {
            annotations,
            struct_name,
            methods,
            span: start.merge(self.previous.span),
        }
    }

    /// Skip to the next method or the end of the impl block. Any leading
    /// annotations or visibility have already been consumed, so the loop
    /// always makes progress before stopping.
    fn skip_to_next_method(&mut self) {
        self.panic_mode = false;
        while !self.is_at_end() {
            match self.current.kind {
                TokenKind::Fn
                | TokenKind::Pub
                | TokenKind::Priv
                | TokenKind::Hash
                | TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
