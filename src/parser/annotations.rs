//! Annotation parsing: `#[name]` and `#[name(params)]`.
//!
//! Recognized names are classified at parse time. `ai_*` annotations have
//! their parameters validated here, FFI transfer markers map to
//! [`FfiTransfer`], and `#[ownership(...)]` to [`OwnershipKind`]. Anything
//! else is carried through as [`AnnotationKind::Other`] so downstream tools
//! can inspect it.

use super::Parser;
use crate::ast::*;
use crate::diagnostics::{Diagnostic, ErrorCode};
use crate::lexer::TokenKind;
use crate::span::{Span, Spanned};

impl<'src> Parser<'src> {
    /// Parse zero or more leading annotations.
    ///
    /// A declaration carries at most one FFI transfer marker; a second one
    /// is reported here with a note pointing at the first.
    pub(super) fn parse_annotations(&mut self) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        let mut first_transfer: Option<Span> = None;

        while self.check(TokenKind::Hash) {
            let Some(annotation) = self.parse_annotation() else {
                continue;
            };

            if matches!(annotation.kind, AnnotationKind::FfiTransfer(_)) {
                match first_transfer {
                    None => first_transfer = Some(annotation.span),
                    Some(first) => {
                        self.errors.push(
                            Diagnostic::error(
                                "conflicting FFI transfer annotations",
                                annotation.span,
                            )
                            .with_error_code(ErrorCode::ConflictingFfiAnnotations)
                            .with_note(first, "first transfer annotation here"),
                        );
                    }
                }
            }

            annotations.push(annotation);
        }

        annotations
    }

    /// Parse one `#[...]` annotation. Returns `None` when the annotation is
    /// malformed or unknown; the error has already been reported.
    fn parse_annotation(&mut self) -> Option<Annotation> {
        let start = self.current.span;
        self.advance();

        self.expect(TokenKind::LBracket)?;

        if !self.check(TokenKind::Ident) {
            self.error_expected("annotation name");
            self.skip_to_closing(TokenKind::RBracket);
            if self.check(TokenKind::RBracket) {
                self.advance();
            }
            return None;
        }
        let name_span = self.current.span;
        let name_text = self.current_text();
        self.advance();

        let params = if self.try_consume(TokenKind::LParen) {
            let params = self.parse_annotation_params();
            self.expect(TokenKind::RParen);
            params
        } else {
            Vec::new()
        };

        self.expect(TokenKind::RBracket);
        let span = start.merge(self.previous.span);

        let kind = self.classify_annotation(name_text, name_span, params, span)?;
        Some(Annotation { kind, span })
    }

    fn classify_annotation(
        &mut self,
        name: &str,
        name_span: Span,
        params: Vec<AnnotationParam>,
        span: Span,
    ) -> Option<AnnotationKind> {
        if name.starts_with("ai_") {
            let Some(kind) = AiAnnotationKind::from_name(name) else {
                // Unknown names are rejected rather than carried through so
                // typos don't silently lose their metadata.
                self.errors.push(
                    Diagnostic::error(format!("unknown AI annotation `{name}`"), name_span)
                        .with_error_code(ErrorCode::InvalidAnnotation),
                );
                return None;
            };
            self.check_ai_params(kind, &params, span);
            return Some(AnnotationKind::Ai(AiAnnotation { kind, params }));
        }

        match name {
            "transfer_full" => Some(self.ffi_transfer(FfiTransfer::Full, &params, span)),
            "transfer_none" => Some(self.ffi_transfer(FfiTransfer::None, &params, span)),
            "borrowed" => Some(self.ffi_transfer(FfiTransfer::Borrowed, &params, span)),
            "ownership" => self.ownership_annotation(&params, span),
            _ => {
                let symbol = self.intern(name);
                Some(AnnotationKind::Other {
                    name: Spanned::new(symbol, name_span),
                    params,
                })
            }
        }
    }

    /// Validate the parameter shape of a recognized AI annotation.
    fn check_ai_params(&mut self, kind: AiAnnotationKind, params: &[AnnotationParam], span: Span) {
        match kind {
            AiAnnotationKind::Confidence => {
                // Integer 0 and 1 count as valid confidence values.
                let valid = match params {
                    [AnnotationParam { value: AnnotationValue::Float(f), .. }] => {
                        (0.0..=1.0).contains(&f.0)
                    }
                    [AnnotationParam { value: AnnotationValue::Int(n), .. }] => (0..=1).contains(n),
                    _ => false,
                };
                if !valid {
                    self.param_error(
                        span,
                        "`#[ai_confidence]` expects a single number between 0.0 and 1.0",
                    );
                }
            }
            AiAnnotationKind::RefinementStep => {
                let valid = matches!(
                    params,
                    [AnnotationParam { value: AnnotationValue::Int(n), .. }] if *n > 0
                );
                if !valid {
                    self.param_error(
                        span,
                        "`#[ai_refinement_step]` expects a single positive integer",
                    );
                }
            }
            _ => {
                let valid = matches!(
                    params,
                    [AnnotationParam { value: AnnotationValue::String(s), .. }] if !s.is_empty()
                );
                if !valid {
                    self.param_error(
                        span,
                        &format!("`#[{}]` expects a single non-empty string", kind.name()),
                    );
                }
            }
        }
    }

    fn ffi_transfer(
        &mut self,
        transfer: FfiTransfer,
        params: &[AnnotationParam],
        span: Span,
    ) -> AnnotationKind {
        if !params.is_empty() {
            self.param_error(span, &format!("`#[{}]` takes no parameters", transfer.name()));
        }
        AnnotationKind::FfiTransfer(transfer)
    }

    fn ownership_annotation(
        &mut self,
        params: &[AnnotationParam],
        span: Span,
    ) -> Option<AnnotationKind> {
        let kind = match params {
            [AnnotationParam { value: AnnotationValue::Ident(symbol), .. }] => {
                match self.interner.resolve(*symbol) {
                    Some("gc") => Some(OwnershipKind::Gc),
                    Some("c") => Some(OwnershipKind::C),
                    Some("pinned") => Some(OwnershipKind::Pinned),
                    _ => None,
                }
            }
            _ => None,
        };

        match kind {
            Some(kind) => Some(AnnotationKind::Ownership(kind)),
            None => {
                self.param_error(span, "`#[ownership]` expects one of `gc`, `c`, or `pinned`");
                None
            }
        }
    }

    /// Parse the comma-separated values inside `#[name(...)]`. Does not
    /// consume the closing parenthesis.
    fn parse_annotation_params(&mut self) -> Vec<AnnotationParam> {
        let mut params = Vec::new();

        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let span = self.current.span;
            let value = match self.current.kind {
                TokenKind::StringLit => {
                    let text = self.current_text();
                    AnnotationValue::String(self.parse_string_literal(text, span))
                }
                TokenKind::IntLit => {
                    let text = self.current_text();
                    AnnotationValue::Int(self.parse_int_literal(text, span))
                }
                TokenKind::FloatLit => {
                    let text = self.current_text();
                    AnnotationValue::Float(self.parse_float_literal(text, span).into())
                }
                TokenKind::True => AnnotationValue::Bool(true),
                TokenKind::False => AnnotationValue::Bool(false),
                TokenKind::Ident => {
                    let text = self.current_text();
                    AnnotationValue::Ident(self.intern(text))
                }
                _ => {
                    self.error_expected_one_of(&[
                        "string",
                        "identifier",
                        "number",
                        "`true`",
                        "`false`",
                    ]);
                    break;
                }
            };
            self.advance();
            params.push(AnnotationParam { value, span });

            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }

        params
    }

    /// Parameter validation failures don't enter panic mode; the token
    /// stream is still coherent and the declaration parses normally.
    fn param_error(&mut self, span: Span, message: &str) {
        self.errors.push(
            Diagnostic::error(message, span).with_error_code(ErrorCode::InvalidAnnotationParam),
        );
    }
}
