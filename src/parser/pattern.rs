//! Pattern parsing for `match` arms and `if let` statements.
//!
//! Patterns are deliberately small: wildcards, literals, bindings, tuples,
//! and qualified enum variants. Struct patterns, unqualified variants, and
//! `::` paths are recognized only to report targeted errors.

use super::Parser;
use crate::ast::*;
use crate::diagnostics::ErrorCode;
use crate::lexer::TokenKind;
use crate::span::Spanned;

impl<'src> Parser<'src> {
    /// Parse a single pattern.
    ///
    /// On an unrecognized token this reports an error, consumes the token,
    /// and returns a wildcard so match-arm parsing keeps moving.
    pub(super) fn parse_pattern(&mut self) -> Pattern {
        let start = self.current.span;

        match self.current.kind {
            TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StringLit
            | TokenKind::CharLit
            | TokenKind::True
            | TokenKind::False => {
                let literal = self.parse_literal();
                Pattern {
                    span: literal.span,
                    kind: PatternKind::Literal(literal),
                }
            }

            TokenKind::Minus => self.parse_negated_literal(),

            TokenKind::Mut => {
                self.advance();
                let name = match self.expect_ident("binding name") {
                    Some(name) => name,
                    None => Spanned::new(self.intern(""), self.current.span),
                };
                let span = start.merge(name.span);
                Pattern {
                    kind: PatternKind::Binding {
                        mutable: true,
                        name,
                    },
                    span,
                }
            }

            TokenKind::LParen => self.parse_tuple_pattern(),

            // `Result.Ok(v)` and friends keep their keyword heads.
            TokenKind::Ident
            | TokenKind::Result
            | TokenKind::Option
            | TokenKind::TaskHandle => self.parse_name_pattern(),

            _ => {
                let found = self.current.kind.description();
                self.error_at_current(
                    &format!("expected pattern, found {found}"),
                    ErrorCode::ExpectedPattern,
                );
                if !self.is_at_end() {
                    self.advance();
                }
                Pattern {
                    kind: PatternKind::Wildcard,
                    span: start,
                }
            }
        }
    }

    /// Parse `-5` or `-1.5`. Negation is folded into the literal value.
    fn parse_negated_literal(&mut self) -> Pattern {
        let start = self.current.span;
        self.advance();

        let kind = match self.current.kind {
            TokenKind::IntLit => {
                let text = self.current_text();
                let value = self.parse_int_literal(text, self.current.span);
                self.advance();
                LiteralKind::Int(-value)
            }
            TokenKind::FloatLit => {
                let text = self.current_text();
                let value = self.parse_float_literal(text, self.current.span);
                self.advance();
                LiteralKind::Float((-value).into())
            }
            _ => {
                self.error_expected("numeric literal");
                LiteralKind::Int(0)
            }
        };

        let span = start.merge(self.previous.span);
        Pattern {
            kind: PatternKind::Literal(Literal { kind, span }),
            span,
        }
    }

    /// Parse `(p1, p2, ...)`. The unit pattern `()` matches anything, and a
    /// single parenthesized pattern without a trailing comma is just that
    /// pattern.
    fn parse_tuple_pattern(&mut self) -> Pattern {
        let start = self.current.span;
        self.advance();

        if self.check(TokenKind::RParen) {
            self.advance();
            let span = start.merge(self.previous.span);
            return Pattern {
                kind: PatternKind::Wildcard,
                span,
            };
        }

        let first = self.parse_pattern();

        if self.try_consume(TokenKind::Comma) {
            let mut elements = vec![first];
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                elements.push(self.parse_pattern());
                if !self.try_consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
            let span = start.merge(self.previous.span);
            return Pattern {
                kind: PatternKind::Tuple(elements),
                span,
            };
        }

        self.expect(TokenKind::RParen);
        let span = start.merge(self.previous.span);
        Pattern {
            kind: first.kind,
            span,
        }
    }

    /// Parse a pattern headed by a name: the wildcard `_`, a binding, or a
    /// qualified enum variant `Enum.Variant(payload)?`.
    fn parse_name_pattern(&mut self) -> Pattern {
        let start = self.current.span;
        let text = self.current_text();

        if text == "_" {
            self.advance();
            return Pattern {
                kind: PatternKind::Wildcard,
                span: start,
            };
        }

        let symbol = self.intern(text);
        self.advance();
        let name = Spanned::new(symbol, start);

        if self.check(TokenKind::ColonColon) {
            self.error_at(
                self.current.span,
                "`::` is not used in patterns",
                ErrorCode::PathSeparatorInPattern,
            );
            self.advance();
            return self.finish_variant_pattern(name);
        }

        if self.check(TokenKind::Dot) {
            self.advance();
            return self.finish_variant_pattern(name);
        }

        if self.check(TokenKind::LBrace) {
            return self.reject_struct_pattern(name);
        }
        if self.check(TokenKind::Lt) {
            // `Name<...> {` is a struct pattern with type arguments; confirm
            // the brace before committing so a stray `<` still reports a
            // plain pattern error.
            let is_struct_pattern = self
                .try_parse(|p| {
                    let _ = p.parse_type_args();
                    p.check(TokenKind::LBrace).then_some(())
                })
                .is_some();
            if is_struct_pattern {
                return self.reject_struct_pattern(name);
            }
        }

        if self.check(TokenKind::LParen) {
            self.error_at(
                start.merge(self.current.span),
                "unqualified variant patterns are not supported",
                ErrorCode::UnqualifiedVariantPattern,
            );
            self.advance();
            self.skip_to_closing(TokenKind::RParen);
            if self.check(TokenKind::RParen) {
                self.advance();
            }
            let span = start.merge(self.previous.span);
            return Pattern {
                kind: PatternKind::Wildcard,
                span,
            };
        }

        Pattern {
            kind: PatternKind::Binding {
                mutable: false,
                name,
            },
            span: start,
        }
    }

    /// Report a struct pattern and skip its brace body. Any type arguments
    /// have already been consumed by the caller.
    fn reject_struct_pattern(&mut self, name: Spanned<Symbol>) -> Pattern {
        self.error_at(
            name.span.merge(self.current.span),
            "struct patterns are not supported in match statements",
            ErrorCode::StructPatternUnsupported,
        );
        self.advance();
        self.skip_to_closing(TokenKind::RBrace);
        if self.check(TokenKind::RBrace) {
            self.advance();
        }
        let span = name.span.merge(self.previous.span);
        Pattern {
            kind: PatternKind::Wildcard,
            span,
        }
    }

    /// Parse the variant name and optional payload after `Enum.`.
    fn finish_variant_pattern(&mut self, enum_name: Spanned<Symbol>) -> Pattern {
        let variant = match self.expect_ident("variant name") {
            Some(variant) => variant,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let payload = if self.try_consume(TokenKind::LParen) {
            let inner = self.parse_pattern();
            self.expect(TokenKind::RParen);
            Some(Box::new(inner))
        } else {
            None
        };

        let span = enum_name.span.merge(self.previous.span);
        Pattern {
            kind: PatternKind::EnumVariant {
                enum_name,
                variant,
                payload,
            },
            span,
        }
    }
}
