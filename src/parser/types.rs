//! Type expression parsing.
//!
//! In type position `<` is never ambiguous, so generic arguments parse
//! without speculation. The `>>` token splits into two closing angles for
//! nested generics (`Vec<Vec<i32>>`), and `Result` / `Option` /
//! `TaskHandle` are keywords that fall back to plain named types when not
//! followed by `<`.

use super::Parser;
use crate::ast::*;
use crate::diagnostics::ErrorCode;
use crate::lexer::TokenKind;
use crate::span::Spanned;

impl<'src> Parser<'src> {
    /// Parse a type expression.
    pub(super) fn parse_type(&mut self) -> Type {
        let start = self.current.span;

        match self.current.kind {
            TokenKind::Star => self.parse_pointer_type(),
            TokenKind::LBracket => self.parse_bracket_type(),
            TokenKind::LParen => self.parse_paren_type(),

            TokenKind::Void => {
                self.advance();
                Type {
                    kind: TypeKind::Void,
                    span: start,
                }
            }

            TokenKind::Result => self.parse_result_type(),
            TokenKind::Option => self.parse_single_arg_builtin("Option", TypeKind::Option),
            TokenKind::TaskHandle => {
                self.parse_single_arg_builtin("TaskHandle", TypeKind::TaskHandle)
            }

            TokenKind::Ident => self.parse_named_type(),

            _ => {
                let found = self.current.kind.description();
                self.error_at_current(
                    &format!("expected type, found {found}"),
                    ErrorCode::ExpectedType,
                );
                Type {
                    kind: TypeKind::Void,
                    span: start,
                }
            }
        }
    }

    /// Parse `*mut T` or `*const T`.
    fn parse_pointer_type(&mut self) -> Type {
        let start = self.current.span;
        self.advance(); // consume '*'

        let mutable = if self.try_consume(TokenKind::Mut) {
            true
        } else if self.try_consume(TokenKind::Const) {
            false
        } else {
            self.error_expected_one_of(&["`mut`", "`const`"]);
            false
        };

        let pointee = self.parse_type();
        let span = start.merge(pointee.span);
        Type {
            kind: TypeKind::Pointer {
                mutable,
                pointee: Box::new(pointee),
            },
            span,
        }
    }

    /// Parse `[]T` (slice) or `[N]T` (fixed-size array with a constant
    /// size expression).
    fn parse_bracket_type(&mut self) -> Type {
        let start = self.current.span;
        self.advance(); // consume '['

        if self.try_consume(TokenKind::RBracket) {
            let element = self.parse_type();
            let span = start.merge(element.span);
            return Type {
                kind: TypeKind::Slice(Box::new(element)),
                span,
            };
        }

        let size = self.parse_expr();
        self.expect(TokenKind::RBracket);
        let element = self.parse_type();
        let span = start.merge(element.span);
        Type {
            kind: TypeKind::Array {
                size: Box::new(size),
                element: Box::new(element),
            },
            span,
        }
    }

    /// Parse `(T1, T2, ...)`: a tuple type, or a parenthesized type when a
    /// single element has no trailing comma. Empty parens are an error.
    fn parse_paren_type(&mut self) -> Type {
        let start = self.current.span;
        self.advance(); // consume '('

        if self.check(TokenKind::RParen) {
            self.error_at_with_help(
                start.merge(self.current.span),
                "tuple types need at least two elements",
                ErrorCode::EmptyTupleType,
                "use `void` for the absence of a value",
            );
            self.advance();
            let span = start.merge(self.previous.span);
            return Type {
                kind: TypeKind::Void,
                span,
            };
        }

        let first = self.parse_type();

        if self.try_consume(TokenKind::Comma) {
            let mut elements = vec![first];
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                elements.push(self.parse_type());
                if !self.try_consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
            let span = start.merge(self.previous.span);

            if elements.len() == 1 {
                // `(T,)` - recover as a parenthesized type
                self.error_at(
                    span,
                    "tuple types need at least two elements",
                    ErrorCode::EmptyTupleType,
                );
                let mut elements = elements;
                let inner = elements
                    .pop()
                    .expect("BUG: elements.len() == 1 but pop() returned None");
                return Type {
                    kind: inner.kind,
                    span,
                };
            }

            return Type {
                kind: TypeKind::Tuple(elements),
                span,
            };
        }

        self.expect(TokenKind::RParen);
        let span = start.merge(self.previous.span);
        Type {
            kind: first.kind,
            span,
        }
    }

    /// Parse `Result<T, E>`; a bare `Result` stays a named type. A wrong
    /// argument count still parses as a named type so the analyzer can
    /// report the expected count.
    fn parse_result_type(&mut self) -> Type {
        let start = self.current.span;
        self.advance(); // consume 'Result'

        if !self.check(TokenKind::Lt) {
            let symbol = self.intern("Result");
            return Type {
                kind: TypeKind::Named {
                    name: Spanned::new(symbol, start),
                    type_args: Vec::new(),
                },
                span: start,
            };
        }

        let mut args = self.parse_type_args();
        let span = start.merge(self.previous.span);

        if args.len() == 2 {
            // Safe: length checked above
            let err = args.pop().expect("BUG: args.len() == 2");
            let ok = args.pop().expect("BUG: args.len() == 2");
            Type {
                kind: TypeKind::Result {
                    ok: Box::new(ok),
                    err: Box::new(err),
                },
                span,
            }
        } else {
            let symbol = self.intern("Result");
            Type {
                kind: TypeKind::Named {
                    name: Spanned::new(symbol, start),
                    type_args: args,
                },
                span,
            }
        }
    }

    /// Parse `Option<T>` / `TaskHandle<T>`; bare keywords stay named
    /// types, as does a wrong argument count.
    fn parse_single_arg_builtin(&mut self, keyword: &str, wrap: fn(Box<Type>) -> TypeKind) -> Type {
        let start = self.current.span;
        self.advance();

        if !self.check(TokenKind::Lt) {
            let symbol = self.intern(keyword);
            return Type {
                kind: TypeKind::Named {
                    name: Spanned::new(symbol, start),
                    type_args: Vec::new(),
                },
                span: start,
            };
        }

        let mut args = self.parse_type_args();
        let span = start.merge(self.previous.span);

        if args.len() == 1 {
            // Safe: length checked above
            let inner = args.pop().expect("BUG: args.len() == 1");
            Type {
                kind: wrap(Box::new(inner)),
                span,
            }
        } else {
            let symbol = self.intern(keyword);
            Type {
                kind: TypeKind::Named {
                    name: Spanned::new(symbol, start),
                    type_args: args,
                },
                span,
            }
        }
    }

    /// Parse a named type with optional generic arguments: `i32`, `Point`,
    /// `Pair<A, B>`.
    fn parse_named_type(&mut self) -> Type {
        let start = self.current.span;
        let text = self.current_text();
        let symbol = self.intern(text);
        self.advance();
        let name = Spanned::new(symbol, start);

        let type_args = if self.check(TokenKind::Lt) {
            self.parse_type_args()
        } else {
            Vec::new()
        };

        let span = start.merge(self.previous.span);
        Type {
            kind: TypeKind::Named { name, type_args },
            span,
        }
    }

    /// Parse `<T, U, ...>` type arguments. The closing angle is checked
    /// before the separator so a pending `>` from a `>>` split closes the
    /// list it belongs to.
    pub(super) fn parse_type_args(&mut self) -> Vec<Type> {
        self.advance(); // consume '<'

        let mut args = Vec::new();
        loop {
            args.push(self.parse_type());
            if self.check_closing_angle() {
                break;
            }
            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect_closing_angle();
        args
    }
}
