//! Expression parsing using precedence climbing.
//!
//! Binary operators follow the C precedence ladder: `||` binds loosest,
//! then `&&`, `|`, `^`, `&`, equality, relational, shifts, `+ -`, `* / %`,
//! `as` casts, unary operators, and postfix forms. All binary operators
//! associate to the left. Assignment is a statement, not an expression, so
//! `=` never appears in the operator table.

use super::Parser;
use crate::ast::*;
use crate::diagnostics::ErrorCode;
use crate::lexer::TokenKind;
use crate::span::Spanned;

/// Operator precedence levels (higher = binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    Or = 1,         // ||
    And = 2,        // &&
    BitOr = 3,      // |
    BitXor = 4,     // ^
    BitAnd = 5,     // &
    Equality = 6,   // == !=
    Relational = 7, // < > <= >=
    Shift = 8,      // << >>
    Term = 9,       // + -
    Factor = 10,    // * / %
    Cast = 11,      // as
    Unary = 12,     // ! - * &
    Call = 13,      // () [] .
}

impl Precedence {
    /// Get the next higher precedence level.
    fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::BitOr,
            Precedence::BitOr => Precedence::BitXor,
            Precedence::BitXor => Precedence::BitAnd,
            Precedence::BitAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Shift,
            Precedence::Shift => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Cast,
            Precedence::Cast => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Call,
        }
    }
}

/// Get the precedence of a binary operator token.
fn binary_precedence(kind: TokenKind) -> Option<Precedence> {
    match kind {
        TokenKind::OrOr => Some(Precedence::Or),
        TokenKind::AndAnd => Some(Precedence::And),
        TokenKind::Or => Some(Precedence::BitOr),
        TokenKind::Caret => Some(Precedence::BitXor),
        TokenKind::And => Some(Precedence::BitAnd),
        TokenKind::EqEq | TokenKind::NotEq => Some(Precedence::Equality),
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
            Some(Precedence::Relational)
        }
        TokenKind::Shl | TokenKind::Shr => Some(Precedence::Shift),
        TokenKind::Plus | TokenKind::Minus => Some(Precedence::Term),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(Precedence::Factor),
        TokenKind::As => Some(Precedence::Cast),
        _ => None,
    }
}

/// Convert token kind to binary operator.
fn token_to_binop(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::Percent => Some(BinOp::Rem),
        TokenKind::EqEq => Some(BinOp::Eq),
        TokenKind::NotEq => Some(BinOp::Ne),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::LtEq => Some(BinOp::Le),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::GtEq => Some(BinOp::Ge),
        TokenKind::AndAnd => Some(BinOp::And),
        TokenKind::OrOr => Some(BinOp::Or),
        TokenKind::And => Some(BinOp::BitAnd),
        TokenKind::Or => Some(BinOp::BitOr),
        TokenKind::Caret => Some(BinOp::BitXor),
        TokenKind::Shl => Some(BinOp::Shl),
        TokenKind::Shr => Some(BinOp::Shr),
        _ => None,
    }
}

impl<'src> Parser<'src> {
    /// Parse an expression.
    #[must_use = "parsing has no effect if the result is not used"]
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_prec(Precedence::None, true)
    }

    /// Parse an expression in a position where a trailing `{` belongs to
    /// the surrounding statement (if conditions, match scrutinees, for
    /// iterables), so a top-level struct literal must not be parsed.
    pub(super) fn parse_expr_no_struct(&mut self) -> Expr {
        self.parse_expr_prec(Precedence::None, false)
    }

    /// Parse an expression with at least the given precedence.
    fn parse_expr_prec(&mut self, min_prec: Precedence, allow_struct: bool) -> Expr {
        let mut left = self.parse_unary(allow_struct);

        while let Some(prec) = binary_precedence(self.current.kind) {
            if prec < min_prec {
                break;
            }

            let op_token = self.current.kind;
            self.advance();

            left = if op_token == TokenKind::As {
                let ty = self.parse_type();
                let span = left.span.merge(self.previous.span);
                Expr {
                    kind: ExprKind::Cast {
                        expr: Box::new(left),
                        ty,
                    },
                    span,
                }
            } else if let Some(op) = token_to_binop(op_token) {
                // Left-associative: the right operand climbs one level up.
                let right = self.parse_expr_prec(prec.next(), allow_struct);
                let span = left.span.merge(right.span);
                Expr {
                    kind: ExprKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                }
            } else {
                // binary_precedence and token_to_binop cover the same
                // tokens; reaching here is a table mismatch.
                self.error_at(
                    self.previous.span,
                    &format!("internal parser error: no binary operator for {op_token:?}"),
                    ErrorCode::UnexpectedToken,
                );
                left
            };
        }

        left
    }

    /// Parse a unary expression: prefix operators, `await`, or postfix.
    fn parse_unary(&mut self, allow_struct: bool) -> Expr {
        let start = self.current.span;

        let op = match self.current.kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::And => Some(UnaryOp::AddrOf),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary(allow_struct);
            let span = start.merge(operand.span);
            return Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            };
        }

        if self.check(TokenKind::Await) {
            self.advance();
            let task = self.parse_unary(allow_struct);
            let span = start.merge(task.span);
            return Expr {
                kind: ExprKind::Await {
                    task: Box::new(task),
                },
                span,
            };
        }

        self.parse_postfix(allow_struct)
    }

    /// Parse a primary expression followed by postfix operators: calls,
    /// field access, method calls, indexing, and slicing.
    fn parse_postfix(&mut self, allow_struct: bool) -> Expr {
        let mut expr = self.parse_primary(allow_struct);

        loop {
            match self.current.kind {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args();
                    self.expect(TokenKind::RParen);
                    let span = expr.span.merge(self.previous.span);
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    };
                }
                TokenKind::Dot => {
                    expr = self.parse_dot_suffix(expr);
                }
                TokenKind::LBracket => {
                    expr = self.parse_index_or_slice(expr);
                }
                _ => break,
            }
        }

        expr
    }

    /// Parse a `.` suffix: tuple index, enum constructor, method call, or
    /// field access.
    fn parse_dot_suffix(&mut self, base: Expr) -> Expr {
        self.advance(); // consume '.'

        // Tuple index: `pair.0`
        if self.check(TokenKind::IntLit) {
            self.advance();
            let field = self.spanned_symbol();
            let span = base.span.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Field {
                    base: Box::new(base),
                    field,
                },
                span,
            };
        }

        if !self.check(TokenKind::Ident) {
            self.error_expected("field or method name");
            return base;
        }

        // Enum constructor heuristic: `Name.Variant` where the member
        // starts with an uppercase letter and the base is a plain name.
        // An uppercase-named field is indistinguishable here; semantic
        // analysis validates the chosen reading against registered enums.
        let member_is_uppercase = self
            .current_text()
            .chars()
            .next()
            .is_some_and(char::is_uppercase);

        if member_is_uppercase {
            if let ExprKind::Identifier(name) = &base.kind {
                let enum_name = Spanned::new(*name, base.span);
                self.advance();
                let variant = self.spanned_symbol();
                return self.finish_enum_constructor(enum_name, Vec::new(), variant);
            }
        }

        self.advance();
        let member = self.spanned_symbol();

        if self.check(TokenKind::LParen) {
            self.advance();
            let args = self.parse_call_args();
            self.expect(TokenKind::RParen);
            let span = base.span.merge(self.previous.span);
            return Expr {
                kind: ExprKind::MethodCall {
                    base: Box::new(base),
                    method: member,
                    args,
                },
                span,
            };
        }

        // Plain field access; `.len` on slices and arrays resolves during
        // analysis.
        let span = base.span.merge(member.span);
        Expr {
            kind: ExprKind::Field {
                base: Box::new(base),
                field: member,
            },
            span,
        }
    }

    /// Parse `[index]` or `[start:end]` after a base expression. Slices
    /// may omit either bound: `a[:n]`, `a[n:]`, `a[:]`.
    fn parse_index_or_slice(&mut self, base: Expr) -> Expr {
        self.advance(); // consume '['

        // Slice with no start bound
        if self.try_consume(TokenKind::Colon) {
            let end = self.parse_slice_bound();
            self.expect(TokenKind::RBracket);
            let span = base.span.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Slice {
                    base: Box::new(base),
                    start: None,
                    end,
                },
                span,
            };
        }

        let first = self.parse_expr();

        if self.try_consume(TokenKind::Colon) {
            let end = self.parse_slice_bound();
            self.expect(TokenKind::RBracket);
            let span = base.span.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Slice {
                    base: Box::new(base),
                    start: Some(Box::new(first)),
                    end,
                },
                span,
            };
        }

        self.expect(TokenKind::RBracket);
        let span = base.span.merge(self.previous.span);
        Expr {
            kind: ExprKind::Index {
                base: Box::new(base),
                index: Box::new(first),
            },
            span,
        }
    }

    /// Parse the optional end bound of a slice, stopping at `]`.
    fn parse_slice_bound(&mut self) -> Option<Box<Expr>> {
        if self.check(TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expr()))
        }
    }

    /// Parse a call argument list after `(`. Zero arguments are written
    /// with the `none` marker: `f(none)`. Does not consume the closing
    /// `)`.
    fn parse_call_args(&mut self) -> Vec<Expr> {
        // Explicitly empty argument list
        if self.check(TokenKind::NoneKw) && self.check_next(TokenKind::RParen) {
            self.advance();
            return Vec::new();
        }

        if self.check(TokenKind::RParen) {
            self.error_at_with_help(
                self.current.span,
                "expected argument list",
                ErrorCode::UnexpectedToken,
                "zero-argument calls are written `f(none)`",
            );
            return Vec::new();
        }

        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr());
            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }
        args
    }

    /// Parse a primary expression.
    fn parse_primary(&mut self, allow_struct: bool) -> Expr {
        let start = self.current.span;

        match self.current.kind {
            TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StringLit
            | TokenKind::CharLit
            | TokenKind::True
            | TokenKind::False => {
                let literal = self.parse_literal();
                Expr {
                    span: literal.span,
                    kind: ExprKind::Literal(literal),
                }
            }

            TokenKind::Ident => self.parse_ident_expr(allow_struct),

            // Built-in generic types are keywords but act as constructor
            // and associated-call heads: `Option.Some(1)`,
            // `Result<i32, string>.Ok(7)`.
            TokenKind::Result | TokenKind::Option | TokenKind::TaskHandle => {
                self.parse_ident_expr(allow_struct)
            }

            TokenKind::SelfLower => {
                self.advance();
                let symbol = self.intern("self");
                Expr {
                    kind: ExprKind::Identifier(symbol),
                    span: start,
                }
            }

            TokenKind::Sizeof => {
                self.advance();
                self.expect(TokenKind::LParen);
                let ty = self.parse_type();
                self.expect(TokenKind::RParen);
                let span = start.merge(self.previous.span);
                Expr {
                    kind: ExprKind::SizeOf(ty),
                    span,
                }
            }

            TokenKind::LParen => self.parse_paren_expr(),

            TokenKind::LBracket => self.parse_array_literal(),

            _ => {
                let found = self.current.kind.description();
                self.error_at_current(
                    &format!("expected expression, found {found}"),
                    ErrorCode::ExpectedExpression,
                );
                // Consume the offending token so expression loops always
                // make progress.
                if !self.is_at_end() {
                    self.advance();
                }
                Expr {
                    kind: ExprKind::Tuple(Vec::new()),
                    span: start,
                }
            }
        }
    }

    /// Parse an expression starting with an identifier or one of the
    /// built-in type keywords. Handles plain references, struct literals,
    /// associated calls, and the generic heads `Pair<i32, bool> { .. }`,
    /// `Vec<i32>::new(none)`, and `Option<i32>.None`.
    ///
    /// `name <` is ambiguous between a generic head and a less-than
    /// comparison. The generic reading is tried speculatively and rolled
    /// back unless the argument list closes with `>` and is followed by a
    /// token that proves it (`::`, `.`, or `{` where a struct literal may
    /// appear), so `a < b` always falls back to a comparison.
    fn parse_ident_expr(&mut self, allow_struct: bool) -> Expr {
        let start = self.current.span;
        let text = self.current_text();
        let symbol = self.intern(text);
        self.advance();
        let name = Spanned::new(symbol, start);

        if self.check(TokenKind::Lt) {
            let speculated =
                self.try_parse(|p| p.parse_generic_head_speculative(allow_struct));
            if let Some(type_args) = speculated {
                return self.parse_generic_continuation(name, type_args, allow_struct);
            }
        }

        if self.check(TokenKind::ColonColon) {
            return self.parse_associated_call(name, Vec::new());
        }

        if allow_struct && self.check(TokenKind::LBrace) {
            return self.parse_struct_literal(name, Vec::new());
        }

        Expr {
            kind: ExprKind::Identifier(symbol),
            span: start,
        }
    }

    /// Speculative arm of the generic-head disambiguation. Returns the
    /// type arguments only when the list closes and the next token proves
    /// the generic reading.
    fn parse_generic_head_speculative(&mut self, allow_struct: bool) -> Option<Vec<Type>> {
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

        if !self.check_closing_angle() {
            return None;
        }
        self.consume_closing_angle()?;

        let continues = match self.current.kind {
            TokenKind::ColonColon | TokenKind::Dot => true,
            TokenKind::LBrace => allow_struct,
            _ => false,
        };
        continues.then_some(args)
    }

    /// Parse what follows a committed generic head: `Name<T>::func(args)`,
    /// `Name<T>.Variant`, or `Name<T> { fields }`.
    fn parse_generic_continuation(
        &mut self,
        name: Spanned<Symbol>,
        type_args: Vec<Type>,
        allow_struct: bool,
    ) -> Expr {
        match self.current.kind {
            TokenKind::ColonColon => self.parse_associated_call(name, type_args),
            TokenKind::Dot => {
                self.advance();
                let variant = match self.expect_ident("variant name") {
                    Some(variant) => variant,
                    None => Spanned::new(self.intern(""), self.current.span),
                };
                self.finish_enum_constructor(name, type_args, variant)
            }
            TokenKind::LBrace if allow_struct => self.parse_struct_literal(name, type_args),
            _ => {
                // The speculation only commits on one of the continuations
                // above, so this arm is unreachable.
                Expr {
                    kind: ExprKind::Identifier(name.node),
                    span: name.span,
                }
            }
        }
    }

    /// Parse `Type::function(args)` after the head name. Explicit type
    /// arguments arrive from the generic-head path: `Vec<i32>::new(none)`.
    fn parse_associated_call(&mut self, ty: Spanned<Symbol>, type_args: Vec<Type>) -> Expr {
        self.advance(); // consume '::'

        let function = match self.expect_ident("associated function name") {
            Some(function) => function,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        self.expect(TokenKind::LParen);
        let args = self.parse_call_args();
        self.expect(TokenKind::RParen);

        let span = ty.span.merge(self.previous.span);
        Expr {
            kind: ExprKind::AssociatedCall {
                ty,
                type_args,
                function,
                args,
            },
            span,
        }
    }

    /// Parse the optional payload of an enum constructor and build the
    /// expression. Multiple payload values collapse into one tuple so the
    /// payload stays a single value.
    fn finish_enum_constructor(
        &mut self,
        enum_name: Spanned<Symbol>,
        type_args: Vec<Type>,
        variant: Spanned<Symbol>,
    ) -> Expr {
        let value = if self.check(TokenKind::LParen) {
            let open = self.current.span;
            self.advance();

            let mut values = Vec::new();
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                values.push(self.parse_expr());
                if !self.try_consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);

            if values.is_empty() {
                self.error_at(
                    open.merge(self.previous.span),
                    "enum constructor payload cannot be empty",
                    ErrorCode::UnexpectedToken,
                );
                EnumVariantValue::NoValue
            } else if values.len() == 1 {
                EnumVariantValue::Value(Box::new(values.remove(0)))
            } else {
                let tuple_span = values[0].span.merge(values[values.len() - 1].span);
                EnumVariantValue::Value(Box::new(Expr {
                    kind: ExprKind::Tuple(values),
                    span: tuple_span,
                }))
            }
        } else if !type_args.is_empty() {
            EnumVariantValue::TypeArgs(type_args)
        } else {
            EnumVariantValue::NoValue
        };

        let span = enum_name.span.merge(self.previous.span);
        Expr {
            kind: ExprKind::EnumConstructor {
                enum_name,
                variant,
                value,
            },
            span,
        }
    }

    /// Parse `{ field: value, ... }` after a struct name. The `none`
    /// marker stands in for an empty field list.
    fn parse_struct_literal(&mut self, name: Spanned<Symbol>, type_args: Vec<Type>) -> Expr {
        self.advance(); // consume '{'

        let mut fields = Vec::new();

        if self.check(TokenKind::NoneKw) && self.check_next(TokenKind::RBrace) {
            self.advance();
        }

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let field_start = self.current.span;
            let field_name = match self.expect_ident("field name") {
                Some(field_name) => field_name,
                None => break,
            };
            self.expect(TokenKind::Colon);
            let value = self.parse_expr();
            let span = field_start.merge(self.previous.span);
            fields.push(FieldInit {
                name: field_name,
                value,
                span,
            });

            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RBrace);
        let span = name.span.merge(self.previous.span);
        Expr {
            kind: ExprKind::StructLiteral {
                name,
                type_args,
                fields,
            },
            span,
        }
    }

    /// Parse `(...)`: the unit literal, a parenthesized expression, or a
    /// tuple.
    fn parse_paren_expr(&mut self) -> Expr {
        let start = self.current.span;
        self.advance(); // consume '('

        if self.check(TokenKind::RParen) {
            self.advance();
            let span = start.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Literal(Literal {
                    kind: LiteralKind::Unit,
                    span,
                }),
                span,
            };
        }

        let first = self.parse_expr();

        if self.try_consume(TokenKind::Comma) {
            let mut elements = vec![first];
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                elements.push(self.parse_expr());
                if !self.try_consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
            let span = start.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Tuple(elements),
                span,
            };
        }

        self.expect(TokenKind::RParen);
        let span = start.merge(self.previous.span);
        Expr {
            kind: ExprKind::Paren(Box::new(first)),
            span,
        }
    }

    /// Parse an array literal. Three forms: `[none]` (empty),
    /// `[value; count]` (repeated), `[e1, e2, ...]` (enumerated).
    fn parse_array_literal(&mut self) -> Expr {
        let start = self.current.span;
        self.advance(); // consume '['

        // Explicitly empty
        if self.check(TokenKind::NoneKw) && self.check_next(TokenKind::RBracket) {
            self.advance();
            self.advance();
            let span = start.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Array(ArrayExpr::List(Vec::new())),
                span,
            };
        }

        // `[void]` is a recurring mistake; name the fix
        if self.check(TokenKind::Void) {
            self.error_at(
                self.current.span,
                "`void` is not allowed in an array literal",
                ErrorCode::VoidInArrayLiteral,
            );
            self.advance();
            if self.check(TokenKind::RBracket) {
                self.advance();
            }
            let span = start.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Array(ArrayExpr::List(Vec::new())),
                span,
            };
        }

        if self.check(TokenKind::RBracket) {
            self.error_at_with_help(
                self.current.span,
                "array literals cannot be empty without a marker",
                ErrorCode::UnexpectedToken,
                "write `[none]` for an empty array",
            );
            self.advance();
            let span = start.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Array(ArrayExpr::List(Vec::new())),
                span,
            };
        }

        let first = self.parse_expr();

        // `[value; count]` repeated form
        if self.try_consume(TokenKind::Semi) {
            let count = self.parse_expr();
            self.expect(TokenKind::RBracket);
            let span = start.merge(self.previous.span);
            return Expr {
                kind: ExprKind::Array(ArrayExpr::Repeat {
                    value: Box::new(first),
                    count: Box::new(count),
                }),
                span,
            };
        }

        let mut elements = vec![first];
        while self.try_consume(TokenKind::Comma) {
            if self.check(TokenKind::RBracket) {
                break; // trailing comma
            }
            elements.push(self.parse_expr());
        }
        self.expect(TokenKind::RBracket);
        let span = start.merge(self.previous.span);
        Expr {
            kind: ExprKind::Array(ArrayExpr::List(elements)),
            span,
        }
    }
}
