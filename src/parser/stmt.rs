//! Statement and block parsing.
//!
//! Asthra is statement-oriented: blocks are statement lists, control flow
//! (`if`, `for`, `match`) appears at statement level, and assignment is a
//! statement form rather than an operator.

use super::Parser;
use crate::ast::*;
use crate::diagnostics::ErrorCode;
use crate::lexer::TokenKind;
use crate::span::Spanned;

impl<'src> Parser<'src> {
    /// Parse a brace-delimited block of statements.
    pub(super) fn parse_block(&mut self) -> Block {
        let start = self.current.span;
        if !self.try_consume(TokenKind::LBrace) {
            self.error_expected("`{`");
            return Block {
                statements: Vec::new(),
                span: start,
            };
        }

        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement());

            // A failed statement leaves panic mode set; resynchronize so
            // the rest of the block still parses.
            if self.panic_mode {
                self.synchronize_stmt();
            }
        }

        self.expect(TokenKind::RBrace);
        let span = start.merge(self.previous.span);
        Block { statements, span }
    }

    /// Parse a single statement.
    fn parse_statement(&mut self) -> Statement {
        match self.current.kind {
            TokenKind::Let => self.parse_let_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => {
                if self.check_next(TokenKind::Let) {
                    self.parse_if_let_stmt()
                } else {
                    Statement::If(self.parse_if_stmt())
                }
            }
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Match => self.parse_match_stmt(),
            TokenKind::Spawn => self.parse_spawn_stmt(),
            TokenKind::SpawnWithHandle => self.parse_spawn_with_handle_stmt(),
            TokenKind::Unsafe => self.parse_unsafe_stmt(),
            TokenKind::Break => {
                let start = self.current.span;
                self.advance();
                self.expect(TokenKind::Semi);
                Statement::Break {
                    span: start.merge(self.previous.span),
                }
            }
            TokenKind::Continue => {
                let start = self.current.span;
                self.advance();
                self.expect(TokenKind::Semi);
                Statement::Continue {
                    span: start.merge(self.previous.span),
                }
            }
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    /// Parse `let mut? name: Type = value;`. Both the type annotation and
    /// the initializer are required.
    fn parse_let_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'let'

        let mutable = self.try_consume(TokenKind::Mut);
        let name = match self.expect_ident("variable name") {
            Some(name) => name,
            None => Spanned::new(self.intern(""), self.current.span),
        };

        let ty = if self.try_consume(TokenKind::Colon) {
            self.parse_type()
        } else {
            self.error_at(
                self.current.span,
                "missing type annotation in `let` statement",
                ErrorCode::MissingTypeAnnotation,
            );
            Type {
                kind: TypeKind::Void,
                span: self.current.span,
            }
        };

        let value = if self.try_consume(TokenKind::Eq) {
            self.parse_expr()
        } else {
            self.error_at(
                self.current.span,
                "missing initializer in `let` statement",
                ErrorCode::MissingInitializer,
            );
            Expr {
                kind: ExprKind::Tuple(Vec::new()),
                span: self.current.span,
            }
        };

        self.expect(TokenKind::Semi);
        let span = start.merge(self.previous.span);
        Statement::Let {
            name,
            mutable,
            ty,
            value,
            span,
        }
    }

    /// Parse `return expr;`. A bare `return;` is an error naming the fix.
    fn parse_return_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'return'

        let value = if self.check(TokenKind::Semi) {
            self.error_at(
                self.current.span,
                "`return` requires a value",
                ErrorCode::MissingReturnValue,
            );
            Expr {
                kind: ExprKind::Literal(Literal {
                    kind: LiteralKind::Unit,
                    span: start,
                }),
                span: start,
            }
        } else {
            self.parse_expr()
        };

        self.expect(TokenKind::Semi);
        let span = start.merge(self.previous.span);
        Statement::Return { value, span }
    }

    /// Parse `if cond Block (else (if ... | Block))?`.
    fn parse_if_stmt(&mut self) -> IfStmt {
        let start = self.current.span;
        self.advance(); // consume 'if'

        let condition = self.parse_expr_no_struct();
        let then_block = self.parse_block();
        let else_branch = self.parse_else_branch();

        let span = start.merge(self.previous.span);
        IfStmt {
            condition,
            then_block,
            else_branch,
            span,
        }
    }

    fn parse_else_branch(&mut self) -> Option<ElseBranch> {
        if !self.try_consume(TokenKind::Else) {
            return None;
        }

        if self.check(TokenKind::If) {
            Some(ElseBranch::If(Box::new(self.parse_if_stmt())))
        } else {
            Some(ElseBranch::Block(self.parse_block()))
        }
    }

    /// Parse `if let PATTERN = value Block (else Block)?`.
    fn parse_if_let_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'if'
        self.advance(); // consume 'let'

        let pattern = self.parse_pattern();
        self.expect(TokenKind::Eq);
        let value = self.parse_expr_no_struct();
        let then_block = self.parse_block();
        let else_branch = self.parse_else_branch();

        let span = start.merge(self.previous.span);
        Statement::IfLet {
            pattern,
            value,
            then_block,
            else_branch,
            span,
        }
    }

    /// Parse `for ident in iterable Block`.
    fn parse_for_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'for'

        let variable = match self.expect_ident("loop variable") {
            Some(variable) => variable,
            None => Spanned::new(self.intern(""), self.current.span),
        };
        self.expect(TokenKind::In);
        let iterable = self.parse_expr_no_struct();
        let body = self.parse_block();

        let span = start.merge(self.previous.span);
        Statement::For {
            variable,
            iterable,
            body,
            span,
        }
    }

    /// Parse `match scrutinee { arms }`.
    fn parse_match_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'match'

        let scrutinee = self.parse_expr_no_struct();
        self.expect(TokenKind::LBrace);

        let mut arms = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            arms.push(self.parse_match_arm());
            if self.panic_mode {
                self.synchronize_stmt();
            }
        }

        self.expect(TokenKind::RBrace);
        let span = start.merge(self.previous.span);
        Statement::Match {
            scrutinee,
            arms,
            span,
        }
    }

    /// Parse one arm: `pattern (if guard)? => Block ,?`.
    fn parse_match_arm(&mut self) -> MatchArm {
        let start = self.current.span;
        let pattern = self.parse_pattern();

        let guard = if self.try_consume(TokenKind::If) {
            Some(self.parse_expr_no_struct())
        } else {
            None
        };

        self.expect(TokenKind::FatArrow);
        let body = self.parse_block();
        self.try_consume(TokenKind::Comma);

        let span = start.merge(self.previous.span);
        MatchArm {
            pattern,
            guard,
            body,
            span,
        }
    }

    /// Parse `spawn call;`.
    fn parse_spawn_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'spawn'

        let call = self.parse_expr();
        self.check_spawn_operand("spawn", &call);
        self.expect(TokenKind::Semi);

        let span = start.merge(self.previous.span);
        Statement::Spawn { call, span }
    }

    /// Parse `spawn_with_handle handle = call;`.
    fn parse_spawn_with_handle_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'spawn_with_handle'

        let handle = match self.expect_ident("handle name") {
            Some(handle) => handle,
            None => Spanned::new(self.intern(""), self.current.span),
        };
        self.expect(TokenKind::Eq);
        let call = self.parse_expr();
        self.check_spawn_operand("spawn_with_handle", &call);
        self.expect(TokenKind::Semi);

        let span = start.merge(self.previous.span);
        Statement::SpawnWithHandle { handle, call, span }
    }

    /// Spawn operands must be calls so there is something to run on the
    /// new task.
    fn check_spawn_operand(&mut self, keyword: &str, call: &Expr) {
        if !matches!(
            call.kind,
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } | ExprKind::AssociatedCall { .. }
        ) {
            self.error_at(
                call.span,
                &format!("`{keyword}` requires a function call"),
                ErrorCode::UnexpectedToken,
            );
        }
    }

    /// Parse `unsafe Block`.
    fn parse_unsafe_stmt(&mut self) -> Statement {
        let start = self.current.span;
        self.advance(); // consume 'unsafe'
        let block = self.parse_block();
        let span = start.merge(self.previous.span);
        Statement::Unsafe { block, span }
    }

    /// Parse an expression statement or an assignment. Assignment is a
    /// statement form: `target = value;`. Whether the target is a valid
    /// lvalue is decided during semantic analysis.
    fn parse_expr_or_assign_stmt(&mut self) -> Statement {
        let start = self.current.span;
        let expr = self.parse_expr();

        if self.try_consume(TokenKind::Eq) {
            let value = self.parse_expr();
            self.expect(TokenKind::Semi);
            let span = start.merge(self.previous.span);
            return Statement::Assign {
                target: expr,
                value,
                span,
            };
        }

        self.expect(TokenKind::Semi);
        let span = start.merge(self.previous.span);
        Statement::Expr { expr, span }
    }
}
