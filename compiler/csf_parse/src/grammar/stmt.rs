//! Statement grammar.
//!
//! The one genuinely ambiguous spot is the start of a statement:
//! `A.B<C> x = ...;` is a local declaration while `A.B<C>(x);` is an
//! expression statement. A trial type parse followed by an identifier
//! check decides; everything else dispatches on the leading keyword.

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{
    CatchClause, Expr, ExprKind, ForInit, GotoTarget, MethodDecl, MethodKind, Modifiers,
    ParsedType, ParsedTypeKind, Stmt, StmtKind, SwitchLabel, SwitchSection,
};
use csf_ir::{Name, Span, TokenKind};

use crate::context::ParseContext;
use crate::grammar::ty::starts_expression;
use crate::recovery::{at_statement_boundary, synchronize};
use crate::Parser;

impl Parser<'_> {
    /// `{ stmt* }` with per-statement recovery.
    pub(crate) fn parse_block(&mut self) -> Stmt {
        let start = self.cursor.current_span();
        let id = self.next_id();
        if !self.expect(&TokenKind::LBrace, "`{`") {
            return Stmt::error(id, start);
        }
        let mut statements = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            let before = self.cursor.position();
            statements.push(self.parse_statement());
            // a statement that consumed nothing would loop forever
            if self.cursor.position() == before {
                self.cursor.advance();
            }
        }
        self.expect(&TokenKind::RBrace, "`}`");
        let end = self.cursor.previous_span();
        Stmt::new(id, StmtKind::Block(statements), start.merge(end))
    }

    pub(crate) fn parse_statement(&mut self) -> Stmt {
        let span = self.cursor.current_span();
        if !self.enter(span) {
            // consume something so the caller makes progress
            self.cursor.advance();
            return Stmt::error(self.next_id(), span);
        }
        let stmt = self.statement_inner(span);
        self.leave();
        stmt
    }

    fn statement_inner(&mut self, span: Span) -> Stmt {
        match self.cursor.current_kind() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Semicolon => {
                let id = self.next_id();
                self.cursor.advance();
                Stmt::new(id, StmtKind::Empty, span)
            }
            TokenKind::If => self.if_statement(span),
            TokenKind::While => self.while_statement(span),
            TokenKind::Do => self.do_statement(span),
            TokenKind::For => self.for_statement(span),
            TokenKind::Foreach => self.foreach_statement(span),
            TokenKind::Switch => self.switch_statement(span),
            TokenKind::Try => self.try_statement(span),
            TokenKind::Using => self.using_statement(span),
            TokenKind::Lock => self.lock_statement(span),
            TokenKind::Checked | TokenKind::Unchecked
                if matches!(self.cursor.peek_kind(), TokenKind::LBrace) =>
            {
                let checked = matches!(self.cursor.current_kind(), TokenKind::Checked);
                let id = self.next_id();
                self.cursor.advance();
                let body = Box::new(self.parse_block());
                let end = self.cursor.previous_span();
                Stmt::new(id, StmtKind::Checked { checked, body }, span.merge(end))
            }
            TokenKind::Unsafe => {
                let id = self.next_id();
                self.cursor.advance();
                let saved = self.context;
                self.context |= ParseContext::IN_UNSAFE;
                let body = Box::new(self.parse_block());
                self.context = saved;
                let end = self.cursor.previous_span();
                Stmt::new(id, StmtKind::Unsafe(body), span.merge(end))
            }
            TokenKind::Return => {
                let id = self.next_id();
                self.cursor.advance();
                let value = if self.cursor.at(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                self.expect_semicolon();
                let end = self.cursor.previous_span();
                Stmt::new(id, StmtKind::Return(value), span.merge(end))
            }
            TokenKind::Break => {
                let id = self.next_id();
                self.cursor.advance();
                self.expect_semicolon();
                Stmt::new(id, StmtKind::Break, span)
            }
            TokenKind::Continue => {
                let id = self.next_id();
                self.cursor.advance();
                self.expect_semicolon();
                Stmt::new(id, StmtKind::Continue, span)
            }
            TokenKind::Goto => self.goto_statement(span),
            TokenKind::Throw => {
                let id = self.next_id();
                self.cursor.advance();
                let value = if self.cursor.at(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                self.expect_semicolon();
                let end = self.cursor.previous_span();
                Stmt::new(id, StmtKind::Throw(value), span.merge(end))
            }
            TokenKind::Const => {
                let id = self.next_id();
                self.cursor.advance();
                let ty = self.parse_type();
                let declarators = self.declarator_list();
                self.expect_semicolon();
                let end = self.cursor.previous_span();
                Stmt::new(
                    id,
                    StmtKind::LocalVar {
                        ty,
                        declarators,
                        is_const: true,
                        is_using: false,
                    },
                    span.merge(end),
                )
            }
            // `yield return e;` / `yield break;` — contextual
            TokenKind::Ident(_)
                if self.cursor.at_contextual("yield")
                    && matches!(
                        self.cursor.peek_kind(),
                        TokenKind::Return | TokenKind::Break
                    ) =>
            {
                let id = self.next_id();
                self.cursor.advance(); // yield
                let kind = if self.cursor.eat(&TokenKind::Return) {
                    StmtKind::YieldReturn(self.parse_expr())
                } else {
                    self.cursor.advance(); // break
                    StmtKind::YieldBreak
                };
                self.expect_semicolon();
                let end = self.cursor.previous_span();
                Stmt::new(id, kind, span.merge(end))
            }
            // labeled statement: `name: stmt`
            TokenKind::Ident(_) if matches!(self.cursor.peek_kind(), TokenKind::Colon) => {
                let id = self.next_id();
                let label = self.cursor.ident_name().unwrap_or(Name::EMPTY);
                self.cursor.advance();
                self.cursor.advance(); // :
                let stmt = Box::new(self.parse_statement());
                let end = self.cursor.previous_span();
                Stmt::new(id, StmtKind::Labeled { label, stmt }, span.merge(end))
            }
            _ => self.declaration_or_expression(span),
        }
    }

    pub(crate) fn expect_semicolon(&mut self) {
        if !self.expect(&TokenKind::Semicolon, "`;`") {
            synchronize(&mut self.cursor, at_statement_boundary);
            self.cursor.eat(&TokenKind::Semicolon);
        }
    }

    // === Control flow ===

    fn if_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`");
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen, "`)`");
        let then = Box::new(self.parse_statement());
        let otherwise = if self.cursor.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()))
        } else {
            None
        };
        let end = self.cursor.previous_span();
        Stmt::new(
            id,
            StmtKind::If {
                cond,
                then,
                otherwise,
            },
            span.merge(end),
        )
    }

    fn while_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`");
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen, "`)`");
        let body = Box::new(self.parse_statement());
        let end = self.cursor.previous_span();
        Stmt::new(id, StmtKind::While { cond, body }, span.merge(end))
    }

    fn do_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        let body = Box::new(self.parse_statement());
        self.expect(&TokenKind::While, "`while`");
        self.expect(&TokenKind::LParen, "`(`");
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen, "`)`");
        self.expect_semicolon();
        let end = self.cursor.previous_span();
        Stmt::new(id, StmtKind::DoWhile { body, cond }, span.merge(end))
    }

    fn for_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`");

        let init = if self.cursor.eat(&TokenKind::Semicolon) {
            None
        } else if let Some(decl) = self.try_local_declaration(false) {
            self.expect_semicolon();
            Some(ForInit::Declaration(Box::new(decl)))
        } else {
            let mut exprs = vec![self.parse_expr()];
            while self.cursor.eat(&TokenKind::Comma) {
                exprs.push(self.parse_expr());
            }
            self.expect_semicolon();
            Some(ForInit::Expressions(exprs))
        };

        let cond = if self.cursor.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&TokenKind::Semicolon, "`;`");

        let mut update = Vec::new();
        if !self.cursor.at(&TokenKind::RParen) {
            update.push(self.parse_expr());
            while self.cursor.eat(&TokenKind::Comma) {
                update.push(self.parse_expr());
            }
        }
        self.expect(&TokenKind::RParen, "`)`");
        let body = Box::new(self.parse_statement());
        let end = self.cursor.previous_span();
        Stmt::new(
            id,
            StmtKind::For {
                init,
                cond,
                update,
                body,
            },
            span.merge(end),
        )
    }

    fn foreach_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`");
        let ty = self.local_declaration_type();
        let name = self.expect_ident("iteration variable").unwrap_or(Name::EMPTY);
        self.expect(&TokenKind::In, "`in`");
        let source = self.parse_expr();
        self.expect(&TokenKind::RParen, "`)`");
        let body = Box::new(self.parse_statement());
        let end = self.cursor.previous_span();
        Stmt::new(
            id,
            StmtKind::Foreach {
                ty,
                name,
                source,
                body,
            },
            span.merge(end),
        )
    }

    fn switch_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`");
        let scrutinee = self.parse_expr();
        self.expect(&TokenKind::RParen, "`)`");
        self.expect(&TokenKind::LBrace, "`{`");

        let mut sections = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            let section_start = self.cursor.current_span();
            let mut labels = Vec::new();
            loop {
                if self.cursor.eat(&TokenKind::Case) {
                    let value = self.parse_expr();
                    self.expect(&TokenKind::Colon, "`:`");
                    labels.push(SwitchLabel::Case(value));
                } else if self.cursor.at(&TokenKind::Default)
                    && matches!(self.cursor.peek_kind(), TokenKind::Colon)
                {
                    self.cursor.advance();
                    self.cursor.advance();
                    labels.push(SwitchLabel::Default);
                } else {
                    break;
                }
            }
            if labels.is_empty() {
                let here = self.cursor.current_span();
                self.error(csf_diagnostic::unexpected_token(
                    here,
                    "`case` or `default`",
                    self.cursor.current_kind().describe(),
                ));
                synchronize(&mut self.cursor, |c| {
                    matches!(
                        c.current_kind(),
                        TokenKind::Case | TokenKind::Default | TokenKind::RBrace
                    )
                });
                continue;
            }
            let mut body = Vec::new();
            while !matches!(
                self.cursor.current_kind(),
                TokenKind::Case | TokenKind::RBrace | TokenKind::Eof
            ) && !(self.cursor.at(&TokenKind::Default)
                && matches!(self.cursor.peek_kind(), TokenKind::Colon))
            {
                let before = self.cursor.position();
                body.push(self.parse_statement());
                if self.cursor.position() == before {
                    self.cursor.advance();
                }
            }
            let end = self.cursor.previous_span();
            sections.push(SwitchSection {
                labels,
                body,
                span: section_start.merge(end),
            });
        }
        self.expect(&TokenKind::RBrace, "`}`");
        let end = self.cursor.previous_span();
        Stmt::new(
            id,
            StmtKind::Switch {
                scrutinee,
                sections,
            },
            span.merge(end),
        )
    }

    fn try_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        let body = Box::new(self.parse_block());

        let mut catches = Vec::new();
        while self.cursor.at(&TokenKind::Catch) {
            let catch_start = self.cursor.current_span();
            self.cursor.advance();
            let (ty, name) = if self.cursor.eat(&TokenKind::LParen) {
                let ty = self.parse_type();
                let name = self.cursor.ident_name().map(|n| {
                    self.cursor.advance();
                    n
                });
                self.expect(&TokenKind::RParen, "`)`");
                (Some(ty), name)
            } else {
                (None, None)
            };
            let filter = if self.cursor.eat_contextual("when") {
                self.expect(&TokenKind::LParen, "`(`");
                let filter = self.parse_expr();
                self.expect(&TokenKind::RParen, "`)`");
                Some(filter)
            } else {
                None
            };
            let catch_body = Box::new(self.parse_block());
            let end = self.cursor.previous_span();
            catches.push(CatchClause {
                ty,
                name,
                filter,
                body: catch_body,
                span: catch_start.merge(end),
            });
        }

        let finally = if self.cursor.eat(&TokenKind::Finally) {
            Some(Box::new(self.parse_block()))
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            self.error(
                Diagnostic::error(ErrorCode::E1101)
                    .with_message("`try` needs at least one `catch` or a `finally`")
                    .with_label(span, "this `try` handles nothing"),
            );
        }
        let end = self.cursor.previous_span();
        Stmt::new(
            id,
            StmtKind::Try {
                body,
                catches,
                finally,
            },
            span.merge(end),
        )
    }

    /// `using (...) stmt` or the declaration form `using var x = ...;`.
    fn using_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();

        if self.cursor.eat(&TokenKind::LParen) {
            // the resource is a declaration when a trial parse says so,
            // otherwise an expression
            let resource = if let Some(decl) = self.try_local_declaration(false) {
                decl
            } else {
                let expr = self.parse_expr();
                let expr_span = expr.span;
                Stmt::new(self.next_id(), StmtKind::Expr(expr), expr_span)
            };
            self.expect(&TokenKind::RParen, "`)`");
            let body = Box::new(self.parse_statement());
            let end = self.cursor.previous_span();
            return Stmt::new(
                id,
                StmtKind::Using {
                    resource: Box::new(resource),
                    body,
                },
                span.merge(end),
            );
        }

        // `using T x = ...;` declaration form
        let ty = self.local_declaration_type();
        let declarators = self.declarator_list();
        self.expect_semicolon();
        let end = self.cursor.previous_span();
        Stmt::new(
            id,
            StmtKind::LocalVar {
                ty,
                declarators,
                is_const: false,
                is_using: true,
            },
            span.merge(end),
        )
    }

    fn lock_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`");
        let expr = self.parse_expr();
        self.expect(&TokenKind::RParen, "`)`");
        let body = Box::new(self.parse_statement());
        let end = self.cursor.previous_span();
        Stmt::new(id, StmtKind::Lock { expr, body }, span.merge(end))
    }

    fn goto_statement(&mut self, span: Span) -> Stmt {
        let id = self.next_id();
        self.cursor.advance();
        let target = if self.cursor.eat(&TokenKind::Case) {
            GotoTarget::Case(self.parse_expr())
        } else if self.cursor.eat(&TokenKind::Default) {
            GotoTarget::Default
        } else {
            GotoTarget::Label(self.expect_ident("label").unwrap_or(Name::EMPTY))
        };
        self.expect_semicolon();
        let end = self.cursor.previous_span();
        Stmt::new(id, StmtKind::Goto(target), span.merge(end))
    }

    // === Declarations vs expressions ===

    fn declaration_or_expression(&mut self, span: Span) -> Stmt {
        if let Some(decl) = self.try_local_declaration(true) {
            return decl;
        }
        if let Some(func) = self.try_local_function() {
            return func;
        }

        let id = self.next_id();
        let before = self.cursor.position();
        let expr = self.parse_expr();
        if matches!(expr.kind, ExprKind::Error) && self.cursor.position() == before {
            // nothing consumed: resynchronize so the block loop advances
            synchronize(&mut self.cursor, at_statement_boundary);
            self.cursor.eat(&TokenKind::Semicolon);
            return Stmt::error(id, span.merge(self.cursor.previous_span()));
        }
        self.expect_semicolon();
        let end = self.cursor.previous_span();
        Stmt::new(id, StmtKind::Expr(expr), span.merge(end))
    }

    /// Trial parse of `T name [= init][, ...]`. `consume_semicolon` is
    /// false for `for` initializers and `using` resources, whose callers
    /// own the terminator.
    fn try_local_declaration(&mut self, consume_semicolon: bool) -> Option<Stmt> {
        let span = self.cursor.current_span();
        let header = self.try_parse(|p| {
            // `await t;` is an await expression, never a declaration of
            // type `await`; mirrors the contextual test in the expression
            // grammar
            if p.cursor.at_contextual("await") && starts_expression(p.cursor.peek_kind()) {
                return None;
            }
            let ty = p.local_declaration_type_opt()?;
            // a declaration needs `ident` then `=`, `,`, or `;`
            let name = p.cursor.ident_name()?;
            if !matches!(
                p.cursor.peek_kind(),
                TokenKind::Eq | TokenKind::Comma | TokenKind::Semicolon
            ) {
                return None;
            }
            // `A * b;` outside unsafe is a multiplication, not a
            // pointer declaration
            if matches!(ty.kind, ParsedTypeKind::Pointer(_)) && !p.context.in_unsafe() {
                return None;
            }
            p.cursor.advance();
            Some((ty, name))
        })?;
        let (ty, first_name) = header;

        let id = self.next_id();
        let mut declarators = Vec::new();
        let init = if self.cursor.eat(&TokenKind::Eq) {
            Some(self.parse_expr())
        } else {
            None
        };
        declarators.push((first_name, init));
        while self.cursor.eat(&TokenKind::Comma) {
            let name = self.expect_ident("variable name").unwrap_or(Name::EMPTY);
            let init = if self.cursor.eat(&TokenKind::Eq) {
                Some(self.parse_expr())
            } else {
                None
            };
            declarators.push((name, init));
        }
        if consume_semicolon {
            self.expect_semicolon();
        }
        let end = self.cursor.previous_span();
        Some(Stmt::new(
            id,
            StmtKind::LocalVar {
                ty,
                declarators,
                is_const: false,
                is_using: false,
            },
            span.merge(end),
        ))
    }

    /// `int F(int x) { ... }` / `T F<U>(U u) => ...;`
    fn try_local_function(&mut self) -> Option<Stmt> {
        let span = self.cursor.current_span();
        let header = self.try_parse(|p| {
            let ret = p.type_opt()?;
            let name = p.cursor.ident_name()?;
            p.cursor.advance();
            let type_params = if p.cursor.at(&TokenKind::Lt) {
                p.type_parameter_list_opt()?
            } else {
                Vec::new()
            };
            if !p.cursor.at(&TokenKind::LParen) {
                return None;
            }
            // a local function must have a body: scan past the matching
            // `)` for `{`, `=>`, or a constraint clause, otherwise this
            // is a call expression (`await F();` must stay one)
            let params_start = p.cursor.position();
            let mut depth = 0usize;
            loop {
                match p.cursor.current_kind() {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            p.cursor.advance();
                            break;
                        }
                    }
                    TokenKind::LBrace | TokenKind::Semicolon | TokenKind::Eof => return None,
                    _ => {}
                }
                p.cursor.advance();
            }
            let has_body = matches!(
                p.cursor.current_kind(),
                TokenKind::LBrace | TokenKind::FatArrow
            ) || p.cursor.at_contextual("where");
            if !has_body {
                return None;
            }
            p.cursor.set_position(params_start);
            Some((ret, name, type_params))
        })?;
        let (return_type, name, type_params) = header;

        let id = self.next_id();
        let params = self.parameter_list();
        let constraints = self.constraint_clauses();
        let body = if self.cursor.eat(&TokenKind::FatArrow) {
            let expr = self.parse_expr();
            self.expect_semicolon();
            let expr_span = expr.span;
            let ret_id = self.next_id();
            Some(Stmt::new(ret_id, StmtKind::Return(Some(expr)), expr_span))
        } else {
            Some(self.parse_block())
        };
        let end = self.cursor.previous_span();
        let decl = MethodDecl {
            id,
            kind: MethodKind::LocalFunction,
            name,
            modifiers: Modifiers::empty(),
            attributes: Vec::new(),
            type_params,
            constraints,
            params,
            return_type: Some(return_type),
            explicit_interface: None,
            body,
            span: span.merge(end),
        };
        let stmt_id = self.next_id();
        Some(Stmt::new(
            stmt_id,
            StmtKind::LocalFunction(Box::new(decl)),
            span.merge(end),
        ))
    }

    /// Type at the head of a local declaration; `var` maps to the
    /// inference placeholder here and nowhere else.
    pub(crate) fn local_declaration_type(&mut self) -> ParsedType {
        match self.local_declaration_type_opt() {
            Some(ty) => ty,
            None => {
                let span = self.cursor.current_span();
                self.error(
                    Diagnostic::error(ErrorCode::E1104)
                        .with_message("expected a type or `var`")
                        .with_label(span, "expected a type here"),
                );
                ParsedType::error(span)
            }
        }
    }

    fn local_declaration_type_opt(&mut self) -> Option<ParsedType> {
        let span = self.cursor.current_span();
        if self.cursor.at_contextual("var")
            && !matches!(self.cursor.peek_kind(), TokenKind::Dot | TokenKind::Lt)
        {
            self.cursor.advance();
            return Some(ParsedType::new(ParsedTypeKind::Var, span));
        }
        self.type_opt()
    }

    /// `name [= init] (, name [= init])*` without the terminator.
    pub(crate) fn declarator_list(&mut self) -> Vec<(Name, Option<Expr>)> {
        let mut declarators = Vec::new();
        loop {
            let name = self.expect_ident("variable name").unwrap_or(Name::EMPTY);
            let init = if self.cursor.eat(&TokenKind::Eq) {
                Some(self.parse_expr())
            } else {
                None
            };
            declarators.push((name, init));
            if !self.cursor.eat(&TokenKind::Comma) {
                return declarators;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use csf_ir::ast::{ExprKind, ForInit, ParsedTypeKind, StmtKind, UnaryOp};
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use crate::Parser;

    fn parse_stmt(source: &str) -> StmtKind {
        let interner = StringInterner::new();
        let (tokens, diags) = csf_lexer::lex(source, &interner);
        assert!(diags.is_empty());
        let mut parser = Parser::new(&tokens, &interner);
        let stmt = parser.parse_statement();
        assert!(
            parser.diagnostics.is_empty(),
            "unexpected diagnostics for {source:?}: {:?}",
            parser.diagnostics
        );
        stmt.kind
    }

    #[test]
    fn local_declaration_forms() {
        let StmtKind::LocalVar {
            ty, declarators, ..
        } = parse_stmt("int x = 1, y = 2;")
        else {
            panic!("expected local declaration");
        };
        assert!(matches!(
            ty.kind,
            ParsedTypeKind::Primitive(csf_ir::ast::PrimitiveName::Int)
        ));
        assert_eq!(declarators.len(), 2);

        let StmtKind::LocalVar { ty, .. } = parse_stmt("var x = F();") else {
            panic!("expected local declaration");
        };
        assert!(ty.is_var());
    }

    #[test]
    fn generic_declaration_vs_call() {
        assert!(matches!(
            parse_stmt("List<int> xs = null;"),
            StmtKind::LocalVar { .. }
        ));
        assert!(matches!(parse_stmt("F<int>(x);"), StmtKind::Expr(_)));
    }

    #[test]
    fn pointer_declaration_needs_unsafe() {
        // outside unsafe, `A * b;` is a multiplication statement
        assert!(matches!(parse_stmt("A * b;"), StmtKind::Expr(_)));
        // inside an unsafe block it declares a pointer local
        let StmtKind::Unsafe(body) = parse_stmt("unsafe { A * b; }") else {
            panic!("expected unsafe block");
        };
        let StmtKind::Block(stmts) = &body.kind else {
            panic!("expected block");
        };
        assert!(matches!(stmts[0].kind, StmtKind::LocalVar { .. }));
    }

    #[test]
    fn var_is_contextual() {
        // `var` with a member access is an ordinary expression statement
        assert!(matches!(parse_stmt("var.M();"), StmtKind::Expr(_)));
    }

    #[test]
    fn statement_leading_await_is_an_expression() {
        // not a declaration of type `await` named `t`
        let StmtKind::Expr(expr) = parse_stmt("await t;") else {
            panic!("expected expression statement");
        };
        assert!(matches!(
            expr.kind,
            ExprKind::Unary {
                op: UnaryOp::Await,
                ..
            }
        ));
        // `await` with no operand stays an identifier declaration name
        assert!(matches!(
            parse_stmt("var await = 1;"),
            StmtKind::LocalVar { .. }
        ));
    }

    #[test]
    fn control_flow_statements() {
        assert!(matches!(parse_stmt("if (a) b(); else c();"), StmtKind::If { otherwise: Some(_), .. }));
        assert!(matches!(parse_stmt("while (a) { }"), StmtKind::While { .. }));
        assert!(matches!(
            parse_stmt("do { } while (a);"),
            StmtKind::DoWhile { .. }
        ));
        assert!(matches!(
            parse_stmt("foreach (var x in xs) { }"),
            StmtKind::Foreach { .. }
        ));
    }

    #[test]
    fn for_statement_with_declaration_init() {
        let StmtKind::For { init, update, .. } = parse_stmt("for (int i = 0; i < n; i++) { }")
        else {
            panic!("expected for");
        };
        assert!(matches!(init, Some(ForInit::Declaration(_))));
        assert_eq!(update.len(), 1);
    }

    #[test]
    fn switch_sections_and_goto_case() {
        let StmtKind::Switch { sections, .. } = parse_stmt(
            "switch (x) { case 1: case 2: F(); break; default: goto case 1; }",
        ) else {
            panic!("expected switch");
        };
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].labels.len(), 2);
    }

    #[test]
    fn try_catch_when_finally() {
        let StmtKind::Try {
            catches, finally, ..
        } = parse_stmt(
            "try { } catch (IOException e) when (e.Code == 2) { } catch { } finally { }",
        )
        else {
            panic!("expected try");
        };
        assert_eq!(catches.len(), 2);
        assert!(catches[0].filter.is_some());
        assert!(catches[1].ty.is_none());
        assert!(finally.is_some());
    }

    #[test]
    fn using_statement_and_declaration() {
        assert!(matches!(
            parse_stmt("using (var f = Open()) { }"),
            StmtKind::Using { .. }
        ));
        assert!(matches!(
            parse_stmt("using var f = Open();"),
            StmtKind::LocalVar { is_using: true, .. }
        ));
    }

    #[test]
    fn yield_statements_are_contextual() {
        assert!(matches!(
            parse_stmt("yield return 1;"),
            StmtKind::YieldReturn(_)
        ));
        assert!(matches!(parse_stmt("yield break;"), StmtKind::YieldBreak));
        // `yield` alone is an ordinary identifier
        assert!(matches!(parse_stmt("yield = 5;"), StmtKind::Expr(_)));
    }

    #[test]
    fn labeled_statement_and_goto() {
        assert!(matches!(
            parse_stmt("again: x++;"),
            StmtKind::Labeled { .. }
        ));
        assert!(matches!(parse_stmt("goto again;"), StmtKind::Goto(_)));
    }

    #[test]
    fn local_function() {
        let StmtKind::LocalFunction(decl) = parse_stmt("int Square(int x) => x * x;") else {
            panic!("expected local function");
        };
        assert_eq!(decl.params.len(), 1);
        assert!(decl.body.is_some());
    }

    #[test]
    fn recovery_keeps_following_statements() {
        let interner = StringInterner::new();
        let (tokens, _) = csf_lexer::lex("{ int x = ; return x; }", &interner);
        let mut parser = Parser::new(&tokens, &interner);
        let block = parser.parse_block();
        assert!(!parser.diagnostics.is_empty());
        let StmtKind::Block(stmts) = block.kind else {
            panic!("expected block");
        };
        // the bad declaration did not eat the `return`
        assert!(stmts
            .iter()
            .any(|s| matches!(s.kind, StmtKind::Return(_))));
    }
}
