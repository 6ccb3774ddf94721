//! Expression grammar: precedence climbing over the binary operators,
//! with speculative disambiguation for the classic C# ambiguities.
//!
//! - `F<A, B>(x)` vs `F < A, B > (x)`: after `ident <`, a trial parse of
//!   a type argument list commits only when the token after `>` is in
//!   the disambiguating follow set.
//! - `(T)x` vs `(expr)`: a trial parse of a type inside parentheses
//!   commits as a cast when the following token could start the operand
//!   (with a stricter follow set for named types, so `(a)-b` stays a
//!   subtraction).
//! - `(a, b) => ...` vs tuple/parenthesized expression: decided by
//!   scanning to the matching `)` and peeking for `=>`.

use csf_diagnostic::expected_expression;
use csf_ir::ast::{
    AnonymousMember, Argument, ArgumentModifier, AssignOp, BinaryOp, Expr, ExprKind, LambdaBody,
    LambdaParam, OrderingDirection, ParsedType, ParsedTypeKind, QueryClause, QueryExpr,
    QueryFinal, TupleElement, UnaryOp,
};
use csf_ir::{Name, Span, TokenKind};

use crate::grammar::ty::{primitive_name, starts_expression};
use crate::Parser;

/// Binding powers, higher binds tighter. Assignment and the conditional
/// operator sit above this table (right-associative, handled separately).
fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Coalesce => 1,
        BinaryOp::LogOr => 2,
        BinaryOp::LogAnd => 3,
        BinaryOp::BitOr => 4,
        BinaryOp::BitXor => 5,
        BinaryOp::BitAnd => 6,
        BinaryOp::Eq | BinaryOp::NotEq => 7,
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => 8,
        BinaryOp::Shl | BinaryOp::Shr => 9,
        BinaryOp::Add | BinaryOp::Sub => 10,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 11,
    }
}

/// `is`/`as` bind at relational precedence.
const TYPE_TEST_PRECEDENCE: u8 = 8;

impl Parser<'_> {
    /// Parse a full expression (assignment level).
    pub(crate) fn parse_expr(&mut self) -> Expr {
        let span = self.cursor.current_span();
        if !self.enter(span) {
            return Expr::error(self.next_id(), span);
        }
        let expr = self.assignment();
        self.leave();
        expr
    }

    fn assignment(&mut self) -> Expr {
        let lhs = self.conditional();
        let op = match self.cursor.current_kind() {
            TokenKind::Eq => Some(AssignOp::Simple),
            TokenKind::PlusEq => Some(AssignOp::Compound(BinaryOp::Add)),
            TokenKind::MinusEq => Some(AssignOp::Compound(BinaryOp::Sub)),
            TokenKind::StarEq => Some(AssignOp::Compound(BinaryOp::Mul)),
            TokenKind::SlashEq => Some(AssignOp::Compound(BinaryOp::Div)),
            TokenKind::PercentEq => Some(AssignOp::Compound(BinaryOp::Rem)),
            TokenKind::AmpEq => Some(AssignOp::Compound(BinaryOp::BitAnd)),
            TokenKind::PipeEq => Some(AssignOp::Compound(BinaryOp::BitOr)),
            TokenKind::CaretEq => Some(AssignOp::Compound(BinaryOp::BitXor)),
            TokenKind::ShlEq => Some(AssignOp::Compound(BinaryOp::Shl)),
            TokenKind::CoalesceEq => Some(AssignOp::Compound(BinaryOp::Coalesce)),
            _ if self.cursor.is_shift_right_assign() => {
                // `>` + adjacent `>=`
                self.cursor.advance();
                Some(AssignOp::Compound(BinaryOp::Shr))
            }
            _ => None,
        };
        let Some(op) = op else { return lhs };
        self.cursor.advance();
        let rhs = self.assignment();
        let span = lhs.span.merge(rhs.span);
        Expr::new(
            self.next_id(),
            ExprKind::Assign {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn conditional(&mut self) -> Expr {
        let cond = self.binary(1);
        // `?.` and `?[` were consumed by the postfix loop; a bare `?`
        // here is the conditional operator.
        if !self.cursor.at(&TokenKind::Question) {
            return cond;
        }
        self.cursor.advance();
        let then = self.parse_expr();
        self.expect(&TokenKind::Colon, "`:`");
        let otherwise = self.parse_expr();
        let span = cond.span.merge(otherwise.span);
        Expr::new(
            self.next_id(),
            ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            span,
        )
    }

    fn binary(&mut self, min_precedence: u8) -> Expr {
        let mut lhs = self.unary();
        loop {
            // `is T` / `as T` at relational precedence.
            if TYPE_TEST_PRECEDENCE >= min_precedence {
                if self.cursor.at(&TokenKind::Is) {
                    self.cursor.advance();
                    lhs = self.type_test(lhs, true);
                    continue;
                }
                if self.cursor.at(&TokenKind::As) {
                    self.cursor.advance();
                    lhs = self.type_test(lhs, false);
                    continue;
                }
            }

            let op = if self.cursor.is_shift_right() {
                BinaryOp::Shr
            } else {
                match self.cursor.current_kind() {
                    TokenKind::Coalesce => BinaryOp::Coalesce,
                    TokenKind::PipePipe => BinaryOp::LogOr,
                    TokenKind::AmpAmp => BinaryOp::LogAnd,
                    TokenKind::Pipe => BinaryOp::BitOr,
                    TokenKind::Caret => BinaryOp::BitXor,
                    TokenKind::Amp => BinaryOp::BitAnd,
                    TokenKind::EqEq => BinaryOp::Eq,
                    TokenKind::NotEq => BinaryOp::NotEq,
                    TokenKind::Lt => BinaryOp::Lt,
                    TokenKind::Gt => BinaryOp::Gt,
                    TokenKind::LtEq => BinaryOp::LtEq,
                    TokenKind::GtEq => BinaryOp::GtEq,
                    TokenKind::Shl => BinaryOp::Shl,
                    TokenKind::Plus => BinaryOp::Add,
                    TokenKind::Minus => BinaryOp::Sub,
                    TokenKind::Star => BinaryOp::Mul,
                    TokenKind::Slash => BinaryOp::Div,
                    TokenKind::Percent => BinaryOp::Rem,
                    _ => return lhs,
                }
            };
            let precedence = binary_precedence(op);
            if precedence < min_precedence {
                return lhs;
            }
            if op == BinaryOp::Shr {
                self.cursor.advance(); // first `>`
            }
            self.cursor.advance();
            // `??` is right-associative; the rest are left-associative.
            let next_min = if op == BinaryOp::Coalesce {
                precedence
            } else {
                precedence + 1
            };
            let rhs = self.binary(next_min);
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                self.next_id(),
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    fn type_test(&mut self, expr: Expr, is_test: bool) -> Expr {
        let ty = match self.type_in_expression() {
            Some(ty) => ty,
            None => {
                let span = self.cursor.current_span();
                self.error(
                    csf_diagnostic::Diagnostic::error(csf_diagnostic::ErrorCode::E1104)
                        .with_message("expected type after `is`/`as`")
                        .with_label(span, "expected a type here"),
                );
                ParsedType::error(span)
            }
        };
        let span = expr.span.merge(ty.span);
        let kind = if is_test {
            ExprKind::Is {
                expr: Box::new(expr),
                ty,
            }
        } else {
            ExprKind::As {
                expr: Box::new(expr),
                ty,
            }
        };
        Expr::new(self.next_id(), kind, span)
    }

    fn unary(&mut self) -> Expr {
        let start = self.cursor.current_span();
        if !self.enter(start) {
            return Expr::error(self.next_id(), start);
        }
        let expr = self.unary_inner(start);
        self.leave();
        expr
    }

    fn unary_inner(&mut self, start: Span) -> Expr {
        let op = match self.cursor.current_kind() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::PlusPlus => Some(UnaryOp::PreInc),
            TokenKind::MinusMinus => Some(UnaryOp::PreDec),
            // pointer operators; legality outside unsafe contexts is
            // the checker's concern
            TokenKind::Amp => Some(UnaryOp::AddressOf),
            TokenKind::Star => Some(UnaryOp::Deref),
            _ => None,
        };
        if let Some(op) = op {
            self.cursor.advance();
            let operand = self.unary();
            let span = start.merge(operand.span);
            return Expr::new(
                self.next_id(),
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            );
        }

        // `await expr` — contextual; `await` alone stays an identifier
        // (`var await = 1;` must keep parsing).
        if self.cursor.at_contextual("await") && starts_expression(self.cursor.peek_kind()) {
            self.cursor.advance();
            let operand = self.unary();
            let span = start.merge(operand.span);
            return Expr::new(
                self.next_id(),
                ExprKind::Unary {
                    op: UnaryOp::Await,
                    operand: Box::new(operand),
                },
                span,
            );
        }

        if self.cursor.at(&TokenKind::LParen) {
            if let Some(cast) = self.try_cast() {
                return cast;
            }
        }

        self.postfix()
    }

    /// `(T)operand` — committed only when the trial type parse succeeds
    /// and the follow token passes the cast heuristic.
    fn try_cast(&mut self) -> Option<Expr> {
        let start = self.cursor.current_span();
        let ty = self.try_parse(|p| {
            p.cursor.advance(); // (
            let ty = p.type_opt()?;
            if !p.cursor.eat(&TokenKind::RParen) {
                return None;
            }
            let next = p.cursor.current_kind();
            let commit = if primitive_rooted(&ty) {
                // a parenthesized builtin keyword can only be a cast
                starts_expression(next)
            } else {
                // `(name)` could be a parenthesized expression, so
                // `-`, `+`, `&`, `*` after it stay binary operators
                starts_expression(next)
                    && !matches!(
                        next,
                        TokenKind::Minus
                            | TokenKind::Plus
                            | TokenKind::Amp
                            | TokenKind::Star
                            | TokenKind::PlusPlus
                            | TokenKind::MinusMinus
                    )
            };
            commit.then_some(ty)
        })?;
        let operand = self.unary();
        let span = start.merge(operand.span);
        Some(Expr::new(
            self.next_id(),
            ExprKind::Cast {
                ty,
                expr: Box::new(operand),
            },
            span,
        ))
    }

    fn postfix(&mut self) -> Expr {
        let mut expr = self.primary();
        loop {
            match self.cursor.current_kind() {
                TokenKind::Dot => {
                    self.cursor.advance();
                    expr = self.member_access(expr, false);
                }
                TokenKind::QuestionDot => {
                    self.cursor.advance();
                    expr = self.member_access(expr, true);
                }
                TokenKind::LParen => {
                    let args = self.argument_list(TokenKind::LParen, TokenKind::RParen);
                    let span = expr.span.merge(self.cursor.previous_span());
                    expr = Expr::new(
                        self.next_id(),
                        ExprKind::Invocation {
                            target: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    let args = self.argument_list(TokenKind::LBracket, TokenKind::RBracket);
                    let span = expr.span.merge(self.cursor.previous_span());
                    expr = Expr::new(
                        self.next_id(),
                        ExprKind::Index {
                            target: Box::new(expr),
                            args,
                            null_conditional: false,
                        },
                        span,
                    );
                }
                // `a?[i]` — no collection literals exist, so `? [` can
                // only be the null-conditional index
                TokenKind::Question if matches!(self.cursor.peek_kind(), TokenKind::LBracket) => {
                    self.cursor.advance();
                    let args = self.argument_list(TokenKind::LBracket, TokenKind::RBracket);
                    let span = expr.span.merge(self.cursor.previous_span());
                    expr = Expr::new(
                        self.next_id(),
                        ExprKind::Index {
                            target: Box::new(expr),
                            args,
                            null_conditional: true,
                        },
                        span,
                    );
                }
                TokenKind::PlusPlus => {
                    self.cursor.advance();
                    let span = expr.span.merge(self.cursor.previous_span());
                    expr = Expr::new(
                        self.next_id(),
                        ExprKind::Unary {
                            op: UnaryOp::PostInc,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                TokenKind::MinusMinus => {
                    self.cursor.advance();
                    let span = expr.span.merge(self.cursor.previous_span());
                    expr = Expr::new(
                        self.next_id(),
                        ExprKind::Unary {
                            op: UnaryOp::PostDec,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                _ => return expr,
            }
        }
    }

    fn member_access(&mut self, target: Expr, null_conditional: bool) -> Expr {
        let Some(name) = self.expect_ident("member name") else {
            return Expr::error(self.next_id(), target.span);
        };
        let type_args = if self.cursor.at(&TokenKind::Lt) {
            self.generic_args_in_expression().unwrap_or_default()
        } else {
            Vec::new()
        };
        let span = target.span.merge(self.cursor.previous_span());
        Expr::new(
            self.next_id(),
            ExprKind::Member {
                target: Box::new(target),
                name,
                type_args,
                null_conditional,
            },
            span,
        )
    }

    /// Trial parse of `<T, U>` after a name in expression position.
    /// Commits only when the follow token distinguishes a generic name
    /// from a relational chain.
    fn generic_args_in_expression(&mut self) -> Option<Vec<ParsedType>> {
        self.try_parse(|p| {
            let args = p.type_argument_list()?;
            let commit = matches!(
                p.cursor.current_kind(),
                TokenKind::LParen
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::Colon
                    | TokenKind::Semicolon
                    | TokenKind::Comma
                    | TokenKind::Dot
                    | TokenKind::Question
                    | TokenKind::EqEq
                    | TokenKind::NotEq
                    | TokenKind::Eof
            );
            commit.then_some(args)
        })
    }

    /// `(args)` / `[args]` with `ref`/`out` modifiers and named
    /// arguments.
    pub(crate) fn argument_list(&mut self, open: TokenKind, close: TokenKind) -> Vec<Argument> {
        debug_assert!(self.cursor.at(&open));
        self.cursor.advance();
        let mut args = Vec::new();
        if self.cursor.eat(&close) {
            return args;
        }
        loop {
            args.push(self.argument());
            if self.cursor.eat(&TokenKind::Comma) {
                continue;
            }
            let what = if close == TokenKind::RParen {
                "`)`"
            } else {
                "`]`"
            };
            self.expect(&close, what);
            return args;
        }
    }

    fn argument(&mut self) -> Argument {
        let start = self.cursor.current_span();
        // named argument: `name: value`
        let name = match (self.cursor.ident_name(), self.cursor.peek_kind()) {
            (Some(name), TokenKind::Colon) => {
                self.cursor.advance();
                self.cursor.advance();
                Some(name)
            }
            _ => None,
        };
        let modifier = if self.cursor.eat(&TokenKind::Ref) {
            ArgumentModifier::Ref
        } else if self.cursor.eat(&TokenKind::Out) {
            ArgumentModifier::Out
        } else {
            ArgumentModifier::None
        };
        let expr = self.parse_expr();
        let span = start.merge(expr.span);
        Argument {
            name,
            modifier,
            expr,
            span,
        }
    }

    // === Primary expressions ===

    fn primary(&mut self) -> Expr {
        let span = self.cursor.current_span();
        let kind = match self.cursor.current_kind().clone() {
            TokenKind::Int { value, suffix } => {
                self.cursor.advance();
                ExprKind::LitInt { value, suffix }
            }
            TokenKind::Real { bits, suffix } => {
                self.cursor.advance();
                ExprKind::LitReal { bits, suffix }
            }
            TokenKind::String(name) => {
                self.cursor.advance();
                ExprKind::LitString(name)
            }
            TokenKind::Char(c) => {
                self.cursor.advance();
                ExprKind::LitChar(c)
            }
            TokenKind::True => {
                self.cursor.advance();
                ExprKind::LitBool(true)
            }
            TokenKind::False => {
                self.cursor.advance();
                ExprKind::LitBool(false)
            }
            TokenKind::Null => {
                self.cursor.advance();
                ExprKind::LitNull
            }
            TokenKind::This => {
                self.cursor.advance();
                ExprKind::This
            }
            TokenKind::Base => {
                self.cursor.advance();
                ExprKind::Base
            }
            TokenKind::Ident(name) => return self.identifier_start(name, span),
            TokenKind::LParen => return self.paren_start(span),
            TokenKind::New => return self.new_expression(span),
            TokenKind::Typeof => {
                self.cursor.advance();
                self.expect(&TokenKind::LParen, "`(`");
                let ty = self.parse_type();
                self.expect(&TokenKind::RParen, "`)`");
                ExprKind::TypeOf(ty)
            }
            TokenKind::Sizeof => {
                self.cursor.advance();
                self.expect(&TokenKind::LParen, "`(`");
                let ty = self.parse_type();
                self.expect(&TokenKind::RParen, "`)`");
                ExprKind::SizeOf(ty)
            }
            TokenKind::Default => {
                self.cursor.advance();
                if self.cursor.eat(&TokenKind::LParen) {
                    let ty = self.parse_type();
                    self.expect(&TokenKind::RParen, "`)`");
                    ExprKind::Default(Some(ty))
                } else {
                    ExprKind::Default(None)
                }
            }
            TokenKind::Checked | TokenKind::Unchecked => {
                let checked = matches!(self.cursor.current_kind(), TokenKind::Checked);
                self.cursor.advance();
                self.expect(&TokenKind::LParen, "`(`");
                let inner = self.parse_expr();
                self.expect(&TokenKind::RParen, "`)`");
                ExprKind::CheckedExpr {
                    checked,
                    expr: Box::new(inner),
                }
            }
            TokenKind::Delegate => return self.anonymous_method(span),
            // `int.Parse(...)`: a builtin type keyword in expression
            // position stands for its type; resolution maps the alias.
            kind if kind.is_builtin_type_keyword()
                && matches!(self.cursor.peek_kind(), TokenKind::Dot) =>
            {
                let text = builtin_alias_text(&kind);
                self.cursor.advance();
                ExprKind::Ident(self.cursor.interner().intern(text))
            }
            _ => {
                let found = self.cursor.current_kind().describe();
                self.error(expected_expression(span, found));
                // do not consume: the caller's recovery decides
                ExprKind::Error
            }
        };
        let end = self.cursor.previous_span();
        Expr::new(self.next_id(), kind, span.merge(end))
    }

    /// Expression starting with an identifier: plain name, generic
    /// method name, contextual keyword construct, or single-parameter
    /// lambda.
    fn identifier_start(&mut self, name: Name, span: Span) -> Expr {
        // `x => body`
        if matches!(self.cursor.peek_kind(), TokenKind::FatArrow) {
            return self.lambda_from_single_param(span, false);
        }

        let text = self.name_text(name);
        match text {
            "from" => {
                if let Some(query) = self.try_query(span) {
                    return query;
                }
            }
            "async" => {
                if let Some(lambda) = self.try_async_lambda(span) {
                    return lambda;
                }
            }
            "nameof" if matches!(self.cursor.peek_kind(), TokenKind::LParen) => {
                self.cursor.advance();
                self.cursor.advance(); // (
                let inner = self.parse_expr();
                self.expect(&TokenKind::RParen, "`)`");
                let end = self.cursor.previous_span();
                return Expr::new(
                    self.next_id(),
                    ExprKind::NameOf(Box::new(inner)),
                    span.merge(end),
                );
            }
            _ => {}
        }

        self.cursor.advance();
        if self.cursor.at(&TokenKind::Lt) {
            if let Some(type_args) = self.generic_args_in_expression() {
                let end = self.cursor.previous_span();
                return Expr::new(
                    self.next_id(),
                    ExprKind::GenericName { name, type_args },
                    span.merge(end),
                );
            }
        }
        Expr::new(self.next_id(), ExprKind::Ident(name), span)
    }

    /// `(`: lambda parameter list, tuple literal, or parenthesized
    /// expression. A cast was already ruled out by `try_cast`.
    fn paren_start(&mut self, span: Span) -> Expr {
        if self.paren_starts_lambda() {
            return self.lambda_from_paren_params(span, false);
        }

        self.cursor.advance(); // (
        let first = self.parse_expr();
        if self.cursor.at(&TokenKind::Comma)
            || (self.cursor.at(&TokenKind::Colon)
                && matches!(first.kind, ExprKind::Ident(_)))
        {
            return self.tuple_literal(span, first);
        }
        self.expect(&TokenKind::RParen, "`)`");
        let end = self.cursor.previous_span();
        Expr::new(
            self.next_id(),
            ExprKind::Paren(Box::new(first)),
            span.merge(end),
        )
    }

    /// Scan from `(` to its matching `)` and peek for `=>`.
    fn paren_starts_lambda(&mut self) -> bool {
        self.look_ahead(|p| {
            debug_assert!(p.cursor.at(&TokenKind::LParen));
            p.cursor.advance();
            let mut depth = 1u32;
            loop {
                match p.cursor.current_kind() {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            p.cursor.advance();
                            return matches!(p.cursor.current_kind(), TokenKind::FatArrow);
                        }
                    }
                    TokenKind::Eof => return false,
                    _ => {}
                }
                p.cursor.advance();
            }
        })
    }

    fn tuple_literal(&mut self, span: Span, first: Expr) -> Expr {
        let mut elements = Vec::new();
        let mut current = first;
        loop {
            // rewrite `name: value` elements; `first` arrived already
            // parsed, so a pending `:` re-associates it here
            let element = if self.cursor.at(&TokenKind::Colon) {
                if let ExprKind::Ident(name) = current.kind {
                    self.cursor.advance();
                    let value = self.parse_expr();
                    TupleElement {
                        name: Some(name),
                        value,
                    }
                } else {
                    TupleElement {
                        name: None,
                        value: current,
                    }
                }
            } else {
                TupleElement {
                    name: None,
                    value: current,
                }
            };
            elements.push(element);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
            // named element in later positions: `b: 2`
            if let (Some(name), TokenKind::Colon) =
                (self.cursor.ident_name(), self.cursor.peek_kind())
            {
                self.cursor.advance();
                self.cursor.advance();
                let value = self.parse_expr();
                elements.push(TupleElement {
                    name: Some(name),
                    value,
                });
                if self.cursor.eat(&TokenKind::Comma) {
                    current = self.parse_expr();
                    continue;
                }
                break;
            }
            current = self.parse_expr();
        }
        self.expect(&TokenKind::RParen, "`)`");
        let end = self.cursor.previous_span();
        Expr::new(
            self.next_id(),
            ExprKind::Tuple(elements),
            span.merge(end),
        )
    }

    // === Lambdas ===

    fn lambda_from_single_param(&mut self, span: Span, is_async: bool) -> Expr {
        let param_span = self.cursor.current_span();
        let name = self.cursor.ident_name().unwrap_or(Name::EMPTY);
        self.cursor.advance();
        self.expect(&TokenKind::FatArrow, "`=>`");
        let params = vec![LambdaParam {
            name,
            ty: None,
            span: param_span,
        }];
        self.lambda_body(span, params, is_async)
    }

    fn lambda_from_paren_params(&mut self, span: Span, is_async: bool) -> Expr {
        self.cursor.advance(); // (
        let mut params = Vec::new();
        if !self.cursor.eat(&TokenKind::RParen) {
            loop {
                params.push(self.lambda_param());
                if self.cursor.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(&TokenKind::RParen, "`)`");
                break;
            }
        }
        self.expect(&TokenKind::FatArrow, "`=>`");
        self.lambda_body(span, params, is_async)
    }

    /// `x` or `int x` — a typed parameter when two identifiers (or a
    /// type keyword and an identifier) appear in a row.
    fn lambda_param(&mut self) -> LambdaParam {
        let span = self.cursor.current_span();
        let untyped = matches!(self.cursor.current_kind(), TokenKind::Ident(_))
            && matches!(
                self.cursor.peek_kind(),
                TokenKind::Comma | TokenKind::RParen
            );
        if untyped {
            let name = self.cursor.ident_name().unwrap_or(Name::EMPTY);
            self.cursor.advance();
            return LambdaParam {
                name,
                ty: None,
                span,
            };
        }
        let ty = self.parse_type();
        let name = self.expect_ident("parameter name").unwrap_or(Name::EMPTY);
        let end = self.cursor.previous_span();
        LambdaParam {
            name,
            ty: Some(ty),
            span: span.merge(end),
        }
    }

    fn lambda_body(&mut self, span: Span, params: Vec<LambdaParam>, is_async: bool) -> Expr {
        let body = if self.cursor.at(&TokenKind::LBrace) {
            LambdaBody::Block(Box::new(self.parse_block()))
        } else {
            LambdaBody::Expr(Box::new(self.parse_expr()))
        };
        let end = self.cursor.previous_span();
        Expr::new(
            self.next_id(),
            ExprKind::Lambda {
                params,
                body,
                is_async,
            },
            span.merge(end),
        )
    }

    fn try_async_lambda(&mut self, span: Span) -> Option<Expr> {
        // `async x => ...`
        if matches!(self.cursor.peek_kind(), TokenKind::Ident(_)) {
            let is_lambda = self.look_ahead(|p| {
                p.cursor.advance();
                p.cursor.advance();
                matches!(p.cursor.current_kind(), TokenKind::FatArrow)
            });
            if is_lambda {
                self.cursor.advance(); // async
                return Some(self.lambda_from_single_param(span, true));
            }
        }
        // `async (params) => ...`
        if matches!(self.cursor.peek_kind(), TokenKind::LParen) {
            let is_lambda = self.look_ahead(|p| {
                p.cursor.advance();
                p.paren_starts_lambda()
            });
            if is_lambda {
                self.cursor.advance(); // async
                return Some(self.lambda_from_paren_params(span, true));
            }
        }
        None
    }

    /// `delegate [(params)] { body }` — the pre-lambda anonymous method
    /// form; represented as a lambda with a block body.
    fn anonymous_method(&mut self, span: Span) -> Expr {
        self.cursor.advance(); // delegate
        let mut params = Vec::new();
        if self.cursor.eat(&TokenKind::LParen) && !self.cursor.eat(&TokenKind::RParen) {
            loop {
                params.push(self.lambda_param());
                if self.cursor.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(&TokenKind::RParen, "`)`");
                break;
            }
        }
        let body = LambdaBody::Block(Box::new(self.parse_block()));
        let end = self.cursor.previous_span();
        Expr::new(
            self.next_id(),
            ExprKind::Lambda {
                params,
                body,
                is_async: false,
            },
            span.merge(end),
        )
    }

    // === `new` ===

    fn new_expression(&mut self, span: Span) -> Expr {
        self.cursor.advance(); // new

        // anonymous object: `new { A = 1, b.C }`
        if self.cursor.at(&TokenKind::LBrace) {
            return self.anonymous_object(span);
        }
        // implicitly typed array: `new[] { 1, 2 }`
        if self.cursor.at(&TokenKind::LBracket) {
            self.cursor.advance();
            self.expect(&TokenKind::RBracket, "`]`");
            let initializer = self.initializer_list();
            let end = self.cursor.previous_span();
            return Expr::new(
                self.next_id(),
                ExprKind::NewArray {
                    element: None,
                    lengths: Vec::new(),
                    rank: 1,
                    initializer: Some(initializer),
                },
                span.merge(end),
            );
        }

        // the element type is parsed without array suffixes so the
        // brackets can carry creation lengths: `new int[n]`
        let ty = self.new_target_type();

        if self.cursor.at(&TokenKind::LBracket) {
            return self.array_creation(span, ty);
        }

        let args = if self.cursor.at(&TokenKind::LParen) {
            self.argument_list(TokenKind::LParen, TokenKind::RParen)
        } else {
            Vec::new()
        };
        let initializer = if self.cursor.at(&TokenKind::LBrace) {
            Some(self.initializer_list())
        } else {
            None
        };
        let end = self.cursor.previous_span();
        Expr::new(
            self.next_id(),
            ExprKind::New {
                ty,
                args,
                initializer,
            },
            span.merge(end),
        )
    }

    /// Type after `new`, stopping before `[` so array creation owns the
    /// brackets. `?` and `*` suffixes still apply (`new int?[3]`).
    fn new_target_type(&mut self) -> ParsedType {
        let start = self.cursor.current_span();
        let Some(mut ty) = self.try_parse(|p| {
            let span = p.cursor.current_span();
            if let Some(primitive) = primitive_name(p.cursor.current_kind()) {
                p.cursor.advance();
                return Some(ParsedType::new(ParsedTypeKind::Primitive(primitive), span));
            }
            let path = p.type_path()?;
            let end = p.cursor.previous_span();
            Some(ParsedType::new(
                ParsedTypeKind::Named(path),
                span.merge(end),
            ))
        }) else {
            self.error(
                csf_diagnostic::Diagnostic::error(csf_diagnostic::ErrorCode::E1104)
                    .with_message("expected type after `new`")
                    .with_label(start, "expected a type here"),
            );
            return ParsedType::error(start);
        };
        while self.cursor.at(&TokenKind::Question) || self.cursor.at(&TokenKind::Star) {
            let nullable = self.cursor.at(&TokenKind::Question);
            self.cursor.advance();
            let end = self.cursor.previous_span();
            let kind = if nullable {
                ParsedTypeKind::Nullable(Box::new(ty))
            } else {
                ParsedTypeKind::Pointer(Box::new(ty))
            };
            ty = ParsedType::new(kind, start.merge(end));
        }
        ty
    }

    fn array_creation(&mut self, span: Span, element: ParsedType) -> Expr {
        self.cursor.advance(); // [
        let mut lengths = Vec::new();
        let mut rank: u8 = 1;
        if !self.cursor.at(&TokenKind::RBracket) && !self.cursor.at(&TokenKind::Comma) {
            loop {
                lengths.push(self.parse_expr());
                if self.cursor.eat(&TokenKind::Comma) {
                    rank = rank.saturating_add(1);
                    continue;
                }
                break;
            }
        } else {
            // `new int[] { ... }` / `new int[,] { ... }`
            while self.cursor.eat(&TokenKind::Comma) {
                rank = rank.saturating_add(1);
            }
        }
        self.expect(&TokenKind::RBracket, "`]`");
        let initializer = if self.cursor.at(&TokenKind::LBrace) {
            Some(self.initializer_list())
        } else {
            None
        };
        let end = self.cursor.previous_span();
        Expr::new(
            self.next_id(),
            ExprKind::NewArray {
                element: Some(element),
                lengths,
                rank,
                initializer,
            },
            span.merge(end),
        )
    }

    /// `{ e1, e2, ... }` object/collection initializer; entries are
    /// plain expressions (`X = 1` arrives as an assignment).
    fn initializer_list(&mut self) -> Vec<Expr> {
        debug_assert!(self.cursor.at(&TokenKind::LBrace));
        self.cursor.advance();
        let mut entries = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            entries.push(self.parse_expr());
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}`");
        entries
    }

    fn anonymous_object(&mut self, span: Span) -> Expr {
        self.cursor.advance(); // {
        let mut members = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            // explicit member: `Name = value`
            let name = match (self.cursor.ident_name(), self.cursor.peek_kind()) {
                (Some(name), TokenKind::Eq) => {
                    self.cursor.advance();
                    self.cursor.advance();
                    Some(name)
                }
                _ => None,
            };
            let value = self.parse_expr();
            members.push(AnonymousMember { name, value });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}`");
        let end = self.cursor.previous_span();
        Expr::new(
            self.next_id(),
            ExprKind::AnonymousObject(members),
            span.merge(end),
        )
    }

    // === Query expressions ===

    /// Query expressions start with `from <ident> in` or
    /// `from <type> <ident> in`; anything else leaves `from` an
    /// ordinary identifier.
    fn try_query(&mut self, span: Span) -> Option<Expr> {
        let shaped = self.look_ahead(|p| {
            p.cursor.advance(); // from
            if p.cursor.ident_name().is_some()
                && matches!(p.cursor.peek_kind(), TokenKind::In)
            {
                return true;
            }
            // typed range variable
            p.type_opt().is_some()
                && p.cursor.ident_name().is_some()
                && matches!(p.cursor.peek_kind(), TokenKind::In)
        });
        if !shaped {
            return None;
        }
        self.cursor.advance(); // from
        let query = self.query_body();
        let end = self.cursor.previous_span();
        Some(Expr::new(
            self.next_id(),
            ExprKind::Query(Box::new(query)),
            span.merge(end),
        ))
    }

    /// Everything after `from` has been consumed by the caller.
    fn query_body(&mut self) -> QueryExpr {
        let (range_ty, range_var) = self.range_variable();
        self.expect(&TokenKind::In, "`in`");
        let source = self.parse_expr();
        self.query_rest(range_var, range_ty, source)
    }

    fn range_variable(&mut self) -> (Option<ParsedType>, Name) {
        // untyped when `ident in` follows directly
        if self.cursor.ident_name().is_some()
            && matches!(self.cursor.peek_kind(), TokenKind::In)
        {
            let name = self.cursor.ident_name().unwrap_or(Name::EMPTY);
            self.cursor.advance();
            return (None, name);
        }
        let ty = self.parse_type();
        let name = self.expect_ident("range variable").unwrap_or(Name::EMPTY);
        (Some(ty), name)
    }

    fn query_rest(
        &mut self,
        range_var: Name,
        range_ty: Option<ParsedType>,
        source: Expr,
    ) -> QueryExpr {
        let mut clauses = Vec::new();
        let terminal = loop {
            if self.cursor.at_contextual("from") {
                self.cursor.advance();
                let (ty, name) = self.range_variable();
                self.expect(&TokenKind::In, "`in`");
                let source = self.parse_expr();
                clauses.push(QueryClause::From { name, ty, source });
            } else if self.cursor.at_contextual("let") {
                self.cursor.advance();
                let name = self.expect_ident("let variable").unwrap_or(Name::EMPTY);
                self.expect(&TokenKind::Eq, "`=`");
                let value = self.parse_expr();
                clauses.push(QueryClause::Let { name, value });
            } else if self.cursor.at_contextual("where") {
                self.cursor.advance();
                clauses.push(QueryClause::Where(self.parse_expr()));
            } else if self.cursor.at_contextual("join") {
                self.cursor.advance();
                let name = self.expect_ident("join variable").unwrap_or(Name::EMPTY);
                self.expect(&TokenKind::In, "`in`");
                let source = self.parse_expr();
                self.expect_contextual("on");
                let left = self.parse_expr();
                self.expect_contextual("equals");
                let right = self.parse_expr();
                let into = if self.cursor.eat_contextual("into") {
                    self.expect_ident("group variable")
                } else {
                    None
                };
                clauses.push(QueryClause::Join {
                    name,
                    source,
                    left,
                    right,
                    into,
                });
            } else if self.cursor.at_contextual("orderby") {
                self.cursor.advance();
                let mut orderings = Vec::new();
                loop {
                    let key = self.parse_expr();
                    let direction = if self.cursor.eat_contextual("descending") {
                        OrderingDirection::Descending
                    } else {
                        self.cursor.eat_contextual("ascending");
                        OrderingDirection::Ascending
                    };
                    orderings.push((key, direction));
                    if !self.cursor.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                clauses.push(QueryClause::OrderBy(orderings));
            } else if self.cursor.at_contextual("select") {
                self.cursor.advance();
                break QueryFinal::Select(self.parse_expr());
            } else if self.cursor.at_contextual("group") {
                self.cursor.advance();
                let element = self.parse_expr();
                self.expect_contextual("by");
                let key = self.parse_expr();
                break QueryFinal::GroupBy { element, key };
            } else {
                let span = self.cursor.current_span();
                self.error(
                    csf_diagnostic::unexpected_token(
                        span,
                        "a query clause (`select`, `where`, ...)",
                        self.cursor.current_kind().describe(),
                    ),
                );
                break QueryFinal::Select(Expr::error(self.next_id(), span));
            }
        };

        // `into name <rest of query>` continuation
        let continuation = if self.cursor.eat_contextual("into") {
            let name = self
                .expect_ident("continuation variable")
                .unwrap_or(Name::EMPTY);
            let source = Expr::new(
                self.next_id(),
                ExprKind::Ident(name),
                self.cursor.previous_span(),
            );
            let inner = self.query_rest(name, None, source);
            Some((name, Box::new(inner)))
        } else {
            None
        };

        QueryExpr {
            range_var,
            range_ty,
            source: Box::new(source),
            clauses,
            terminal,
            continuation,
        }
    }
}

/// Whether a parsed type bottoms out in a builtin keyword, for the cast
/// heuristic.
fn primitive_rooted(ty: &ParsedType) -> bool {
    match &ty.kind {
        ParsedTypeKind::Primitive(_) => true,
        ParsedTypeKind::Nullable(inner)
        | ParsedTypeKind::Pointer(inner)
        | ParsedTypeKind::Array { element: inner, .. } => primitive_rooted(inner),
        _ => false,
    }
}

fn builtin_alias_text(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Bool => "bool",
        TokenKind::Byte => "byte",
        TokenKind::Sbyte => "sbyte",
        TokenKind::Short => "short",
        TokenKind::Ushort => "ushort",
        TokenKind::IntKw => "int",
        TokenKind::Uint => "uint",
        TokenKind::Long => "long",
        TokenKind::Ulong => "ulong",
        TokenKind::CharKw => "char",
        TokenKind::Float => "float",
        TokenKind::Double => "double",
        TokenKind::Decimal => "decimal",
        TokenKind::StringKw => "string",
        TokenKind::Object => "object",
        _ => "void",
    }
}

#[cfg(test)]
mod tests {
    use csf_ir::ast::{BinaryOp, ExprKind, UnaryOp};
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use crate::Parser;

    fn parse_expr(source: &str) -> ExprKind {
        let interner = StringInterner::new();
        let (tokens, diags) = csf_lexer::lex(source, &interner);
        assert!(diags.is_empty());
        let mut parser = Parser::new(&tokens, &interner);
        let expr = parser.parse_expr();
        assert!(
            parser.diagnostics.is_empty(),
            "unexpected diagnostics for {source:?}: {:?}",
            parser.diagnostics
        );
        expr.kind
    }

    fn binary_op(kind: &ExprKind) -> Option<BinaryOp> {
        match kind {
            ExprKind::Binary { op, .. } => Some(*op),
            _ => None,
        }
    }

    #[test]
    fn precedence_mul_over_add() {
        let ExprKind::Binary { op, rhs, .. } = parse_expr("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(binary_op(&rhs.kind), Some(BinaryOp::Mul));
    }

    #[test]
    fn coalesce_is_right_associative() {
        let ExprKind::Binary { op, rhs, .. } = parse_expr("a ?? b ?? c") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Coalesce);
        assert_eq!(binary_op(&rhs.kind), Some(BinaryOp::Coalesce));
    }

    #[test]
    fn shift_right_recombines_adjacent_gt() {
        assert_eq!(binary_op(&parse_expr("a >> 2")), Some(BinaryOp::Shr));
        // separated `> >` is a (nonsensical but syntactic) comparison chain
        let ExprKind::Binary { op, .. } = parse_expr("a > (b > c)") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Gt);
    }

    #[test]
    fn generic_call_vs_comparison() {
        // disambiguating follow token `(` makes this a generic call
        let ExprKind::Invocation { target, .. } = parse_expr("F<int>(1)") else {
            panic!("expected invocation");
        };
        assert!(matches!(target.kind, ExprKind::GenericName { .. }));

        // no `(` after `>`: stays a comparison chain
        let kind = parse_expr("(a < b) > c");
        assert_eq!(binary_op(&kind), Some(BinaryOp::Gt));
    }

    #[test]
    fn cast_vs_parenthesized() {
        assert!(matches!(parse_expr("(int)x"), ExprKind::Cast { .. }));
        assert!(matches!(parse_expr("(int)-x"), ExprKind::Cast { .. }));
        // named type followed by minus stays a subtraction
        let ExprKind::Binary { op, .. } = parse_expr("(a)-b") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Sub);
        // named type followed by an identifier is a cast
        assert!(matches!(parse_expr("(T)x"), ExprKind::Cast { .. }));
    }

    #[test]
    fn conditional_vs_nullable_after_is() {
        let ExprKind::Conditional { cond, .. } = parse_expr("x is T ? a : b") else {
            panic!("expected conditional");
        };
        assert!(matches!(cond.kind, ExprKind::Is { .. }));
    }

    #[test]
    fn null_conditional_chain() {
        let ExprKind::Member {
            null_conditional, ..
        } = parse_expr("a?.b")
        else {
            panic!("expected member access");
        };
        assert!(null_conditional);

        let ExprKind::Index {
            null_conditional, ..
        } = parse_expr("a?[0]")
        else {
            panic!("expected index");
        };
        assert!(null_conditional);
    }

    #[test]
    fn lambda_forms() {
        assert!(matches!(
            parse_expr("x => x + 1"),
            ExprKind::Lambda { is_async: false, .. }
        ));
        let ExprKind::Lambda { params, .. } = parse_expr("(int a, string b) => a") else {
            panic!("expected lambda");
        };
        assert_eq!(params.len(), 2);
        assert!(params[0].ty.is_some());
        assert!(matches!(
            parse_expr("async x => x"),
            ExprKind::Lambda { is_async: true, .. }
        ));
        assert!(matches!(
            parse_expr("delegate (int x) { return x; }"),
            ExprKind::Lambda { .. }
        ));
    }

    #[test]
    fn async_as_plain_identifier() {
        assert!(matches!(parse_expr("async + 1"), ExprKind::Binary { .. }));
    }

    #[test]
    fn await_is_contextual() {
        let ExprKind::Unary { op, .. } = parse_expr("await t") else {
            panic!("expected unary");
        };
        assert_eq!(op, UnaryOp::Await);
        // `await` alone is an identifier
        assert!(matches!(parse_expr("await"), ExprKind::Ident(_)));
    }

    #[test]
    fn new_forms() {
        assert!(matches!(parse_expr("new List<int>()"), ExprKind::New { .. }));
        let ExprKind::NewArray { lengths, rank, .. } = parse_expr("new int[5]") else {
            panic!("expected array creation");
        };
        assert_eq!(lengths.len(), 1);
        assert_eq!(rank, 1);
        let ExprKind::NewArray { element, .. } = parse_expr("new[] { 1, 2 }") else {
            panic!("expected array creation");
        };
        assert!(element.is_none());
        assert!(matches!(
            parse_expr("new { A = 1, b.C }"),
            ExprKind::AnonymousObject(_)
        ));
    }

    #[test]
    fn object_initializer() {
        let ExprKind::New { initializer, .. } = parse_expr("new P { X = 1, Y = 2 }") else {
            panic!("expected new");
        };
        assert_eq!(initializer.map(|i| i.len()), Some(2));
    }

    #[test]
    fn named_and_modified_arguments() {
        let ExprKind::Invocation { args, .. } = parse_expr("F(x: 1, ref y, out z)") else {
            panic!("expected invocation");
        };
        assert_eq!(args.len(), 3);
        assert!(args[0].name.is_some());
        assert_eq!(args[1].modifier, csf_ir::ast::ArgumentModifier::Ref);
        assert_eq!(args[2].modifier, csf_ir::ast::ArgumentModifier::Out);
    }

    #[test]
    fn query_expression() {
        let ExprKind::Query(query) = parse_expr("from x in xs where x > 0 select x * 2") else {
            panic!("expected query");
        };
        assert_eq!(query.clauses.len(), 1);
        assert!(matches!(
            query.terminal,
            csf_ir::ast::QueryFinal::Select(_)
        ));
    }

    #[test]
    fn query_with_join_and_continuation() {
        let source = "from a in xs join b in ys on a.K equals b.K into g \
                      select g into h orderby h select h";
        let ExprKind::Query(query) = parse_expr(source) else {
            panic!("expected query");
        };
        assert!(query.continuation.is_some());
    }

    #[test]
    fn from_as_ordinary_identifier() {
        // no `in` follows, so `from` is just a name
        assert!(matches!(parse_expr("from + 1"), ExprKind::Binary { .. }));
    }

    #[test]
    fn tuple_literal_with_names() {
        let ExprKind::Tuple(elements) = parse_expr("(1, b: 2)") else {
            panic!("expected tuple");
        };
        assert_eq!(elements.len(), 2);
        assert!(elements[1].name.is_some());
    }

    #[test]
    fn special_operator_expressions() {
        assert!(matches!(parse_expr("typeof(int)"), ExprKind::TypeOf(_)));
        assert!(matches!(parse_expr("default(string)"), ExprKind::Default(Some(_))));
        assert!(matches!(parse_expr("default"), ExprKind::Default(None)));
        assert!(matches!(
            parse_expr("checked(a + b)"),
            ExprKind::CheckedExpr { checked: true, .. }
        ));
        assert!(matches!(parse_expr("nameof(x.Y)"), ExprKind::NameOf(_)));
    }

    #[test]
    fn builtin_type_static_member() {
        let ExprKind::Invocation { target, .. } = parse_expr("int.Parse(s)") else {
            panic!("expected invocation");
        };
        assert!(matches!(target.kind, ExprKind::Member { .. }));
    }

    #[test]
    fn deeply_nested_expression_reports_limit() {
        let source = format!("{}x{}", "(".repeat(400), ")".repeat(400));
        let interner = StringInterner::new();
        let (tokens, _) = csf_lexer::lex(&source, &interner);
        let mut parser = Parser::new(&tokens, &interner);
        let _ = parser.parse_expr();
        assert!(parser
            .diagnostics
            .iter()
            .any(|d| d.code == csf_diagnostic::ErrorCode::E1106));
    }
}
