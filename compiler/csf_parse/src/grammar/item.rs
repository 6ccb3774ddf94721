//! Declaration grammar: compilation units, using directives, namespaces,
//! type declarations, and members.
//!
//! Member parsing is return-type rooted: after attributes and modifiers,
//! everything that is not keyword-shaped (`const`, `event`, `~`, nested
//! types, conversion operators, constructors) starts with a type, and the
//! tokens after the member name pick the form (`(` method, `{`/`=>`
//! property, `[` after `this` indexer, otherwise field). A failed member
//! becomes [`Member::Error`] and recovery skips to the next member start.

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{
    Attribute, BinaryOp, CompilationUnit, Constraint, ConstraintClause, EnumMember, FieldDecl,
    Item, Member, MethodDecl, MethodKind, Modifiers, NamespaceDecl, OperatorDecl, OperatorKind,
    ParsedType, ParsedTypeKind, PropertyAccessor, PropertyDecl, Stmt, StmtKind, TypeDecl,
    TypeDeclKind, TypeParam, TypePath, TypeSegment, UnaryOp, UsingDirective, Variance,
};
use csf_ir::{Name, Span, TokenKind};

use crate::context::ParseContext;
use crate::recovery::{at_item_boundary, at_member_boundary, synchronize};
use crate::Parser;

impl Parser<'_> {
    /// Entry point: one source file.
    pub(crate) fn compilation_unit(&mut self) -> CompilationUnit {
        let mut usings = Vec::new();
        let items = self.items_until_close(true, &mut usings);
        CompilationUnit {
            usings,
            items,
            node_count: self.node_count(),
        }
    }

    /// Items until `}` (or `Eof` at the top level). Using directives are
    /// legal only before the first item; the parser tolerates stragglers
    /// and lets them land in the same list.
    fn items_until_close(
        &mut self,
        top_level: bool,
        usings: &mut Vec<UsingDirective>,
    ) -> Vec<Item> {
        let mut items = Vec::new();
        loop {
            if self.cursor.is_at_end() {
                break;
            }
            if !top_level && self.cursor.at(&TokenKind::RBrace) {
                break;
            }
            if top_level && self.cursor.at(&TokenKind::RBrace) {
                let span = self.cursor.current_span();
                self.error(csf_diagnostic::unexpected_token(
                    span,
                    "a declaration",
                    "`}`",
                ));
                self.cursor.advance();
                continue;
            }
            if self.cursor.at(&TokenKind::Using)
                && !matches!(self.cursor.peek_kind(), TokenKind::LParen)
            {
                usings.push(self.using_directive());
                continue;
            }
            let before = self.cursor.position();
            items.push(self.item());
            if self.cursor.position() == before {
                self.cursor.advance();
            }
        }
        items
    }

    /// `using System;` / `using IO = System.IO;` / `using static System.Math;`
    fn using_directive(&mut self) -> UsingDirective {
        let start = self.cursor.current_span();
        self.cursor.advance(); // using
        let is_static = self.cursor.eat(&TokenKind::Static);
        let alias = if !is_static
            && self.cursor.ident_name().is_some()
            && matches!(self.cursor.peek_kind(), TokenKind::Eq)
        {
            let name = self.cursor.ident_name();
            self.cursor.advance();
            self.cursor.advance(); // =
            name
        } else {
            None
        };
        let path = self.dotted_name();
        self.expect(&TokenKind::Semicolon, "`;`");
        let end = self.cursor.previous_span();
        UsingDirective {
            alias,
            is_static,
            path,
            span: start.merge(end),
        }
    }

    fn dotted_name(&mut self) -> Vec<Name> {
        let mut path = Vec::new();
        loop {
            match self.expect_ident("name") {
                Some(name) => path.push(name),
                None => break,
            }
            if !self.cursor.eat(&TokenKind::Dot) {
                break;
            }
        }
        path
    }

    fn item(&mut self) -> Item {
        let span = self.cursor.current_span();
        if self.cursor.at(&TokenKind::Namespace) {
            return Item::Namespace(self.namespace_decl());
        }
        let attributes = self.attribute_list();
        let modifiers = self.modifiers();
        match self.cursor.current_kind() {
            TokenKind::Class
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::Enum
            | TokenKind::Delegate => Item::Type(self.type_declaration(attributes, modifiers)),
            found => {
                let here = self.cursor.current_span();
                self.error(csf_diagnostic::unexpected_token(
                    here,
                    "a namespace or type declaration",
                    found.describe(),
                ));
                synchronize(&mut self.cursor, at_item_boundary);
                Item::Error(span.merge(self.cursor.previous_span()))
            }
        }
    }

    fn namespace_decl(&mut self) -> NamespaceDecl {
        let start = self.cursor.current_span();
        self.cursor.advance(); // namespace
        let path = self.dotted_name();
        self.expect(&TokenKind::LBrace, "`{`");
        let mut usings = Vec::new();
        let items = self.items_until_close(false, &mut usings);
        self.expect(&TokenKind::RBrace, "`}`");
        self.cursor.eat(&TokenKind::Semicolon);
        let end = self.cursor.previous_span();
        NamespaceDecl {
            path,
            usings,
            items,
            span: start.merge(end),
        }
    }

    // === Attributes and modifiers ===

    /// Zero or more `[Attr, Attr(args)]` groups. Target specifiers
    /// (`[return: ...]`) are consumed and ignored.
    pub(crate) fn attribute_list(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        while self.cursor.at(&TokenKind::LBracket) {
            self.cursor.advance();
            if matches!(self.cursor.peek_kind(), TokenKind::Colon)
                && matches!(
                    self.cursor.current_kind(),
                    TokenKind::Ident(_) | TokenKind::Return | TokenKind::Event
                )
            {
                self.cursor.advance();
                self.cursor.advance();
            }
            loop {
                let start = self.cursor.current_span();
                let Some(path) = self.type_path() else {
                    self.error(
                        Diagnostic::error(ErrorCode::E1103)
                            .with_message("expected an attribute name")
                            .with_label(start, "expected an attribute name here"),
                    );
                    synchronize(&mut self.cursor, |c| {
                        matches!(c.current_kind(), TokenKind::RBracket | TokenKind::Eof)
                    });
                    break;
                };
                let args = if self.cursor.at(&TokenKind::LParen) {
                    self.argument_list(TokenKind::LParen, TokenKind::RParen)
                } else {
                    Vec::new()
                };
                let end = self.cursor.previous_span();
                attributes.push(Attribute {
                    name: path,
                    args,
                    span: start.merge(end),
                });
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBracket, "`]`");
        }
        attributes
    }

    /// Modifier run, including the contextual `partial` and `async`.
    pub(crate) fn modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        loop {
            let flag = match self.cursor.current_kind() {
                TokenKind::Public => Modifiers::PUBLIC,
                TokenKind::Private => Modifiers::PRIVATE,
                TokenKind::Protected => Modifiers::PROTECTED,
                TokenKind::Internal => Modifiers::INTERNAL,
                TokenKind::Static => Modifiers::STATIC,
                TokenKind::Abstract => Modifiers::ABSTRACT,
                TokenKind::Sealed => Modifiers::SEALED,
                TokenKind::Virtual => Modifiers::VIRTUAL,
                TokenKind::Override => Modifiers::OVERRIDE,
                TokenKind::Readonly => Modifiers::READONLY,
                TokenKind::Extern => Modifiers::EXTERN,
                TokenKind::Unsafe => Modifiers::UNSAFE,
                TokenKind::Volatile => Modifiers::VOLATILE,
                TokenKind::New => Modifiers::NEW,
                TokenKind::Ident(_)
                    if self.cursor.at_contextual("partial")
                        && matches!(
                            self.cursor.peek_kind(),
                            TokenKind::Class
                                | TokenKind::Struct
                                | TokenKind::Interface
                                | TokenKind::Void
                        ) =>
                {
                    Modifiers::PARTIAL
                }
                TokenKind::Ident(_)
                    if self.cursor.at_contextual("async")
                        && (self.cursor.peek_kind().is_builtin_type_keyword()
                            || matches!(self.cursor.peek_kind(), TokenKind::Ident(_))) =>
                {
                    Modifiers::ASYNC
                }
                _ => return modifiers,
            };
            self.cursor.advance();
            modifiers |= flag;
        }
    }

    // === Type declarations ===

    fn type_declaration(&mut self, attributes: Vec<Attribute>, modifiers: Modifiers) -> TypeDecl {
        let start = self.cursor.current_span();
        let id = self.next_id();
        let kind = match self.cursor.current_kind() {
            TokenKind::Class => TypeDeclKind::Class,
            TokenKind::Struct => TypeDeclKind::Struct,
            TokenKind::Interface => TypeDeclKind::Interface,
            TokenKind::Enum => TypeDeclKind::Enum,
            _ => TypeDeclKind::Delegate,
        };
        self.cursor.advance();

        if kind == TypeDeclKind::Delegate {
            let delegate_return = self.parse_type();
            let name = self.expect_ident("delegate name").unwrap_or(Name::EMPTY);
            let type_params = if self.cursor.at(&TokenKind::Lt) {
                self.type_parameter_list()
            } else {
                Vec::new()
            };
            let delegate_params = self.parameter_list();
            let constraints = self.constraint_clauses();
            self.expect(&TokenKind::Semicolon, "`;`");
            let end = self.cursor.previous_span();
            return TypeDecl {
                id,
                kind,
                name,
                modifiers,
                attributes,
                type_params,
                constraints,
                bases: Vec::new(),
                members: Vec::new(),
                enum_members: Vec::new(),
                delegate_params,
                delegate_return: Some(delegate_return),
                span: start.merge(end),
            };
        }

        let name = self.expect_ident("type name").unwrap_or(Name::EMPTY);
        let type_params = if kind != TypeDeclKind::Enum && self.cursor.at(&TokenKind::Lt) {
            self.type_parameter_list()
        } else {
            Vec::new()
        };
        let mut bases = Vec::new();
        if self.cursor.eat(&TokenKind::Colon) {
            loop {
                bases.push(self.parse_type());
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let constraints = self.constraint_clauses();

        self.expect(&TokenKind::LBrace, "`{`");
        let mut members = Vec::new();
        let mut enum_members = Vec::new();
        if kind == TypeDeclKind::Enum {
            enum_members = self.enum_member_list();
        } else {
            while !self.cursor.at(&TokenKind::RBrace) && !self.cursor.is_at_end() {
                let before = self.cursor.position();
                members.push(self.member(name));
                if self.cursor.position() == before {
                    self.cursor.advance();
                }
            }
        }
        self.expect(&TokenKind::RBrace, "`}`");
        self.cursor.eat(&TokenKind::Semicolon);
        let end = self.cursor.previous_span();
        TypeDecl {
            id,
            kind,
            name,
            modifiers,
            attributes,
            type_params,
            constraints,
            bases,
            members,
            enum_members,
            delegate_params: Vec::new(),
            delegate_return: None,
            span: start.merge(end),
        }
    }

    /// `<in T, out U>` — declaration form, with variance.
    fn type_parameter_list(&mut self) -> Vec<TypeParam> {
        if let Some(params) = self.try_parse(|p| p.type_parameter_list_opt()) {
            return params;
        }
        let span = self.cursor.current_span();
        self.error(
            Diagnostic::error(ErrorCode::E1103)
                .with_message("malformed type parameter list")
                .with_label(span, "expected `<T, ...>` here"),
        );
        // skip to the closing `>` or the next structural token
        while !matches!(
            self.cursor.current_kind(),
            TokenKind::LParen
                | TokenKind::LBrace
                | TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::Eof
        ) {
            let done = self.cursor.at(&TokenKind::Gt);
            self.cursor.advance();
            if done {
                break;
            }
        }
        Vec::new()
    }

    /// Quiet form for speculative headers. Returns `None` without
    /// consuming a coherent list.
    pub(crate) fn type_parameter_list_opt(&mut self) -> Option<Vec<TypeParam>> {
        if !self.cursor.at(&TokenKind::Lt) {
            return None;
        }
        self.cursor.advance();
        let mut params = Vec::new();
        loop {
            let start = self.cursor.current_span();
            let variance = if self.cursor.eat(&TokenKind::In) {
                Some(Variance::In)
            } else if self.cursor.eat(&TokenKind::Out) {
                Some(Variance::Out)
            } else {
                None
            };
            let name = self.cursor.ident_name()?;
            self.cursor.advance();
            let end = self.cursor.previous_span();
            params.push(TypeParam {
                name,
                variance,
                span: start.merge(end),
            });
            if self.cursor.eat(&TokenKind::Comma) {
                continue;
            }
            if self.cursor.eat(&TokenKind::Gt) {
                return Some(params);
            }
            return None;
        }
    }

    /// `where T : class, IComparable<T>, new()` clauses.
    pub(crate) fn constraint_clauses(&mut self) -> Vec<ConstraintClause> {
        let mut clauses = Vec::new();
        while self.cursor.at_contextual("where") {
            let start = self.cursor.current_span();
            self.cursor.advance();
            let param = self
                .expect_ident("constrained type parameter")
                .unwrap_or(Name::EMPTY);
            self.expect(&TokenKind::Colon, "`:`");
            let mut constraints = Vec::new();
            loop {
                let constraint = match self.cursor.current_kind() {
                    TokenKind::Class => {
                        self.cursor.advance();
                        Constraint::ReferenceType
                    }
                    TokenKind::Struct => {
                        self.cursor.advance();
                        Constraint::ValueType
                    }
                    TokenKind::New => {
                        self.cursor.advance();
                        self.expect(&TokenKind::LParen, "`(`");
                        self.expect(&TokenKind::RParen, "`)`");
                        Constraint::DefaultConstructor
                    }
                    _ => Constraint::Type(self.parse_type()),
                };
                constraints.push(constraint);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
            let end = self.cursor.previous_span();
            clauses.push(ConstraintClause {
                param,
                constraints,
                span: start.merge(end),
            });
        }
        clauses
    }

    fn enum_member_list(&mut self) -> Vec<EnumMember> {
        let mut members = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            let start = self.cursor.current_span();
            let Some(name) = self.expect_ident("enum member name") else {
                synchronize(&mut self.cursor, |c| {
                    matches!(
                        c.current_kind(),
                        TokenKind::Comma | TokenKind::RBrace | TokenKind::Eof
                    )
                });
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
                continue;
            };
            let value = if self.cursor.eat(&TokenKind::Eq) {
                Some(self.parse_expr())
            } else {
                None
            };
            let end = self.cursor.previous_span();
            members.push(EnumMember {
                name,
                value,
                span: start.merge(end),
            });
            // trailing comma before `}` is fine
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        members
    }

    // === Members ===

    fn member(&mut self, type_name: Name) -> Member {
        let span = self.cursor.current_span();
        let attributes = self.attribute_list();
        let modifiers = self.modifiers();
        let saved = self.context;
        if modifiers.contains(Modifiers::UNSAFE) {
            self.context |= ParseContext::IN_UNSAFE;
        }
        let member = self.member_inner(type_name, span, attributes, modifiers);
        self.context = saved;
        member
    }

    fn member_inner(
        &mut self,
        type_name: Name,
        span: Span,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Member {
        match self.cursor.current_kind() {
            TokenKind::Class
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::Enum
            | TokenKind::Delegate => {
                Member::NestedType(self.type_declaration(attributes, modifiers))
            }
            TokenKind::Const => {
                self.cursor.advance();
                self.field_member(span, attributes, modifiers, true, false)
            }
            TokenKind::Event => {
                self.cursor.advance();
                self.field_member(span, attributes, modifiers, false, true)
            }
            TokenKind::Implicit | TokenKind::Explicit => {
                self.conversion_operator(span, attributes, modifiers)
            }
            TokenKind::Tilde => self.destructor(span, attributes, modifiers),
            TokenKind::Ident(name)
                if *name == type_name && matches!(self.cursor.peek_kind(), TokenKind::LParen) =>
            {
                self.constructor(span, attributes, modifiers, type_name)
            }
            _ => self.typed_member(span, attributes, modifiers),
        }
    }

    /// `const T a = 1, b = 2;` / `event EventHandler Changed;`
    fn field_member(
        &mut self,
        span: Span,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
        is_const: bool,
        is_event: bool,
    ) -> Member {
        let id = self.next_id();
        let ty = self.parse_type();
        let declarators = self.declarator_list();
        self.expect(&TokenKind::Semicolon, "`;`");
        let end = self.cursor.previous_span();
        let decl = FieldDecl {
            id,
            modifiers,
            attributes,
            is_const,
            ty,
            declarators,
            span: span.merge(end),
        };
        if is_event {
            Member::Event(decl)
        } else {
            Member::Field(decl)
        }
    }

    fn constructor(
        &mut self,
        span: Span,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
        name: Name,
    ) -> Member {
        let id = self.next_id();
        self.cursor.advance(); // the type name
        let params = self.parameter_list();
        let kind = if modifiers.contains(Modifiers::STATIC) {
            MethodKind::StaticConstructor
        } else {
            MethodKind::Constructor
        };
        let body = self.method_body();
        let end = self.cursor.previous_span();
        Member::Method(MethodDecl {
            id,
            kind,
            name,
            modifiers,
            attributes,
            type_params: Vec::new(),
            constraints: Vec::new(),
            params,
            return_type: None,
            explicit_interface: None,
            body,
            span: span.merge(end),
        })
    }

    fn destructor(
        &mut self,
        span: Span,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Member {
        let id = self.next_id();
        self.cursor.advance(); // ~
        let name = self.expect_ident("destructor name").unwrap_or(Name::EMPTY);
        self.expect(&TokenKind::LParen, "`(`");
        self.expect(&TokenKind::RParen, "`)`");
        let body = self.method_body();
        let end = self.cursor.previous_span();
        Member::Method(MethodDecl {
            id,
            kind: MethodKind::Destructor,
            name,
            modifiers,
            attributes,
            type_params: Vec::new(),
            constraints: Vec::new(),
            params: Vec::new(),
            return_type: None,
            explicit_interface: None,
            body,
            span: span.merge(end),
        })
    }

    /// `implicit operator T(S value) { ... }` and the `explicit` twin.
    fn conversion_operator(
        &mut self,
        span: Span,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Member {
        let id = self.next_id();
        let implicit = self.cursor.at(&TokenKind::Implicit);
        self.cursor.advance();
        self.expect(&TokenKind::Operator, "`operator`");
        let return_type = self.parse_type();
        let params = self.parameter_list();
        let body = self.method_body();
        let end = self.cursor.previous_span();
        Member::Operator(OperatorDecl {
            id,
            op: OperatorKind::Conversion { implicit },
            modifiers,
            attributes,
            params,
            return_type,
            body,
            span: span.merge(end),
        })
    }

    /// Members rooted at a return/field type: methods, properties,
    /// indexers, fields, and operator declarations.
    fn typed_member(
        &mut self,
        span: Span,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Member {
        let ty = self.parse_type();
        if self.cursor.eat(&TokenKind::Operator) {
            return self.operator_member(span, attributes, modifiers, ty);
        }

        let (explicit_interface, name, type_params, is_indexer) = self.member_name();

        if is_indexer {
            let id = self.next_id();
            self.expect(&TokenKind::LBracket, "`[`");
            let index_params = self.parameters_until(&TokenKind::RBracket);
            self.expect(&TokenKind::RBracket, "`]`");
            let (accessors, expr_body) = self.property_body();
            let end = self.cursor.previous_span();
            return Member::Property(PropertyDecl {
                id,
                name,
                modifiers,
                attributes,
                ty,
                explicit_interface,
                index_params,
                accessors,
                expr_body,
                span: span.merge(end),
            });
        }

        match self.cursor.current_kind() {
            TokenKind::LParen => {
                let id = self.next_id();
                let params = self.parameter_list();
                let constraints = self.constraint_clauses();
                let body = self.method_body();
                let end = self.cursor.previous_span();
                Member::Method(MethodDecl {
                    id,
                    kind: MethodKind::Method,
                    name,
                    modifiers,
                    attributes,
                    type_params,
                    constraints,
                    params,
                    return_type: Some(ty),
                    explicit_interface,
                    body,
                    span: span.merge(end),
                })
            }
            TokenKind::LBrace | TokenKind::FatArrow => {
                let id = self.next_id();
                let (accessors, expr_body) = self.property_body();
                let end = self.cursor.previous_span();
                Member::Property(PropertyDecl {
                    id,
                    name,
                    modifiers,
                    attributes,
                    ty,
                    explicit_interface,
                    index_params: Vec::new(),
                    accessors,
                    expr_body,
                    span: span.merge(end),
                })
            }
            _ if explicit_interface.is_none() && type_params.is_empty() && name != Name::EMPTY => {
                let id = self.next_id();
                let mut declarators = Vec::new();
                let init = if self.cursor.eat(&TokenKind::Eq) {
                    Some(self.parse_expr())
                } else {
                    None
                };
                declarators.push((name, init));
                while self.cursor.eat(&TokenKind::Comma) {
                    let name = self.expect_ident("field name").unwrap_or(Name::EMPTY);
                    let init = if self.cursor.eat(&TokenKind::Eq) {
                        Some(self.parse_expr())
                    } else {
                        None
                    };
                    declarators.push((name, init));
                }
                self.expect(&TokenKind::Semicolon, "`;`");
                let end = self.cursor.previous_span();
                Member::Field(FieldDecl {
                    id,
                    modifiers,
                    attributes,
                    is_const: false,
                    ty,
                    declarators,
                    span: span.merge(end),
                })
            }
            found => {
                let here = self.cursor.current_span();
                self.error(csf_diagnostic::unexpected_token(
                    here,
                    "a member body, `(`, or `;`",
                    found.describe(),
                ));
                synchronize(&mut self.cursor, at_member_boundary);
                Member::Error(span.merge(self.cursor.previous_span()))
            }
        }
    }

    /// Member name, possibly prefixed by an explicit interface
    /// (`void IFoo<T>.M()`), possibly generic (`void M<T>()`), possibly
    /// the `this` of an indexer. A `<...>` followed by `.` belongs to
    /// the interface path; otherwise it declares method type parameters.
    fn member_name(&mut self) -> (Option<ParsedType>, Name, Vec<TypeParam>, bool) {
        let start = self.cursor.current_span();
        let mut segments: Vec<TypeSegment> = Vec::new();
        loop {
            if self.cursor.eat(&TokenKind::This) {
                let name = self.cursor.interner().intern("this");
                return (interface_from(segments, start), name, Vec::new(), true);
            }
            let seg_span = self.cursor.current_span();
            let Some(name) = self.expect_ident("member name") else {
                return (interface_from(segments, start), Name::EMPTY, Vec::new(), false);
            };
            if self.cursor.at(&TokenKind::Lt) {
                let interface_args = self.try_parse(|p| {
                    let args = p.type_argument_list()?;
                    if p.cursor.at(&TokenKind::Dot) {
                        Some(args)
                    } else {
                        None
                    }
                });
                if let Some(type_args) = interface_args {
                    self.cursor.advance(); // .
                    let end = self.cursor.previous_span();
                    segments.push(TypeSegment {
                        name,
                        type_args,
                        span: seg_span.merge(end),
                    });
                    continue;
                }
                let type_params = self.type_parameter_list();
                return (interface_from(segments, start), name, type_params, false);
            }
            if self.cursor.eat(&TokenKind::Dot) {
                segments.push(TypeSegment {
                    name,
                    type_args: Vec::new(),
                    span: seg_span,
                });
                continue;
            }
            return (interface_from(segments, start), name, Vec::new(), false);
        }
    }

    /// Accessor block or `=> expr;` body shared by properties and
    /// indexers.
    fn property_body(&mut self) -> (Vec<PropertyAccessor>, Option<csf_ir::ast::Expr>) {
        if self.cursor.eat(&TokenKind::FatArrow) {
            let expr = self.parse_expr();
            self.expect(&TokenKind::Semicolon, "`;`");
            return (Vec::new(), Some(expr));
        }
        (self.accessor_list(), None)
    }

    fn accessor_list(&mut self) -> Vec<PropertyAccessor> {
        let mut accessors = Vec::new();
        self.expect(&TokenKind::LBrace, "`{`");
        while !self.cursor.at(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            let start = self.cursor.current_span();
            let modifiers = self.modifiers();
            let is_set = if self.cursor.eat_contextual("get") {
                false
            } else if self.cursor.eat_contextual("set") {
                true
            } else {
                let found = self.cursor.current_kind().describe();
                self.error(csf_diagnostic::unexpected_token(
                    start,
                    "`get` or `set`",
                    found,
                ));
                synchronize(&mut self.cursor, |c| {
                    matches!(c.current_kind(), TokenKind::RBrace | TokenKind::Eof)
                });
                break;
            };
            let body = if self.cursor.eat(&TokenKind::Semicolon) {
                None
            } else if self.cursor.at(&TokenKind::LBrace) {
                Some(self.parse_block())
            } else if self.cursor.eat(&TokenKind::FatArrow) {
                let expr = self.parse_expr();
                self.expect(&TokenKind::Semicolon, "`;`");
                let expr_span = expr.span;
                let id = self.next_id();
                let kind = if is_set {
                    StmtKind::Expr(expr)
                } else {
                    StmtKind::Return(Some(expr))
                };
                Some(Stmt::new(id, kind, expr_span))
            } else {
                let here = self.cursor.current_span();
                let found = self.cursor.current_kind().describe();
                self.error(csf_diagnostic::unexpected_token(
                    here,
                    "`;`, `{`, or `=>`",
                    found,
                ));
                synchronize(&mut self.cursor, |c| {
                    matches!(c.current_kind(), TokenKind::RBrace | TokenKind::Eof)
                });
                None
            };
            let end = self.cursor.previous_span();
            accessors.push(PropertyAccessor {
                is_set,
                modifiers,
                body,
                span: start.merge(end),
            });
        }
        self.expect(&TokenKind::RBrace, "`}`");
        accessors
    }

    /// `{ ... }`, `=> expr;`, or `;` (abstract/extern/interface member).
    fn method_body(&mut self) -> Option<Stmt> {
        if self.cursor.at(&TokenKind::LBrace) {
            return Some(self.parse_block());
        }
        if self.cursor.eat(&TokenKind::FatArrow) {
            let expr = self.parse_expr();
            self.expect(&TokenKind::Semicolon, "`;`");
            let expr_span = expr.span;
            let id = self.next_id();
            return Some(Stmt::new(id, StmtKind::Return(Some(expr)), expr_span));
        }
        if self.cursor.eat(&TokenKind::Semicolon) {
            return None;
        }
        let span = self.cursor.current_span();
        let found = self.cursor.current_kind().describe();
        self.error(csf_diagnostic::unexpected_token(
            span,
            "`{`, `=>`, or `;`",
            found,
        ));
        synchronize(&mut self.cursor, at_member_boundary);
        None
    }

    /// `public static T operator +(T a, T b) { ... }` and friends.
    /// `+`, `-`, `&`, `*` can be unary or binary; arity decides.
    fn operator_member(
        &mut self,
        span: Span,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
        return_type: ParsedType,
    ) -> Member {
        let id = self.next_id();
        let token_kind = self.cursor.current_kind().clone();
        let op = match token_kind {
            TokenKind::True => Some(OperatorKind::True),
            TokenKind::False => Some(OperatorKind::False),
            TokenKind::Bang => Some(OperatorKind::Unary(UnaryOp::Not)),
            TokenKind::Tilde => Some(OperatorKind::Unary(UnaryOp::BitNot)),
            TokenKind::PlusPlus => Some(OperatorKind::Unary(UnaryOp::PreInc)),
            TokenKind::MinusMinus => Some(OperatorKind::Unary(UnaryOp::PreDec)),
            TokenKind::Star => Some(OperatorKind::Binary(BinaryOp::Mul)),
            TokenKind::Slash => Some(OperatorKind::Binary(BinaryOp::Div)),
            TokenKind::Percent => Some(OperatorKind::Binary(BinaryOp::Rem)),
            TokenKind::Amp => Some(OperatorKind::Binary(BinaryOp::BitAnd)),
            TokenKind::Pipe => Some(OperatorKind::Binary(BinaryOp::BitOr)),
            TokenKind::Caret => Some(OperatorKind::Binary(BinaryOp::BitXor)),
            TokenKind::Shl => Some(OperatorKind::Binary(BinaryOp::Shl)),
            TokenKind::EqEq => Some(OperatorKind::Binary(BinaryOp::Eq)),
            TokenKind::NotEq => Some(OperatorKind::Binary(BinaryOp::NotEq)),
            TokenKind::Lt => Some(OperatorKind::Binary(BinaryOp::Lt)),
            TokenKind::LtEq => Some(OperatorKind::Binary(BinaryOp::LtEq)),
            TokenKind::GtEq => Some(OperatorKind::Binary(BinaryOp::GtEq)),
            TokenKind::Gt if self.cursor.is_shift_right() => {
                self.cursor.advance(); // extra > of >>
                Some(OperatorKind::Binary(BinaryOp::Shr))
            }
            TokenKind::Gt => Some(OperatorKind::Binary(BinaryOp::Gt)),
            // arity resolves these after the parameter list
            TokenKind::Plus => Some(OperatorKind::Binary(BinaryOp::Add)),
            TokenKind::Minus => Some(OperatorKind::Binary(BinaryOp::Sub)),
            _ => None,
        };
        let Some(mut op) = op else {
            let here = self.cursor.current_span();
            self.error(csf_diagnostic::unexpected_token(
                here,
                "an overloadable operator",
                token_kind.describe(),
            ));
            synchronize(&mut self.cursor, at_member_boundary);
            return Member::Error(span.merge(self.cursor.previous_span()));
        };
        self.cursor.advance();
        let params = self.parameter_list();
        if params.len() == 1 {
            if matches!(token_kind, TokenKind::Plus) {
                op = OperatorKind::Unary(UnaryOp::Plus);
            } else if matches!(token_kind, TokenKind::Minus) {
                op = OperatorKind::Unary(UnaryOp::Minus);
            }
        }
        let body = self.method_body();
        let end = self.cursor.previous_span();
        Member::Operator(OperatorDecl {
            id,
            op,
            modifiers,
            attributes,
            params,
            return_type,
            body,
            span: span.merge(end),
        })
    }

    // === Parameters ===

    /// `(ref int a, params string[] rest)` including the `)`.
    pub(crate) fn parameter_list(&mut self) -> Vec<csf_ir::ast::Param> {
        self.expect(&TokenKind::LParen, "`(`");
        let params = self.parameters_until(&TokenKind::RParen);
        self.expect(&TokenKind::RParen, "`)`");
        params
    }

    fn parameters_until(&mut self, close: &TokenKind) -> Vec<csf_ir::ast::Param> {
        use csf_ir::ast::{Param, ParamModifier};
        let mut params = Vec::new();
        if self.cursor.at(close) {
            return params;
        }
        loop {
            let start = self.cursor.current_span();
            let modifier = match self.cursor.current_kind() {
                TokenKind::Ref => {
                    self.cursor.advance();
                    ParamModifier::Ref
                }
                TokenKind::Out => {
                    self.cursor.advance();
                    ParamModifier::Out
                }
                TokenKind::Params => {
                    self.cursor.advance();
                    ParamModifier::Params
                }
                TokenKind::This => {
                    self.cursor.advance();
                    ParamModifier::This
                }
                _ => ParamModifier::None,
            };
            let ty = self.parse_type();
            let name = self.expect_ident("parameter name").unwrap_or(Name::EMPTY);
            let default = if self.cursor.eat(&TokenKind::Eq) {
                Some(self.parse_expr())
            } else {
                None
            };
            let end = self.cursor.previous_span();
            params.push(Param {
                name,
                ty,
                modifier,
                default,
                span: start.merge(end),
            });
            if !self.cursor.eat(&TokenKind::Comma) {
                return params;
            }
        }
    }
}

fn interface_from(segments: Vec<TypeSegment>, start: Span) -> Option<ParsedType> {
    if segments.is_empty() {
        return None;
    }
    let end = segments.last().map(|s| s.span).unwrap_or(start);
    Some(ParsedType::new(
        ParsedTypeKind::Named(TypePath { segments }),
        start.merge(end),
    ))
}

#[cfg(test)]
mod tests {
    use csf_ir::ast::{
        Constraint, Item, Member, MethodKind, Modifiers, OperatorKind, ParamModifier, StmtKind,
        TypeDeclKind, UnaryOp, Variance,
    };
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use crate::{parse_source, ParseResult};

    fn parse_clean(source: &str) -> ParseResult {
        let interner = StringInterner::new();
        let result = parse_source(source, &interner);
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics for {source:?}: {:?}",
            result.diagnostics
        );
        result
    }

    fn only_type(result: &ParseResult) -> &csf_ir::ast::TypeDecl {
        match &result.unit.items[0] {
            Item::Type(decl) => decl,
            other => panic!("expected a type declaration, got {other:?}"),
        }
    }

    #[test]
    fn usings_and_namespace() {
        let result = parse_clean(
            "using System;\nusing IO = System.IO;\nusing static System.Math;\nnamespace A.B { class C { } }",
        );
        assert_eq!(result.unit.usings.len(), 3);
        assert!(result.unit.usings[1].alias.is_some());
        assert!(result.unit.usings[2].is_static);
        let Item::Namespace(ns) = &result.unit.items[0] else {
            panic!("expected namespace");
        };
        assert_eq!(ns.path.len(), 2);
        assert_eq!(ns.items.len(), 1);
    }

    #[test]
    fn class_with_members() {
        let result = parse_clean(
            r#"
            public class Point {
                private int x;
                public int X { get { return x; } set { x = value1; } }
                public int Y => 42;
                public Point(int x) { }
                public void Deconstruct(out int a) { a = x; }
                ~Point() { }
            }
            "#,
        );
        let decl = only_type(&result);
        assert_eq!(decl.kind, TypeDeclKind::Class);
        assert!(decl.modifiers.contains(Modifiers::PUBLIC));
        assert_eq!(decl.members.len(), 6);
        assert!(matches!(decl.members[0], Member::Field(_)));
        assert!(matches!(decl.members[1], Member::Property(_)));
        let Member::Property(y) = &decl.members[2] else {
            panic!("expected property");
        };
        assert!(y.expr_body.is_some());
        let Member::Method(ctor) = &decl.members[3] else {
            panic!("expected constructor");
        };
        assert_eq!(ctor.kind, MethodKind::Constructor);
        let Member::Method(m) = &decl.members[4] else {
            panic!("expected method");
        };
        assert_eq!(m.params[0].modifier, ParamModifier::Out);
        let Member::Method(dtor) = &decl.members[5] else {
            panic!("expected destructor");
        };
        assert_eq!(dtor.kind, MethodKind::Destructor);
    }

    #[test]
    fn generic_type_with_constraints() {
        let result = parse_clean(
            "class Cache<TKey, TValue> where TKey : IComparable<TKey>, new() where TValue : class { }",
        );
        let decl = only_type(&result);
        assert_eq!(decl.type_params.len(), 2);
        assert_eq!(decl.constraints.len(), 2);
        assert!(matches!(
            decl.constraints[0].constraints[..],
            [Constraint::Type(_), Constraint::DefaultConstructor]
        ));
        assert!(matches!(
            decl.constraints[1].constraints[..],
            [Constraint::ReferenceType]
        ));
    }

    #[test]
    fn interface_with_variance() {
        let result = parse_clean("interface IMap<in TKey, out TValue> { TValue Get(TKey key); }");
        let decl = only_type(&result);
        assert_eq!(decl.type_params[0].variance, Some(Variance::In));
        assert_eq!(decl.type_params[1].variance, Some(Variance::Out));
        let Member::Method(m) = &decl.members[0] else {
            panic!("expected method");
        };
        assert!(m.body.is_none());
    }

    #[test]
    fn enum_with_values_and_base() {
        let result = parse_clean("enum Color : byte { Red = 1, Green, Blue, }");
        let decl = only_type(&result);
        assert_eq!(decl.kind, TypeDeclKind::Enum);
        assert_eq!(decl.bases.len(), 1);
        assert_eq!(decl.enum_members.len(), 3);
        assert!(decl.enum_members[0].value.is_some());
        assert!(decl.enum_members[1].value.is_none());
    }

    #[test]
    fn delegate_declaration() {
        let result = parse_clean("public delegate TResult Func<T, TResult>(T arg);");
        let decl = only_type(&result);
        assert_eq!(decl.kind, TypeDeclKind::Delegate);
        assert_eq!(decl.type_params.len(), 2);
        assert_eq!(decl.delegate_params.len(), 1);
        assert!(decl.delegate_return.is_some());
    }

    #[test]
    fn operator_declarations() {
        let result = parse_clean(
            r#"
            struct Vec {
                public static Vec operator +(Vec a, Vec b) { return a; }
                public static Vec operator -(Vec a) { return a; }
                public static bool operator ==(Vec a, Vec b) => true;
                public static bool operator !=(Vec a, Vec b) => false;
                public static implicit operator Vec(int scalar) { return new Vec(); }
            }
            "#,
        );
        let decl = only_type(&result);
        let ops: Vec<_> = decl
            .members
            .iter()
            .map(|m| match m {
                Member::Operator(op) => &op.op,
                other => panic!("expected operator, got {other:?}"),
            })
            .collect();
        assert!(matches!(
            ops[0],
            OperatorKind::Binary(csf_ir::ast::BinaryOp::Add)
        ));
        assert!(matches!(ops[1], OperatorKind::Unary(UnaryOp::Minus)));
        assert!(matches!(ops[4], OperatorKind::Conversion { implicit: true }));
    }

    #[test]
    fn explicit_interface_implementation() {
        let result = parse_clean(
            "class C : IEnumerable<int> { IEnumerator<int> IEnumerable<int>.GetEnumerator() { return null; } }",
        );
        let decl = only_type(&result);
        let Member::Method(m) = &decl.members[0] else {
            panic!("expected method");
        };
        assert!(m.explicit_interface.is_some());
    }

    #[test]
    fn indexer_declaration() {
        let result = parse_clean("class Row { public int this[int col] { get => 0; set { } } }");
        let decl = only_type(&result);
        let Member::Property(indexer) = &decl.members[0] else {
            panic!("expected indexer");
        };
        assert_eq!(indexer.index_params.len(), 1);
        assert_eq!(indexer.accessors.len(), 2);
        assert!(!indexer.accessors[0].is_set);
        assert!(indexer.accessors[1].is_set);
    }

    #[test]
    fn auto_property_and_event() {
        let result = parse_clean(
            "class C { public string Name { get; set; } public event Handler Changed; }",
        );
        let decl = only_type(&result);
        let Member::Property(p) = &decl.members[0] else {
            panic!("expected property");
        };
        assert!(p.accessors.iter().all(|a| a.body.is_none()));
        assert!(matches!(decl.members[1], Member::Event(_)));
    }

    #[test]
    fn contextual_modifiers() {
        let result = parse_clean(
            "partial class C { async Task M() { await F(); } partial void OnChanged(); }",
        );
        let decl = only_type(&result);
        assert!(decl.modifiers.contains(Modifiers::PARTIAL));
        let Member::Method(m) = &decl.members[0] else {
            panic!("expected method");
        };
        assert!(m.modifiers.contains(Modifiers::ASYNC));
        let Member::Method(partial) = &decl.members[1] else {
            panic!("expected method");
        };
        assert!(partial.modifiers.contains(Modifiers::PARTIAL));
        assert!(partial.body.is_none());
    }

    #[test]
    fn attributes_on_declarations() {
        let result = parse_clean(
            "[Serializable] class C { [Conditional(\"DEBUG\"), Obsolete] void M() { } }",
        );
        let decl = only_type(&result);
        assert_eq!(decl.attributes.len(), 1);
        let Member::Method(m) = &decl.members[0] else {
            panic!("expected method");
        };
        assert_eq!(m.attributes.len(), 2);
        assert_eq!(m.attributes[0].args.len(), 1);
    }

    #[test]
    fn nested_types_and_constants() {
        let result = parse_clean(
            "class Outer { const int Limit = 8; class Inner { } struct P { } enum E { A } }",
        );
        let decl = only_type(&result);
        let Member::Field(c) = &decl.members[0] else {
            panic!("expected const field");
        };
        assert!(c.is_const);
        assert!(matches!(decl.members[1], Member::NestedType(_)));
        assert!(matches!(decl.members[2], Member::NestedType(_)));
        assert!(matches!(decl.members[3], Member::NestedType(_)));
    }

    #[test]
    fn expression_bodied_method_desugars_to_return() {
        let result = parse_clean("class C { int Twice(int x) => x * 2; }");
        let decl = only_type(&result);
        let Member::Method(m) = &decl.members[0] else {
            panic!("expected method");
        };
        let Some(body) = &m.body else {
            panic!("expected body");
        };
        assert!(matches!(body.kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn member_recovery_keeps_the_type() {
        let interner = StringInterner::new();
        let result = crate::parse_source("class X { void M( }", &interner);
        assert!(!result.diagnostics.is_empty());
        let Item::Type(decl) = &result.unit.items[0] else {
            panic!("expected the class to survive");
        };
        assert_eq!(interner.lookup(decl.name), "X");
    }

    #[test]
    fn bad_member_does_not_take_siblings_down() {
        let interner = StringInterner::new();
        let result = crate::parse_source(
            "class X { int = 3; public void Ok() { } }",
            &interner,
        );
        assert!(!result.diagnostics.is_empty());
        let Item::Type(decl) = &result.unit.items[0] else {
            panic!("expected type");
        };
        assert!(decl.members.iter().any(|m| matches!(
            m,
            Member::Method(method) if interner.lookup(method.name) == "Ok"
        )));
    }

    #[test]
    fn node_count_covers_all_ids() {
        let result = parse_clean("class C { void M() { int x = 1; } }");
        assert!(result.unit.node_count > 0);
    }

    #[test]
    fn diagnostics_survive_item_recovery() {
        let interner = StringInterner::new();
        let result = crate::parse_source("garbage ^^ class C { }", &interner);
        assert!(!result.diagnostics.is_empty());
        assert!(result
            .unit
            .items
            .iter()
            .any(|item| matches!(item, Item::Type(_))));
    }
}
