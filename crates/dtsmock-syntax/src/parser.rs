//! Parser for TypeScript declaration files.

use crate::ast::*;
use crate::lexer::{Lexer, Token, TokenKind};

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at {pos}: {message}")]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

impl ParseError {
    /// Byte range to highlight when reporting the error.
    pub fn span(&self) -> Span {
        Span::new(self.pos, self.pos + 1)
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a .d.ts source string into a DtsFile.
pub fn parse(src: &str) -> ParseResult<DtsFile> {
    let mut parser = Parser::new(src);
    parser.parse_file()
}

/// Parser for TypeScript declaration files.
struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    src: &'src str,
}

/// Keywords that are also valid binding names in declaration position.
fn is_contextual_keyword(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Type
            | TokenKind::Module
            | TokenKind::Namespace
            | TokenKind::Declare
            | TokenKind::Readonly
            | TokenKind::Abstract
            | TokenKind::From
            | TokenKind::As
            | TokenKind::Is
            | TokenKind::Infer
            | TokenKind::Keyof
            | TokenKind::Out
            | TokenKind::Static
            | TokenKind::Public
            | TokenKind::Private
            | TokenKind::Protected
            | TokenKind::Object_
            | TokenKind::Symbol_
            | TokenKind::Undefined_
            | TokenKind::Unknown_
            | TokenKind::Never_
            | TokenKind::Any_
            | TokenKind::String_
            | TokenKind::Number_
            | TokenKind::Boolean_
            | TokenKind::BigInt_
    )
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> Self {
        let tokens = Lexer::new(src).tokenize();
        Self {
            tokens,
            pos: 0,
            src,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].end
        }
    }

    fn start(&self) -> usize {
        self.current().start
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(ParseError {
            message: message.into(),
            pos: self.current().start,
        })
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error(format!("expected {:?}, found {:?}", kind, self.peek()))
        }
    }

    fn is_ident_at(&self, n: usize, text: &str) -> bool {
        matches!(self.peek_nth(n), TokenKind::Ident(s) if s == text)
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            kind if is_contextual_keyword(&kind) => {
                self.advance();
                Ok(kind.keyword_text().unwrap_or_default().to_string())
            }
            _ => self.error(format!("expected identifier, found {:?}", self.peek())),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(s)
            }
            _ => self.error(format!("expected string literal, found {:?}", self.peek())),
        }
    }

    /// Accept any identifier, keyword, string or number as a property name.
    fn expect_property_name(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) | TokenKind::StringLiteral(name) | TokenKind::NumberLiteral(name) => {
                self.advance();
                Ok(name)
            }
            kind => match kind.keyword_text() {
                Some(text) => {
                    self.advance();
                    Ok(text.to_string())
                }
                None => self.error(format!("expected property name, found {:?}", kind)),
            },
        }
    }

    fn is_property_name_at(&self, n: usize) -> bool {
        let kind = self.peek_nth(n);
        matches!(
            kind,
            TokenKind::Ident(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::NumberLiteral(_)
                | TokenKind::LBracket
        ) || kind.keyword_text().is_some()
    }

    /// A modifier keyword followed by `:`, `?`, `(`, `<`, `;` or `,` is really a member name.
    fn is_modifier_not_property(&self) -> bool {
        !matches!(
            self.peek_nth(1),
            TokenKind::Colon
                | TokenKind::Question
                | TokenKind::LParen
                | TokenKind::LAngle
                | TokenKind::Semicolon
                | TokenKind::Comma
                | TokenKind::RBrace
        )
    }

    fn end_member(&mut self) {
        if !self.matches(&TokenKind::Semicolon) {
            self.matches(&TokenKind::Comma);
        }
    }

    /// Skip `@Decorator`, `@a.b` and `@Decorator(args)` prefixes.
    fn skip_decorators(&mut self) {
        while self.matches(&TokenKind::At) {
            self.advance();
            while self.check(&TokenKind::Dot) {
                self.advance();
                self.advance();
            }
            if self.check(&TokenKind::LParen) {
                self.skip_balanced();
            }
        }
    }

    /// Skip a bracketed group starting at the current opening token.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Source text up to the next `,`, `;` or closing bracket at depth zero.
    fn raw_expression(&mut self) -> String {
        let start = self.start();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket if depth == 0 => break,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => depth -= 1,
                TokenKind::Comma | TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Eof => break,
                _ => {}
            }
            self.advance();
        }
        self.span_from(start).text(self.src).to_string()
    }

    /// Skip a statement we cannot model, stopping before the enclosing `}`.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        let mut consumed = false;
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::RBrace if depth == 0 => {
                    if !consumed {
                        self.advance();
                    }
                    break;
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        break;
                    }
                }
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
            consumed = true;
        }
    }

    fn parse_file(&mut self) -> ParseResult<DtsFile> {
        let mut references = Vec::new();
        let mut items = Vec::new();

        while !self.at_end() {
            if let TokenKind::TripleSlashRef(reference) = self.peek() {
                references.push(reference.clone());
                self.advance();
                continue;
            }

            if let Some(item) = self.parse_item()? {
                items.push(item);
            }
        }

        Ok(DtsFile { references, items })
    }

    fn parse_item(&mut self) -> ParseResult<Option<DtsItem>> {
        self.skip_decorators();
        let start = self.start();
        let mut modifiers = Modifiers::default();

        loop {
            match self.peek() {
                TokenKind::Export => {
                    modifiers.export = true;
                    self.advance();
                }
                TokenKind::Declare => {
                    modifiers.declare = true;
                    self.advance();
                }
                TokenKind::Default if modifiers.export => {
                    let declaration_follows = matches!(
                        self.peek_nth(1),
                        TokenKind::Class
                            | TokenKind::Interface
                            | TokenKind::Function
                            | TokenKind::Abstract
                            | TokenKind::Enum
                    );
                    self.advance();
                    if !declaration_follows {
                        let name = self.parse_entity_name()?;
                        self.matches(&TokenKind::Semicolon);
                        return Ok(Some(DtsItem::Export(DtsExport::Default(name))));
                    }
                    modifiers.default = true;
                }
                TokenKind::Abstract if self.peek_nth(1) == &TokenKind::Class => {
                    self.advance();
                }
                _ => break,
            }
        }

        if modifiers.export {
            if let Some(export) = self.parse_export_tail()? {
                return Ok(Some(DtsItem::Export(export)));
            }
        }

        let item = match self.peek() {
            TokenKind::Function => DtsItem::Function(self.parse_function(modifiers, start)?),
            TokenKind::Interface => DtsItem::Interface(self.parse_interface(modifiers, start)?),
            TokenKind::Class => DtsItem::Class(self.parse_class(modifiers, start)?),
            TokenKind::Enum => DtsItem::Enum(self.parse_enum(modifiers, false, start)?),
            TokenKind::Const if self.peek_nth(1) == &TokenKind::Enum => {
                self.advance();
                DtsItem::Enum(self.parse_enum(modifiers, true, start)?)
            }
            TokenKind::Type if self.is_property_name_at(1) => {
                DtsItem::TypeAlias(self.parse_type_alias(modifiers, start)?)
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                DtsItem::Variable(self.parse_variable(modifiers, start)?)
            }
            TokenKind::Namespace | TokenKind::Module => {
                DtsItem::Module(self.parse_module(modifiers, start)?)
            }
            TokenKind::Ident(name) if name == "global" && self.peek_nth(1) == &TokenKind::LBrace => {
                DtsItem::Module(self.parse_module(modifiers, start)?)
            }
            TokenKind::Import if !matches!(self.peek_nth(1), TokenKind::LParen | TokenKind::Dot) => {
                self.parse_import(modifiers, start)?
            }
            TokenKind::Semicolon => {
                self.advance();
                return Ok(None);
            }
            TokenKind::TripleSlashRef(_) => {
                self.advance();
                return Ok(None);
            }
            TokenKind::Eof => return Ok(None),
            _ => {
                self.skip_statement();
                DtsItem::Unsupported(self.span_from(start))
            }
        };

        Ok(Some(item))
    }

    /// `A.B.C`, where segments after a dot may be keywords.
    fn parse_entity_name(&mut self) -> ParseResult<String> {
        let mut name = self.expect_ident()?;
        while self.check(&TokenKind::Dot) && self.is_property_name_at(1) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_property_name()?);
        }
        Ok(name)
    }

    /// Export forms that are not declarations.
    fn parse_export_tail(&mut self) -> ParseResult<Option<DtsExport>> {
        if self.matches(&TokenKind::Eq) {
            let name = self.parse_entity_name()?;
            self.matches(&TokenKind::Semicolon);
            return Ok(Some(DtsExport::Equals(name)));
        }
        if self.check(&TokenKind::As) && self.peek_nth(1) == &TokenKind::Namespace {
            self.advance();
            self.advance();
            let name = self.expect_ident()?;
            self.matches(&TokenKind::Semicolon);
            return Ok(Some(DtsExport::AsNamespace(name)));
        }
        if self.matches(&TokenKind::Star) {
            let alias = if self.matches(&TokenKind::As) {
                Some(self.expect_property_name()?)
            } else {
                None
            };
            self.expect(&TokenKind::From)?;
            let from = self.expect_string()?;
            self.matches(&TokenKind::Semicolon);
            return Ok(Some(DtsExport::All { alias, from }));
        }
        let type_only = self.check(&TokenKind::Type) && self.peek_nth(1) == &TokenKind::LBrace;
        if type_only {
            self.advance();
        }
        if self.check(&TokenKind::LBrace) {
            let specifiers = self.parse_named_exports()?;
            let from = if self.matches(&TokenKind::From) {
                Some(self.expect_string()?)
            } else {
                None
            };
            self.matches(&TokenKind::Semicolon);
            return Ok(Some(DtsExport::Named {
                specifiers,
                from,
                type_only,
            }));
        }
        Ok(None)
    }

    fn parse_named_exports(&mut self) -> ParseResult<Vec<(String, Option<String>)>> {
        self.expect(&TokenKind::LBrace)?;
        let mut exports = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.check(&TokenKind::Type) && self.is_property_name_at(1) {
                self.advance();
            }
            let name = self.expect_property_name()?;
            let alias = if self.matches(&TokenKind::As) {
                Some(self.expect_property_name()?)
            } else {
                None
            };
            exports.push((name, alias));

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(exports)
    }

    fn parse_import(&mut self, modifiers: Modifiers, start: usize) -> ParseResult<DtsItem> {
        self.expect(&TokenKind::Import)?;

        let type_only = self.check(&TokenKind::Type)
            && matches!(
                self.peek_nth(1),
                TokenKind::Ident(_) | TokenKind::LBrace | TokenKind::Star
            );
        if type_only {
            self.advance();
        }

        // import "side-effect";
        if let TokenKind::StringLiteral(path) = self.peek().clone() {
            self.advance();
            self.skip_import_attributes();
            self.matches(&TokenKind::Semicolon);
            return Ok(DtsItem::Import(DtsImport {
                type_only,
                default: None,
                namespace: None,
                named: Vec::new(),
                path,
                span: self.span_from(start),
            }));
        }

        // import name = require("path"); / import name = A.B;
        if self.peek_nth(1) == &TokenKind::Eq {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Eq)?;
            let target = if self.is_ident_at(0, "require") && self.peek_nth(1) == &TokenKind::LParen {
                self.advance();
                self.advance();
                let path = self.expect_string()?;
                self.expect(&TokenKind::RParen)?;
                ImportEqualsTarget::Require(path)
            } else {
                ImportEqualsTarget::Entity(self.parse_entity_name()?)
            };
            self.matches(&TokenKind::Semicolon);
            return Ok(DtsItem::ImportEquals(DtsImportEquals {
                modifiers,
                name,
                target,
                span: self.span_from(start),
            }));
        }

        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();

        if !matches!(self.peek(), TokenKind::LBrace | TokenKind::Star) {
            default = Some(self.expect_ident()?);
            self.matches(&TokenKind::Comma);
        }
        if self.matches(&TokenKind::Star) {
            self.expect(&TokenKind::As)?;
            namespace = Some(self.expect_ident()?);
        }
        if self.matches(&TokenKind::LBrace) {
            while !self.check(&TokenKind::RBrace) && !self.at_end() {
                let spec_type_only = self.check(&TokenKind::Type)
                    && !matches!(
                        self.peek_nth(1),
                        TokenKind::Comma | TokenKind::RBrace | TokenKind::As
                    );
                if spec_type_only {
                    self.advance();
                }
                let name = self.expect_property_name()?;
                let alias = if self.matches(&TokenKind::As) {
                    Some(self.expect_property_name()?)
                } else {
                    None
                };
                named.push(ImportSpecifier {
                    name,
                    alias,
                    type_only: spec_type_only,
                });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace)?;
        }

        self.expect(&TokenKind::From)?;
        let path = self.expect_string()?;
        self.skip_import_attributes();
        self.matches(&TokenKind::Semicolon);

        Ok(DtsItem::Import(DtsImport {
            type_only,
            default,
            namespace,
            named,
            path,
            span: self.span_from(start),
        }))
    }

    /// `with { type: "json" }` / `assert { ... }`
    fn skip_import_attributes(&mut self) {
        let is_attributes = (self.is_ident_at(0, "with") || self.is_ident_at(0, "assert"))
            && self.peek_nth(1) == &TokenKind::LBrace;
        if is_attributes {
            self.advance();
            self.skip_balanced();
        }
    }

    fn parse_function(&mut self, modifiers: Modifiers, start: usize) -> ParseResult<DtsFunction> {
        self.expect(&TokenKind::Function)?;
        self.matches(&TokenKind::Star);
        let name = if matches!(self.peek(), TokenKind::LParen | TokenKind::LAngle) {
            String::new()
        } else {
            self.expect_ident()?
        };
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;
        let return_type = self.parse_optional_annotation()?;
        self.matches(&TokenKind::Semicolon);

        Ok(DtsFunction {
            modifiers,
            name,
            type_params,
            params,
            return_type,
            span: self.span_from(start),
        })
    }

    fn parse_optional_annotation(&mut self) -> ParseResult<Option<TypeAnnotation>> {
        if self.matches(&TokenKind::Colon) {
            Ok(Some(self.parse_type_annotation()?))
        } else {
            Ok(None)
        }
    }

    fn parse_type_annotation(&mut self) -> ParseResult<TypeAnnotation> {
        let start = self.start();
        let ty = self.parse_type()?;
        Ok(TypeAnnotation {
            ty,
            span: self.span_from(start),
        })
    }

    fn parse_heritage_list(&mut self) -> ParseResult<Vec<TypeAnnotation>> {
        let mut types = Vec::new();
        loop {
            types.push(self.parse_type_annotation()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        Ok(types)
    }

    fn parse_interface(&mut self, modifiers: Modifiers, start: usize) -> ParseResult<DtsInterface> {
        self.expect(&TokenKind::Interface)?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;

        let extends = if self.matches(&TokenKind::Extends) {
            self.parse_heritage_list()?
        } else {
            Vec::new()
        };

        let members = self.parse_type_members()?;

        Ok(DtsInterface {
            modifiers,
            name,
            type_params,
            extends,
            members,
            span: self.span_from(start),
        })
    }

    fn parse_type_members(&mut self) -> ParseResult<Vec<InterfaceMember>> {
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if let Some(member) = self.parse_type_member()? {
                members.push(member);
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(members)
    }

    fn is_index_signature(&self) -> bool {
        self.check(&TokenKind::LBracket)
            && self.is_property_name_at(1)
            && self.peek_nth(2) == &TokenKind::Colon
    }

    /// `get name(): T` / `set name(v: T)`; the keyword must be followed by a name.
    fn accessor_kind(&self) -> Option<&'static str> {
        let is_accessor = |text: &str| {
            self.is_ident_at(0, text)
                && self.is_property_name_at(1)
                && !matches!(
                    self.peek_nth(1),
                    TokenKind::Colon | TokenKind::Question | TokenKind::LParen | TokenKind::LAngle
                )
        };
        if is_accessor("get") {
            Some("get")
        } else if is_accessor("set") {
            Some("set")
        } else {
            None
        }
    }

    fn parse_member_name(&mut self) -> ParseResult<MemberName> {
        if self.check(&TokenKind::LBracket) {
            self.advance();
            let start = self.start();
            let mut depth = 0usize;
            while !self.at_end() {
                match self.peek() {
                    TokenKind::LBracket => depth += 1,
                    TokenKind::RBracket if depth == 0 => break,
                    TokenKind::RBracket => depth -= 1,
                    _ => {}
                }
                self.advance();
            }
            let text = self.span_from(start).text(self.src).to_string();
            self.expect(&TokenKind::RBracket)?;
            return Ok(MemberName {
                text,
                computed: true,
            });
        }
        Ok(MemberName::ident(self.expect_property_name()?))
    }

    fn parse_call_signature(&mut self) -> ParseResult<CallSignature> {
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;
        let return_type = self.parse_optional_annotation()?;
        Ok(CallSignature {
            type_params,
            params,
            return_type,
        })
    }

    fn parse_type_member(&mut self) -> ParseResult<Option<InterfaceMember>> {
        self.skip_decorators();
        let readonly = if self.check(&TokenKind::Readonly) && self.is_modifier_not_property() {
            self.advance();
            true
        } else {
            false
        };

        if self.is_index_signature() {
            let sig = self.parse_index_signature(readonly)?;
            return Ok(Some(InterfaceMember::IndexSignature(sig)));
        }

        if self.check(&TokenKind::LParen) || self.check(&TokenKind::LAngle) {
            let sig = self.parse_call_signature()?;
            self.end_member();
            return Ok(Some(InterfaceMember::CallSignature(sig)));
        }

        if self.check(&TokenKind::New) && matches!(self.peek_nth(1), TokenKind::LParen | TokenKind::LAngle) {
            self.advance();
            let sig = self.parse_call_signature()?;
            self.end_member();
            return Ok(Some(InterfaceMember::ConstructSignature(sig)));
        }

        if let Some(accessor) = self.accessor_kind() {
            self.advance();
            let name = self.parse_member_name()?;
            let sig = self.parse_call_signature()?;
            self.end_member();
            if accessor == "set" {
                return Ok(None);
            }
            return Ok(Some(InterfaceMember::Property(PropertyMember {
                name,
                ty: sig.return_type,
                optional: false,
                readonly: true,
            })));
        }

        let name = match self.parse_member_name() {
            Ok(n) => n,
            Err(_) => {
                self.advance();
                return Ok(None);
            }
        };

        let optional = self.matches(&TokenKind::Question);

        if self.check(&TokenKind::LParen) || self.check(&TokenKind::LAngle) {
            let sig = self.parse_call_signature()?;
            self.end_member();
            return Ok(Some(InterfaceMember::Method(MethodMember {
                name,
                type_params: sig.type_params,
                params: sig.params,
                return_type: sig.return_type,
                optional,
            })));
        }

        let ty = self.parse_optional_annotation()?;
        self.end_member();

        Ok(Some(InterfaceMember::Property(PropertyMember {
            name,
            ty,
            optional,
            readonly,
        })))
    }

    fn parse_index_signature(&mut self, readonly: bool) -> ParseResult<IndexSignature> {
        self.expect(&TokenKind::LBracket)?;
        let key_name = self.expect_property_name()?;
        self.expect(&TokenKind::Colon)?;
        let key_type = self.parse_type_annotation()?;
        self.expect(&TokenKind::RBracket)?;
        self.matches(&TokenKind::Question);
        self.expect(&TokenKind::Colon)?;
        let value_type = self.parse_type_annotation()?;
        self.end_member();

        Ok(IndexSignature {
            key_name,
            key_type,
            value_type,
            readonly,
        })
    }

    fn parse_class(&mut self, modifiers: Modifiers, start: usize) -> ParseResult<DtsClass> {
        self.expect(&TokenKind::Class)?;
        let name = if matches!(self.peek(), TokenKind::LBrace | TokenKind::LAngle)
            || (self.check(&TokenKind::Extends) || self.check(&TokenKind::Implements))
        {
            String::new()
        } else {
            self.expect_ident()?
        };
        let type_params = self.parse_type_params()?;

        let extends = if self.matches(&TokenKind::Extends) {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        let implements = if self.matches(&TokenKind::Implements) {
            self.parse_heritage_list()?
        } else {
            Vec::new()
        };

        let members = self.parse_class_body()?;

        Ok(DtsClass {
            modifiers,
            name,
            type_params,
            extends,
            implements,
            members,
            span: self.span_from(start),
        })
    }

    fn parse_class_body(&mut self) -> ParseResult<Vec<ClassMember>> {
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if let Some(member) = self.parse_class_member()? {
                members.push(member);
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(members)
    }

    fn parse_class_member(&mut self) -> ParseResult<Option<ClassMember>> {
        self.skip_decorators();
        let mut visibility = Visibility::Public;
        let mut is_static = false;
        let mut readonly = false;

        loop {
            match self.peek() {
                TokenKind::Public if self.is_modifier_not_property() => {
                    visibility = Visibility::Public;
                    self.advance();
                }
                TokenKind::Private if self.is_modifier_not_property() => {
                    visibility = Visibility::Private;
                    self.advance();
                }
                TokenKind::Protected if self.is_modifier_not_property() => {
                    visibility = Visibility::Protected;
                    self.advance();
                }
                TokenKind::Static if self.is_modifier_not_property() => {
                    is_static = true;
                    self.advance();
                }
                TokenKind::Readonly if self.is_modifier_not_property() => {
                    readonly = true;
                    self.advance();
                }
                TokenKind::Abstract | TokenKind::Declare if self.is_modifier_not_property() => {
                    self.advance();
                }
                TokenKind::Ident(word)
                    if (word == "override" || word == "accessor") && self.is_modifier_not_property() =>
                {
                    self.advance();
                }
                _ => break,
            }
        }

        if self.is_ident_at(0, "constructor") && self.peek_nth(1) == &TokenKind::LParen {
            self.advance();
            let sig = self.parse_call_signature()?;
            self.end_member();
            return Ok(Some(ClassMember::Constructor(sig)));
        }

        if self.is_index_signature() {
            let sig = self.parse_index_signature(readonly)?;
            return Ok(Some(ClassMember::IndexSignature(sig)));
        }

        if let Some(accessor) = self.accessor_kind() {
            self.advance();
            let name = self.parse_member_name()?;
            let sig = self.parse_call_signature()?;
            self.end_member();
            if accessor == "set" {
                return Ok(None);
            }
            return Ok(Some(ClassMember::Property(ClassProperty {
                name,
                ty: sig.return_type,
                optional: false,
                readonly: true,
                is_static,
                visibility,
            })));
        }

        let name = match self.parse_member_name() {
            Ok(n) => n,
            Err(_) => {
                self.advance();
                return Ok(None);
            }
        };

        let optional = self.matches(&TokenKind::Question);

        if self.check(&TokenKind::LParen) || self.check(&TokenKind::LAngle) {
            let sig = self.parse_call_signature()?;
            self.end_member();
            return Ok(Some(ClassMember::Method(ClassMethod {
                name,
                type_params: sig.type_params,
                params: sig.params,
                return_type: sig.return_type,
                optional,
                is_static,
                visibility,
            })));
        }

        let ty = self.parse_optional_annotation()?;
        if self.matches(&TokenKind::Eq) {
            self.raw_expression();
        }
        self.end_member();

        Ok(Some(ClassMember::Property(ClassProperty {
            name,
            ty,
            optional,
            readonly,
            is_static,
            visibility,
        })))
    }

    fn parse_enum(&mut self, modifiers: Modifiers, is_const: bool, start: usize) -> ParseResult<DtsEnum> {
        self.expect(&TokenKind::Enum)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;

        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let member_name = self.expect_property_name()?;
            let init = if self.matches(&TokenKind::Eq) {
                Some(self.parse_enum_init())
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name,
                init,
            });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(DtsEnum {
            modifiers,
            name,
            is_const,
            members,
            span: self.span_from(start),
        })
    }

    fn parse_enum_init(&mut self) -> EnumInit {
        match self.peek().clone() {
            TokenKind::StringLiteral(s) if self.is_enum_member_end(1) => {
                self.advance();
                EnumInit::String(s)
            }
            TokenKind::NumberLiteral(n) if self.is_enum_member_end(1) => {
                self.advance();
                EnumInit::Number(n)
            }
            TokenKind::Minus if self.is_enum_member_end(2) => {
                if let TokenKind::NumberLiteral(n) = self.peek_nth(1).clone() {
                    self.advance();
                    self.advance();
                    return EnumInit::Number(format!("-{n}"));
                }
                EnumInit::Expr(self.raw_expression())
            }
            _ => EnumInit::Expr(self.raw_expression()),
        }
    }

    fn is_enum_member_end(&self, n: usize) -> bool {
        matches!(self.peek_nth(n), TokenKind::Comma | TokenKind::RBrace)
    }

    fn parse_type_alias(&mut self, modifiers: Modifiers, start: usize) -> ParseResult<DtsTypeAlias> {
        self.expect(&TokenKind::Type)?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(&TokenKind::Eq)?;
        let ty = self.parse_type_annotation()?;
        self.matches(&TokenKind::Semicolon);

        Ok(DtsTypeAlias {
            modifiers,
            name,
            type_params,
            ty,
            span: self.span_from(start),
        })
    }

    fn parse_variable(&mut self, modifiers: Modifiers, start: usize) -> ParseResult<DtsVariable> {
        let kind = match self.advance().kind {
            TokenKind::Const => VariableKind::Const,
            TokenKind::Let => VariableKind::Let,
            _ => VariableKind::Var,
        };

        let mut declarators = Vec::new();
        loop {
            // Variable names may be keywords, e.g. `var static: Type`.
            let name = self.expect_property_name()?;
            let ty = self.parse_optional_annotation()?;
            let init = if self.matches(&TokenKind::Eq) {
                Some(self.raw_expression())
            } else {
                None
            };
            declarators.push(VariableDeclarator { name, ty, init });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.matches(&TokenKind::Semicolon);

        Ok(DtsVariable {
            modifiers,
            kind,
            declarators,
            span: self.span_from(start),
        })
    }

    fn parse_module(&mut self, modifiers: Modifiers, start: usize) -> ParseResult<DtsModule> {
        let keyword = self.advance();
        let kind = match keyword.kind {
            TokenKind::Namespace => ModuleKind::Namespace,
            TokenKind::Module => ModuleKind::Module,
            _ => ModuleKind::Global,
        };

        let mut names = Vec::new();
        if kind == ModuleKind::Global {
            names.push(ModuleName::Ident("global".to_string()));
        } else if let TokenKind::StringLiteral(s) = self.peek().clone() {
            self.advance();
            names.push(ModuleName::String(s));
        } else {
            names.push(ModuleName::Ident(self.expect_ident()?));
            while self.matches(&TokenKind::Dot) {
                names.push(ModuleName::Ident(self.expect_ident()?));
            }
        }

        let mut body = if self.check(&TokenKind::LBrace) {
            Some(self.parse_module_body()?)
        } else {
            self.matches(&TokenKind::Semicolon);
            None
        };
        let span = self.span_from(start);

        // `namespace A.B { }` nests B inside A; inner segments are implicitly exported.
        let outer = names.remove(0);
        while let Some(name) = names.pop() {
            let inner = DtsModule {
                modifiers: Modifiers {
                    export: true,
                    ..Modifiers::default()
                },
                name,
                kind,
                body: body.take(),
                span,
            };
            body = Some(vec![DtsItem::Module(inner)]);
        }

        Ok(DtsModule {
            modifiers,
            name: outer,
            kind,
            body,
            span,
        })
    }

    fn parse_module_body(&mut self) -> ParseResult<Vec<DtsItem>> {
        self.expect(&TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if let Some(item) = self.parse_item()? {
                items.push(item);
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(items)
    }

    fn parse_type_params(&mut self) -> ParseResult<Vec<TypeParam>> {
        if !self.matches(&TokenKind::LAngle) {
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        while !self.check(&TokenKind::RAngle) && !self.at_end() {
            // Variance and const modifiers.
            while matches!(self.peek(), TokenKind::In | TokenKind::Out | TokenKind::Const)
                && self.is_property_name_at(1)
            {
                self.advance();
            }

            let name = self.expect_ident()?;

            let constraint = if self.matches(&TokenKind::Extends) {
                Some(self.parse_type()?)
            } else {
                None
            };

            let default = if self.matches(&TokenKind::Eq) {
                Some(self.parse_type()?)
            } else {
                None
            };

            params.push(TypeParam {
                name,
                constraint,
                default,
            });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RAngle)?;
        Ok(params)
    }

    fn parse_param_name(&mut self) -> ParseResult<String> {
        if matches!(self.peek(), TokenKind::LBrace | TokenKind::LBracket) {
            let start = self.start();
            self.skip_balanced();
            return Ok(self.span_from(start).text(self.src).to_string());
        }
        self.expect_property_name()
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(&TokenKind::LParen)?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            self.skip_decorators();
            // `this` parameters describe the receiver, not an argument.
            if self.check(&TokenKind::This) && self.peek_nth(1) == &TokenKind::Colon {
                self.advance();
                self.advance();
                self.parse_type()?;
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
                continue;
            }

            // Parameter properties in constructors.
            while matches!(
                self.peek(),
                TokenKind::Public | TokenKind::Private | TokenKind::Protected | TokenKind::Readonly
            ) && self.is_modifier_not_property()
            {
                self.advance();
            }

            let rest = self.matches(&TokenKind::DotDotDot);
            let name = self.parse_param_name()?;
            let optional = self.matches(&TokenKind::Question);
            let ty = self.parse_optional_annotation()?;
            if self.matches(&TokenKind::Eq) {
                self.raw_expression();
            }

            params.push(Param {
                name,
                ty,
                optional,
                rest,
            });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_type(&mut self) -> ParseResult<DtsType> {
        self.parse_union_type()
    }

    fn parse_union_type(&mut self) -> ParseResult<DtsType> {
        self.matches(&TokenKind::Pipe);

        let mut types = vec![self.parse_intersection_type()?];

        while self.matches(&TokenKind::Pipe) {
            types.push(self.parse_intersection_type()?);
        }

        if types.len() == 1 {
            Ok(types.remove(0))
        } else {
            Ok(DtsType::Union(types))
        }
    }

    fn parse_intersection_type(&mut self) -> ParseResult<DtsType> {
        self.matches(&TokenKind::Amp);

        let mut types = vec![self.parse_postfix_type()?];

        while self.matches(&TokenKind::Amp) {
            types.push(self.parse_postfix_type()?);
        }

        if types.len() == 1 {
            Ok(types.remove(0))
        } else {
            Ok(DtsType::Intersection(types))
        }
    }

    fn parse_postfix_type(&mut self) -> ParseResult<DtsType> {
        let mut ty = self.parse_primary_type()?;

        loop {
            if self.check(&TokenKind::LBracket) && self.peek_nth(1) == &TokenKind::RBracket {
                self.advance();
                self.advance();
                ty = DtsType::Array(Box::new(ty));
                continue;
            }

            if self.check(&TokenKind::LBracket) {
                self.advance();
                let index = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                ty = DtsType::IndexAccess {
                    object: Box::new(ty),
                    index: Box::new(index),
                };
                continue;
            }

            break;
        }

        Ok(ty)
    }

    fn primitive(&mut self, primitive: Primitive) -> ParseResult<DtsType> {
        self.advance();
        Ok(DtsType::Primitive(primitive))
    }

    fn parse_primary_type(&mut self) -> ParseResult<DtsType> {
        match self.peek().clone() {
            TokenKind::String_ => self.primitive(Primitive::String),
            TokenKind::Number_ => self.primitive(Primitive::Number),
            TokenKind::Boolean_ => self.primitive(Primitive::Boolean),
            TokenKind::Void_ => self.primitive(Primitive::Void),
            TokenKind::Null_ => self.primitive(Primitive::Null),
            TokenKind::Undefined_ => self.primitive(Primitive::Undefined),
            TokenKind::Any_ => self.primitive(Primitive::Any),
            TokenKind::Unknown_ => self.primitive(Primitive::Unknown),
            TokenKind::Never_ => self.primitive(Primitive::Never),
            TokenKind::Object_ => self.primitive(Primitive::Object),
            TokenKind::Symbol_ => self.primitive(Primitive::Symbol),
            TokenKind::BigInt_ => self.primitive(Primitive::BigInt),
            TokenKind::True_ => {
                self.advance();
                Ok(DtsType::BooleanLiteral(true))
            }
            TokenKind::False_ => {
                self.advance();
                Ok(DtsType::BooleanLiteral(false))
            }

            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(DtsType::StringLiteral(s))
            }
            TokenKind::NumberLiteral(n) => {
                self.advance();
                Ok(DtsType::NumberLiteral(n))
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek().clone() {
                    TokenKind::NumberLiteral(n) => {
                        self.advance();
                        Ok(DtsType::NumberLiteral(format!("-{n}")))
                    }
                    _ => self.error("expected number after '-'"),
                }
            }
            TokenKind::TemplateLiteral(raw) => {
                self.advance();
                Ok(DtsType::TemplateLiteral(raw))
            }

            TokenKind::Typeof => {
                self.advance();
                if self.check(&TokenKind::Import) {
                    let start = self.start();
                    self.parse_import_type()?;
                    return Ok(DtsType::TypeOf(self.span_from(start).text(self.src).to_string()));
                }
                let name = self.parse_entity_name_or_this()?;
                if self.check(&TokenKind::LAngle) {
                    self.parse_type_args()?;
                }
                Ok(DtsType::TypeOf(name))
            }
            TokenKind::Keyof => {
                self.advance();
                let ty = self.parse_postfix_type()?;
                Ok(DtsType::KeyOf(Box::new(ty)))
            }
            TokenKind::Readonly => {
                // `readonly T[]` and `readonly [A, B]` describe the same runtime shape.
                self.advance();
                self.parse_postfix_type()
            }
            TokenKind::Infer => {
                self.advance();
                let name = self.expect_ident()?;
                if self.check(&TokenKind::Extends) && self.peek_nth(2) != &TokenKind::Question {
                    self.advance();
                    self.parse_primary_type()?;
                }
                Ok(DtsType::Infer(name))
            }
            TokenKind::This => {
                self.advance();
                if self.matches(&TokenKind::Is) {
                    let ty = self.parse_type()?;
                    return Ok(DtsType::Predicate {
                        param: "this".to_string(),
                        ty: Some(Box::new(ty)),
                    });
                }
                Ok(DtsType::This)
            }
            TokenKind::Import => self.parse_import_type(),
            TokenKind::New => {
                self.advance();
                self.parse_function_type_tail(true)
            }
            TokenKind::Abstract if self.peek_nth(1) == &TokenKind::New => {
                self.advance();
                self.advance();
                self.parse_function_type_tail(true)
            }

            TokenKind::LParen => self.parse_paren_or_function_type(),
            TokenKind::LBrace => self.parse_object_type(),
            TokenKind::LBracket => self.parse_tuple_type(),
            TokenKind::LAngle => self.parse_function_type_tail(false),

            TokenKind::Ident(name) => {
                if name == "unique" && self.peek_nth(1) == &TokenKind::Symbol_ {
                    self.advance();
                    return self.primitive(Primitive::Symbol);
                }
                if name == "asserts"
                    && matches!(self.peek_nth(1), TokenKind::Ident(_) | TokenKind::This)
                {
                    self.advance();
                    let param = self.parse_entity_name_or_this()?;
                    let ty = if self.matches(&TokenKind::Is) {
                        Some(Box::new(self.parse_type()?))
                    } else {
                        None
                    };
                    return Ok(DtsType::Predicate { param, ty });
                }
                let name = self.parse_entity_name()?;
                self.parse_named_type(name)
            }

            kind if is_contextual_keyword(&kind) => {
                let name = self.parse_entity_name()?;
                self.parse_named_type(name)
            }

            _ => self.error(format!("unexpected token in type position: {:?}", self.peek())),
        }
    }

    fn parse_entity_name_or_this(&mut self) -> ParseResult<String> {
        if self.matches(&TokenKind::This) {
            let mut name = "this".to_string();
            while self.check(&TokenKind::Dot) && self.is_property_name_at(1) {
                self.advance();
                name.push('.');
                name.push_str(&self.expect_property_name()?);
            }
            return Ok(name);
        }
        self.parse_entity_name()
    }

    /// `import("path").A.B<T>`
    fn parse_import_type(&mut self) -> ParseResult<DtsType> {
        self.expect(&TokenKind::Import)?;
        self.expect(&TokenKind::LParen)?;
        let path = self.expect_string()?;
        self.expect(&TokenKind::RParen)?;

        let mut qualifier = Vec::new();
        while self.matches(&TokenKind::Dot) {
            qualifier.push(self.expect_property_name()?);
        }
        let type_args = if self.check(&TokenKind::LAngle) {
            self.parse_type_args()?
        } else {
            Vec::new()
        };

        Ok(DtsType::Import {
            path,
            qualifier,
            type_args,
        })
    }

    fn parse_named_type(&mut self, name: String) -> ParseResult<DtsType> {
        if self.check(&TokenKind::Is) {
            self.advance();
            let ty = self.parse_type()?;
            return Ok(DtsType::Predicate {
                param: name,
                ty: Some(Box::new(ty)),
            });
        }

        let type_args = if self.check(&TokenKind::LAngle) {
            self.parse_type_args()?
        } else {
            Vec::new()
        };

        // Conditional type: T extends U ? X : Y
        if self.check(&TokenKind::Extends) {
            self.advance();
            let extends = self.parse_union_type()?;
            self.expect(&TokenKind::Question)?;
            let true_type = self.parse_type()?;
            self.expect(&TokenKind::Colon)?;
            let false_type = self.parse_type()?;

            return Ok(DtsType::Conditional {
                check: Box::new(DtsType::Named { name, type_args }),
                extends: Box::new(extends),
                true_type: Box::new(true_type),
                false_type: Box::new(false_type),
            });
        }

        Ok(DtsType::Named { name, type_args })
    }

    fn parse_type_args(&mut self) -> ParseResult<Vec<DtsType>> {
        self.expect(&TokenKind::LAngle)?;
        let mut args = Vec::new();

        while !self.check(&TokenKind::RAngle) && !self.at_end() {
            args.push(self.parse_type()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RAngle)?;
        Ok(args)
    }

    /// `<T>(params) => R`, with the `new` keyword already consumed for constructors.
    fn parse_function_type_tail(&mut self, is_constructor: bool) -> ParseResult<DtsType> {
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::Arrow)?;
        let return_type = self.parse_type()?;

        Ok(DtsType::Function(Box::new(FunctionType {
            type_params,
            params,
            return_type: Box::new(return_type),
            is_constructor,
        })))
    }

    /// Does the parameter list that starts after `(` look like a function type?
    fn looks_like_params(&self) -> bool {
        match self.peek_nth(1) {
            TokenKind::RParen => true,
            TokenKind::DotDotDot | TokenKind::LBrace | TokenKind::LBracket => true,
            TokenKind::This => matches!(self.peek_nth(2), TokenKind::Colon),
            kind if matches!(kind, TokenKind::Ident(_)) || kind.keyword_text().is_some() => {
                match self.peek_nth(2) {
                    TokenKind::Colon | TokenKind::Question | TokenKind::Comma => true,
                    TokenKind::RParen => self.peek_nth(3) == &TokenKind::Arrow,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn parse_paren_or_function_type(&mut self) -> ParseResult<DtsType> {
        if self.looks_like_params() {
            // `({ a: string })` is a parenthesized object type, not a pattern.
            let object_in_parens = self.peek_nth(1) == &TokenKind::LBrace && !self.pattern_before_arrow();
            if !object_in_parens {
                return self.parse_function_type_tail(false);
            }
        }

        self.expect(&TokenKind::LParen)?;
        let inner = self.parse_type()?;
        self.expect(&TokenKind::RParen)?;
        Ok(DtsType::Parenthesized(Box::new(inner)))
    }

    /// Scan to the `)` matching the current `(` and check for a following `=>`.
    fn pattern_before_arrow(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while i < self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::Arrow)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_object_type(&mut self) -> ParseResult<DtsType> {
        self.expect(&TokenKind::LBrace)?;

        let offset = match self.peek() {
            TokenKind::Readonly => 1,
            TokenKind::Plus | TokenKind::Minus => 2,
            _ => 0,
        };
        if self.peek_nth(offset) == &TokenKind::LBracket
            && matches!(self.peek_nth(offset + 1), TokenKind::Ident(_))
            && self.peek_nth(offset + 2) == &TokenKind::In
        {
            return self.parse_mapped_type(offset);
        }

        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if let Some(member) = self.parse_type_member()? {
                members.push(member);
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(DtsType::Object(members))
    }

    fn parse_mapped_type(&mut self, modifier_tokens: usize) -> ParseResult<DtsType> {
        for _ in 0..modifier_tokens {
            self.advance();
        }

        self.expect(&TokenKind::LBracket)?;
        let key_name = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let key_constraint = self.parse_type()?;
        if self.matches(&TokenKind::As) {
            self.parse_type()?;
        }
        self.expect(&TokenKind::RBracket)?;

        if self.matches(&TokenKind::Plus) || self.matches(&TokenKind::Minus) {
            self.expect(&TokenKind::Question)?;
        } else {
            self.matches(&TokenKind::Question);
        }

        let value_type = if self.matches(&TokenKind::Colon) {
            self.parse_type()?
        } else {
            DtsType::Primitive(Primitive::Any)
        };
        self.end_member();
        self.expect(&TokenKind::RBrace)?;

        Ok(DtsType::Mapped {
            key_name,
            key_constraint: Box::new(key_constraint),
            value_type: Box::new(value_type),
        })
    }

    fn parse_tuple_type(&mut self) -> ParseResult<DtsType> {
        self.expect(&TokenKind::LBracket)?;

        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) && !self.at_end() {
            let rest = self.matches(&TokenKind::DotDotDot);

            let is_named = (matches!(self.peek(), TokenKind::Ident(_)) || self.peek().keyword_text().is_some())
                && matches!(self.peek_nth(1), TokenKind::Colon)
                || matches!(self.peek_nth(1), TokenKind::Question) && self.peek_nth(2) == &TokenKind::Colon;
            let (name, optional, ty) = if is_named {
                let n = self.expect_property_name()?;
                let opt = self.matches(&TokenKind::Question);
                self.expect(&TokenKind::Colon)?;
                (Some(n), opt, self.parse_type()?)
            } else {
                let ty = self.parse_type()?;
                let opt = self.matches(&TokenKind::Question);
                (None, opt, ty)
            };

            elements.push(TupleElement {
                ty,
                name,
                optional,
                rest,
            });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RBracket)?;
        Ok(DtsType::Tuple(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(src: &str) -> DtsItem {
        parse(src).unwrap().items.remove(0)
    }

    #[test]
    fn test_parse_simple_function() {
        let DtsItem::Function(f) = first("declare function add(a: number, b: number): number;") else {
            panic!("expected function");
        };
        assert_eq!(f.name, "add");
        assert!(f.modifiers.declare);
        assert_eq!(f.params.len(), 2);
        assert!(matches!(
            f.return_type.map(|t| t.ty),
            Some(DtsType::Primitive(Primitive::Number))
        ));
    }

    #[test]
    fn test_type_annotation_spans_cover_source_text() {
        let src = "declare function on(type: 'change', callback: Callback<Array<string>>): void;";
        let DtsItem::Function(f) = first(src) else {
            panic!("expected function");
        };
        let ty = f.params[1].ty.as_ref().unwrap();
        assert_eq!(ty.span.text(src), "Callback<Array<string>>");
        assert_eq!(f.params[0].ty.as_ref().unwrap().span.text(src), "'change'");
    }

    #[test]
    fn test_parse_enum_initializers() {
        let src = "export enum Mode { A, B = 4, C = 'c', D = -1, E = A | B }";
        let DtsItem::Enum(e) = first(src) else {
            panic!("expected enum");
        };
        assert!(e.modifiers.export);
        assert_eq!(e.members.len(), 5);
        assert_eq!(e.members[0].init, None);
        assert_eq!(e.members[1].init, Some(EnumInit::Number("4".into())));
        assert_eq!(e.members[2].init, Some(EnumInit::String("c".into())));
        assert_eq!(e.members[3].init, Some(EnumInit::Number("-1".into())));
        assert_eq!(e.members[4].init, Some(EnumInit::Expr("A | B".into())));
    }

    #[test]
    fn test_parse_imports() {
        let src = r#"
            import { AsyncCallback, Callback as Cb } from './@ohos.base';
            import image from '@ohos.multimedia.image';
            import * as ns from "./ns";
            import type { Want } from './@ohos.app.ability.Want';
            import Ctx, { Element } from 'ctx';
        "#;
        let file = parse(src).unwrap();
        assert_eq!(file.items.len(), 5);

        let DtsItem::Import(named) = &file.items[0] else {
            panic!("expected import");
        };
        assert_eq!(named.path, "./@ohos.base");
        assert_eq!(named.named[1].local(), "Cb");

        let DtsItem::Import(default) = &file.items[1] else {
            panic!("expected import");
        };
        assert_eq!(default.default.as_deref(), Some("image"));

        let DtsItem::Import(star) = &file.items[2] else {
            panic!("expected import");
        };
        assert_eq!(star.namespace.as_deref(), Some("ns"));

        let DtsItem::Import(typed) = &file.items[3] else {
            panic!("expected import");
        };
        assert!(typed.type_only);

        let DtsItem::Import(mixed) = &file.items[4] else {
            panic!("expected import");
        };
        assert_eq!(mixed.default.as_deref(), Some("Ctx"));
        assert_eq!(mixed.named[0].name, "Element");
    }

    #[test]
    fn test_parse_import_equals() {
        let file = parse("import fs = require('fs');\nnamespace N { import A = B.C; }").unwrap();
        let DtsItem::ImportEquals(req) = &file.items[0] else {
            panic!("expected import equals");
        };
        assert_eq!(req.target, ImportEqualsTarget::Require("fs".into()));

        let DtsItem::Module(m) = &file.items[1] else {
            panic!("expected module");
        };
        let body = m.body.as_ref().unwrap();
        assert!(matches!(
            &body[0],
            DtsItem::ImportEquals(DtsImportEquals { target: ImportEqualsTarget::Entity(e), .. }) if e == "B.C"
        ));
    }

    #[test]
    fn test_dotted_namespace_nests() {
        let DtsItem::Module(outer) = first("declare namespace A.B { function f(): void; }") else {
            panic!("expected module");
        };
        assert_eq!(outer.name, ModuleName::Ident("A".into()));
        let body = outer.body.unwrap();
        let DtsItem::Module(inner) = &body[0] else {
            panic!("expected nested module");
        };
        assert_eq!(inner.name.as_str(), "B");
        assert!(inner.modifiers.export);
        assert_eq!(inner.body.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_ambient_module_and_shorthand() {
        let file = parse("declare module 'foo' { export const x: number; }\ndeclare module 'bar';").unwrap();
        let DtsItem::Module(foo) = &file.items[0] else {
            panic!("expected module");
        };
        assert!(foo.name.is_ambient());
        let DtsItem::Module(bar) = &file.items[1] else {
            panic!("expected module");
        };
        assert!(bar.body.is_none());
    }

    #[test]
    fn test_export_forms() {
        let src = r#"
            export default Foo;
            export = bar;
            export { a, b as c } from './x';
            export * from './y';
            export type { T };
            export as namespace Lib;
        "#;
        let items = parse(src).unwrap().items;
        assert_eq!(items[0], DtsItem::Export(DtsExport::Default("Foo".into())));
        assert_eq!(items[1], DtsItem::Export(DtsExport::Equals("bar".into())));
        assert!(matches!(&items[2], DtsItem::Export(DtsExport::Named { from: Some(p), .. }) if p == "./x"));
        assert!(matches!(&items[3], DtsItem::Export(DtsExport::All { alias: None, from }) if from == "./y"));
        assert!(matches!(&items[4], DtsItem::Export(DtsExport::Named { type_only: true, .. })));
        assert_eq!(items[5], DtsItem::Export(DtsExport::AsNamespace("Lib".into())));
    }

    #[test]
    fn test_export_default_class() {
        let DtsItem::Class(c) = first("export default class Ability extends Base { onCreate(): void; }") else {
            panic!("expected class");
        };
        assert!(c.modifiers.export && c.modifiers.default);
        assert_eq!(c.name, "Ability");
        assert!(c.extends.is_some());
    }

    #[test]
    fn test_class_members() {
        let src = r#"
            declare class Server {
                constructor(options?: ServerOptions);
                static create(): Server;
                private readonly id: string;
                get size(): number;
                set size(v: number);
                [Symbol.iterator](): IterableIterator<string>;
                [key: string]: any;
            }
        "#;
        let DtsItem::Class(c) = first(src) else {
            panic!("expected class");
        };
        assert_eq!(c.members.len(), 6);
        assert!(matches!(c.members[0], ClassMember::Constructor(_)));
        assert!(matches!(&c.members[1], ClassMember::Method(m) if m.is_static));
        assert!(matches!(&c.members[3], ClassMember::Property(p) if p.name.text == "size"));
        assert!(matches!(
            &c.members[4],
            ClassMember::Method(m) if m.name.computed && m.name.text == "Symbol.iterator"
        ));
        assert!(matches!(c.members[5], ClassMember::IndexSignature(_)));
    }

    #[test]
    fn test_interface_members() {
        let src = r#"
            interface Person {
                readonly name: string;
                age?: number;
                greet(msg: string): void;
                (x: number): string;
                new (x: number): Person;
                readonly: boolean;
            }
        "#;
        let DtsItem::Interface(i) = first(src) else {
            panic!("expected interface");
        };
        assert_eq!(i.members.len(), 6);
        assert!(matches!(&i.members[0], InterfaceMember::Property(p) if p.readonly));
        assert!(matches!(i.members[3], InterfaceMember::CallSignature(_)));
        assert!(matches!(i.members[4], InterfaceMember::ConstructSignature(_)));
        assert!(matches!(&i.members[5], InterfaceMember::Property(p) if p.name.text == "readonly"));
    }

    #[test]
    fn test_parse_import_type() {
        let src = "type Ctx = import('../application/Context').default;";
        let DtsItem::TypeAlias(t) = first(src) else {
            panic!("expected type alias");
        };
        assert_eq!(
            t.ty.ty,
            DtsType::Import {
                path: "../application/Context".into(),
                qualifier: vec!["default".into()],
                type_args: vec![],
            }
        );
    }

    #[test]
    fn test_parse_qualified_and_function_types() {
        let src = "type H = (err: BusinessError, data: image.PixelMap) => void;";
        let DtsItem::TypeAlias(t) = first(src) else {
            panic!("expected type alias");
        };
        let DtsType::Function(f) = &t.ty.ty else {
            panic!("expected function type");
        };
        assert_eq!(f.params.len(), 2);
        assert!(matches!(
            &f.params[1].ty.as_ref().unwrap().ty,
            DtsType::Named { name, .. } if name == "image.PixelMap"
        ));
    }

    #[test]
    fn test_parse_union_with_literals() {
        let DtsItem::TypeAlias(t) = first("type R = 'a' | 'b' | 3 | -1;") else {
            panic!("expected type alias");
        };
        let DtsType::Union(types) = &t.ty.ty else {
            panic!("expected union");
        };
        assert_eq!(types.len(), 4);
        assert_eq!(types[3], DtsType::NumberLiteral("-1".into()));
    }

    #[test]
    fn test_parse_mapped_and_conditional() {
        let src = "type P<T> = { readonly [K in keyof T]?: T[K] };\ntype C<T> = T extends string ? 'a' : 'b';";
        let items = parse(src).unwrap().items;
        assert!(matches!(&items[0], DtsItem::TypeAlias(t) if matches!(t.ty.ty, DtsType::Mapped { .. })));
        assert!(matches!(&items[1], DtsItem::TypeAlias(t) if matches!(t.ty.ty, DtsType::Conditional { .. })));
    }

    #[test]
    fn test_parse_variables() {
        let DtsItem::Variable(v) = first("declare const a: number, b: string, VERSION = '1.0';") else {
            panic!("expected variable");
        };
        assert_eq!(v.kind, VariableKind::Const);
        assert_eq!(v.declarators.len(), 3);
        assert_eq!(v.declarators[2].init.as_deref(), Some("'1.0'"));
    }

    #[test]
    fn test_references_are_collected() {
        let src = "/// <reference path=\"../component/common.d.ts\" />\ndeclare function f(): void;";
        let file = parse(src).unwrap();
        assert_eq!(file.references, vec![Reference::Path("../component/common.d.ts".into())]);
        assert_eq!(file.items.len(), 1);
    }

    #[test]
    fn test_unsupported_statement_is_kept_as_span() {
        let src = "declare function f(): void;\nfoo(bar);\ninterface A {}";
        let items = parse(src).unwrap().items;
        assert_eq!(items.len(), 3);
        let DtsItem::Unsupported(span) = items[1] else {
            panic!("expected unsupported statement");
        };
        assert_eq!(span.text(src), "foo(bar);");
    }

    #[test]
    fn test_decorators_are_skipped() {
        let src = "@Component\ndeclare class A { @State value: number; }";
        let DtsItem::Class(c) = first(src) else {
            panic!("expected class");
        };
        assert!(matches!(&c.members[0], ClassMember::Property(p) if p.name.text == "value"));
    }

    #[test]
    fn test_parse_error_position() {
        let err = parse("interface {").unwrap_err();
        assert_eq!(err.pos, 10);
        assert!(err.to_string().starts_with("parse error at 10"));
    }
}
