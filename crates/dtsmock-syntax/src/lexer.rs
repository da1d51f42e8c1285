//! Lexer for TypeScript declaration files.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::ast::{Reference, Span};

/// Token kinds for TypeScript declaration files.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Identifiers and literals
    Ident(String),
    StringLiteral(String),
    NumberLiteral(String),
    /// Raw body of a template literal type, backticks excluded.
    TemplateLiteral(String),

    // Keywords
    Declare,
    Function,
    Interface,
    Class,
    Enum,
    Type,
    Namespace,
    Module,
    Export,
    Import,
    Const,
    Let,
    Var,
    Readonly,
    Extends,
    Implements,
    New,
    Typeof,
    Keyof,
    Infer,
    As,
    Is,
    From,
    Default,
    Static,
    Public,
    Private,
    Protected,
    Abstract,
    In,
    Out,
    This,

    // Primitive type keywords
    String_,
    Number_,
    Boolean_,
    Void_,
    Null_,
    Undefined_,
    Any_,
    Unknown_,
    Never_,
    Object_,
    Symbol_,
    BigInt_,
    True_,
    False_,

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    LAngle,    // <
    RAngle,    // >
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Dot,       // .
    DotDotDot, // ...
    Question,  // ?
    Pipe,      // |
    Amp,       // &
    Arrow,     // =>
    Eq,        // =
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    At,        // @

    /// `/// <reference path="..." />` or `/// <reference types="..." />`
    TripleSlashRef(Reference),
    Eof,
}

impl TokenKind {
    /// Source spelling of a keyword token, `None` for everything else.
    ///
    /// Property names and import specifiers accept any keyword, so the parser
    /// uses this to turn a keyword back into its identifier text.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Declare => "declare",
            TokenKind::Function => "function",
            TokenKind::Interface => "interface",
            TokenKind::Class => "class",
            TokenKind::Enum => "enum",
            TokenKind::Type => "type",
            TokenKind::Namespace => "namespace",
            TokenKind::Module => "module",
            TokenKind::Export => "export",
            TokenKind::Import => "import",
            TokenKind::Const => "const",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::Readonly => "readonly",
            TokenKind::Extends => "extends",
            TokenKind::Implements => "implements",
            TokenKind::New => "new",
            TokenKind::Typeof => "typeof",
            TokenKind::Keyof => "keyof",
            TokenKind::Infer => "infer",
            TokenKind::As => "as",
            TokenKind::Is => "is",
            TokenKind::From => "from",
            TokenKind::Default => "default",
            TokenKind::Static => "static",
            TokenKind::Public => "public",
            TokenKind::Private => "private",
            TokenKind::Protected => "protected",
            TokenKind::Abstract => "abstract",
            TokenKind::In => "in",
            TokenKind::Out => "out",
            TokenKind::This => "this",
            TokenKind::String_ => "string",
            TokenKind::Number_ => "number",
            TokenKind::Boolean_ => "boolean",
            TokenKind::Void_ => "void",
            TokenKind::Null_ => "null",
            TokenKind::Undefined_ => "undefined",
            TokenKind::Any_ => "any",
            TokenKind::Unknown_ => "unknown",
            TokenKind::Never_ => "never",
            TokenKind::Object_ => "object",
            TokenKind::Symbol_ => "symbol",
            TokenKind::BigInt_ => "bigint",
            TokenKind::True_ => "true",
            TokenKind::False_ => "false",
            _ => return None,
        };
        Some(text)
    }
}

fn keyword(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "declare" => TokenKind::Declare,
        "function" => TokenKind::Function,
        "interface" => TokenKind::Interface,
        "class" => TokenKind::Class,
        "enum" => TokenKind::Enum,
        "type" => TokenKind::Type,
        "namespace" => TokenKind::Namespace,
        "module" => TokenKind::Module,
        "export" => TokenKind::Export,
        "import" => TokenKind::Import,
        "const" => TokenKind::Const,
        "let" => TokenKind::Let,
        "var" => TokenKind::Var,
        "readonly" => TokenKind::Readonly,
        "extends" => TokenKind::Extends,
        "implements" => TokenKind::Implements,
        "new" => TokenKind::New,
        "typeof" => TokenKind::Typeof,
        "keyof" => TokenKind::Keyof,
        "infer" => TokenKind::Infer,
        "as" => TokenKind::As,
        "is" => TokenKind::Is,
        "from" => TokenKind::From,
        "default" => TokenKind::Default,
        "static" => TokenKind::Static,
        "public" => TokenKind::Public,
        "private" => TokenKind::Private,
        "protected" => TokenKind::Protected,
        "abstract" => TokenKind::Abstract,
        "in" => TokenKind::In,
        "out" => TokenKind::Out,
        "this" => TokenKind::This,
        "string" => TokenKind::String_,
        "number" => TokenKind::Number_,
        "boolean" => TokenKind::Boolean_,
        "void" => TokenKind::Void_,
        "null" => TokenKind::Null_,
        "undefined" => TokenKind::Undefined_,
        "any" => TokenKind::Any_,
        "unknown" => TokenKind::Unknown_,
        "never" => TokenKind::Never_,
        "object" => TokenKind::Object_,
        "symbol" => TokenKind::Symbol_,
        "bigint" => TokenKind::BigInt_,
        "true" => TokenKind::True_,
        "false" => TokenKind::False_,
        _ => return None,
    };
    Some(kind)
}

/// A token with its kind and byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Lexer for TypeScript declaration files.
pub struct Lexer<'src> {
    src: &'src str,
    chars: Peekable<CharIndices<'src>>,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        // A leading byte order mark is not part of the token stream.
        let skip = if src.starts_with('\u{feff}') { 3 } else { 0 };
        let mut chars = src.char_indices().peekable();
        if skip > 0 {
            chars.next();
        }
        Self {
            src,
            chars,
            pos: skip,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    break;
                }
                None => break,
                _ => {}
            }
        }
    }

    fn read_string(&mut self, quote: char) -> String {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('\\') => {
                    if let Some(escaped) = self.advance() {
                        match escaped {
                            'n' => s.push('\n'),
                            't' => s.push('\t'),
                            'r' => s.push('\r'),
                            '\\' => s.push('\\'),
                            '"' => s.push('"'),
                            '\'' => s.push('\''),
                            _ => {
                                s.push('\\');
                                s.push(escaped);
                            }
                        }
                    }
                }
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
                None => break,
            }
        }
        s
    }

    /// Template literal types keep their raw body; `${...}` holes may nest braces.
    fn read_template(&mut self) -> String {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    depth += 1;
                }
                Some('}') if depth > 0 => depth -= 1,
                Some('`') if depth == 0 => return self.src[start..self.pos - 1].to_string(),
                Some(_) => {}
                None => return self.src[start..self.pos].to_string(),
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while let Some(ch) = self.peek() {
            let exponent_sign = (ch == '-' || ch == '+') && matches!(s.chars().last(), Some('e' | 'E'));
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || exponent_sign {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        s
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        s
    }

    fn read_triple_slash_ref(&mut self) -> Option<Reference> {
        // "///" is already consumed; the directive runs to the end of the line.
        self.skip_whitespace_inline();
        let start = self.pos;
        self.skip_line_comment();
        let content = self.src[start..self.pos].trim();

        if !content.starts_with("<reference") {
            return None;
        }
        if let Some(path) = attribute(content, "path") {
            return Some(Reference::Path(path.to_string()));
        }
        attribute(content, "types").map(|types| Reference::Types(types.to_string()))
    }

    fn skip_whitespace_inline(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' {
                self.advance();
            } else {
                break;
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            let start = self.pos;

            let ch = match self.advance() {
                Some(c) => c,
                None => return Token::new(TokenKind::Eof, start, start),
            };

            let kind = match ch {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '<' => TokenKind::LAngle,
                '>' => TokenKind::RAngle,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                ':' => TokenKind::Colon,
                '?' => TokenKind::Question,
                '|' => TokenKind::Pipe,
                '&' => TokenKind::Amp,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '@' => TokenKind::At,
                '`' => TokenKind::TemplateLiteral(self.read_template()),
                '.' => {
                    if self.peek() == Some('.') {
                        self.advance();
                        if self.peek() == Some('.') {
                            self.advance();
                            TokenKind::DotDotDot
                        } else {
                            TokenKind::Dot
                        }
                    } else if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                        TokenKind::NumberLiteral(self.read_number('.'))
                    } else {
                        TokenKind::Dot
                    }
                }
                '=' => {
                    if self.peek() == Some('>') {
                        self.advance();
                        TokenKind::Arrow
                    } else {
                        TokenKind::Eq
                    }
                }
                '/' => {
                    if self.peek() == Some('/') {
                        self.advance();
                        if self.peek() == Some('/') {
                            self.advance();
                            match self.read_triple_slash_ref() {
                                Some(reference) => TokenKind::TripleSlashRef(reference),
                                None => continue,
                            }
                        } else {
                            self.skip_line_comment();
                            continue;
                        }
                    } else if self.peek() == Some('*') {
                        self.advance();
                        self.skip_block_comment();
                        continue;
                    } else {
                        TokenKind::Slash
                    }
                }
                '"' | '\'' => TokenKind::StringLiteral(self.read_string(ch)),
                c if c.is_ascii_digit() => TokenKind::NumberLiteral(self.read_number(c)),
                c if c.is_alphabetic() || c == '_' || c == '$' => {
                    let ident = self.read_ident(c);
                    keyword(&ident).unwrap_or(TokenKind::Ident(ident))
                }
                // `#private` markers, `!` and stray characters carry no declaration shape.
                _ => continue,
            };

            return Token::new(kind, start, self.pos);
        }
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

fn attribute<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let at = content.find(&format!("{name}="))?;
    let rest = &content[at + name.len() + 1..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    rest.find(quote).map(|end| &rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_function() {
        let tokens = kinds("declare function add(a: number, b: number): number;");

        assert_eq!(tokens[0], TokenKind::Declare);
        assert_eq!(tokens[1], TokenKind::Function);
        assert_eq!(tokens[2], TokenKind::Ident("add".to_string()));
        assert_eq!(tokens[3], TokenKind::LParen);
        assert_eq!(tokens[6], TokenKind::Number_);
    }

    #[test]
    fn test_enum_keyword() {
        let tokens = kinds("declare const enum Color { Red = 1 }");

        assert_eq!(tokens[0], TokenKind::Declare);
        assert_eq!(tokens[1], TokenKind::Const);
        assert_eq!(tokens[2], TokenKind::Enum);
        assert_eq!(tokens[3], TokenKind::Ident("Color".to_string()));
        assert_eq!(tokens[6], TokenKind::Eq);
        assert_eq!(tokens[7], TokenKind::NumberLiteral("1".to_string()));
    }

    #[test]
    fn test_triple_slash_reference() {
        let src = r#"/// <reference path="./types.d.ts" />
/// <reference types='node' />
declare function foo(): void;"#;
        let tokens = kinds(src);

        assert_eq!(
            tokens[0],
            TokenKind::TripleSlashRef(Reference::Path("./types.d.ts".to_string()))
        );
        assert_eq!(
            tokens[1],
            TokenKind::TripleSlashRef(Reference::Types("node".to_string()))
        );
        assert_eq!(tokens[2], TokenKind::Declare);
    }

    #[test]
    fn test_plain_triple_slash_comment_is_skipped() {
        let tokens = kinds("/// just a note\ninterface A {}");
        assert_eq!(tokens[0], TokenKind::Interface);
    }

    #[test]
    fn test_template_literal_type() {
        let tokens = kinds("type K = `on${Capitalize<E>}`;");
        assert_eq!(
            tokens[3],
            TokenKind::TemplateLiteral("on${Capitalize<E>}".to_string())
        );
        assert_eq!(tokens[4], TokenKind::Semicolon);
    }

    #[test]
    fn test_decorator_and_spans() {
        let tokens = Lexer::new("@Sendable class A {}").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::At);
        assert_eq!(tokens[1].kind, TokenKind::Ident("Sendable".to_string()));
        assert_eq!(tokens[2].span(), Span::new(10, 15));
    }

    #[test]
    fn test_negative_exponent_number() {
        let tokens = kinds("1e-3 0xFF");
        assert_eq!(tokens[0], TokenKind::NumberLiteral("1e-3".to_string()));
        assert_eq!(tokens[1], TokenKind::NumberLiteral("0xFF".to_string()));
    }

    #[test]
    fn test_keyword_text_round_trips() {
        assert_eq!(TokenKind::Enum.keyword_text(), Some("enum"));
        assert_eq!(TokenKind::False_.keyword_text(), Some("false"));
        assert_eq!(TokenKind::Comma.keyword_text(), None);
    }
}
