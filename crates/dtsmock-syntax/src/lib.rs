//! TypeScript declaration file (.d.ts) syntax for dtsmock.
//!
//! This crate provides a lexer and a recursive descent parser for ambient
//! declaration files. The resulting [`DtsFile`] keeps byte spans on every
//! declaration so later stages can recover the verbatim type text.

#![allow(clippy::collapsible_if, clippy::collapsible_else_if, clippy::manual_map)]

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, ParseError, ParseResult};
