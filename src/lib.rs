//! # Asthra Compiler Front-End
//!
//! Lexer, parser, and semantic analyzer for the Asthra programming
//! language: source text goes in, a validated and fully typed AST
//! comes out.
//!
//! ## Pipeline
//!
//! ```text
//! Source -> Lexer -> Parser -> AST -> Semantic Analysis -> Typed AST
//! ```
//!
//! The parser drives the lexer one token at a time and recovers from
//! syntax errors so a single run reports everything it can find.
//! Semantic analysis then makes two passes over the AST: the first
//! registers every top-level declaration so bodies may reference
//! declarations in any order, the second type-checks every function
//! body. Both stages report through the same [`Diagnostic`] type.
//!
//! ## Quick Start
//!
//! ### Lexing Source Code
//!
//! ```rust
//! use asthrac::Lexer;
//!
//! let source = "let x: i32 = 42;";
//! let lexer = Lexer::new(source);
//!
//! for token in lexer {
//!     println!("{:?}", token.kind);
//! }
//! ```
//!
//! ### Parsing Source Code
//!
//! ```rust
//! use asthrac::Parser;
//!
//! let source = r#"
//! package demo;
//!
//! pub fn main(none) -> void {
//!     log("hello");
//!     return ();
//! }
//! "#;
//!
//! let mut parser = Parser::new(source);
//! match parser.parse_program() {
//!     Ok(program) => {
//!         println!("parsed {} declarations", program.declarations.len());
//!     }
//!     Err(errors) => {
//!         for error in errors {
//!             eprintln!("error: {}", error.message);
//!         }
//!     }
//! }
//! ```
//!
//! ### Analyzing a Program
//!
//! ```rust
//! use asthrac::{sema, Parser};
//!
//! let source = r#"
//! package demo;
//!
//! pub fn main(none) -> void {
//!     let total: i32 = 2 + 40;
//!     log("computed");
//!     return ();
//! }
//! "#;
//!
//! let mut parser = Parser::new(source);
//! let program = parser.parse_program().expect("parse errors");
//! let analyzed =
//!     sema::analyze_program(&program, parser.take_interner()).expect("type errors");
//! assert!(analyzed.symbols.lookup("main").is_some());
//! ```
//!
//! ### Error Handling
//!
//! Diagnostics carry error codes, optional suggestions, and source
//! spans; [`DiagnosticEmitter`] renders them against the original
//! source:
//!
//! ```rust
//! use asthrac::{diagnostics::DiagnosticEmitter, Parser};
//!
//! let source = "package demo;\n\npub fn broken( {}";
//! let mut parser = Parser::new(source);
//!
//! if let Err(errors) = parser.parse_program() {
//!     let emitter = DiagnosticEmitter::new("demo.asthra", source);
//!     for error in &errors {
//!         emitter.emit(error);
//!     }
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`ast`] - Abstract Syntax Tree types
//! - [`diagnostics`] - Error reporting infrastructure
//! - [`lexer`] - Tokenization (lexical analysis)
//! - [`parser`] - Parsing (syntax analysis)
//! - [`sema`] - Semantic analysis (symbols, types, exhaustiveness)
//! - [`span`] - Source location tracking

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod sema;
pub mod span;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, DiagnosticEmitter, DiagnosticKind, ErrorCode};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use sema::{analyze_program, AnalyzedProgram};
pub use span::{LineIndex, Span, Spanned};
