//! Syntax collaborator for the Fathom expression language
//!
//! This crate supplies everything the semantic-analysis core consumes from
//! the language side: UTF-16 positions and spans, the scanner and its
//! trivia-free snapshot, an id-indexed syntax tree built by an
//! error-tolerant parser, and best-effort structural type inference.
//!
//! The tree follows an arena-with-index shape: nodes are integer ids,
//! kinds and spans live in flat arenas, and parent/child relationships are
//! id-indexed maps. Consumers never hold node references, only ids.

pub mod error;
pub mod infer;
pub mod lexer;
pub mod parser;
pub mod text;
pub mod tree;
pub mod types;

pub use error::{ParseError, SyntaxError, SyntaxResult};
pub use infer::{infer_type, InferenceContext, TypeMap};
pub use lexer::{lex, Keyword, LexState, LexerSnapshot, Token, TokenKind};
pub use parser::{parse, ParseOutcome};
pub use text::{LineIndex, Position, Range, Span};
pub use tree::{BinaryOp, NodeId, NodeKind, SyntaxTree, UnaryOp};
pub use types::{FunctionSignature, ParameterSpec, Type};
