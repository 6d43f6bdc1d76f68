// src/lexer/mod.rs
pub mod dictionary;
pub mod reader;
pub mod scan;
pub mod tokens;

pub use dictionary::KeywordDictionary;
pub use reader::{BUFFER_SIZE, Lexeme, LexemeClass, ReadError, SourceReader};
pub use scan::{LexError, LexErrorKind, Lexer};
pub use tokens::{N_KINDS, Token, TokenKind};
