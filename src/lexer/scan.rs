// src/lexer/scan.rs
// Turns raw lexemes into positioned tokens.

use std::{
    collections::VecDeque,
    io::{Read, Seek},
    sync::Arc,
    time::Duration,
};

use super::{
    dictionary::KeywordDictionary,
    reader::{BUFFER_SIZE, LexemeClass, ReadError, SourceReader},
    tokens::{PUNCTUATORS, Token, TokenKind},
};
use crate::budget::{Budget, Exhausted};

#[derive(Debug, thiserror::Error)]
pub enum LexErrorKind {
    #[error("malformed numeric literal `{lexeme}`: {reason}")]
    MalformedNumber {
        lexeme: String,
        reason: &'static str,
    },
    #[error("illegal character {0:?}")]
    IllegalCharacter(char),
    #[error("lexeme longer than {BUFFER_SIZE} bytes")]
    TooLong,
    #[error("read failed: {0}")]
    Read(std::io::Error),
    #[error("cancelled")]
    Cancelled,
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

#[derive(Debug, thiserror::Error)]
#[error("{file}:{line}:{column}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

pub fn split_int_suffix(s: &str) -> (&str, &str) {
    for suffix in ["uL", "UL", "u", "U", "L"] {
        if let Some(body) = s.strip_suffix(suffix) {
            return (body, suffix);
        }
    }
    (s, "")
}

/// Splits an integer literal (suffix already removed) into digits and radix.
pub fn split_radix(body: &str) -> (&str, u32) {
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (bin, 2)
    } else {
        (body, 10)
    }
}

/// Checks the shape of a digit-led lexeme.
pub fn validate_number(text: &str) -> Result<(), &'static str> {
    if let Some((whole, frac)) = text.split_once('.') {
        if frac.contains('.') {
            return Err("more than one `.`");
        }
        if frac.is_empty() {
            return Err("missing digits after `.`");
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err("float literals take decimal digits only");
        }
        return Ok(());
    }

    let (body, _) = split_int_suffix(text);
    let (digits, radix) = split_radix(body);
    if digits.is_empty() {
        return Err("missing digits after the radix prefix");
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err("digit out of range for the literal's radix");
    }
    Ok(())
}

/// Per-file lexer; yields tokens ending with a single `Eof`.
pub struct Lexer<'d, R> {
    reader: SourceReader<R>,
    dictionary: &'d KeywordDictionary,
    file: Arc<str>,
    budget: Budget,
    line: u32,
    column: u32,
    queued: VecDeque<Token>,
    done: bool,
}

impl<'d, R: Read + Seek> Lexer<'d, R> {
    pub fn new(reader: SourceReader<R>, dictionary: &'d KeywordDictionary, file: Arc<str>) -> Self {
        Self {
            reader,
            dictionary,
            file,
            budget: Budget::unlimited(),
            line: 1,
            column: 1,
            queued: VecDeque::new(),
            done: false,
        }
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        self.collect()
    }

    fn error(&self, kind: LexErrorKind, column: u32) -> LexError {
        LexError {
            kind,
            file: self.file.clone(),
            line: self.line,
            column,
        }
    }

    fn read_failure(&self, e: ReadError) -> LexError {
        let kind = match e {
            ReadError::LexemeTooLong => LexErrorKind::TooLong,
            ReadError::Io(e) => LexErrorKind::Read(e),
        };
        self.error(kind, self.column)
    }

    fn token(&self, kind: TokenKind, lexeme: &str, column: u32) -> Token {
        Token::new(kind, lexeme, self.file.clone(), self.line, column)
    }

    fn skip_whitespace(&mut self, newlines: u32, indent: u32) {
        if newlines > 0 {
            self.line += newlines;
            self.column = 1 + indent;
        } else {
            self.column += indent;
        }
    }

    /// Pulls lexemes until at least one token is queued.
    fn fill(&mut self) -> Result<(), LexError> {
        while self.queued.is_empty() {
            if let Err(e) = self.budget.check() {
                let kind = match e {
                    Exhausted::Cancelled => LexErrorKind::Cancelled,
                    Exhausted::Deadline(d) => LexErrorKind::DeadlineExceeded(d),
                };
                return Err(self.error(kind, self.column));
            }

            let lexeme = match self.reader.next() {
                Ok(Some(lx)) => lx,
                Ok(None) => {
                    let (newlines, indent) = self.reader.tail();
                    self.skip_whitespace(newlines, indent);
                    let eof = self.token(TokenKind::Eof, "", self.column);
                    self.queued.push_back(eof);
                    self.done = true;
                    return Ok(());
                }
                Err(e) => return Err(self.read_failure(e)),
            };

            let (newlines, indent) = (lexeme.newlines, lexeme.indent);
            let width = lexeme.bytes.len() as u32;
            let class = lexeme.class;
            let text = String::from_utf8_lossy(lexeme.bytes).into_owned();
            self.skip_whitespace(newlines, indent);
            let start = self.column;
            self.column += width;

            match class {
                LexemeClass::Word => {
                    let kind = if self.dictionary.contains(&text) {
                        TokenKind::keyword(&text).unwrap_or(TokenKind::Ident)
                    } else {
                        TokenKind::Ident
                    };
                    self.queued.push_back(self.token(kind, &text, start));
                }
                LexemeClass::Number => {
                    if let Err(reason) = validate_number(&text) {
                        let kind = LexErrorKind::MalformedNumber {
                            lexeme: text,
                            reason,
                        };
                        return Err(self.error(kind, start));
                    }
                    self.queued.push_back(self.token(TokenKind::Number, &text, start));
                }
                LexemeClass::Symbol => self.split_symbols(&text, start)?,
            }
        }
        Ok(())
    }

    /// Maximal munch over the punctuator table; `//` ends the line.
    fn split_symbols(&mut self, run: &str, start: u32) -> Result<(), LexError> {
        let mut rest = run;
        let mut column = start;
        while !rest.is_empty() {
            if rest.starts_with("//") {
                return self.reader.skip_line().map_err(|e| self.read_failure(e));
            }
            let Some(&(text, kind)) = PUNCTUATORS.iter().find(|(p, _)| rest.starts_with(p)) else {
                let ch = rest.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(self.error(LexErrorKind::IllegalCharacter(ch), column));
            };
            self.queued.push_back(self.token(kind, text, column));
            rest = &rest[text.len()..];
            column += text.len() as u32;
        }
        Ok(())
    }
}

impl<R: Read + Seek> Iterator for Lexer<'_, R> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.queued.is_empty() && !self.done {
            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.queued.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn lex(src: &str) -> Result<Vec<Token>, LexError> {
        let dict = KeywordDictionary::with_keywords();
        let reader = SourceReader::new(Cursor::new(src.as_bytes().to_vec()));
        Lexer::new(reader, &dict, Arc::from("t.src")).tokenize()
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("var count: int = 0;"),
            [Var, Ident, Colon, Int, Assign, Number, Semi, Eof]
        );
        // digits keep a word out of the dictionary
        assert_eq!(kinds("int2 returned"), [Ident, Ident, Eof]);
    }

    #[test]
    fn symbol_runs_split_by_longest_match() {
        use TokenKind::*;
        assert_eq!(kinds("a<=b"), [Ident, Le, Ident, Eof]);
        assert_eq!(kinds("f();"), [Ident, LParen, RParen, Semi, Eof]);
        assert_eq!(kinds("x==-1"), [Ident, EqEq, Minus, Number, Eof]);
        assert_eq!(kinds("){"), [RParen, LBrace, Eof]);
    }

    #[test]
    fn positions_are_one_based() {
        let toks = lex("func f\n  x = 12;").unwrap();
        let pos: Vec<(u32, u32)> = toks.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(pos, [(1, 1), (1, 6), (2, 3), (2, 5), (2, 7), (2, 9), (2, 10)]);
        assert_eq!(toks[0].file.as_ref(), "t.src");
    }

    #[test]
    fn line_comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = 1; // set x = 2;\ny"),
            [Ident, Assign, Number, Semi, Ident, Eof]
        );
        assert_eq!(kinds("a;//tail"), [Ident, Semi, Eof]);
    }

    #[test]
    fn numeric_literal_shapes() {
        for ok in ["0", "123", "0x1F", "0XbeefL", "0b1011", "7u", "9UL", "3.25"] {
            assert_eq!(validate_number(ok), Ok(()), "{ok}");
        }
        for bad in ["12.", "0x", "1.2.3", "0b12", "1x2", "1.5u", "12LL"] {
            assert!(validate_number(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn unterminated_number_reports_position() {
        let err = lex("var x: float =\n    12.;").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::MalformedNumber { .. }));
        assert_eq!((err.line, err.column), (2, 5));
        assert_eq!(err.to_string(), "t.src:2:5: malformed numeric literal `12.`: missing digits after `.`");
    }

    #[test]
    fn illegal_character_reports_its_own_column() {
        let err = lex("x = a;@").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::IllegalCharacter('@')));
        assert_eq!((err.line, err.column), (1, 7));

        let err = lex("snake_case").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::IllegalCharacter('_')));
    }

    #[test]
    fn stops_after_first_error() {
        let dict = KeywordDictionary::with_keywords();
        let reader = SourceReader::new(Cursor::new(b"$ a b".to_vec()));
        let mut lexer = Lexer::new(reader, &dict, Arc::from("t.src"));
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn cancelled_budget_fails_the_file() {
        use std::sync::atomic::AtomicBool;
        let dict = KeywordDictionary::with_keywords();
        let reader = SourceReader::new(Cursor::new(b"a b c".to_vec()));
        let budget = Budget::new(Arc::new(AtomicBool::new(true)), None);
        let err = Lexer::new(reader, &dict, Arc::from("t.src"))
            .with_budget(budget)
            .tokenize()
            .unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::Cancelled));
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), [TokenKind::Eof]);
        assert_eq!(kinds("  // nothing\n"), [TokenKind::Eof]);
    }

    #[test]
    fn long_comments_do_not_hit_the_buffer_limit() {
        use TokenKind::*;
        let src = format!("x = 1; //{}\ny;", "z".repeat(BUFFER_SIZE + 10));
        let toks = lex(&src).unwrap();
        let got: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(got, [Ident, Assign, Number, Semi, Ident, Semi, Eof]);
        assert_eq!((toks[4].line, toks[4].column), (2, 1));
    }

    #[test]
    fn eof_sits_after_trailing_whitespace() {
        let toks = lex("var x: int\n\n  ").unwrap();
        let eof = toks.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!((eof.line, eof.column), (3, 3));

        let toks = lex("a; // done\n").unwrap();
        let eof = toks.last().unwrap();
        assert_eq!((eof.line, eof.column), (2, 1));
    }
}
