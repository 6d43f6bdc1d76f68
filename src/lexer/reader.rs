// src/lexer/reader.rs
// Byte-at-a-time source reader that cuts the input into raw lexemes.
//
// Every reader owns one fixed buffer that is reused for every lexeme, so a
// batch with many files in flight keeps a predictable footprint.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Seek},
    path::Path,
};

/// 32 KiB - 1: the longest lexeme a reader can hold.
pub const BUFFER_SIZE: usize = 0x7fff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeClass {
    /// letter-led run of letters and digits
    Word,
    /// digit-led run of digits and literal markers
    Number,
    /// run of bytes that are neither alphanumeric nor whitespace
    Symbol,
}

/// A raw lexeme borrowed from the reader's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub class: LexemeClass,
    pub bytes: &'a [u8],
    /// newlines skipped right before this lexeme
    pub newlines: u32,
    /// bytes skipped after the last skipped newline
    pub indent: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error("lexeme longer than {BUFFER_SIZE} bytes")]
    LexemeTooLong,
}

#[inline]
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

#[inline]
fn is_number_marker(b: u8) -> bool {
    matches!(b, b'x' | b'X' | b'b' | b'B' | b'u' | b'U' | b'L' | b'.')
}

fn classify(b: u8) -> LexemeClass {
    if b.is_ascii_alphabetic() {
        LexemeClass::Word
    } else if b.is_ascii_digit() {
        LexemeClass::Number
    } else {
        LexemeClass::Symbol
    }
}

fn continues(class: LexemeClass, b: u8, so_far: &[u8]) -> bool {
    match class {
        LexemeClass::Word => b.is_ascii_alphanumeric(),
        LexemeClass::Number => {
            let hex = matches!(so_far, [b'0', b'x' | b'X', ..]);
            b.is_ascii_digit() || is_number_marker(b) || (hex && b.is_ascii_hexdigit())
        }
        // `//` ends a run; the lexer drops the rest of the line
        LexemeClass::Symbol => {
            !b.is_ascii_alphanumeric() && !is_space(b) && !so_far.ends_with(b"//")
        }
    }
}

pub struct SourceReader<R> {
    input: BufReader<R>,
    buffer: Box<[u8]>,
    pointer: usize,
    eof: bool,
    /// newlines and indent skipped before the end of input
    tail: (u32, u32),
}

impl SourceReader<File> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read + Seek> SourceReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            input: BufReader::new(inner),
            buffer: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            pointer: 0,
            eof: false,
            tail: (0, 0),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Whitespace between the last lexeme and the end of input, as
    /// `(newlines, indent)`. Meaningful once `next` has returned `None`.
    pub fn tail(&self) -> (u32, u32) {
        self.tail
    }

    /// Discards the rest of the current line, leaving its newline unread.
    pub fn skip_line(&mut self) -> Result<(), ReadError> {
        loop {
            match self.read_byte()? {
                None => {
                    self.eof = true;
                    return Ok(());
                }
                Some(b'\n') => {
                    self.input.seek_relative(-1)?;
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    /// Next raw lexeme, or `None` once the stream is exhausted.
    pub fn next(&mut self) -> Result<Option<Lexeme<'_>>, ReadError> {
        if self.eof {
            return Ok(None);
        }
        self.pointer = 0;

        let (mut newlines, mut indent) = (0u32, 0u32);
        let first = loop {
            match self.read_byte()? {
                None => {
                    self.eof = true;
                    self.tail = (newlines, indent);
                    return Ok(None);
                }
                Some(b'\n') => {
                    newlines += 1;
                    indent = 0;
                }
                Some(b) if is_space(b) => indent += 1,
                Some(b) => break b,
            }
        };

        let class = classify(first);
        self.push(first)?;
        loop {
            let Some(b) = self.read_byte()? else {
                self.eof = true;
                break;
            };
            if !continues(class, b, &self.buffer[..self.pointer]) {
                // leave the boundary byte for the next call
                self.input.seek_relative(-1)?;
                break;
            }
            self.push(b)?;
        }

        Ok(Some(Lexeme {
            class,
            bytes: &self.buffer[..self.pointer],
            newlines,
            indent,
        }))
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ReadError> {
        let byte = loop {
            match self.input.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if byte.is_some() {
            self.input.consume(1);
        }
        Ok(byte)
    }

    #[inline]
    fn push(&mut self, b: u8) -> Result<(), ReadError> {
        let slot = self
            .buffer
            .get_mut(self.pointer)
            .ok_or(ReadError::LexemeTooLong)?;
        *slot = b;
        self.pointer += 1;
        Ok(())
    }
}
