//! Parsing of Makefile-style depfiles, as emitted by C compilers through
//! `-MF`: one target, a colon, dependency paths, with `\` escapes and
//! backslash-newline continuations.
//!
//! The input is consumed as a byte stream so the read end of the depfile
//! FIFO can be drained while the writing process is still running.

use crate::error::{Error, Result};
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Str(String),
    Colon,
    Newline,
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Str(text) => format!("string `{text}`"),
            Token::Colon => "colon operator".to_string(),
            Token::Newline => "newline".to_string(),
            Token::End => "end of stream".to_string(),
        }
    }
}

/// Splits a byte stream into tokens, reading through a fixed-size buffer.
struct Tokenizer<R: Read> {
    reader: BufReader<R>,
    pending: Option<u8>,
}

impl<R: Read> Tokenizer<R> {
    fn new(input: R) -> Self {
        Tokenizer {
            reader: BufReader::with_capacity(1 << 12, input),
            pending: None,
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.pending.take() {
            return Ok(Some(byte));
        }
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::DepfileParse(format!("read failed: {err}"))),
            }
        }
    }

    fn unread(&mut self, byte: u8) {
        self.pending = Some(byte);
    }

    fn next(&mut self) -> Result<Token> {
        let mut text: Vec<u8> = Vec::new();
        loop {
            let byte = match self.read_byte()? {
                Some(byte) => byte,
                None => break,
            };
            match byte {
                b' ' | b'\t' | b'\r' => {
                    if !text.is_empty() {
                        break;
                    }
                }
                b'\n' => {
                    if text.is_empty() {
                        return Ok(Token::Newline);
                    }
                    self.unread(byte);
                    break;
                }
                b':' => {
                    if text.is_empty() {
                        return Ok(Token::Colon);
                    }
                    self.unread(byte);
                    break;
                }
                b'\\' => match self.read_byte()? {
                    None => {
                        return Err(Error::DepfileParse(
                            "unexpected end of stream after `\\`".to_string(),
                        ))
                    }
                    // Line continuation, equivalent to a space.
                    Some(b'\n') => {
                        if !text.is_empty() {
                            break;
                        }
                    }
                    Some(escaped) => text.push(escaped),
                },
                byte => text.push(byte),
            }
        }
        if text.is_empty() {
            Ok(Token::End)
        } else {
            Ok(Token::Str(String::from_utf8_lossy(&text).into_owned()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadTarget,
    ReadColon,
    ReadDep,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepfileData {
    pub target_path: String,
    pub dependency_paths: Vec<String>,
}

/// Parse a depfile stream.  An empty stream carries no data, which is not an
/// error: a tool that discovers no dependencies writes nothing.
pub fn parse<R: Read>(input: R) -> Result<Option<DepfileData>> {
    let mut tokenizer = Tokenizer::new(input);
    let mut state = State::ReadTarget;
    let mut data = DepfileData::default();
    loop {
        let token = tokenizer.next()?;
        match (state, token) {
            (State::ReadTarget, Token::Str(target)) => {
                data.target_path = target;
                state = State::ReadColon;
            }
            (State::ReadTarget, Token::Newline) => {}
            (State::ReadTarget, Token::End) => return Ok(None),
            (State::ReadColon, Token::Colon) => state = State::ReadDep,
            (State::ReadDep, Token::Str(dep)) => data.dependency_paths.push(dep),
            (State::ReadDep, Token::Newline) => state = State::Done,
            (State::ReadDep | State::Done, Token::End) => return Ok(Some(data)),
            (State::Done, Token::Newline) => {}
            (_, token) => {
                return Err(Error::DepfileParse(format!(
                    "unexpected {}",
                    token.describe()
                )))
            }
        }
    }
}

/// Parse the depfile at `path`, typically the read end of the FIFO.  Blocks
/// until every writer has closed its end.
pub fn read(path: &Path) -> Result<Option<DepfileData>> {
    let file = std::fs::File::open(path).map_err(Error::io(path))?;
    parse(file)
}
