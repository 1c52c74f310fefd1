//! A module implementing lexical analysis (tokenization) of a command line.
//!
//! The line is split on delimiter characters. A chunk that starts with a quote
//! character keeps absorbing the following chunks until one ends with the same
//! quote character; the quotes are then stripped and the absorbed delimiters are
//! replaced by single spaces.

use std::fmt;

/// Characters that separate one token from the next: space, tab, carriage return,
/// newline and bell.
const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

/// The kind of quote that opened a quoted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    /// `'`
    Single,
    /// `"`
    Double,
}

impl Quote {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '\'' => Some(Quote::Single),
            '"' => Some(Quote::Double),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote of the given kind was not found before the end of the line.
    UnfinishedQuote(Quote),
}

impl fmt::Display for LexingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexingError::UnfinishedQuote(Quote::Double) => {
                write!(f, "missing closing '\"'. Input invalid.")
            }
            LexingError::UnfinishedQuote(Quote::Single) => {
                write!(f, "missing closing \"'\". Input invalid.")
            }
        }
    }
}

impl std::error::Error for LexingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingQuoted(Quote),
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    // A delimiter run was crossed inside a quoted token and still has to be
    // written out as a single space.
    pending_space: bool,
}

fn is_delimiter(ch: char) -> bool {
    DELIMITERS.contains(&ch)
}

impl LexingFSM {
    /// Creates a new instance of the lexical analysis Finite State Machine.
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            pending_space: false,
        }
    }

    /// Runs the machine over the whole input and returns the tokens in input order.
    fn make_tokens(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingQuoted(quote) => self.handle_quoted(ch, quote, &mut out),
            }
        }

        match self.state {
            LexingState::ReadingQuoted(quote) => Err(LexingError::UnfinishedQuote(quote)),
            LexingState::ReadingWord => {
                out.push(std::mem::take(&mut self.buffer));
                Ok(out)
            }
            LexingState::Start => Ok(out),
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    /// True when the next character ends the current chunk.
    fn at_chunk_end(&self) -> bool {
        self.peek_char().is_none_or(is_delimiter)
    }

    fn handle_start(&mut self, ch: char) {
        if is_delimiter(ch) {
            return;
        }
        match Quote::from_char(ch) {
            Some(quote) => {
                self.pending_space = false;
                self.state = LexingState::ReadingQuoted(quote);
            }
            None => {
                self.buffer.push(ch);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) {
        if is_delimiter(ch) {
            out.push(std::mem::take(&mut self.buffer));
            self.state = LexingState::Start;
        } else {
            self.buffer.push(ch);
        }
    }

    fn handle_quoted(&mut self, ch: char, quote: Quote, out: &mut Vec<String>) {
        if is_delimiter(ch) {
            self.pending_space = true;
            return;
        }
        if std::mem::take(&mut self.pending_space) {
            self.buffer.push(' ');
        }
        if ch == quote.as_char() && self.at_chunk_end() {
            out.push(std::mem::take(&mut self.buffer));
            self.state = LexingState::Start;
        } else {
            self.buffer.push(ch);
        }
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Returns the tokens of `line` in input order, or a [`LexingError`] when a quoted
/// token is never closed. An empty or all-whitespace line yields no tokens.
pub fn split_into_tokens(line: &str) -> Result<Vec<String>, LexingError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}
