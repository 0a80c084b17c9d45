use super::lexer::{tokenize, Token};
use crate::error::ConfigError;

/// Cursor over a token stream that understands directive lines and nested
/// blocks.
///
/// The cursor starts before the first token; call [`Dispenser::next`] to load
/// the directive name, then walk its block with
/// `let n = d.nesting(); while d.next_block(n) { ... }`.
#[derive(Debug, Clone)]
pub struct Dispenser {
    tokens: Vec<Token>,
    cursor: isize,
    nesting: usize,
    file: String,
}

impl Dispenser {
    pub fn new(tokens: Vec<Token>, file: impl Into<String>) -> Self {
        Self {
            tokens,
            cursor: -1,
            nesting: 0,
            file: file.into(),
        }
    }

    /// Tokenize `input` and return a dispenser over it.
    pub fn parse(file: &str, input: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(tokenize(file, input)?, file))
    }

    /// Dispenser over an in-memory snippet, reported as `Testfile`.
    pub fn for_test(input: &str) -> Result<Self, ConfigError> {
        Self::parse("Testfile", input)
    }

    /// Advance to the next token regardless of line. Returns false at EOF.
    pub fn next(&mut self) -> bool {
        if self.cursor < self.tokens.len() as isize - 1 {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Advance to the next token only if it sits on the same line as the
    /// current one and is not an opening brace.
    pub fn next_arg(&mut self) -> bool {
        if !self.next_on_same_line() {
            return false;
        }
        if self.current().is_some_and(|t| t.is_brace() && t.text == "{") {
            self.cursor -= 1;
            return false;
        }
        true
    }

    /// Advance through the block opened on the current line, one directive
    /// line at a time. Returns false once the block belonging to
    /// `initial_nesting` has been closed, or when there is no block.
    pub fn next_block(&mut self, initial_nesting: usize) -> bool {
        if self.nesting > initial_nesting {
            if !self.next() {
                return false;
            }
            if let Some(tok) = self.current() {
                if tok.is_brace() {
                    if tok.text == "}" {
                        self.nesting -= 1;
                    } else {
                        self.nesting += 1;
                    }
                }
            }
            return self.nesting > initial_nesting;
        }

        if !self.next_on_same_line() {
            return false;
        }
        if !self.current().is_some_and(|t| t.is_brace() && t.text == "{") {
            self.cursor -= 1;
            return false;
        }
        self.next();
        if self.current().is_some_and(|t| t.is_brace() && t.text == "}") {
            return false;
        }
        self.nesting += 1;
        true
    }

    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// Text of the current token, or `""` before the first/after the last.
    pub fn val(&self) -> &str {
        self.current().map(|t| t.text.as_str()).unwrap_or("")
    }

    pub fn line(&self) -> usize {
        self.current().map(|t| t.line).unwrap_or(0)
    }

    /// Error for a directive that is missing its argument(s).
    pub fn arg_err(&self) -> ConfigError {
        self.err(format!(
            "wrong argument count or unexpected line ending after '{}'",
            self.val()
        ))
    }

    pub fn err(&self, message: impl Into<String>) -> ConfigError {
        ConfigError {
            file: self
                .current()
                .map(|t| t.file.to_string())
                .unwrap_or_else(|| self.file.clone()),
            line: self.line(),
            message: message.into(),
        }
    }

    fn current(&self) -> Option<&Token> {
        if self.cursor < 0 {
            return None;
        }
        self.tokens.get(self.cursor as usize)
    }

    fn next_on_same_line(&mut self) -> bool {
        if self.cursor < 0 {
            self.cursor += 1;
            return !self.tokens.is_empty();
        }
        let idx = self.cursor as usize;
        if idx + 1 >= self.tokens.len() {
            return false;
        }
        if self.tokens[idx].end_line == self.tokens[idx + 1].line
            && self.tokens[idx].file == self.tokens[idx + 1].file
        {
            self.cursor += 1;
            return true;
        }
        false
    }
}
