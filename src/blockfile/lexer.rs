//! Tokenizer for the block-structured configuration format.
//!
//! Tokens are separated by whitespace. Double-quoted tokens may contain
//! whitespace and `\"` escapes; backtick-quoted tokens are taken literally.
//! A `#` at the start of a token starts a comment running to the end of the
//! line. Braces are ordinary characters, so `{` and `}` only act as block
//! delimiters when they stand alone (`{env.TOKEN}` stays a single word).

use std::sync::Arc;

use crate::error::ConfigError;

/// A single lexical token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub file: Arc<str>,
    /// Line the token starts on (1-based).
    pub line: usize,
    /// Line the token ends on. Differs from `line` only for quoted tokens
    /// spanning newlines.
    pub end_line: usize,
    pub text: String,
    pub quoted: bool,
}

impl Token {
    /// True when this token opens or closes a block.
    pub fn is_brace(&self) -> bool {
        !self.quoted && (self.text == "{" || self.text == "}")
    }
}

pub fn tokenize(file: &str, input: &str) -> Result<Vec<Token>, ConfigError> {
    let file: Arc<str> = Arc::from(file);
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
            continue;
        }
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
            continue;
        }

        let start = line;
        let mut text = String::new();
        let mut quoted = false;

        if c == '"' || c == '`' {
            let quote = c;
            quoted = true;
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == quote {
                    closed = true;
                    break;
                }
                if c == '\\' && quote == '"' {
                    if let Some(&escaped) = chars.peek() {
                        if escaped == '"' || escaped == '\\' {
                            text.push(escaped);
                            chars.next();
                            continue;
                        }
                    }
                }
                if c == '\n' {
                    line += 1;
                }
                text.push(c);
            }
            if !closed {
                return Err(ConfigError {
                    file: file.to_string(),
                    line: start,
                    message: "unterminated quoted string".to_string(),
                });
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
        }

        tokens.push(Token {
            file: file.clone(),
            line: start,
            end_line: line,
            text,
            quoted,
        });
    }

    Ok(tokens)
}
