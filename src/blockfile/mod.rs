//! Reader for the host's block-structured configuration text.
//!
//! ```text
//! knownagents {
//!     access_token {env.KNOWNAGENTS_TOKEN}
//!     robots_txt {
//!         agent_types "AI Assistant" "AI Data Scraper"
//!         disallow /
//!     }
//! }
//! ```
//!
//! The lexer only knows words, quotes and comments; block structure is
//! interpreted by the [`Dispenser`] as directives walk it.

mod dispenser;
mod lexer;

pub use dispenser::Dispenser;
pub use lexer::{tokenize, Token};

use crate::error::ConfigError;

/// Split a configuration source into one dispenser per top-level directive
/// (a directive line plus its block, if any).
pub fn split_directives(file: &str, input: &str) -> Result<Vec<Dispenser>, ConfigError> {
    let tokens = tokenize(file, input)?;
    let mut segments = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut depth = 0usize;

    for tok in tokens {
        let starts_directive = depth == 0
            && current
                .last()
                .is_some_and(|prev| prev.end_line != tok.line && !tok.is_brace());
        if starts_directive {
            segments.push(Dispenser::new(std::mem::take(&mut current), file));
        }
        if tok.is_brace() {
            if tok.text == "{" {
                depth += 1;
            } else if depth == 0 {
                return Err(ConfigError {
                    file: file.to_string(),
                    line: tok.line,
                    message: "unexpected '}'".to_string(),
                });
            } else {
                depth -= 1;
            }
        }
        current.push(tok);
    }

    if depth > 0 {
        let line = current.last().map(|t| t.line).unwrap_or(0);
        return Err(ConfigError {
            file: file.to_string(),
            line,
            message: "unexpected EOF: unclosed block".to_string(),
        });
    }
    if !current.is_empty() {
        segments.push(Dispenser::new(current, file));
    }
    Ok(segments)
}
