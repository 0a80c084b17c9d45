//! Host-side placeholder substitution for configuration values.
//!
//! Only `{env.NAME}` resolves to a value. Every other placeholder, and any
//! unset variable, is replaced with the empty string, so an access token that
//! cannot be resolved is later rejected as missing rather than sent verbatim.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}\s]+)\}").expect("placeholder pattern is valid"));

pub fn replace_env_placeholders(input: &str) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures<'_>| match caps[1].strip_prefix("env.") {
            Some(name) => std::env::var(name).unwrap_or_default(),
            None => String::new(),
        })
        .into_owned()
}
