//! Module settings and the parser for the `knownagents` configuration block.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent_types;
use crate::blockfile::Dispenser;
use crate::error::{ConfigError, ValidationError};

/// Name of the configuration directive handled by this module.
pub const DIRECTIVE: &str = "knownagents";

/// Path disallowed when a `robots_txt` block omits `disallow`.
pub const DEFAULT_DISALLOW: &str = "/";

fn default_disallow() -> String {
    DEFAULT_DISALLOW.to_string()
}

/// Robots.txt generation policy sent to the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsPolicy {
    /// Agent types to block, in configuration order.
    pub agent_types: Vec<String>,
    /// Path to disallow for those agent types.
    #[serde(default = "default_disallow")]
    pub disallow: String,
}

impl Default for RobotsPolicy {
    fn default() -> Self {
        Self {
            agent_types: Vec::new(),
            disallow: default_disallow(),
        }
    }
}

/// Immutable per-instance configuration.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Bearer token for the Known Agents API. Treated as an opaque,
    /// already-resolved secret.
    pub access_token: String,
    /// Enables robots.txt generation when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots_txt: Option<RobotsPolicy>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("access_token", &"<redacted>")
            .field("robots_txt", &self.robots_txt)
            .finish()
    }
}

impl Settings {
    /// Parse a single `knownagents` directive from configuration text.
    pub fn parse(file: &str, input: &str) -> Result<Self, ConfigError> {
        let mut d = Dispenser::parse(file, input)?;
        Self::from_dispenser(&mut d)
    }

    /// Read the directive the dispenser is positioned before.
    ///
    /// Syntax:
    ///
    /// ```text
    /// knownagents {
    ///     access_token <token>
    ///     robots_txt {
    ///         agent_types <type...> | *
    ///         disallow <path>
    ///     }
    /// }
    /// ```
    pub fn from_dispenser(d: &mut Dispenser) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();
        d.next(); // directive name

        let nesting = d.nesting();
        while d.next_block(nesting) {
            match d.val() {
                "robots_txt" => {
                    if settings.robots_txt.is_some() {
                        return Err(d.err("robots_txt is already configured"));
                    }
                    settings.robots_txt = Some(parse_robots_txt(d)?);
                }
                "access_token" => {
                    if !d.next_arg() {
                        return Err(d.arg_err());
                    }
                    settings.access_token = d.val().to_string();
                }
                other => {
                    return Err(d.err(format!("unrecognized subdirective '{}'", other)));
                }
            }
        }

        if d.next_arg() {
            return Err(d.err(format!("unexpected argument '{}'", d.val())));
        }

        if settings.access_token.is_empty() {
            return Err(d.err("missing access token"));
        }
        if let Some(robots) = &settings.robots_txt {
            if robots.agent_types.is_empty() {
                return Err(d.err("missing agent type filters"));
            }
        }

        Ok(settings)
    }

    /// Activation-time checks: token present and every agent type known.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.access_token.is_empty() {
            return Err(ValidationError::MissingAccessToken);
        }
        if let Some(robots) = &self.robots_txt {
            if robots.agent_types.is_empty() {
                return Err(ValidationError::MissingAgentTypes);
            }
            if let Some(bad) = robots
                .agent_types
                .iter()
                .find(|at| !agent_types::is_known(at))
            {
                return Err(ValidationError::UnrecognizedAgentType(bad.clone()));
            }
        }
        Ok(())
    }

    /// Fill in defaults left empty by hand-built or deserialized settings.
    pub fn apply_defaults(&mut self) {
        if let Some(robots) = self.robots_txt.as_mut() {
            if robots.disallow.is_empty() {
                robots.disallow = default_disallow();
            }
        }
    }
}

fn parse_robots_txt(d: &mut Dispenser) -> Result<RobotsPolicy, ConfigError> {
    let mut policy = RobotsPolicy::default();
    let nesting = d.nesting();
    while d.next_block(nesting) {
        match d.val() {
            "agent_types" => {
                if !d.next_arg() {
                    return Err(d.arg_err());
                }
                if d.val() == agent_types::WILDCARD {
                    policy.agent_types = agent_types::all();
                    if d.next_arg() {
                        return Err(d.err(format!("unexpected argument '{}'", d.val())));
                    }
                } else {
                    policy.agent_types.push(d.val().to_string());
                    while d.next_arg() {
                        policy.agent_types.push(d.val().to_string());
                    }
                }
            }
            "disallow" => {
                if !d.next_arg() {
                    return Err(d.arg_err());
                }
                policy.disallow = d.val().to_string();
            }
            other => {
                return Err(d.err(format!("unknown subdirective '{}'", other)));
            }
        }
    }
    Ok(policy)
}
