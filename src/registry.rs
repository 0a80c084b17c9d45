//! Explicit registration of handler modules with the host.
//!
//! Hosts build a [`Registry`] once during startup, call [`register`] for
//! every module they ship (see [`crate::register`]), then use it to order
//! directives and to dispatch configuration blocks to module parsers.
//!
//! [`register`]: Registry::register

use std::collections::HashMap;

use crate::blockfile::Dispenser;
use crate::error::{ConfigError, RegistryError};
use crate::settings::Settings;

/// Where a directive runs relative to the host's built-in directives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectiveOrder {
    Before(&'static str),
    After(&'static str),
    Last,
}

/// Capability descriptor for one handler module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Namespaced module id, e.g. `http.handlers.knownagents`.
    pub id: &'static str,
    /// Configuration directive that instantiates the module.
    pub directive: &'static str,
    pub order: DirectiveOrder,
}

/// Parses a module's configuration block.
pub type DirectiveParser = fn(&mut Dispenser) -> Result<Settings, ConfigError>;

struct Entry {
    info: ModuleInfo,
    parser: DirectiveParser,
}

#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
    by_directive: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: ModuleInfo, parser: DirectiveParser) -> Result<(), RegistryError> {
        if self.entries.iter().any(|e| e.info.id == info.id) {
            return Err(RegistryError::DuplicateModule(info.id.to_string()));
        }
        if self.by_directive.contains_key(info.directive) {
            return Err(RegistryError::DuplicateDirective(info.directive.to_string()));
        }
        tracing::debug!(module = info.id, directive = info.directive, "module registered");
        self.by_directive.insert(info.directive, self.entries.len());
        self.entries.push(Entry { info, parser });
        Ok(())
    }

    pub fn module(&self, id: &str) -> Option<&ModuleInfo> {
        self.entries.iter().map(|e| &e.info).find(|i| i.id == id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.entries.iter().map(|e| &e.info)
    }

    /// Merge registered directives into the host's default order. A
    /// directive anchored to a name missing from `defaults` goes last.
    pub fn directive_order(&self, defaults: &[&'static str]) -> Vec<&'static str> {
        let mut order: Vec<&'static str> = defaults.to_vec();
        for entry in &self.entries {
            let name = entry.info.directive;
            let anchor = match entry.info.order {
                DirectiveOrder::Before(a) => order.iter().position(|d| *d == a),
                DirectiveOrder::After(a) => order.iter().position(|d| *d == a).map(|i| i + 1),
                DirectiveOrder::Last => None,
            };
            match anchor {
                Some(idx) => order.insert(idx, name),
                None => order.push(name),
            }
        }
        order
    }

    /// Parse the directive the dispenser is positioned before with the
    /// parser registered for it.
    pub fn parse(&self, d: &mut Dispenser) -> Result<(&ModuleInfo, Settings), RegistryError> {
        let mut probe = d.clone();
        probe.next();
        let name = probe.val();
        let idx = *self
            .by_directive
            .get(name)
            .ok_or_else(|| RegistryError::UnknownDirective(name.to_string()))?;
        let entry = &self.entries[idx];
        let settings = (entry.parser)(d)?;
        Ok((&entry.info, settings))
    }
}
