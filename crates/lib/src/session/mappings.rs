//! Property-mapping table.
//!
//! A mapping is `key=value`. A value of the form `@name@` is an expression:
//! when `name` is another mapping key the value is substituted at lookup time,
//! otherwise `name` is resolved against the declared properties of the loaded
//! BOMs. Any other value is a literal.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::pom::Properties;

use super::Source;
use super::relocations::split_directives;

static WHOLE_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^@([^@]+)@$").expect("valid regex"));
static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([^@]+)@").expect("valid regex"));

/// Property overrides from configuration and BOM `mapping` properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyMappings {
  /// Literal or mapping-referencing values, first writer wins.
  mappings: BTreeMap<String, String>,
  /// Keys still waiting for a BOM property, mapped to the property name.
  pending: BTreeMap<String, String>,
  /// What each source contributed, for reporting.
  by_source: BTreeMap<Source, BTreeMap<String, String>>,
}

impl PropertyMappings {
  /// Add a batch of mappings from one source.
  pub fn add_mappings<'a>(&mut self, source: &Source, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
    let entries: Vec<(&str, &str)> = entries.into_iter().collect();
    let batch_keys: BTreeSet<&str> = entries.iter().map(|(k, _)| *k).collect();

    for (key, value) in entries {
      if self.mappings.contains_key(key) || self.pending.contains_key(key) {
        debug!(key, %source, "property mapping already defined; keeping first");
        continue;
      }
      self
        .by_source
        .entry(source.clone())
        .or_default()
        .insert(key.to_string(), value.to_string());

      match WHOLE_EXPRESSION.captures(value) {
        Some(caps) if !self.mappings.contains_key(&caps[1]) && !batch_keys.contains(&caps[1]) => {
          debug!(key, expression = &caps[1], "property mapping waits for BOM property");
          self.pending.insert(key.to_string(), caps[1].to_string());
        }
        _ => {
          self.mappings.insert(key.to_string(), value.to_string());
        }
      }
    }
  }

  /// Parse `key=value` text (same comment and separator rules as relocations).
  pub fn add_text(&mut self, source: &Source, text: &str) {
    let directives = split_directives(text);
    let mut entries = Vec::new();
    for directive in &directives {
      match directive.split_once('=') {
        Some((k, v)) if !k.is_empty() => entries.push((k, v)),
        _ => warn!(%source, entry = %directive, "skipping malformed property mapping"),
      }
    }
    self.add_mappings(source, entries);
  }

  /// Resolve pending expressions against `properties`.
  pub fn resolve_pending(&mut self, properties: &Properties) {
    let resolved: Vec<(String, String)> = self
      .pending
      .iter()
      .filter_map(|(key, name)| properties.get(name).map(|value| (key.clone(), value.to_string())))
      .collect();
    for (key, value) in resolved {
      debug!(key = %key, value = %value, "resolved property mapping from BOM property");
      self.pending.remove(&key);
      self.mappings.insert(key, value);
    }
  }

  /// The mapped value for `key`, with `@other@` references substituted.
  ///
  /// Returns `None` for unmapped keys and for expressions no BOM resolved.
  pub fn get(&self, key: &str) -> Option<String> {
    let mut current = self.mappings.get(key)?.clone();
    let mut seen = BTreeSet::from([key.to_string()]);
    loop {
      let mut changed = false;
      let next = EXPRESSION
        .replace_all(&current, |caps: &regex::Captures<'_>| {
          let name = &caps[1];
          match self.mappings.get(name) {
            Some(value) if !seen.contains(name) => {
              changed = true;
              value.clone()
            }
            _ => caps[0].to_string(),
          }
        })
        .into_owned();
      if !changed {
        return Some(next);
      }
      for caps in EXPRESSION.captures_iter(&current) {
        seen.insert(caps[1].to_string());
      }
      current = next;
    }
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.mappings.keys().map(String::as_str)
  }

  pub fn unresolved(&self) -> impl Iterator<Item = (&str, &str)> {
    self.pending.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn by_source(&self) -> &BTreeMap<Source, BTreeMap<String, String>> {
    &self.by_source
  }

  pub fn is_empty(&self) -> bool {
    self.mappings.is_empty() && self.pending.is_empty()
  }
}
