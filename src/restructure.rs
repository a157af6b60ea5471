// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde_yaml::{Mapping, Value};
use tracing::trace;

use crate::error::{Error, Result};

/// Expands keys containing dots into nested mappings.
///
/// E.g. `foo.bar.baz: true` will convert to
///
/// ```yaml
/// foo:
///     bar:
///         baz: true
/// ```
///
/// Applied to the raw value before it is turned into a tree, so that dotted
/// lookups such as `tree.lookup("foo.bar.baz")` work whichever way the file
/// was written. Mappings nested in sequences are expanded too.
#[derive(Debug, Clone, Default)]
pub struct Restructurer {
    ignore: Vec<String>,
}

impl Restructurer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dotted keys that must stay literal.
    ///
    /// An ignored key is treated as a single segment, so with `another.key`
    /// ignored, `foo.another.key.bar` becomes `foo` → `another.key` → `bar`.
    ///
    /// # Example
    ///
    /// ```
    /// let mut actual: serde_yaml::Value = serde_yaml::from_str(r#"
    /// some.key: 42
    /// foo.another.key.bar: true
    /// "#)?;
    /// let expected: serde_yaml::Value = serde_yaml::from_str(r#"
    /// some.key: 42
    /// foo:
    ///     another.key:
    ///         bar: true
    /// "#)?;
    ///
    /// yaml_config::Restructurer::new()
    ///     .ignore(vec!["some.key".into(), "another.key".into()])
    ///     .apply_to_value(&mut actual)?;
    /// assert_eq!(actual, expected);
    /// # Ok::<(), yaml_config::Error>(())
    /// ```
    pub fn ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn apply_to_value(&self, value: &mut Value) -> Result<()> {
        match value {
            Value::Mapping(m) => self.apply_to_mapping(m),
            Value::Sequence(s) => s.iter_mut()
                .try_for_each(|v| self.apply_to_value(v)),
            _ => Ok(()),
        }
    }

    fn apply_to_mapping(&self, m: &mut Mapping) -> Result<()> {
        let dotted: Vec<String> = m.keys()
            .filter_map(Value::as_str)
            .filter(|k| self.split_key(k).is_some())
            .map(str::to_owned)
            .collect();
        for k in dotted {
            self.restructure_key(m, &k)?;
        }
        for (_, v) in m.iter_mut() {
            self.apply_to_value(v)?;
        }
        Ok(())
    }

    /// Splits a key into its first segment and the rest, honoring the
    /// ignore list. `None` if there is nothing to split.
    fn split_key<'k>(&self, key: &'k str) -> Option<(&'k str, &'k str)> {
        for ignored in &self.ignore {
            if let Some(rest) = key.strip_prefix(ignored.as_str()) {
                if rest.is_empty() {
                    return None;
                }
                if let Some(suffix) = rest.strip_prefix('.') {
                    if suffix.is_empty() {
                        return None;
                    }
                    return Some((&key[..ignored.len()], suffix));
                }
            }
        }
        let (prefix, suffix) = key.split_once('.')?;
        if prefix.is_empty() || suffix.is_empty() {
            return None;
        }
        Some((prefix, suffix))
    }

    fn restructure_key(&self, m: &mut Mapping, key: &str) -> Result<()> {
        let (prefix, suffix) = match self.split_key(key) {
            Some(parts) => parts,
            None => return Ok(()),
        };
        let value = match m.remove(key) {
            Some(v) => v,
            None => return Ok(()),
        };
        trace!(key, prefix, "expanding dotted key");

        if !m.contains_key(prefix) {
            m.insert(Value::String(prefix.into()),
                     Value::Mapping(Mapping::new()));
        }
        let inner = m.get_mut(prefix)
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| Error::Restructure(format!("could not insert key {key}: {prefix} is not a mapping")))?;
        if inner.contains_key(suffix) {
            return Err(Error::Restructure(format!("could not insert key {key}: {prefix} already has {suffix}")));
        }
        inner.insert(Value::String(suffix.into()), value);
        self.restructure_key(inner, suffix)
    }
}
