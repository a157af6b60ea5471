// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde_yaml::Value;

use crate::error::Result;
use crate::restructure::Restructurer;

/// How a YAML file is loaded.
///
/// # Example
///
/// ```
/// let options = yaml_config::LoadOptions::new()
///     .safe(false)
///     .expand_dotted_keys(true);
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    safe: bool,
    expand_dotted_keys: bool,
    ignore_dotted: Vec<String>,
    create: bool,
}

impl LoadOptions {
    /// Safe, no dotted key expansion, backing file created if missing.
    pub fn new() -> Self {
        LoadOptions {
            safe: true,
            expand_dotted_keys: false,
            ignore_dotted: vec![],
            create: true,
        }
    }

    /// In safe mode (the default) tagged values such as `!Custom 42` are
    /// refused. With `false` the tag is dropped and the inner value is
    /// loaded; it won't be written back on dump.
    pub fn safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    /// Set to `true` to turn `foo.bar: 1` into `foo: {bar: 1}` on load
    /// (default is `false`).
    pub fn expand_dotted_keys(mut self, expand: bool) -> Self {
        self.expand_dotted_keys = expand;
        self
    }

    /// Dotted keys that stay literal when `expand_dotted_keys` is on.
    pub fn ignore_dotted(mut self, ignore: Vec<String>) -> Self {
        self.ignore_dotted = ignore;
        self
    }

    /// Create the backing file when it does not exist (default is `true`).
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn is_safe(&self) -> bool {
        self.safe
    }

    pub fn creates(&self) -> bool {
        self.create
    }

    /// Raw value preprocessing, before the tree is built.
    pub(crate) fn prepare(&self, mut value: Value) -> Result<Value> {
        if !self.safe {
            strip_tags(&mut value);
        }
        if self.expand_dotted_keys {
            Restructurer::new()
                .ignore(self.ignore_dotted.clone())
                .apply_to_value(&mut value)?;
        }
        Ok(value)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_tags(value: &mut Value) {
    match value {
        Value::Tagged(t) => {
            let mut inner = std::mem::take(&mut t.value);
            strip_tags(&mut inner);
            *value = inner;
        },
        Value::Sequence(s) => s.iter_mut().for_each(strip_tags),
        Value::Mapping(m) => {
            // Keys can be tagged too, so the mapping is rebuilt
            *m = std::mem::take(m)
                .into_iter()
                .map(|(mut k, mut v)| {
                    strip_tags(&mut k);
                    strip_tags(&mut v);
                    (k, v)
                })
                .collect();
        },
        _ => {}
    }
}
