// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{Deref, DerefMut};

use serde_yaml::Value;
use tracing::debug;

use crate::error::Result;
use crate::node::{ConfigKey, Node};

/// Root of a loaded configuration.
///
/// Dereferences to its root `Node`, so everything `Node` offers (`get`,
/// `lookup`, indexing, `deserialize`...) is available directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    root: Node,
    parsed: bool,
}

impl ConfigTree {
    /// An empty mapping that was never populated from real input.
    pub fn empty() -> Self {
        ConfigTree {
            root: Node::Mapping(ConfigKey::new()),
            parsed: false,
        }
    }

    /// Builds a tree from decoded data.
    ///
    /// Absent data and a YAML null (what an empty document decodes to) give
    /// an empty, unparsed tree.
    ///
    /// # Example
    ///
    /// ```
    /// let tree = yaml_config::ConfigTree::parse_data(None)?;
    /// assert!(!tree.parsed());
    /// assert_eq!(tree.dump(), serde_yaml::Value::Mapping(Default::default()));
    /// # Ok::<(), yaml_config::Error>(())
    /// ```
    pub fn parse_data(data: Option<Value>) -> Result<Self> {
        match data {
            None | Some(Value::Null) => Ok(Self::empty()),
            Some(raw) => Ok(ConfigTree {
                root: Node::build(raw)?,
                parsed: true,
            }),
        }
    }

    /// Whether the tree was populated from real input.
    pub fn parsed(&self) -> bool {
        self.parsed
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn dump(&self) -> Value {
        self.root.dump()
    }

    /// Replaces an unparsed tree with one built from `data`.
    ///
    /// Returns `Ok(false)` and leaves the tree alone if it was already
    /// parsed. A build error also leaves the tree alone.
    pub fn populate(&mut self, data: Value) -> Result<bool> {
        if self.parsed {
            debug!("tree already parsed, refusing to populate");
            return Ok(false);
        }
        *self = ConfigTree::parse_data(Some(data))?;
        debug!(parsed = self.parsed, "tree populated");
        Ok(true)
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for ConfigTree {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.root
    }
}

impl DerefMut for ConfigTree {
    fn deref_mut(&mut self) -> &mut Node {
        &mut self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_yaml::Mapping;

    #[test]
    fn empty_input() {
        let tree = ConfigTree::parse_data(None).unwrap();
        assert!(!tree.parsed());
        assert!(tree.as_mapping().unwrap().is_empty());
        assert_eq!(tree.dump(), Value::Mapping(Mapping::new()));

        let tree = ConfigTree::parse_data(Some(Value::Null)).unwrap();
        assert_eq!(tree, ConfigTree::empty());
    }

    #[test]
    fn parsed_mapping() {
        let raw: Value = serde_yaml::from_str("abc: [1, 2, 3]").unwrap();
        let tree = ConfigTree::parse_data(Some(raw.clone())).unwrap();
        assert!(tree.parsed());
        assert_eq!(tree["abc"][2].as_i64(), Some(3));
        assert_eq!(tree.dump(), raw);
    }

    #[test]
    fn populate_once() {
        let mut tree = ConfigTree::empty();
        let first: Value = serde_yaml::from_str("a: 1").unwrap();
        let second: Value = serde_yaml::from_str("b: 2").unwrap();

        assert!(tree.populate(first.clone()).unwrap());
        assert!(tree.parsed());
        assert_eq!(tree.dump(), first);

        assert!(!tree.populate(second).unwrap());
        assert_eq!(tree.dump(), first);
    }

    #[test]
    fn failed_populate_keeps_tree() {
        let mut tree = ConfigTree::empty();
        let bad: Value = serde_yaml::from_str("1: one").unwrap();
        assert!(tree.populate(bad).is_err());
        assert_eq!(tree, ConfigTree::empty());
    }

    #[test]
    fn mutation_through_deref() {
        let mut tree = ConfigTree::parse_data(Some(serde_yaml::from_str("a: 1").unwrap())).unwrap();
        tree.as_mapping_mut().unwrap().insert("b", "two");
        assert_eq!(tree.dump(), serde_yaml::from_str::<Value>("a: 1\nb: two").unwrap());
    }
}
