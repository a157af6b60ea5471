// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::Index;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Number, Value};

use crate::error::{Error, Result};

static NULL: Node = Node::Scalar(Scalar::Null);

/// A leaf of the tree, kept exactly as the YAML backend decoded it.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Back to the backend's representation
    pub fn dump(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

/// One decoded YAML value.
///
/// Mappings become `ConfigKey`s, sequences keep their elements in order and
/// scalars are stored untransformed. `dump` is the exact mirror of `build`:
///
/// ```
/// let raw: serde_yaml::Value = serde_yaml::from_str(r#"
/// abc: [1, 2, 3]
/// nested:
///     x: y
/// "#)?;
/// let node = yaml_config::Node::build(raw.clone())?;
/// assert_eq!(node.lookup("nested.x").and_then(|n| n.as_str()), Some("y"));
/// assert_eq!(node.dump(), raw);
/// # Ok::<(), yaml_config::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(ConfigKey),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

impl Node {
    /// Recursively converts a raw value into a tree.
    ///
    /// Fails on values a config tree cannot represent: mapping keys that are
    /// not strings, and tagged values (`!Tag value`).
    pub fn build(raw: Value) -> Result<Node> {
        match raw {
            Value::Mapping(m) => Ok(Node::Mapping(ConfigKey::build(m)?)),
            Value::Sequence(s) => {
                let items = s.into_iter()
                    .map(Node::build)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Node::Sequence(items))
            },
            Value::Null => Ok(Node::Scalar(Scalar::Null)),
            Value::Bool(b) => Ok(Node::Scalar(Scalar::Bool(b))),
            Value::Number(n) => Ok(Node::Scalar(Scalar::Number(n))),
            Value::String(s) => Ok(Node::Scalar(Scalar::String(s))),
            Value::Tagged(t) => Err(Error::Unsupported(format!("tagged value {}", t.tag))),
        }
    }

    /// Converts the tree back into a raw value.
    pub fn dump(&self) -> Value {
        match self {
            Node::Mapping(m) => Value::Mapping(m.dump()),
            Node::Sequence(s) => Value::Sequence(s.iter().map(Node::dump).collect()),
            Node::Scalar(s) => s.dump(),
        }
    }

    /// Deserialize the subtree into a typed structure.
    ///
    /// # Example
    ///
    /// ```
    /// #[derive(serde_derive::Deserialize)]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// let tree = yaml_config::load_str("server: {host: localhost, port: 8080}",
    ///                                  &yaml_config::LoadOptions::new())?;
    /// let server: Server = tree["server"].deserialize()?;
    /// assert_eq!(server.host, "localhost");
    /// assert_eq!(server.port, 8080);
    /// # Ok::<(), yaml_config::Error>(())
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_yaml::from_value(self.dump())?)
    }

    /// Mapping lookup. `None` if the key is absent or `self` is not a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.as_mapping_mut().and_then(|m| m.get_mut(key))
    }

    /// Dotted access into the tree: `"server.ports.0"`.
    ///
    /// Each segment is a mapping key, or an index when the current node is a
    /// sequence. Keys that themselves contain a dot are only reachable with
    /// `get`.
    pub fn lookup(&self, path: &str) -> Option<&Node> {
        path.split('.')
            .try_fold(self, |node, segment| node.child(segment))
    }

    pub fn lookup_mut(&mut self, path: &str) -> Option<&mut Node> {
        path.split('.')
            .try_fold(self, |node, segment| node.child_mut(segment))
    }

    fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Node::Mapping(m) => m.get(segment),
            Node::Sequence(s) => segment.parse::<usize>()
                .ok()
                .and_then(|i| s.get(i)),
            Node::Scalar(_) => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Node> {
        match self {
            Node::Mapping(m) => m.get_mut(segment),
            Node::Sequence(s) => segment.parse::<usize>()
                .ok()
                .and_then(move |i| s.get_mut(i)),
            Node::Scalar(_) => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ConfigKey> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut ConfigKey> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Scalar(Scalar::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Node::Scalar(Scalar::Number(n)) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }
}

/// Missing keys index to a null node, like `serde_yaml::Value` does.
impl Index<&str> for Node {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Node {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        self.as_sequence()
            .and_then(|s| s.get(index))
            .unwrap_or(&NULL)
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

impl From<ConfigKey> for Node {
    fn from(m: ConfigKey) -> Self {
        Node::Mapping(m)
    }
}

impl From<Vec<Node>> for Node {
    fn from(s: Vec<Node>) -> Self {
        Node::Sequence(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Scalar(Scalar::Number(i.into()))
    }
}

impl From<u64> for Node {
    fn from(u: u64) -> Self {
        Node::Scalar(Scalar::Number(u.into()))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Scalar(Scalar::Number(f.into()))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_owned()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

/// A mapping node.
///
/// Entries keep their insertion order so that a dumped file diffs cleanly
/// against the one it was loaded from. Indexing (`key["abc"]`) and `get`
/// are two views over the same entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigKey {
    entries: IndexMap<String, Node>,
}

impl ConfigKey {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(raw: Mapping) -> Result<Self> {
        let mut entries = IndexMap::with_capacity(raw.len());
        for (key, value) in raw {
            let key = match key {
                Value::String(s) => s,
                other => return Err(Error::Unsupported(format!("mapping key {:?} is not a string", other))),
            };
            entries.insert(key, Node::build(value)?);
        }
        Ok(ConfigKey { entries })
    }

    pub fn dump(&self) -> Mapping {
        self.entries.iter()
            .map(|(k, v)| (Value::String(k.clone()), v.dump()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    /// Sets `key`, returning the node it replaced, if any.
    ///
    /// A replaced key keeps its position; a new one goes last.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Index<&str> for ConfigKey {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        self.get(key).unwrap_or(&NULL)
    }
}
