// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.


//! Load a YAML file into a navigable tree, and dump it back.
//!
//! # Tree
//!
//! A decoded YAML document becomes a `Node`: mappings are `ConfigKey`s,
//! sequences keep their order, scalars are stored as they were decoded.
//! Mapping entries can be reached by key, by index, or by dotted path:
//!
//! ```
//! let tree = yaml_config::load_str(r#"
//! abc: [1, 2, 3]
//! nested:
//!     x: y
//! "#, &yaml_config::LoadOptions::new())?;
//!
//! assert_eq!(tree["abc"][2].as_i64(), Some(3));
//! assert_eq!(tree.get("nested").and_then(|n| n.get("x")), tree.lookup("nested.x"));
//! # Ok::<(), yaml_config::Error>(())
//! ```
//!
//! Dotted access is only a projection over the mappings: there is no other
//! copy of the data, and `dump` gives back exactly what was loaded.
//!
//! # Files
//!
//! `YamlConfigFile` ties a tree to a file on disk through the `ConfigFile`
//! trait: it creates the file if needed, loads it, and writes the (possibly
//! modified) tree back with `dump`. `LoadOptions` controls how that
//! happens (safe mode, dotted keys expansion).


mod error;
mod node;
mod tree;
mod restructure;
mod options;
mod file;

pub use error::{Result, Error};
pub use node::{Node, Scalar, ConfigKey};
pub use tree::ConfigTree;
pub use restructure::Restructurer;
pub use options::LoadOptions;
pub use file::{ConfigFile, YamlConfigFile, load_str, load_reader};
