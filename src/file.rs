// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::options::LoadOptions;
use crate::tree::ConfigTree;

/// Decodes YAML text into a tree.
///
/// # Example
///
/// ```
/// let tree = yaml_config::load_str("abc: [1, 2, 3]", &yaml_config::LoadOptions::new())?;
/// assert_eq!(tree["abc"][0].as_i64(), Some(1));
/// # Ok::<(), yaml_config::Error>(())
/// ```
pub fn load_str(text: &str, options: &LoadOptions) -> Result<ConfigTree> {
    if text.trim().is_empty() {
        return ConfigTree::parse_data(None);
    }
    let raw: Value = serde_yaml::from_str(text)
        .map_err(|e| Error::Loader(format!("selected file had invalid YAML tokens: {e}")))?;
    ConfigTree::parse_data(Some(options.prepare(raw)?))
}

/// Reads everything from `reader` and decodes it like `load_str`.
pub fn load_reader<R: Read>(mut reader: R, options: &LoadOptions) -> Result<ConfigTree> {
    let mut bytes = vec![];
    reader.read_to_end(&mut bytes)
        .map_err(|e| Error::io("could not read YAML input", e))?;
    load_bytes(bytes, options)
}

fn load_bytes(bytes: Vec<u8>, options: &LoadOptions) -> Result<ConfigTree> {
    let text = String::from_utf8(bytes)
        .map_err(|_| Error::Loader("selected file was not in a valid encoding format".into()))?;
    load_str(&text, options)
}

/// The load/dump contract of a configuration file.
///
/// An implementation owns a backing file and the tree decoded from it.
pub trait ConfigFile {
    /// The backing file.
    fn path(&self) -> &Path;

    fn config(&self) -> &ConfigTree;

    fn config_mut(&mut self) -> &mut ConfigTree;

    /// (Re)reads the backing file and replaces the tree.
    fn load(&mut self) -> Result<()>;

    /// Writes the tree to the backing file, replacing its whole content.
    fn dump(&mut self) -> Result<()>;

    fn reload(&mut self) -> Result<()> {
        self.load()
    }

    /// Populates a config that was never parsed (e.g. a freshly created
    /// file) with `data`.
    ///
    /// Returns `Ok(false)` without touching anything if the config already
    /// holds parsed data. Nothing is written until `dump` is called.
    fn initial_populate(&mut self, data: Value) -> Result<bool> {
        self.config_mut().populate(data)
    }
}

/// A YAML configuration file on disk and the tree loaded from it.
///
/// ```
/// use yaml_config::ConfigFile;
///
/// # let dir = tempfile::tempdir().unwrap();
/// # let path = dir.path().join("test.yml");
/// # std::fs::write(&path, "abc: [1, 2, 3]\n").unwrap();
/// let mut cfg = yaml_config::YamlConfigFile::open(&path)?;
/// assert_eq!(cfg.config()["abc"][1].as_i64(), Some(2));
///
/// cfg.config_mut().as_mapping_mut().unwrap().insert("debug", true);
/// cfg.dump()?;
/// assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc:\n- 1\n- 2\n- 3\ndebug: true\n");
/// # Ok::<(), yaml_config::Error>(())
/// ```
#[derive(Debug)]
pub struct YamlConfigFile {
    path: PathBuf,
    options: LoadOptions,
    config: ConfigTree,
}

impl YamlConfigFile {
    /// Opens `path` with default options, creating it if it is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, LoadOptions::new())
    }

    pub fn open_with(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if options.creates() {
            // Creates the file without touching an existing one
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .map_err(|e| Error::io(format!("could not open {}", path.display()), e))?;
        }
        let mut file = YamlConfigFile {
            path,
            options,
            config: ConfigTree::empty(),
        };
        file.load()?;
        Ok(file)
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }
}

impl ConfigFile for YamlConfigFile {
    /// (Re)reads the file and replaces the tree.
    ///
    /// On error the current tree is kept.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&mut self) -> Result<()> {
        let bytes = fs::read(&self.path)
            .map_err(|e| Error::io(format!("could not read {}", self.path.display()), e))?;
        self.config = load_bytes(bytes, &self.options)?;
        debug!(parsed = self.config.parsed(), "config loaded");
        Ok(())
    }

    /// Writes the tree back to the file, replacing its whole content, then
    /// reloads it.
    ///
    /// The new content goes to a temporary file next to the target first,
    /// so a failure never leaves a half-written file behind. Symlinks are
    /// followed and the target keeps its permissions.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn dump(&mut self) -> Result<()> {
        let text = serde_yaml::to_string(&self.config.dump())?;

        // A file removed since it was opened is simply recreated
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| Error::io(format!("could not create temporary file in {}", dir.display()), e))?;
        tmp.write_all(text.as_bytes())
            .map_err(|e| Error::io("could not write temporary file", e))?;
        if let Ok(metadata) = fs::metadata(&target) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| Error::io(format!("could not copy permissions of {}", target.display()), e))?;
        }
        tmp.persist(&target)
            .map_err(|e| Error::io(format!("could not replace {}", target.display()), e.error))?;
        debug!(bytes = text.len(), target = %target.display(), "config written");

        self.reload()
    }

    /// Dotted keys and tags in `data` are handled as on load.
    fn initial_populate(&mut self, data: Value) -> Result<bool> {
        let data = self.options.prepare(data)?;
        self.config.populate(data)
    }

    fn config(&self) -> &ConfigTree {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigTree {
        &mut self.config
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
