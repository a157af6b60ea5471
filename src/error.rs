// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The backing text could not be decoded (bad encoding or bad YAML).
    #[error("impossible to load YAML file: {0}")]
    Loader(String),
    /// A raw value that has no place in a config tree.
    #[error("unsupported YAML value: {0}")]
    Unsupported(String),
    #[error("impossible to restructure YAML map: {0}")]
    Restructure(String),
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error")]
    Yaml(#[from] serde_yaml::Error)
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
