// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::{
    env,
    path::{Path, PathBuf},
};

use config::{Config, File, FileFormat};
use log::debug;
use serde::Deserialize;

use crate::{Error, Result};

/// Location of the configuration file relative to `$HOME`.
const DEFAULT_CONFIG_FILE: &str = ".config/image-sign/config.toml";

/// Optional settings of the `sign` command. Command line flags take
/// precedence over every value here.
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct SignConfig {
    /// Upload format used when `--format` is not given.
    pub default_format: Option<String>,

    /// Docker `config.json` style file holding registry credentials.
    pub auth_file: Option<PathBuf>,

    /// Registries reached over plain HTTP, e.g. `localhost:5000`.
    #[serde(default)]
    pub insecure_registries: Vec<String>,
}

impl SignConfig {
    /// Load the configuration. An explicit `path` must exist. Without one,
    /// the default file is read when present and defaults apply otherwise.
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No configuration file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Using configuration file {}", path.display());
        let c = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml))
            .build()
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        c.try_deserialize()
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE))
}
