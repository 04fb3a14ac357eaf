// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::{config::SignConfig, upload::Format, AnnotationSet, SignOptions};

#[derive(Parser, Debug)]
#[command(name = "sign")]
#[command(bin_name = "sign")]
#[command(author, version, about = "Sign the supplied container image", long_about = None)]
pub struct Cli {
    /// path to the private key
    #[arg(long)]
    pub key: PathBuf,

    /// whether to upload the signature, e.g. --upload=false
    #[arg(
        long,
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub upload: bool,

    /// path to a payload file to use rather than generating one
    #[arg(long)]
    pub payload: Option<PathBuf>,

    /// extra key=value pairs to sign, may be repeated
    #[arg(short = 'a', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub annotations: Vec<(String, String)>,

    /// upload format, `compat` or `index` (default is `compat`)
    #[arg(long)]
    pub format: Option<String>,

    /// configuration file (default is $HOME/.config/image-sign/config.toml)
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// image reference to sign, e.g. quay.io/example/app:latest
    pub image: String,
}

/// Parse one `-a key=value` flag. Only the first `=` separates, so values
/// may contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid flag: {s}, expected key=value"))
}

/// Collect annotation flags. A repeated key keeps its last value.
pub fn parse_annotations(pairs: impl IntoIterator<Item = (String, String)>) -> AnnotationSet {
    pairs.into_iter().collect()
}

impl Cli {
    /// Merge the flags with `config`. Flags win.
    pub fn options(&self, config: &SignConfig) -> SignOptions {
        let format = self
            .format
            .clone()
            .or_else(|| config.default_format.clone())
            .unwrap_or_else(|| Format::DEFAULT.to_string());

        SignOptions {
            image_ref: self.image.clone(),
            upload: self.upload,
            payload_path: self.payload.clone(),
            annotations: parse_annotations(self.annotations.iter().cloned()),
            format,
        }
    }
}
