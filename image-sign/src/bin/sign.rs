// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Sign a container image and push the signature next to it.

use std::{
    io::{self, IsTerminal},
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use log::debug;

use image_sign::{
    auth::{default_auth_file, Auth},
    cli::Cli,
    config::SignConfig,
    keys::{EnvOrPrompt, PemKeyLoader},
    registry::OciRegistry,
    sign_image,
    upload::{Format, UploaderRegistry},
    PublicationGate,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let config = SignConfig::new(cli.config_file.as_deref())?;
    let options = cli.options(&config);

    // Reject an unknown format before touching credentials or the network.
    Format::parse(&options.format)?;

    let auth_file = config
        .auth_file
        .clone()
        .or_else(|| default_auth_file().filter(|path| path.exists()));
    let auth = match auth_file {
        Some(path) => {
            debug!("Using registry credentials from {}", path.display());
            Auth::from_file(&path)?
        }
        None => Auth::default(),
    };

    let registry = Arc::new(OciRegistry::new(auth, config.insecure_registries.clone())?);
    let uploaders = UploaderRegistry::new(registry.clone());
    let gate = PublicationGate::new(
        cli.key.clone(),
        Box::new(PemKeyLoader),
        Box::new(EnvOrPrompt),
        io::stdin().is_terminal(),
    );

    sign_image(
        &options,
        &uploaders,
        registry.as_ref(),
        &gate,
        &mut io::stdout(),
    )
    .await?;

    Ok(())
}
