// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Private key loading and passphrase acquisition.

use std::{
    env,
    io,
    path::Path,
};

use anyhow::Context;
use crypto::KeyMaterial;
use log::debug;
use zeroize::Zeroizing;

use crate::{Error, Result};

/// Environment variable consulted before prompting for a key passphrase.
pub const PASSWORD_ENV_KEY: &str = "COSIGN_PASSWORD";

/// Loads the signing key from its storage.
pub trait KeyLoader: Send + Sync {
    fn load(&self, path: &Path, passphrase: &[u8]) -> Result<KeyMaterial>;
}

/// Supplies the passphrase protecting a private key.
pub trait PassphraseSource: Send + Sync {
    /// `interactive` tells whether a human can be asked on the terminal.
    fn obtain(&self, interactive: bool) -> Result<Zeroizing<Vec<u8>>>;
}

/// Reads PKCS#8 PEM key files, encrypted (`ENCRYPTED PRIVATE KEY`) or not
/// (`PRIVATE KEY`).
#[derive(Default, Debug)]
pub struct PemKeyLoader;

impl KeyLoader for PemKeyLoader {
    fn load(&self, path: &Path, passphrase: &[u8]) -> Result<KeyMaterial> {
        let key_load_error = |source: anyhow::Error| Error::KeyLoad {
            path: path.display().to_string(),
            source,
        };

        let pem = Zeroizing::new(
            std::fs::read_to_string(path)
                .context("read key file")
                .map_err(key_load_error)?,
        );

        let key = if KeyMaterial::is_encrypted_pem(&pem) {
            debug!("decrypting private key {}", path.display());
            KeyMaterial::from_pkcs8_encrypted_pem(&pem, passphrase)
        } else {
            KeyMaterial::from_pkcs8_pem(&pem)
        };

        key.map_err(key_load_error)
    }
}

/// Takes the passphrase from `COSIGN_PASSWORD` when it is set, otherwise
/// asks on the terminal. Without a terminal the passphrase is empty.
#[derive(Default, Debug)]
pub struct EnvOrPrompt;

impl PassphraseSource for EnvOrPrompt {
    fn obtain(&self, interactive: bool) -> Result<Zeroizing<Vec<u8>>> {
        if let Ok(password) = env::var(PASSWORD_ENV_KEY) {
            return Ok(Zeroizing::new(password.into_bytes()));
        }

        if !interactive {
            return Ok(Zeroizing::new(Vec::new()));
        }

        read_passphrase(|| rpassword::prompt_password(PROMPT))
    }
}

const PROMPT: &str = "Enter password for private key: ";

// `read` must not echo what is typed.
fn read_passphrase(read: impl FnOnce() -> io::Result<String>) -> Result<Zeroizing<Vec<u8>>> {
    let mut line = Zeroizing::new(read().map_err(|e| Error::KeyLoad {
        path: "<passphrase prompt>".to_string(),
        source: e.into(),
    })?);
    Ok(Zeroizing::new(std::mem::take(&mut *line).into_bytes()))
}
