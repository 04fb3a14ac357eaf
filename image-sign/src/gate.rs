// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! # Publication gate
//!
//! Runs one sign operation from a resolved image to either a printed or a
//! published signature:
//!
//! ```text
//! ReferenceResolved -> PayloadReady -> Signed -> Displayed
//!                                            \-> PublicationAddressed -> Uploaded
//! ```
//!
//! Any failure ends the operation and is returned unchanged.

use std::{io::Write, path::PathBuf};

use log::{debug, info, warn};
use oci_client::Reference;

use crate::{
    address,
    keys::{KeyLoader, PassphraseSource},
    payload,
    registry::{ContentDescriptor, Resolver},
    signer::{self, Signature},
    upload::{Uploader, UploaderRegistry},
    AnnotationSet, Error, Result,
};

/// A resolved image and what to do with it.
#[derive(Debug)]
pub struct SignRequest {
    pub image: Reference,
    pub descriptor: ContentDescriptor,

    /// Signed verbatim instead of the generated payload. Such a signature
    /// is not bound to `descriptor` unless the caller made it so.
    pub payload_override: Option<Vec<u8>>,
    pub annotations: AnnotationSet,
    pub upload: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Displayed { signature: Signature },
    Uploaded { address: Reference },
}

pub struct PublicationGate {
    key_path: PathBuf,
    key_loader: Box<dyn KeyLoader>,
    passphrase: Box<dyn PassphraseSource>,
    interactive: bool,
}

impl PublicationGate {
    pub fn new(
        key_path: impl Into<PathBuf>,
        key_loader: Box<dyn KeyLoader>,
        passphrase: Box<dyn PassphraseSource>,
        interactive: bool,
    ) -> Self {
        Self {
            key_path: key_path.into(),
            key_loader,
            passphrase,
            interactive,
        }
    }

    // The key only lives for the duration of this call.
    fn sign(&self, payload: &[u8]) -> Result<Signature> {
        let passphrase = self.passphrase.obtain(self.interactive)?;
        let key = self.key_loader.load(&self.key_path, &passphrase)?;
        signer::sign(payload, &key)
    }

    pub async fn execute(
        &self,
        request: SignRequest,
        uploader: &dyn Uploader,
        out: &mut dyn Write,
    ) -> Result<Outcome> {
        let SignRequest {
            image,
            descriptor,
            payload_override,
            annotations,
            upload,
        } = request;
        debug!(
            "reference resolved: {} -> {}",
            image.whole(),
            descriptor.digest
        );

        let payload = match payload_override {
            Some(payload) => {
                warn!(
                    "Signing a caller supplied payload, it is not checked against {}",
                    descriptor.digest
                );
                payload
            }
            None => payload::build(&descriptor.digest.to_string(), &annotations)?,
        };
        debug!("payload ready, {} bytes", payload.len());

        let signature = self.sign(&payload)?;
        debug!("payload signed");

        if !upload {
            writeln!(out, "{}", signature.to_base64())
                .map_err(|source| Error::Output { source })?;
            debug!("signature displayed");
            return Ok(Outcome::Displayed { signature });
        }

        let address = address::derive(&descriptor.digest).within(&image);
        debug!("publication address: {}", address.whole());

        info!("Pushing signature to: {}", address.whole());
        uploader.upload(&signature, &payload, &address).await?;
        debug!("signature uploaded");

        Ok(Outcome::Uploaded { address })
    }
}

/// Everything the `sign` command is asked to do.
#[derive(Debug, Clone)]
pub struct SignOptions {
    pub image_ref: String,
    pub upload: bool,
    pub payload_path: Option<PathBuf>,
    pub annotations: AnnotationSet,
    pub format: String,
}

/// Run the whole `sign` command.
///
/// The format is checked first, so an unknown one fails before any
/// registry access, key loading or signing.
pub async fn sign_image(
    options: &SignOptions,
    uploaders: &UploaderRegistry,
    resolver: &dyn Resolver,
    gate: &PublicationGate,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let uploader = uploaders.get(&options.format)?;

    let image = Reference::try_from(options.image_ref.as_str()).map_err(|e| {
        Error::ReferenceResolution {
            reference: options.image_ref.clone(),
            source: anyhow::anyhow!("invalid reference: {e}"),
        }
    })?;
    let descriptor = resolver.resolve(&image).await?;

    let payload_override = match &options.payload_path {
        Some(path) => {
            info!("Using payload from: {}", path.display());
            let payload = tokio::fs::read(path)
                .await
                .map_err(|source| Error::PayloadRead {
                    path: path.display().to_string(),
                    source,
                })?;
            Some(payload)
        }
        None => None,
    };

    let request = SignRequest {
        image,
        descriptor,
        payload_override,
        annotations: options.annotations.clone(),
        upload: options.upload,
    };
    gate.execute(request, uploader, out).await
}
