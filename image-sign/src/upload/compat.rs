// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! The legacy layout: a single image manifest at the signature tag whose
//! layers are the signed payloads. Signing again appends a layer.

use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use log::{debug, info};
use oci_client::{
    manifest::{OciImageManifest, OCI_IMAGE_MEDIA_TYPE},
    Reference,
};

use super::{push_config, signature_layer, signature_manifest, upload_error, Uploader};
use crate::{
    registry::{Manifest, RegistryClient},
    signer::Signature,
    Result,
};

pub struct CompatUploader {
    client: Arc<dyn RegistryClient>,
}

impl CompatUploader {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    async fn existing_manifest(
        &self,
        address: &Reference,
    ) -> anyhow::Result<Option<OciImageManifest>> {
        let Some(Manifest {
            data, media_type, ..
        }) = self.client.fetch_manifest(address).await?
        else {
            return Ok(None);
        };

        if media_type != OCI_IMAGE_MEDIA_TYPE {
            bail!(
                "{} holds a {media_type} document, not a signature manifest",
                address.whole()
            );
        }

        let manifest =
            serde_json::from_slice(&data).context("parse existing signature manifest")?;
        Ok(Some(manifest))
    }

    async fn publish(
        &self,
        signature: &Signature,
        payload: &[u8],
        address: &Reference,
    ) -> anyhow::Result<()> {
        let existing = self.existing_manifest(address).await?;

        let config = push_config(self.client.as_ref(), address).await?;
        let payload_digest = self.client.push_blob(address, payload.to_vec()).await?;
        let layer = signature_layer(signature, payload, payload_digest);

        let mut manifest = match existing {
            Some(existing) => OciImageManifest {
                config,
                ..existing
            },
            None => signature_manifest(config, Vec::new()),
        };
        if manifest
            .layers
            .iter()
            .any(|l| l.digest == layer.digest && l.annotations == layer.annotations)
        {
            info!("Signature already present at {}", address.whole());
            return Ok(());
        }
        debug!(
            "appending signature layer to {} existing",
            manifest.layers.len()
        );
        manifest.layers.push(layer);
        manifest.media_type = Some(OCI_IMAGE_MEDIA_TYPE.to_string());

        let data = serde_json::to_vec(&manifest)?;
        self.client
            .push_manifest(address, data, OCI_IMAGE_MEDIA_TYPE)
            .await
    }
}

#[async_trait]
impl Uploader for CompatUploader {
    async fn upload(
        &self,
        signature: &Signature,
        payload: &[u8],
        address: &Reference,
    ) -> Result<()> {
        self.publish(signature, payload, address)
            .await
            .map_err(upload_error(address))
    }
}
