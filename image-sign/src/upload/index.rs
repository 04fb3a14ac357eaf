// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! The index layout: every signature gets its own one layer manifest,
//! pushed by digest, and the signature tag holds an image index listing
//! all of them.

use std::{collections::BTreeMap, sync::Arc};

use anyhow::{bail, Context};
use async_trait::async_trait;
use log::{debug, info};
use oci_client::{
    manifest::{
        ImageIndexEntry, OciImageIndex, OCI_IMAGE_INDEX_MEDIA_TYPE, OCI_IMAGE_MEDIA_TYPE,
    },
    Reference,
};

use super::{
    push_config, signature_layer, signature_manifest, upload_error, Uploader,
    SIGNATURE_ANNOTATION,
};
use crate::{
    digest::sha256_digest,
    registry::{Manifest, RegistryClient},
    signer::Signature,
    Result,
};

fn empty_index() -> OciImageIndex {
    OciImageIndex {
        schema_version: 2,
        media_type: Some(OCI_IMAGE_INDEX_MEDIA_TYPE.to_string()),
        manifests: Vec::new(),
        artifact_type: None,
        annotations: None,
    }
}

pub struct IndexUploader {
    client: Arc<dyn RegistryClient>,
}

impl IndexUploader {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    async fn existing_index(&self, address: &Reference) -> anyhow::Result<OciImageIndex> {
        let Some(Manifest {
            data, media_type, ..
        }) = self.client.fetch_manifest(address).await?
        else {
            return Ok(empty_index());
        };

        if media_type != OCI_IMAGE_INDEX_MEDIA_TYPE {
            bail!(
                "{} holds a {media_type} document, not a signature index",
                address.whole()
            );
        }

        serde_json::from_slice(&data).context("parse existing signature index")
    }

    async fn publish(
        &self,
        signature: &Signature,
        payload: &[u8],
        address: &Reference,
    ) -> anyhow::Result<()> {
        let mut index = self.existing_index(address).await?;

        let config = push_config(self.client.as_ref(), address).await?;
        let payload_digest = self.client.push_blob(address, payload.to_vec()).await?;
        let layer = signature_layer(signature, payload, payload_digest);

        let manifest = serde_json::to_vec(&signature_manifest(config, vec![layer]))?;
        let manifest_digest = sha256_digest(&manifest);
        let manifest_size = manifest.len() as i64;

        if index.manifests.iter().any(|m| m.digest == manifest_digest) {
            info!("Signature already present at {}", address.whole());
            return Ok(());
        }

        let by_digest = Reference::with_digest(
            address.registry().to_string(),
            address.repository().to_string(),
            manifest_digest.clone(),
        );
        debug!("pushing signature manifest {}", by_digest.whole());
        self.client
            .push_manifest(&by_digest, manifest, OCI_IMAGE_MEDIA_TYPE)
            .await?;

        index.manifests.push(ImageIndexEntry {
            media_type: OCI_IMAGE_MEDIA_TYPE.to_string(),
            digest: manifest_digest,
            size: manifest_size,
            platform: None,
            annotations: Some(BTreeMap::from([(
                SIGNATURE_ANNOTATION.to_string(),
                signature.to_base64(),
            )])),
        });

        let data = serde_json::to_vec(&index)?;
        self.client
            .push_manifest(address, data, OCI_IMAGE_INDEX_MEDIA_TYPE)
            .await
    }
}

#[async_trait]
impl Uploader for IndexUploader {
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
