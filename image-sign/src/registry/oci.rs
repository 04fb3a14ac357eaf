// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use oci_client::{
    client::{ClientConfig, ClientProtocol},
    errors::{OciDistributionError, OciErrorCode},
    secrets::RegistryAuth,
    Client, Reference, RegistryOperation,
};
use reqwest::header::HeaderValue;

use super::{
    resolve_with, ContentDescriptor, Manifest, RegistryClient, Resolver,
    ACCEPTED_MANIFEST_MEDIA_TYPES,
};
use crate::{auth::Auth, digest::sha256_digest};

/// A remote OCI distribution registry reached through `oci-client`.
pub struct OciRegistry {
    client: Client,
    auth: Auth,
}

impl OciRegistry {
    /// `insecure_registries` are reached over plain HTTP. Credentials come
    /// from `auth`, registries missing there are accessed anonymously.
    pub fn new(auth: Auth, insecure_registries: Vec<String>) -> Result<Self> {
        let client_config = ClientConfig {
            protocol: ClientProtocol::HttpsExcept(insecure_registries),
            ..Default::default()
        };
        let client = Client::try_from(client_config).context("create registry client")?;

        Ok(Self { client, auth })
    }

    fn credential(&self, reference: &Reference) -> Result<RegistryAuth> {
        self.auth.credential_for_reference(reference)
    }

    async fn authenticate_push(&self, reference: &Reference) -> Result<()> {
        let auth = self.credential(reference)?;
        self.client
            .auth(reference, &auth, RegistryOperation::Push)
            .await
            .with_context(|| format!("authenticate to {} for push", reference.registry()))?;
        Ok(())
    }
}

fn is_not_found(error: &OciDistributionError) -> bool {
    match error {
        OciDistributionError::ImageManifestNotFoundError(_) => true,
        OciDistributionError::ServerError { code, .. } => *code == 404,
        OciDistributionError::RegistryError { envelope, .. } => envelope
            .errors
            .iter()
            .any(|e| matches!(e.code, OciErrorCode::ManifestUnknown)),
        _ => false,
    }
}

#[async_trait]
impl RegistryClient for OciRegistry {
    async fn fetch_manifest(&self, reference: &Reference) -> Result<Option<Manifest>> {
        let auth = self.credential(reference)?;
        match self
            .client
            .pull_manifest_raw(reference, &auth, &ACCEPTED_MANIFEST_MEDIA_TYPES)
            .await
        {
            Ok((data, digest)) => Ok(Some(Manifest::new(data, digest))),
            Err(e) if is_not_found(&e) => {
                debug!("no manifest at {}", reference.whole());
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("pull manifest {}", reference.whole())),
        }
    }

    async fn push_blob(&self, reference: &Reference, data: Vec<u8>) -> Result<String> {
        self.authenticate_push(reference).await?;
        let digest = sha256_digest(&data);
        self.client
            .push_blob(reference, &data, &digest)
            .await
            .with_context(|| format!("push blob {digest}"))?;
        Ok(digest)
    }

    async fn push_manifest(
        &self,
        reference: &Reference,
        data: Vec<u8>,
        media_type: &str,
    ) -> Result<()> {
        self.authenticate_push(reference).await?;
        let content_type = HeaderValue::from_str(media_type)
            .with_context(|| format!("invalid media type {media_type}"))?;
        self.client
            .push_manifest_raw(reference, data, content_type)
            .await
            .with_context(|| format!("push manifest {}", reference.whole()))?;
        Ok(())
    }
}

#[async_trait]
impl Resolver for OciRegistry {
    async fn resolve(&self, reference: &Reference) -> crate::Result<ContentDescriptor> {
        debug!("resolving {}", reference.whole());
        resolve_with(self, reference).await
    }
}
