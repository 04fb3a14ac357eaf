// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! # Registry access
//!
//! Two seams separate the signing workflow from the network:
//!
//! - [`Resolver`] turns a human given reference into the immutable
//!   [`ContentDescriptor`] of its manifest.
//! - [`RegistryClient`] is the raw transport the uploaders publish through.
//!
//! [`OciRegistry`] implements both against a real registry with
//! `oci-client`. [`MemoryRegistry`] keeps everything in process.

use async_trait::async_trait;
use oci_client::{
    manifest::{
        IMAGE_MANIFEST_LIST_MEDIA_TYPE, IMAGE_MANIFEST_MEDIA_TYPE, OCI_IMAGE_INDEX_MEDIA_TYPE,
        OCI_IMAGE_MEDIA_TYPE,
    },
    Reference,
};
use serde::Deserialize;

use crate::{digest::Digest, Error, Result};

pub mod memory;
pub mod oci;

pub use memory::MemoryRegistry;
pub use oci::OciRegistry;

/// Manifest media types accepted when resolving or fetching.
pub const ACCEPTED_MANIFEST_MEDIA_TYPES: [&str; 4] = [
    OCI_IMAGE_MEDIA_TYPE,
    OCI_IMAGE_INDEX_MEDIA_TYPE,
    IMAGE_MANIFEST_MEDIA_TYPE,
    IMAGE_MANIFEST_LIST_MEDIA_TYPE,
];

/// What a reference currently points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDescriptor {
    pub digest: Digest,
    pub media_type: String,
    pub size: u64,
}

/// A manifest document as stored in a registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub data: Vec<u8>,
    pub digest: String,
    pub media_type: String,
}

impl Manifest {
    /// Wrap a raw manifest, taking the media type from the document itself.
    pub fn new(data: Vec<u8>, digest: String) -> Self {
        let media_type = media_type_of(&data);
        Self {
            data,
            digest,
            media_type,
        }
    }

    pub fn descriptor(&self) -> anyhow::Result<ContentDescriptor> {
        Ok(ContentDescriptor {
            digest: Digest::try_from(self.digest.as_str())?,
            media_type: self.media_type.clone(),
            size: self.data.len() as u64,
        })
    }
}

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `reference` to the descriptor of the manifest it names.
    /// Any failure is reported as [`Error::ReferenceResolution`].
    async fn resolve(&self, reference: &Reference) -> Result<ContentDescriptor>;
}

#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch the manifest named by `reference`, `None` if there is none.
    async fn fetch_manifest(&self, reference: &Reference) -> anyhow::Result<Option<Manifest>>;

    /// Push a blob into the repository of `reference`. Returns its digest.
    async fn push_blob(&self, reference: &Reference, data: Vec<u8>) -> anyhow::Result<String>;

    /// Push a manifest to the tag or digest of `reference`.
    async fn push_manifest(
        &self,
        reference: &Reference,
        data: Vec<u8>,
        media_type: &str,
    ) -> anyhow::Result<()>;
}

/// Resolve through any [`RegistryClient`].
pub(crate) async fn resolve_with(
    client: &dyn RegistryClient,
    reference: &Reference,
) -> Result<ContentDescriptor> {
    let resolution_error = |source: anyhow::Error| Error::ReferenceResolution {
        reference: reference.whole(),
        source,
    };

    let manifest = client
        .fetch_manifest(reference)
        .await
        .map_err(resolution_error)?
        .ok_or_else(|| resolution_error(anyhow::anyhow!("manifest not found")))?;

    manifest.descriptor().map_err(resolution_error)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaTypeProbe {
    media_type: Option<String>,
    manifests: Option<serde_json::Value>,
}

/// Media type of a manifest document. OCI manifests may omit `mediaType`,
/// in which case the presence of `manifests` tells an index apart.
pub fn media_type_of(data: &[u8]) -> String {
    match serde_json::from_slice::<MediaTypeProbe>(data) {
        Ok(MediaTypeProbe {
            media_type: Some(media_type),
            ..
        }) => media_type,
        Ok(MediaTypeProbe {
            manifests: Some(_), ..
        }) => OCI_IMAGE_INDEX_MEDIA_TYPE.to_string(),
        _ => OCI_IMAGE_MEDIA_TYPE.to_string(),
    }
}
