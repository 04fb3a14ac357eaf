// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Publication of a signature into a registry.
//!
//! Every layout is an [`Uploader`]. The layouts available to a process are
//! collected once in an [`UploaderRegistry`] and looked up by the name
//! given with `--format`.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use oci_client::{
    manifest::{OciDescriptor, OciImageManifest, OCI_IMAGE_MEDIA_TYPE},
    Reference,
};
use strum::{AsRefStr, Display, EnumString};

use crate::{registry::RegistryClient, signer::Signature, Error, Result};

pub mod compat;
pub mod index;

/// Media type of the simple signing payload layer.
pub const SIMPLE_SIGNING_MEDIA_TYPE: &str = "application/vnd.dev.cosign.simplesigning.v1+json";

/// Layer or descriptor annotation carrying the base64 signature.
pub const SIGNATURE_ANNOTATION: &str = "dev.cosignproject.cosign/signature";

const OCI_CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.image.config.v1+json";
const EMPTY_CONFIG: &[u8] = b"{}";

#[async_trait]
pub trait Uploader: Send + Sync {
    /// Publish `signature` over `payload` at `address`.
    ///
    /// Either the signature is fully visible at `address` afterwards, or
    /// nothing observable changed there. Failures are [`Error::Upload`].
    async fn upload(&self, signature: &Signature, payload: &[u8], address: &Reference)
        -> Result<()>;
}

#[derive(EnumString, AsRefStr, Display, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    /// One manifest at the signature tag, one layer per signature.
    Compat,

    /// An image index at the signature tag, one manifest per signature.
    Index,
}

impl Format {
    pub const DEFAULT: Format = Format::Compat;

    /// Parse a format flag, ignoring ASCII case.
    pub fn parse(name: &str) -> Result<Self> {
        Format::try_from(name).map_err(|_| Error::UnsupportedFormat(name.to_string()))
    }
}

/// Uploaders keyed by [`Format`], built once at startup.
pub struct UploaderRegistry {
    uploaders: BTreeMap<Format, Box<dyn Uploader>>,
}

impl UploaderRegistry {
    /// Register every built in format on top of `client`.
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        let mut uploaders: BTreeMap<Format, Box<dyn Uploader>> = BTreeMap::new();
        uploaders.insert(
            Format::Compat,
            Box::new(compat::CompatUploader::new(client.clone())),
        );
        uploaders.insert(Format::Index, Box::new(index::IndexUploader::new(client)));
        Self { uploaders }
    }

    /// Look up the uploader of `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Result<&dyn Uploader> {
        self.uploaders
            .get(&Format::parse(name)?)
            .map(|uploader| uploader.as_ref())
            .ok_or_else(|| Error::UnsupportedFormat(name.to_string()))
    }

    pub fn formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.uploaders.keys().copied()
    }
}

/// Payload layer descriptor, annotated with the signature.
pub(crate) fn signature_layer(
    signature: &Signature,
    payload: &[u8],
    digest: String,
) -> OciDescriptor {
    OciDescriptor {
        media_type: SIMPLE_SIGNING_MEDIA_TYPE.to_string(),
        digest,
        size: payload.len() as i64,
        urls: None,
        annotations: Some(BTreeMap::from([(
            SIGNATURE_ANNOTATION.to_string(),
            signature.to_base64(),
        )])),
    }
}

/// Push the empty config blob every signature manifest points at.
pub(crate) async fn push_config(
    client: &dyn RegistryClient,
    address: &Reference,
) -> anyhow::Result<OciDescriptor> {
    let digest = client.push_blob(address, EMPTY_CONFIG.to_vec()).await?;
    Ok(OciDescriptor {
        media_type: OCI_CONFIG_MEDIA_TYPE.to_string(),
        digest,
        size: EMPTY_CONFIG.len() as i64,
        urls: None,
        annotations: None,
    })
}

pub(crate) fn signature_manifest(
    config: OciDescriptor,
    layers: Vec<OciDescriptor>,
) -> OciImageManifest {
    OciImageManifest {
        schema_version: 2,
        media_type: Some(OCI_IMAGE_MEDIA_TYPE.to_string()),
        config,
        layers,
        ..Default::default()
    }
}

pub(crate) fn upload_error(address: &Reference) -> impl Fn(anyhow::Error) -> Error + '_ {
    move |source| Error::Upload {
        address: address.whole(),
        source,
    }
}
