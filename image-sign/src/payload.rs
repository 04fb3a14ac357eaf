// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Payload format of cosign simple signing.
//!
//! The payload is the JSON document that actually gets signed. It binds the
//! signature to one manifest digest through `critical.image`, and carries the
//! caller's annotations under `optional`. See
//! <https://github.com/containers/image/blob/main/docs/containers-signature.5.md>
//! for the general layout.

use serde::{Deserialize, Serialize};

use crate::{digest::Digest, AnnotationSet, Error, Result};

pub const COSIGN_SIGNATURE_TYPE: &str = "cosign container signature";

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SimpleSigning {
    pub critical: Critical,
    pub optional: Option<AnnotationSet>,
}

// A JSON object which contains data critical to correctly evaluating the validity of a signature.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Critical {
    pub identity: Identity,
    pub image: Image,
    #[serde(rename = "type")]
    pub type_name: String,
}

// The claimed identity of the image. Signatures produced here do not claim
// one, the binding is carried by the manifest digest alone.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct Identity {
    #[serde(rename = "docker-reference")]
    pub docker_reference: String,
}

// Identifies the container image this signature applies to.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Image {
    #[serde(rename = "docker-manifest-digest")]
    pub docker_manifest_digest: String,
}

impl SimpleSigning {
    pub fn new(digest: &Digest, annotations: &AnnotationSet) -> Self {
        let optional = (!annotations.is_empty()).then(|| annotations.clone());

        Self {
            critical: Critical {
                identity: Identity::default(),
                image: Image {
                    docker_manifest_digest: digest.to_string(),
                },
                type_name: COSIGN_SIGNATURE_TYPE.to_string(),
            },
            optional,
        }
    }

    pub fn from_slice(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    pub fn manifest_digest(&self) -> &str {
        &self.critical.image.docker_manifest_digest
    }

    pub fn annotations(&self) -> Option<&AnnotationSet> {
        self.optional.as_ref()
    }
}

/// Build the canonical payload to sign for `digest`.
///
/// The output only depends on its inputs: struct fields serialize in a
/// fixed order and annotations are a sorted map, so equal annotation sets
/// always produce byte-identical payloads.
pub fn build(digest: &str, annotations: &AnnotationSet) -> Result<Vec<u8>> {
    let digest = Digest::try_from(digest)?;
    let payload = SimpleSigning::new(&digest, annotations);

    serde_json::to_vec(&payload)
        .map_err(|e| Error::SigningFailure(format!("failed to serialize payload: {e}")))
}
