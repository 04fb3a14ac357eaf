// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Where a signature is published.
//!
//! Tag grammars forbid `:`, so the manifest digest is re-encoded by
//! replacing its algorithm separator with `-`:
//! `sha256:abc...` is published as the tag `sha256-abc...` in the image's
//! own repository. Hex never contains `-`, which keeps the mapping
//! injective and lets [`PublicationAddress::to_digest`] undo it.

use std::fmt;

use oci_client::Reference;

use crate::{digest::Digest, Error, Result};

pub const TAG_SEPARATOR: char = '-';

/// The signature tag derived from a manifest digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicationAddress {
    tag: String,
}

/// Derive the publication address of `digest`. Depends on nothing else.
pub fn derive(digest: &Digest) -> PublicationAddress {
    PublicationAddress {
        tag: format!("{}{TAG_SEPARATOR}{}", digest.algorithm(), digest.value()),
    }
}

impl PublicationAddress {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Recover the digest this address was derived from.
    pub fn to_digest(&self) -> Result<Digest> {
        let (algorithm, value) = self
            .tag
            .rsplit_once(TAG_SEPARATOR)
            .ok_or_else(|| Error::InvalidDigestFormat(self.tag.clone()))?;
        Digest::try_from(format!("{algorithm}:{value}").as_str())
    }

    /// Scope this address to the registry and repository of `image`.
    pub fn within(&self, image: &Reference) -> Reference {
        Reference::with_tag(
            image.registry().to_string(),
            image.repository().to_string(),
            self.tag.clone(),
        )
    }
}

impl TryFrom<&str> for PublicationAddress {
    type Error = Error;

    /// Accept an existing signature tag, checking that it decodes to a digest.
    fn try_from(tag: &str) -> Result<Self> {
        let address = Self {
            tag: tag.to_string(),
        };
        address.to_digest()?;
        Ok(address)
    }
}

impl fmt::Display for PublicationAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}
