// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! # Overall
//! Sign a container image and publish the signature into the image's own
//! repository, under a tag derived from the image's manifest digest.
//!
//! # Workflow
//! 1. Resolve the image reference to its manifest [`registry::ContentDescriptor`].
//! 2. Build the simple signing [`payload`] bound to that digest.
//! 3. Sign the payload with the Ed25519 key loaded by a [`keys::KeyLoader`].
//! 4. Either print the signature, or derive the publication [`address`]
//!    and hand everything to an [`upload::Uploader`].
//!
//! The orchestration lives in [`gate::PublicationGate`].

pub mod address;
pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod gate;
pub mod keys;
pub mod payload;
pub mod registry;
pub mod signer;
pub mod upload;

pub use error::{Error, Result};
pub use gate::{sign_image, Outcome, PublicationGate, SignOptions, SignRequest};

/// Mapping from annotation key to value carried in the signed payload.
pub type AnnotationSet = std::collections::BTreeMap<String, String>;
