// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! # Crypto
//!
//! This crate encapsulates the asymmetric key operations used to sign
//! container image payloads. Everything is implemented in pure rust.
//!
//! ## Components
//!
//! - `ed25519`: Ed25519 private key material and the deterministic
//!   signing primitive over it. Keys can be decoded from PKCS#8 PEM
//!   documents, optionally encrypted with a passphrase (PKCS#5 v2).

mod ed25519;
pub use ed25519::*;
