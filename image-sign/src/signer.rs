// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use crypto::{KeyMaterial, ED25519_SIGNATURE_LENGTH};

use crate::{Error, Result};

/// A detached Ed25519 signature over a payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; ED25519_SIGNATURE_LENGTH]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; ED25519_SIGNATURE_LENGTH] {
        &self.0
    }

    /// Standard alphabet, padded. This is how signatures are printed and
    /// how they are stored in registry annotations.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.to_base64()).finish()
    }
}

impl From<[u8; ED25519_SIGNATURE_LENGTH]> for Signature {
    fn from(bytes: [u8; ED25519_SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }
}

/// Sign `payload` as is. The same key and payload always give the same
/// signature.
pub fn sign(payload: &[u8], key: &KeyMaterial) -> Result<Signature> {
    crypto::sign(key, payload)
        .map(Signature)
        .map_err(|e| Error::SigningFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Verifier, VerifyingKey};

    use super::*;
    use crate::{payload, AnnotationSet};

    fn test_key() -> KeyMaterial {
        KeyMaterial::from_bytes(&[42u8; 32]).unwrap()
    }

    #[test]
    fn signature_verifies_with_public_key() {
        let key = test_key();
        let payload = payload::build("sha256:abc123", &AnnotationSet::new()).unwrap();
        let signature = sign(&payload, &key).unwrap();

        let verifying_key = VerifyingKey::from_bytes(&key.public_key()).unwrap();
        let parsed = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        assert!(verifying_key.verify(&payload, &parsed).is_ok());
    }

    #[test]
    fn same_input_same_signature() {
        let key = test_key();
        assert_eq!(sign(b"abc", &key).unwrap(), sign(b"abc", &key).unwrap());
    }

    #[test]
    fn one_byte_change_alters_signature() {
        let key = test_key();
        let mut payload = payload::build("sha256:abc123", &AnnotationSet::new()).unwrap();
        let original = sign(&payload, &key).unwrap();

        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        assert_ne!(sign(&payload, &key).unwrap(), original);
    }

    #[test]
    fn one_digest_character_alters_signature() {
        let key = test_key();
        let sign_digest = |digest: &str| {
            let payload = payload::build(digest, &AnnotationSet::new()).unwrap();
            sign(&payload, &key).unwrap()
        };
        assert_ne!(sign_digest("sha256:abc123"), sign_digest("sha256:abc124"));
    }

    #[test]
    fn empty_payload_is_signable() {
        assert!(sign(b"", &test_key()).is_ok());
    }

    #[test]
    fn base64_is_standard_alphabet() {
        let signature = Signature::from([0xffu8; ED25519_SIGNATURE_LENGTH]);
        let encoded = signature.to_base64();
        assert_eq!(encoded.len(), 88);
        assert!(encoded.ends_with("=="));
        assert!(encoded.contains('/'));
        assert_eq!(STANDARD.decode(encoded).unwrap(), vec![0xffu8; 64]);
    }
}
