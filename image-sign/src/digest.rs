// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::{fmt, str::FromStr};

use sha2::{Digest as _, Sha256};

use crate::{Error, Result};

pub const DIGEST_SHA256_PREFIX: &str = "sha256:";

const ALGORITHM_SEPARATORS: [char; 4] = ['+', '.', '_', '-'];

/// A content digest in the `algorithm:hex` form, e.g.
/// `sha256:7bd0c945d7e4...`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    value: String,
}

impl Digest {
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The hex encoded part after the `:`.
    pub fn value(&self) -> &str {
        &self.value
    }
}

// algorithm-component ::= [a-z0-9]+, joined by one of `+._-`
fn is_valid_algorithm(algorithm: &str) -> bool {
    !algorithm.is_empty()
        && algorithm.split(ALGORITHM_SEPARATORS).all(|component| {
            !component.is_empty()
                && component
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

impl TryFrom<&str> for Digest {
    type Error = Error;

    fn try_from(digest: &str) -> Result<Self> {
        let (algorithm, value) = digest
            .split_once(':')
            .ok_or_else(|| Error::InvalidDigestFormat(digest.to_string()))?;

        if !is_valid_algorithm(algorithm)
            || value.is_empty()
            || !value.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::InvalidDigestFormat(digest.to_string()));
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            value: value.to_string(),
        })
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

/// Digest of a blob as pushed to a registry.
pub fn sha256_digest(data: &[u8]) -> String {
    format!("{}{:x}", DIGEST_SHA256_PREFIX, Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("sha256:abc123", "sha256", "abc123")]
    #[case(
        "sha256:7bd0c945d7e4cc2ce5c21d449ba07eb89c8e6c28085edbcf6f5fa4bf90e7eedc",
        "sha256",
        "7bd0c945d7e4cc2ce5c21d449ba07eb89c8e6c28085edbcf6f5fa4bf90e7eedc"
    )]
    #[case("sha512:00ff", "sha512", "00ff")]
    #[case("multihash+base58:0a", "multihash+base58", "0a")]
    fn parse_valid_digest(#[case] input: &str, #[case] algorithm: &str, #[case] value: &str) {
        let digest = Digest::try_from(input).unwrap();
        assert_eq!(digest.algorithm(), algorithm);
        assert_eq!(digest.value(), value);
        assert_eq!(digest.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("sha256")]
    #[case("sha256:")]
    #[case(":abc123")]
    #[case("sha256:xyz")]
    #[case("SHA256:abc123")]
    #[case("sha256:abc:123")]
    #[case("sha256-abc123")]
    #[case("sha+:abc")]
    fn reject_invalid_digest(#[case] input: &str) {
        assert!(matches!(
            Digest::try_from(input),
            Err(Error::InvalidDigestFormat(s)) if s == input
        ));
    }

    #[test]
    fn sha256_of_empty_blob() {
        assert_eq!(
            sha256_digest(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
