// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Registry credentials read from a docker `config.json` style auth file.

use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use oci_client::{secrets::RegistryAuth, Reference};
use serde::{Deserialize, Serialize};

const DOCKER_HUB_REGISTRIES: [&str; 2] = ["docker.io", "index.docker.io"];
const DOCKER_HUB_LEGACY_KEY: &str = "https://index.docker.io/v1/";

/// Where docker keeps `config.json`: `$DOCKER_CONFIG`, else `$HOME/.docker`.
pub fn default_auth_file() -> Option<PathBuf> {
    env::var_os("DOCKER_CONFIG")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".docker")))
        .map(|dir| dir.join("config.json"))
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, DockerAuthConfig>,
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub struct DockerAuthConfig {
    auth: String,
}

#[derive(Default, Debug)]
pub struct Auth {
    docker_config_file: DockerConfigFile,
}

impl Auth {
    pub fn new(auth_file: &[u8]) -> Result<Self> {
        let docker_config_file: DockerConfigFile = serde_json::from_slice(auth_file)?;
        Ok(Self { docker_config_file })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("read auth file {}", path.display()))?;
        Self::new(&content)
    }

    /// Get a credential (RegistryAuth) for the given Reference. Registries
    /// without an entry are accessed anonymously.
    pub fn credential_for_reference(&self, reference: &Reference) -> Result<RegistryAuth> {
        let registry = reference.resolve_registry();
        let Some(entry) = self.lookup(registry) else {
            debug!("no credential for {registry}, using anonymous access");
            return Ok(RegistryAuth::Anonymous);
        };

        let decoded = STANDARD
            .decode(entry.auth.trim())
            .with_context(|| format!("decode credential of {registry}"))?;
        let decoded = String::from_utf8(decoded)?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| anyhow!("credential of {registry} is not `username:password`"))?;

        Ok(RegistryAuth::Basic(username.to_string(), password.to_string()))
    }

    fn lookup(&self, registry: &str) -> Option<&DockerAuthConfig> {
        let auths = &self.docker_config_file.auths;
        auths
            .get(registry)
            .or_else(|| auths.get(&format!("https://{registry}")))
            .or_else(|| {
                DOCKER_HUB_REGISTRIES
                    .contains(&registry)
                    .then(|| auths.get(DOCKER_HUB_LEGACY_KEY))
                    .flatten()
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serial_test::serial;

    use super::*;

    // "user:pass" and "robot:s3cr3t:with:colons"
    const AUTH_FILE: &str = r#"{
        "auths": {
            "quay.io": { "auth": "dXNlcjpwYXNz" },
            "https://ghcr.io": { "auth": "cm9ib3Q6czNjcjN0OndpdGg6Y29sb25z" },
            "https://index.docker.io/v1/": { "auth": "dXNlcjpwYXNz" },
            "broken.example.com": { "auth": "%%%" }
        }
    }"#;

    #[rstest]
    #[case("quay.io/example/app:latest", "user", "pass")]
    #[case("ghcr.io/org/app:v1", "robot", "s3cr3t:with:colons")]
    #[case("busybox:latest", "user", "pass")]
    fn basic_credential(#[case] image: &str, #[case] username: &str, #[case] password: &str) {
        let auth = Auth::new(AUTH_FILE.as_bytes()).unwrap();
        let reference = Reference::try_from(image).unwrap();
        match auth.credential_for_reference(&reference).unwrap() {
            RegistryAuth::Basic(u, p) => {
                assert_eq!(u, username);
                assert_eq!(p, password);
            }
            other => panic!("unexpected credential {other:?}"),
        }
    }

    #[rstest]
    #[case(AUTH_FILE, "registry.example.com/app:v1")]
    #[case("{}", "quay.io/example/app:latest")]
    fn anonymous_credential(#[case] config: &str, #[case] image: &str) {
        let auth = Auth::new(config.as_bytes()).unwrap();
        let reference = Reference::try_from(image).unwrap();
        assert!(matches!(
            auth.credential_for_reference(&reference).unwrap(),
            RegistryAuth::Anonymous
        ));
    }

    #[test]
    fn malformed_credential() {
        let auth = Auth::new(AUTH_FILE.as_bytes()).unwrap();
        let reference = Reference::try_from("broken.example.com/app:v1").unwrap();
        assert!(auth.credential_for_reference(&reference).is_err());
    }

    #[test]
    #[serial]
    fn docker_config_location() {
        let saved = env::var_os("DOCKER_CONFIG");
        env::set_var("DOCKER_CONFIG", "/tmp/docker-conf");
        let path = default_auth_file();
        match saved {
            Some(value) => env::set_var("DOCKER_CONFIG", value),
            None => env::remove_var("DOCKER_CONFIG"),
        }
        assert_eq!(path, Some(PathBuf::from("/tmp/docker-conf/config.json")));
    }

    #[test]
    fn read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, AUTH_FILE).unwrap();
        assert!(Auth::from_file(&path).is_ok());
        assert!(Auth::from_file(&dir.path().join("missing.json")).is_err());
    }
}
