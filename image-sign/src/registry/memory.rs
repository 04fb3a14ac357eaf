// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use oci_client::Reference;

use super::{resolve_with, ContentDescriptor, Manifest, RegistryClient, Resolver};
use crate::digest::sha256_digest;

const DEFAULT_TAG: &str = "latest";

/// A registry kept in process memory. Manifests pushed to a tag can also
/// be fetched by their digest, like on a real registry.
#[derive(Default)]
pub struct MemoryRegistry {
    manifests: Mutex<HashMap<String, Manifest>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    resolve_calls: AtomicUsize,
    manifest_pushes: AtomicUsize,
    reject_pushes: AtomicBool,
}

fn repository_key(reference: &Reference) -> String {
    format!("{}/{}", reference.registry(), reference.repository())
}

fn manifest_key(reference: &Reference) -> String {
    match reference.digest() {
        Some(digest) => format!("{}@{digest}", repository_key(reference)),
        None => format!(
            "{}:{}",
            repository_key(reference),
            reference.tag().unwrap_or(DEFAULT_TAG)
        ),
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` as the manifest of `reference`, returning its digest.
    pub fn insert_manifest(&self, reference: &Reference, data: Vec<u8>) -> Result<String> {
        let digest = sha256_digest(&data);
        let manifest = Manifest::new(data, digest.clone());
        let by_digest = format!("{}@{digest}", repository_key(reference));

        let mut manifests = self
            .manifests
            .lock()
            .map_err(|_| anyhow!("manifest store poisoned"))?;
        manifests.insert(manifest_key(reference), manifest.clone());
        manifests.insert(by_digest, manifest);
        Ok(digest)
    }

    pub fn manifest(&self, reference: &Reference) -> Option<Manifest> {
        self.manifests
            .lock()
            .ok()
            .and_then(|m| m.get(&manifest_key(reference)).cloned())
    }

    pub fn blob(&self, reference: &Reference, digest: &str) -> Option<Vec<u8>> {
        let key = format!("{}@{digest}", repository_key(reference));
        self.blobs.lock().ok().and_then(|b| b.get(&key).cloned())
    }

    /// Make every following push fail, to simulate an unreachable registry.
    pub fn reject_pushes(&self, reject: bool) {
        self.reject_pushes.store(reject, Ordering::SeqCst);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn manifest_pushes(&self) -> usize {
        self.manifest_pushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn fetch_manifest(&self, reference: &Reference) -> Result<Option<Manifest>> {
        Ok(self.manifest(reference))
    }

    async fn push_blob(&self, reference: &Reference, data: Vec<u8>) -> Result<String> {
        if self.reject_pushes.load(Ordering::SeqCst) {
            bail!("push rejected by {}", reference.registry());
        }

        let digest = sha256_digest(&data);
        let key = format!("{}@{digest}", repository_key(reference));
        self.blobs
            .lock()
            .map_err(|_| anyhow!("blob store poisoned"))?
            .insert(key, data);
        Ok(digest)
    }

    async fn push_manifest(
        &self,
        reference: &Reference,
        data: Vec<u8>,
        _media_type: &str,
    ) -> Result<()> {
        if self.reject_pushes.load(Ordering::SeqCst) {
            bail!("push rejected by {}", reference.registry());
        }

        self.insert_manifest(reference, data)?;
        self.manifest_pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Resolver for MemoryRegistry {
    async fn resolve(&self, reference: &Reference) -> crate::Result<ContentDescriptor> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        resolve_with(self, reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn resolve_pushed_manifest() {
        let registry = MemoryRegistry::new();
        let reference = Reference::try_from("quay.io/example/app:v1").unwrap();
        let data = br#"{"schemaVersion":2,"layers":[]}"#.to_vec();
        let digest = registry.insert_manifest(&reference, data.clone()).unwrap();

        let descriptor = registry.resolve(&reference).await.unwrap();
        assert_eq!(descriptor.digest.to_string(), digest);
        assert_eq!(descriptor.size, data.len() as u64);

        let by_digest = Reference::try_from(format!("quay.io/example/app@{digest}")).unwrap();
        assert_eq!(registry.manifest(&by_digest).unwrap().data, data);
        assert_eq!(registry.resolve_calls(), 1);
    }

    #[tokio::test]
    async fn resolve_unknown_reference() {
        let registry = MemoryRegistry::new();
        let reference = Reference::try_from("quay.io/example/app:missing").unwrap();
        assert!(matches!(
            registry.resolve(&reference).await,
            Err(Error::ReferenceResolution { .. })
        ));
    }

    #[tokio::test]
    async fn rejected_push() {
        let registry = MemoryRegistry::new();
        registry.reject_pushes(true);
        let reference = Reference::try_from("quay.io/example/app:v1").unwrap();
        assert!(registry.push_blob(&reference, vec![1]).await.is_err());
        assert!(registry
            .push_manifest(&reference, b"{}".to_vec(), "")
            .await
            .is_err());
        assert_eq!(registry.manifest_pushes(), 0);
    }
}
