//! The per-request resolution function.

use sha2::{Digest, Sha256};

use statichost_protocol::types::StorageRef;
use statichost_registry::{AssetRegistry, AssetStore};

use crate::ServeError;

/// The SPA shell document used for extensionless fallback.
const SPA_SHELL_PATH: &str = "/index.html";

/// Serving configuration, fixed for the lifetime of a handler.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Route prefix stripped from incoming paths (e.g. `/app`).
    pub route_prefix: String,
    /// Serve the shell document for extensionless misses.
    pub spa_fallback: bool,
    /// Base URL for edge-store redirects. Unset disables redirects.
    pub cdn_base_url: Option<String>,
}

/// Cache-Control decision for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Revalidate on every request. HTML documents: the path is
    /// stable while the content changes per deploy.
    Revalidate,
    /// Cache forever. Non-HTML assets are content-hashed by the build
    /// tool, so any change produces a new path.
    Immutable,
}

impl CachePolicy {
    /// The `Cache-Control` header value for this policy.
    pub fn header_value(&self) -> &'static str {
        match self {
            CachePolicy::Revalidate => "no-cache",
            CachePolicy::Immutable => "public, max-age=31536000, immutable",
        }
    }
}

/// How the host handler should answer a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No asset for this path (a normal outcome, not an error).
    NotFound,
    /// The client's validator still matches; send 304 with no body.
    NotModified { etag: String },
    /// Stream the object from block storage.
    Serve {
        storage_id: String,
        content_type: String,
        cache: CachePolicy,
        /// Strong validator; present for revalidate-policy responses.
        etag: Option<String>,
    },
    /// Redirect to the edge store; it owns the final byte delivery.
    Redirect { location: String, cache: CachePolicy },
}

/// Resolves request paths against the registry snapshot.
///
/// Read semantics only (GET/HEAD-equivalent); callers gate other verbs
/// before resolving.
pub struct Resolver<S> {
    registry: AssetRegistry<S>,
    config: ResolverConfig,
}

impl<S: AssetStore> Resolver<S> {
    pub fn new(registry: AssetRegistry<S>, config: ResolverConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &AssetRegistry<S> {
        &self.registry
    }

    /// Decides how to answer `request_path`.
    ///
    /// `if_none_match` is the client's conditional validator, compared
    /// against the asset's ETag for revalidate-policy responses.
    pub async fn resolve(
        &self,
        request_path: &str,
        if_none_match: Option<&str>,
    ) -> Result<Resolution, ServeError> {
        let path = self.strip_prefix(request_path);

        let mut asset = self.registry.lookup(path).await?;

        // Client-side-router paths (`/app/settings`) resolve to the
        // shell document when nothing matches directly.
        if asset.is_none() && self.config.spa_fallback && !has_extension(path) {
            asset = self.registry.lookup(SPA_SHELL_PATH).await?;
        }

        let Some(asset) = asset else {
            return Ok(Resolution::NotFound);
        };

        let cache = if asset.content_type.starts_with("text/html") {
            CachePolicy::Revalidate
        } else {
            CachePolicy::Immutable
        };

        if let (Some(base), StorageRef::Cdn { blob_id }) =
            (self.config.cdn_base_url.as_deref(), &asset.storage_ref)
        {
            return Ok(Resolution::Redirect {
                location: format!("{}/{blob_id}", base.trim_end_matches('/')),
                cache,
            });
        }

        match asset.storage_ref {
            StorageRef::Blob { storage_id } => {
                let etag = match cache {
                    CachePolicy::Revalidate => {
                        let etag = etag_for(&storage_id, &asset.deployment_id);
                        if if_none_match == Some(etag.as_str()) {
                            return Ok(Resolution::NotModified { etag });
                        }
                        Some(etag)
                    }
                    CachePolicy::Immutable => None,
                };
                Ok(Resolution::Serve {
                    storage_id,
                    content_type: asset.content_type,
                    cache,
                    etag,
                })
            }
            // Reachable only with no cdn_base_url configured; the
            // resolver cannot stream edge bytes itself.
            StorageRef::Cdn { .. } => Err(ServeError::MissingCdnBase),
        }
    }

    fn strip_prefix<'a>(&self, request_path: &'a str) -> &'a str {
        let stripped = request_path
            .strip_prefix(self.config.route_prefix.as_str())
            .unwrap_or(request_path);
        if stripped.is_empty() { "/" } else { stripped }
    }
}

/// Strong validator derived from the storage identifier and the owning
/// generation — stable for unchanged content, new on every redeploy.
fn etag_for(storage_id: &str, deployment_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(storage_id.as_bytes());
    hasher.update(b":");
    hasher.update(deployment_id.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("\"{}\"", &digest[..32])
}

/// Heuristic: the final path segment carries a file extension.
fn has_extension(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|seg| seg.contains('.'))
}
