fn main() {
    println!("Run `cargo test -p statichost-e2e` to execute end-to-end deploy tests.");
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use statichost_deploy::{
        ClientFuture, DeployClient, DeployError, DeployOptions, DeployOrchestrator,
    };
    use statichost_protocol::envelope::Message;
    use statichost_protocol::functions::FunctionName;
    use statichost_protocol::messages::{
        DeleteCdnBlobsRequest, DeleteCdnBlobsResponse, GarbageCollectRequest,
        GarbageCollectResponse, GenerateUploadUrlsRequest, GenerateUploadUrlsResponse,
        GetCurrentDeploymentResponse, RecordAssetRequest, RecordAssetsRequest,
        RecordAssetsResponse, UploadCdnBlobRequest, UploadCdnBlobResponse,
    };
    use statichost_protocol::types::{Asset, DeploymentInfo, UploadUrl};
    use statichost_registry::{
        AssetRegistry, DeploymentTracker, EntryPoints, MemoryAssetStore,
    };
    use statichost_serve::{CachePolicy, Resolution, Resolver, ResolverConfig};
    use statichost_storage::{BlockStore, MemoryBlockStore, MemoryCdnStore};

    /// Deploy client wired directly to the entry points over the
    /// in-memory backends. Byte uploads against one-time URLs hit
    /// block storage directly, bypassing the entry points, exactly
    /// like the real transfer path.
    struct LocalBackend {
        entry: EntryPoints<MemoryAssetStore, MemoryBlockStore, MemoryCdnStore>,
        blocks: MemoryBlockStore,
        seq: AtomicU64,
    }

    impl LocalBackend {
        fn next_id(&self) -> String {
            format!("call-{}", self.seq.fetch_add(1, Ordering::Relaxed))
        }

        async fn call<Req, Resp>(&self, function: FunctionName, req: &Req) -> Result<Resp, DeployError>
        where
            Req: serde::Serialize,
            Resp: for<'de> serde::Deserialize<'de>,
        {
            let msg = Message::new(self.next_id(), function, Some(req))?;
            let reply = self.entry.handle(msg).await;
            if let Some(err) = reply.error {
                return Err(DeployError::Backend(err.message));
            }
            reply
                .parse_payload::<Resp>()?
                .ok_or_else(|| DeployError::Backend("empty reply payload".into()))
        }
    }

    impl DeployClient for LocalBackend {
        fn generate_upload_urls(&self, count: u32) -> ClientFuture<'_, Vec<UploadUrl>> {
            Box::pin(async move {
                let resp: GenerateUploadUrlsResponse = self
                    .call(
                        FunctionName::GenerateUploadUrls,
                        &GenerateUploadUrlsRequest { count },
                    )
                    .await?;
                Ok(resp.urls)
            })
        }

        fn upload_block(&self, url: &UploadUrl, data: Vec<u8>) -> ClientFuture<'_, String> {
            let token = url.token.clone();
            Box::pin(async move {
                self.blocks
                    .put(&token, data)
                    .await
                    .map_err(|e| DeployError::Upload(e.to_string()))
            })
        }

        fn upload_cdn_blob(&self, data: Vec<u8>, content_type: &str) -> ClientFuture<'_, String> {
            let content_type = content_type.to_string();
            Box::pin(async move {
                let resp: UploadCdnBlobResponse = self
                    .call(
                        FunctionName::UploadCdnBlob,
                        &UploadCdnBlobRequest { content_type, data },
                    )
                    .await?;
                Ok(resp.blob_id)
            })
        }

        fn record_asset(&self, asset: Asset) -> ClientFuture<'_, ()> {
            Box::pin(async move {
                let _: RecordAssetsResponse = self
                    .call(FunctionName::RecordAsset, &RecordAssetRequest { asset })
                    .await?;
                Ok(())
            })
        }

        fn record_assets(&self, assets: Vec<Asset>) -> ClientFuture<'_, u64> {
            Box::pin(async move {
                let resp: RecordAssetsResponse = self
                    .call(FunctionName::RecordAssets, &RecordAssetsRequest { assets })
                    .await?;
                Ok(resp.recorded)
            })
        }

        fn garbage_collect(
            &self,
            current_deployment_id: &str,
        ) -> ClientFuture<'_, GarbageCollectResponse> {
            let current_deployment_id = current_deployment_id.to_string();
            Box::pin(async move {
                self.call(
                    FunctionName::GarbageCollect,
                    &GarbageCollectRequest {
                        current_deployment_id,
                    },
                )
                .await
            })
        }

        fn delete_cdn_blobs(&self, blob_ids: Vec<String>) -> ClientFuture<'_, u64> {
            Box::pin(async move {
                let resp: DeleteCdnBlobsResponse = self
                    .call(
                        FunctionName::DeleteCdnBlobs,
                        &DeleteCdnBlobsRequest { blob_ids },
                    )
                    .await?;
                Ok(resp.deleted)
            })
        }

        fn get_current_deployment(&self) -> ClientFuture<'_, Option<DeploymentInfo>> {
            Box::pin(async move {
                let resp: GetCurrentDeploymentResponse = self
                    .call(FunctionName::GetCurrentDeployment, &serde_json::json!({}))
                    .await?;
                Ok(resp.deployment)
            })
        }
    }

    /// Wraps a client and fails `garbage_collect`, simulating a crash
    /// between registration and sweep.
    struct CrashBeforeSweep(Arc<LocalBackend>);

    impl DeployClient for CrashBeforeSweep {
        fn generate_upload_urls(&self, count: u32) -> ClientFuture<'_, Vec<UploadUrl>> {
            self.0.generate_upload_urls(count)
        }
        fn upload_block(&self, url: &UploadUrl, data: Vec<u8>) -> ClientFuture<'_, String> {
            self.0.upload_block(url, data)
        }
        fn upload_cdn_blob(&self, data: Vec<u8>, content_type: &str) -> ClientFuture<'_, String> {
            self.0.upload_cdn_blob(data, content_type)
        }
        fn record_asset(&self, asset: Asset) -> ClientFuture<'_, ()> {
            self.0.record_asset(asset)
        }
        fn record_assets(&self, assets: Vec<Asset>) -> ClientFuture<'_, u64> {
            self.0.record_assets(assets)
        }
        fn garbage_collect(
            &self,
            _current_deployment_id: &str,
        ) -> ClientFuture<'_, GarbageCollectResponse> {
            Box::pin(async { Err(DeployError::Backend("simulated crash before sweep".into())) })
        }
        fn delete_cdn_blobs(&self, blob_ids: Vec<String>) -> ClientFuture<'_, u64> {
            self.0.delete_cdn_blobs(blob_ids)
        }
        fn get_current_deployment(&self) -> ClientFuture<'_, Option<DeploymentInfo>> {
            self.0.get_current_deployment()
        }
    }

    struct World {
        backend: Arc<LocalBackend>,
        store: MemoryAssetStore,
        blocks: MemoryBlockStore,
        cdn: MemoryCdnStore,
    }

    fn world() -> World {
        let store = MemoryAssetStore::new();
        let blocks = MemoryBlockStore::new();
        let cdn = MemoryCdnStore::new();
        let entry = EntryPoints::new(
            AssetRegistry::new(store.clone()),
            DeploymentTracker::default(),
            blocks.clone(),
            cdn.clone(),
        );
        World {
            backend: Arc::new(LocalBackend {
                entry,
                blocks: blocks.clone(),
                seq: AtomicU64::new(0),
            }),
            store,
            blocks,
            cdn,
        }
    }

    fn registry(world: &World) -> AssetRegistry<MemoryAssetStore> {
        AssetRegistry::new(world.store.clone())
    }

    fn resolver(world: &World, config: ResolverConfig) -> Resolver<MemoryAssetStore> {
        Resolver::new(registry(world), config)
    }

    fn write_site(dir: &Path, files: &[(&str, &[u8])]) {
        for (rel, data) in files {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, data).unwrap();
        }
    }

    #[tokio::test]
    async fn two_generation_deploy_end_to_end() {
        let world = world();
        let orch = DeployOrchestrator::new();

        // Generation 1.
        let site = tempfile::tempdir().unwrap();
        write_site(
            site.path(),
            &[
                ("index.html", b"<html>v1</html>".as_slice()),
                ("assets/app.a1b2.js", b"console.log('v1')".as_slice()),
            ],
        );
        let report1 = orch
            .deploy(&world.backend, &DeployOptions::new(site.path()))
            .await
            .unwrap();
        assert_eq!(report1.uploaded, 2);

        let reg = registry(&world);
        let js1 = reg.lookup("/assets/app.a1b2.js").await.unwrap().unwrap();
        assert_eq!(js1.deployment_id, report1.deployment_id);
        let js1_storage = js1.storage_ref.id().to_string();
        assert!(world.blocks.contains(&js1_storage).await);

        // Hashed asset serves with the immutable policy.
        let res = resolver(&world, ResolverConfig::default())
            .resolve("/assets/app.a1b2.js", None)
            .await
            .unwrap();
        assert!(matches!(
            res,
            Resolution::Serve {
                cache: CachePolicy::Immutable,
                ..
            }
        ));

        // Generation 2: index changes in place, the hashed bundle is renamed.
        let site2 = tempfile::tempdir().unwrap();
        write_site(
            site2.path(),
            &[
                ("index.html", b"<html>v2</html>".as_slice()),
                ("assets/app.c3d4.js", b"console.log('v2')".as_slice()),
            ],
        );
        let report2 = orch
            .deploy(&world.backend, &DeployOptions::new(site2.path()))
            .await
            .unwrap();

        // The old hashed bundle is gone from the registry and its
        // bytes are gone from block storage.
        assert!(reg.lookup("/assets/app.a1b2.js").await.unwrap().is_none());
        assert_eq!(report2.swept, 1);
        assert!(!world.blocks.contains(&js1_storage).await);

        // Every surviving path belongs to generation 2 and resolves.
        for path in ["/index.html", "/assets/app.c3d4.js"] {
            let asset = reg.lookup(path).await.unwrap().unwrap();
            assert_eq!(asset.deployment_id, report2.deployment_id);
            assert!(world.blocks.contains(asset.storage_ref.id()).await);
        }

        // The pointer reports generation 2.
        let current = world.backend.get_current_deployment().await.unwrap().unwrap();
        assert_eq!(current.current_deployment_id, report2.deployment_id);

        // Served bytes are generation 2's.
        let res = resolver(&world, ResolverConfig::default())
            .resolve("/index.html", None)
            .await
            .unwrap();
        let Resolution::Serve {
            storage_id,
            etag: Some(etag),
            cache: CachePolicy::Revalidate,
            ..
        } = res
        else {
            panic!("expected revalidate Serve for html, got {res:?}");
        };
        assert_eq!(
            world.blocks.read(&storage_id).await.unwrap(),
            b"<html>v2</html>"
        );

        // Conditional revisit turns into a 304.
        let res = resolver(&world, ResolverConfig::default())
            .resolve("/index.html", Some(etag.as_str()))
            .await
            .unwrap();
        assert!(matches!(res, Resolution::NotModified { .. }));
    }

    #[tokio::test]
    async fn crash_between_register_and_sweep_keeps_old_generation_servable() {
        let world = world();
        let orch = DeployOrchestrator::new();

        let site1 = tempfile::tempdir().unwrap();
        write_site(
            site1.path(),
            &[
                ("index.html", b"<html>v1</html>".as_slice()),
                ("assets/app.a1b2.js", b"v1".as_slice()),
            ],
        );
        let report1 = orch
            .deploy(&world.backend, &DeployOptions::new(site1.path()))
            .await
            .unwrap();

        // Second deploy registers everything, then "crashes" before GC.
        let site2 = tempfile::tempdir().unwrap();
        write_site(
            site2.path(),
            &[
                ("index.html", b"<html>v2</html>".as_slice()),
                ("assets/app.c3d4.js", b"v2".as_slice()),
            ],
        );
        let crashing = Arc::new(CrashBeforeSweep(Arc::clone(&world.backend)));
        let result = orch
            .deploy(&crashing, &DeployOptions::new(site2.path()))
            .await;
        assert!(result.is_err());

        // No path from either generation is absent: the replaced index
        // serves the new bytes, the old hashed bundle still resolves.
        let reg = registry(&world);
        for path in ["/index.html", "/assets/app.a1b2.js", "/assets/app.c3d4.js"] {
            let asset = reg.lookup(path).await.unwrap();
            assert!(asset.is_some(), "{path} must stay resolvable");
            assert!(
                world
                    .blocks
                    .contains(asset.unwrap().storage_ref.id())
                    .await,
                "{path} bytes must stay resolvable"
            );
        }

        // The pointer never advanced past generation 1.
        let current = world.backend.get_current_deployment().await.unwrap().unwrap();
        assert_eq!(current.current_deployment_id, report1.deployment_id);

        // The next successful deploy reruns GC and converges.
        let report3 = orch
            .deploy(&world.backend, &DeployOptions::new(site2.path()))
            .await
            .unwrap();
        assert!(reg.lookup("/assets/app.a1b2.js").await.unwrap().is_none());
        let current = world.backend.get_current_deployment().await.unwrap().unwrap();
        assert_eq!(current.current_deployment_id, report3.deployment_id);
    }

    #[tokio::test]
    async fn cdn_mode_end_to_end() {
        let world = world();
        let orch = DeployOrchestrator::new();

        let site = tempfile::tempdir().unwrap();
        write_site(
            site.path(),
            &[
                ("index.html", b"<html>v1</html>".as_slice()),
                ("assets/app.a1b2.css", b"body{}".as_slice()),
            ],
        );
        let mut options = DeployOptions::new(site.path());
        options.cdn_enabled = true;
        orch.deploy(&world.backend, &options).await.unwrap();

        let reg = registry(&world);
        let css = reg.lookup("/assets/app.a1b2.css").await.unwrap().unwrap();
        assert!(css.storage_ref.is_cdn());
        let css_blob = css.storage_ref.id().to_string();
        assert!(world.cdn.contains(&css_blob).await);

        // CSS redirects to the edge store; HTML streams from block storage.
        let mut config = ResolverConfig::default();
        config.cdn_base_url = Some("https://cdn.example.com".into());
        let resolver = resolver(&world, config);

        let res = resolver.resolve("/assets/app.a1b2.css", None).await.unwrap();
        assert_eq!(
            res,
            Resolution::Redirect {
                location: format!("https://cdn.example.com/{css_blob}"),
                cache: CachePolicy::Immutable,
            }
        );
        assert!(matches!(
            resolver.resolve("/index.html", None).await.unwrap(),
            Resolution::Serve { .. }
        ));

        // Redeploy without the stylesheet: the edge blob is released
        // by the sweep and physically deleted.
        let site2 = tempfile::tempdir().unwrap();
        write_site(site2.path(), &[("index.html", b"<html>v2</html>".as_slice())]);
        let mut options2 = DeployOptions::new(site2.path());
        options2.cdn_enabled = true;
        let report2 = orch.deploy(&world.backend, &options2).await.unwrap();

        assert_eq!(report2.swept, 1);
        assert_eq!(report2.cdn_blobs_deleted, 1);
        assert!(reg.lookup("/assets/app.a1b2.css").await.unwrap().is_none());
        assert!(!world.cdn.contains(&css_blob).await);
    }

    #[tokio::test]
    async fn live_subscription_observes_deploy() {
        let world = world();
        let mut rx = world.backend.entry.tracker().subscribe();
        assert!(rx.borrow().is_none());

        let site = tempfile::tempdir().unwrap();
        write_site(site.path(), &[("index.html", b"<html></html>".as_slice())]);
        let orch = DeployOrchestrator::new();
        let report = orch
            .deploy(&world.backend, &DeployOptions::new(site.path()))
            .await
            .unwrap();

        rx.changed().await.unwrap();
        let observed = rx.borrow().clone().unwrap();
        assert_eq!(observed.current_deployment_id, report.deployment_id);
    }

    #[tokio::test]
    async fn empty_deploy_leaves_pointer_untouched() {
        let world = world();
        let orch = DeployOrchestrator::new();

        let site = tempfile::tempdir().unwrap();
        write_site(site.path(), &[("index.html", b"<html></html>".as_slice())]);
        let report1 = orch
            .deploy(&world.backend, &DeployOptions::new(site.path()))
            .await
            .unwrap();

        let empty = tempfile::tempdir().unwrap();
        let report2 = orch
            .deploy(&world.backend, &DeployOptions::new(empty.path()))
            .await
            .unwrap();
        assert_eq!(report2.uploaded, 0);

        // The empty set deployed nothing and swept nothing.
        let reg = registry(&world);
        assert!(reg.lookup("/index.html").await.unwrap().is_some());
        let current = world.backend.get_current_deployment().await.unwrap().unwrap();
        assert_eq!(current.current_deployment_id, report1.deployment_id);
    }
}
