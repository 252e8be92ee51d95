use std::future::Future;
use std::sync::Arc;

use crate::assets::cache::{AsyncCache, Readiness};
use crate::assets::loader::{
    run_blocking, CubeTextureLoader, DecodeRequest, DecoderKind, HdrLoader, TextureDecoder,
};
use crate::assets::texture::{EnvironmentMap, SourceTexture};
use crate::errors::Result;
use crate::ibl::{derive_environment, CpuIblBackend, IblBackend};

use super::Environment;

/// Shared decode + prefilter pipeline behind every [`Environment`].
///
/// Holds the two decoders, the prefiltering backend and two caches keyed by
/// [`Environment::cache_key`]:
///
/// - `sources`: decoded source textures
/// - `maps`: prefiltered environment maps
///
/// Share one loader (behind an `Arc`) per rendering context.
pub struct EnvironmentLoader {
    cube_decoder: Arc<dyn TextureDecoder>,
    equirect_decoder: Arc<dyn TextureDecoder>,
    backend: Arc<dyn IblBackend>,
    sources: AsyncCache<SourceTexture>,
    maps: AsyncCache<EnvironmentMap>,
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(Arc::new(CpuIblBackend::default()))
    }
}

impl EnvironmentLoader {
    #[must_use]
    pub fn new(backend: Arc<dyn IblBackend>) -> Self {
        Self {
            cube_decoder: Arc::new(CubeTextureLoader),
            equirect_decoder: Arc::new(HdrLoader),
            backend,
            sources: AsyncCache::new("EnvironmentSources"),
            maps: AsyncCache::new("EnvironmentMaps"),
        }
    }

    #[must_use]
    pub fn with_cube_decoder(mut self, decoder: Arc<dyn TextureDecoder>) -> Self {
        self.cube_decoder = decoder;
        self
    }

    #[must_use]
    pub fn with_equirect_decoder(mut self, decoder: Arc<dyn TextureDecoder>) -> Self {
        self.equirect_decoder = decoder;
        self
    }

    #[must_use]
    pub fn decoder(&self, kind: DecoderKind) -> &Arc<dyn TextureDecoder> {
        match kind {
            DecoderKind::Cube => &self.cube_decoder,
            DecoderKind::Equirectangular => &self.equirect_decoder,
        }
    }

    /// Builds the full decode → prefilter job for `key`.
    ///
    /// Called with the `maps` entry lock held; it only creates futures.
    fn pipeline(
        &self,
        key: u64,
        request: DecodeRequest,
    ) -> impl Future<Output = Result<EnvironmentMap>> + Send + 'static {
        let decoder = Arc::clone(self.decoder(request.kind));
        let backend = Arc::clone(&self.backend);
        let source = self
            .sources
            .get_or_load(key, move || decoder.decode(request));

        async move {
            let source = source.await?;
            log::debug!(
                "Prefiltering '{}' ({}x{}, {} layers)",
                source.label,
                source.width,
                source.height,
                source.layers
            );
            run_blocking(move || derive_environment(backend.as_ref(), &source)).await
        }
    }

    /// Loads (or reuses) the prefiltered map for `env`.
    pub fn load(
        &self,
        env: &Environment,
    ) -> impl Future<Output = Result<Arc<EnvironmentMap>>> + Send + 'static {
        let key = env.cache_key();
        let request = env.decode_request();
        self.maps.get_or_load(key, move || self.pipeline(key, request))
    }

    /// Non-blocking readiness query; starts the load on first call.
    pub fn poll(&self, env: &Environment) -> Readiness<EnvironmentMap> {
        let key = env.cache_key();
        let request = env.decode_request();
        self.maps.poll(key, || self.pipeline(key, request))
    }

    /// Drops the cached map for `key` if it is still `map`. A newer map
    /// cached under the same key is left alone. The decoded source stays
    /// cached.
    pub fn evict_map(&self, key: u64, map: &Arc<EnvironmentMap>) -> bool {
        self.maps.evict_if(key, |cached| Arc::ptr_eq(cached, map))
    }

    #[must_use]
    pub fn sources(&self) -> &AsyncCache<SourceTexture> {
        &self.sources
    }

    #[must_use]
    pub fn maps(&self) -> &AsyncCache<EnvironmentMap> {
        &self.maps
    }
}
