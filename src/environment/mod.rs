//! Environment
//!
//! Declarative environment maps: describe *which* images to use, and the
//! [`EnvironmentLoader`] decodes them, prefilters them into an
//! [`EnvironmentMap`] and the returned [`EnvironmentHandle`] keeps the map
//! installed in a scene for as long as it lives.
//!
//! # Lifecycle
//!
//! 1. [`Environment::new`] resolves the source. Presets replace `files` and
//!    `path`; configuration errors are reported here, before any IO.
//! 2. [`Environment::mount`] awaits decode + prefiltering (cached per source),
//!    then captures the target scene's `background`/`environment` slots and
//!    installs the map.
//! 3. Dropping or [`releasing`](EnvironmentHandle::release) the handle restores
//!    the captured slots, evicts the cached map and disposes it.
//!
//! ```rust,ignore
//! let loader = Arc::new(EnvironmentLoader::default());
//! let stage = Stage::new();
//!
//! let env = Environment::new(EnvironmentProps {
//!     preset: Some(Preset::Sunset),
//!     background: true,
//!     ..Default::default()
//! })?;
//! let handle = env.mount(&loader, &stage).await?;
//! // ... render ...
//! handle.release();
//! ```
//!
//! A mount that is dropped before the map is ready installs nothing. The
//! in-flight load keeps its cache entry and is picked up by the next request
//! for the same files.

pub mod loader;
pub mod presets;
pub mod source;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::assets::cache::Readiness;
use crate::assets::loader::{DecodeRequest, LoaderExtensions, LoaderSettings};
use crate::assets::texture::{ColorSpace, EnvironmentMap};
use crate::errors::{Error, Result};
use crate::scene::{Background, SceneSlots, SceneTarget, SharedScene, Stage};

pub use loader::EnvironmentLoader;
pub use presets::{Preset, CUBEMAP_ROOT};
pub use source::{EnvironmentSource, ResolvedSource};

// ============================================================================
// Props & Config
// ============================================================================

/// Inputs of an [`Environment`].
#[derive(Clone, Default)]
pub struct EnvironmentProps {
    /// Also show the map as the scene background.
    pub background: bool,
    /// Source images. Defaults to the six `/px.png … /nz.png` faces.
    pub files: Option<EnvironmentSource>,
    /// Base path prepended to every file.
    pub path: String,
    /// Named preset; overrides `files` and `path`.
    pub preset: Option<Preset>,
    /// Scene to write to.
    pub scene: SceneTarget,
    /// Hook run on the loader settings before loading.
    pub extensions: Option<LoaderExtensions>,
}

impl fmt::Debug for EnvironmentProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentProps")
            .field("background", &self.background)
            .field("files", &self.files)
            .field("path", &self.path)
            .field("preset", &self.preset)
            .field("scene", &self.scene)
            .field("extensions", &self.extensions.is_some())
            .finish()
    }
}

impl EnvironmentProps {
    /// Sets the preset from its name.
    pub fn preset_name(mut self, name: &str) -> Result<Self> {
        self.preset = Some(name.parse()?);
        Ok(self)
    }

    #[must_use]
    pub fn with_extensions(
        mut self,
        hook: impl Fn(&mut LoaderSettings) + Send + Sync + 'static,
    ) -> Self {
        self.extensions = Some(Arc::new(hook));
        self
    }
}

/// Serializable form of [`EnvironmentProps`].
///
/// ```json
/// { "preset": "city", "background": true }
/// { "files": ["studio.hdr"], "path": "assets/", "color_space": "linear" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub background: bool,
    pub files: Option<Vec<String>>,
    pub path: String,
    pub preset: Option<String>,
    pub color_space: Option<ConfigColorSpace>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigColorSpace {
    Srgb,
    Linear,
}

impl EnvironmentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<EnvironmentConfig> for EnvironmentProps {
    type Error = Error;

    fn try_from(config: EnvironmentConfig) -> Result<Self> {
        let preset = config.preset.as_deref().map(str::parse).transpose()?;
        let files = config.files.map(EnvironmentSource::try_from).transpose()?;
        let mut props = EnvironmentProps {
            background: config.background,
            files,
            path: config.path,
            preset,
            ..Default::default()
        };
        if let Some(cs) = config.color_space {
            let color_space = match cs {
                ConfigColorSpace::Srgb => ColorSpace::Srgb,
                ConfigColorSpace::Linear => ColorSpace::Linear,
            };
            props = props.with_extensions(move |s| {
                s.set_color_space(color_space);
            });
        }
        Ok(props)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// A resolved environment description.
pub struct Environment {
    resolved: ResolvedSource,
    request: DecodeRequest,
    key: u64,
    background: bool,
    target: SceneTarget,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("resolved", &self.resolved)
            .field("key", &format_args!("{:016x}", self.key))
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

impl Environment {
    pub fn new(props: EnvironmentProps) -> Result<Self> {
        let (source, path) = match props.preset {
            Some(preset) => (EnvironmentSource::Cubemap(preset.files()), Preset::base_path()),
            None => (props.files.unwrap_or_default(), props.path),
        };

        if source.files().iter().any(String::is_empty) {
            return Err(Error::InvalidSource("empty file name".to_string()));
        }

        let resolved = ResolvedSource { source, path };

        let mut settings = LoaderSettings::default();
        settings.set_path(resolved.path.clone());
        if let Some(hook) = &props.extensions {
            hook(&mut settings);
        }

        let request = DecodeRequest {
            kind: resolved.source.kind(),
            files: resolved.source.files(),
            settings,
        };

        // The hook may change what gets decoded, so it takes part in the key.
        let key = xxhash_rust::xxh3::xxh3_64(
            format!(
                "{:?}|{}|{:016x}",
                request.settings.color_space,
                request.settings.path,
                resolved.fingerprint()
            )
            .as_bytes(),
        );

        log::debug!(
            "Environment resolved: {:?} under '{}' (key {key:016x})",
            resolved.source.kind(),
            request.settings.path
        );

        Ok(Self {
            resolved,
            request,
            key,
            background: props.background,
            target: props.scene,
        })
    }

    #[must_use]
    pub fn resolved(&self) -> &ResolvedSource {
        &self.resolved
    }

    /// The decode job, loader hook already applied.
    #[must_use]
    pub fn decode_request(&self) -> DecodeRequest {
        self.request.clone()
    }

    /// Cache key shared by the source and map caches.
    #[must_use]
    pub fn cache_key(&self) -> u64 {
        self.key
    }

    #[must_use]
    pub fn shows_background(&self) -> bool {
        self.background
    }

    #[must_use]
    pub fn target(&self) -> &SceneTarget {
        &self.target
    }

    /// Suspense-style readiness: starts loading on first call, then reports
    /// progress without blocking.
    pub fn poll_ready(&self, loader: &EnvironmentLoader) -> Readiness<EnvironmentMap> {
        loader.poll(self)
    }

    /// Awaits the prefiltered map and installs it into the target scene.
    pub async fn mount(
        &self,
        loader: &Arc<EnvironmentLoader>,
        stage: &Stage,
    ) -> Result<EnvironmentHandle> {
        let map = loader.load(self).await?;
        Ok(self.install(map, loader, stage))
    }

    /// Installs an already prepared map.
    ///
    /// Captures the target's current slots first; the returned handle puts
    /// them back.
    pub fn install(
        &self,
        map: Arc<EnvironmentMap>,
        loader: &Arc<EnvironmentLoader>,
        stage: &Stage,
    ) -> EnvironmentHandle {
        let scene = stage.resolve(&self.target);
        let previous = {
            let mut guard = scene.write();
            let previous = guard.slots();
            guard.environment = Some(Arc::clone(&map));
            if self.background {
                guard.background = Some(Background::Map(Arc::clone(&map)));
            }
            log::info!(
                "Environment map '{}' installed into scene '{}' (background: {})",
                map.label,
                guard.name,
                self.background
            );
            previous
        };

        EnvironmentHandle {
            scene,
            previous: Some(previous),
            map,
            key: self.key,
            loader: Arc::clone(loader),
        }
    }
}

// ============================================================================
// EnvironmentHandle
// ============================================================================

/// Keeps an environment map installed in a scene.
///
/// Restoration runs exactly once, on [`release`](Self::release) or on drop,
/// whichever comes first.
pub struct EnvironmentHandle {
    scene: SharedScene,
    previous: Option<SceneSlots>,
    map: Arc<EnvironmentMap>,
    key: u64,
    loader: Arc<EnvironmentLoader>,
}

impl fmt::Debug for EnvironmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentHandle")
            .field("map", &self.map.label)
            .field("key", &format_args!("{:016x}", self.key))
            .field("released", &self.previous.is_none())
            .finish_non_exhaustive()
    }
}

impl EnvironmentHandle {
    #[must_use]
    pub fn map(&self) -> &Arc<EnvironmentMap> {
        &self.map
    }

    #[must_use]
    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    /// Slot values captured at install time.
    #[must_use]
    pub fn previous(&self) -> Option<&SceneSlots> {
        self.previous.as_ref()
    }

    /// Restores the scene and frees the map.
    pub fn release(mut self) {
        self.restore(true);
    }

    /// Swaps in `next` once it is ready.
    ///
    /// The current map stays installed while `next` loads; the old slots are
    /// restored right before the new map goes in. If loading fails the
    /// current map is released and the error returned.
    pub async fn replace(
        mut self,
        next: &Environment,
        stage: &Stage,
    ) -> Result<EnvironmentHandle> {
        let loader = Arc::clone(&self.loader);
        let map = match loader.load(next).await {
            Ok(map) => map,
            Err(err) => {
                self.restore(true);
                return Err(err);
            }
        };
        // Same source: keep the map alive for the new handle.
        let same = Arc::ptr_eq(&map, &self.map);
        self.restore(!same);
        Ok(next.install(map, &loader, stage))
    }

    fn restore(&mut self, dispose: bool) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        {
            let mut guard = self.scene.write();
            guard.restore_slots(previous);
            log::info!(
                "Environment map '{}' removed from scene '{}'",
                self.map.label,
                guard.name
            );
        }
        if dispose {
            self.loader.evict_map(self.key, &self.map);
            self.map.dispose();
        }
    }
}

impl Drop for EnvironmentHandle {
    fn drop(&mut self) {
        self.restore(true);
    }
}
