use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::assets::texture::EnvironmentMap;
use crate::scene::background::Background;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Scene-level state the staging helpers read and write.
///
/// `background` and `environment` are plain mutable slots: whoever writes them
/// is responsible for restoring the previous values.
#[derive(Debug)]
pub struct Scene {
    pub id: u32,
    pub name: String,
    /// What is drawn behind the content. `None` leaves the target uncleared.
    pub background: Option<Background>,
    /// Prefiltered map used for image-based lighting.
    pub environment: Option<Arc<EnvironmentMap>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Scene")
    }
}

impl Scene {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            background: Some(Background::default()),
            environment: None,
        }
    }

    /// Current values of both slots.
    #[must_use]
    pub fn slots(&self) -> SceneSlots {
        SceneSlots {
            background: self.background.clone(),
            environment: self.environment.clone(),
        }
    }

    /// Overwrites both slots.
    pub fn restore_slots(&mut self, slots: SceneSlots) {
        self.background = slots.background;
        self.environment = slots.environment;
    }

    /// Returns `true` if an environment map is installed.
    #[must_use]
    pub fn has_env_map(&self) -> bool {
        self.environment.is_some()
    }
}

/// Snapshot of a scene's background/environment slots.
#[derive(Debug, Clone, Default)]
pub struct SceneSlots {
    pub background: Option<Background>,
    pub environment: Option<Arc<EnvironmentMap>>,
}

/// Identity comparison for maps, value comparison for colors.
impl PartialEq for SceneSlots {
    fn eq(&self, other: &Self) -> bool {
        let env_eq = match (&self.environment, &other.environment) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        env_eq && self.background == other.background
    }
}

pub type SharedScene = Arc<RwLock<Scene>>;

/// Which scene a helper writes to.
#[derive(Debug, Clone, Default)]
pub enum SceneTarget {
    /// The stage's active scene.
    #[default]
    Active,
    /// An explicitly supplied scene.
    Scene(SharedScene),
}

/// Owner of the active scene, the context every helper resolves
/// [`SceneTarget::Active`] against.
#[derive(Debug, Clone)]
pub struct Stage {
    active: SharedScene,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    #[must_use]
    pub fn new() -> Self {
        Self::with_scene(Scene::default())
    }

    #[must_use]
    pub fn with_scene(scene: Scene) -> Self {
        Self {
            active: Arc::new(RwLock::new(scene)),
        }
    }

    #[must_use]
    pub fn active_scene(&self) -> &SharedScene {
        &self.active
    }

    /// Replaces the active scene, returning the previous one.
    pub fn set_active_scene(&mut self, scene: SharedScene) -> SharedScene {
        std::mem::replace(&mut self.active, scene)
    }

    #[must_use]
    pub fn resolve(&self, target: &SceneTarget) -> SharedScene {
        match target {
            SceneTarget::Active => Arc::clone(&self.active),
            SceneTarget::Scene(scene) => Arc::clone(scene),
        }
    }
}
