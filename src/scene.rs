//! Scene context shared by meshes.
//!
//! The scene owns the topology generation counter used to tag interpolation
//! caches, and the flags that decide whether meshes may be evaluated or
//! mutated after the first build.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Scene configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneFlags {
    /// Allow interpolation queries. Meshes allocate per-patch caches.
    pub interpolatable: bool,

    /// Meshes are immutable once the scene is built. Temporary build state
    /// is released after the first commit.
    pub static_scene: bool,
}

impl SceneFlags {
    /// Enable interpolation.
    pub fn interpolatable(mut self) -> Self {
        self.interpolatable = true;
        self
    }

    /// Make the scene static.
    pub fn static_scene(mut self) -> Self {
        self.static_scene = true;
        self
    }
}

/// Shared scene state.
#[derive(Debug, Default)]
pub struct Scene {
    flags: SceneFlags,
    generation: AtomicU64,
    built: AtomicBool,
}

impl Scene {
    /// Create a scene.
    pub fn new(flags: SceneFlags) -> Self {
        Self {
            flags,
            generation: AtomicU64::new(0),
            built: AtomicBool::new(false),
        }
    }

    /// The configuration flags.
    pub fn flags(&self) -> SceneFlags {
        self.flags
    }

    /// Current topology generation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Advance the generation, invalidating every cached patch.
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Whether interpolation is enabled.
    #[inline]
    pub fn is_interpolatable(&self) -> bool {
        self.flags.interpolatable
    }

    /// Whether the scene is static.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.static_scene
    }

    /// Whether a commit has completed since creation.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.built.load(Ordering::Acquire)
    }

    /// Whether meshes of this scene reject modification.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.is_static() && self.is_built()
    }

    pub(crate) fn mark_built(&self) {
        self.built.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_monotonic() {
        let scene = Scene::new(SceneFlags::default());
        assert_eq!(scene.generation(), 0);
        assert_eq!(scene.bump_generation(), 1);
        assert_eq!(scene.bump_generation(), 2);
        assert_eq!(scene.generation(), 2);
    }

    #[test]
    fn test_static_scene_freezes_after_build() {
        let scene = Scene::new(SceneFlags::default().static_scene());
        assert!(scene.is_static());
        assert!(!scene.is_frozen());
        scene.mark_built();
        assert!(scene.is_frozen());

        let dynamic = Scene::new(SceneFlags::default().interpolatable());
        dynamic.mark_built();
        assert!(!dynamic.is_frozen());
        assert!(dynamic.is_interpolatable());
    }
}
