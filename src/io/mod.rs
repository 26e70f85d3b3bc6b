//! Control mesh file input.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Notes |
//! |--------|-----------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | With crease, corner and hole tags |
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use subdiv_mesh::io::load;
//! use subdiv_mesh::mesh::TopologyOptions;
//! use subdiv_mesh::scene::{Scene, SceneFlags};
//!
//! let obj = load("model.obj").unwrap();
//! let scene = Arc::new(Scene::new(SceneFlags::default()));
//! let mut mesh = obj.into_mesh(scene, TopologyOptions::default()).unwrap();
//! mesh.commit().unwrap();
//! ```

pub mod obj;

use std::path::Path;

pub use obj::ObjMesh;

use crate::error::{Result, SubdivError};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Load a control mesh with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ObjMesh> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| SubdivError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    match format {
        Format::Obj => obj::load(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/Model.OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path("model.stl"), None);
        assert!(matches!(
            load("model.ply"),
            Err(SubdivError::UnsupportedFormat { extension }) if extension == "ply"
        ));
        assert!(matches!(load("no_extension"), Err(SubdivError::UnsupportedFormat { .. })));
    }
}
