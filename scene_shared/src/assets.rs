//! Asset catalog.
//!
//! Maps asset object paths to typed references. Paths arrive either plain
//! (`/Game/Shapes/Cube.Cube`) or class-qualified
//! (`StaticMesh'/Game/Shapes/Cube.Cube'`); the catalog keys on the plain form.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// What an asset can be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Mesh,
    Material,
}

impl AssetKind {
    /// Maps an asset class name to a kind.
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "StaticMesh" => Some(AssetKind::Mesh),
            "Material" | "MaterialInstanceConstant" => Some(AssetKind::Material),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Mesh => f.write_str("mesh"),
            AssetKind::Material => f.write_str("material"),
        }
    }
}

/// Resolved asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: u64,
    pub kind: AssetKind,
    pub path: String,
}

/// A parsed asset reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath<'a> {
    pub class: Option<&'a str>,
    pub object_path: &'a str,
}

impl<'a> AssetPath<'a> {
    /// Splits `Class'/Path'` into class and path; anything else is a plain
    /// path.
    pub fn parse(raw: &'a str) -> Result<Self, HostError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(HostError::EmptyAssetPath);
        }
        if let Some((class, rest)) = raw.split_once('\'') {
            if let Some(path) = rest.strip_suffix('\'') {
                if path.is_empty() {
                    return Err(HostError::EmptyAssetPath);
                }
                return Ok(Self {
                    class: (!class.is_empty()).then_some(class),
                    object_path: path,
                });
            }
        }
        Ok(Self {
            class: None,
            object_path: raw,
        })
    }
}

/// In-memory catalog of loadable assets.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    next_id: u64,
    by_path: HashMap<String, AssetRef>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset under its plain path and returns its reference.
    /// Registering the same path twice returns the existing reference.
    pub fn register(&mut self, kind: AssetKind, path: &str) -> Result<AssetRef, HostError> {
        let parsed = AssetPath::parse(path)?;
        if let Some(existing) = self.by_path.get(parsed.object_path) {
            return Ok(existing.clone());
        }
        let asset = AssetRef {
            id: self.next_id,
            kind,
            path: parsed.object_path.to_string(),
        };
        self.next_id += 1;
        self.by_path
            .insert(parsed.object_path.to_string(), asset.clone());
        Ok(asset)
    }

    /// Resolves a path as the requested kind.
    pub fn resolve(&self, path: &str, kind: AssetKind) -> Result<AssetRef, HostError> {
        let parsed = AssetPath::parse(path)?;
        if let Some(found) = parsed.class.and_then(AssetKind::from_class) {
            if found != kind {
                return Err(HostError::AssetKindMismatch {
                    path: path.to_string(),
                    expected: kind,
                    found,
                });
            }
        }
        let asset = self
            .by_path
            .get(parsed.object_path)
            .ok_or_else(|| HostError::AssetNotFound {
                path: path.to_string(),
            })?;
        if asset.kind != kind {
            return Err(HostError::AssetKindMismatch {
                path: path.to_string(),
                expected: kind,
                found: asset.kind,
            });
        }
        Ok(asset.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPE: &str = "/Game/StarterContent/Shapes/Shape_Pipe_180.Shape_Pipe_180";

    #[test]
    fn parses_class_qualified_reference() {
        let p = AssetPath::parse(
            "StaticMesh'/Game/StarterContent/Shapes/Shape_Pipe_180.Shape_Pipe_180'",
        )
        .unwrap();
        assert_eq!(p.class, Some("StaticMesh"));
        assert_eq!(p.object_path, PIPE);
    }

    #[test]
    fn qualified_and_plain_paths_resolve_to_same_asset() {
        let mut catalog = AssetCatalog::new();
        let registered = catalog.register(AssetKind::Mesh, PIPE).unwrap();
        let qualified = format!("StaticMesh'{PIPE}'");
        assert_eq!(catalog.resolve(&qualified, AssetKind::Mesh).unwrap(), registered);
        assert_eq!(catalog.resolve(PIPE, AssetKind::Mesh).unwrap(), registered);
    }

    #[test]
    fn class_prefix_must_match_requested_kind() {
        let mut catalog = AssetCatalog::new();
        catalog.register(AssetKind::Mesh, PIPE).unwrap();
        let err = catalog
            .resolve(&format!("Material'{PIPE}'"), AssetKind::Mesh)
            .unwrap_err();
        assert!(matches!(err, HostError::AssetKindMismatch { found: AssetKind::Material, .. }));
        let err = catalog.resolve(PIPE, AssetKind::Material).unwrap_err();
        assert!(matches!(err, HostError::AssetKindMismatch { found: AssetKind::Mesh, .. }));
    }

    #[test]
    fn unknown_and_empty_paths_fail() {
        let catalog = AssetCatalog::new();
        assert!(matches!(
            catalog.resolve("/Game/Nope.Nope", AssetKind::Mesh),
            Err(HostError::AssetNotFound { .. })
        ));
        assert_eq!(
            catalog.resolve("   ", AssetKind::Material),
            Err(HostError::EmptyAssetPath)
        );
        assert_eq!(AssetPath::parse("StaticMesh''"), Err(HostError::EmptyAssetPath));
    }
}
