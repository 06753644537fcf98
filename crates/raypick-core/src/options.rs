//! Configuration options for picking.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RaypickError, Result};
use crate::scene::{CullMode, DepthRange};

/// Tunables shared by the ray caster and the screen picker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingOptions {
    /// Which nodes the line query skips.
    pub cull_mode: CullMode,

    /// Normalized depth of the cursor segment start.
    pub near_depth: f32,

    /// Normalized depth of the cursor segment end.
    pub far_depth: f32,

    /// Range used by the `*_default` screen picking calls. Negative means
    /// unbounded (camera far plane).
    pub default_max_distance: f32,

    /// Discard hits behind the segment start when the start lies inside a
    /// candidate's bounding box.
    pub backfire_rejection: bool,
}

impl Default for PickingOptions {
    fn default() -> Self {
        let depths = DepthRange::default();
        Self {
            cull_mode: CullMode::default(),
            near_depth: depths.near,
            far_depth: depths.far,
            default_max_distance: 10_000.0,
            backfire_rejection: true,
        }
    }
}

impl PickingOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cull mode.
    #[must_use]
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Sets the default screen picking range.
    #[must_use]
    pub fn with_default_max_distance(mut self, distance: f32) -> Self {
        self.default_max_distance = distance;
        self
    }

    /// Enables or disables backfire rejection.
    #[must_use]
    pub fn with_backfire_rejection(mut self, enabled: bool) -> Self {
        self.backfire_rejection = enabled;
        self
    }

    /// Depth range for cursor unprojection.
    #[must_use]
    pub fn depth_range(&self) -> DepthRange {
        DepthRange {
            near: self.near_depth,
            far: self.far_depth,
        }
    }

    /// Checks that the unprojection depths are ordered and inside `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        let in_unit = |d: f32| d > 0.0 && d < 1.0;
        if !in_unit(self.near_depth) || !in_unit(self.far_depth) {
            return Err(RaypickError::InvalidOptions(format!(
                "depths must lie in (0, 1), got near {} and far {}",
                self.near_depth, self.far_depth
            )));
        }
        if self.near_depth >= self.far_depth {
            return Err(RaypickError::InvalidOptions(format!(
                "near depth {} must be smaller than far depth {}",
                self.near_depth, self.far_depth
            )));
        }
        Ok(())
    }

    /// Parses and validates options from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serializes options as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let options = Self::from_json(&json)?;
        log::debug!("loaded picking options from {}", path.display());
        Ok(options)
    }

    /// Writes options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = PickingOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.cull_mode, CullMode::Inactive);
        assert_eq!(options.default_max_distance, 10_000.0);
        assert!(options.backfire_rejection);
    }

    #[test]
    fn test_json_round_trip() {
        let options = PickingOptions::new()
            .with_cull_mode(CullMode::Invisible)
            .with_default_max_distance(250.0)
            .with_backfire_rejection(false);
        let json = options.to_json().unwrap();
        assert_eq!(PickingOptions::from_json(&json).unwrap(), options);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = PickingOptions::from_json(r#"{ "cull_mode": "None" }"#).unwrap();
        assert_eq!(options.cull_mode, CullMode::None);
        assert_eq!(options.near_depth, PickingOptions::default().near_depth);
    }

    #[test]
    fn test_invalid_depths_rejected() {
        let err = PickingOptions::from_json(r#"{ "near_depth": 0.9, "far_depth": 0.1 }"#);
        assert!(matches!(err, Err(RaypickError::InvalidOptions(_))));

        let err = PickingOptions::from_json(r#"{ "far_depth": 1.5 }"#);
        assert!(matches!(err, Err(RaypickError::InvalidOptions(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PickingOptions::from_json("{ not json"),
            Err(RaypickError::JsonError(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "raypick-options-{}.json",
            std::process::id()
        ));
        let options = PickingOptions::new().with_default_max_distance(42.0);
        options.save(&path).unwrap();
        let loaded = PickingOptions::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, options);
    }
}
