use arstep_common::{AssetKind, Transform};
use arstep_input::GestureConfig;
use arstep_tracking::LockPolicy;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Transform a freshly loaded object starts with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindDefault {
    pub scale: f32,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
}

impl KindDefault {
    pub fn transform(&self) -> Transform {
        Transform::from_scale_euler(self.scale, self.rotation)
    }
}

/// Per-kind starting transforms. Models are authored in millimetres and
/// Z-up; images lie flat on the marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTransforms {
    pub model: KindDefault,
    pub image: KindDefault,
}

impl Default for DefaultTransforms {
    fn default() -> Self {
        Self {
            model: KindDefault {
                scale: 0.001,
                rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
            },
            image: KindDefault {
                scale: 1.0,
                rotation: Vec3::new(-FRAC_PI_2, 0.0, 0.0),
            },
        }
    }
}

impl DefaultTransforms {
    pub fn for_kind(&self, kind: AssetKind) -> Transform {
        match kind {
            AssetKind::Model => self.model.transform(),
            AssetKind::Image => self.image.transform(),
        }
    }
}

/// Viewer settings, loaded from YAML or JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub lock_policy: LockPolicy,
    pub gestures: GestureConfig,
    pub defaults: DefaultTransforms,
    /// Loads served per tick by the file loader.
    pub load_budget: usize,
    /// Emissive tint for the highlighted model part.
    pub highlight_color: [f32; 3],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            lock_policy: LockPolicy::default(),
            gestures: GestureConfig::default(),
            defaults: DefaultTransforms::default(),
            load_budget: 1,
            highlight_color: [0.0, 1.0, 0.0],
        }
    }
}

impl ViewerConfig {
    pub fn from_yaml_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&data)?
        } else {
            Self::from_yaml_str(&data)?
        };
        tracing::debug!(path = %path.display(), policy = ?config.lock_policy, "loaded viewer config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.gestures;
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if !(g.min_scale.is_finite() && g.max_scale.is_finite()) || g.min_scale <= 0.0 {
            return invalid(format!(
                "scale limits must be positive and finite, got [{}, {}]",
                g.min_scale, g.max_scale
            ));
        }
        if g.min_scale >= g.max_scale {
            return invalid(format!(
                "min_scale {} must be below max_scale {}",
                g.min_scale, g.max_scale
            ));
        }
        if !g.sensitivity.is_finite() {
            return invalid("gesture sensitivity must be finite".into());
        }
        let model = self.defaults.model.scale;
        if !(g.min_scale..=g.max_scale).contains(&model) {
            return invalid(format!(
                "default model scale {model} is outside [{}, {}]",
                g.min_scale, g.max_scale
            ));
        }
        if self.load_budget == 0 {
            return invalid("load_budget must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.lock_policy, LockPolicy::OneShot);
        assert_eq!(config.defaults.for_kind(AssetKind::Model).uniform_scale(), 0.001);
        assert_eq!(config.defaults.for_kind(AssetKind::Image).uniform_scale(), 1.0);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = ViewerConfig::from_yaml_str(
            "lock_policy: continuous_follow\ngestures:\n  sensitivity: 0.01\n",
        )
        .unwrap();
        assert_eq!(config.lock_policy, LockPolicy::ContinuousFollow);
        assert_eq!(config.gestures.sensitivity, 0.01);
        assert_eq!(config.gestures.double_tap_window_ms, 300);
        assert_eq!(config.load_budget, 1);
    }

    #[test]
    fn json_config_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{ "load_budget": 4, "highlight_color": [1, 0, 0] }"#).unwrap();
        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.load_budget, 4);
        assert_eq!(config.highlight_color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn inverted_scale_limits_are_rejected() {
        let err = ViewerConfig::from_yaml_str("gestures:\n  min_scale: 0.01\n  max_scale: 0.001\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn default_scale_outside_limits_is_rejected() {
        let err = ViewerConfig::from_yaml_str(
            "defaults:\n  model:\n    scale: 1.0\n    rotation: [0, 0, 0]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert!(ViewerConfig::from_yaml_str("load_budget: 0").is_err());
    }
}
