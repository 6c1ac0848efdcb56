use arstep_common::{AssetKind, AssetRef};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a step displays. Kind-specific fields live on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepContent {
    Model {
        asset: AssetRef,
        /// Name of a model node to tint while this step is shown.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        highlight: Option<String>,
    },
    Image { asset: AssetRef },
}

impl StepContent {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Model { .. } => AssetKind::Model,
            Self::Image { .. } => AssetKind::Image,
        }
    }

    pub fn asset(&self) -> &AssetRef {
        match self {
            Self::Model { asset, .. } | Self::Image { asset } => asset,
        }
    }

    pub fn highlight(&self) -> Option<&str> {
        match self {
            Self::Model { highlight, .. } => highlight.as_deref(),
            Self::Image { .. } => None,
        }
    }
}

/// A step as written in a registry file, before it is given an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    #[serde(flatten)]
    pub content: StepContent,
}

impl StepSpec {
    pub fn model(asset: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
            content: StepContent::Model {
                asset: AssetRef::new(asset),
                highlight: None,
            },
        }
    }

    pub fn image(asset: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
            content: StepContent::Image {
                asset: AssetRef::new(asset),
            },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the highlighted part. Ignored for image steps.
    pub fn with_highlight(mut self, part: impl Into<String>) -> Self {
        if let StepContent::Model { highlight, .. } = &mut self.content {
            *highlight = Some(part.into());
        }
        self
    }
}

/// One immutable step in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDescriptor {
    index: usize,
    title: Option<String>,
    text: String,
    content: StepContent,
}

impl StepDescriptor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn content(&self) -> &StepContent {
        &self.content
    }

    pub fn kind(&self) -> AssetKind {
        self.content.kind()
    }

    pub fn asset(&self) -> &AssetRef {
        self.content.asset()
    }
}

/// Errors from building or loading a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("step registry is empty")]
    Empty,
    #[error("step {0} has an empty asset reference")]
    EmptyAssetRef(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    steps: Vec<StepSpec>,
}

/// Ordered, immutable list of steps.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    /// Build a registry, assigning indices in order.
    pub fn new(specs: Vec<StepSpec>) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }
        let steps = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| {
                if spec.content.asset().as_str().trim().is_empty() {
                    return Err(RegistryError::EmptyAssetRef(index));
                }
                Ok(StepDescriptor {
                    index,
                    title: spec.title,
                    text: spec.text,
                    content: spec.content,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    pub fn from_json_str(data: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(data)?;
        Self::new(file.steps)
    }

    pub fn from_yaml_str(data: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_yaml::from_str(data)?;
        Self::new(file.steps)
    }

    /// Load a registry file. `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let registry = if is_json {
            Self::from_json_str(&data)?
        } else {
            Self::from_yaml_str(&data)?
        };
        tracing::debug!(path = %path.display(), steps = registry.len(), "loaded step registry");
        Ok(registry)
    }

    /// Serialize back to the YAML file form.
    pub fn to_yaml(&self) -> Result<String, RegistryError> {
        let file = RegistryFile {
            steps: self
                .steps
                .iter()
                .map(|s| StepSpec {
                    title: s.title.clone(),
                    text: s.text.clone(),
                    content: s.content.clone(),
                })
                .collect(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    pub fn get(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed registry; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter()
    }
}
