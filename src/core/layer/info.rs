//! Identity and adjacency contract carried by every layer.

use crate::error::ConfigError;

/// Type tags of the built-in layers.
pub mod kinds {
    pub const READ: &str = "read";
    pub const SAVE: &str = "save";
    pub const RESIZE: &str = "resize";
    pub const CROP: &str = "crop";
    pub const PADDING: &str = "padding";
    pub const ROTATE: &str = "rotate";
    pub const HORIZONTAL_FLIP: &str = "horizontal_flip";
    pub const VERTICAL_FLIP: &str = "vertical_flip";
    pub const GRAYSCALE: &str = "grayscale";
    pub const RESCALE: &str = "rescale";
    pub const AVERAGE_BLUR: &str = "average_blur";
    pub const GAUSSIAN_BLUR: &str = "gaussian_blur";
    pub const MEDIAN_BLUR: &str = "median_blur";
    pub const BILATERAL_BLUR: &str = "bilateral_blur";
    pub const CONVOLUTION: &str = "convolution";
    pub const RANDOM_ROTATE: &str = "random_rotate";
    pub const RANDOM_FLIP: &str = "random_flip";
    pub const RANDOM_HORIZONTAL_FLIP: &str = "random_horizontal_flip";
    pub const RANDOM_VERTICAL_FLIP: &str = "random_vertical_flip";
    pub const RANDOM_ZOOM: &str = "random_zoom";
    pub const RANDOM_HORIZONTAL_SHIFT: &str = "random_horizontal_shift";
    pub const RANDOM_VERTICAL_SHIFT: &str = "random_vertical_shift";
    pub const RANDOM_BRIGHTNESS: &str = "random_brightness";
    pub const RANDOM_CHANNEL_SHIFT: &str = "random_channel_shift";
}

/// Parent types accepted by every built-in layer other than `read`.
pub const STANDARD_PARENTS: &[&str] = &[
    kinds::READ,
    kinds::SAVE,
    kinds::RESIZE,
    kinds::CROP,
    kinds::PADDING,
    kinds::ROTATE,
    kinds::HORIZONTAL_FLIP,
    kinds::VERTICAL_FLIP,
    kinds::GRAYSCALE,
    kinds::RESCALE,
    kinds::AVERAGE_BLUR,
    kinds::GAUSSIAN_BLUR,
    kinds::MEDIAN_BLUR,
    kinds::BILATERAL_BLUR,
    kinds::CONVOLUTION,
    kinds::RANDOM_ROTATE,
    kinds::RANDOM_FLIP,
    kinds::RANDOM_HORIZONTAL_FLIP,
    kinds::RANDOM_VERTICAL_FLIP,
    kinds::RANDOM_ZOOM,
    kinds::RANDOM_HORIZONTAL_SHIFT,
    kinds::RANDOM_VERTICAL_SHIFT,
    kinds::RANDOM_BRIGHTNESS,
    kinds::RANDOM_CHANNEL_SHIFT,
];

/// Name, type tag, accepted parents and parameter description of a layer.
///
/// Fixed at construction. Only [`rename`](Self::rename) touches it afterwards,
/// and that consumes the owning layer before it joins a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    name: String,
    kind: String,
    supported_parents: Vec<String>,
    description: String,
    bypass_validation: bool,
}

impl LayerInfo {
    /// Build the contract of a layer. `kind` must not be empty.
    pub fn new(
        kind: impl Into<String>,
        supported_parents: &[&str],
        description: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err(ConfigError::invalid("type", kind));
        }

        Ok(Self {
            name: default_name(&kind),
            kind,
            supported_parents: supported_parents.iter().map(|p| p.to_string()).collect(),
            description: description.into(),
            bypass_validation: false,
        })
    }

    /// Contract of a built-in layer accepting the standard parent set
    pub(crate) fn standard(kind: &'static str, description: String) -> Self {
        Self {
            name: default_name(kind),
            kind: kind.to_string(),
            supported_parents: STANDARD_PARENTS.iter().map(|p| p.to_string()).collect(),
            description,
            bypass_validation: false,
        }
    }

    /// Contract of a source layer: nothing may precede it
    pub(crate) fn source(kind: &'static str, description: String) -> Self {
        Self {
            name: default_name(kind),
            kind: kind.to_string(),
            supported_parents: Vec::new(),
            description,
            bypass_validation: false,
        }
    }

    /// Skip adjacency checks for this layer
    pub fn with_bypass_validation(mut self, bypass: bool) -> Self {
        self.bypass_validation = bypass;
        self
    }

    /// Replace the display name. An empty name falls back to the derived one.
    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            default_name(&self.kind)
        } else {
            name
        };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn supported_parents(&self) -> &[String] {
        &self.supported_parents
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bypass_validation(&self) -> bool {
        self.bypass_validation
    }

    /// Whether a layer of type `previous` may come right before this one
    pub fn accepts(&self, previous: &str) -> bool {
        self.bypass_validation || self.supported_parents.iter().any(|p| p == previous)
    }
}

/// `random_rotate` -> `Random rotate Layer`
pub fn default_name(kind: &str) -> String {
    let mut chars = kind.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    };
    format!("{} Layer", capitalized.replace('_', " "))
}
