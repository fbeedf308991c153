//! Validator and pair-check configuration.
//!
//! Both structs deserialize from a flat document (YAML or JSON) where every
//! field is optional:
//!
//! ```yaml
//! mode: lenient
//! unique_names: true
//! cross_check: false
//! ```

use serde::{Deserialize, Serialize};

/// How unknown properties are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Unknown properties anywhere in the document are violations.
    #[default]
    Strict,
    /// Unknown properties pass; every other rule still applies.
    Lenient,
}

/// Options for manifest validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Strict or lenient handling of unknown properties.
    pub mode: ValidationMode,
    /// Report repeated implementation names.
    pub unique_names: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Strict,
            unique_names: true,
        }
    }
}

impl ValidatorConfig {
    /// Default configuration with lenient unknown-property handling.
    pub fn lenient() -> Self {
        Self {
            mode: ValidationMode::Lenient,
            ..Self::default()
        }
    }
}

/// Options for pair validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairOptions {
    /// Manifest half of the check.
    #[serde(flatten)]
    pub validator: ValidatorConfig,
    /// Require the record's `uri` (and `proto`) to match a remote
    /// implementation.
    pub cross_check: bool,
}
