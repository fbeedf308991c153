//! Loading validation options from a YAML file.

use std::path::Path;

use aid_schema::PairOptions;
use anyhow::{Context, Result};

/// Read [`PairOptions`] from `path`, or defaults when no path is given.
///
/// An empty file yields the defaults. Unknown keys are ignored.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a valid options document.
pub fn load_options(path: Option<&Path>) -> Result<PairOptions> {
    let Some(path) = path else {
        return Ok(PairOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(PairOptions::default());
    }
    let options: PairOptions = serde_yaml::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(config = %path.display(), ?options, "loaded options");
    Ok(options)
}
