//! Resolving a scenario document by name from a resources directory.

use std::path::{Path, PathBuf};

use crate::normalize::{normalize_scenario, ScenarioError};
use crate::types::Scenario;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("scenario file '{0}' not found")]
    NotFound(PathBuf),

    #[error("failed to read scenario file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario file '{path}' as JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ScenarioError),
}

/// Load and validate `<resources_dir>/<name>.json` as a `Scenario`.
pub fn load_scenario(resources_dir: &Path, name: &str) -> Result<Scenario, LoadError> {
    let path = resources_dir.join(format!("{name}.json"));
    if !path.exists() {
        return Err(LoadError::NotFound(path));
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let raw: serde_json::Value =
        serde_json::from_str(&contents).map_err(|source| LoadError::Json { path, source })?;

    Ok(normalize_scenario(raw)?)
}

/// Path to the `resources/scenarios/` directory bundled with this crate,
/// used by tests and by callers that want the reference scenarios without
/// assembling their own path.
pub fn bundled_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/scenarios")
}
