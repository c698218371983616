//! Profile persistence.
//!
//! A profile is one pretty-printed JSON file holding the product, its test
//! questions and the latest visibility and health results. Writes replace
//! the whole file; the last writer wins.

use std::path::Path;
use tracing::{debug, info};

use crate::error::ProfileError;
use crate::models::Profile;

/// Reads and validates a profile.
pub fn load(path: &Path) -> Result<Profile, ProfileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let profile: Profile = serde_json::from_str(&content).map_err(|source| ProfileError::Json {
        path: path.display().to_string(),
        source,
    })?;
    profile.product.validate()?;

    debug!(
        "Loaded profile {} ({} questions)",
        path.display(),
        profile.questions.len()
    );
    Ok(profile)
}

/// Writes a profile, creating parent directories as needed.
pub fn save(profile: &Profile, path: &Path) -> Result<(), ProfileError> {
    let io_error = |source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let json = serde_json::to_string_pretty(profile).map_err(|source| ProfileError::Json {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, json + "\n").map_err(io_error)?;

    info!("Saved profile to {}", path.display());
    Ok(())
}
