use crate::error::ProducerError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "awtrix-sync.yaml";
pub const KNOWN_UNITS_FILE: &str = "known_apps.json";
pub const PENDING_FILE: &str = "awtrix_pending_data.json";
pub const APPS_DIR: &str = "apps";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn known_units_path(state_dir: &Path) -> PathBuf {
    state_dir.join(KNOWN_UNITS_FILE)
}

pub fn pending_path(state_dir: &Path) -> PathBuf {
    state_dir.join(PENDING_FILE)
}

// ---------------------------------------------------------------------------
// Unit name validation
// ---------------------------------------------------------------------------

static UNIT_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn unit_name_re() -> &'static Regex {
    UNIT_NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap())
}

/// Unit names end up in the device URL, so keep them to a conservative charset.
pub fn validate_unit_name(name: &str) -> Result<(), ProducerError> {
    if name.is_empty() || name.len() > 64 || !unit_name_re().is_match(name) {
        return Err(ProducerError::InvalidUnitName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
