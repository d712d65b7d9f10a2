//! Work unit enumeration.
//!
//! The processing order must be stable across repeated enumerations of an
//! unchanged directory, otherwise checkpoint comparison is meaningless.
//! `read_dir` makes no ordering promise, so entries are sorted by file name.

use crate::models::{BatchError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of a rendered work unit file.
pub const UNIT_EXTENSION: &str = "apex";

/// List all work units in the script directory in a fixed total order.
///
/// An empty or extension-less directory yields an empty list, not an error.
pub fn enumerate_units(script_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(script_dir)
        .map_err(|e| BatchError::io(format!("listing {}", script_dir.display()), e))?;

    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BatchError::io("reading directory entry", e))?;
        let path = entry.path();
        let is_unit = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(UNIT_EXTENSION));
        if is_unit {
            units.push(path);
        }
    }

    units.sort();
    debug!(count = units.len(), dir = %script_dir.display(), "Enumerated work units");
    Ok(units)
}

/// Record identifier encoded in a unit file name.
pub fn unit_record_id(unit: &Path) -> String {
    unit.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| unit.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_filters_and_orders() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.apex"), "").unwrap();
        fs::write(temp.path().join("a.APEX"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::write(temp.path().join("c.apex"), "").unwrap();

        let units = enumerate_units(temp.path()).unwrap();
        let names: Vec<_> = units.iter().map(|u| unit_record_id(u)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        assert!(enumerate_units(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_stable_across_enumerations() {
        let temp = TempDir::new().unwrap();
        for name in ["x.apex", "m.apex", "a.apex"] {
            fs::write(temp.path().join(name), "").unwrap();
        }

        let first = enumerate_units(temp.path()).unwrap();
        let second = enumerate_units(temp.path()).unwrap();
        assert_eq!(first, second);
    }
}
