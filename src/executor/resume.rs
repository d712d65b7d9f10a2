//! Resume filter: which units are still pending given a checkpoint.
//!
//! Computed exactly once, before any worker starts, as a pure function over
//! the enumerated order and the checkpoint value. Workers never mutate the
//! skip decision mid-run; they only draw from the resulting slice.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of the one-shot resume computation.
#[derive(Debug)]
pub struct ResumePlan {
    /// Units still to execute, in the enumerated total order
    pub pending: Vec<PathBuf>,
    /// Units excluded because the checkpoint covers them
    pub skipped: usize,
    /// A checkpoint existed but its unit is no longer in the listing;
    /// everything was treated as pending instead of stalling
    pub resume_point_missing: bool,
}

/// Partition the ordered unit list into done and pending.
///
/// Units strictly before the checkpointed unit (case-insensitive path
/// equality) already produced result artifacts; the checkpointed unit itself
/// also executed. Everything after is pending.
pub fn filter_pending(units: Vec<PathBuf>, checkpoint: Option<&Path>) -> ResumePlan {
    let last_executed = match checkpoint {
        Some(path) => path,
        None => {
            return ResumePlan {
                pending: units,
                skipped: 0,
                resume_point_missing: false,
            }
        }
    };

    let wanted = normalize(last_executed);
    let position = units.iter().position(|unit| normalize(unit) == wanted);

    match position {
        Some(index) => {
            let skipped = index + 1;
            info!(
                skipped,
                remaining = units.len() - skipped,
                checkpoint = %last_executed.display(),
                "Resuming after checkpoint"
            );
            ResumePlan {
                pending: units[skipped..].to_vec(),
                skipped,
                resume_point_missing: false,
            }
        }
        None => {
            // The checkpointed unit vanished from the directory. Skipping
            // nothing beats skipping everything: re-execution is recoverable.
            warn!(
                checkpoint = %last_executed.display(),
                "Resume point not found in listing, processing all units"
            );
            ResumePlan {
                pending: units,
                skipped: 0,
                resume_point_missing: true,
            }
        }
    }
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_no_checkpoint_all_pending() {
        let plan = filter_pending(units(&["a.apex", "b.apex"]), None);
        assert_eq!(plan.pending.len(), 2);
        assert_eq!(plan.skipped, 0);
        assert!(!plan.resume_point_missing);
    }

    #[test]
    fn test_checkpoint_excludes_prefix_and_itself() {
        let plan = filter_pending(
            units(&["a.apex", "b.apex", "c.apex", "d.apex"]),
            Some(Path::new("b.apex")),
        );
        assert_eq!(plan.pending, units(&["c.apex", "d.apex"]));
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn test_checkpoint_comparison_case_insensitive() {
        let plan = filter_pending(
            units(&["dir/001ABC.apex", "dir/001def.apex"]),
            Some(Path::new("DIR/001abc.APEX")),
        );
        assert_eq!(plan.pending, units(&["dir/001def.apex"]));
    }

    #[test]
    fn test_checkpoint_at_last_unit_leaves_nothing() {
        let plan = filter_pending(units(&["a.apex", "b.apex"]), Some(Path::new("b.apex")));
        assert!(plan.pending.is_empty());
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn test_missing_resume_point_falls_back_to_all() {
        let plan = filter_pending(
            units(&["a.apex", "b.apex"]),
            Some(Path::new("vanished.apex")),
        );
        assert_eq!(plan.pending.len(), 2);
        assert_eq!(plan.skipped, 0);
        assert!(plan.resume_point_missing);
    }
}
