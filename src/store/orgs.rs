//! Org listing cache backed by `orgs.json`.
//!
//! Epistemic foundation:
//! - B_i: `sf org list` is slow; a cached listing is usually good enough
//! - I^B: The CLI may be unavailable → fall back to the cache when fetching fails

use crate::exec::{OrgListResult, RawOrg};
use crate::models::{BatchError, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One authenticated org, normalized from the CLI listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgInfo {
    pub alias: String,
    pub username: String,
    pub instance_url: String,
    pub is_dev_hub: bool,
    pub is_default_dev_hub: bool,
    pub is_default_org: bool,
    pub is_scratch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

/// Caches the processed org listing on disk.
pub struct OrgCache {
    path: PathBuf,
}

impl OrgCache {
    pub fn new(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir).map_err(|e| BatchError::io("creating storage dir", e))?;
        Ok(Self {
            path: base_dir.join("orgs.json"),
        })
    }

    /// Load the cached listing, if present and readable.
    pub fn load(&self) -> Option<Vec<OrgInfo>> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(orgs) => Some(orgs),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable org cache");
                None
            }
        }
    }

    /// Persist a fresh listing. Failures are logged, not fatal: the cache is
    /// a convenience, not part of the correctness contract.
    pub fn save(&self, orgs: &[OrgInfo]) {
        match serde_json::to_string_pretty(orgs) {
            Ok(content) => {
                if let Err(e) = fs::write(&self.path, content) {
                    warn!(path = %self.path.display(), error = %e, "Failed to save org cache");
                } else {
                    debug!(count = orgs.len(), "Org cache saved");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize org cache"),
        }
    }
}

/// Normalize the raw CLI listing: de-duplicate by username (preferring dev
/// hubs and connected entries), drop expired scratch orgs, and sort with
/// defaults first.
pub fn process_org_list(raw: OrgListResult) -> Vec<OrgInfo> {
    let mut by_username: HashMap<String, RawOrg> = HashMap::new();

    let mut add = |orgs: Vec<RawOrg>| {
        for org in orgs {
            let keep = match by_username.get(&org.username) {
                None => true,
                // A later entry only wins if it upgrades the existing one
                Some(existing) => {
                    (org.is_dev_hub.unwrap_or(false) && !existing.is_dev_hub.unwrap_or(false))
                        || (org.connected_status.as_deref() == Some("Connected")
                            && existing.connected_status.as_deref() != Some("Connected"))
                }
            };
            if keep {
                by_username.insert(org.username.clone(), org);
            }
        }
    };

    // Priority order mirrors how the CLI categorizes orgs
    add(raw.dev_hubs);
    add(raw.non_scratch_orgs);
    add(raw.sandboxes);
    add(raw.scratch_orgs);
    add(raw.other);

    let today = Utc::now().date_naive();
    let mut orgs: Vec<OrgInfo> = by_username
        .into_values()
        .filter(|org| !is_expired_scratch(org, today))
        .map(|org| OrgInfo {
            alias: org.alias.clone().unwrap_or_else(|| org.username.clone()),
            username: org.username,
            instance_url: org.instance_url.unwrap_or_default(),
            is_dev_hub: org.is_dev_hub.unwrap_or(false),
            is_default_dev_hub: org.is_default_dev_hub_username.unwrap_or(false),
            is_default_org: org.is_default_username.unwrap_or(false),
            is_scratch: org.is_scratch.unwrap_or(false),
            expiration_date: org.expiration_date.or(org.trail_expiration_date),
        })
        .collect();

    orgs.sort_by(|a, b| {
        b.is_default_org
            .cmp(&a.is_default_org)
            .then(b.is_default_dev_hub.cmp(&a.is_default_dev_hub))
            .then(b.is_dev_hub.cmp(&a.is_dev_hub))
            .then(a.alias.cmp(&b.alias))
    });

    orgs
}

fn is_expired_scratch(org: &RawOrg, today: NaiveDate) -> bool {
    if !org.is_scratch.unwrap_or(false) {
        return false;
    }
    match org
        .expiration_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    {
        Some(expiration) => expiration < today,
        None => false,
    }
}
