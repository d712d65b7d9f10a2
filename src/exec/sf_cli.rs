//! Salesforce CLI invocations: apex run, SOQL queries, org listing.
//!
//! Epistemic foundation:
//! - K_i: All remote-org interaction goes through the `sf` binary
//! - B_i: The binary may be missing, the org unreachable, the output malformed
//! - I^B: Execution time is unbounded from our side; no timeout is imposed here

use crate::exec::{ExecFailure, ExecOutput, ScriptExecutor};
use crate::models::{BatchError, Result};
use crate::store::OrgInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Thin wrapper over the `sf` CLI.
#[derive(Debug, Clone)]
pub struct SfCli {
    /// Name or path of the sf binary
    bin: String,
}

impl Default for SfCli {
    fn default() -> Self {
        Self::new("sf")
    }
}

impl SfCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run_command(&self, args: &[&str]) -> Result<ExecOutput> {
        debug!(bin = %self.bin, ?args, "Running sf command");
        let output = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BatchError::io(format!("spawning {}", self.bin), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(BatchError::SfCli(format!(
                "sf {} exited with {}: {}",
                args.first().copied().unwrap_or(""),
                output.status,
                stderr.trim()
            )));
        }

        Ok(ExecOutput { stdout, stderr })
    }

    /// Fetch record IDs for a SOQL query via `sf data query --json`.
    ///
    /// B_i(query is valid, org reachable) → Result
    pub async fn query_record_ids(&self, soql: &str, target_org: &str) -> Result<Vec<String>> {
        let soql = sanitize_for_cmd(soql);
        let out = self
            .run_command(&[
                "data",
                "query",
                "--query",
                &soql,
                "--target-org",
                target_org,
                "--json",
            ])
            .await?;

        let parsed: QueryResponse = serde_json::from_str(&out.stdout)
            .map_err(|e| BatchError::ParseError(format!("sf data query output: {e}")))?;

        Ok(parsed
            .result
            .records
            .into_iter()
            .filter_map(|r| r.id)
            .collect())
    }

    /// List authenticated orgs via `sf org list --json`.
    pub async fn list_orgs(&self) -> Result<Vec<OrgInfo>> {
        let out = self.run_command(&["org", "list", "--json"]).await?;

        if out.stdout.trim().is_empty() {
            return Ok(Vec::new());
        }

        let parsed: OrgListResponse = serde_json::from_str(&out.stdout)
            .map_err(|e| BatchError::ParseError(format!("sf org list output: {e}")))?;

        Ok(crate::store::process_org_list(parsed.result))
    }
}

#[async_trait]
impl ScriptExecutor for SfCli {
    async fn execute(
        &self,
        script_path: &Path,
        target_org: &str,
    ) -> std::result::Result<ExecOutput, ExecFailure> {
        let output = Command::new(&self.bin)
            .args(["apex", "run", "--file"])
            .arg(script_path)
            .args(["--target-org", target_org])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExecFailure {
                message: format!("spawning {}: {e}", self.bin),
                stdout: String::new(),
                stderr: String::new(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(ExecOutput { stdout, stderr })
        } else {
            Err(ExecFailure {
                message: format!("sf apex run exited with {}", output.status),
                stdout,
                stderr,
            })
        }
    }
}

/// Collapse newlines and trim so user-entered SOQL survives the command line.
fn sanitize_for_cmd(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    records: Vec<QueryRecord>,
}

#[derive(Debug, Deserialize)]
struct QueryRecord {
    #[serde(rename = "Id")]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrgListResponse {
    result: OrgListResult,
}

/// Raw org categories as `sf org list --json` reports them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgListResult {
    #[serde(default)]
    pub dev_hubs: Vec<RawOrg>,
    #[serde(default)]
    pub non_scratch_orgs: Vec<RawOrg>,
    #[serde(default)]
    pub sandboxes: Vec<RawOrg>,
    #[serde(default)]
    pub scratch_orgs: Vec<RawOrg>,
    #[serde(default)]
    pub other: Vec<RawOrg>,
}

/// One org entry as the CLI reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrg {
    pub username: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default)]
    pub is_dev_hub: Option<bool>,
    #[serde(default)]
    pub is_default_dev_hub_username: Option<bool>,
    #[serde(default)]
    pub is_default_username: Option<bool>,
    #[serde(default)]
    pub is_scratch: Option<bool>,
    #[serde(default)]
    pub connected_status: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub trail_expiration_date: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
