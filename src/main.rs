//! apexbatch CLI - resumable Apex batch execution via the sf CLI.

use anyhow::{Context, Result};
use apexbatch::{
    enumerate_units, BatchProcessor, BatchRequest, Config, JobRecord, JobStatus, JobStore,
    OrgCache, ProgressSink, SfCli,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "apexbatch")]
#[command(version)]
#[command(about = "Run large batches of generated Apex scripts against a Salesforce org")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Query record IDs and generate one Apex script per record
    Prepare {
        /// Job name (case-insensitive)
        #[arg(short, long)]
        job: String,

        /// SOQL query selecting the records to process
        #[arg(short, long)]
        query: String,

        /// Path to the Apex template file
        #[arg(short, long)]
        template: PathBuf,

        /// Alias or username of the target org
        #[arg(short = 'o', long)]
        target_org: String,
    },

    /// Execute a prepared job (resumes from checkpoint; Ctrl-C pauses)
    Run {
        /// Job name (case-insensitive)
        #[arg(short, long)]
        job: String,

        /// Number of concurrent workers (defaults from config)
        #[arg(short = 'n', long)]
        concurrency: Option<usize>,
    },

    /// List known jobs and their status
    Jobs,

    /// List authenticated orgs (cached in orgs.json)
    Orgs {
        /// Bypass the cache and query the sf CLI
        #[arg(long)]
        refresh: bool,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::from_file(path).with_context(|| format!("Failed to load config from {path:?}"))
        }
        None => Ok(Config::default()),
    }
}

/// Progress sink that drives an indicatif bar from lifecycle messages.
struct BarSink {
    bar: ProgressBar,
}

impl ProgressSink for BarSink {
    fn notify(&self, message: &str) {
        if message.starts_with("Progress:") {
            self.bar.inc(1);
            self.bar.set_message(message.to_string());
        } else {
            self.bar.println(message);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_ref())?;
    let base_dir = config.storage.base_dir.clone();
    let sf = SfCli::new(config.executor.sf_bin.clone());

    match cli.command {
        Commands::Prepare {
            job,
            query,
            template,
            target_org,
        } => {
            let apex_template = std::fs::read_to_string(&template)
                .with_context(|| format!("Failed to read template from {template:?}"))?;

            let record_ids = sf
                .query_record_ids(&query, &target_org)
                .await
                .context("SOQL query failed")?;
            info!(count = record_ids.len(), "Fetched record IDs");

            let processor = BatchProcessor::new(&base_dir, Arc::new(sf));
            processor.generate_scripts(&job, &record_ids, &apex_template)?;

            let store = JobStore::new(&base_dir)?;
            store.save(JobRecord {
                job_name: job.clone(),
                target_org,
                soql_query: query,
                apex_template,
                status: JobStatus::Prepared,
                timestamp: chrono::Utc::now(),
                result: None,
            })?;

            let paths = processor.resolve_paths(&job);
            println!("Prepared {} scripts in {:?}", record_ids.len(), paths.script_dir);
        }

        Commands::Run { job, concurrency } => {
            let store = JobStore::new(&base_dir)?;
            let record = store
                .get(&job)
                .ok_or_else(|| anyhow::anyhow!("No such job: {job}"))?;

            let processor = BatchProcessor::new(&base_dir, Arc::new(sf));
            let paths = processor.resolve_paths(&job);
            paths.ensure()?;
            let total = enumerate_units(&paths.script_dir)?.len();

            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                    .unwrap()
                    .progress_chars("##-"),
            );
            let processor = processor.with_progress(Arc::new(BarSink { bar: bar.clone() }));

            // Ctrl-C requests a cooperative pause; in-flight scripts finish first
            let pause = processor.pause_controller();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, pausing after in-flight scripts");
                    pause.request_pause();
                }
            });

            store.set_status(&job, JobStatus::Running, None)?;
            let summary = processor
                .run(BatchRequest {
                    job_name: job.clone(),
                    target_org: record.target_org,
                    concurrency: concurrency.unwrap_or(config.executor.concurrency),
                })
                .await?;

            let paused = processor.pause_controller().pause_requested();
            let status = if paused {
                JobStatus::Paused
            } else {
                JobStatus::Completed
            };
            store.set_status(&job, status, Some(summary))?;

            bar.finish_with_message(if paused { "Paused" } else { "Done" });
            println!("\n=== Batch {} ===", if paused { "Paused" } else { "Complete" });
            println!("Successful:  {}", summary.successful);
            println!("Failed:      {}", summary.failed);
            println!("Total:       {}", summary.total);
            if paused {
                println!("Resume with: apexbatch run --job {job}");
            }
        }

        Commands::Jobs => {
            let store = JobStore::new(&base_dir)?;
            let jobs = store.load_all();
            if jobs.is_empty() {
                println!("No jobs found");
            }
            for record in jobs.values() {
                let result = record
                    .result
                    .map(|r| format!(" ({} ok, {} failed)", r.successful, r.failed))
                    .unwrap_or_default();
                println!(
                    "{:<24} {:<10} {}{result}",
                    record.job_name,
                    format!("{:?}", record.status).to_lowercase(),
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                );
            }
        }

        Commands::Orgs { refresh } => {
            let cache = OrgCache::new(&base_dir)?;

            let orgs = if refresh {
                match sf.list_orgs().await {
                    Ok(orgs) => {
                        cache.save(&orgs);
                        orgs
                    }
                    Err(e) => {
                        warn!(error = %e, "Fetching orgs failed, falling back to cache");
                        cache.load().context("No cached org listing available")?
                    }
                }
            } else if let Some(orgs) = cache.load() {
                orgs
            } else {
                let orgs = sf.list_orgs().await.context("Failed to list orgs")?;
                cache.save(&orgs);
                orgs
            };

            for org in orgs {
                let mut flags = Vec::new();
                if org.is_default_org {
                    flags.push("default");
                }
                if org.is_dev_hub {
                    flags.push("devhub");
                }
                if org.is_scratch {
                    flags.push("scratch");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                println!("{:<24} {}{flags}", org.alias, org.username);
            }
        }
    }

    Ok(())
}
