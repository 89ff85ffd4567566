/*!
 * proc-sched - Main Entry Point
 *
 * Runs a batch of commands under an offline policy (fcfs, rr, mlfq) or
 * schedules commands read from stdin with online SJF until `exit`.
 */

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

use proc_sched::{
    init_tracing, Engine, OsExecutor, Policy, ReaderArrivals, RunStats, SchedError, SchedulerConfig,
    Workload,
};

#[derive(Parser, Debug)]
#[command(name = "proc-sched", version, about = "Schedule real processes and report timing")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for result_*.csv summaries
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Also write <policy>.json with processes and run statistics
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// First-come first-served
    Fcfs(Batch),
    /// Round robin
    Rr {
        #[command(flatten)]
        batch: Batch,
        /// Quantum in ms
        #[arg(long)]
        quantum: Option<u64>,
    },
    /// Multi-level feedback queue
    Mlfq {
        #[command(flatten)]
        batch: Batch,
        /// Per-level quanta in ms, highest priority first
        #[arg(long, value_delimiter = ',', num_args = 3)]
        quanta: Option<Vec<u64>>,
        /// Priority boost interval in ms
        #[arg(long)]
        boost: Option<u64>,
    },
    /// Online shortest-job-first over stdin
    Sjf,
}

#[derive(Args, Debug)]
struct Batch {
    /// File with one command per line
    #[arg(long, short)]
    file: Option<PathBuf>,

    /// Commands, each as a single argument (e.g. "sleep 1")
    commands: Vec<String>,
}

impl Batch {
    fn load(&self) -> anyhow::Result<Workload> {
        let mut workload = match &self.file {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("opening workload {}", path.display()))?;
                Workload::from_reader(BufReader::new(file))?
            }
            None => Workload::new(),
        };
        if !self.commands.is_empty() {
            let mut commands: Vec<String> = workload.iter().map(|p| p.command.clone()).collect();
            commands.extend(self.commands.iter().cloned());
            workload = Workload::from_commands(commands);
        }
        anyhow::ensure!(!workload.is_empty(), "no commands given");
        Ok(workload)
    }
}

fn main() -> miette::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).map_err(|e| match e.downcast::<SchedError>() {
        Ok(err) => miette::Report::new(err),
        Err(err) => miette::miette!("{:#}", err),
    })
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::new(),
    };
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir);
    }

    let executor = OsExecutor::new().with_output_capacity(config.output_capacity);
    let mut engine = Engine::new(executor, config.clone());

    match cli.command {
        Mode::Fcfs(batch) => {
            let mut workload = batch.load()?;
            let stats = engine.fcfs(&mut workload)?;
            write_json(&config, cli.json, &stats, &workload)?;
        }
        Mode::Rr { batch, quantum } => {
            let mut workload = batch.load()?;
            let stats = engine.round_robin(&mut workload, quantum.unwrap_or(config.rr_quantum_ms))?;
            write_json(&config, cli.json, &stats, &workload)?;
        }
        Mode::Mlfq {
            batch,
            quanta,
            boost,
        } => {
            let mut workload = batch.load()?;
            let [q0, q1, q2] = match quanta {
                Some(q) => [q[0], q[1], q[2]],
                None => config.mlfq_quanta_ms,
            };
            let boost = boost.unwrap_or(config.mlfq_boost_ms);
            let stats = engine.mlfq(&mut workload, q0, q1, q2, boost)?;
            write_json(&config, cli.json, &stats, &workload)?;
        }
        Mode::Sjf => {
            let mut source = ReaderArrivals::stdin();
            let run = engine.shortest_job_first(&mut source)?;
            write_json(&config, cli.json, &run.stats, &run.workload)?;
        }
    }

    info!("Done");
    Ok(())
}

fn write_json(
    config: &SchedulerConfig,
    enabled: bool,
    stats: &RunStats,
    workload: &Workload,
) -> anyhow::Result<()> {
    if !enabled {
        return Ok(());
    }
    let name = match stats.policy {
        Policy::ShortestJobFirst => "result_online_SJF.json".to_string(),
        policy => format!("result_offline_{}.json", policy),
    };
    proc_sched::monitoring::write_json_report(config.output_dir.join(name), stats, workload.processes())?;
    Ok(())
}
