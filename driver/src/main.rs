use anyhow::Context;
use clap::{Parser, Subcommand};
use generator::demo::{build_demo_signals, GeneratorConfig};
use gui_bridge::bridge::GuiBridge;
use sigmapcore::catalog::{FilterCriteria, SortColumn, SortState};
use sigmapcore::record::{SignalDraft, SignalId};
use sigmapcore::votes::{FileStorage, VoteDirection};
use sigmapcore::Clock;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::AppConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Community radio-signal map driver")]
struct Args {
    /// Load settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the signal store file
    #[arg(long)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the filtered, sorted table and marker count
    List {
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long = "type", default_value = "")]
        kind: String,
        #[arg(long, default_value = "")]
        frequency: String,
        #[arg(long)]
        sort: Option<SortColumn>,
        #[arg(long, default_value_t = false)]
        desc: bool,
    },
    /// Add one signal
    Add {
        #[arg(long)]
        frequency: String,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long = "type", default_value = "")]
        kind: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        radius: String,
    },
    /// Vote a signal up or down from this device
    Vote { id: String, direction: VoteDirection },
    /// Import a repeater CSV export
    Import {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
        #[arg(long)]
        color: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        pacing_ms: Option<u64>,
    },
    /// Insert a deterministic synthetic dataset
    Demo {
        #[arg(long, default_value_t = 40)]
        count: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Run the HTTP bridge until Ctrl+C
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?.with_overrides(args.store.clone(), None),
        None => AppConfig::from_args(args.store.clone(), None),
    };

    match args.command {
        Command::List {
            city,
            kind,
            frequency,
            sort,
            desc,
        } => {
            let runner = Runner::open(config)?;
            let criteria = FilterCriteria {
                city,
                kind,
                frequency,
            };
            let sort = sort
                .map(|column| SortState::by(column, !desc))
                .unwrap_or_default();
            let view = runner.view(&criteria, sort);
            for row in &view.rows {
                let s = &row.signal;
                let votes = s.votes();
                println!(
                    "{:<22} {:>10} MHz  {:<16} {:<8} {:<7} +{}/-{}  {}",
                    s.id,
                    s.frequency_text(),
                    s.city,
                    s.kind,
                    row.display_color,
                    votes.up,
                    votes.down,
                    s.description
                );
            }
            println!(
                "{} signals, {} map markers",
                view.rows.len(),
                view.markers.len()
            );
        }
        Command::Add {
            frequency,
            lat,
            lon,
            city,
            kind,
            description,
            radius,
        } => {
            let runner = Runner::open(config)?;
            let draft = SignalDraft {
                frequency,
                city,
                kind,
                description,
                radius_km: radius,
                ..SignalDraft::at(lat, lon)
            };
            let id = runner.submit(draft).context("adding signal")?;
            println!("Added signal {}", id);
        }
        Command::Vote { id, direction } => {
            let storage = FileStorage::open(&config.device_state_path).with_context(|| {
                format!("opening device state {}", config.device_state_path.display())
            })?;
            let runner = Runner::open(config)?;
            let counter = runner.vote_counter(Arc::new(storage));
            let outcome = counter
                .vote(&SignalId::new(id), direction)
                .context("casting vote")?;
            println!("{}", outcome.notice());
        }
        Command::Import {
            file,
            yes,
            color,
            kind,
            pacing_ms,
        } => {
            let mut defaults = config.import.clone();
            if let Some(color) = color {
                defaults.color = color;
            }
            if let Some(kind) = kind {
                defaults.kind = kind;
            }
            if let Some(pacing_ms) = pacing_ms {
                defaults.pacing_ms = pacing_ms;
            }
            let runner = Runner::open(config)?;
            let runtime = TokioBuilder::new_current_thread()
                .enable_all()
                .build()
                .context("creating runtime for import")?;
            let report = runtime.block_on(workflow::importer::run(
                &runner,
                &file,
                &defaults,
                yes,
                &mut io::stdin().lock(),
                &mut io::stdout(),
            ))?;
            log::info!("import finished: {:?}", report);
        }
        Command::Demo { count, seed } => {
            let runner = Runner::open(config)?;
            let generator = GeneratorConfig {
                count,
                seed,
                ..Default::default()
            };
            let now = runner.clock().now_millis();
            let mut written = 0;
            for signal in build_demo_signals(&generator, now) {
                runner.insert(signal).context("inserting demo signal")?;
                written += 1;
            }
            println!("Inserted {} demo signals", written);
        }
        Command::Serve { bind } => {
            let config = config.with_overrides(None, bind);
            let addr = config.bind;
            let runner = Runner::open(config)?;
            let bridge = GuiBridge::new(runner);
            bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
            let runtime = TokioBuilder::new_multi_thread()
                .enable_all()
                .build()
                .context("creating runtime for the bridge")?;
            runtime.block_on(bridge.serve(addr, async {
                if let Err(err) = signal::ctrl_c().await {
                    log::warn!("Ctrl+C handler failed: {}", err);
                }
            }))?;
        }
    }

    Ok(())
}
