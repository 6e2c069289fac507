//! ancs-replay: drive an ANCS session from a recorded trace.
//!
//! ```text
//!   trace file ──▶ parse_trace ──▶ AncsSession ──▶ ReplayPorts ──▶ log
//! ```
//!
//! Usage: `ancs-replay <trace> [config.json]`.  Set `RUST_LOG=debug` for
//! per-fragment detail.
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::info;

use ancs::adapters::log_sink::LogEventSink;
use ancs::adapters::trace::{self, ReplayPorts};
use ancs::app::{ActionMailbox, AncsSession};
use ancs::config::AncsConfig;

static MAILBOX: ActionMailbox = ActionMailbox::new();

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let path = args.next().context("usage: ancs-replay <trace> [config.json]")?;
    let config = match args.next() {
        Some(config_path) => load_config(&config_path)?,
        None => AncsConfig::default(),
    };

    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let commands = trace::parse_trace(&text)?;
    info!("Replay: {} command(s) from {}", commands.len(), path);

    let mut session = AncsSession::new(config, &MAILBOX)?;
    let mut ports = ReplayPorts::new(LogEventSink::new());
    for (idx, command) in commands.into_iter().enumerate() {
        trace::apply(&mut session, &mut ports, command)
            .with_context(|| format!("replaying command {}", idx + 1))?;
    }

    info!(
        "Replay: done, {} event(s), {} write(s), state={:?}",
        ports.sink().emitted(),
        ports.writes().len(),
        session.state()
    );
    info!("Replay: counters {:?}", session.counters());
    Ok(())
}

fn load_config(path: &str) -> Result<AncsConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config: AncsConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    Ok(config)
}
