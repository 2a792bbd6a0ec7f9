//! Command-line front end: argument parsing and a line-based event driver.
//!
//! The binary reads [`PlatformEvent`]s as text lines (see its `FromStr`
//! impl) from standard input on a background thread and feeds them to the
//! host through a channel. End of input quits the host.

use std::io::BufRead;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::Sender;
use reel_engine::{HostConfig, PlatformEvent};

/// reel: run a simulation module headless, driven by events on stdin.
#[derive(Parser, Clone, Debug, PartialEq)]
#[command(name = "reel")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Events are read from stdin, one per line, e.g. `key w down`, \
`toggle 1`, `quit`. Lines starting with # are ignored.")]
pub struct Args {
    /// Compiled simulation module (.so/.dylib/.dll)
    pub module: PathBuf,

    /// Directory for recording slots [default: recordings]
    #[arg(long = "recordings", value_name = "DIR")]
    pub recording_dir: Option<PathBuf>,

    /// Simulation rate in ticks per second [default: 60]
    #[arg(long = "tick-rate", value_name = "HZ", value_parser = parse_tick_rate)]
    pub tick_rate_hz: Option<f64>,

    /// Quiet period before reloading a rebuilt module [default: 250]
    #[arg(
        long = "settle-ms",
        value_name = "MS",
        value_parser = clap::value_parser!(u64).range(0..=60_000)
    )]
    pub settle_ms: Option<u64>,

    /// Request the arena at this address, e.g. 0x20000000000. Keeping it
    /// fixed across runs keeps pointers stored in module state valid in
    /// old recordings.
    #[arg(long = "base", value_name = "HEX", value_parser = parse_address)]
    pub base_address: Option<usize>,
}

impl Args {
    /// Apply the overrides to `config`.
    pub fn apply(&self, config: &mut HostConfig) {
        if let Some(dir) = &self.recording_dir {
            config.recording_dir = dir.clone();
        }
        if let Some(hz) = self.tick_rate_hz {
            config.tick_rate_hz = hz;
        }
        if let Some(ms) = self.settle_ms {
            config.reload.settle_delay = Duration::from_millis(ms);
        }
        if let Some(base) = self.base_address {
            config.arena.base_address = Some(base);
        }
    }
}

fn parse_tick_rate(raw: &str) -> Result<f64, String> {
    let hz: f64 = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    HostConfig::check_tick_rate(hz).map_err(|e| e.to_string())?;
    Ok(hz)
}

fn parse_address(raw: &str) -> Result<usize, String> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    usize::from_str_radix(digits, 16).map_err(|_| format!("`{raw}` is not a hex address"))
}

/// Forward events parsed from `input` lines to `tx` until end of input or
/// until the receiver is gone.
///
/// Blank lines and `#` comments are skipped; malformed lines are logged
/// and skipped. Returns the number of events sent. Dropping `tx` at the
/// end makes a [`ChannelEventSource`](reel_engine::ChannelEventSource)
/// report quit.
pub fn forward_lines<R: BufRead>(input: R, tx: Sender<PlatformEvent>) -> usize {
    let mut sent = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("event input failed: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<PlatformEvent>() {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
                sent += 1;
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    log::debug!("event input closed after {sent} events");
    sent
}

/// Run [`forward_lines`] on a named background thread.
pub fn spawn_line_reader<R>(input: R, tx: Sender<PlatformEvent>) -> std::io::Result<JoinHandle<usize>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("reel-events".into())
        .spawn(move || forward_lines(input, tx))
}
