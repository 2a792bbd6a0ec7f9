//! `reel`: run a simulation module headless, driven by events on stdin.

use std::process::ExitCode;

use clap::Parser;
use reel::cli::{spawn_line_reader, Args};
use reel::prelude::*;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = HostConfig::default();
    args.apply(&mut config);

    let (tx, events) = ChannelEventSource::channel();
    let source = DylibSource::new(&args.module);
    let mut host = match Host::new(config, source, events, NullPresenter::default()) {
        Ok(host) => host,
        Err(e) => {
            log::error!("cannot start host: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = spawn_line_reader(std::io::BufReader::new(std::io::stdin()), tx) {
        log::error!("cannot start event reader: {e}");
        return ExitCode::FAILURE;
    }

    let metrics = host.run();
    log::info!(
        "{} ticks, {} recorded frames, {} played frames, {} session errors",
        metrics.ticks,
        metrics.recorded_frames,
        metrics.played_frames,
        metrics.session_errors
    );
    ExitCode::SUCCESS
}
