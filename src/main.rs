// src/main.rs
use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, error, info};
use axisstream::config::StreamConfig;
use axisstream::engine::{self, Engine, EngineSettings, Producer};
use axisstream::serial::SerialSource;
use axisstream::stream::{AutosaveScheduler, AxisSource, PollOutcome, SamplePipeline, SimulatedSource};
use axisstream::types::StreamEvent;
const SIMULATED_PACE: Duration = Duration::from_millis(20);
fn load_config() -> Result<StreamConfig> {
    match std::env::args().nth(1) {
        Some(path) => StreamConfig::load(Path::new(&path))
            .with_context(|| format!("failed to load config from {path}")),
        None => Ok(StreamConfig::default()),
    }
}
type BoxedSource = Box<dyn AxisSource + Send>;
fn open_source(config: &StreamConfig, channel_count: usize) -> Result<(BoxedSource, Option<Duration>)> {
    let source: BoxedSource = match &config.serial_port {
        Some(port) => Box::new(SerialSource::open(port, config.baud_rate, channel_count)?),
        None => {
            info!("no serial port configured, using simulated source");
            Box::new(SimulatedSource::new(channel_count))
        }
    };
    let pace = config.serial_port.is_none().then_some(SIMULATED_PACE);
    Ok((source, pace))
}
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = load_config()?;
    let channels = config.validate().context("invalid configuration")?;
    let pipeline = Arc::new(SamplePipeline::new(channels.clone(), config.window_points));
    let scheduler = Arc::new(AutosaveScheduler::new(
        pipeline.accumulator(),
        Arc::new(config.file_sink(channels)),
        config.save_policy(),
    ));
    let (tx_event, rx_event) = mpsc::channel();
    let (tx_cmd, rx_cmd) = mpsc::channel();
    let engine = Engine::new(
        Arc::clone(&pipeline),
        scheduler,
        EngineSettings::from_config(&config),
        tx_event,
    );
    let (source, pace) = open_source(&config, pipeline.channels().len())?;
    let producer = Producer::spawn(Arc::clone(&pipeline), source, pace);
    let engine_thread = engine::spawn_thread(engine, rx_cmd);
    // end of input quits like `q`
    thread::spawn(move || engine::run_console(io::stdin().lock(), &tx_cmd, producer));
    info!(
        "writing to {} every {}s; type `s` + Enter to save now, `q` + Enter to quit",
        config.output_dir.display(),
        config.save_every_sec
    );
    for event in rx_event {
        match event {
            StreamEvent::Log(msg) => info!("{msg}"),
            StreamEvent::Frame(frame) => {
                if let Some(latest) = frame.samples.last() {
                    debug!("latest {:?}", latest.values());
                }
                debug!("{}", PollOutcome::Update(frame));
            }
            StreamEvent::Saved(line) => info!("{line}"),
            StreamEvent::Buffered(n) => info!("Buffered: {n} samples"),
            StreamEvent::Stopped => break,
        }
    }
    if engine_thread.join().is_err() {
        error!("engine thread panicked");
    }
    Ok(())
}
