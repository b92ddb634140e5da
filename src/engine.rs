// src/engine.rs
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{error, info, warn};
use crate::config::StreamConfig;
use crate::stream::{
    status_line, AutosaveScheduler, AxisSource, PollOutcome, SamplePipeline, ThreadTicker,
    TickOutcome, Ticker,
};
use crate::types::{Command, StreamEvent};
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub max_append: usize,
    /// How often the buffered count is published.
    pub status_interval: Duration,
}
impl EngineSettings {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_append: config.max_append,
            status_interval: Duration::from_secs(3),
        }
    }
}
/// Drives the window poller and the autosave scheduler from a ticker and
/// reports everything it does as `StreamEvent`s.
pub struct Engine {
    pipeline: Arc<SamplePipeline>,
    scheduler: Arc<AutosaveScheduler>,
    settings: EngineSettings,
    tx: Sender<StreamEvent>,
}
impl Engine {
    pub fn new(
        pipeline: Arc<SamplePipeline>,
        scheduler: Arc<AutosaveScheduler>,
        settings: EngineSettings,
        tx: Sender<StreamEvent>,
    ) -> Self {
        Self {
            pipeline,
            scheduler,
            settings,
            tx,
        }
    }
    fn send(&self, event: StreamEvent) {
        // receiver gone means nobody is listening any more
        self.tx.send(event).ok();
    }
    /// Schedules the poll, autosave and status tasks on `ticker`.
    pub fn attach(&self, ticker: &mut dyn Ticker) {
        let mut poller = self.pipeline.poller(self.settings.max_append);
        let tx = self.tx.clone();
        ticker.schedule(
            self.settings.poll_interval,
            Box::new(move || {
                if let PollOutcome::Update(frame) = poller.poll() {
                    tx.send(StreamEvent::Frame(frame)).ok();
                }
            }),
        );
        let tx = self.tx.clone();
        self.scheduler.attach(ticker, move |result| {
            let line = match result {
                Ok(TickOutcome::Skipped { .. }) => return,
                Ok(TickOutcome::Flushed(outcome)) => outcome.to_string(),
                Err(err) => status_line(&Err(err)),
            };
            tx.send(StreamEvent::Saved(line)).ok();
        });
        let tx = self.tx.clone();
        let scheduler = Arc::clone(&self.scheduler);
        ticker.schedule(
            self.settings.status_interval,
            Box::new(move || {
                tx.send(StreamEvent::Buffered(scheduler.pending())).ok();
            }),
        );
    }
    /// Returns `false` once the engine should stop.
    pub fn handle(&self, command: Command) -> bool {
        match command {
            Command::ForceSave => {
                let result = self.scheduler.force_flush();
                self.send(StreamEvent::Saved(status_line(&result)));
                true
            }
            Command::Shutdown => false,
        }
    }
    /// Final drain and persist. Call after every producer has stopped.
    pub fn finish(&self) {
        let result = self.scheduler.shutdown();
        self.send(StreamEvent::Saved(status_line(&result)));
        self.send(StreamEvent::Log(format!(
            "{} samples assembled, {} reports rejected",
            self.pipeline.emitted_count(),
            self.pipeline.rejected_count()
        )));
        self.send(StreamEvent::Stopped);
    }
}
/// Runs the engine on its own thread until `Shutdown` arrives or every command
/// sender is dropped.
pub fn spawn_thread(engine: Engine, rx_cmd: Receiver<Command>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut ticker = ThreadTicker::new();
        engine.attach(&mut ticker);
        engine.send(StreamEvent::Log(format!(
            "engine ready: poll every {:?}, save every {:?}",
            engine.settings.poll_interval,
            engine.scheduler.policy().save_every
        )));
        for command in rx_cmd.iter() {
            info!("command: {command:?}");
            if !engine.handle(command) {
                break;
            }
        }
        ticker.stop();
        engine.finish();
    })
}
/// Thread pumping one source into the pipeline until stopped or exhausted.
pub struct Producer {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}
impl Producer {
    /// `pace` sleeps between pumps for sources that never block.
    pub fn spawn(
        pipeline: Arc<SamplePipeline>,
        mut source: Box<dyn AxisSource + Send>,
        pace: Option<Duration>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                match pipeline.pump(source.as_mut()) {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        info!("source exhausted");
                        break;
                    }
                    Err(err) => {
                        error!("source failed: {err}");
                        break;
                    }
                }
                if let Some(pace) = pace {
                    thread::sleep(pace);
                }
            }
        });
        Self { running, handle }
    }
    /// Returns once no further sample can reach the pipeline.
    pub fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        if self.handle.join().is_err() {
            warn!("producer thread panicked");
        }
    }
}
/// Reads `s` (save now) and `q` (quit) lines until `q` or end of input.
/// The producer is always stopped before `Shutdown` is sent, so the final
/// flush sees every assembled sample.
pub fn run_console<R: BufRead>(input: R, tx_cmd: &Sender<Command>, producer: Producer) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        match line.trim() {
            "s" => {
                tx_cmd.send(Command::ForceSave).ok();
            }
            "q" => break,
            "" => {}
            other => warn!("unknown command {other:?} (s = save, q = quit)"),
        }
    }
    producer.stop();
    tx_cmd.send(Command::Shutdown).ok();
}
