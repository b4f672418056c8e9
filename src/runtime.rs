use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::debug;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrainerEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    GenerationComplete(String),
    GenerationFailed(String),
    FlashExpired(Instant),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait TrainerEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError>;

    /// Handle for background work that feeds results into the same queue.
    fn sender(&self) -> Sender<TrainerEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<TrainerEvent>,
    rx: Receiver<TrainerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports key releases too
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    input_tx.send(TrainerEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => input_tx.send(TrainerEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    debug!(error = %err, "terminal input closed");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<TrainerEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    tx: Sender<TrainerEvent>,
    rx: Receiver<TrainerEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<TrainerEvent> {
        self.tx.clone()
    }
}

/// Deliver `event` on `tx` after `delay`.
pub fn schedule(tx: Sender<TrainerEvent>, delay: Duration, event: TrainerEvent) {
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        let _ = tx.send(event);
    });
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: TrainerEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Cell<Instant>,
}

impl<E: TrainerEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Cell::new(Instant::now()),
        }
    }

    pub fn sender(&self) -> Sender<TrainerEvent> {
        self.event_source.sender()
    }

    /// Returns the next event, or Tick once the interval has passed since the
    /// previous Tick. Ticks are emitted even while input keeps arriving.
    pub fn step(&self) -> TrainerEvent {
        let now = Instant::now();
        let due = self.last_tick.get() + self.ticker.interval();
        if now >= due {
            self.last_tick.set(now);
            return TrainerEvent::Tick;
        }

        match self.event_source.recv_timeout(due - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.last_tick.set(Instant::now());
                TrainerEvent::Tick
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_returns_tick_on_timeout() {
        let es = TestEventSource::new();
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        assert_eq!(runner.step(), TrainerEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let es = TestEventSource::new();
        es.sender().send(TrainerEvent::Resize).unwrap();
        let runner = Runner::new(es, FixedTicker::new(Duration::from_secs(10)));

        assert_eq!(runner.step(), TrainerEvent::Resize);
    }

    #[test]
    fn tick_is_not_starved_by_input() {
        let es = TestEventSource::new();
        let tx = es.sender();
        for _ in 0..50 {
            tx.send(TrainerEvent::Resize).unwrap();
        }
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(runner.step(), TrainerEvent::Tick);
        assert_eq!(runner.step(), TrainerEvent::Resize);
    }

    #[test]
    fn scheduled_event_arrives_after_delay() {
        let es = TestEventSource::new();
        let started = Instant::now();
        schedule(es.sender(), Duration::from_millis(20), TrainerEvent::FlashExpired(started));

        let ev = es.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(ev, TrainerEvent::FlashExpired(started));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn runner_sender_feeds_same_queue() {
        let runner = Runner::new(TestEventSource::new(), FixedTicker::new(Duration::from_secs(10)));
        runner
            .sender()
            .send(TrainerEvent::GenerationComplete("next".into()))
            .unwrap();
        assert_eq!(
            runner.step(),
            TrainerEvent::GenerationComplete("next".into())
        );
    }
}
