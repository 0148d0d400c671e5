//! Sampling loop → bus → consumers, the way the control app wires it.
//!
//! - a sampler thread reads a fake proximity sensor every 100ms and publishes samples
//! - a button thread publishes presses
//! - consumers on the dispatch thread: an LED toggler, a running average, and `LogWriter`
//!
//! Run with:
//! ```text
//! RUST_LOG=info cargo run --example sensor_loop
//! ```

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dispatchbus::{Bus, BusConfig, LogWriter, Subscribe, WorkQueue, WorkQueueConfig};
use tracing_subscriber::EnvFilter;

const PERIOD: Duration = Duration::from_millis(100);
const SAMPLES: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Button {
    A,
    B,
}

#[derive(Clone, Debug)]
enum SenseEvent {
    ProximitySample(u16),
    ButtonPressed(Button),
}

/// Fake proximity sensor: a triangle wave between 0 and 1023.
struct FakeProximitySensor {
    next: AtomicU16,
}

impl FakeProximitySensor {
    fn read_sample(&self) -> Result<u16, &'static str> {
        let raw = self.next.fetch_add(97, Ordering::Relaxed) % 2046;
        Ok(if raw > 1023 { 2046 - raw } else { raw })
    }
}

/// Toggles a (simulated) LED on every press of button A.
#[derive(Default)]
struct Blinky {
    led_on: bool,
    toggles: u32,
}

impl Subscribe<SenseEvent> for Blinky {
    fn on_event(&mut self, event: SenseEvent) {
        if let SenseEvent::ButtonPressed(Button::A) = event {
            self.led_on = !self.led_on;
            self.toggles += 1;
            tracing::info!(led_on = self.led_on, toggles = self.toggles, "led toggled");
        }
    }

    fn name(&self) -> &'static str {
        "blinky"
    }
}

/// Running average of proximity samples, reported every 5 samples.
#[derive(Default)]
struct ProximityAverage {
    sum: u64,
    count: u64,
}

impl Subscribe<SenseEvent> for ProximityAverage {
    fn on_event(&mut self, event: SenseEvent) {
        let SenseEvent::ProximitySample(value) = event else {
            return;
        };
        self.sum += u64::from(value);
        self.count += 1;
        if self.count % 5 == 0 {
            tracing::info!(
                samples = self.count,
                average = self.sum / self.count,
                "proximity average"
            );
        }
    }

    fn name(&self) -> &'static str {
        "proximity-average"
    }
}

fn sampling_loop(bus: Bus<SenseEvent>, sensor: FakeProximitySensor) {
    let mut deadline = Instant::now();
    for _ in 0..SAMPLES {
        deadline += PERIOD;
        thread::sleep(deadline.saturating_duration_since(Instant::now()));

        match sensor.read_sample() {
            Ok(sample) => {
                if !bus.publish(SenseEvent::ProximitySample(sample)) {
                    tracing::warn!(sample, "proximity sample dropped");
                }
            }
            Err(err) => tracing::warn!(error = err, "failed to read proximity sensor sample"),
        }
    }
}

fn button_loop(bus: Bus<SenseEvent>) {
    for (i, button) in [Button::A, Button::B, Button::A, Button::A].into_iter().enumerate() {
        thread::sleep(PERIOD * (3 + i as u32));
        if !bus.publish(SenseEvent::ButtonPressed(button)) {
            tracing::warn!(?button, "button press dropped");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let worker = Arc::new(WorkQueue::spawn(WorkQueueConfig::default())?);
    let bus: Bus<SenseEvent> = Bus::new(
        BusConfig {
            queue_capacity: 8,
            max_subscribers: 4,
        },
        worker.clone(),
    );

    bus.try_subscribe(Blinky::default())?;
    bus.try_subscribe(ProximityAverage::default())?;
    let log = bus.try_subscribe(LogWriter::new("sense"))?;
    tracing::info!(
        subscribers = bus.subscriber_count(),
        max = bus.max_subscribers(),
        "consumers registered"
    );

    let sampler = thread::spawn({
        let bus = bus.clone();
        move || {
            sampling_loop(
                bus,
                FakeProximitySensor {
                    next: AtomicU16::new(0),
                },
            )
        }
    });
    let buttons = thread::spawn({
        let bus = bus.clone();
        move || button_loop(bus)
    });

    // Quieten the per-event log halfway through.
    thread::sleep(PERIOD * (SAMPLES / 2));
    bus.try_unsubscribe(log)?;

    for (name, handle) in [("sampler", sampler), ("buttons", buttons)] {
        if handle.join().is_err() {
            tracing::warn!(thread = name, "producer thread exited with a panic");
        }
    }
    worker.shutdown();
    Ok(())
}
