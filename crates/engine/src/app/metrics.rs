use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::ecs::FlushStats;

/// Simulation counters for one reporting window of the tick loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimMetrics {
    pub total_ticks: u64,
    pub tps: f32,
    pub tick_time_ms: f32,
    pub live_entities: usize,
    /// Buffered entities admitted by registry flushes during the window.
    pub admitted: usize,
    /// Deactivated entities swept by registry flushes during the window.
    pub swept: usize,
    pub systems_per_tick: f32,
    /// Ticks that ran no system, i.e. the scene was paused.
    pub idle_ticks: u32,
}

/// Latest published [`SimMetrics`], shared with whoever wants to read them.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<Mutex<SimMetrics>>,
}

impl MetricsHandle {
    pub fn latest(&self) -> SimMetrics {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, metrics: SimMetrics) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = metrics;
    }
}

/// What one tick did, as seen by the loop.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TickSample {
    pub(crate) busy: Duration,
    pub(crate) flush: FlushStats,
    pub(crate) systems_run: usize,
}

#[derive(Debug)]
pub(crate) struct TickWindow {
    opened_at: Instant,
    length: Duration,
    total_ticks: u64,
    ticks: u32,
    idle_ticks: u32,
    busy: Duration,
    admitted: usize,
    swept: usize,
    systems_run: usize,
}

impl TickWindow {
    pub(crate) fn open(length: Duration, now: Instant) -> Self {
        Self {
            opened_at: now,
            length,
            total_ticks: 0,
            ticks: 0,
            idle_ticks: 0,
            busy: Duration::ZERO,
            admitted: 0,
            swept: 0,
            systems_run: 0,
        }
    }

    pub(crate) fn record(&mut self, sample: TickSample) {
        self.total_ticks += 1;
        self.ticks += 1;
        if sample.systems_run == 0 {
            self.idle_ticks += 1;
        }
        self.busy += sample.busy;
        self.admitted += sample.flush.admitted;
        self.swept += sample.flush.removed;
        self.systems_run += sample.systems_run;
    }

    pub(crate) fn close_if_due(&mut self, now: Instant, live_entities: usize) -> Option<SimMetrics> {
        if now.saturating_duration_since(self.opened_at) < self.length {
            return None;
        }
        Some(self.close(now, live_entities))
    }

    /// Closes the window however far it got and opens the next one at `now`.
    pub(crate) fn close(&mut self, now: Instant, live_entities: usize) -> SimMetrics {
        let seconds = now
            .saturating_duration_since(self.opened_at)
            .as_secs_f32()
            .max(f32::EPSILON);
        let ticks = self.ticks.max(1) as f32;
        let metrics = SimMetrics {
            total_ticks: self.total_ticks,
            tps: self.ticks as f32 / seconds,
            tick_time_ms: self.busy.as_secs_f32() * 1000.0 / ticks,
            live_entities,
            admitted: self.admitted,
            swept: self.swept,
            systems_per_tick: self.systems_run as f32 / ticks,
            idle_ticks: self.idle_ticks,
        };

        *self = Self {
            total_ticks: self.total_ticks,
            ..Self::open(self.length, now)
        };
        metrics
    }
}
