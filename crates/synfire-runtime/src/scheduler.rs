//! Real-time spike scheduler
//!
//! A rotating time-bucketed event wheel. Events are appended to the slot
//! covering their delivery time; a background tick thread takes the
//! current slot once per `dt`, hands the batch to a dispatcher thread,
//! and the dispatcher fans contiguous chunks out to the worker pool.
//! Forward spikes are delivered to registered dendrite sinks; retrograde
//! spikes apply STDP to registered synapses. With real-time
//! synchronization on, the tick thread sleeps to align simulation time
//! with the wall clock and reports drift instead of aborting.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use synfire_neural::Synapse;
use synfire_storage::ObjectId;

use crate::error::{Result, RuntimeError};
use crate::event::{ActionPotential, Event, RetrogradeActionPotential};
use crate::pool::WorkerPool;
use crate::stdp::{StdpParams, StdpStats};

/// Delivery handles kept before the oldest are joined synchronously
const MAX_DELIVERY_HANDLES: usize = 100;

/// Drift beyond which the scheduler logs a warning (ms)
const DRIFT_WARN_MS: f64 = 10.0;

/// Ticks between periodic real-time debug summaries
const SUMMARY_INTERVAL: u64 = 1000;

/// Receiver of forward spikes, keyed by dendrite id in the registry
///
/// Implementations update the downstream neuron (and may propagate its
/// firing); the scheduler only promises at-most-once delivery per event.
pub trait SpikeSink: Send + Sync {
    /// Deliver a forward spike
    fn receive_spike(&self, spike: &ActionPotential);
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of time slots in the wheel
    pub num_slots: usize,
    /// Slot width in simulation milliseconds
    pub dt_ms: f64,
    /// Worker threads (and chunks per delivery batch)
    pub delivery_threads: usize,
    /// Synchronize simulation time with the wall clock
    pub real_time: bool,
    /// STDP parameters applied on retrograde delivery
    #[serde(default)]
    pub stdp: StdpParams,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_slots: 1000,
            dt_ms: 1.0,
            delivery_threads: 4,
            real_time: true,
            stdp: StdpParams::default(),
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with validation
    pub fn new(num_slots: usize, dt_ms: f64, delivery_threads: usize) -> Result<Self> {
        if num_slots == 0 {
            return Err(RuntimeError::invalid_parameter("num_slots", "0", "> 0"));
        }
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "dt_ms",
                dt_ms.to_string(),
                "> 0.0",
            ));
        }
        if delivery_threads == 0 {
            return Err(RuntimeError::invalid_parameter(
                "delivery_threads",
                "0",
                "> 0",
            ));
        }
        Ok(Self {
            num_slots,
            dt_ms,
            delivery_threads,
            ..Default::default()
        })
    }

    /// Enable or disable real-time synchronization (builder style)
    pub fn with_real_time(mut self, real_time: bool) -> Self {
        self.real_time = real_time;
        self
    }

    /// Set the STDP parameters (builder style)
    pub fn with_stdp(mut self, stdp: StdpParams) -> Self {
        self.stdp = stdp;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Self::new(self.num_slots, self.dt_ms, self.delivery_threads)?;
        self.stdp.validate()
    }
}

/// Tick-loop timing statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimingStats {
    /// Mean tick duration (µs)
    pub avg_loop_us: f64,
    /// Worst tick duration (µs)
    pub max_loop_us: f64,
    /// Latest wall-clock drift (ms, real-time mode only)
    pub drift_ms: f64,
}

struct Wheel {
    slots: Vec<Vec<Event>>,
    current_slot: usize,
    current_time_ms: f64,
}

#[derive(Default)]
struct LoopStats {
    total_us: f64,
    max_us: f64,
    count: u64,
    drift_ms: f64,
}

struct SchedulerShared {
    num_slots: usize,
    dt_ms: f64,
    delivery_threads: usize,
    real_time: bool,
    wheel: Mutex<Wheel>,
    /// Bit-mirror of `current_time_ms` for lock-free reads
    time_bits: AtomicU64,
    running: AtomicBool,
    stop_flag: Mutex<bool>,
    stop_signal: Condvar,
    dendrites: Mutex<HashMap<ObjectId, Arc<dyn SpikeSink>>>,
    synapses: Mutex<HashMap<ObjectId, Arc<Mutex<Synapse>>>>,
    stdp: Mutex<StdpParams>,
    stdp_stats: Mutex<StdpStats>,
    stats: Mutex<LoopStats>,
    delivery_handles: Mutex<VecDeque<JoinHandle<()>>>,
    pool: WorkerPool,
}

/// Rotating time-wheel spike scheduler with asynchronous delivery
pub struct SpikeScheduler {
    shared: Arc<SchedulerShared>,
    tick_thread: Mutex<Option<JoinHandle<()>>>,
}

impl SpikeScheduler {
    /// Create a scheduler from a validated configuration
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(SchedulerShared {
            num_slots: config.num_slots,
            dt_ms: config.dt_ms,
            delivery_threads: config.delivery_threads,
            real_time: config.real_time,
            wheel: Mutex::new(Wheel {
                slots: vec![Vec::new(); config.num_slots],
                current_slot: 0,
                current_time_ms: 0.0,
            }),
            time_bits: AtomicU64::new(0f64.to_bits()),
            running: AtomicBool::new(false),
            stop_flag: Mutex::new(false),
            stop_signal: Condvar::new(),
            dendrites: Mutex::new(HashMap::new()),
            synapses: Mutex::new(HashMap::new()),
            stdp: Mutex::new(config.stdp),
            stdp_stats: Mutex::new(StdpStats::default()),
            stats: Mutex::new(LoopStats::default()),
            delivery_handles: Mutex::new(VecDeque::new()),
            pool: WorkerPool::new(config.delivery_threads),
        });

        log::info!(
            "SpikeScheduler created: {} time slots, {} delivery threads, real-time sync: {}",
            config.num_slots,
            config.delivery_threads,
            config.real_time
        );

        Ok(Self {
            shared,
            tick_thread: Mutex::new(None),
        })
    }

    /// Current simulation time in milliseconds (lock-free)
    pub fn current_time_ms(&self) -> f64 {
        f64::from_bits(self.shared.time_bits.load(Ordering::Acquire))
    }

    /// Slot width in simulation milliseconds
    pub fn dt_ms(&self) -> f64 {
        self.shared.dt_ms
    }

    /// Number of slots in the wheel
    pub fn num_slots(&self) -> usize {
        self.shared.num_slots
    }

    /// Whether the tick thread is running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Schedule a forward spike for future delivery
    ///
    /// Fails with [`RuntimeError::OutOfWindow`] when the event time is in
    /// the past or at/after `current_time + num_slots * dt`. Scheduling
    /// is permitted in any lifecycle state.
    pub fn schedule_spike(&self, spike: ActionPotential) -> Result<()> {
        self.schedule_event(spike.scheduled_time_ms, Event::Forward(spike))
    }

    /// Schedule a retrograde spike for future delivery
    pub fn schedule_retrograde_spike(&self, spike: RetrogradeActionPotential) -> Result<()> {
        self.schedule_event(spike.scheduled_time_ms, Event::Retrograde(spike))
    }

    fn schedule_event(&self, time_ms: f64, event: Event) -> Result<()> {
        let mut wheel = self.shared.wheel.lock();
        let current = wheel.current_time_ms;
        let horizon = current + self.shared.num_slots as f64 * self.shared.dt_ms;

        if time_ms < current {
            log::warn!(
                "Spike scheduled for time {:.3}ms is out of range (current: {:.3}ms, max: {:.3}ms)",
                time_ms,
                current,
                horizon
            );
            return Err(RuntimeError::OutOfWindow {
                time_ms,
                current_ms: current,
                horizon_ms: horizon,
            });
        }

        let relative_slot = ((time_ms - current) / self.shared.dt_ms) as usize;
        if relative_slot >= self.shared.num_slots {
            log::warn!(
                "Spike scheduled for time {:.3}ms is out of range (current: {:.3}ms, max: {:.3}ms)",
                time_ms,
                current,
                horizon
            );
            return Err(RuntimeError::OutOfWindow {
                time_ms,
                current_ms: current,
                horizon_ms: horizon,
            });
        }

        let slot = (wheel.current_slot + relative_slot) % self.shared.num_slots;
        let event_type = event.event_type();
        wheel.slots[slot].push(event);
        log::trace!("Scheduled {} for {:.3}ms (slot {})", event_type, time_ms, slot);
        Ok(())
    }

    /// Register a dendrite sink for forward spike delivery
    pub fn register_dendrite(&self, dendrite_id: ObjectId, sink: Arc<dyn SpikeSink>) {
        let mut registry = self.shared.dendrites.lock();
        registry.insert(dendrite_id, sink);
        log::debug!(
            "Registered dendrite {} (total: {})",
            dendrite_id,
            registry.len()
        );
    }

    /// Remove a dendrite sink, reporting whether it was registered
    pub fn unregister_dendrite(&self, dendrite_id: ObjectId) -> bool {
        let mut registry = self.shared.dendrites.lock();
        if registry.remove(&dendrite_id).is_some() {
            log::debug!(
                "Unregistered dendrite {} (remaining: {})",
                dendrite_id,
                registry.len()
            );
            true
        } else {
            log::warn!("Dendrite {} not found for unregistration", dendrite_id);
            false
        }
    }

    /// Register a synapse for retrograde STDP delivery
    pub fn register_synapse(&self, synapse: Arc<Mutex<Synapse>>) {
        let id = synapse.lock().id();
        let mut registry = self.shared.synapses.lock();
        registry.insert(id, synapse);
        log::debug!("Registered synapse {} (total: {})", id, registry.len());
    }

    /// Remove a synapse, reporting whether it was registered
    pub fn unregister_synapse(&self, synapse_id: ObjectId) -> bool {
        self.shared.synapses.lock().remove(&synapse_id).is_some()
    }

    /// Total events waiting across all slots
    pub fn pending_spike_count(&self) -> usize {
        let wheel = self.shared.wheel.lock();
        wheel.slots.iter().map(Vec::len).sum()
    }

    /// Events waiting in one slot (0 for an out-of-range index)
    pub fn pending_in_slot(&self, slot_index: usize) -> usize {
        if slot_index >= self.shared.num_slots {
            return 0;
        }
        self.shared.wheel.lock().slots[slot_index].len()
    }

    /// Number of in-flight delivery dispatcher threads
    pub fn active_delivery_threads(&self) -> usize {
        self.shared.delivery_handles.lock().len()
    }

    /// Tick-loop timing statistics
    pub fn timing_stats(&self) -> TimingStats {
        let stats = self.shared.stats.lock();
        TimingStats {
            avg_loop_us: if stats.count > 0 {
                stats.total_us / stats.count as f64
            } else {
                0.0
            },
            max_loop_us: stats.max_us,
            drift_ms: stats.drift_ms,
        }
    }

    /// Replace the STDP parameters at runtime
    pub fn set_stdp_params(&self, params: StdpParams) -> Result<()> {
        params.validate()?;
        *self.shared.stdp.lock() = params;
        log::info!(
            "Updated STDP parameters (A+={}, A-={}, tau+={}, tau-={})",
            params.a_plus,
            params.a_minus,
            params.tau_plus,
            params.tau_minus
        );
        Ok(())
    }

    /// Current STDP parameters
    pub fn stdp_params(&self) -> StdpParams {
        *self.shared.stdp.lock()
    }

    /// Totals of applied STDP updates
    pub fn stdp_stats(&self) -> StdpStats {
        *self.shared.stdp_stats.lock()
    }

    /// Reset the STDP update totals
    pub fn reset_stdp_stats(&self) {
        self.shared.stdp_stats.lock().reset();
    }

    /// Start the background tick thread
    ///
    /// A second call while running is a no-op with a warning.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            log::warn!("SpikeScheduler already running");
            return;
        }

        *self.shared.stop_flag.lock() = false;
        *self.shared.stats.lock() = LoopStats::default();

        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("synfire-tick".to_string())
            .spawn(move || tick_loop(shared));
        match handle {
            Ok(handle) => {
                *self.tick_thread.lock() = Some(handle);
                log::info!("SpikeScheduler started (real-time sync: {})", self.shared.real_time);
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                log::error!("SpikeScheduler failed to start tick thread: {}", err);
            }
        }
    }

    /// Stop the tick thread, join delivery threads, and clear the wheel
    pub fn stop(&self) {
        if !self.shared.running.load(Ordering::Acquire) {
            return;
        }
        log::info!("SpikeScheduler stopping...");

        {
            let mut stop = self.shared.stop_flag.lock();
            *stop = true;
        }
        self.shared.stop_signal.notify_all();

        if let Some(handle) = self.tick_thread.lock().take() {
            let _ = handle.join();
        }

        let handles: Vec<JoinHandle<()>> = {
            let mut registry = self.shared.delivery_handles.lock();
            log::info!("Joining {} active delivery threads...", registry.len());
            registry.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }

        {
            let mut wheel = self.shared.wheel.lock();
            for slot in &mut wheel.slots {
                slot.clear();
            }
        }

        self.shared.running.store(false, Ordering::Release);
        log::info!(
            "SpikeScheduler stopped. Final time: {:.3}ms",
            self.current_time_ms()
        );
    }
}

impl Drop for SpikeScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SpikeScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpikeScheduler")
            .field("num_slots", &self.shared.num_slots)
            .field("dt_ms", &self.shared.dt_ms)
            .field("running", &self.is_running())
            .field("current_time_ms", &self.current_time_ms())
            .finish()
    }
}

fn tick_loop(shared: Arc<SchedulerShared>) {
    log::info!("SpikeScheduler: processing loop started");
    let start_wall = Instant::now();

    loop {
        if *shared.stop_flag.lock() {
            break;
        }
        let iteration_start = Instant::now();

        reap_delivery_threads(&shared);

        // Take the current slot and advance time
        let (events, slot_time_ms) = {
            let mut wheel = shared.wheel.lock();
            let slot = wheel.current_slot;
            let events = std::mem::take(&mut wheel.slots[slot]);
            let slot_time = wheel.current_time_ms;
            wheel.current_time_ms += shared.dt_ms;
            wheel.current_slot = (slot + 1) % shared.num_slots;
            shared
                .time_bits
                .store(wheel.current_time_ms.to_bits(), Ordering::Release);
            (events, slot_time)
        };

        if !events.is_empty() {
            dispatch_slot(&shared, events, slot_time_ms);
        }

        let iteration_us = iteration_start.elapsed().as_secs_f64() * 1e6;
        let tick_count = {
            let mut stats = shared.stats.lock();
            stats.total_us += iteration_us;
            stats.max_us = stats.max_us.max(iteration_us);
            stats.count += 1;
            stats.count
        };

        if shared.real_time {
            sync_to_wall_clock(&shared, start_wall, tick_count);
        } else if iteration_us < 10.0 {
            // Fast mode: tiny yield so an idle wheel does not spin a core
            std::thread::sleep(Duration::from_micros(10));
        }
    }

    let final_time = f64::from_bits(shared.time_bits.load(Ordering::Acquire));
    log::info!(
        "SpikeScheduler: processing loop ended at simulation time {:.3}ms",
        final_time
    );
    let stats = shared.stats.lock();
    if stats.count > 0 {
        log::info!(
            "SpikeScheduler: final stats - avg loop: {:.1}us, max loop: {:.1}us, drift: {:.2}ms",
            stats.total_us / stats.count as f64,
            stats.max_us,
            stats.drift_ms
        );
    }
}

/// Sleep or warn to keep simulation time aligned with the wall clock
fn sync_to_wall_clock(shared: &Arc<SchedulerShared>, start_wall: Instant, tick_count: u64) {
    let sim_time_ms = f64::from_bits(shared.time_bits.load(Ordering::Acquire));
    let expected = start_wall + Duration::from_secs_f64(sim_time_ms / 1000.0);
    let now = Instant::now();

    let drift_ms = if now >= expected {
        (now - expected).as_secs_f64() * 1000.0
    } else {
        -((expected - now).as_secs_f64() * 1000.0)
    };
    shared.stats.lock().drift_ms = drift_ms;

    if drift_ms < 0.0 {
        // Ahead of schedule: sleep off the surplus, waking early on stop
        let mut stop = shared.stop_flag.lock();
        if !*stop {
            shared
                .stop_signal
                .wait_for(&mut stop, Duration::from_secs_f64(-drift_ms / 1000.0));
        }
    } else if drift_ms > DRIFT_WARN_MS {
        let active = shared.delivery_handles.lock().len();
        log::warn!(
            "SpikeScheduler: falling behind real-time by {:.2}ms at simulation time {:.1}ms ({} active delivery threads)",
            drift_ms,
            sim_time_ms,
            active
        );
    }

    if tick_count % SUMMARY_INTERVAL == 0 {
        let stats = shared.stats.lock();
        log::debug!(
            "SpikeScheduler: sim time: {:.1}ms, avg loop: {:.1}us, max loop: {:.1}us, drift: {:.2}ms",
            sim_time_ms,
            stats.total_us / stats.count.max(1) as f64,
            stats.max_us,
            stats.drift_ms
        );
    }
}

/// Join finished dispatcher threads and bound the in-flight set
fn reap_delivery_threads(shared: &Arc<SchedulerShared>) {
    let mut to_join = Vec::new();
    {
        let mut handles = shared.delivery_handles.lock();
        let mut index = 0;
        while index < handles.len() {
            if handles[index].is_finished() {
                if let Some(handle) = handles.remove(index) {
                    to_join.push(handle);
                }
            } else {
                index += 1;
            }
        }
        // Past the ceiling the oldest are joined synchronously, bounding
        // memory and the process thread count
        while handles.len() > MAX_DELIVERY_HANDLES {
            if let Some(handle) = handles.pop_front() {
                to_join.push(handle);
            }
        }
    }
    for handle in to_join {
        let _ = handle.join();
    }
}

/// Hand a slot's batch to a fresh dispatcher thread
///
/// The dispatcher, not the tick thread, blocks on the worker pool, so a
/// saturated pool never stalls the clock.
fn dispatch_slot(shared: &Arc<SchedulerShared>, events: Vec<Event>, slot_time_ms: f64) {
    log::trace!(
        "SpikeScheduler: async delivering {} events at time {:.3}ms",
        events.len(),
        slot_time_ms
    );

    let dispatcher_shared = Arc::clone(shared);
    let spawned = std::thread::Builder::new()
        .name("synfire-dispatch".to_string())
        .spawn(move || {
            let chunk_size =
                (events.len() + dispatcher_shared.delivery_threads - 1)
                    / dispatcher_shared.delivery_threads;
            let mut waits = Vec::new();
            let mut remaining = events;
            while !remaining.is_empty() {
                let take = chunk_size.min(remaining.len());
                let chunk: Vec<Event> = remaining.drain(..take).collect();
                let chunk_shared = Arc::clone(&dispatcher_shared);
                match dispatcher_shared
                    .pool
                    .enqueue(move || deliver_chunk(&chunk_shared, &chunk))
                {
                    Ok(handle) => waits.push(handle),
                    Err(err) => log::error!("SpikeScheduler: delivery enqueue failed: {}", err),
                }
            }
            for handle in waits {
                if let Err(err) = handle.wait() {
                    log::error!("SpikeScheduler: delivery chunk failed: {}", err);
                }
            }
            log::trace!(
                "SpikeScheduler: completed async delivery for time {:.3}ms",
                slot_time_ms
            );
        });

    match spawned {
        Ok(handle) => shared.delivery_handles.lock().push_back(handle),
        Err(err) => log::error!("SpikeScheduler: failed to spawn dispatcher: {}", err),
    }
}

/// Deliver a contiguous chunk of a slot batch
fn deliver_chunk(shared: &Arc<SchedulerShared>, events: &[Event]) {
    for event in events {
        match event {
            Event::Forward(spike) => {
                let sink = {
                    let registry = shared.dendrites.lock();
                    registry.get(&spike.dendrite_id).cloned()
                };
                match sink {
                    Some(sink) => sink.receive_spike(spike),
                    None => log::warn!(
                        "SpikeScheduler: dendrite {} not found for spike delivery",
                        spike.dendrite_id
                    ),
                }
            }
            Event::Retrograde(spike) => {
                let synapse = {
                    let registry = shared.synapses.lock();
                    registry.get(&spike.synapse_id).cloned()
                };
                match synapse {
                    Some(synapse) => apply_stdp(shared, &synapse, spike),
                    None => log::warn!(
                        "SpikeScheduler: synapse {} not found for retrograde spike delivery",
                        spike.synapse_id
                    ),
                }
            }
        }
    }
}

/// Apply the STDP rule to one synapse for one retrograde event
fn apply_stdp(
    shared: &Arc<SchedulerShared>,
    synapse: &Arc<Mutex<Synapse>>,
    spike: &RetrogradeActionPotential,
) {
    let params = *shared.stdp.lock();
    let delta = params.weight_change(spike.temporal_offset_ms);
    if delta == 0.0 {
        return;
    }

    // Weight read-modify-write under the synapse's own lock: concurrent
    // retrograde events compose and intermediate weights stay private
    let (old_weight, new_weight, synapse_id) = {
        let mut synapse = synapse.lock();
        let old = synapse.weight();
        synapse.set_weight(old + delta);
        (old, synapse.weight(), synapse.id())
    };
    shared.stdp_stats.lock().record(delta);

    log::trace!(
        "STDP update for synapse {}: offset={:.3}ms, dw={:.6}, weight: {:.4} -> {:.4}",
        synapse_id,
        spike.temporal_offset_ms,
        delta,
        old_weight,
        new_weight
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(num_slots: usize) -> SchedulerConfig {
        SchedulerConfig::new(num_slots, 1.0, 2)
            .unwrap()
            .with_real_time(false)
    }

    #[test]
    fn test_config_validation() {
        assert!(SchedulerConfig::new(0, 1.0, 2).is_err());
        assert!(SchedulerConfig::new(100, 0.0, 2).is_err());
        assert!(SchedulerConfig::new(100, 1.0, 0).is_err());
        assert!(SchedulerConfig::new(100, 1.0, 2).is_ok());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = SchedulerConfig::new(500, 0.5, 8)
            .unwrap()
            .with_real_time(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: SchedulerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.num_slots, 500);
        assert_eq!(back.dt_ms, 0.5);
        assert!(back.real_time);
        assert_eq!(back.stdp, config.stdp);

        // stdp falls back to defaults when omitted
        let sparse: SchedulerConfig = serde_json::from_str(
            "{\"num_slots\":10,\"dt_ms\":1.0,\"delivery_threads\":2,\"real_time\":false}",
        )
        .unwrap();
        assert_eq!(sparse.stdp, StdpParams::default());
    }

    #[test]
    fn test_schedule_in_window() {
        let scheduler = SpikeScheduler::new(fast_config(100)).unwrap();
        let dendrite = ObjectId::new(300_000_000_000_000);

        // time == current_time lands in the current slot
        scheduler
            .schedule_spike(ActionPotential::new(0.0, dendrite, 0.5))
            .unwrap();
        assert_eq!(scheduler.pending_in_slot(0), 1);

        scheduler
            .schedule_spike(ActionPotential::new(99.0, dendrite, 0.5))
            .unwrap();
        assert_eq!(scheduler.pending_spike_count(), 2);
    }

    #[test]
    fn test_schedule_out_of_window() {
        let scheduler = SpikeScheduler::new(fast_config(100)).unwrap();
        let dendrite = ObjectId::new(300_000_000_000_000);

        // One past the end of the wheel
        let result = scheduler.schedule_spike(ActionPotential::new(100.0, dendrite, 0.5));
        assert!(matches!(result, Err(RuntimeError::OutOfWindow { .. })));

        // The past
        let result = scheduler.schedule_spike(ActionPotential::new(-1.0, dendrite, 0.5));
        assert!(matches!(result, Err(RuntimeError::OutOfWindow { .. })));

        assert_eq!(scheduler.pending_spike_count(), 0);
    }

    #[test]
    fn test_pending_in_slot_bounds() {
        let scheduler = SpikeScheduler::new(fast_config(10)).unwrap();
        assert_eq!(scheduler.pending_in_slot(99), 0);
    }

    #[test]
    fn test_stdp_params_update() {
        let scheduler = SpikeScheduler::new(fast_config(10)).unwrap();
        let params = StdpParams::new(0.02, 0.03, 15.0, 25.0).unwrap();
        scheduler.set_stdp_params(params).unwrap();
        assert_eq!(scheduler.stdp_params(), params);

        let bad = StdpParams {
            a_plus: -1.0,
            ..StdpParams::default()
        };
        assert!(scheduler.set_stdp_params(bad).is_err());
    }

    #[test]
    fn test_lifecycle_idle_running_idle() {
        let scheduler = SpikeScheduler::new(fast_config(50)).unwrap();
        assert!(!scheduler.is_running());
        scheduler.start();
        assert!(scheduler.is_running());
        // Double start warns and keeps running
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop();
        assert!(!scheduler.is_running());
        // Scheduling while stopped stays permitted
        let dendrite = ObjectId::new(300_000_000_000_000);
        let time = scheduler.current_time_ms();
        assert!(scheduler
            .schedule_spike(ActionPotential::new(time + 1.0, dendrite, 0.1))
            .is_ok());
    }

    #[test]
    fn test_unregister_unknown_dendrite() {
        let scheduler = SpikeScheduler::new(fast_config(10)).unwrap();
        assert!(!scheduler.unregister_dendrite(ObjectId::new(300_000_000_000_001)));
    }
}
