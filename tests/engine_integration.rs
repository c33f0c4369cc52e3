//! Integration tests: engine pipeline through mock ports.

use std::collections::VecDeque;

use theremineye::broadcast::{Broadcaster, GazeFrame};
use theremineye::config::SystemConfig;
use theremineye::engine::events::{EngineEvent, EngineSample};
use theremineye::engine::ports::{ActuatorPort, EventSink, SensorPort};
use theremineye::engine::ThereminEngine;

// ── Mock implementations ──────────────────────────────────────

struct MockHw {
    counts: VecDeque<i32>,
    duty_writes: Vec<u8>,
}

impl MockHw {
    fn new() -> Self {
        Self {
            counts: VecDeque::new(),
            duty_writes: Vec::new(),
        }
    }

    fn feed(&mut self, count: i32, times: usize) {
        for _ in 0..times {
            self.counts.push_back(count);
        }
    }
}

impl SensorPort for MockHw {
    fn take_sample(&mut self) -> Option<i32> {
        self.counts.pop_front()
    }
}

impl ActuatorPort for MockHw {
    fn set_duty(&mut self, duty: u8) {
        self.duty_writes.push(duty);
    }
}

#[derive(Default)]
struct RecordingSink {
    baseline_commits: Vec<f32>,
    recalibrations: Vec<f32>,
    jitter_flips: Vec<bool>,
    samples: Vec<EngineSample>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::BaselineInitialized { freq } => self.baseline_commits.push(*freq),
            EngineEvent::Recalibrated { freq } => self.recalibrations.push(*freq),
            EngineEvent::JitterChanged { active } => self.jitter_flips.push(*active),
            EngineEvent::Telemetry(s) => self.samples.push(*s),
        }
    }
}

/// Drain every queued count, advancing time by one sampling period each.
/// 21 ms instead of the nominal 20 keeps each tick past the jitter
/// detector's `> interval` gate, as real (jittery) tick timing does.
fn run_all(
    engine: &mut ThereminEngine,
    hw: &mut MockHw,
    sink: &mut RecordingSink,
    t: &mut u32,
) -> usize {
    let mut processed = 0;
    while !hw.counts.is_empty() {
        *t += 21;
        if engine.process(*t, hw, sink) {
            processed += 1;
        }
    }
    processed
}

fn settled_engine(t: &mut u32) -> (ThereminEngine, MockHw, RecordingSink) {
    let mut engine = ThereminEngine::new(SystemConfig::default());
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::default();
    hw.feed(1050, 12);
    run_all(&mut engine, &mut hw, &mut sink, t);
    assert!(engine.baseline_set());
    (engine, hw, sink)
}

// ── Sampler contract ──────────────────────────────────────────

#[test]
fn missing_sample_is_a_graceful_noop() {
    let mut engine = ThereminEngine::new(SystemConfig::default());
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::default();
    for t in [20, 40, 60] {
        assert!(!engine.process(t, &mut hw, &mut sink));
    }
    assert!(hw.duty_writes.is_empty());
    assert!(sink.samples.is_empty());
}

// ── Baseline initialization ───────────────────────────────────

#[test]
fn constant_input_commits_baseline_at_sample_ten() {
    let mut engine = ThereminEngine::new(SystemConfig::default());
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::default();
    let mut t = 0;

    hw.feed(1050, 9);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert!(!engine.baseline_set(), "nine settled samples are not enough");

    hw.feed(1050, 1);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert!(engine.baseline_set(), "tenth settled sample commits");
    assert_eq!(sink.baseline_commits.len(), 1);
    assert!((engine.smoothed_base_freq() - 1050.0).abs() < 1e-3);
    assert!((engine.smoothed_freq() - 1050.0).abs() < 1e-3);

    // Steady at the baseline: outputs idle.
    hw.feed(1050, 2);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert_eq!(engine.duty(), 0);
    assert_eq!(engine.looking(), 0);
    assert_eq!(engine.direction(), 0);
}

#[test]
fn implausible_startup_frequencies_never_commit() {
    let mut engine = ThereminEngine::new(SystemConfig::default());
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::default();
    let mut t = 0;
    hw.feed(400, 50); // below the 1000 Hz plausibility floor
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert!(!engine.baseline_set());
    assert_eq!(engine.duty(), 0);
}

#[test]
fn drifting_startup_reseeds_instead_of_committing() {
    let mut engine = ThereminEngine::new(SystemConfig::default());
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::default();
    let mut t = 0;
    // Alternate between two anchors more than 5 Hz apart; raw alternation
    // keeps the smoothed value moving enough to keep re-seeding.
    for _ in 0..12 {
        hw.feed(1050, 4);
        hw.feed(1100, 4);
    }
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert!(
        !engine.baseline_set(),
        "settle window requires 10 consecutive in-band samples"
    );
}

#[test]
fn outputs_stay_idle_before_commit() {
    let mut engine = ThereminEngine::new(SystemConfig::default());
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::default();
    let mut t = 0;
    hw.feed(1050, 5);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert!(!engine.baseline_set());
    assert!(hw.duty_writes.is_empty(), "no duty writes before the baseline");
    for s in &sink.samples {
        assert_eq!(s.duty, 0);
        assert_eq!(s.looking, 0);
        assert_eq!(s.direction, 0);
    }
}

// ── Gaze response ─────────────────────────────────────────────

#[test]
fn sustained_drop_drives_gaze_and_duty_then_recovers() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);

    // Hand approaches: oscillator pulled down 10 Hz, inside the 4–12 map.
    hw.feed(1040, 60);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert_eq!(engine.direction(), -1, "frequency drop reads as −1");
    assert!(engine.duty() > 100, "duty tracks the deviation");
    assert!(engine.looking() >= 4, "gaze deflects");
    assert!(engine.delta() > 4.0);

    // Hand leaves: signal returns to the baseline and re-settles.
    hw.feed(1050, 200);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert_eq!(engine.duty(), 0, "duty returns to idle");
    assert_eq!(engine.looking(), 0, "gaze returns to rest");
    assert_eq!(engine.direction(), 0);
}

#[test]
fn extreme_deviation_saturates_both_outputs() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);
    hw.feed(1010, 60); // 40 Hz below baseline, far past delta_f_max
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert_eq!(engine.duty(), 255);
    // The public reading truncates the smoothed index, so a saturated
    // gaze settles at 7 while the EMA closes the last fraction toward 8.
    assert!(engine.looking() >= 7);
    assert_eq!(engine.sample().looking, 8, "raw mapped index saturates");
}

#[test]
fn rise_above_baseline_reads_as_positive_direction() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);
    hw.feed(1060, 40);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert_eq!(engine.direction(), 1);
}

// ── Manual recalibration ──────────────────────────────────────

#[test]
fn recalibrate_snaps_baseline_and_is_idempotent() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);

    // Deviate, then recalibrate mid-gesture.
    hw.feed(1040, 40);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert!(engine.delta() > 4.0);

    engine.recalibrate(&mut sink);
    engine.recalibrate(&mut sink); // repeated press — same result
    assert_eq!(sink.recalibrations.len(), 2);
    let f = engine.smoothed_freq();
    assert!((engine.smoothed_base_freq() - f).abs() < 1e-3);

    // The held position is the new rest: outputs decay to idle.
    hw.feed(1040, 120);
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert_eq!(engine.duty(), 0);
    assert_eq!(engine.direction(), 0);
}

// ── Environment jitter ────────────────────────────────────────

#[test]
fn sign_oscillation_raises_jitter_and_telemetry_carries_counters() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);

    // ±3 Hz alternation around the baseline: small, sign-flipping rates.
    for _ in 0..30 {
        hw.feed(1053, 1);
        hw.feed(1047, 1);
    }
    run_all(&mut engine, &mut hw, &mut sink, &mut t);

    assert!(
        sink.jitter_flips.contains(&true),
        "alternating rates must raise the jitter flag at least once"
    );
    let jittery = sink.samples.iter().filter(|s| s.env_jitter).count();
    assert!(jittery > 0);
    // Hysteresis counters are observable in telemetry.
    assert!(sink.samples.iter().any(|s| s.env_stable_counter > 0));
}

#[test]
fn directed_sweep_does_not_read_as_jitter() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);
    sink.samples.clear();

    // Fast monotonic sweep: large same-signed rates.
    for step in 0..25 {
        hw.feed(1050 - step * 20, 1);
    }
    run_all(&mut engine, &mut hw, &mut sink, &mut t);
    assert!(
        sink.samples.iter().all(|s| !s.env_jitter),
        "a directed sweep must never classify as ambient jitter"
    );
}

// ── Baseline maintenance over time ────────────────────────────

#[test]
fn blender_reconverges_baseline_after_sustained_shift() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);

    // The ambient baseline drifts up 6 Hz and stays there for a long time
    // (temperature drift): the adaptive blender must absorb it.
    for _ in 0..40 {
        hw.feed(1056, 50);
        run_all(&mut engine, &mut hw, &mut sink, &mut t);
    }
    assert!(
        (engine.smoothed_base_freq() - 1056.0).abs() < 2.0,
        "long-run baseline follows the sustained shift, got {}",
        engine.smoothed_base_freq()
    );
    assert_eq!(engine.duty(), 0, "a fully absorbed shift is the new rest");
}

// ── Broadcast policy against engine output ────────────────────

#[test]
fn broadcast_policy_dedupes_steady_engine_output() {
    let mut t = 0;
    let (mut engine, mut hw, mut sink) = settled_engine(&mut t);
    let mut policy = Broadcaster::new(10);
    let mut sent = 0;

    hw.feed(1050, 50);
    while !hw.counts.is_empty() {
        t += 21;
        if engine.process(t, &mut hw, &mut sink) {
            let frame = GazeFrame {
                looking: engine.looking(),
                duty: engine.duty(),
                direction: engine.direction(),
            };
            if policy.should_send(frame, t) {
                sent += 1;
            }
        }
    }
    assert_eq!(sent, 1, "steady output collapses to a single transmission");
}
