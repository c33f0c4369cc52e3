//! The signal engine — orchestrates the full per-period pipeline.
//!
//! ```text
//!  SensorPort ──▶ ┌───────────────────────────────┐ ──▶ EventSink
//!                 │        ThereminEngine          │
//! ActuatorPort ◀──│  filter · baseline · jitter    │
//!                 │  stability · mapping           │
//!                 └───────────────────────────────┘
//! ```
//!
//! [`process`](ThereminEngine::process) runs once per polling-loop
//! iteration: synchronous, non-blocking, bounded-time, no allocation.
//! When no sample is pending it returns immediately.  All state is owned
//! here; ports are injected at the call site, so the engine is fully
//! testable with mock adapters.

use log::info;

use crate::config::SystemConfig;
use crate::control::baseline::{
    AdaptiveBaselineBlender, BaselineInitializer, BlendDiagnostics, StaticBaselineAdjuster,
};
use crate::control::filter::{map_duty, map_looking, DeltaFilter, FreqFilter};
use crate::control::jitter::EnvJitterDetector;
use crate::control::stability::StabilityJudge;

use super::events::{EngineEvent, EngineSample};
use super::ports::{ActuatorPort, EventSink, SensorPort};
use super::state::{EnvironmentState, EyeState, FrequencyState, InitState, StaticAdjustState};

/// Converts the sampled antenna frequency into the PWM duty and gaze index.
pub struct ThereminEngine {
    cfg: SystemConfig,

    // Components (coefficients fixed at construction)
    freq_filter: FreqFilter,
    delta_filter: DeltaFilter,
    initializer: BaselineInitializer,
    stability: StabilityJudge,
    jitter: EnvJitterDetector,
    static_adjuster: StaticBaselineAdjuster,
    blender: AdaptiveBaselineBlender,

    // State
    freq: FrequencyState,
    eye: EyeState,
    env: EnvironmentState,
    static_state: StaticAdjustState,
    init: InitState,

    /// Unsmoothed deviation magnitude from the current period.
    delta: f32,
    /// Last commanded duty.
    duty: u8,
    /// Last raw sample, kept for telemetry.
    last_raw: f32,
    /// Blender diagnostics from the current period.
    blend: BlendDiagnostics,
}

impl ThereminEngine {
    pub fn new(cfg: SystemConfig) -> Self {
        Self {
            freq_filter: FreqFilter::from_config(&cfg),
            delta_filter: DeltaFilter::from_config(&cfg),
            initializer: BaselineInitializer::from_config(&cfg),
            stability: StabilityJudge::from_config(&cfg),
            jitter: EnvJitterDetector::from_config(&cfg),
            static_adjuster: StaticBaselineAdjuster::from_config(&cfg),
            blender: AdaptiveBaselineBlender::from_config(&cfg),
            cfg,
            freq: FrequencyState::default(),
            eye: EyeState::default(),
            env: EnvironmentState::default(),
            static_state: StaticAdjustState::default(),
            init: InitState::default(),
            delta: 0.0,
            duty: 0,
            last_raw: 0.0,
            blend: BlendDiagnostics::default(),
        }
    }

    // ── Per-period orchestration ──────────────────────────────

    /// Run one full engine cycle: take sample → filter → baseline →
    /// classify → map outputs.
    ///
    /// Returns `false` without touching any output when no sample was
    /// pending this iteration.  The `hw` parameter satisfies **both**
    /// [`SensorPort`] and [`ActuatorPort`] — this avoids a double mutable
    /// borrow while keeping the port boundary explicit.
    pub fn process(
        &mut self,
        now_ms: u32,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(count) = hw.take_sample() else {
            return false;
        };
        let current = count as f32;
        self.last_raw = current;

        // ── Frequency filtering ───────────────────────────────
        if self.freq.primed {
            self.freq.smoothed_freq = self.freq_filter.apply(current, self.freq.smoothed_freq);
        } else {
            // Seed with the first real sample; decaying up from zero would
            // poison the settle detection below.
            self.freq.smoothed_freq = current;
            self.freq.primed = true;
        }
        self.freq.delta_rate = current - self.freq.last_raw_freq;
        self.freq.last_raw_freq = current;

        // ── Baseline initialization ───────────────────────────
        if !self.freq.baseline_set {
            if self
                .initializer
                .update(self.freq.smoothed_freq, &mut self.init, &mut self.freq)
            {
                info!("baseline set to {:.1}", self.freq.smoothed_freq);
                sink.emit(&EngineEvent::BaselineInitialized {
                    freq: self.freq.smoothed_freq,
                });
            } else {
                // Deltas against an unset baseline are meaningless: hold
                // the outputs at their idle zeros until the commit.
                sink.emit(&EngineEvent::Telemetry(self.sample()));
                return true;
            }
        }

        // ── Delta & direction ─────────────────────────────────
        let delta_raw = self.freq.frozen_base_freq - self.freq.smoothed_freq;
        self.eye.direction = if delta_raw > self.cfg.direction_threshold {
            -1
        } else if delta_raw < -self.cfg.direction_threshold {
            1
        } else {
            0
        };
        self.delta = delta_raw.abs();

        // ── Delta filtering ───────────────────────────────────
        self.freq.last_smoothed_delta = self
            .delta_filter
            .apply(self.delta, self.freq.last_smoothed_delta);

        // ── Stability / environment / baseline maintenance ────
        self.stability.update(self.delta, &mut self.freq);

        let was_jitter = self.env.is_environmental_jitter;
        self.jitter.check(now_ms, self.freq.delta_rate, &mut self.env);
        if self.env.is_environmental_jitter != was_jitter {
            sink.emit(&EngineEvent::JitterChanged {
                active: self.env.is_environmental_jitter,
            });
        }

        // Call order is load-bearing: the static adjuster runs before the
        // blender each period, and both may move the baselines.
        self.static_adjuster.update(
            self.delta,
            self.freq.delta_rate,
            &mut self.static_state,
            &mut self.freq,
        );
        self.static_state.last_delta_raw = delta_raw;

        self.blend = if self.cfg.auto_baseline {
            self.blender.update(
                now_ms,
                self.delta,
                self.env.is_environmental_jitter,
                &mut self.freq,
            )
        } else {
            BlendDiagnostics::default()
        };

        // ── Output mapping ────────────────────────────────────
        self.duty = map_duty(
            self.freq.last_smoothed_delta,
            self.cfg.delta_f_min,
            self.cfg.delta_f_max,
        );
        hw.set_duty(self.duty);

        self.eye.looking = map_looking(
            self.freq.last_smoothed_delta,
            self.cfg.delta_f_min,
            self.cfg.delta_f_max,
        );
        self.eye.smoothed_looking = self.cfg.alpha_looking * f32::from(self.eye.looking)
            + (1.0 - self.cfg.alpha_looking) * self.eye.smoothed_looking;

        sink.emit(&EngineEvent::Telemetry(self.sample()));
        true
    }

    // ── Manual recalibration ──────────────────────────────────

    /// Snap both baselines to the current smoothed frequency.
    ///
    /// Side effect only; always succeeds and is idempotent under repeated
    /// presses.
    pub fn recalibrate(&mut self, sink: &mut impl EventSink) {
        self.freq.smoothed_base_freq = self.freq.smoothed_freq;
        self.freq.frozen_base_freq = self.freq.smoothed_freq;
        self.freq.stable_count = 0;
        info!("recalibrated: baseline = {:.1}", self.freq.smoothed_freq);
        sink.emit(&EngineEvent::Recalibrated {
            freq: self.freq.smoothed_freq,
        });
    }

    // ── Queries (all O(1), polled once per loop) ──────────────

    /// Smoothed gaze index, truncated to 0–8.
    pub fn looking(&self) -> u8 {
        self.eye.smoothed_looking as u8
    }

    /// Last commanded PWM duty (0–255).
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Deviation direction: −1, 0, or 1.
    pub fn direction(&self) -> i8 {
        self.eye.direction
    }

    /// Unsmoothed deviation magnitude (Hz, ≥ 0).
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn smoothed_freq(&self) -> f32 {
        self.freq.smoothed_freq
    }

    pub fn smoothed_base_freq(&self) -> f32 {
        self.freq.smoothed_base_freq
    }

    /// True once the startup baseline has committed.
    pub fn baseline_set(&self) -> bool {
        self.freq.baseline_set
    }

    /// Full telemetry snapshot of the current period.
    pub fn sample(&self) -> EngineSample {
        EngineSample {
            raw_freq: self.last_raw,
            smoothed_freq: self.freq.smoothed_freq,
            smoothed_base_freq: self.freq.smoothed_base_freq,
            frozen_base_freq: self.freq.frozen_base_freq,
            delta: self.delta,
            smoothed_delta: self.freq.last_smoothed_delta,
            delta_rate: self.freq.delta_rate,
            looking: self.eye.looking,
            duty: self.duty,
            direction: self.eye.direction,
            baseline_set: self.freq.baseline_set,
            stable_count: self.freq.stable_count,
            env_jitter: self.env.is_environmental_jitter,
            env_count: self.env.env_count,
            env_stable_counter: self.env.env_stable_counter,
            env_clear_counter: self.env.env_clear_counter,
            static_count: self.static_state.static_count,
            base_alpha: self.blend.base_alpha,
            env_factor: self.blend.env_factor,
            hand_factor: self.blend.hand_factor,
            adaptive_alpha: self.blend.adaptive_alpha,
        }
    }
}
