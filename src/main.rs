//! ThereminEye Firmware — Main Entry Point
//!
//! One interrupt-fed sampling path, one cooperative polling loop, one
//! low-priority broadcast task.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  timer ctx   PCNT ──▶ sample cell          button ISR ──▶ atomic│
//! │                          │                      │              │
//! │  polling     ┌───────────▼──────────────────────▼───────────┐  │
//! │  loop        │  ThereminEngine.process() · recalibrate      │  │
//! │              │  DisplayController · watchdog                │  │
//! │              └───────────┬──────────────────────────────────┘  │
//! │                          │ GazeFrame (latest-wins Signal)      │
//! │  gaze-tx     ┌───────────▼───────────┐                         │
//! │  task        │ dedupe · pace · send  │──▶ ESP-NOW              │
//! │              └───────────────────────┘                         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod error;
mod pins;

pub mod broadcast;
pub mod control;
pub mod display;
pub mod engine;

mod adapters;
mod drivers;
mod sensors;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogEventSink;
use adapters::time::Uptime;
use broadcast::GazeFrame;
use config::SystemConfig;
use display::DisplayController;
use drivers::button::ButtonDriver;
use drivers::max7219::Max7219;
use drivers::pwm_out::PwmOut;
use drivers::watchdog::Watchdog;
use engine::ThereminEngine;
use sensors::AntennaSensor;

/// Odds of starting a blink on any resting-gaze iteration (1 in N).
const BLINK_ODDS: u32 = 512;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("ThereminEye v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration (fixed at startup, never mutated) ────
    let config = SystemConfig::default();
    if let Err(e) = config.validate() {
        warn!("config: {} — continuing with the values as-is", e);
    }

    // ── 3. Peripherals ────────────────────────────────────────
    // A hardware theremin with no frequency input is still safely idle,
    // so init failure degrades rather than halts: the engine simply never
    // sees a sample.
    if let Err(e) = drivers::hw_init::init_peripherals() {
        error!("HAL init failed: {} — running degraded (no input)", e);
    }
    if let Err(e) = drivers::hw_timer::start_sampling_timer(config.sampling_period_ms) {
        error!("sampling timer failed: {} — running degraded (no input)", e);
    }
    if let Err(e) = drivers::hw_init::init_isr_service() {
        warn!("ISR service init failed: {} — button disabled", e);
    }
    let watchdog = Watchdog::new();
    let uptime = Uptime::new();

    // ── 4. Adapters and collaborators ─────────────────────────
    let mut hw = HardwareAdapter::new(AntennaSensor::new(pins::ANTENNA_PCNT_GPIO), PwmOut::new());
    let mut sink = LogEventSink::new(config.telemetry_every_n_samples);
    let mut button = ButtonDriver::new(pins::BUTTON_GPIO);

    let mut display = DisplayController::new(Max7219::new(pins::LED_MODULE_COUNT));
    display.init();

    let _tx_task = if config.broadcast_enabled {
        Some(broadcast::spawn(config.broadcast_min_interval_ms))
    } else {
        None
    };

    // ── 5. Engine ─────────────────────────────────────────────
    let mut engine = ThereminEngine::new(config.clone());

    // xorshift32 state for the idle-blink roll.
    let mut rng: u32 = 0x2545_F491;

    info!("System ready. Entering polling loop.");

    // ── 6. Polling loop ───────────────────────────────────────
    loop {
        let now_ms = uptime.millis();

        // Manual recalibration: one debounced press, consumed once.
        if button.tick(now_ms) {
            engine.recalibrate(&mut sink);
        }

        // One engine cycle; a pending sample drives everything downstream.
        if engine.process(now_ms, &mut hw, &mut sink) {
            display.update_eyes(engine.looking());
            broadcast::publish(GazeFrame {
                looking: engine.looking(),
                duty: engine.duty(),
                direction: engine.direction(),
            });
        }

        // Occasional blink while the gaze is at rest.
        rng ^= rng << 13;
        rng ^= rng >> 17;
        rng ^= rng << 5;
        if engine.looking() == 0 && engine.baseline_set() && rng % BLINK_ODDS == 0 {
            display.trigger_blink(now_ms);
        }
        display.process_blink(now_ms);

        watchdog.feed();

        // Simulate the sampling timer via sleep on non-espidf targets:
        // one synthetic idle count per period, with ±1 counting noise.
        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_millis(
                config.sampling_period_ms as u64,
            ));
            sensors::antenna::sim_latch_count(1050 + (rng % 3) as i32 - 1);
        }

        // On hardware the sample cell gates the pace; yield briefly.
        #[cfg(target_os = "espidf")]
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}
