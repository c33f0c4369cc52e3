//! Gaze broadcast task.
//!
//! The polling loop publishes a [`GazeFrame`] after every processed
//! sample; a lower-priority task drains the latest frame, de-duplicates
//! identical consecutive values, rate-limits transmissions, and sends the
//! postcard-encoded record over ESP-NOW to the broadcast address.
//!
//! ```text
//! ┌──────────────┐  GazeFrame   ┌──────────────┐  postcard   ┌─────────┐
//! │ Polling loop │─────────────▶│   TX task    │────────────▶│ ESP-NOW │
//! │ (producer)   │ latest-wins  │ dedupe+pace  │             │ (radio) │
//! └──────────────┘   Signal     └──────────────┘             └─────────┘
//! ```
//!
//! Transmission failures are logged at debug level and dropped — never
//! retried, never blocking the producer.  On host targets the radio is a
//! logging stub.

use core::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Scratch size for an encoded frame (three small ints fit with room).
pub const FRAME_BUF_LEN: usize = 16;

/// The fixed 3-field record the receiver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazeFrame {
    /// Gaze index, 0–8.
    pub looking: u8,
    /// PWM duty, 0–255.
    pub duty: u8,
    /// Deviation direction, −1/0/1.
    pub direction: i8,
}

impl GazeFrame {
    /// Encode into `buf`, returning the used prefix.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> postcard::Result<&'a mut [u8]> {
        postcard::to_slice(self, buf)
    }

    pub fn decode(bytes: &[u8]) -> postcard::Result<Self> {
        postcard::from_bytes(bytes)
    }
}

// ── Producer side ─────────────────────────────────────────────

/// Latest-wins handoff between the polling loop and the TX task.  An
/// unconsumed frame is simply replaced; only the newest gaze matters.
static GAZE_SIGNAL: Signal<CriticalSectionRawMutex, GazeFrame> = Signal::new();

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Publish the current gaze.  Never blocks.
pub fn publish(frame: GazeFrame) {
    GAZE_SIGNAL.signal(frame);
}

/// Ask the TX task to exit after its current iteration.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::Release);
}

// ── Send policy ───────────────────────────────────────────────

/// De-duplication + pacing, independent of the transport.
pub struct Broadcaster {
    min_interval_ms: u32,
    last_sent: Option<GazeFrame>,
    last_send_ms: u32,
}

impl Broadcaster {
    pub fn new(min_interval_ms: u32) -> Self {
        Self {
            min_interval_ms,
            last_sent: None,
            last_send_ms: 0,
        }
    }

    /// Decide whether `frame` goes out now.  Records it when the answer is
    /// yes; a suppressed frame is dropped (a newer one will be signalled).
    pub fn should_send(&mut self, frame: GazeFrame, now_ms: u32) -> bool {
        if self.last_sent == Some(frame) {
            return false;
        }
        if self.last_sent.is_some()
            && now_ms.wrapping_sub(self.last_send_ms) < self.min_interval_ms
        {
            return false;
        }
        self.last_sent = Some(frame);
        self.last_send_ms = now_ms;
        true
    }
}

// ── TX task ───────────────────────────────────────────────────

/// Spawn the broadcast task.  On ESP-IDF the thread is created as a
/// low-priority FreeRTOS task pinned to the protocol core.
pub fn spawn(min_interval_ms: u32) -> std::thread::JoinHandle<()> {
    configure_task_thread();
    std::thread::Builder::new()
        .name("gaze-tx".into())
        .stack_size(8 * 1024)
        .spawn(move || run(min_interval_ms))
        .expect("broadcast task spawn failed")
}

/// Configure the next pthread spawned from this thread: PRO core (where
/// the radio stack lives), priority well below the sampling path.
#[cfg(target_os = "espidf")]
fn configure_task_thread() {
    // SAFETY: esp_pthread_set_cfg stores thread-local config consumed by
    // the next pthread_create; called immediately before the spawn.
    unsafe {
        let mut cfg = esp_idf_svc::sys::esp_create_default_pthread_config();
        cfg.pin_to_core = 0;
        cfg.prio = 3;
        cfg.stack_size = 8 * 1024;
        cfg.thread_name = b"gaze-tx\0".as_ptr() as *const _;
        let _ = esp_idf_svc::sys::esp_pthread_set_cfg(&cfg);
    }
}

#[cfg(not(target_os = "espidf"))]
fn configure_task_thread() {}

fn run(min_interval_ms: u32) {
    let mut radio = match transport::init() {
        Ok(r) => r,
        Err(e) => {
            warn!("broadcast: radio init failed ({e}); task exiting");
            return;
        }
    };
    info!("broadcast: TX task running (min interval {}ms)", min_interval_ms);

    let mut policy = Broadcaster::new(min_interval_ms);
    let started = std::time::Instant::now();
    let mut buf = [0u8; FRAME_BUF_LEN];

    while !SHUTDOWN.load(Ordering::Acquire) {
        if let Some(frame) = GAZE_SIGNAL.try_take() {
            let now_ms = started.elapsed().as_millis() as u32;
            if policy.should_send(frame, now_ms) {
                match frame.encode(&mut buf) {
                    Ok(bytes) => {
                        if let Err(e) = radio.send(bytes) {
                            debug!("broadcast: frame dropped ({e})");
                        }
                    }
                    Err(_) => debug!("broadcast: encode failed"),
                }
            }
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    info!("broadcast: TX task shut down");
}

// ── Transport ─────────────────────────────────────────────────

/// All-ones MAC: every ESP-NOW receiver in range.
pub const BROADCAST_ADDR: [u8; 6] = [0xFF; 6];

#[cfg(target_os = "espidf")]
mod transport {
    //! ESP-NOW over a started (but unconnected) WiFi station.

    use esp_idf_svc::espnow::{EspNow, PeerInfo};
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};

    use super::BROADCAST_ADDR;
    use crate::error::{CommsError, Error, Result};

    pub struct Radio {
        // WiFi must stay alive for ESP-NOW to transmit.
        _wifi: EspWifi<'static>,
        espnow: EspNow<'static>,
    }

    pub fn init() -> Result<Radio> {
        let wifi_err = |e: esp_idf_svc::sys::EspError| Error::Comms(CommsError::WifiInitFailed(e.code()));

        let peripherals = Peripherals::take().map_err(wifi_err)?;
        let sys_loop = EspSystemEventLoop::take().map_err(wifi_err)?;
        let nvs = EspDefaultNvsPartition::take().map_err(wifi_err)?;

        let mut wifi = EspWifi::new(peripherals.modem, sys_loop, Some(nvs)).map_err(wifi_err)?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(wifi_err)?;
        wifi.start().map_err(wifi_err)?;

        let espnow = EspNow::take()
            .map_err(|e| Error::Comms(CommsError::EspNowInitFailed(e.code())))?;
        let peer = PeerInfo {
            peer_addr: BROADCAST_ADDR,
            channel: 1,
            encrypt: false,
            ..Default::default()
        };
        espnow
            .add_peer(peer)
            .map_err(|e| Error::Comms(CommsError::PeerAddFailed(e.code())))?;

        Ok(Radio {
            _wifi: wifi,
            espnow,
        })
    }

    impl Radio {
        pub fn send(&mut self, data: &[u8]) -> Result<()> {
            self.espnow
                .send(BROADCAST_ADDR, data)
                .map_err(|e| Error::Comms(CommsError::SendFailed(e.code())))
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod transport {
    //! Host-side stub: frames go to the debug log.

    use crate::error::Result;
    use log::debug;

    pub struct Radio;

    pub fn init() -> Result<Radio> {
        debug!("broadcast(sim): radio stub");
        Ok(Radio)
    }

    impl Radio {
        pub fn send(&mut self, data: &[u8]) -> Result<()> {
            debug!("broadcast(sim): {} bytes", data.len());
            Ok(())
        }
    }
}
