//! Sampling timer using ESP-IDF's esp_timer API.
//!
//! A single periodic timer fires every sampling period, snapshots the PCNT
//! pulse counter, and publishes the count through the antenna handoff
//! cell.  The callback executes in the ESP timer task context (not ISR),
//! so the PCNT driver calls and the critical-section latch are both safe.
//!
//! On simulation targets the polling loop injects counts itself; no timer
//! is started.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::drivers::hw_init::HwInitError;

#[cfg(target_os = "espidf")]
static mut SAMPLING_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn sampling_tick_cb(_arg: *mut core::ffi::c_void) {
    let count = crate::drivers::hw_init::pcnt_snapshot_and_clear();
    crate::sensors::antenna::latch_sample(count);
}

/// Start the periodic sampling timer.
#[cfg(target_os = "espidf")]
pub fn start_sampling_timer(period_ms: u32) -> Result<(), HwInitError> {
    // SAFETY: SAMPLING_TIMER is written here once at boot from the single
    // main-task context before the first callback can fire.  The callback
    // only snapshots PCNT and latches into the handoff cell.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(sampling_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"sampling\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut SAMPLING_TIMER);
        if ret != ESP_OK {
            return Err(HwInitError::TimerInitFailed(ret));
        }
        let ret = esp_timer_start_periodic(SAMPLING_TIMER, u64::from(period_ms) * 1_000);
        if ret != ESP_OK {
            return Err(HwInitError::TimerInitFailed(ret));
        }
    }
    info!("hw_timer: sampling @ {}ms started", period_ms);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_sampling_timer(_period_ms: u32) -> Result<(), HwInitError> {
    log::info!("hw_timer(sim): counts injected by the simulation loop");
    Ok(())
}

/// Stop the sampling timer.
#[cfg(target_os = "espidf")]
pub fn stop_sampling_timer() {
    // SAFETY: SAMPLING_TIMER is a valid handle if start succeeded;
    // null-check prevents stopping a never-created timer.
    unsafe {
        let t = SAMPLING_TIMER;
        if !t.is_null() {
            esp_timer_stop(t);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_sampling_timer() {}
