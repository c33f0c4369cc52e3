//! ISR-debounced recalibration button.
//!
//! Active-low momentary switch with internal pull-up.  The GPIO fires on
//! the falling edge; the ISR records the raw timestamp into an atomic, and
//! `tick()` (called from the polling loop) applies a refractory debounce
//! so contact bounce and held-down retriggers collapse into one press
//! event, consumed exactly once.

use core::sync::atomic::{AtomicU32, Ordering};

const DEBOUNCE_MS: u32 = 50;

/// Raw ISR timestamp (milliseconds since boot, truncated to u32).
/// Written by the ISR, read by the polling loop.
static BUTTON_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

/// ISR handler — register this on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomic store).
pub fn button_isr_handler(now_ms: u32) {
    BUTTON_ISR_TIMESTAMP.store(now_ms, Ordering::Release);
}

pub struct ButtonDriver {
    gpio: i32,
    last_isr_ms: u32,
    last_press_ms: u32,
    any_press_seen: bool,
}

impl ButtonDriver {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            last_isr_ms: 0,
            last_press_ms: 0,
            any_press_seen: false,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Call from the polling loop each iteration.  Returns `true` at most
    /// once per debounced press.
    pub fn tick(&mut self, now_ms: u32) -> bool {
        let isr_ms = BUTTON_ISR_TIMESTAMP.load(Ordering::Acquire);
        if isr_ms == 0 || isr_ms == self.last_isr_ms {
            return false;
        }
        self.last_isr_ms = isr_ms;

        // Refractory window: edges arriving within the debounce window of
        // the last accepted press are contact bounce.
        if self.any_press_seen && now_ms.wrapping_sub(self.last_press_ms) < DEBOUNCE_MS {
            return false;
        }
        self.any_press_seen = true;
        self.last_press_ms = now_ms;
        true
    }
}
