//! GPIO / peripheral pin assignments for the ThereminEye main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Antenna oscillator input (PCNT pulse counter)
// ---------------------------------------------------------------------------

/// Square-wave output of the antenna oscillator, counted by PCNT unit 0.
pub const ANTENNA_PCNT_GPIO: i32 = 18;

/// PCNT hardware counter limits (symmetric, 16-bit signed range).
pub const PCNT_HIGH_LIMIT: i32 = 32_767;
pub const PCNT_LOW_LIMIT: i32 = -32_767;

/// Glitch filter window: pulses shorter than this are electrical noise.
pub const PCNT_GLITCH_NS: u32 = 100;

// ---------------------------------------------------------------------------
// Control output (LEDC PWM)
// ---------------------------------------------------------------------------

/// PWM control-signal output pin.
pub const PWM_OUT_GPIO: i32 = 2;
/// LEDC base frequency for the control output (1 kHz).
pub const PWM_OUT_FREQ_HZ: u32 = 1_000;
/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;

// ---------------------------------------------------------------------------
// LED-matrix eye display (MAX7219 chain, bit-banged SPI)
// ---------------------------------------------------------------------------

/// MAX7219 serial data in.
pub const LED_DIN_GPIO: i32 = 17;
/// MAX7219 shift clock.
pub const LED_CLK_GPIO: i32 = 15;
/// MAX7219 chip select (latch).
pub const LED_CS_GPIO: i32 = 16;
/// Number of daisy-chained 8x8 modules (two 4-module eyes).
pub const LED_MODULE_COUNT: usize = 8;

// ---------------------------------------------------------------------------
// User button (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button for manual baseline recalibration.
pub const BUTTON_GPIO: i32 = 4;
