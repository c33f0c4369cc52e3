//! One-shot hardware peripheral initialization.
//!
//! Configures the PCNT pulse counter, the LEDC PWM output, and the GPIO
//! directions using raw ESP-IDF sys calls.  Called once from `main()`
//! before the polling loop starts.  A failure here is unrecoverable but
//! not fatal: the caller logs it and the firmware idles with no frequency
//! input, which is a safe state for a theremin.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    PcntInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
    TimerInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PcntInitFailed(rc) => write!(f, "PCNT init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::TimerInitFailed(rc) => write!(f, "sampling timer setup failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the polling loop; single-threaded.
    unsafe {
        init_pcnt()?;
        init_gpio()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── PCNT pulse counter ────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut PCNT_UNIT: pcnt_unit_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut PCNT_CHANNEL: pcnt_channel_handle_t = core::ptr::null_mut();

/// SAFETY: PCNT_UNIT is written once in `init_pcnt()` before the sampling
/// timer starts; afterwards only the timer-task context reads it.
#[cfg(target_os = "espidf")]
unsafe fn pcnt_unit() -> pcnt_unit_handle_t {
    unsafe { PCNT_UNIT }
}

#[cfg(target_os = "espidf")]
unsafe fn init_pcnt() -> Result<(), HwInitError> {
    let unit_cfg = pcnt_unit_config_t {
        low_limit: pins::PCNT_LOW_LIMIT,
        high_limit: pins::PCNT_HIGH_LIMIT,
        ..Default::default()
    };
    // SAFETY: PCNT_UNIT is only written here, once at boot.
    let ret = unsafe { pcnt_new_unit(&unit_cfg, &raw mut PCNT_UNIT) };
    if ret != ESP_OK {
        return Err(HwInitError::PcntInitFailed(ret));
    }

    let glitch_cfg = pcnt_glitch_filter_config_t {
        max_glitch_ns: pins::PCNT_GLITCH_NS,
    };
    let ret = unsafe { pcnt_unit_set_glitch_filter(pcnt_unit(), &glitch_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::PcntInitFailed(ret));
    }

    let chan_cfg = pcnt_chan_config_t {
        edge_gpio_num: pins::ANTENNA_PCNT_GPIO,
        level_gpio_num: -1,
        ..Default::default()
    };
    let ret = unsafe { pcnt_new_channel(pcnt_unit(), &chan_cfg, &raw mut PCNT_CHANNEL) };
    if ret != ESP_OK {
        return Err(HwInitError::PcntInitFailed(ret));
    }

    // Count both edges: the oscillator duty cycle is not guaranteed.
    let ret = unsafe {
        pcnt_channel_set_edge_action(
            PCNT_CHANNEL,
            pcnt_channel_edge_action_t_PCNT_CHANNEL_EDGE_ACTION_INCREASE,
            pcnt_channel_edge_action_t_PCNT_CHANNEL_EDGE_ACTION_INCREASE,
        )
    };
    if ret != ESP_OK {
        return Err(HwInitError::PcntInitFailed(ret));
    }

    unsafe {
        let ret = pcnt_unit_enable(pcnt_unit());
        if ret != ESP_OK {
            return Err(HwInitError::PcntInitFailed(ret));
        }
        pcnt_unit_clear_count(pcnt_unit());
        let ret = pcnt_unit_start(pcnt_unit());
        if ret != ESP_OK {
            return Err(HwInitError::PcntInitFailed(ret));
        }
    }

    info!("hw_init: PCNT configured on GPIO{}", pins::ANTENNA_PCNT_GPIO);
    Ok(())
}

/// Snapshot the accumulated pulse count and clear the counter.
/// Called from the sampling-timer context every period.
#[cfg(target_os = "espidf")]
pub fn pcnt_snapshot_and_clear() -> i32 {
    let mut count: i32 = 0;
    // SAFETY: pcnt_unit() contract — unit handle written once at boot;
    // this is the only reader after the timer starts.
    unsafe {
        pcnt_unit_get_count(pcnt_unit(), &mut count);
        pcnt_unit_clear_count(pcnt_unit());
    }
    count
}

#[cfg(not(target_os = "espidf"))]
pub fn pcnt_snapshot_and_clear() -> i32 {
    0
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio() -> Result<(), HwInitError> {
    // Antenna input (PCNT samples it, but the pad must be an input).
    let antenna_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::ANTENNA_PCNT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&antenna_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    // Recalibration button: active-low, internal pull-up, falling edge.
    let btn_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };
    let ret = unsafe { gpio_config(&btn_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    // MAX7219 bit-bang pins.
    let matrix_pins = [pins::LED_DIN_GPIO, pins::LED_CLK_GPIO, pins::LED_CS_GPIO];
    for &pin in &matrix_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: GPIO configured (button, matrix)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio().
    unsafe {
        gpio_set_level(pin, if high { 1 } else { 0 });
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

pub const LEDC_CH_PWM_OUT: u32 = 0;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: control output (1 kHz, 8-bit).
    // SAFETY: Called from single main-task context via init_peripherals().
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::PWM_OUT_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: ledc_channel_t_LEDC_CHANNEL_0,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pins::PWM_OUT_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    info!("hw_init: LEDC configured (control output = CH0)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channel was configured in init_ledc(); duty register
    // writes are race-free since only the polling loop calls this.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty as u32);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is a counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::drivers::button::button_isr_handler(now_ms);
}

/// Install the GPIO ISR service and register the button interrupt.
/// Call after init_peripherals() and before the polling loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handler only stores
    // a timestamp into an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_set_intr_type(pins::BUTTON_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        gpio_isr_handler_add(pins::BUTTON_GPIO, Some(button_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::BUTTON_GPIO);

        info!("hw_init: ISR service installed (button)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
