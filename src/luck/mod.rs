//! Luck: the timed skill-check oscillator and luck combination.
//!
//! A roll runs from `begin` to `end`. Every roll tick samples an oscillator
//! from the elapsed time; releasing the roll keeps the last sample. The spawn
//! luck is the product of every luck source, clamped into [0, 1].

use std::f64::consts::PI;

use crate::constants::{DEFAULT_ROLL_VALUE, ROLL_FREQUENCY, ROLL_MAGNET_THRESHOLD, ROLL_SCALE};

/// Oscillator value for a roll that has been held for `elapsed` seconds.
///
/// The output is in [0, ROLL_SCALE]. Shaped values within
/// `1 - ROLL_MAGNET_THRESHOLD` of the peak snap to the maximum.
pub fn roll_value(elapsed: f64) -> f64 {
    let raw = (elapsed * PI * ROLL_FREQUENCY).sin();
    let mut shaped = raw.signum() * (1.0 - (1.0 - raw.abs()).sqrt());
    if shaped.abs() > ROLL_MAGNET_THRESHOLD {
        shaped = shaped.signum();
    }
    ROLL_SCALE * shaped.abs()
}

/// In-flight skill-check roll for one player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuckRoll {
    pub start: f64,
    pub current: f64,
    value: Option<f64>,
}

impl LuckRoll {
    pub fn begin(now: f64) -> Self {
        Self {
            start: now,
            current: now,
            value: None,
        }
    }

    /// Advance to `now` and sample the oscillator
    pub fn tick(&mut self, now: f64) -> f64 {
        self.current = now;
        let value = roll_value(self.current - self.start);
        self.value = Some(value);
        value
    }

    pub fn computed(&self) -> Option<f64> {
        self.value
    }

    /// Value handed to the selector when the roll is released
    pub fn value(&self) -> f64 {
        self.value.unwrap_or(DEFAULT_ROLL_VALUE)
    }
}

/// Every multiplicative luck source for one spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuckInputs {
    pub detector_luck: f64,
    pub skill_luck: f64,
    pub server_multiplier: f64,
    pub potion_multiplier: f64,
    pub roll_value: f64,
}

/// Combined spawn luck, always in [0, 1]
pub fn combine_luck(inputs: LuckInputs) -> f64 {
    clamp_unit(
        inputs.detector_luck
            * inputs.skill_luck
            * inputs.server_multiplier
            * inputs.potion_multiplier
            * inputs.roll_value,
    )
}

/// Clamp into [0, 1]; NaN maps to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
