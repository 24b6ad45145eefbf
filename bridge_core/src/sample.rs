//! Band-power samples and their one-byte intensity encoding.

use crate::error::EncodingFault;

/// Band mean that maps to full intensity.
pub const FULL_SCALE: f64 = 0.195;

/// Number of byte levels the scaled value is spread over.
const BYTE_LEVELS: f64 = 256.0;

/// Latest 4-channel reading of one frequency band.
///
/// Writes replace all four channels at once; NaN channels are stored as 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSample {
    readings: [f32; 4],
}

impl SensorSample {
    pub fn new(readings: [f32; 4]) -> Self {
        let mut s = Self::default();
        s.set(readings);
        s
    }

    pub fn set(&mut self, readings: [f32; 4]) {
        self.readings = readings.map(|r| if r.is_nan() { 0.0 } else { r });
    }

    pub fn readings(&self) -> [f32; 4] {
        self.readings
    }

    /// Channel mean, accumulated in f64.
    pub fn mean(&self) -> f64 {
        let sum: f64 = self.readings.iter().map(|&r| f64::from(r)).sum();
        sum / self.readings.len() as f64
    }

    /// `floor(min(1, mean / FULL_SCALE) * 256)` clamped to a byte.
    ///
    /// Infinite channels can still produce a non-finite mean; that is
    /// reported as an `EncodingFault` instead of a byte.
    pub fn try_encode(&self) -> Result<u8, EncodingFault> {
        let mean = self.mean();
        if !mean.is_finite() {
            return Err(EncodingFault::NonFiniteMean(mean));
        }
        Ok(scaled_to_byte((mean / FULL_SCALE).min(1.0)))
    }

    /// Like `try_encode`, but a fault degrades to 0 so one bad reading never
    /// reaches the packet.
    pub fn encode(&self) -> u8 {
        match self.try_encode() {
            Ok(b) => b,
            Err(fault) => {
                tracing::debug!(%fault, "channel encoding fault, sending 0");
                0
            }
        }
    }
}

/// Map a scaled intensity (nominally 0.0..=1.0) to a byte by flooring.
#[inline]
pub fn scaled_to_byte(scaled: f64) -> u8 {
    let levels = (scaled * BYTE_LEVELS).floor();
    if levels.is_nan() {
        return 0;
    }
    levels.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_channels_become_zero() {
        let s = SensorSample::new([f32::NAN, 0.25, f32::NAN, -1.0]);
        assert_eq!(s.readings(), [0.0, 0.25, 0.0, -1.0]);
    }

    #[test]
    fn set_overwrites_all_channels() {
        let mut s = SensorSample::new([1.0, 2.0, 3.0, 4.0]);
        s.set([0.5, 0.5, 0.5, 0.5]);
        assert_eq!(s.readings(), [0.5; 4]);
    }

    #[test]
    fn zero_sample_encodes_to_zero() {
        assert_eq!(SensorSample::default().encode(), 0);
    }

    #[test]
    fn saturates_at_full_scale() {
        assert_eq!(SensorSample::new([0.195; 4]).encode(), 255);
        assert_eq!(SensorSample::new([0.5; 4]).encode(), 255);
        assert_eq!(SensorSample::new([10.0, 0.0, 0.0, 0.0]).encode(), 255);
    }

    #[test]
    fn negative_mean_clamps_to_zero_without_fault() {
        assert_eq!(SensorSample::new([-0.1; 4]).try_encode(), Ok(0));
    }

    #[test]
    fn infinite_channels_fault_and_fall_back_to_zero() {
        let s = SensorSample::new([f32::INFINITY, f32::NEG_INFINITY, 0.0, 0.0]);
        assert!(matches!(s.try_encode(), Err(EncodingFault::NonFiniteMean(m)) if m.is_nan()));
        assert_eq!(s.encode(), 0);

        let s = SensorSample::new([f32::INFINITY, 0.0, 0.0, 0.0]);
        assert!(s.try_encode().is_err());
        assert_eq!(s.encode(), 0);
    }

    #[test]
    fn scaled_to_byte_floors_rather_than_rounds() {
        // Exact boundary: identical under floor and round.
        assert_eq!(scaled_to_byte(0.5), 128);
        assert_eq!(scaled_to_byte(0.5), (0.5f64 * 256.0).round() as u8);
        // Just below a boundary: floor keeps the lower level, round would not.
        assert_eq!(scaled_to_byte(0.4999), 127);
        assert_eq!((0.4999f64 * 256.0).round() as u8, 128);
        // Top of range: round would overflow to 256, floor stays in range.
        assert_eq!(scaled_to_byte(0.999), 255);
        assert_eq!(scaled_to_byte(1.0), 255);
        assert_eq!(scaled_to_byte(-0.2), 0);
        assert_eq!(scaled_to_byte(f64::NAN), 0);
    }

    #[test]
    fn half_scale_f32_input_lands_just_below_128() {
        // 0.0975f32 is slightly below 0.0975, so the scaled level is 127.99...
        let s = SensorSample::new([0.0975; 4]);
        let levels = s.mean() / FULL_SCALE * 256.0;
        assert!(levels < 128.0 && levels > 127.9, "levels = {levels}");
        assert_eq!(s.encode(), 127);
    }
}
