//! Vibration output.

/// Device vibration motor.
///
/// Implementations must swallow platform errors; a missing motor is not a
/// failure worth surfacing.
pub trait HapticPort: Send {
    /// Play `pattern` (alternating on/off durations in milliseconds).
    /// Returns whether the device accepted it.
    fn vibrate(&self, pattern: &[u64]) -> bool;

    fn stop(&self);
}

/// For platforms without a vibration motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl HapticPort for NoHaptics {
    fn vibrate(&self, _pattern: &[u64]) -> bool {
        false
    }

    fn stop(&self) {}
}
