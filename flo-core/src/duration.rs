//! A millisecond duration newtype with a stable wire format.
//!
//! `serde`'s built-in `Duration` impl serializes as `{"secs": .., "nanos": ..}`,
//! which is awkward to consume from anything that isn't Rust. Every duration
//! that crosses a relay boundary (timeouts, elapsed time, budgets) uses this
//! type instead, which serializes as a plain integer.

use std::time::Duration;

/// A duration expressed in whole milliseconds, serialized as a bare integer.
///
/// ```
/// use flo_core::duration::DurationMs;
/// let d = DurationMs::from_secs(30);
/// assert_eq!(serde_json::to_string(&d).unwrap(), "30000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DurationMs(pub u64);

impl DurationMs {
    /// The zero duration.
    pub const ZERO: DurationMs = DurationMs(0);

    /// Build from a millisecond count.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Build from a whole-second count (saturating on overflow).
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// The millisecond count.
    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Convert to a `std::time::Duration`.
    pub fn to_std(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        d.to_std()
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_secs_converts_to_millis() {
        assert_eq!(DurationMs::from_secs(30).as_millis(), 30_000);
    }

    #[test]
    fn wire_format_is_a_bare_integer() {
        let d = DurationMs::from_millis(1500);
        assert_eq!(serde_json::to_string(&d).unwrap(), "1500");
        let back: DurationMs = serde_json::from_str("1500").unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn display_formats_with_ms_suffix() {
        assert_eq!(DurationMs::from_millis(42).to_string(), "42ms");
    }

    #[test]
    fn round_trips_through_std_duration() {
        let std_dur = Duration::from_millis(777);
        let d: DurationMs = std_dur.into();
        let back: Duration = d.into();
        assert_eq!(back, std_dur);
    }
}
