//! Remaining-time value and its `H:MM:SS` rendering.

use std::fmt;

/// Estimated time to completion, whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Eta {
    secs: u64,
}

impl Eta {
    pub fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    /// Remaining bytes at a given rate (bytes/second), truncated to whole seconds.
    /// `rate` must be positive.
    pub fn from_rate(remaining_bytes: u64, rate: f64) -> Self {
        Self::from_secs((remaining_bytes as f64 / rate) as u64)
    }

    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    /// (hours, minutes, seconds); hours are not wrapped at 24.
    pub fn hms(&self) -> (u64, u64, u64) {
        (self.secs / 3600, (self.secs / 60) % 60, self.secs % 60)
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "{}:{:02}:{:02}", h, m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_h_mm_ss() {
        assert_eq!(Eta::from_secs(0).to_string(), "0:00:00");
        assert_eq!(Eta::from_secs(23).to_string(), "0:00:23");
        assert_eq!(Eta::from_secs(61).to_string(), "0:01:01");
        assert_eq!(Eta::from_secs(3600).to_string(), "1:00:00");
        assert_eq!(Eta::from_secs(3 * 3600 + 25 * 60 + 7).to_string(), "3:25:07");
    }

    #[test]
    fn hours_do_not_wrap() {
        assert_eq!(Eta::from_secs(100 * 3600 + 59).to_string(), "100:00:59");
    }

    #[test]
    fn from_rate_truncates() {
        // 700 bytes at 30 B/s = 23.33s
        assert_eq!(Eta::from_rate(700, 30.0).as_secs(), 23);
        assert_eq!(Eta::from_rate(0, 30.0).as_secs(), 0);
    }
}
