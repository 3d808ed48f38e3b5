//! Wall-clock timestamps for record stamping.

use chrono::{SecondsFormat, Utc};

/// Source of `createdAt`/`updatedAt` stamps.
pub trait Clock {
    /// Returns the current instant as an opaque timestamp string.
    fn now(&self) -> String;
}

/// UTC clock producing RFC 3339 stamps with millisecond precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        now_timestamp()
    }
}

/// Current UTC time, e.g. `2026-10-19T08:00:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::now_timestamp;

    #[test]
    fn timestamps_are_utc_with_millis() {
        let stamp = now_timestamp();
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "2026-10-19T08:00:00.000Z".len());
    }
}
