/// Source of wall-clock seconds used to stamp session identifiers
pub trait Clock: Send + Sync {
    fn unix_seconds(&self) -> i64;
}

/// UTC wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock frozen at a given second, for deterministic sessions
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_seconds(&self) -> i64 {
        self.0
    }
}

/// Session id = device id immediately followed by the decimal timestamp.
/// Unique per device per second, nothing more.
pub fn derive_session_id(device_id: &str, unix_seconds: i64) -> String {
    format!("{}{}", device_id, unix_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_device_plus_seconds() {
        assert_eq!(derive_session_id("cam1", 1_700_000_000), "cam11700000000");
        assert_eq!(derive_session_id("", 42), "42");
    }

    #[test]
    fn session_id_is_deterministic_per_second() {
        let a = derive_session_id("cam1", FixedClock(100).unix_seconds());
        let b = derive_session_id("cam1", FixedClock(100).unix_seconds());
        let c = derive_session_id("cam1", FixedClock(101).unix_seconds());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.unix_seconds() > 1_577_836_800);
    }
}
