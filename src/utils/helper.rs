use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current timestamp in milliseconds since epoch
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Milliseconds elapsed since `last_ms`. `None` (never happened) is treated
/// as infinitely long ago.
pub fn elapsed_since(now_ms: u64, last_ms: Option<u64>) -> Duration {
    match last_ms {
        Some(last) => Duration::from_millis(now_ms.saturating_sub(last)),
        None => Duration::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_timestamp_is_infinitely_old() {
        assert_eq!(elapsed_since(1_000, None), Duration::MAX);
    }

    #[test]
    fn clock_skew_saturates_to_zero() {
        assert_eq!(elapsed_since(1_000, Some(5_000)), Duration::ZERO);
        assert_eq!(elapsed_since(61_000, Some(1_000)), Duration::from_secs(60));
    }
}
