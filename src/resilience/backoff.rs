//! Exponential backoff with jitter for re-opening store watches.

use std::time::Duration;

use rand::Rng;

/// Delay before restart `attempt` (1-based); attempt 0 means no wait.
///
/// Doubles from `base_ms` up to `max_ms`, plus up to 10% jitter so a fleet
/// of components does not reconnect in lockstep.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_waits_base() {
        assert_eq!(calculate_backoff(0, 100, 1000), Duration::ZERO);
        let first = calculate_backoff(1, 100, 1000).as_millis();
        assert!((100..110).contains(&first), "{first}");
    }

    #[test]
    fn test_doubles_then_caps() {
        let third = calculate_backoff(3, 100, 10_000).as_millis();
        assert!((400..440).contains(&third), "{third}");

        let capped = calculate_backoff(40, 100, 1000).as_millis();
        assert!((1000..1100).contains(&capped), "{capped}");
    }
}
