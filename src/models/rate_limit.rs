use chrono::{DateTime, Duration, Utc};

/// Upper bound on the window (about ten years)
const MAX_WINDOW_SECS: u64 = 10 * 365 * 24 * 3600;

/// One recorded request against the sync endpoint
#[derive(Debug, Clone)]
pub struct RateLimitEvent {
    pub id: i64,
    /// Client identity (usually an IP address)
    pub ip: String,
    /// HTTP method, informational only
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Fixed threshold over a trailing time window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    /// Requests allowed inside the window
    pub max_requests: u64,
    /// Length of the trailing window
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Create a policy allowing `max_requests` per `window_secs`
    pub fn new(max_requests: u64, window_secs: u64) -> Self {
        let window_secs = window_secs.min(MAX_WINDOW_SECS) as i64;
        Self {
            max_requests,
            window: Duration::seconds(window_secs),
        }
    }

    /// Start of the trailing window ending at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Whether a client with `recent` requests already inside the window
    /// must be turned away
    pub fn is_exceeded(&self, recent: u64) -> bool {
        recent >= self.max_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_policy() {
        let policy = RateLimitPolicy::new(100, 3600);

        assert_eq!(policy.max_requests, 100);
        assert_eq!(policy.window, Duration::hours(1));
    }

    #[test]
    fn test_huge_window_is_clamped() {
        let policy = RateLimitPolicy::new(1, u64::MAX);
        assert_eq!(policy.window, Duration::seconds(MAX_WINDOW_SECS as i64));
    }

    #[test]
    fn test_window_start() {
        let policy = RateLimitPolicy::new(5, 60);
        let now = Utc::now();

        assert_eq!(policy.window_start(now), now - Duration::seconds(60));
    }

    #[test]
    fn test_nth_plus_one_request_is_exceeded() {
        let policy = RateLimitPolicy::new(5, 3600);

        // Requests 1..=5 see 0..=4 prior events
        for recent in 0..5 {
            assert!(!policy.is_exceeded(recent), "request {} should pass", recent + 1);
        }

        // Request 6 sees 5 prior events
        assert!(policy.is_exceeded(5));
        assert!(policy.is_exceeded(50));
    }

    #[test]
    fn test_zero_threshold_rejects_everything() {
        let policy = RateLimitPolicy::new(0, 3600);
        assert!(policy.is_exceeded(0));
    }
}
