// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::retry::{default_backoff, is_conflict, is_not_found, is_retryable_error};
    use std::time::Duration;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(
            kube::core::Status::failure(&format!("{reason} error"), reason)
                .with_code(code)
                .boxed(),
        )
    }

    /// Test that backoff configuration has expected values
    #[test]
    fn test_backoff_configuration() {
        let backoff = default_backoff();

        assert_eq!(
            backoff.initial_interval,
            Duration::from_millis(100),
            "Initial interval should be 100ms"
        );
        assert_eq!(
            backoff.max_interval,
            Duration::from_secs(30),
            "Max interval should be 30 seconds"
        );
        assert_eq!(
            backoff.max_elapsed_time,
            Some(Duration::from_secs(300)),
            "Max elapsed time should be 5 minutes"
        );

        #[allow(clippy::float_cmp)]
        {
            assert_eq!(backoff.multiplier, 2.0);
            assert_eq!(backoff.randomization_factor, 0.1);
        }
    }

    /// Backoff intervals grow until capped at the max interval
    #[test]
    fn test_backoff_growth_is_capped() {
        let mut backoff = default_backoff();

        let mut last = Duration::ZERO;
        for _ in 0..20 {
            let Some(interval) = backoff.next_backoff() else {
                panic!("backoff should not be exhausted this early");
            };
            // Jitter is ±10%, so allow headroom over the configured cap
            assert!(interval <= Duration::from_secs(33));
            last = interval;
        }
        assert!(last >= Duration::from_secs(20), "should approach the cap");
    }

    /// Test that HTTP 429 errors are retryable
    #[test]
    fn test_429_is_retryable() {
        assert!(is_retryable_error(&api_error(429, "TooManyRequests")));
    }

    /// Test that 5xx server errors are retryable
    #[test]
    fn test_5xx_is_retryable() {
        assert!(is_retryable_error(&api_error(500, "InternalServerError")));
        assert!(is_retryable_error(&api_error(503, "ServiceUnavailable")));
    }

    /// Test that 4xx client errors are not retryable
    #[test]
    fn test_4xx_is_not_retryable() {
        assert!(!is_retryable_error(&api_error(400, "BadRequest")));
        assert!(!is_retryable_error(&api_error(404, "NotFound")));
        assert!(!is_retryable_error(&api_error(409, "Conflict")));
        assert!(!is_retryable_error(&api_error(422, "Invalid")));
    }

    /// Conflicts are classified separately from blind-retryable errors
    #[test]
    fn test_conflict_classification() {
        assert!(is_conflict(&api_error(409, "Conflict")));
        assert!(!is_conflict(&api_error(500, "InternalServerError")));
        assert!(!is_conflict(&api_error(404, "NotFound")));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(is_not_found(&api_error(404, "NotFound")));
        assert!(!is_not_found(&api_error(409, "Conflict")));
    }
}
