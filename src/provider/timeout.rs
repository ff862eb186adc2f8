use std::time::Duration;

/// Timeout settings for outbound HTTP calls
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Timeout for the entire request (including response)
    pub request_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl TimeoutConfig {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    /// Single request budget used for backend callbacks; the connect
    /// timeout never exceeds the request timeout.
    pub fn from_secs(request_secs: u64) -> Self {
        let request_timeout = Duration::from_secs(request_secs);
        Self {
            connect_timeout: request_timeout.min(Duration::from_secs(10)),
            request_timeout,
        }
    }
}
