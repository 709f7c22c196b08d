use super::models::Config;
use crate::upstream::{BaseUrlError, parse_base_url};
use std::time::Duration;
use thiserror::Error;

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("upstream.base_url '{url}' is invalid: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: BaseUrlError,
    },

    #[error("refresh.interval must be at least {min:?}, got {actual:?}")]
    RefreshIntervalTooShort { actual: Duration, min: Duration },

    #[error("upstream.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("upstream.request_timeout ({timeout:?}) exceeds refresh.interval ({interval:?})")]
    TimeoutExceedsInterval { timeout: Duration, interval: Duration },

    #[error("subscribers.buffer must be greater than zero")]
    ZeroSubscriberBuffer,

    #[error("server.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_upstream(config)?;
    validate_refresh(config)?;
    validate_limits(config)?;
    Ok(())
}

fn validate_upstream(config: &Config) -> Result<(), ValidationError> {
    parse_base_url(&config.upstream.base_url).map_err(|source| {
        ValidationError::InvalidBaseUrl {
            url: config.upstream.base_url.clone(),
            source,
        }
    })?;

    if config.upstream.request_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "request_timeout",
        });
    }
    if config.upstream.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "connect_timeout",
        });
    }

    Ok(())
}

/// A cycle must be able to finish within one period, otherwise every other
/// tick is coalesced away
fn validate_refresh(config: &Config) -> Result<(), ValidationError> {
    let interval = config.refresh.interval.as_duration();
    if interval < MIN_REFRESH_INTERVAL {
        return Err(ValidationError::RefreshIntervalTooShort {
            actual: interval,
            min: MIN_REFRESH_INTERVAL,
        });
    }

    let timeout = config.upstream.request_timeout.as_duration();
    if timeout > interval {
        return Err(ValidationError::TimeoutExceedsInterval { timeout, interval });
    }

    Ok(())
}

fn validate_limits(config: &Config) -> Result<(), ValidationError> {
    if config.subscribers.buffer == 0 {
        return Err(ValidationError::ZeroSubscriberBuffer);
    }
    if config.server.max_body_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroBodyLimit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::{ByteSize, HumanDuration};

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.upstream.base_url = "inspector:8080".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_refresh_interval_too_short() {
        let mut config = Config::default();
        config.refresh.interval = HumanDuration::from_millis(200);
        config.upstream.request_timeout = HumanDuration::from_millis(100);

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::RefreshIntervalTooShort { .. })
        ));
    }

    #[test]
    fn test_timeout_exceeds_interval() {
        let mut config = Config::default();
        config.refresh.interval = HumanDuration::from_secs(2);
        config.upstream.request_timeout = HumanDuration::from_secs(5);

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::TimeoutExceedsInterval { .. })
        ));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.upstream.connect_timeout = HumanDuration::from_secs(0);

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroTimeout {
                field: "connect_timeout"
            })
        ));
    }

    #[test]
    fn test_zero_limits() {
        let mut config = Config::default();
        config.subscribers.buffer = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroSubscriberBuffer)
        ));

        let mut config = Config::default();
        config.server.max_body_bytes = ByteSize(0);
        assert!(matches!(validate(&config), Err(ValidationError::ZeroBodyLimit)));
    }
}
