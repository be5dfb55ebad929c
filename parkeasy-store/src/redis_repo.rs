use redis::RedisResult;
use tracing::debug;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter. Returns true while `key` is within `limit`
    /// requests for the current window.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        if count > limit {
            debug!(key, count, limit, "Rate limit exceeded");
        }
        Ok(count <= limit)
    }
}

/// Key for one client in the current window.
pub fn rate_limit_key(client: &str, window_seconds: i64, now_epoch: i64) -> String {
    let window = if window_seconds > 0 { now_epoch / window_seconds } else { now_epoch };
    format!("ratelimit:{}:{}", client, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_key_buckets_by_window() {
        assert_eq!(rate_limit_key("10.0.0.1", 60, 120), "ratelimit:10.0.0.1:2");
        assert_eq!(rate_limit_key("10.0.0.1", 60, 179), "ratelimit:10.0.0.1:2");
        assert_ne!(rate_limit_key("10.0.0.1", 60, 180), rate_limit_key("10.0.0.1", 60, 179));
    }
}
