use anyhow::Context;
use redis::aio::ConnectionManager;
use tracing::info;

pub async fn connection_manager(url: &str) -> anyhow::Result<ConnectionManager> {
    let client =
        redis::Client::open(url).context("invalid redis connection url")?;
    let conn = ConnectionManager::new(client)
        .await
        .context("error while connecting to redis")?;
    info!("redis connection established");
    Ok(conn)
}

/// Builds a `redis://` url from its parts.
pub fn redis_url(addr: &str, db: i64, password: Option<&str>) -> String {
    match password {
        Some(password) if !password.is_empty() => {
            format!("redis://:{password}@{addr}/{db}")
        }
        _ => format!("redis://{addr}/{db}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_with_and_without_password() {
        assert_eq!(
            redis_url("127.0.0.1:6379", 0, None),
            "redis://127.0.0.1:6379/0"
        );
        assert_eq!(
            redis_url("cache:6380", 3, Some("s3cret")),
            "redis://:s3cret@cache:6380/3"
        );
        assert_eq!(redis_url("cache:6380", 1, Some("")), "redis://cache:6380/1");
    }
}
