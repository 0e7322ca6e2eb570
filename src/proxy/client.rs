use std::time::Duration;

/// Upstream HTTP client with pooled keep-alive connections.
///
/// `timeout` bounds connecting and each wait for data from upstream, so a
/// stream that keeps producing chunks is never cut off.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(32)
        .tcp_keepalive(Duration::from_secs(60))
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
}
