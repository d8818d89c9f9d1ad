//! TCP connect probe used as the CLI's scraper.
//!
//! Instead of fetching a metrics payload, the probe opens a TCP connection
//! to the target and records how long the handshake took.

use scrapeplane::scrape::{ScrapeError, ScrapeFuture, Scraper};
use scrapeplane::storage::Sample;
use scrapeplane::target::Target;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// Series holding the connect time in seconds.
pub const PROBE_METRIC: &str = "probe_connect_seconds";

/// Scraper that measures TCP connect latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl Scraper for TcpProbe {
    fn scrape<'a>(&'a self, target: &'a Target, timeout: Duration) -> ScrapeFuture<'a> {
        Box::pin(async move {
            let address = address_from_url(target.url())
                .ok_or_else(|| ScrapeError::Target(format!("no address in '{}'", target.url())))?;

            let started = Instant::now();
            match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
                Err(_) => Err(ScrapeError::Timeout(timeout)),
                Ok(Err(e)) => Err(ScrapeError::Target(e.to_string())),
                Ok(Ok(_stream)) => Ok(vec![Sample::new(
                    PROBE_METRIC,
                    started.elapsed().as_secs_f64(),
                    0,
                )]),
            }
        })
    }
}

/// Extracts `host:port` from a scrape URL.
pub fn address_from_url(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.split('/').next().filter(|host| !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapeplane::target::LabelSet;
    use tokio::net::TcpListener;

    fn target(url: String) -> Target {
        Target::new(LabelSet::from([("job", "probe")]), LabelSet::new(), url)
    }

    #[test]
    fn test_address_from_url() {
        assert_eq!(address_from_url("http://a:9100/metrics"), Some("a:9100"));
        assert_eq!(address_from_url("a:9100"), Some("a:9100"));
        assert_eq!(address_from_url("http:///metrics"), None);
    }

    #[tokio::test]
    async fn test_probe_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let samples = TcpProbe
            .scrape(&target(format!("http://{}/metrics", address)), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name(), Some(PROBE_METRIC));
        assert!(samples[0].value >= 0.0);
    }

    #[tokio::test]
    async fn test_probe_closed_port_fails() {
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let result = TcpProbe
            .scrape(&target(format!("http://{}/metrics", address)), Duration::from_secs(2))
            .await;

        assert!(result.is_err());
    }
}
