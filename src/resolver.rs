use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::join_all;

use crate::api::{SharedSleep, ShowroomApi};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlSource {
    Cache,
    Network,
    /// Resolution failed; the URL points straight at the static image path.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub filename: String,
    pub url: String,
    pub source: UrlSource,
}

impl ResolvedEntry {
    pub fn is_fallback(&self) -> bool {
        self.source == UrlSource::Fallback
    }
}

/// Maps artwork filenames to displayable URLs for the lifetime of the
/// session. Clones share one cache.
#[derive(Clone)]
pub struct ImageUrlResolver {
    api: ShowroomApi,
    sleep: SharedSleep,
    cache: Arc<Mutex<HashMap<String, String>>>,
    batch_size: usize,
    batch_delay: Duration,
}

impl ImageUrlResolver {
    pub fn new(api: ShowroomApi, sleep: SharedSleep) -> Self {
        Self {
            api,
            sleep,
            cache: Default::default(),
            batch_size: 3,
            batch_delay: Duration::from_millis(200),
        }
    }

    pub fn with_batching(mut self, batch_size: usize, batch_delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // Entries are plain strings; a panic mid-insert cannot corrupt them.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cached(&self, filename: &str) -> Option<String> {
        self.cache().get(filename).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }

    pub fn fallback_url(&self, filename: &str) -> String {
        self.api.catalog_image_endpoint(filename)
    }

    pub async fn resolve(&self, filename: &str) -> ResolvedEntry {
        if let Some(url) = self.cached(filename) {
            return ResolvedEntry {
                filename: filename.to_owned(),
                url,
                source: UrlSource::Cache,
            };
        }

        match self.api.catalog_image_url(filename).await {
            Ok(url) => {
                // Racing resolutions of the same file write the same value.
                self.cache().insert(filename.to_owned(), url.clone());
                ResolvedEntry {
                    filename: filename.to_owned(),
                    url,
                    source: UrlSource::Network,
                }
            }
            Err(err) => {
                if err.is_rate_limited() {
                    log::warn!("Rate limited resolving {filename}, using direct path");
                } else {
                    log::warn!("Failed to resolve {filename}: {err}");
                }
                ResolvedEntry {
                    filename: filename.to_owned(),
                    url: self.fallback_url(filename),
                    source: UrlSource::Fallback,
                }
            }
        }
    }

    /// Resolves `filenames` in fixed-size concurrent batches with a pause
    /// between batches. Results come back in input order, one per filename.
    pub async fn resolve_batch(&self, filenames: &[String]) -> Vec<ResolvedEntry> {
        let mut resolved = Vec::with_capacity(filenames.len());
        for (i, batch) in filenames.chunks(self.batch_size).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                self.sleep.sleep(self.batch_delay).await;
            }
            resolved.extend(join_all(batch.iter().map(|f| self.resolve(f))).await);
        }

        let fallbacks = resolved.iter().filter(|entry| entry.is_fallback()).count();
        log::info!(
            "Resolved {} image URLs ({} fallbacks)",
            resolved.len(),
            fallbacks
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{json, response, FakeTransport};
    use crate::api::{Sleep, Transport};
    use futures::executor::block_on;
    use futures::future::{FutureExt, LocalBoxFuture};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl EventLog {
        fn push(&self, event: String) {
            self.0.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct RecordingSleep(Arc<EventLog>);

    impl Sleep for RecordingSleep {
        fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
            self.0.push(format!("sleep {}ms", duration.as_millis()));
            futures::future::ready(()).boxed_local()
        }
    }

    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// Holds every request open for one poll so overlapping requests are
    /// observable.
    #[derive(Default)]
    struct SlowTransport {
        log: Arc<EventLog>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl Transport for SlowTransport {
        fn fetch(
            &self,
            request: ehttp::Request,
        ) -> LocalBoxFuture<'static, Result<ehttp::Response, String>> {
            self.log.push(format!("fetch {}", request.url));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let in_flight = self.in_flight.clone();
            async move {
                YieldOnce(false).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(json(200, r#"{"url": "https://bucket/signed"}"#))
            }
            .boxed_local()
        }
    }

    fn resolver(transport: Arc<FakeTransport>) -> ImageUrlResolver {
        let api = ShowroomApi::new("http://host", transport);
        ImageUrlResolver::new(api, Arc::new(RecordingSleep(Default::default())))
    }

    #[test]
    fn test_second_resolve_hits_cache() {
        let transport = Arc::new(FakeTransport::default());
        transport.route(
            "http://host/catalog/images/a.jpg",
            Ok(json(200, r#"{"url": "https://bucket/a.jpg?sig=1"}"#)),
        );
        let resolver = resolver(transport.clone());

        let first = block_on(resolver.resolve("a.jpg"));
        let second = block_on(resolver.resolve("a.jpg"));

        assert_eq!(first.source, UrlSource::Network);
        assert_eq!(second.source, UrlSource::Cache);
        assert_eq!(first.url, second.url);
        assert_eq!(transport.request_count("http://host/catalog/images/a.jpg"), 1);
        assert_eq!(resolver.cached("a.jpg").as_deref(), Some("https://bucket/a.jpg?sig=1"));
        assert_eq!(resolver.cached("b.jpg"), None);
    }

    #[test]
    fn test_fallback_is_not_cached() {
        let transport = Arc::new(FakeTransport::default());
        let endpoint = "http://host/catalog/images/a.jpg";
        transport.route(endpoint, Ok(json(429, r#"{"error": "ratelimit exceeded"}"#)));
        let resolver = resolver(transport.clone());

        let first = block_on(resolver.resolve("a.jpg"));
        assert!(first.is_fallback());
        assert_eq!(first.url, endpoint);
        assert!(resolver.cached("a.jpg").is_none());

        transport.route(endpoint, Ok(json(200, r#"{"url": "https://bucket/a.jpg"}"#)));
        let retry = block_on(resolver.resolve("a.jpg"));
        assert_eq!(retry.source, UrlSource::Network);
        assert_eq!(retry.url, "https://bucket/a.jpg");
        assert_eq!(transport.request_count(endpoint), 2);
    }

    #[test]
    fn test_network_error_and_direct_bytes() {
        let transport = Arc::new(FakeTransport::default());
        transport.route("http://host/catalog/images/down.jpg", Err("offline".to_owned()));
        transport.route(
            "http://host/catalog/images/local.jpg",
            Ok(response(200, "image/jpeg", &[0xff, 0xd8])),
        );
        let resolver = resolver(transport);

        assert!(block_on(resolver.resolve("down.jpg")).is_fallback());
        let local = block_on(resolver.resolve("local.jpg"));
        assert_eq!(local.source, UrlSource::Network);
        assert_eq!(local.url, "http://host/catalog/images/local.jpg");
    }

    #[test]
    fn test_batch_settles_every_item_in_order() {
        let transport = Arc::new(FakeTransport::default());
        transport.route(
            "http://host/catalog/images/a.jpg",
            Ok(json(200, r#"{"url": "https://bucket/a"}"#)),
        );
        transport.route(
            "http://host/catalog/images/c.jpg",
            Ok(json(200, r#"{"url": "https://bucket/c"}"#)),
        );
        let resolver = resolver(transport);
        let names: Vec<String> = ["a.jpg", "b.jpg", "c.jpg", "a.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let entries = block_on(resolver.resolve_batch(&names));

        let filenames: Vec<&str> = entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(filenames, ["a.jpg", "b.jpg", "c.jpg", "a.jpg"]);
        assert_eq!(entries[0].url, "https://bucket/a");
        assert!(entries[1].is_fallback());
        assert_eq!(entries[2].url, "https://bucket/c");
        assert_eq!(entries[3].source, UrlSource::Cache);
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn test_batches_are_bounded_and_paced() {
        let log = Arc::new(EventLog::default());
        let transport = Arc::new(SlowTransport {
            log: log.clone(),
            ..Default::default()
        });
        let max_in_flight = transport.max_in_flight.clone();
        let api = ShowroomApi::new("http://host", transport);
        let resolver = ImageUrlResolver::new(api, Arc::new(RecordingSleep(log.clone())))
            .with_batching(3, Duration::from_millis(200));
        let names: Vec<String> = (0..7).map(|i| format!("{i}.jpg")).collect();

        let entries = block_on(resolver.resolve_batch(&names));

        assert_eq!(entries.len(), 7);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 3);
        let events = log.events();
        let shape: String = events
            .iter()
            .map(|e| if e.starts_with("fetch") { 'F' } else { 'S' })
            .collect();
        assert_eq!(shape, "FFFSFFFSF");
        assert!(events
            .iter()
            .filter(|e| e.starts_with("sleep"))
            .all(|e| e == "sleep 200ms"));
    }
}
