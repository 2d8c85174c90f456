use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::{FutureExt, LocalBoxFuture};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::model::{
    ErrorBody, PreferencesOptions, RecommendationRequest, RecommendationResponse,
};

/// Issues HTTP requests. The app uses [`EhttpTransport`]; tests substitute
/// in-memory fakes.
pub trait Transport {
    fn fetch(&self, request: ehttp::Request)
        -> LocalBoxFuture<'static, Result<ehttp::Response, String>>;
}

/// Async delay, so batch pacing can be driven without a real clock in tests.
pub trait Sleep {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

pub type SharedTransport = Arc<dyn Transport + Send + Sync>;
pub type SharedSleep = Arc<dyn Sleep + Send + Sync>;

#[derive(Clone, Copy, Debug, Default)]
pub struct EhttpTransport;

impl Transport for EhttpTransport {
    fn fetch(
        &self,
        request: ehttp::Request,
    ) -> LocalBoxFuture<'static, Result<ehttp::Response, String>> {
        ehttp::fetch_async(request).boxed_local()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TimerSleep;

impl Sleep for TimerSleep {
    #[cfg(not(target_arch = "wasm32"))]
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        // Background tasks each own a worker thread, so blocking it is fine.
        async move { std::thread::sleep(duration) }.boxed_local()
    }

    #[cfg(target_arch = "wasm32")]
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).boxed_local()
    }
}

#[derive(Deserialize)]
struct UrlBody {
    url: String,
}

#[derive(Deserialize)]
struct DataUrlBody {
    data_url: String,
}

/// Client for the recommendation backend.
#[derive(Clone)]
pub struct ShowroomApi {
    base_url: String,
    transport: SharedTransport,
}

impl ShowroomApi {
    pub fn new(base_url: impl Into<String>, transport: SharedTransport) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    // Absolute URLs not under the API base, e.g. pre-signed storage links.
    fn is_foreign(&self, url: &str) -> bool {
        url.starts_with("http") && (self.base_url.is_empty() || !url.starts_with(&self.base_url))
    }

    pub fn catalog_image_endpoint(&self, filename: &str) -> String {
        format!("{}/catalog/images/{}", self.base_url, filename)
    }

    async fn send(&self, request: ehttp::Request) -> ApiResult<ehttp::Response> {
        let method = request.method.clone();
        let url = request.url.clone();
        let response = self
            .transport
            .fetch(request)
            .await
            .map_err(ApiError::Transport)?;
        log::debug!("{method} {url} -> {}", response.status);
        if response.ok {
            return Ok(response);
        }
        let message = serde_json::from_slice::<ErrorBody>(&response.bytes)
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("Request failed with status {}", response.status));
        Err(ApiError::Status {
            status: response.status,
            message,
        })
    }

    pub async fn recommend(
        &self,
        payload: &RecommendationRequest,
    ) -> ApiResult<RecommendationResponse> {
        let request = ehttp::Request::json(format!("{}/recommend", self.base_url), payload)?;
        let response = self.send(request).await?;
        Ok(serde_json::from_slice(&response.bytes)?)
    }

    pub async fn preferences_options(&self) -> ApiResult<PreferencesOptions> {
        let request = ehttp::Request::get(format!("{}/api/preferences-options", self.base_url));
        let response = self.send(request).await?;
        Ok(serde_json::from_slice(&response.bytes)?)
    }

    /// Asks the backend where `filename` can be displayed from. Deployments
    /// backed by object storage answer `{url}`; local ones stream the image
    /// itself, in which case the endpoint is the answer.
    pub async fn catalog_image_url(&self, filename: &str) -> ApiResult<String> {
        let endpoint = self.catalog_image_endpoint(filename);
        let response = self.send(ehttp::Request::get(&endpoint)).await?;
        let is_image = response
            .content_type()
            .map_or(false, |ct| ct.starts_with("image/"));
        if is_image {
            return Ok(endpoint);
        }
        let body: UrlBody = serde_json::from_slice(&response.bytes)?;
        Ok(body.url)
    }

    pub async fn convert_image_to_data_url(&self, image_url: &str) -> ApiResult<String> {
        let query: String = url::form_urlencoded::byte_serialize(image_url.as_bytes()).collect();
        let request = ehttp::Request::get(format!(
            "{}/api/convert-image-to-data-url?url={}",
            self.base_url, query
        ));
        let response = self.send(request).await?;
        let body: DataUrlBody = serde_json::from_slice(&response.bytes)?;
        Ok(body.data_url)
    }

    pub async fn fetch_bytes(&self, url: &str) -> ApiResult<Vec<u8>> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        Ok(self.send(ehttp::Request::get(url)).await?.bytes)
    }

    /// Downloads image bytes. Third-party hosts (pre-signed storage URLs)
    /// that refuse the request are retried through the backend's data URL
    /// proxy, which browsers need to get past cross-origin rules.
    pub async fn fetch_image(&self, url: &str) -> ApiResult<Vec<u8>> {
        match self.fetch_bytes(url).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if self.is_foreign(url) => {
                log::debug!("Direct fetch of {url} failed ({err}), using proxy");
                let data_url = self.convert_image_to_data_url(url).await?;
                decode_data_url(&data_url)
            }
            Err(err) => Err(err),
        }
    }
}

pub fn encode_data_url(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("image/jpeg");
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn decode_data_url(data_url: &str) -> ApiResult<Vec<u8>> {
    let (header, payload) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(ApiError::DataUrl)?;
    if !header.ends_with(";base64") {
        return Err(ApiError::DataUrl);
    }
    STANDARD.decode(payload).map_err(|_| ApiError::DataUrl)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub fn response(status: u16, content_type: &str, body: &[u8]) -> ehttp::Response {
        ehttp::Response {
            url: String::new(),
            ok: (200..300).contains(&status),
            status,
            status_text: String::new(),
            headers: ehttp::Headers::new(&[("content-type", content_type)]),
            bytes: body.to_vec(),
        }
    }

    pub fn json(status: u16, body: &str) -> ehttp::Response {
        response(status, "application/json", body.as_bytes())
    }

    /// Answers requests from a URL table and records every request made.
    #[derive(Default)]
    pub struct FakeTransport {
        routes: Mutex<HashMap<String, Result<ehttp::Response, String>>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        pub fn route(&self, url: &str, reply: Result<ehttp::Response, String>) {
            self.routes.lock().unwrap().insert(url.to_owned(), reply);
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    impl Transport for FakeTransport {
        fn fetch(
            &self,
            request: ehttp::Request,
        ) -> LocalBoxFuture<'static, Result<ehttp::Response, String>> {
            self.requests.lock().unwrap().push(request.url.clone());
            let reply = self
                .routes
                .lock()
                .unwrap()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| Ok(json(404, r#"{"error": "not found"}"#)));
            futures::future::ready(reply).boxed_local()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use futures::executor::block_on;

    fn api(transport: Arc<FakeTransport>) -> ShowroomApi {
        ShowroomApi::new("http://host", transport)
    }

    #[test]
    fn test_recommend_surfaces_error_body() {
        let transport = Arc::new(FakeTransport::default());
        transport.route(
            "http://host/recommend",
            Ok(json(500, r#"{"error": "Internal server error"}"#)),
        );
        let payload = RecommendationRequest::Preferences {
            preferences: Default::default(),
        };
        let err = block_on(api(transport).recommend(&payload)).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_status_without_body_gets_generic_message() {
        let transport = Arc::new(FakeTransport::default());
        transport.route("http://host/recommend", Ok(response(404, "text/html", b"<h1>")));
        let payload = RecommendationRequest::Preferences {
            preferences: Default::default(),
        };
        let err = block_on(api(transport).recommend(&payload)).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 404");
    }

    #[test]
    fn test_catalog_image_url_handles_json_and_bytes() {
        let transport = Arc::new(FakeTransport::default());
        transport.route(
            "http://host/catalog/images/a.jpg",
            Ok(json(200, r#"{"url": "https://bucket/a.jpg?sig=1"}"#)),
        );
        transport.route(
            "http://host/catalog/images/b.jpg",
            Ok(response(200, "image/jpeg", &[0xff, 0xd8, 0xff])),
        );
        let api = api(transport);
        assert_eq!(
            block_on(api.catalog_image_url("a.jpg")).unwrap(),
            "https://bucket/a.jpg?sig=1"
        );
        assert_eq!(
            block_on(api.catalog_image_url("b.jpg")).unwrap(),
            "http://host/catalog/images/b.jpg"
        );
    }

    #[test]
    fn test_convert_image_encodes_query() {
        let transport = Arc::new(FakeTransport::default());
        transport.route(
            "http://host/api/convert-image-to-data-url?url=https%3A%2F%2Fbucket%2Fa.jpg%3Fsig%3D1",
            Ok(json(200, r#"{"data_url": "data:image/png;base64,AAAA"}"#)),
        );
        let data_url =
            block_on(api(transport).convert_image_to_data_url("https://bucket/a.jpg?sig=1"))
                .unwrap();
        assert_eq!(data_url, "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_transport_failure_maps_to_transport_error() {
        let transport = Arc::new(FakeTransport::default());
        transport.route(
            "http://host/api/preferences-options",
            Err("connection refused".to_owned()),
        );
        let err = block_on(api(transport).preferences_options()).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn test_fetch_image_falls_back_to_proxy_for_foreign_hosts() {
        let transport = Arc::new(FakeTransport::default());
        transport.route("https://bucket/a.jpg", Err("blocked".to_owned()));
        transport.route(
            "http://host/api/convert-image-to-data-url?url=https%3A%2F%2Fbucket%2Fa.jpg",
            Ok(json(200, r#"{"data_url": "data:image/png;base64,AQID"}"#)),
        );
        let api = api(transport.clone());
        assert_eq!(block_on(api.fetch_image("https://bucket/a.jpg")).unwrap(), [1, 2, 3]);

        // Same-origin failures are real failures.
        assert!(block_on(api.fetch_image("http://host/catalog/images/x.jpg")).is_err());
        assert_eq!(transport.requests.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_data_url_decoding() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let url = encode_data_url(&png_magic);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), png_magic);
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("https://example.com").is_err());
    }
}
