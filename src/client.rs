// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Construction and caching of the shared transport clients.
//!
//! Exactly two clients exist per process, one per [TlsMode]. Each is built on first use,
//! under a once-only initializer, and then shared read-only by every caller.

use crate::codec::{CodecResolver, JsonModel};
use crate::config::{Config, TlsMode};
use crate::error::{ClientError, TransportError, UnsupportedContentTypeSnafu};
use crate::{filter, tls};
use async_native_tls::TlsConnector;
use snafu::ResultExt;
use std::convert::TryInto;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, OnceLock};
use surf::http::{headers::CONTENT_TYPE, mime};
use surf::{Body, Response};
use tracing::{event, Level};

static STRICT: OnceLock<TransportClient> = OnceLock::new();
static PERMISSIVE: OnceLock<TransportClient> = OnceLock::new();

/// Get the shared client, strict or permissive.
///
/// With `use_insecure_tls` the client accepts any server certificate and any hostname. That
/// only affects the returned client; see [tls::install_permissive_process_default] for the
/// process-wide switch.
pub fn get_client(use_insecure_tls: bool) -> &'static TransportClient {
    client(TlsMode::from_insecure(use_insecure_tls))
}

/// Get the shared client for `config`.
pub fn client_for(config: &Config) -> &'static TransportClient {
    client(config.tls_mode())
}

/// Get the shared client for `mode`, building it on first use.
///
/// Concurrent first callers block until the single build finishes and all observe the same
/// instance.
pub fn client(mode: TlsMode) -> &'static TransportClient {
    let cell = match mode {
        TlsMode::Strict => &STRICT,
        TlsMode::Permissive => &PERMISSIVE,
    };
    cached(cell, || build(mode, tls::permissive_connector))
}

fn cached(
    cell: &'static OnceLock<TransportClient>,
    init: impl FnOnce() -> TransportClient,
) -> &'static TransportClient {
    cell.get_or_init(init)
}

/// A configured HTTP client with its middleware and codecs.
pub struct TransportClient {
    http: surf::Client,
    codecs: CodecResolver,
    mode: TlsMode,
    accepts_invalid_certs: bool,
}

impl Debug for TransportClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportClient")
            .field("mode", &self.mode)
            .field("accepts_invalid_certs", &self.accepts_invalid_certs)
            .finish()
    }
}

impl TransportClient {
    fn new(http: surf::Client, mode: TlsMode, accepts_invalid_certs: bool) -> Self {
        Self {
            http,
            codecs: CodecResolver::new(),
            mode,
            accepts_invalid_certs,
        }
    }

    /// The underlying HTTP client, for requests the typed helpers do not cover.
    pub fn http(&self) -> &surf::Client {
        &self.http
    }

    pub fn codecs(&self) -> &CodecResolver {
        &self.codecs
    }

    /// The mode this client was requested with.
    pub fn mode(&self) -> TlsMode {
        self.mode
    }

    /// Whether certificate and hostname verification is actually disabled.
    ///
    /// `false` for a permissive client whose TLS override could not be set up; such a
    /// client still verifies certificates.
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accepts_invalid_certs
    }

    /// Encode `value` as a JSON request body.
    pub fn request_body<T: JsonModel>(&self, value: &T) -> Result<Body, TransportError> {
        let mut body = Body::from_string(self.codecs.encode(value)?);
        body.set_mime(mime::JSON);
        Ok(body)
    }

    pub async fn get<T: JsonModel>(&self, url: &str) -> Result<T, TransportError> {
        let mut res = self.http.get(url).await.context(ClientError)?;
        response_body(&self.codecs, &mut res).await
    }

    pub async fn post<B: JsonModel, T: JsonModel>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let body = self.request_body(body)?;
        let mut res = self.http.post(url).body(body).await.context(ClientError)?;
        response_body(&self.codecs, &mut res).await
    }

    pub async fn put<B: JsonModel, T: JsonModel>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let body = self.request_body(body)?;
        let mut res = self.http.put(url).body(body).await.context(ClientError)?;
        response_body(&self.codecs, &mut res).await
    }

    pub async fn delete(&self, url: &str) -> Result<(), TransportError> {
        self.http.delete(url).await.context(ClientError)?;
        Ok(())
    }
}

/// Deserialize the body of a response.
///
/// The Content-Type header must be JSON if it is present; a response without one is decoded
/// as JSON. The codec is picked by `codecs` from the target type.
pub async fn response_body<T: JsonModel>(
    codecs: &CodecResolver,
    res: &mut Response,
) -> Result<T, TransportError> {
    let content_type = res.header(CONTENT_TYPE).map(|value| value.as_str().to_string());
    if let Some(content_type) = content_type {
        if !is_json(&content_type) {
            return UnsupportedContentTypeSnafu { content_type }.fail();
        }
    }
    let body = res.body_string().await.context(ClientError)?;
    codecs.decode(&body)
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn build<F, E>(mode: TlsMode, make_tls: F) -> TransportClient
where
    F: FnOnce() -> Result<TlsConnector, E>,
    E: Display,
{
    let (http, accepts_invalid_certs) = http_client(mode, make_tls);
    event!(
        Level::DEBUG,
        "built {} transport client {{accepts_invalid_certs: {}}}",
        mode,
        accepts_invalid_certs,
    );
    TransportClient::new(with_middleware(http), mode, accepts_invalid_certs)
}

/// The bare HTTP client for `mode`, and whether its TLS override is active.
///
/// A permissive client whose TLS override fails is still returned, with verification left
/// on. The failure is logged, never propagated.
fn http_client<F, E>(mode: TlsMode, make_tls: F) -> (surf::Client, bool)
where
    F: FnOnce() -> Result<TlsConnector, E>,
    E: Display,
{
    match mode {
        TlsMode::Strict => (surf::Client::new(), false),
        TlsMode::Permissive => match permissive_http_client(make_tls) {
            Ok(http) => (http, true),
            Err(err) => {
                event!(
                    Level::WARN,
                    "insecure TLS was requested but could not be configured, \
                     certificates will be verified: {}",
                    err
                );
                (surf::Client::new(), false)
            }
        },
    }
}

fn permissive_http_client<F, E>(make_tls: F) -> Result<surf::Client, String>
where
    F: FnOnce() -> Result<TlsConnector, E>,
    E: Display,
{
    let connector = make_tls().map_err(|err| err.to_string())?;
    let http: Result<surf::Client, _> = surf::Config::new()
        .set_tls_config(Some(Arc::new(connector)))
        .try_into();
    http.map_err(|err| format!("{}", err))
}

fn with_middleware(http: surf::Client) -> surf::Client {
    http.with(filter::trace)
        .with(filter::strip_content_headers)
        .with(filter::parse_error_body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Flavor;
    use futures::future::BoxFuture;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use surf::http::headers::{CONTENT_ENCODING, CONTENT_LANGUAGE};
    use surf::{middleware::Next, Client, Request, StatusCode};

    const URL: &str = "http://compute.test/v2.1/flavors";

    fn respond(status: StatusCode, body: Body) -> surf::Result<Response> {
        let mut res = surf::http::Response::new(status);
        res.set_body(body);
        Ok(Response::from(res))
    }

    // Terminal middleware: report which headers arrived instead of going to the network.
    fn echo_headers(
        req: Request,
        _client: Client,
        _next: Next<'_>,
    ) -> BoxFuture<'_, surf::Result<Response>> {
        Box::pin(async move {
            let seen = json!({
                "content_language": req.header(CONTENT_LANGUAGE).is_some(),
                "content_encoding": req.header(CONTENT_ENCODING).is_some(),
                "auth_token": req.header("X-Auth-Token").map(|value| value.as_str().to_string()),
            });
            respond(StatusCode::Ok, Body::from_json(&seen)?)
        })
    }

    fn echo_body(
        mut req: Request,
        _client: Client,
        _next: Next<'_>,
    ) -> BoxFuture<'_, surf::Result<Response>> {
        Box::pin(async move { respond(StatusCode::Ok, req.take_body()) })
    }

    fn not_found(
        _req: Request,
        _client: Client,
        _next: Next<'_>,
    ) -> BoxFuture<'_, surf::Result<Response>> {
        Box::pin(async move {
            respond(
                StatusCode::NotFound,
                Body::from_json(&json!({
                    "itemNotFound": { "message": "Flavor 42 could not be found.", "code": 404 }
                }))?,
            )
        })
    }

    // Terminal middleware: fail the way surf does when no response arrives.
    fn unreachable(
        _req: Request,
        _client: Client,
        _next: Next<'_>,
    ) -> BoxFuture<'_, surf::Result<Response>> {
        Box::pin(async move {
            Err(surf::Error::from_str(
                StatusCode::BadRequest,
                "Connection refused (os error 111)",
            ))
        })
    }

    fn html(
        _req: Request,
        _client: Client,
        _next: Next<'_>,
    ) -> BoxFuture<'_, surf::Result<Response>> {
        Box::pin(async move {
            let mut body = Body::from_string("<html></html>".to_string());
            body.set_mime(mime::HTML);
            respond(StatusCode::Ok, body)
        })
    }

    fn offline<M: surf::middleware::Middleware>(terminal: M) -> TransportClient {
        let (http, accepts_invalid_certs) = http_client(TlsMode::Strict, tls::permissive_connector);
        TransportClient::new(
            with_middleware(http).with(terminal),
            TlsMode::Strict,
            accepts_invalid_certs,
        )
    }

    #[test]
    fn clients_are_cached_per_mode() {
        assert!(std::ptr::eq(get_client(false), get_client(false)));
        assert!(std::ptr::eq(get_client(true), get_client(true)));
        assert!(!std::ptr::eq(get_client(false), get_client(true)));
        assert!(std::ptr::eq(
            client_for(&Config::new().with_insecure_tls(true)),
            get_client(true)
        ));
        assert_eq!(get_client(false).mode(), TlsMode::Strict);
        assert_eq!(get_client(true).mode(), TlsMode::Permissive);
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        const CALLERS: usize = 16;
        static CELL: OnceLock<TransportClient> = OnceLock::new();
        static BUILDS: AtomicUsize = AtomicUsize::new(0);

        let barrier = Arc::new(Barrier::new(CALLERS));
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let client = cached(&CELL, || {
                        BUILDS.fetch_add(1, Ordering::SeqCst);
                        // Widen the race window for the other callers.
                        thread::sleep(Duration::from_millis(20));
                        build(TlsMode::Strict, tls::permissive_connector)
                    });
                    client as *const TransportClient as usize
                })
            })
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.iter().all(|address| *address == addresses[0]));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn strict_client_verifies_certificates() {
        assert!(!get_client(false).accepts_invalid_certs());
    }

    #[test]
    fn permissive_client_accepts_invalid_certificates() {
        assert!(get_client(true).accepts_invalid_certs());
    }

    #[test]
    fn tls_failure_degrades_to_verifying_client() {
        let client = build(TlsMode::Permissive, || {
            Err::<TlsConnector, _>("security provider rejected the TLS context")
        });
        assert_eq!(client.mode(), TlsMode::Permissive);
        assert!(!client.accepts_invalid_certs());
    }

    #[test]
    fn content_type_detection() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/openstack-images-v2.1-json-patch+json"));
        assert!(!is_json("text/html"));
    }

    #[async_std::test]
    async fn content_headers_are_stripped() {
        let client = offline(echo_headers);
        let seen: Value = client
            .http()
            .get(URL)
            .header(CONTENT_LANGUAGE, "en-US")
            .header(CONTENT_ENCODING, "gzip")
            .header("X-Auth-Token", "secret")
            .recv_json()
            .await
            .unwrap();
        assert_eq!(
            seen,
            json!({ "content_language": false, "content_encoding": false, "auth_token": "secret" })
        );
    }

    #[async_std::test]
    async fn requests_without_content_headers_pass_through() {
        let seen: Value = offline(echo_headers).get(URL).await.unwrap();
        assert_eq!(seen["content_language"], false);
        assert_eq!(seen["content_encoding"], false);
    }

    #[async_std::test]
    async fn typed_round_trip_uses_root_wrapped_codec() {
        let flavor = Flavor::builder().name("m1.tiny").ram(512).vcpus(1).build();
        let client = offline(echo_body);

        let echoed: Value = client.post(URL, &flavor).await.unwrap();
        assert_eq!(echoed["flavor"]["name"], "m1.tiny");

        let echoed: Flavor = client.put(URL, &flavor).await.unwrap();
        assert_eq!(echoed, flavor);
    }

    #[async_std::test]
    async fn error_statuses_become_http_errors() {
        let err = offline(not_found).get::<Flavor>(URL).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("Flavor 42 could not be found."));

        let err = offline(not_found).delete(URL).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[async_std::test]
    async fn failures_without_a_response_carry_no_status() {
        let err = offline(unreachable).get::<Flavor>(URL).await.unwrap_err();
        assert_eq!(err.status(), None);
        assert!(matches!(err, TransportError::Transport { .. }));
        assert!(err.to_string().contains("Connection refused"));

        let err = offline(unreachable).delete(URL).await.unwrap_err();
        assert!(matches!(err, TransportError::Transport { .. }));
    }

    #[async_std::test]
    async fn non_json_responses_are_rejected() {
        let err = offline(html).get::<Flavor>(URL).await.unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedContentType { .. }));
    }
}
