// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Middleware registered on every [crate::TransportClient].

use crate::error::ApiFault;
use futures::future::BoxFuture;
use serde_json::Value;
use surf::http::headers::{CONTENT_ENCODING, CONTENT_LANGUAGE};
use surf::{middleware::Next, Client, Request, Response};
use tracing::{event, Level};

/// Client middleware which strips headers that must never reach the API.
///
/// `Content-Language` and `Content-Encoding` are removed from every outgoing request,
/// whoever set them. A request without them passes through untouched.
pub fn strip_content_headers(
    mut req: Request,
    client: Client,
    next: Next<'_>,
) -> BoxFuture<'_, surf::Result<Response>> {
    req.remove_header(CONTENT_LANGUAGE);
    req.remove_header(CONTENT_ENCODING);
    next.run(req, client)
}

/// Turn a response with a non-success status into an error.
///
/// The message of the error is taken from the API fault body when there is one, otherwise
/// the raw body (or the status reason, for an empty body) is used.
pub async fn response_to_result(mut res: Response) -> surf::Result<Response> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        let body = res.body_string().await.unwrap_or_default();
        let message =
            fault_message(&body).unwrap_or_else(|| match body.trim() {
                "" => status.canonical_reason().to_string(),
                raw => raw.to_string(),
            });
        Err(surf::Error::new(
            status,
            ApiFault {
                status: u16::from(status),
                message,
            },
        ))
    }
}

/// Client middleware which turns responses with non-success statuses into errors.
///
/// Successful (2xx) responses are passed through unchanged. Everything else becomes a
/// [surf::Error] wrapping an [ApiFault], which [crate::error::ClientError] lifts into
/// [crate::TransportError::Http].
///
/// If the request fails without producing a response at all, the [surf::Error] from the failed
/// request is passed through.
pub fn parse_error_body(
    req: Request,
    client: Client,
    next: Next<'_>,
) -> BoxFuture<'_, surf::Result<Response>> {
    Box::pin(async move {
        let res = next.run(req, client).await?;
        response_to_result(res).await
    })
}

/// Client middleware which logs requests and responses.
pub fn trace(req: Request, client: Client, next: Next<'_>) -> BoxFuture<'_, surf::Result<Response>> {
    Box::pin(async move {
        let method = req.method();
        let url = req.url().to_string();
        event!(Level::DEBUG, "--> sending request {{method: {}, url: {}}}", method, url);
        let res = next.run(req, client).await;
        match &res {
            Ok(res) => event!(
                Level::DEBUG,
                "<-- received response {{method: {}, url: {}, status: {}}}",
                method,
                url,
                res.status(),
            ),
            Err(err) => event!(
                Level::WARN,
                "<-- request failed {{method: {}, url: {}, status: {}, error: {}}}",
                method,
                url,
                err.status(),
                err,
            ),
        }
        res
    })
}

/// Extract the message of an API fault body.
///
/// Faults come either as `{"<faultName>": {"message": "...", "code": 404}}` or with the
/// message at the top level.
pub fn fault_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let fields = json.as_object()?;
    if let Some(message) = fields.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    fields
        .values()
        .filter_map(|fault| fault.get("message").and_then(Value::as_str))
        .next()
        .map(str::to_string)
}
