// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use snafu::{IntoError, Snafu};
use std::fmt::{self, Display, Formatter};

/// Errors produced while encoding, sending, or decoding a request.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("failed to encode request body: {}", source))]
    Encode { source: serde_json::Error },

    #[snafu(display("failed to decode response body: {}", source))]
    Decode { source: serde_json::Error },

    /// A root-wrapped payload did not contain its declared root key.
    #[snafu(display("response body has no root element {:?}", root))]
    MissingRoot { root: String },

    #[snafu(display("unsupported content type {}", content_type))]
    UnsupportedContentType { content_type: String },

    /// The server answered with a non-success status.
    #[snafu(display("HTTP {}: {}", status, message))]
    Http { status: u16, message: String },

    /// The request failed before any response arrived, e.g. a refused connection or a
    /// rejected TLS handshake.
    #[snafu(display("request failed: {}", message))]
    Transport { message: String },
}

impl TransportError {
    /// The HTTP status carried by this error, if it came from the transport.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A non-success response, as reported by the `parse_error_body` middleware.
///
/// Travels inside a [surf::Error] so [ClientError] can tell it apart from errors raised
/// before a response existed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiFault {
    pub status: u16,
    pub message: String,
}

impl Display for ApiFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiFault {}

/// Context for embedding network client errors into [TransportError].
///
/// This type implements the [IntoError] trait from SNAFU, so it can be used with
/// [snafu::ResultExt::context] just like automatically generated SNAFU contexts.
///
/// Calling `some_result.context(ClientError)` downcasts the [surf::Error]. An [ApiFault]
/// becomes [TransportError::Http] with the status the server sent. Anything else never got
/// a response and becomes [TransportError::Transport], whatever status surf attached to it.
pub struct ClientError;

impl IntoError<TransportError> for ClientError {
    type Source = surf::Error;

    fn into_error(self, source: Self::Source) -> TransportError {
        match source.downcast::<ApiFault>() {
            Ok(fault) => TransportError::Http {
                status: fault.status,
                message: fault.message,
            },
            Err(err) => TransportError::Transport {
                message: err.to_string(),
            },
        }
    }
}
