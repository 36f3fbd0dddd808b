// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # HTTP transport and JSON codecs for OpenStack web APIs.
//!
//! Higher layers of the library obtain their HTTP client from [get_client]. There are two
//! clients per process, built lazily and shared: a strict one which verifies TLS certificates
//! and hostnames, and a permissive one which accepts any certificate and any hostname, for
//! test and self-signed endpoints. Both carry the same `surf` middleware (see [filter]):
//! request tracing, removal of the `Content-Language` and `Content-Encoding` headers, and
//! conversion of error responses into errors.
//!
//! Request and response bodies are JSON. Each body type implements [JsonModel] and declares
//! whether it travels wrapped under a root key, e.g. `{"flavor": {...}}`, or with its fields
//! at the top level. The [CodecResolver] reads that declaration to pick the codec. Decoding is
//! lenient: unknown fields are ignored and, where the model asks for it, a single value is
//! accepted where a sequence is expected (see [de]).
//!
//! The permissive client only affects itself. Disabling TLS verification for the rest of the
//! process is a separate, explicit call: [tls::install_permissive_process_default].

pub mod client;
pub mod codec;
pub mod config;
pub mod de;
pub mod error;
pub mod filter;
pub mod model;
pub mod tls;

pub use client::{client, client_for, get_client, TransportClient};
pub use codec::{CodecResolver, JsonCodec, JsonModel};
pub use config::{Config, TlsMode};
pub use error::*;
