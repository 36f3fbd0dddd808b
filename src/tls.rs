// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! TLS trust overrides.
//!
//! Two separate operations live here:
//!
//! * [permissive_connector] builds a connector which accepts any certificate chain and any
//!   hostname. It is scoped to the client it is handed to.
//! * [install_process_default] and friends manage a process-wide default connector which
//!   other TLS-capable components may pick up through [process_default].
//!
//! Building a [crate::TransportClient] never touches the process-wide default. A caller that
//! wants every TLS connection in the process to skip verification must say so by calling
//! [install_permissive_process_default]. That affects the entire process, not one client,
//! and should only ever be done against test or self-signed endpoints.

use async_native_tls::TlsConnector;
use std::sync::{PoisonError, RwLock};
use tracing::{event, Level};

static PROCESS_DEFAULT: RwLock<Option<native_tls::TlsConnector>> = RwLock::new(None);

fn permissive_native_connector() -> Result<native_tls::TlsConnector, native_tls::Error> {
    native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
}

/// A connector which skips certificate and hostname verification.
///
/// The underlying TLS provider is asked to build the same configuration up front, so a
/// provider which rejects it fails here instead of on the first connection.
pub fn permissive_connector() -> Result<TlsConnector, native_tls::Error> {
    permissive_native_connector()?;
    Ok(TlsConnector::new()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true))
}

/// Replace the process-wide default TLS connector.
///
/// Every component created afterwards that consults [process_default] inherits `connector`.
pub fn install_process_default(connector: native_tls::TlsConnector) {
    *PROCESS_DEFAULT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(connector);
}

/// Make the process-wide default TLS connector accept any certificate and any hostname.
///
/// This disables TLS verification for every component in the process which consults
/// [process_default].
pub fn install_permissive_process_default() -> Result<(), native_tls::Error> {
    let connector = permissive_native_connector()?;
    event!(
        Level::WARN,
        "installing a process-wide TLS default which accepts any certificate and hostname"
    );
    install_process_default(connector);
    Ok(())
}

/// The process-wide default TLS connector, if one was installed.
pub fn process_default() -> Option<native_tls::TlsConnector> {
    PROCESS_DEFAULT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Remove the process-wide default TLS connector.
pub fn clear_process_default() {
    PROCESS_DEFAULT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_connector_builds() {
        assert!(permissive_connector().is_ok());
    }

    // The default is process-global, so every step that touches it runs in one test.
    #[test]
    fn process_default_is_explicit() {
        clear_process_default();
        assert!(process_default().is_none());

        permissive_connector().unwrap();
        assert!(process_default().is_none());

        install_permissive_process_default().unwrap();
        assert!(process_default().is_some());

        clear_process_default();
        assert!(process_default().is_none());
    }
}
