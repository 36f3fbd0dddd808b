// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::fmt::{self, Display, Formatter};

/// Environment variable which asks for the permissive client.
pub const INSECURE_ENV: &str = "OS_INSECURE";

/// TLS behaviour of a [crate::TransportClient].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TlsMode {
    /// Certificates and hostnames are verified.
    Strict,
    /// Any certificate and any hostname is accepted.
    Permissive,
}

impl TlsMode {
    pub fn from_insecure(use_insecure_tls: bool) -> Self {
        if use_insecure_tls {
            TlsMode::Permissive
        } else {
            TlsMode::Strict
        }
    }
}

impl Display for TlsMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TlsMode::Strict => write!(f, "strict"),
            TlsMode::Permissive => write!(f, "permissive"),
        }
    }
}

/// Transport settings chosen by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    insecure_tls: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from the environment.
    ///
    /// `OS_INSECURE` set to `1`, `true`, `yes` or `on` selects the permissive client.
    pub fn from_env() -> Self {
        Self::from_insecure_var(std::env::var(INSECURE_ENV).ok().as_deref())
    }

    fn from_insecure_var(value: Option<&str>) -> Self {
        let insecure_tls = value
            .map(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(false);
        Self { insecure_tls }
    }

    pub fn with_insecure_tls(mut self, insecure_tls: bool) -> Self {
        self.insecure_tls = insecure_tls;
        self
    }

    pub fn insecure_tls(&self) -> bool {
        self.insecure_tls
    }

    pub fn tls_mode(&self) -> TlsMode {
        TlsMode::from_insecure(self.insecure_tls)
    }
}
