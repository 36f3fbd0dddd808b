// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The type of a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkType {
    Local,
    Flat,
    Vlan,
    Gre,
}

impl NetworkType {
    pub const ALL: [NetworkType; 4] = [
        NetworkType::Local,
        NetworkType::Flat,
        NetworkType::Vlan,
        NetworkType::Gre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Local => "local",
            NetworkType::Flat => "flat",
            NetworkType::Vlan => "vlan",
            NetworkType::Gre => "gre",
        }
    }

    /// Case-insensitive lookup. `None` for a value no variant matches.
    pub fn for_value(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// `deserialize_with` helper for `Option<NetworkType>` fields: an unknown or `null`
    /// wire value becomes `None` instead of failing the whole payload.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Self>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?
            .as_deref()
            .and_then(Self::for_value))
    }
}

impl Display for NetworkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_value(s).ok_or_else(|| format!("unknown network type {:?}", s))
    }
}

impl Serialize for NetworkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NetworkType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Network {
        #[serde(
            default,
            rename = "provider:network_type",
            deserialize_with = "NetworkType::deserialize_lenient"
        )]
        network_type: Option<NetworkType>,
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_value(NetworkType::Vlan).unwrap(), json!("vlan"));
        assert_eq!(NetworkType::Gre.to_string(), "gre");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(NetworkType::for_value("FLAT"), Some(NetworkType::Flat));
        assert_eq!("Local".parse::<NetworkType>(), Ok(NetworkType::Local));
        assert_eq!(
            serde_json::from_value::<NetworkType>(json!("GRE")).unwrap(),
            NetworkType::Gre
        );
    }

    #[test]
    fn unknown_values() {
        assert_eq!(NetworkType::for_value("vxlan"), None);
        assert!(serde_json::from_value::<NetworkType>(json!("vxlan")).is_err());

        let network: Network =
            serde_json::from_value(json!({ "provider:network_type": "vxlan" })).unwrap();
        assert_eq!(network.network_type, None);
        let network: Network =
            serde_json::from_value(json!({ "provider:network_type": "VLAN" })).unwrap();
        assert_eq!(network.network_type, Some(NetworkType::Vlan));
        let network: Network = serde_json::from_value(json!({})).unwrap();
        assert_eq!(network.network_type, None);
    }
}
