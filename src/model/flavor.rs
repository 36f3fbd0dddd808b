// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use super::Link;
use crate::codec::JsonModel;
use crate::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display, Formatter};

const DEFAULT_RXTX_FACTOR: f32 = 1.0;

/// A compute flavor: the hardware template instances are launched from.
///
/// Unset numeric fields read as 0, an unset public flag reads as `true` and an unset
/// disabled flag reads as `false`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ram: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vcpus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    disk: Option<u32>,
    #[serde(
        rename = "OS-FLV-EXT-DATA:ephemeral",
        default,
        deserialize_with = "de::null_as_default"
    )]
    ephemeral: u32,
    // Reported as "" when the flavor has no swap.
    #[serde(default, deserialize_with = "de::lenient_u32")]
    swap: u32,
    #[serde(default = "default_rxtx_factor", deserialize_with = "rxtx_factor_or_default")]
    rxtx_factor: f32,
    #[serde(
        rename = "OS-FLV-DISABLED:disabled",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rxtx_quota: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rxtx_cap: Option<u32>,
    #[serde(
        rename = "os-flavor-access:is_public",
        default = "default_is_public",
        deserialize_with = "is_public_or_default"
    )]
    is_public: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::one_or_many"
    )]
    links: Option<Vec<Link>>,
}

fn default_rxtx_factor() -> f32 {
    DEFAULT_RXTX_FACTOR
}

fn default_is_public() -> bool {
    true
}

fn rxtx_factor_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(DEFAULT_RXTX_FACTOR))
}

fn is_public_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

impl Default for Flavor {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            ram: None,
            vcpus: None,
            disk: None,
            ephemeral: 0,
            swap: 0,
            rxtx_factor: DEFAULT_RXTX_FACTOR,
            disabled: None,
            rxtx_quota: None,
            rxtx_cap: None,
            is_public: true,
            links: None,
        }
    }
}

impl JsonModel for Flavor {
    const ROOT_NAME: Option<&'static str> = Some("flavor");
}

impl Flavor {
    pub fn builder() -> FlavorBuilder {
        FlavorBuilder::default()
    }

    /// A builder seeded with a copy of this flavor.
    pub fn to_builder(&self) -> FlavorBuilder {
        FlavorBuilder::default().from(self)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Memory in MiB.
    pub fn ram(&self) -> u32 {
        self.ram.unwrap_or(0)
    }

    pub fn vcpus(&self) -> u32 {
        self.vcpus.unwrap_or(0)
    }

    /// Root disk size in GiB.
    pub fn disk(&self) -> u32 {
        self.disk.unwrap_or(0)
    }

    /// Ephemeral disk size in GiB.
    pub fn ephemeral(&self) -> u32 {
        self.ephemeral
    }

    /// Swap size in MiB.
    pub fn swap(&self) -> u32 {
        self.swap
    }

    pub fn rxtx_factor(&self) -> f32 {
        self.rxtx_factor
    }

    pub fn rxtx_quota(&self) -> u32 {
        self.rxtx_quota.unwrap_or(0)
    }

    pub fn rxtx_cap(&self) -> u32 {
        self.rxtx_cap.unwrap_or(0)
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    pub fn links(&self) -> &[Link] {
        self.links.as_deref().unwrap_or(&[])
    }
}

impl Display for Flavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        super::fmt_as_json(self, f)
    }
}

/// Fluent construction of a [Flavor].
///
/// The builder owns its working record, so nothing built earlier can change through it.
#[derive(Clone, Debug, Default)]
pub struct FlavorBuilder {
    m: Flavor,
}

impl FlavorBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.m.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.m.name = Some(name.into());
        self
    }

    pub fn ram(mut self, ram: u32) -> Self {
        self.m.ram = Some(ram);
        self
    }

    pub fn vcpus(mut self, vcpus: u32) -> Self {
        self.m.vcpus = Some(vcpus);
        self
    }

    pub fn disk(mut self, disk: u32) -> Self {
        self.m.disk = Some(disk);
        self
    }

    pub fn ephemeral(mut self, ephemeral: u32) -> Self {
        self.m.ephemeral = ephemeral;
        self
    }

    pub fn swap(mut self, swap: u32) -> Self {
        self.m.swap = swap;
        self
    }

    pub fn rxtx_factor(mut self, rxtx_factor: f32) -> Self {
        self.m.rxtx_factor = rxtx_factor;
        self
    }

    pub fn is_public(mut self, is_public: bool) -> Self {
        self.m.is_public = is_public;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.m.disabled = Some(disabled);
        self
    }

    pub fn link(mut self, link: Link) -> Self {
        self.m.links.get_or_insert_with(Vec::new).push(link);
        self
    }

    /// Replace the working record with a copy of `flavor`.
    ///
    /// Every field is replaced, including those set on this builder earlier.
    pub fn from(mut self, flavor: &Flavor) -> Self {
        self.m = flavor.clone();
        self
    }

    pub fn build(self) -> Flavor {
        self.m
    }
}

/// The body of a flavor listing, `{"flavors": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Flavors {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::one_or_many"
    )]
    flavors: Option<Vec<Flavor>>,
}

impl JsonModel for Flavors {}

impl Flavors {
    pub fn flavors(&self) -> &[Flavor] {
        self.flavors.as_deref().unwrap_or(&[])
    }

    pub fn into_vec(self) -> Vec<Flavor> {
        self.flavors.unwrap_or_default()
    }
}

impl From<Vec<Flavor>> for Flavors {
    fn from(flavors: Vec<Flavor>) -> Self {
        Self {
            flavors: Some(flavors),
        }
    }
}
