// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! JSON codec selection.
//!
//! Every request and response body goes through one of two codec configurations. The
//! plain codec maps a value's fields to the top level of the document. The root-wrapped
//! codec nests them under a single key, so a flavor travels as `{"flavor": {...}}`.
//! Which one applies is decided by the type itself through [JsonModel::ROOT_NAME].
//!
//! Both configurations omit `null` fields and pretty-print their output. Decoding is
//! lenient: models never deny unknown fields, so schema drift on the server does not break
//! parsing, and sequence fields use [crate::de::one_or_many] to tolerate a single value.

use crate::error::{DecodeSnafu, EncodeSnafu, MissingRootSnafu, TransportError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use snafu::{OptionExt, ResultExt};

/// A type that travels as a JSON request or response body.
pub trait JsonModel: Serialize + DeserializeOwned {
    /// Key under which the payload is nested on the wire, or `None` for a top-level object.
    const ROOT_NAME: Option<&'static str> = None;
}

impl JsonModel for Value {}

/// The root name of `T`, if it declares a usable one.
///
/// A blank root name cannot be used as a key and is treated as no root name.
pub fn root_name<T: JsonModel>() -> Option<&'static str> {
    T::ROOT_NAME.filter(|name| !name.trim().is_empty())
}

/// One JSON codec configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonCodec {
    omit_nulls: bool,
    pretty: bool,
    wrap_root: bool,
}

impl JsonCodec {
    /// Fields at the top level of the document.
    pub const fn plain() -> Self {
        Self {
            omit_nulls: true,
            pretty: true,
            wrap_root: false,
        }
    }

    /// Fields nested under the type's root name.
    pub const fn root_wrapped() -> Self {
        Self {
            wrap_root: true,
            ..Self::plain()
        }
    }

    pub fn wraps_root(&self) -> bool {
        self.wrap_root
    }

    pub fn to_value<T: JsonModel>(&self, value: &T) -> Result<Value, TransportError> {
        let mut json = serde_json::to_value(value).context(EncodeSnafu)?;
        if self.omit_nulls {
            prune_nulls(&mut json);
        }
        Ok(match self.root::<T>() {
            Some(root) => {
                let mut wrapper = Map::with_capacity(1);
                wrapper.insert(root.to_string(), json);
                Value::Object(wrapper)
            }
            None => json,
        })
    }

    pub fn encode<T: JsonModel>(&self, value: &T) -> Result<String, TransportError> {
        let json = self.to_value(value)?;
        if self.pretty {
            serde_json::to_string_pretty(&json).context(EncodeSnafu)
        } else {
            serde_json::to_string(&json).context(EncodeSnafu)
        }
    }

    pub fn from_value<T: JsonModel>(&self, json: Value) -> Result<T, TransportError> {
        let json = match self.root::<T>() {
            Some(root) => match json {
                Value::Object(mut fields) => fields
                    .remove(root)
                    .context(MissingRootSnafu { root })?,
                _ => return MissingRootSnafu { root }.fail(),
            },
            None => json,
        };
        serde_json::from_value(json).context(DecodeSnafu)
    }

    pub fn decode<T: JsonModel>(&self, body: &str) -> Result<T, TransportError> {
        let json = serde_json::from_str(body).context(DecodeSnafu)?;
        self.from_value(json)
    }

    fn root<T: JsonModel>(&self) -> Option<&'static str> {
        if self.wrap_root {
            root_name::<T>()
        } else {
            None
        }
    }
}

/// Picks the codec configuration for each serialized type.
///
/// Holds one instance of each configuration and is a pure function of the type's
/// declared root name, so it can be shared between concurrent requests.
#[derive(Clone, Debug)]
pub struct CodecResolver {
    plain: JsonCodec,
    root_wrapped: JsonCodec,
}

impl Default for CodecResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecResolver {
    pub fn new() -> Self {
        Self {
            plain: JsonCodec::plain(),
            root_wrapped: JsonCodec::root_wrapped(),
        }
    }

    /// The root-wrapped codec if `T` declares a root name, the plain codec otherwise.
    pub fn resolve<T: JsonModel>(&self) -> &JsonCodec {
        match root_name::<T>() {
            Some(_) => &self.root_wrapped,
            None => &self.plain,
        }
    }

    pub fn encode<T: JsonModel>(&self, value: &T) -> Result<String, TransportError> {
        self.resolve::<T>().encode(value)
    }

    pub fn decode<T: JsonModel>(&self, body: &str) -> Result<T, TransportError> {
        self.resolve::<T>().decode(body)
    }
}

fn prune_nulls(json: &mut Value) {
    match json {
        Value::Object(fields) => {
            *fields = std::mem::take(fields)
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect();
            fields.values_mut().for_each(prune_nulls);
        }
        Value::Array(values) => values.iter_mut().for_each(prune_nulls),
        _ => {}
    }
}
