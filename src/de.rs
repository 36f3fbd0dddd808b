// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Stack Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Lenient `deserialize_with` helpers shared by the model types.
//!
//! Cloud APIs drift between releases: a field documented as a list sometimes arrives as a
//! single object, integers arrive as `null` or `""`. These helpers absorb that drift so a
//! response still decodes.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::convert::TryFrom;

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Accept either a sequence or a single value where a sequence is declared.
///
/// A single value becomes a one-element sequence and `null` becomes `None`.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(
        Option::<OneOrMany<T>>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::Many(values) => values,
            OneOrMany::One(value) => vec![value],
        }),
    )
}

/// Treat an explicit `null` as the type's default value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseInt {
    Int(i64),
    Text(String),
}

/// Accept an integer, `null`, an empty string, or a numeric string.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<LooseInt>::deserialize(deserializer)? {
        None => return Ok(0),
        Some(LooseInt::Int(value)) => value,
        Some(LooseInt::Text(text)) if text.trim().is_empty() => return Ok(0),
        Some(LooseInt::Text(text)) => text.trim().parse::<i64>().map_err(|_| {
            de::Error::invalid_value(de::Unexpected::Str(&text), &"an unsigned integer")
        })?,
    };
    u32::try_from(value).map_err(|_| {
        de::Error::invalid_value(de::Unexpected::Signed(value), &"an unsigned 32-bit integer")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "one_or_many")]
        tags: Option<Vec<String>>,
        #[serde(default, deserialize_with = "null_as_default")]
        count: i32,
        #[serde(default, deserialize_with = "lenient_u32")]
        swap: u32,
    }

    fn sample(value: serde_json::Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_value_becomes_one_element_sequence() {
        let s = sample(json!({ "tags": "gpu" }));
        assert_eq!(s.tags, Some(vec!["gpu".to_string()]));
    }

    #[test]
    fn sequence_is_kept() {
        let s = sample(json!({ "tags": ["a", "b"] }));
        assert_eq!(s.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn missing_and_null_fields_use_defaults() {
        let s = sample(json!({ "tags": null, "count": null, "swap": null }));
        assert_eq!(s.tags, None);
        assert_eq!(s.count, 0);
        assert_eq!(s.swap, 0);

        let s = sample(json!({}));
        assert_eq!(s.tags, None);
        assert_eq!(s.count, 0);
        assert_eq!(s.swap, 0);
    }

    #[test]
    fn swap_accepts_strings() {
        assert_eq!(sample(json!({ "swap": "" })).swap, 0);
        assert_eq!(sample(json!({ "swap": "512" })).swap, 512);
        assert_eq!(sample(json!({ "swap": 1024 })).swap, 1024);
    }

    #[test]
    fn swap_rejects_garbage() {
        assert!(serde_json::from_value::<Sample>(json!({ "swap": "lots" })).is_err());
        assert!(serde_json::from_value::<Sample>(json!({ "swap": -1 })).is_err());
    }
}
