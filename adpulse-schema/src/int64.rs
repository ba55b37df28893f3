//! Google's JSON mapping encodes `int64` fields as strings; some proxies and fixtures send
//! plain numbers. Both shapes are accepted here.

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Lax {
    Str(String),
    Int(i64),
    Float(f64),
}

fn lax_to_i64<E: serde::de::Error>(v: Lax) -> Result<i64, E> {
    match v {
        Lax::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| E::custom(format!("invalid int64 string {s:?}: {e}"))),
        Lax::Int(n) => Ok(n),
        #[allow(clippy::cast_possible_truncation)]
        Lax::Float(f) if f.fract() == 0.0 => Ok(f as i64),
        Lax::Float(f) => Err(E::custom(format!("expected integral int64, got {f}"))),
    }
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    lax_to_i64(Lax::deserialize(deserializer)?)
}

pub(crate) fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub(crate) mod option {
    use super::{Lax, lax_to_i64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Lax>::deserialize(deserializer)?
            .map(lax_to_i64)
            .transpose()
    }

    #[allow(clippy::ref_option)]
    pub(crate) fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }
}
