use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuccessBody {}

/// `round(part / total * 100)` as a whole percentage; 0 when `total` is 0.
pub fn completion_rate(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    (part as f64 / total as f64 * 100.0).round() as u32
}

/// Maps a present field to `Some`, so with `#[serde(default)]` an explicit `null` becomes
/// `Some(None)` while an absent field stays `None`.
pub fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `Option<DateTime<Utc>>` stored as an optional BSON datetime. Use with `#[serde(with)]`.
pub mod optional_bson_datetime {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(bson::DateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<bson::DateTime>::deserialize(deserializer)?;
        Ok(value.map(bson::DateTime::to_chrono))
    }
}
