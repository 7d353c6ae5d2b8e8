//! Serde helpers for statistics that can be undefined.
//!
//! JSON has no NaN or infinity and serde_json writes both as `null`. Fields
//! that may hold a non-finite value read `null` back as NaN.

use serde::{Deserialize, Deserializer};

pub(crate) fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
