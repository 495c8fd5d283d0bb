//! JSON-RPC quantity handling.
//!
//! Nodes encode quantities as `0x`-prefixed hex strings. Some paymasters
//! return plain JSON numbers or decimal strings instead, so gas fields coming
//! back from sponsorship are parsed leniently.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::error::{EvmError, Result};

/// Parse a hex, decimal-string or numeric quantity.
pub fn parse_quantity(value: &Value) -> Option<U256> {
    match value {
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) if hex.is_empty() => Some(U256::ZERO),
            Some(hex) => U256::from_str_radix(hex, 16).ok(),
            None => U256::from_str_radix(s, 10).ok(),
        },
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    }
}

/// `deserialize_with` helper for [`parse_quantity`].
pub fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_quantity(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid quantity: {value}")))
}

pub fn quantity_to_u64(value: U256, field: &str) -> Result<u64> {
    value
        .try_into()
        .map_err(|_| EvmError::InvalidResponse(format!("{field} overflows u64")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_all_quantity_encodings() {
        assert_eq!(parse_quantity(&json!("0x1a")), Some(U256::from(26)));
        assert_eq!(parse_quantity(&json!("26")), Some(U256::from(26)));
        assert_eq!(parse_quantity(&json!(26)), Some(U256::from(26)));
        assert_eq!(parse_quantity(&json!("0x")), Some(U256::ZERO));
        assert_eq!(parse_quantity(&json!("zz")), None);
        assert_eq!(parse_quantity(&json!(null)), None);
    }
}
