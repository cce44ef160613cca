//! Canonical serialization and hashing of completed traces
//!
//! A fingerprint is the Keccak-256 digest of the compact JSON text of a trace,
//! hex-encoded with a `0x` prefix. The JSON text matches what a browser's
//! `JSON.stringify` produces for the same values, so a trace hashed here and a
//! trace hashed in a webview agree byte for byte.

use crate::error::GestureResult;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use sha3::{Digest, Keccak256};
use std::fmt;

/// Largest integer an IEEE double represents exactly (`Number.MAX_SAFE_INTEGER`)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Hex-encoded digest identifying one completed gesture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash raw bytes
    pub fn of_bytes(data: &[u8]) -> Self {
        let digest = Keccak256::digest(data);
        Self(format!("0x{}", hex::encode(digest)))
    }

    /// Serialize a trace canonically and hash the result
    pub fn of_trace<T: Serialize + ?Sized>(trace: &T) -> GestureResult<Self> {
        let text = canonical_json(trace)?;
        tracing::debug!("Fingerprint input: {}", text);
        Ok(Self::of_bytes(text.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compact, order-preserving JSON text of a trace
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> GestureResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Write a coordinate the way `JSON.stringify` does
///
/// Integral values lose their fractional part (`10`, `-0` becomes `0`);
/// everything else follows ECMAScript `Number::toString`. Non-finite values
/// become `null`, as in a browser.
pub fn serialize_js_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return serializer.serialize_unit();
    }
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return serializer.serialize_i64(*value as i64);
    }
    let raw = RawValue::from_string(js_number_text(*value)).map_err(S::Error::custom)?;
    raw.serialize(serializer)
}

/// ECMAScript `Number::toString` for a finite value
///
/// Decimal notation while the decimal exponent lies in `(-7, 21)`, exponent
/// notation with an explicit sign otherwise.
pub fn js_number_text(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    // Shortest round-trip digits, e.g. "1.5e-6".
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat(-n as usize), digits)
    } else {
        let sign = if n > 0 { '+' } else { '-' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", lead, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", lead, rest, sign, (n - 1).abs())
        }
    };

    if value < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}
