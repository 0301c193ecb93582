//! Newtypes and parsers for output/digest identifiers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_lower_hex_len(s: &str, n: usize) -> bool {
    s.len() == n && is_lower_hex(s)
}

/// Strict "YYYY-MM-DDTHH:MM:SSZ" shape check (length 20).
pub fn is_ts_utc_z(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 20 { return false; }
    b.iter().enumerate().all(|(i, c)| match i {
        4 | 7 => *c == b'-',
        10 => *c == b'T',
        13 | 16 => *c == b':',
        19 => *c == b'Z',
        _ => c.is_ascii_digit(),
    })
}

/// 64-hex lowercase (digest/fingerprint).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Sha256(String);

impl Sha256 {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha256 {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_lower_hex_len(s, 64) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidHex) }
    }
}

/// FormulaId = 64-hex fingerprint of the canonical formula spec.
pub type FormulaId = Sha256;

/// "RES:" + 64-hex (lowercase)
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ResultId(String);

impl ResultId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResultId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("RES:").ok_or(CoreError::InvalidId)?;
        if is_lower_hex_len(rest, 64) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidId) }
    }
}

/// "RUN:" + "<YYYY-MM-DDTHH:MM:SSZ>" + ":" + 64-hex (lowercase)
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RunId(String);

impl RunId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("RUN:").ok_or(CoreError::InvalidId)?;
        let ts = rest.get(..20).ok_or(CoreError::InvalidId)?;
        if !is_ts_utc_z(ts) { return Err(CoreError::InvalidTimestamp); }
        let hash = rest[20..].strip_prefix(':').ok_or(CoreError::InvalidId)?;
        if !is_lower_hex_len(hash, 64) { return Err(CoreError::InvalidId); }
        Ok(Self(s.to_string()))
    }
}

macro_rules! parse_on_read {
    ($($name:ident),*) => {$(
        impl TryFrom<String> for $name {
            type Error = CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
        }
    )*};
}

parse_on_read!(Sha256, ResultId, RunId);

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn result_id_requires_prefix_and_hex() {
        assert!(format!("RES:{HEX}").parse::<ResultId>().is_ok());
        assert!(HEX.parse::<ResultId>().is_err());
        assert!(format!("RES:{}", HEX.to_uppercase()).parse::<ResultId>().is_err());
    }

    #[test]
    fn run_id_shape() {
        let ok = format!("RUN:2025-10-01T12:00:00Z:{HEX}");
        assert!(ok.parse::<RunId>().is_ok());
        let bad_ts = format!("RUN:2025-10-01 12:00:00Z:{HEX}");
        assert_eq!(bad_ts.parse::<RunId>(), Err(CoreError::InvalidTimestamp));
        assert!("RUN:short".parse::<RunId>().is_err());
    }

    #[test]
    fn deserialize_checks_format() {
        let ok: ResultId = serde_json::from_value(serde_json::json!(format!("RES:{HEX}"))).unwrap();
        assert_eq!(ok.as_str(), format!("RES:{HEX}"));
        assert!(serde_json::from_str::<ResultId>("\"RES:nope\"").is_err());
        assert!(serde_json::from_str::<RunId>(&format!("\"RUN:yesterday:{HEX}\"")).is_err());
        assert!(serde_json::from_str::<Sha256>(&format!("\"{}\"", HEX.to_uppercase())).is_err());
        let back: Sha256 = serde_json::from_str(&serde_json::to_string(&HEX.parse::<Sha256>().unwrap()).unwrap()).unwrap();
        assert_eq!(back.as_str(), HEX);
    }
}
