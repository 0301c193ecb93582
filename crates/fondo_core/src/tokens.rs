//! Registry token types (`EntityId`, `IndicatorId`).
//!
//! Entity and indicator names come straight from the source spreadsheets
//! ("Ciudad de México", "Policías por 100k"), so the charset is permissive:
//! 1..=128 chars, no control chars, no leading/trailing whitespace.

use core::borrow::Borrow;
use core::fmt;
use core::str::FromStr;

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CoreError;

fn is_token(s: &str) -> bool {
    let n = s.chars().count();
    (1..=128).contains(&n) && s.trim() == s && !s.chars().any(char::is_control)
}

macro_rules! def_token {
    ($name:ident) => {
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
                let s = s.into();
                if is_token(&s) { Ok(Self(s)) } else { Err(CoreError::InvalidToken) }
            }
            pub fn as_str(&self) -> &str { &self.0 }

            /// Built-in literals only.
            pub(crate) fn from_static(s: &'static str) -> Self {
                debug_assert!(is_token(s), "invalid built-in token {s:?}");
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> { Self::new(s) }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str { &self.0 }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                if is_token(&s) {
                    Ok(Self(s))
                } else {
                    Err(D::Error::invalid_value(
                        Unexpected::Str(&s),
                        &"token of 1..=128 chars, no control chars, trimmed",
                    ))
                }
            }
        }
    };
}

def_token!(EntityId);
def_token!(IndicatorId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_accented_names_with_spaces() {
        assert!(EntityId::new("Ciudad de México").is_ok());
        assert!(IndicatorId::new("Policías por 100k").is_ok());
    }

    #[test]
    fn rejects_empty_padded_and_control() {
        assert_eq!(EntityId::new(""), Err(CoreError::InvalidToken));
        assert_eq!(EntityId::new(" Norte"), Err(CoreError::InvalidToken));
        assert_eq!(IndicatorId::new("a\tb"), Err(CoreError::InvalidToken));
        assert!(IndicatorId::new("x".repeat(129)).is_err());
    }

    #[test]
    fn serde_validates_on_read() {
        let ok: IndicatorId = serde_json::from_str("\"Pob\"").unwrap();
        assert_eq!(ok.as_str(), "Pob");
        assert!(serde_json::from_str::<IndicatorId>("\"  \"").is_err());
    }
}
