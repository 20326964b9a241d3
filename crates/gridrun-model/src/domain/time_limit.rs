use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Per-task wall-clock limit in the fixed `hh:mm:ss` form.
///
/// Exactly two digits per field are accepted; hours are not capped,
/// so `48:00:00` is a valid two-day limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeLimit {
    raw: String,
    seconds: u64,
}

impl TimeLimit {
    /// Original `hh:mm:ss` text, passed verbatim to the batch systems.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Total number of seconds.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }
}

impl FromStr for TimeLimit {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidTimeLimit(s.to_string());

        let bytes = s.as_bytes();
        if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
            return Err(invalid());
        }

        let mut fields = [0u64; 3];
        for (slot, part) in fields.iter_mut().zip(s.split(':')) {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }
        let [hours, minutes, seconds] = fields;

        Ok(Self {
            raw: s.to_string(),
            seconds: hours * 3600 + minutes * 60 + seconds,
        })
    }
}

impl TryFrom<String> for TimeLimit {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeLimit> for String {
    fn from(value: TimeLimit) -> Self {
        value.raw
    }
}

impl fmt::Display for TimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Default for TimeLimit {
    fn default() -> Self {
        Self {
            raw: "00:15:00".to_string(),
            seconds: 15 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_fixed_grammar() {
        for (raw, secs) in [
            ("00:15:00", 900),
            ("04:00:00", 14_400),
            ("48:00:00", 172_800),
            ("99:59:59", 359_999),
            ("00:00:00", 0),
        ] {
            let limit: TimeLimit = raw.parse().unwrap();
            assert_eq!(limit.seconds(), secs, "{raw}");
            assert_eq!(limit.as_str(), raw);
        }
    }

    #[test]
    fn rejects_everything_else() {
        for raw in [
            "", "1:00:00", "001:00:00", "00:15", "00-15-00", "aa:bb:cc", "00:15:00 ", " 00:15:00",
            "00:1a:00", "+1:00:00", "00:15:0", "00::1500",
        ] {
            let err = raw.parse::<TimeLimit>().unwrap_err();
            assert_eq!(err, ModelError::InvalidTimeLimit(raw.to_string()));
        }
    }

    #[test]
    fn default_is_fifteen_minutes() {
        assert_eq!(TimeLimit::default(), "00:15:00".parse().unwrap());
    }

    #[test]
    fn serde_uses_plain_string() {
        let limit: TimeLimit = "02:30:00".parse().unwrap();
        let json = serde_json::to_string(&limit).unwrap();
        assert_eq!(json, r#""02:30:00""#);

        assert!(serde_json::from_str::<TimeLimit>(r#""2:30""#).is_err());
    }
}
