use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};
use thiserror::Error as ThisError;
use urlencoding::encode;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefError {
    #[error("Does not match as {ref_type}: {input}")]
    BadFormat {
        ref_type: &'static str,
        input: String,
    },
}

/// Wire form of a numeric identifier: storage rows hand them out as numbers,
/// but federation payloads often carry them as strings.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum IdRepr {
    Number(u64),
    Text(String),
}

macro_rules! numeric_ref {
    ($(#[$meta:meta])* $name:ident, $ref_type:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
        #[serde(try_from = "IdRepr", into = "u64")]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> u64 {
                self.0
            }

            /// Zero is what storage uses for "not set".
            pub fn is_empty(&self) -> bool {
                self.0 == 0
            }

            pub fn from_string(string: String) -> Result<Self, RefError> {
                string
                    .trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| RefError::BadFormat {
                        ref_type: $ref_type,
                        input: string,
                    })
            }
        }

        impl TryFrom<IdRepr> for $name {
            type Error = RefError;

            fn try_from(value: IdRepr) -> Result<Self, Self::Error> {
                match value {
                    IdRepr::Number(number) => Ok(Self(number)),
                    IdRepr::Text(text) => Self::from_string(text),
                }
            }
        }

        impl FromStr for $name {
            type Err = RefError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s.to_string())
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> u64 {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_ref!(
    /// Identity of a post or activity (`uri-id`). Stable across the public and
    /// the per-user copy of the same row.
    RecordId,
    "Record"
);

numeric_ref!(
    /// Contact id of an actor (author, owner or causer).
    ActorId,
    "Actor"
);

numeric_ref!(
    /// Id of a remote server (`gsid`).
    ServerId,
    "Server"
);

numeric_ref!(
    /// Account scope a row was materialized for; zero is the public copy.
    Uid,
    "Uid"
);

impl ActorId {
    /// Redirect through the local contact so remote profiles open with an
    /// authenticated ("sparkle") session.
    pub fn to_redir_url(&self, profile_url: &str) -> String {
        format!("/contact/redir/{}?url={}", self.0, encode(profile_url))
    }
}

impl Uid {
    pub fn is_public(&self) -> bool {
        self.0 == 0
    }
}

/// Storage datetime (`YYYY-MM-DD HH:MM:SS`, UTC). Ordering is the plain
/// string ordering, which the fixed-width format keeps chronological.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

impl Timestamp {
    pub const NULL: &'static str = "0001-01-01 00:00:00";

    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Timestamp",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn null() -> Self {
        Self(Self::NULL.to_string())
    }

    pub fn is_null(&self) -> bool {
        self.0 == Self::NULL
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$").unwrap();
        }
        &RE
    }

    pub fn is_match(string: &str) -> bool {
        Self::single_regex().is_match(string)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::null()
    }
}

impl TryFrom<String> for Timestamp {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Timestamp::from_string(value)
    }
}

impl FromStr for Timestamp {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::from_string(s.to_string())
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> String {
        value.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
