//! Strongly-typed identifiers for Vultr resources.
//!
//! The provider assigns numeric identifiers to servers, regions, plans and
//! scripts, and hexadecimal string identifiers to snapshots, SSH keys and
//! backups. Wrapping them keeps a `SUBID` from being passed where a `DCID` is
//! expected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Macro to generate numeric identifier wrapper types.
macro_rules! numeric_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| Error::InvalidId(format!("{}: {s:?}", stringify!($name))))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Macro to generate string identifier wrapper types.
macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

numeric_id!(ServerId, "Server instance identifier (`SUBID`)");
numeric_id!(RegionId, "Datacenter identifier (`DCID`)");
numeric_id!(PlanId, "VPS plan identifier (`VPSPLANID`)");
numeric_id!(OsId, "Operating system identifier (`OSID`)");
numeric_id!(ScriptId, "Startup script identifier (`SCRIPTID`)");
numeric_id!(IsoId, "ISO image identifier (`ISOID`)");
numeric_id!(AppId, "Application identifier (`APPID`)");

string_id!(SnapshotId, "Snapshot identifier (`SNAPSHOTID`)");
string_id!(SshKeyId, "SSH key identifier (`SSHKEYID`)");
string_id!(BackupId, "Backup identifier (`BACKUPID`)");

impl SnapshotId {
    /// Restore ID as sent to the provider: only `[a-f0-9]` characters survive.
    #[must_use]
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .filter(|c| matches!(c, 'a'..='f' | '0'..='9'))
            .collect()
    }
}

/// Read a numeric value that the provider may encode as a number or as a
/// decimal string.
#[must_use]
pub fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract a numeric identifier from a decoded payload.
///
/// # Errors
///
/// Returns [`Error::MissingField`] when `key` is absent and
/// [`Error::InvalidId`] when it is present but not numeric.
pub fn extract_numeric_id(payload: &Value, key: &str) -> Result<u64> {
    let value = payload
        .get(key)
        .ok_or_else(|| Error::MissingField(key.to_string()))?;

    coerce_u64(value).ok_or_else(|| Error::InvalidId(format!("{key}: {value}")))
}
