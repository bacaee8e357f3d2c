//! Version numbers checked by `%version` statements.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, de};

/// A `MAJOR.MINOR.PATCH` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// A version as written after `%version`, where the patch level is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRequest {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl Version {
    /// The version of the language implemented by this crate.
    pub const CURRENT: Version = Version::new(2, 4, 1);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether a script requesting `request` can be read by this version.
    ///
    /// The major versions must be equal. A lower requested minor version is
    /// always accepted; an equal one additionally needs a patch level that
    /// is not newer than ours, when a patch level was requested.
    pub fn satisfies(&self, request: &VersionRequest) -> bool {
        if self.major != request.major || self.minor < request.minor {
            return false;
        }
        match request.patch {
            Some(patch) if self.minor == request.minor => self.patch >= patch,
            _ => true,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionRequest {
    type Err = ();

    /// Parse `MAJOR.MINOR` or `MAJOR.MINOR.PATCH`, digits only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(());
                }
                part.parse::<u32>().map_err(|_| ())
            })
            .collect::<Result<Vec<_>, _>>()?;
        match parts[..] {
            [major, minor] => Ok(Self {
                major,
                minor,
                patch: None,
            }),
            [major, minor, patch] => Ok(Self {
                major,
                minor,
                patch: Some(patch),
            }),
            _ => Err(()),
        }
    }
}

impl FromStr for Version {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let request: VersionRequest = s.parse()?;
        Ok(Version::new(
            request.major,
            request.minor,
            request.patch.unwrap_or(0),
        ))
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(|()| {
            de::Error::custom(format!(
                "expected version of the form MAJOR.MINOR or MAJOR.MINOR.PATCH, not '{text}'"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(s: &str) -> VersionRequest {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_two_and_three_parts() {
        assert_eq!(
            request("2.4"),
            VersionRequest {
                major: 2,
                minor: 4,
                patch: None
            }
        );
        assert_eq!(request("2.4.1").patch, Some(1));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "2", "2.", ".4", "2.4.", "2.4.1.0", "2.x", "+2.4", "2 .4", "-1.0"] {
            assert!(text.parse::<VersionRequest>().is_err(), "accepted {text:?}");
        }
    }

    #[test]
    fn test_current_version_gate() {
        let current = Version::CURRENT;
        assert!(current.satisfies(&request("2.4")));
        assert!(current.satisfies(&request("2.4.1")));
        assert!(current.satisfies(&request("2.4.0")));
        assert!(current.satisfies(&request("2.3")));
        assert!(current.satisfies(&request("2.3.9")));
        assert!(!current.satisfies(&request("2.5")));
        assert!(!current.satisfies(&request("2.4.2")));
        assert!(!current.satisfies(&request("3.0")));
        assert!(!current.satisfies(&request("1.9")));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::CURRENT.to_string(), "2.4.1");
        assert_eq!("2.7".parse::<Version>(), Ok(Version::new(2, 7, 0)));
    }
}
