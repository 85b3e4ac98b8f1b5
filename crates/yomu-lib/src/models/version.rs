use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: usize,
    pub minor: usize,
    pub patch: usize,
}

impl FromStr for Version {
    type Err = Error;

    /// Accepts `1.2.3` as well as release tags such as `v1.2.3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('v');
        let split = s.split('.').collect::<Vec<&str>>();
        match split.as_slice() {
            [major, minor, patch] => Ok(Version {
                major: major.parse().map_err(|_| Error::InvalidVersion)?,
                minor: minor.parse().map_err(|_| Error::InvalidVersion)?,
                patch: patch.parse().map_err(|_| Error::InvalidVersion)?,
            }),
            _ => Err(Error::InvalidVersion),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}.{}.{}", self.major, self.minor, self.patch))
    }
}

/// Whether `available` is a newer release than `current`, unparsable tags never are
pub fn is_update_available(current: &str, available: &str) -> bool {
    match (current.parse::<Version>(), available.parse::<Version>()) {
        (Ok(current), Ok(available)) => available > current,
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let version: Version = "v1.10.2".parse().unwrap();
        assert_eq!(
            version,
            Version {
                major: 1,
                minor: 10,
                patch: 2
            }
        );
        assert_eq!(version.to_string(), "1.10.2");
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!("1.2".parse::<Version>(), Err(Error::InvalidVersion));
        assert_eq!("a.b.c".parse::<Version>(), Err(Error::InvalidVersion));
    }

    #[test]
    fn test_update_available() {
        assert!(is_update_available("v1.0.0", "v1.0.1"));
        assert!(!is_update_available("v1.2.0", "v1.1.9"));
        assert!(!is_update_available("preview", "v9.9.9"));
    }
}
