use std::{cmp::Ordering, fmt, sync::LazyLock};

use regex::Regex;

use crate::DeviceManager;

/// Entry point into the native instrumentation engine.
pub trait Engine: Send + Sync {
    /// The device manager type created by [`new_device_manager`].
    ///
    /// [`new_device_manager`]: Self::new_device_manager
    type DeviceManager: DeviceManager;

    /// Returns the engine version string, e.g. `16.5.2`.
    fn version(&self) -> String;

    /// Patches the Android SELinux policy so the engine can inject into
    /// other processes. Requires root.
    fn patch_android_selinux(&self);

    /// Creates a new device manager.
    ///
    /// Construction has no error channel. An engine that cannot create a
    /// manager is unusable and should panic here.
    fn new_device_manager(&self) -> Self::DeviceManager;
}

/// Parsed engine version.
///
/// Versions order by major, minor and patch. A version with a suffix
/// precedes the release it leads up to, so `17.0.0-dev.3 < 17.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVersion {
    /// Major version.
    pub major: u32,

    /// Minor version.
    pub minor: u32,

    /// Patch version.
    pub patch: u32,

    /// Build suffix following a `-`, e.g. `dev.3`.
    pub suffix: Option<String>,
}

impl EngineVersion {
    /// Parses a version string such as `16.5.2` or `17.0.0-dev.3`.
    pub fn parse(version: &str) -> Option<Self> {
        static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(concat!(
                r"^(?<MAJOR>[0-9]+)\.(?<MINOR>[0-9]+)\.(?<PATCH>[0-9]+)",
                r"(?:-(?<SUFFIX>[0-9A-Za-z.-]+))?$"
            ))
            .expect("version regex is valid")
        });

        let captures = VERSION_REGEX.captures(version.trim())?;

        Some(Self {
            major: captures["MAJOR"].parse().ok()?,
            minor: captures["MINOR"].parse().ok()?,
            patch: captures["PATCH"].parse().ok()?,
            suffix: captures.name("SUFFIX").map(|m| m.as_str().to_owned()),
        })
    }
}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let release = (self.major, self.minor, self.patch);
        let other_release = (other.major, other.minor, other.patch);

        release.cmp(&other_release).then_with(|| match (&self.suffix, &other.suffix) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(suffix), Some(other_suffix)) => suffix.cmp(other_suffix),
        })
    }
}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(suffix) = &self.suffix {
            write!(f, "-{suffix}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_release_version() {
        let version = EngineVersion::parse("16.5.2").unwrap();
        assert_eq!((version.major, version.minor, version.patch), (16, 5, 2));
        assert_eq!(version.suffix, None);
        assert_eq!(version.to_string(), "16.5.2");
    }

    #[test]
    fn parses_development_suffix() {
        let version = EngineVersion::parse("17.0.0-dev.3\n").unwrap();
        assert_eq!(version.suffix.as_deref(), Some("dev.3"));
        assert!(version > EngineVersion::parse("16.7.19").unwrap());
    }

    #[test]
    fn prerelease_precedes_release() {
        let dev = EngineVersion::parse("17.0.0-dev.3").unwrap();
        let release = EngineVersion::parse("17.0.0").unwrap();

        assert!(dev < release);
        assert!(release < EngineVersion::parse("17.0.1-rc.1").unwrap());
        assert!(dev < EngineVersion::parse("17.0.0-dev.4").unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(EngineVersion::parse("sixteen"), None);
        assert_eq!(EngineVersion::parse("16.5"), None);
        assert_eq!(EngineVersion::parse(""), None);
    }
}
