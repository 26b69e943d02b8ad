//! Attach targets, session options and the session contract.

use std::fmt;

use crate::Error;

/// The process to attach to.
///
/// Which of the two shapes is valid for a given device is decided by the
/// engine, not by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttachTarget {
    /// Process identifier.
    Pid(u32),

    /// Process name.
    Name(String),
}

impl fmt::Display for AttachTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pid(pid) => write!(f, "pid {pid}"),
            Self::Name(name) => write!(f, "{name:?}"),
        }
    }
}

impl From<u32> for AttachTarget {
    fn from(pid: u32) -> Self {
        Self::Pid(pid)
    }
}

impl From<&str> for AttachTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for AttachTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Code execution realm of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Realm {
    /// The native realm of the process.
    #[default]
    Native,

    /// The emulated realm (e.g. ARM code translated on an x86 Android host).
    Emulated,
}

/// Options passed to [`Device::attach`].
///
/// [`Device::attach`]: crate::Device::attach
#[derive(Debug, Default, Clone, PartialEq, Eq, bon::Builder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionOptions {
    /// Realm to attach in.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub realm: Realm,

    /// Seconds the session survives a lost connection, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub persist_timeout: Option<u32>,
}

/// An attached session.
///
/// Sessions are owned by the caller; the resolution layer never caches them.
pub trait Session: Send {
    /// Returns the process identifier of the attached process.
    fn pid(&self) -> u32;

    /// Returns `true` once the session was detached.
    fn is_detached(&self) -> bool;

    /// Detaches from the process.
    fn detach(&self) -> Result<(), Error>;
}
