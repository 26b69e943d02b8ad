/// Error type shared by the engine contracts and the resolution layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Device enumeration failed.
    #[error("Failed to enumerate devices: {0}")]
    Enumeration(String),

    /// The requested device is not available.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The engine failed for a reason not covered by other variants.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Creating a session on the target failed.
    #[error("Failed to attach to {target}: {reason}")]
    Attach {
        /// The attach target, rendered for display.
        target: String,

        /// The reason reported by the engine.
        reason: String,
    },

    /// An argument was rejected by the engine.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates an [`Error::Enumeration`].
    pub fn enumeration(reason: impl Into<String>) -> Self {
        Self::Enumeration(reason.into())
    }

    /// Creates an [`Error::DeviceNotFound`].
    pub fn device_not_found(device: impl Into<String>) -> Self {
        Self::DeviceNotFound(device.into())
    }

    /// Creates an [`Error::Engine`].
    pub fn engine(reason: impl Into<String>) -> Self {
        Self::Engine(reason.into())
    }

    /// Creates an [`Error::Attach`].
    pub fn attach(target: impl ToString, reason: impl Into<String>) -> Self {
        Self::Attach {
            target: target.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error means the device simply isn't there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound(_))
    }
}
