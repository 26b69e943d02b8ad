//! # Frida device resolution
//!
//! The `frida` crate mirrors the device model of the Frida instrumentation
//! toolkit (device manager → devices → sessions) and memoizes the lookups
//! applications make over and over: the local device, the USB device and
//! devices by identifier.
//!
//! ## Features
//!
//! - **Lazy device manager:** The device manager is created on first use and
//!   exactly once, even when many threads ask for it at the same time.
//!
//! - **Enumeration on demand:** Devices are enumerated at most once, and only
//!   when a USB, remote or by-id lookup needs it. The local device is always
//!   available without enumeration.
//!
//! - **Memoized lookups:** Resolved devices are cached. Failed lookups are
//!   not, so a device that shows up later is still found.
//!
//! - **Attach shortcut:** [`Frida::attach`] resolves the local device and
//!   attaches to a process by id or by name in one call.
//!
//! - **Engine agnostic:** The native engine is reached only through the
//!   [`Engine`], [`DeviceManager`] and [`Device`] traits. The `mock` engine
//!   (behind the `mock` feature) implements them in-process for tests.
//!
//! ## Usage
//!
//! ```rust
//! use frida::{Device as _, Frida, Session as _};
//! use frida_mock::{MockDevice, MockEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MockEngine::new()
//!     .with_device(MockDevice::local("local").with_process(4242, "Safari"))
//!     .with_device(MockDevice::usb("00008030-001A35E02E42802E"));
//!
//! let frida = Frida::new(engine);
//! println!("engine {}", frida.version());
//!
//! let device = frida.device_by_id("00008030-001A35E02E42802E")?;
//! assert_eq!(device.id(), "00008030-001A35E02E42802E");
//!
//! let session = frida.attach("Safari")?;
//! assert_eq!(session.pid(), 4242);
//! # Ok(())
//! # }
//! ```
//!
//! ## Caveats
//!
//! Cached devices never expire. A USB device unplugged after it was resolved
//! keeps being returned until the [`Frida`] instance is dropped.
//!
//! # License
//!
//! This project is licensed under the MIT license.

#[cfg(feature = "cache")]
mod frida;

pub use frida_core::*;

#[cfg(feature = "cache")]
pub mod cache {
    #![doc = include_str!("../docs/frida-cache.md")]

    pub use frida_cache::*;
}

#[cfg(feature = "mock")]
pub mod mock {
    #![doc = include_str!("../docs/frida-mock.md")]

    pub use frida_mock::*;
}

// Re-export the facade and the resolver to the root of the crate.
#[cfg(feature = "cache")]
#[doc(inline)]
pub use self::{cache::DeviceResolver, frida::Frida};
