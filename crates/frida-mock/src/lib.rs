//! Scripted in-process engine.
//!
//! [`MockEngine`] implements the engine contracts without a native engine
//! behind them. It counts every call made into it and can be told to fail
//! specific operations, which makes it suitable for testing code built on top
//! of the resolution layer.
//!
//! ```rust
//! use frida_core::{DeviceManager as _, DeviceType, Engine as _, Error};
//! use frida_mock::{FailureConfig, MockDevice, MockEngine, Operation};
//!
//! let engine = MockEngine::new()
//!     .with_device(MockDevice::usb("R58M123ABC"))
//!     .with_failure(
//!         Operation::DeviceByType(DeviceType::Usb),
//!         FailureConfig::error(Error::device_not_found("usb")).with_fail_count(1),
//!     );
//!
//! let manager = engine.new_device_manager();
//! manager.enumerate_devices().unwrap();
//!
//! assert!(manager.device_by_type(DeviceType::Usb).is_err());
//! assert!(manager.device_by_type(DeviceType::Usb).is_ok());
//! assert_eq!(engine.counters().type_lookups(DeviceType::Usb), 2);
//! ```

mod device;
mod engine;
mod failure;
mod state;

pub use self::{
    device::{MockDevice, MockSession},
    engine::{DEFAULT_VERSION, MockDeviceManager, MockEngine},
    failure::{FailureConfig, Operation},
    state::Counters,
};
