//! Engine contracts and shared types.
//!
//! The resolution layer never talks to the native engine directly. It goes
//! through the [`Engine`], [`DeviceManager`], [`Device`] and [`Session`]
//! traits defined here, which a binding (or a test double) implements.

mod device;
mod engine;
mod error;
mod session;

pub use self::{
    device::{Device, DeviceManager, DeviceType},
    engine::{Engine, EngineVersion},
    error::Error,
    session::{AttachTarget, Realm, Session, SessionOptions},
};
