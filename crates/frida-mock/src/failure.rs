use std::collections::HashMap;

use frida_core::{DeviceType, Error};

/// An engine operation failures can be injected into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`DeviceManager::enumerate_devices`](frida_core::DeviceManager::enumerate_devices).
    Enumerate,

    /// [`DeviceManager::device_by_type`](frida_core::DeviceManager::device_by_type).
    DeviceByType(DeviceType),

    /// [`DeviceManager::device_by_id`](frida_core::DeviceManager::device_by_id).
    DeviceById(String),

    /// [`Device::attach`](frida_core::Device::attach) on any device.
    Attach,
}

/// An injected failure.
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// The error to return.
    pub error: Error,

    /// Number of calls to fail before succeeding (`None` = always fail).
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Fails every call with `error`.
    pub fn error(error: Error) -> Self {
        Self {
            error,
            fail_count: None,
        }
    }

    /// Fails only the next `count` calls.
    pub fn with_fail_count(self, count: u32) -> Self {
        Self {
            fail_count: Some(count),
            ..self
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FailureInjector {
    configs: HashMap<Operation, FailureConfig>,
    call_counts: HashMap<Operation, u32>,
}

impl FailureInjector {
    pub fn inject(&mut self, op: Operation, config: FailureConfig) {
        self.call_counts.insert(op.clone(), 0);
        self.configs.insert(op, config);
    }

    pub fn clear(&mut self, op: &Operation) {
        self.configs.remove(op);
        self.call_counts.remove(op);
    }

    /// Returns the error the call should fail with, if any.
    pub fn check(&mut self, op: &Operation) -> Option<Error> {
        let config = self.configs.get(op)?;

        let count = self.call_counts.entry(op.clone()).or_insert(0);
        *count += 1;

        if let Some(fail_limit) = config.fail_count {
            if *count > fail_limit {
                return None;
            }
        }

        Some(config.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fails_until_count_exhausted() {
        let mut injector = FailureInjector::default();
        injector.inject(
            Operation::Enumerate,
            FailureConfig::error(Error::enumeration("usbmuxd down")).with_fail_count(2),
        );

        assert!(injector.check(&Operation::Enumerate).is_some());
        assert!(injector.check(&Operation::Enumerate).is_some());
        assert!(injector.check(&Operation::Enumerate).is_none());
        assert!(injector.check(&Operation::Attach).is_none());
    }

    #[test]
    fn unlimited_failure_until_cleared() {
        let mut injector = FailureInjector::default();
        let op = Operation::DeviceById(String::from("y"));
        injector.inject(op.clone(), FailureConfig::error(Error::device_not_found("y")));

        for _ in 0..5 {
            assert_eq!(injector.check(&op), Some(Error::device_not_found("y")));
        }

        injector.clear(&op);
        assert!(injector.check(&op).is_none());
    }
}
