/// What to do when device enumeration fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EnumerationPolicy {
    /// Log the failure, mark enumeration as done and continue with the
    /// lookup. The lookup itself usually reports the missing device.
    #[default]
    Ignore,

    /// Return the failure to the caller and retry enumeration on the next
    /// lookup that needs it.
    Propagate,
}

/// Options of a [`DeviceResolver`].
///
/// [`DeviceResolver`]: crate::DeviceResolver
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverOptions {
    single_flight: bool,
    enumeration_policy: EnumerationPolicy,
}

impl ResolverOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes concurrent first resolutions of the same key.
    ///
    /// Without this, two threads missing the cache at the same time both
    /// call into the engine and the later store wins. With it, the second
    /// thread waits for the first and reuses its result. Device manager
    /// construction is always serialized.
    pub fn with_single_flight(self, single_flight: bool) -> Self {
        Self {
            single_flight,
            ..self
        }
    }

    /// Sets the enumeration failure policy.
    pub fn with_enumeration_policy(self, enumeration_policy: EnumerationPolicy) -> Self {
        Self {
            enumeration_policy,
            ..self
        }
    }

    /// Returns `true` if concurrent resolutions are serialized.
    pub fn single_flight(&self) -> bool {
        self.single_flight
    }

    /// Returns the enumeration failure policy.
    pub fn enumeration_policy(&self) -> EnumerationPolicy {
        self.enumeration_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_behavior() {
        let options = ResolverOptions::new();
        assert!(!options.single_flight());
        assert_eq!(options.enumeration_policy(), EnumerationPolicy::Ignore);
    }

    #[test]
    fn builder_methods() {
        let options = ResolverOptions::new()
            .with_single_flight(true)
            .with_enumeration_policy(EnumerationPolicy::Propagate);
        assert!(options.single_flight());
        assert_eq!(options.enumeration_policy(), EnumerationPolicy::Propagate);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_config() {
        let options: ResolverOptions =
            serde_json::from_str(r#"{"enumeration_policy":"propagate"}"#).unwrap();
        assert!(!options.single_flight());
        assert_eq!(options.enumeration_policy(), EnumerationPolicy::Propagate);
    }
}
