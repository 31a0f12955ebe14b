//! One-shot detection of tag I/O support.

use std::sync::Arc;
use std::sync::OnceLock;

use super::platform::TagPlatform;

/// Caches the platform's support answer on first use.
///
/// The result is assumed stable for the lifetime of the process; the
/// platform is never re-probed.
pub struct CapabilityProbe {
    platform: Arc<dyn TagPlatform>,
    probed: OnceLock<bool>,
}

impl CapabilityProbe {
    /// Build a probe over the given platform.
    pub fn new(platform: Arc<dyn TagPlatform>) -> Self {
        Self {
            platform,
            probed: OnceLock::new(),
        }
    }

    /// Whether the runtime exposes tag I/O primitives.
    ///
    /// Evaluated against the platform once; subsequent calls return the
    /// cached answer.
    pub fn is_supported(&self) -> bool {
        *self.probed.get_or_init(|| self.platform.is_supported())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::nfc::platform::MockTagPlatform;
    use rstest::rstest;

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn reports_platform_answer(#[case] supported: bool) {
        let mut platform = MockTagPlatform::new();
        platform
            .expect_is_supported()
            .times(1)
            .return_const(supported);
        let probe = CapabilityProbe::new(Arc::new(platform));
        assert_eq!(probe.is_supported(), supported);
    }

    #[rstest]
    fn probes_the_platform_exactly_once() {
        let mut platform = MockTagPlatform::new();
        platform.expect_is_supported().times(1).return_const(true);
        let probe = CapabilityProbe::new(Arc::new(platform));
        assert!(probe.is_supported());
        assert!(probe.is_supported());
        assert!(probe.is_supported());
    }
}
