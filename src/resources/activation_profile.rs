//! Activation profiles: classic-mode templates used when activating an
//! LPAR, plus the group-profile and load-profile variants that share the
//! same element shape.

super::resource_wrapper!(
    /// A reset, image, load, or group activation profile.
    ActivationProfile
);

/// Which of the four activation-profile collections a manager instance
/// is scoped to; they share one wrapper type and differ only in URI
/// segment, class name, and members key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationProfileKind {
    Reset,
    Image,
    Load,
    Group,
}

impl ActivationProfileKind {
    pub(crate) fn uri_parts(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Reset => (
                "reset-activation-profiles",
                "reset-activation-profile",
                "reset-activation-profiles",
            ),
            Self::Image => (
                "image-activation-profiles",
                "image-activation-profile",
                "image-activation-profiles",
            ),
            Self::Load => (
                "load-activation-profiles",
                "load-activation-profile",
                "load-activation-profiles",
            ),
            Self::Group => ("group-profiles", "group-profile", "group-profiles"),
        }
    }
}
