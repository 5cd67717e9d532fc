//! Hba: a partition's FCP host-bus adapter attachment.

super::resource_wrapper!(
    /// A partition-level host-bus adapter.
    Hba
);
