//! Nic: a partition's network interface card attachment.

super::resource_wrapper!(
    /// A partition-level network interface card.
    Nic
);
