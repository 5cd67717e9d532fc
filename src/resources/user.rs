//! User: an HMC console user definition.

super::resource_wrapper!(
    /// A console user definition.
    User
);
