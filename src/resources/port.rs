//! Port: a physical port on an adapter.

super::resource_wrapper!(
    /// A physical port on an [`super::adapter::Adapter`].
    Port
);
