//! StorageVolume: a single volume within a [`super::storage_group::StorageGroup`].

super::resource_wrapper!(
    /// A storage volume belonging to a storage group.
    StorageVolume
);
