//! VirtualStorageResource: a partition-facing handle onto one
//! StorageVolume within a StorageGroup attached to that partition.

super::resource_wrapper!(
    /// A partition's attachment point onto a storage volume.
    VirtualStorageResource
);
