//! VirtualFunction: a partition's accelerator virtual function attachment.

super::resource_wrapper!(
    /// A partition-level virtual function.
    VirtualFunction
);
