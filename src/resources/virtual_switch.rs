//! VirtualSwitch: a CPC-scoped internal network switch for NIC attachments.

super::resource_wrapper!(
    /// A CPC-level virtual switch.
    VirtualSwitch
);
