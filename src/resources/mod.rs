//! Concrete resource kinds: one wrapper module per HMC resource class,
//! each a thin newtype over [`crate::resource::Resource`] plus its own
//! operations. None of them subclass a common base; they share a
//! capability surface through `Deref<Target = Resource>`.

macro_rules! resource_wrapper {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(crate::resource::Resource);

        impl From<crate::resource::Resource> for $name {
            fn from(resource: crate::resource::Resource) -> Self {
                Self(resource)
            }
        }

        impl AsRef<crate::resource::Resource> for $name {
            fn as_ref(&self) -> &crate::resource::Resource {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = crate::resource::Resource;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }
    };
}

pub(crate) use resource_wrapper;

pub mod activation_profile;
pub mod adapter;
pub mod console;
pub mod cpc;
pub mod group;
pub mod hba;
pub mod hw_message;
pub mod ldap_server_definition;
pub mod lpar;
pub mod metrics_context;
pub mod nic;
pub mod partition;
pub mod password_rule;
pub mod port;
pub mod storage_group;
pub mod storage_volume;
pub mod tape_library;
pub mod tape_link;
pub mod user;
pub mod user_pattern;
pub mod user_role;
pub mod virtual_function;
pub mod virtual_storage_resource;
pub mod virtual_switch;

pub use activation_profile::{ActivationProfile, ActivationProfileKind};
pub use adapter::Adapter;
pub use console::Console;
pub use cpc::{AdapterMapping, Cpc, ImportDpmConfigOptions};
pub use group::Group;
pub use hba::Hba;
pub use hw_message::HwMessage;
pub use ldap_server_definition::LdapServerDefinition;
pub use lpar::{Lpar, LoadResult};
pub use metrics_context::{MetricsContext, MetricsContextManager, metrics_context_manager};
pub use nic::Nic;
pub use partition::Partition;
pub use password_rule::PasswordRule;
pub use port::Port;
pub use storage_group::{StorageGroup, StorageGroupManager};
pub use storage_volume::StorageVolume;
pub use tape_library::TapeLibrary;
pub use tape_link::TapeLink;
pub use user::User;
pub use user_pattern::UserPattern;
pub use user_role::UserRole;
pub use virtual_function::VirtualFunction;
pub use virtual_storage_resource::VirtualStorageResource;
pub use virtual_switch::VirtualSwitch;
