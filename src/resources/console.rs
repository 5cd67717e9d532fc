//! Console: the HMC itself, as seen through its Web Services API. Exactly
//! one logical console exists per HMC; [`crate::client::Client`] exposes
//! it through a single-element manager.

use serde_json::Value;

use crate::error::Result;
use crate::manager::{FilterArgs, Manager, ManagerSpec, build_query_string};
use crate::session::Session;

use super::group::Group;
use super::hw_message::HwMessage;
use super::ldap_server_definition::LdapServerDefinition;
use super::lpar::Lpar;
use super::partition::Partition;
use super::password_rule::PasswordRule;
use super::storage_group::StorageGroup;
use super::tape_library::TapeLibrary;
use super::user::User;
use super::user_pattern::UserPattern;
use super::user_role::UserRole;

super::resource_wrapper!(
    /// The one logical console of the targeted HMC.
    Console
);

fn console_spec() -> ManagerSpec {
    ManagerSpec {
        class_name: "console",
        list_uri: String::new(),
        members_key: "",
        base_uri: "/api/console".to_string(),
        oid_prop: "object-id",
        uri_prop: "object-uri",
        name_prop: "name",
        query_props: &[],
        supports_properties: true,
        case_insensitive_names: false,
    }
}

/// The single-element manager holding the console singleton, owned by
/// [`crate::client::Client`]. There is no list endpoint: callers reach
/// the console through [`crate::client::Client::console_object`].
#[must_use]
pub fn console_manager(session: Session) -> Manager<Console> {
    Manager::new(session, None, console_spec())
}

fn child_spec(console: &Console, segment: &'static str, class_name: &'static str) -> ManagerSpec {
    ManagerSpec {
        class_name,
        list_uri: format!("{}/{segment}", console.uri()),
        members_key: segment,
        base_uri: format!("{}/{segment}", console.uri()),
        oid_prop: "element-id",
        uri_prop: "element-uri",
        name_prop: "name",
        query_props: &["name"],
        supports_properties: true,
        case_insensitive_names: false,
    }
}

impl Console {
    #[must_use]
    pub fn users(&self) -> Manager<User> {
        Manager::new(self.session().clone(), Some(self.uri().to_string()), child_spec(self, "users", "user"))
    }

    #[must_use]
    pub fn user_roles(&self) -> Manager<UserRole> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            child_spec(self, "user-roles", "user-role"),
        )
    }

    #[must_use]
    pub fn user_patterns(&self) -> Manager<UserPattern> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            child_spec(self, "user-patterns", "user-pattern"),
        )
    }

    #[must_use]
    pub fn password_rules(&self) -> Manager<PasswordRule> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            child_spec(self, "password-rules", "password-rule"),
        )
    }

    #[must_use]
    pub fn ldap_server_definitions(&self) -> Manager<LdapServerDefinition> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            child_spec(self, "ldap-server-definitions", "ldap-server-definition"),
        )
    }

    #[must_use]
    pub fn groups(&self) -> Manager<Group> {
        Manager::new(self.session().clone(), Some(self.uri().to_string()), child_spec(self, "groups", "group"))
    }

    #[must_use]
    pub fn hw_messages(&self) -> Manager<HwMessage> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            child_spec(self, "hw-messages", "hw-message"),
        )
    }

    #[must_use]
    pub fn tape_libraries(&self) -> Manager<TapeLibrary> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            child_spec(self, "tape-libraries", "tape-library"),
        )
    }

    #[must_use]
    pub fn storage_groups(&self) -> Manager<StorageGroup> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            child_spec(self, "storage-groups", "storage-group"),
        )
    }

    /// `GET <console-uri>/operations/list-permitted-partitions`.
    pub async fn list_permitted_partitions(&self, filter_args: Option<FilterArgs>) -> Result<Vec<Partition>> {
        let mut uri = format!("{}/operations/list-permitted-partitions", self.uri());
        if let Some(args) = &filter_args {
            let qs = build_query_string(args);
            if !qs.is_empty() {
                uri.push('?');
                uri.push_str(&qs);
            }
        }
        let body = self.session().get(&uri, true, true).await?;
        let manager = self.partitions_lookup_manager();
        Ok(body
            .get("partitions")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| {
                        let uri = item.get("object-uri")?.as_str()?;
                        Some(manager.resource_object(uri, item.as_object().cloned()))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// `GET <console-uri>/operations/list-permitted-lpars`.
    pub async fn list_permitted_lpars(&self, filter_args: Option<FilterArgs>) -> Result<Vec<Lpar>> {
        let mut uri = format!("{}/operations/list-permitted-lpars", self.uri());
        if let Some(args) = &filter_args {
            let qs = build_query_string(args);
            if !qs.is_empty() {
                uri.push('?');
                uri.push_str(&qs);
            }
        }
        let body = self.session().get(&uri, true, true).await?;
        let manager = self.lpars_lookup_manager();
        Ok(body
            .get("logical-partitions")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| {
                        let uri = item.get("object-uri")?.as_str()?;
                        Some(manager.resource_object(uri, item.as_object().cloned()))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// A throwaway `Manager<Partition>` with no fixed parent, used only to
    /// build `Partition` handles from cross-CPC permitted-partitions results.
    fn partitions_lookup_manager(&self) -> Manager<Partition> {
        Manager::new(
            self.session().clone(),
            None,
            ManagerSpec {
                class_name: "partition",
                list_uri: String::new(),
                members_key: "partitions",
                base_uri: String::new(),
                oid_prop: "object-id",
                uri_prop: "object-uri",
                name_prop: "name",
                query_props: &[],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    fn lpars_lookup_manager(&self) -> Manager<Lpar> {
        Manager::new(
            self.session().clone(),
            None,
            ManagerSpec {
                class_name: "logical-partition",
                list_uri: String::new(),
                members_key: "logical-partitions",
                base_uri: String::new(),
                oid_prop: "object-id",
                uri_prop: "object-uri",
                name_prop: "name",
                query_props: &[],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }
}
