//! LdapServerDefinition: an external LDAP server used for user
//! authentication.

super::resource_wrapper!(
    /// A console LDAP server definition.
    LdapServerDefinition
);
