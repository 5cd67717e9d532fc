//! UserPattern: a pattern matched against an external authentication
//! identity to derive a template user at logon time.

super::resource_wrapper!(
    /// A console user pattern.
    UserPattern
);
