//! UserRole: a named bundle of task permissions assignable to users.

super::resource_wrapper!(
    /// A console user role.
    UserRole
);
