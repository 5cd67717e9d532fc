//! PasswordRule: a console-wide local-authentication password policy.

super::resource_wrapper!(
    /// A console password rule.
    PasswordRule
);
