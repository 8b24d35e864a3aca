/// Roles known to the service
///
/// The set is closed; only the names are deployment specific
/// (`ADMIN_ROLE` / `WRITER_ROLE`), resolved once at startup.
use crate::config::RoleSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Writer,
}

impl Role {
    /// Whether a caller holding `self` may access something requiring `required`.
    ///
    /// Admin passes every check; any other role must match exactly.
    pub fn satisfies(self, required: Role) -> bool {
        self == Role::Admin || self == required
    }
}

impl RoleSettings {
    /// Map a stored or claimed role name onto a [`Role`]
    pub fn resolve(&self, name: &str) -> Option<Role> {
        let name = name.trim().to_lowercase();
        if name == self.admin {
            Some(Role::Admin)
        } else if name == self.writer {
            Some(Role::Writer)
        } else {
            None
        }
    }

    /// Configured name for `role`
    pub fn name_of(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin,
            Role::Writer => &self.writer,
        }
    }

    /// Role given to self-registered users
    pub fn default_name(&self) -> &str {
        self.name_of(Role::Writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> RoleSettings {
        RoleSettings::new("chief", "author").unwrap()
    }

    #[test]
    fn test_admin_satisfies_everything() {
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Writer));
    }

    #[test]
    fn test_writer_only_satisfies_writer() {
        assert!(Role::Writer.satisfies(Role::Writer));
        assert!(!Role::Writer.satisfies(Role::Admin));
    }

    #[test]
    fn test_resolve_configured_names() {
        let roles = roles();
        assert_eq!(roles.resolve("chief"), Some(Role::Admin));
        assert_eq!(roles.resolve(" Author "), Some(Role::Writer));
        assert_eq!(roles.resolve("admin"), None);
        assert_eq!(roles.resolve(""), None);
    }

    #[test]
    fn test_name_round_trip() {
        let roles = roles();
        for role in [Role::Admin, Role::Writer] {
            assert_eq!(roles.resolve(roles.name_of(role)), Some(role));
        }
        assert_eq!(roles.default_name(), "author");
    }
}
