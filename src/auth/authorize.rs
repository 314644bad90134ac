//! The ownership check run before a user changes a department or transaction.

use crate::{
    Error,
    auth::{User, UserID},
};

/// Check that `user` owns a resource whose owning user is `owner`, or that
/// `user` has a role that may change any resource.
///
/// `action` completes the error message, e.g. "update this department".
///
/// # Errors
///
/// Returns [Error::NotOwner] if the check fails.
pub fn authorize_owner(user: &User, owner: UserID, action: &str) -> Result<(), Error> {
    if user.id == owner || user.role.is_elevated() {
        return Ok(());
    }

    tracing::debug!("User {} does not own a resource owned by {owner}", user.id);

    Err(Error::NotOwner(format!(
        "User {} is not authorized to {action}",
        user.id
    )))
}

#[cfg(test)]
mod authorize_owner_tests {
    use time::OffsetDateTime;

    use crate::{
        Error,
        auth::{PasswordHash, Role, User, UserID, authorize_owner},
    };

    fn user(id: i64, role: Role) -> User {
        User {
            id: UserID::new(id),
            name: "Test".to_owned(),
            email: "test@example.com".to_owned(),
            role,
            password_hash: PasswordHash::from_stored("hunter2"),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn owner_is_authorized() {
        let owner = user(1, Role::Publisher);

        assert_eq!(authorize_owner(&owner, UserID::new(1), "do this"), Ok(()));
    }

    #[test]
    fn admin_is_authorized_for_any_owner() {
        let admin = user(2, Role::Admin);

        assert_eq!(authorize_owner(&admin, UserID::new(1), "do this"), Ok(()));
    }

    #[test]
    fn other_publisher_is_rejected() {
        let publisher = user(3, Role::Publisher);

        assert_eq!(
            authorize_owner(&publisher, UserID::new(1), "update this department"),
            Err(Error::NotOwner(
                "User 3 is not authorized to update this department".to_owned()
            ))
        );
    }
}
