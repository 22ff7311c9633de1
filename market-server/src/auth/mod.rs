//! JWT authentication
//!
//! Bearer tokens carry the user ID and role; handlers receive both through
//! the [`CurrentUser`] extractor and gate themselves with [`CurrentUser::require`].

mod extractor;
mod jwt;

pub use jwt::{Claims, JwtService};

use shared::error::AppError;
use shared::models::Role;

/// The authenticated caller of the current request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    /// Reject the request unless the caller holds one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Requires one of: {}",
                allowed
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id: i64 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;
        let role = Role::parse(&claims.role).ok_or(AppError::InvalidToken)?;
        Ok(CurrentUser { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gate_allows_and_denies() {
        let user = CurrentUser {
            id: 1,
            role: Role::Deo,
        };
        assert!(user.require(&[Role::Deo, Role::Manager]).is_ok());
        assert!(matches!(
            user.require(&[Role::Manager]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn token_roundtrip_preserves_identity() {
        let service = JwtService::new("a-test-secret-that-is-long-enough!!");
        let token = service.issue(42, Role::Manager).unwrap();
        let claims = service.verify(&token).unwrap();
        let user = CurrentUser::try_from(claims).unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.role, Role::Manager);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let service = JwtService::new("a-test-secret-that-is-long-enough!!");
        assert!(service.verify("not-a-jwt").is_err());

        let other = JwtService::new("a-different-secret-also-long-enough");
        let token = other.issue(42, Role::Customer).unwrap();
        assert!(service.verify(&token).is_err());
    }
}
