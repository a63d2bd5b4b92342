use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::User;
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use std::sync::LazyLock;
use uuid::Uuid;

/// A real Argon2 hash generated once at startup, used as a timing decoy
/// so that login requests for non-existent (or passwordless) accounts take
/// the same time as requests for existing ones.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", Salt::from(&salt))
        .expect("failed to generate dummy hash")
        .to_string()
});

impl PostgresRepository {
    /// Insert a new user. Returns `None` when the email is already taken
    /// (case-insensitively); the caller turns that into a conflict.
    pub async fn create_user(&self, email: &str, name: Option<&str>, password: &str) -> Result<Option<User>, AppError> {
        let hash = password_hash(password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES (lower($1), $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, name, password_hash, has_used_free_plan, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(&hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, has_used_free_plan, created_at, updated_at
            FROM users
            WHERE email = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, has_used_free_plan, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify a password against the stored hash. Accounts without a local
    /// credential fail closed with the same generic error, after burning
    /// the same hashing time as a real verification.
    pub fn verify_password(user: &User, password: &str) -> Result<(), AppError> {
        let Some(stored) = user.password_hash.as_deref() else {
            Self::dummy_verify(password);
            return Err(AppError::InvalidCredentials);
        };

        let password_hash = PasswordHash::new(stored).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &password_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        Ok(())
    }

    /// Perform a throwaway Argon2 verification to equalize response timing
    /// regardless of whether the target account exists.
    pub fn dummy_verify(password: &str) {
        let hash = PasswordHash::new(&DUMMY_HASH).expect("invalid dummy hash");
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }

    pub async fn update_profile(&self, id: &Uuid, email: &str, name: Option<&str>) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = lower($1), name = $2, updated_at = now()
            WHERE id = $3
            RETURNING id, email, name, password_hash, has_used_free_plan, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // Unique violation on the email index: someone else owns it.
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => AppError::UserAlreadyExists(email.to_string()),
            _ => AppError::from(e),
        })?;

        Ok(user)
    }

    /// Set a new password hash. Used by password reset and change-password;
    /// both paths go through the same uniform-cost hashing function.
    pub async fn update_user_password(&self, user_id: &Uuid, password: &str) -> Result<(), AppError> {
        let hash = password_hash(password)?;

        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = now()
            WHERE id = $2
            "#,
        )
        .bind(&hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Verifies the current password and updates it to the new one.
    pub async fn change_password(&self, user_id: &Uuid, current_password: &str, new_password: &str) -> Result<(), AppError> {
        let user = self.get_user_by_id(user_id).await?.ok_or(AppError::UserNotFound)?;
        Self::verify_password(&user, current_password).map_err(|_| AppError::BadRequest("Current password is incorrect".to_string()))?;

        self.update_user_password(user_id, new_password).await
    }
}

/// Hash a password with Argon2id at crate-default parameters. One fixed
/// cost everywhere a password is hashed.
pub(crate) fn password_hash(password: &str) -> Result<String, AppError> {
    let salt_string = SaltString::generate(&mut OsRng);
    let salt = Salt::from(&salt_string);
    let hash = PasswordHash::generate(Argon2::default(), password.as_bytes(), salt)?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_hash(hash: Option<String>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            name: None,
            password_hash: hash,
            has_used_free_plan: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = password_hash("correct horse battery staple").unwrap();
        let user = user_with_hash(Some(hash));

        assert!(PostgresRepository::verify_password(&user, "correct horse battery staple").is_ok());
        assert!(matches!(
            PostgresRepository::verify_password(&user, "wrong password"),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn passwordless_account_fails_with_generic_error() {
        // Social-only accounts have no hash; login must fail closed with
        // the same error as a wrong password, not crash.
        let user = user_with_hash(None);
        assert!(matches!(
            PostgresRepository::verify_password(&user, "anything"),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn hashes_are_salted() {
        let a = password_hash("same input").unwrap();
        let b = password_hash("same input").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn dummy_verify_does_not_panic() {
        PostgresRepository::dummy_verify("probe");
    }
}
