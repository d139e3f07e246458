use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{debug, instrument};

use crate::error::CatalogError;

/// A registered tenant namespace. The password digest stays internal.
#[derive(Debug, Clone, Serialize)]
pub struct Space {
    pub space_id: String,
    pub created_at: DateTime<Utc>,
}

/// Persists space identities and password digests.
///
/// Digests are Argon2id PHC strings with a per-space random salt, so two
/// spaces with the same password store different digests and verification
/// is not vulnerable to timing comparison of raw hashes.
#[derive(Clone)]
pub struct CredentialStore {
    pool: Pool<Sqlite>,
}

impl CredentialStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Register a new space. Fails with `AlreadyExists` if the id is taken.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn register(&self, space_id: &str, password: &str) -> Result<Space, CatalogError> {
        let taken = sqlx::query_scalar::<_, String>(
            "SELECT space_id FROM spaces WHERE space_id = ?",
        )
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?
        .is_some();
        if taken {
            return Err(CatalogError::AlreadyExists(space_id.to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CatalogError::Digest(e.to_string()))?
            .to_string();

        let created_at = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO spaces (space_id, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(space_id)
        .bind(&digest)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                debug!("Registered space {}", space_id);
                Ok(Space {
                    space_id: space_id.to_string(),
                    created_at,
                })
            }
            // Two concurrent registrations can both pass the pre-check;
            // the primary key settles the race.
            Err(e) if is_unique_violation(&e) => {
                Err(CatalogError::AlreadyExists(space_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check a password against the stored digest. Unknown spaces verify
    /// as false, indistinguishable from a wrong password.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn verify(&self, space_id: &str, password: &str) -> Result<bool, CatalogError> {
        let digest = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM spaces WHERE space_id = ?",
        )
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(digest) = digest else {
            return Ok(false);
        };
        let parsed =
            PasswordHash::new(&digest).map_err(|e| CatalogError::Digest(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
