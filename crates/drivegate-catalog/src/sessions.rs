use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::{Pool, Sqlite};
use tracing::{debug, instrument};

use crate::error::CatalogError;

/// Entropy of a bearer token, in bytes.
const TOKEN_BYTES: usize = 32;

/// Issues and validates bearer tokens.
///
/// Tokens carry no expiry: they stay valid until revoked. Unknown and
/// revoked tokens are indistinguishable to callers.
#[derive(Clone)]
pub struct SessionRegistry {
    pool: Pool<Sqlite>,
}

impl SessionRegistry {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create a session for `space_id` and return the token.
    ///
    /// The token is returned exactly once, here, and is never logged.
    #[instrument(skip(self), level = "debug")]
    pub async fn create_session(&self, space_id: &str) -> Result<String, CatalogError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        sqlx::query("INSERT INTO sessions (token, space_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(space_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!("Created session for space {}", space_id);
        Ok(token)
    }

    /// Look up the space a token belongs to.
    #[instrument(skip_all, level = "debug")]
    pub async fn resolve(&self, token: &str) -> Result<Option<String>, CatalogError> {
        let space_id =
            sqlx::query_scalar::<_, String>("SELECT space_id FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        Ok(space_id)
    }

    /// Delete a session. Revoking an unknown token is not an error.
    #[instrument(skip_all, level = "debug")]
    pub async fn revoke(&self, token: &str) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_token_lifecycle() {
        let db = Database::open_in_memory().await.unwrap();
        let sessions = db.sessions();

        let token = sessions.create_session("alice").await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap().as_deref(), Some("alice"));

        sessions.revoke(&token).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), None);

        // Revoking again is a no-op, not an error.
        sessions.revoke(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_tokens_are_unique_and_opaque() {
        let db = Database::open_in_memory().await.unwrap();
        let sessions = db.sessions();

        let a = sessions.create_session("alice").await.unwrap();
        let b = sessions.create_session("alice").await.unwrap();
        assert_ne!(a, b);
        // 32 random bytes in unpadded url-safe base64.
        assert_eq!(a.len(), 43);

        // Concurrent sessions for the same space are both valid.
        assert_eq!(sessions.resolve(&a).await.unwrap().as_deref(), Some("alice"));
        assert_eq!(sessions.resolve(&b).await.unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let db = Database::open_in_memory().await.unwrap();
        let sessions = db.sessions();
        assert_eq!(sessions.resolve("not-a-token").await.unwrap(), None);
    }
}
