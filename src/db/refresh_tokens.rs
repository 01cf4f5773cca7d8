use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{Database, DbError, User};

impl Database {
    pub async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at, revoked_at)
             VALUES (?, ?, ?, ?, ?, NULL)",
        )
        .bind(token)
        .bind(now)
        .bind(now)
        .bind(user_id.to_string())
        .bind(expires_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Owner of a refresh token that is neither revoked nor expired.
    pub async fn get_user_by_refresh_token(&self, token: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query(
            "SELECT user_id, expires_at FROM refresh_tokens WHERE token = ? AND revoked_at IS NULL",
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        if expires_at <= Utc::now() {
            return Ok(None);
        }

        let user_id = Uuid::parse_str(row.try_get::<&str, _>("user_id")?)?;
        self.get_user(user_id).await
    }

    pub async fn revoke_refresh_token(&self, token: &str) -> Result<(), DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ?, updated_at = ? WHERE token = ? AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(token)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[actix_web::test]
    async fn revoked_and_expired_tokens_resolve_to_nobody() {
        let db = Database::in_memory().await.unwrap();
        let user = db.create_user("a@example.com", "hash").await.unwrap();

        db.create_refresh_token("live", user.id, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        db.create_refresh_token("stale", user.id, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        let owner = db.get_user_by_refresh_token("live").await.unwrap().unwrap();
        assert_eq!(owner.id, user.id);
        assert!(db.get_user_by_refresh_token("stale").await.unwrap().is_none());
        assert!(db.get_user_by_refresh_token("unknown").await.unwrap().is_none());

        db.revoke_refresh_token("live").await.unwrap();
        assert!(db.get_user_by_refresh_token("live").await.unwrap().is_none());
        assert!(matches!(
            db.revoke_refresh_token("live").await,
            Err(DbError::NotFound)
        ));
    }
}
