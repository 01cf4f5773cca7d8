use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{Database, DbError};

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl User {
    fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
        Ok(Self {
            id: Uuid::parse_str(row.try_get::<&str, _>("id")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
        })
    }
}

impl Database {
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, DbError> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            password: password_hash.to_string(),
        };

        sqlx::query(
            "INSERT INTO users (id, created_at, updated_at, email, password) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(&user.email)
        .bind(&user.password)
        .execute(self.pool())
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, DbError> {
        sqlx::query("SELECT id, created_at, updated_at, email, password FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?
            .map(|row| User::from_row(&row))
            .transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        sqlx::query(
            "SELECT id, created_at, updated_at, email, password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?
        .map(|row| User::from_row(&row))
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn create_and_lookup_user() {
        let db = Database::in_memory().await.unwrap();
        let user = db.create_user("a@example.com", "hash").await.unwrap();

        let by_id = db.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");

        let by_email = db.get_user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(db.get_user_by_email("b@example.com").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        db.create_user("a@example.com", "hash").await.unwrap();
        assert!(db.create_user("a@example.com", "hash").await.is_err());
    }

    #[test]
    fn password_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            email: "a@example.com".into(),
            password: "secret-hash".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password"));
    }
}
