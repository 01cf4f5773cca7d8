use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{Database, DbError};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Video {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoParams {
    pub title: String,
    pub description: String,
}

const VIDEO_COLUMNS: &str =
    "id, created_at, updated_at, thumbnail_url, video_url, title, description, user_id";

impl Video {
    fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
        Ok(Self {
            id: Uuid::parse_str(row.try_get::<&str, _>("id")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            thumbnail_url: row.try_get("thumbnail_url")?,
            video_url: row.try_get("video_url")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            user_id: Uuid::parse_str(row.try_get::<&str, _>("user_id")?)?,
        })
    }
}

impl Database {
    pub async fn create_video(
        &self,
        user_id: Uuid,
        params: &CreateVideoParams,
    ) -> Result<Video, DbError> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            thumbnail_url: None,
            video_url: None,
            title: params.title.clone(),
            description: params.description.clone(),
            user_id,
        };

        sqlx::query(&format!(
            "INSERT INTO videos ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            VIDEO_COLUMNS
        ))
        .bind(video.id.to_string())
        .bind(video.created_at)
        .bind(video.updated_at)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.user_id.to_string())
        .execute(self.pool())
        .await?;

        Ok(video)
    }

    pub async fn get_video(&self, id: Uuid) -> Result<Option<Video>, DbError> {
        sqlx::query(&format!("SELECT {} FROM videos WHERE id = ?", VIDEO_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?
            .map(|row| Video::from_row(&row))
            .transpose()
    }

    /// All videos of a user, newest first.
    pub async fn get_videos(&self, user_id: Uuid) -> Result<Vec<Video>, DbError> {
        sqlx::query(&format!(
            "SELECT {} FROM videos WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            VIDEO_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await?
        .iter()
        .map(Video::from_row)
        .collect()
    }

    /// Persists the mutable fields of `video` and bumps `updated_at`.
    pub async fn update_video(&self, video: &mut Video) -> Result<(), DbError> {
        video.updated_at = Utc::now();
        let result = sqlx::query(
            "UPDATE videos SET title = ?, description = ?, thumbnail_url = ?, video_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.updated_at)
        .bind(video.id.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_video(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
