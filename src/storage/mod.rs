use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Region, presigning::PresigningConfig, primitives::ByteStream, Client};
use lazy_static::lazy_static;
use log::info;

use crate::{config::S3Settings, db::Video};

pub mod thumbnail;

pub use thumbnail::ThumbnailStore;

lazy_static! {
    /// File extensions for the media types the service accepts.
    pub static ref MEDIA_EXTENSIONS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("image/jpeg", "jpg");
        map.insert("image/png", "png");
        map.insert("video/mp4", "mp4");
        map
    };
}

/// Random object/file name for an upload of `media_type`, e.g. `3fa1…9c.mp4`.
pub fn asset_key(media_type: &str) -> anyhow::Result<String> {
    let ext = MEDIA_EXTENSIONS
        .get(media_type)
        .ok_or_else(|| anyhow!("no file extension known for {}", media_type))?;
    let rand: [u8; 32] = rand::random();
    Ok(format!("{}.{}", hex::encode(rand), ext))
}

/// Videos live in one bucket. Records store `bucket,key`; readers get a
/// short-lived presigned GET URL instead.
#[derive(Clone)]
pub struct VideoStorage {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

impl VideoStorage {
    pub async fn connect(settings: &S3Settings) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint {
            info!("using custom s3 endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::from_conf(builder.build(), settings)
    }

    pub fn from_conf(conf: aws_sdk_s3::Config, settings: &S3Settings) -> Self {
        Self {
            client: Client::from_conf(conf),
            bucket: settings.bucket.clone(),
            presign_expiry: settings.presign_expiry,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Value stored in `Video::video_url` for an object in our bucket.
    pub fn bucket_key(&self, key: &str) -> String {
        format!("{},{}", self.bucket, key)
    }

    pub async fn put_video(&self, key: &str, path: &Path, content_type: &str) -> anyhow::Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("failed to open {} for upload", path.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .with_context(|| format!("failed to upload {} to s3", key))?;

        info!("uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    pub async fn delete_video(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to delete s3://{}/{}", self.bucket, key))?;

        info!("deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }

    pub async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .context("invalid presign expiry")?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .with_context(|| format!("failed to presign s3://{}/{}", bucket, key))?;

        Ok(request.uri().to_string())
    }

    /// Swaps a stored `bucket,key` video URL for a presigned one. Videos
    /// without a URL, or with one in another form, come back unchanged.
    pub async fn sign_video(&self, mut video: Video) -> anyhow::Result<Video> {
        let Some((bucket, key)) = video.video_url.as_deref().and_then(split_bucket_key) else {
            return Ok(video);
        };

        let url = self.presign_get(bucket, key, self.presign_expiry).await?;
        video.video_url = Some(url);
        Ok(video)
    }

    pub async fn sign_videos(&self, videos: Vec<Video>) -> anyhow::Result<Vec<Video>> {
        let mut signed = Vec::with_capacity(videos.len());
        for video in videos {
            signed.push(self.sign_video(video).await?);
        }
        Ok(signed)
    }
}

pub fn split_bucket_key(stored: &str) -> Option<(&str, &str)> {
    match stored.split_once(',') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Some((bucket, key)),
        _ => None,
    }
}
