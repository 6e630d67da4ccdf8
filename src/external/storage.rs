//! Object storage for profile pictures.

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, defaults};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Builder as S3ConfigBuilder, Region},
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

/// Largest accepted aspect ratio (width / height).
pub const MAX_RATIO: f64 = 10.0;

/// Image formats accepted as profile pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    /// Detects the format from the file signature.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageKind::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageKind::Png),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
                Some(ImageKind::Webp)
            }
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
        }
    }
}

/// Checks an upload against the size limit and ratio bounds.
pub fn validate_image(bytes: &[u8], ratio: f64, max_file_size: usize) -> AppResult<ImageKind> {
    if bytes.is_empty() {
        return Err(AppError::bad_request("Image is empty"));
    }
    if bytes.len() > max_file_size {
        return Err(AppError::UnprocessableContent {
            message: format!("Image exceeds the {max_file_size} byte limit"),
        });
    }
    if !(ratio > 0.0 && ratio <= MAX_RATIO) {
        return Err(AppError::bad_request(format!(
            "Ratio must be greater than 0 and at most {MAX_RATIO}"
        )));
    }
    ImageKind::sniff(bytes).ok_or_else(|| AppError::UnprocessableContent {
        message: "Only JPEG, PNG and WebP images are supported".to_string(),
    })
}

/// Stores images and returns their public URL.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload_image(
        &self,
        user_id: i32,
        image: Bytes,
        kind: ImageKind,
        ratio: f64,
    ) -> AppResult<String>;

    /// Deletes a previously returned URL. Foreign URLs are ignored.
    async fn delete_file(&self, url: &str) -> AppResult<()>;
}

/// S3-compatible uploader.
#[derive(Clone)]
pub struct S3Uploader {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3Uploader {
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let mut loader =
            defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let mut builder = S3ConfigBuilder::from(&shared).force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::info!(
            bucket = %config.bucket,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Object storage configured"
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        })
    }

    fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        key_from_url(&self.public_url, url)
    }
}

/// Object key of `url` when it lives under `public_url`.
pub(crate) fn key_from_url<'a>(public_url: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(public_url)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|key| !key.is_empty())
}

#[async_trait]
impl Uploader for S3Uploader {
    async fn upload_image(
        &self,
        user_id: i32,
        image: Bytes,
        kind: ImageKind,
        ratio: f64,
    ) -> AppResult<String> {
        let key = format!("pictures/{}/{}.{}", user_id, Uuid::new_v4(), kind.extension());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(image))
            .content_type(kind.content_type())
            .metadata("ratio", ratio.to_string())
            .send()
            .await
            .context("s3 put_object")?;

        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn delete_file(&self, url: &str) -> AppResult<()> {
        let Some(key) = self.key_from_url(url) else {
            tracing::debug!(url, "Skipping delete of a URL outside the bucket");
            return Ok(());
        };

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_sniff() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"GIF89a"), None);
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image(PNG, 1.0, 1024).unwrap(), ImageKind::Png);
        assert!(matches!(
            validate_image(PNG, 0.0, 1024),
            Err(AppError::BadRequest { .. })
        ));
        assert!(matches!(
            validate_image(PNG, 10.5, 1024),
            Err(AppError::BadRequest { .. })
        ));
        assert!(matches!(
            validate_image(PNG, 1.0, 4),
            Err(AppError::UnprocessableContent { .. })
        ));
        assert!(matches!(
            validate_image(b"GIF89a", 1.0, 1024),
            Err(AppError::UnprocessableContent { .. })
        ));
        assert!(matches!(
            validate_image(&[], 1.0, 1024),
            Err(AppError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_key_from_url() {
        let base = "http://localhost:9000/accounts";
        assert_eq!(
            key_from_url(base, "http://localhost:9000/accounts/pictures/1/a.png"),
            Some("pictures/1/a.png")
        );
        assert_eq!(key_from_url(base, "https://gravatar.com/avatar/1"), None);
        assert_eq!(key_from_url(base, base), None);
        assert_eq!(key_from_url(base, "http://localhost:9000/accounts-other/x"), None);
    }
}
