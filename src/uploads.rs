use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use rand::Rng;
use time::OffsetDateTime;
use tracing::warn;

use crate::{error::ApiError, storage::StorageClient};

/// Accepted file field of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadRule {
    pub field: &'static str,
    pub dir: &'static str,
    pub max_files: usize,
    pub max_bytes: usize,
    pub images_only: bool,
}

pub struct UploadItem {
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

/// Text fields and accepted files of a multipart request.
#[derive(Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadItem>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Reads the whole form, enforcing `rule` on file parts. Files under other
/// field names are rejected.
pub async fn read_multipart(mut mp: Multipart, rule: &UploadRule) -> Result<MultipartForm, ApiError> {
    let mut form = MultipartForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        if file_name.is_none() {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid field {name}: {e}")))?;
            form.fields.insert(name, value);
            continue;
        }

        if name != rule.field {
            warn!(field = %name, "unexpected file field");
            return Err(ApiError::validation(format!("Unexpected file field {name}")));
        }
        if form.files.len() >= rule.max_files {
            return Err(ApiError::validation(format!(
                "At most {} file(s) allowed in {}",
                rule.max_files, rule.field
            )));
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());
        if rule.images_only && !content_type.starts_with("image/") {
            return Err(ApiError::validation("Only image files are allowed!"));
        }

        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid file upload: {e}")))?;
        if body.len() > rule.max_bytes {
            return Err(ApiError::validation(format!(
                "File too large (max {} bytes)",
                rule.max_bytes
            )));
        }
        // empty file inputs come through as zero-length parts
        if body.is_empty() {
            continue;
        }

        form.files.push(UploadItem {
            file_name,
            content_type,
            body,
        });
    }
    Ok(form)
}

/// Writes every file and returns their public URLs in order. On failure the
/// files already written are removed again.
pub async fn store_files(
    storage: &dyn StorageClient,
    rule: &UploadRule,
    files: Vec<UploadItem>,
) -> anyhow::Result<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let key = object_key(rule, &file);
        if let Err(e) = storage.put_object(&key, file.body).await {
            remove_files(storage, &urls).await;
            return Err(e);
        }
        urls.push(storage.public_url(&key));
    }
    Ok(urls)
}

/// Deletes stored files by public URL. Failures are logged, not returned.
pub async fn remove_files(storage: &dyn StorageClient, urls: &[String]) {
    for url in urls {
        let Some(key) = storage.key_from_url(url) else {
            warn!(%url, "not a managed upload, skipping delete");
            continue;
        };
        if let Err(e) = storage.delete_object(&key).await {
            warn!(error = %e, %key, "failed to delete upload");
        }
    }
}

fn object_key(rule: &UploadRule, file: &UploadItem) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let nonce: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = file
        .file_name
        .as_deref()
        .and_then(ext_from_name)
        .or_else(|| ext_from_mime(&file.content_type).map(str::to_string))
        .unwrap_or_else(|| "bin".into());
    format!("{}/{}-{}-{}.{}", rule.dir, rule.field, millis, nonce, ext)
}

fn ext_from_name(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::async_trait;

    use super::*;

    /// Accepts `capacity` puts, then fails every write.
    struct FullStorage {
        capacity: usize,
        objects: Mutex<HashMap<String, Bytes>>,
    }

    #[async_trait]
    impl StorageClient for FullStorage {
        async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
            let mut objects = self.objects.lock().unwrap();
            anyhow::ensure!(objects.len() < self.capacity, "disk full");
            objects.insert(key.to_string(), body);
            Ok(())
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/uploads/{key}")
        }

        fn key_from_url(&self, url: &str) -> Option<String> {
            url.strip_prefix("/uploads/").map(str::to_string)
        }
    }

    const RULE: UploadRule = UploadRule {
        field: "images",
        dir: "projects",
        max_files: 6,
        max_bytes: 1024,
        images_only: true,
    };

    fn item(name: Option<&str>, ct: &str) -> UploadItem {
        UploadItem {
            file_name: name.map(str::to_string),
            content_type: ct.into(),
            body: Bytes::from_static(b"x"),
        }
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_ext_from_name() {
        assert_eq!(ext_from_name("photo.PNG").as_deref(), Some("png"));
        assert_eq!(ext_from_name("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(ext_from_name("noext"), None);
        assert_eq!(ext_from_name("evil.p/hp"), None);
    }

    #[test]
    fn object_key_layout() {
        let key = object_key(&RULE, &item(Some("me.jpeg"), "image/jpeg"));
        assert!(key.starts_with("projects/images-"));
        assert!(key.ends_with(".jpeg"));

        let key = object_key(&RULE, &item(None, "image/webp"));
        assert!(key.ends_with(".webp"));

        let key = object_key(&RULE, &item(None, "application/x-unknown"));
        assert!(key.ends_with(".bin"));
    }

    #[tokio::test]
    async fn failed_store_removes_written_files() {
        let storage = FullStorage {
            capacity: 2,
            objects: Mutex::new(HashMap::new()),
        };
        let files = (0..3).map(|_| item(Some("a.png"), "image/png")).collect();

        let err = store_files(&storage, &RULE, files).await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_returns_urls_in_order() {
        let storage = FullStorage {
            capacity: 6,
            objects: Mutex::new(HashMap::new()),
        };
        let files = vec![item(Some("a.png"), "image/png"), item(None, "image/webp")];

        let urls = store_files(&storage, &RULE, files).await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("/uploads/projects/images-") && urls[0].ends_with(".png"));
        assert!(urls[1].ends_with(".webp"));
        assert_eq!(storage.objects.lock().unwrap().len(), 2);
    }
}
