//! 上传文件落盘
//!
//! 所有文件先在内存中校验（扩展名、大小、文件头），全部通过后才写入上传目录。

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{PortalError, Result};
use crate::models::submissions::requests::StoredFile;
use crate::utils::file_magic::validate_magic_bytes;

/// 已读入内存、尚未落盘的上传文件
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_url_prefix: String,
    max_size: usize,
    allowed_types: Vec<String>,
    verify_magic_bytes: bool,
}

/// 小写扩展名（不含点）
fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

impl UploadStore {
    pub fn new(
        dir: impl Into<PathBuf>,
        public_url_prefix: impl Into<String>,
        max_size: usize,
        allowed_types: Vec<String>,
        verify_magic_bytes: bool,
    ) -> Self {
        Self {
            dir: dir.into(),
            public_url_prefix: public_url_prefix.into().trim_end_matches('/').to_string(),
            max_size,
            allowed_types: allowed_types
                .into_iter()
                .map(|t| t.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            verify_magic_bytes,
        }
    }

    pub fn from_config() -> Self {
        let upload = &AppConfig::get().upload;
        Self::new(
            upload.dir.clone(),
            upload.public_url_prefix.clone(),
            upload.max_size,
            upload.allowed_types.clone(),
            upload.verify_magic_bytes,
        )
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 校验扩展名是否在白名单内，返回小写扩展名
    pub fn check_extension(&self, file_name: &str) -> Result<String> {
        let ext = extension_of(file_name).ok_or_else(|| {
            PortalError::validation(format!("File '{file_name}' has no extension"))
        })?;
        if !self.allowed_types.iter().any(|t| *t == ext) {
            return Err(PortalError::validation(format!(
                "File type '.{ext}' is not allowed"
            )));
        }
        Ok(ext)
    }

    /// 完整校验单个文件
    pub fn validate(&self, upload: &PendingUpload) -> Result<String> {
        let ext = self.check_extension(&upload.file_name)?;
        if upload.data.is_empty() {
            return Err(PortalError::validation(format!(
                "File '{}' is empty",
                upload.file_name
            )));
        }
        if upload.data.len() > self.max_size {
            return Err(PortalError::validation(format!(
                "File '{}' exceeds the size limit of {} bytes",
                upload.file_name, self.max_size
            )));
        }
        if self.verify_magic_bytes && !validate_magic_bytes(&upload.data, &ext) {
            return Err(PortalError::validation(format!(
                "Content of '{}' does not match its extension",
                upload.file_name
            )));
        }
        Ok(ext)
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// 校验全部文件后依次写入；中途失败会删除本批已写入的文件
    pub async fn save_all(&self, uploads: &[PendingUpload]) -> Result<Vec<StoredFile>> {
        if uploads.is_empty() {
            return Err(PortalError::validation("At least one file is required"));
        }
        let extensions = uploads
            .iter()
            .map(|u| self.validate(u))
            .collect::<Result<Vec<_>>>()?;

        self.ensure_dir().await?;

        let mut stored = Vec::with_capacity(uploads.len());
        for (upload, ext) in uploads.iter().zip(extensions) {
            let name = format!("{}-{}.{}", chrono::Utc::now().timestamp(), Uuid::new_v4(), ext);
            if let Err(e) = tokio::fs::write(self.dir.join(&name), &upload.data).await {
                self.remove_stored(&stored).await;
                return Err(PortalError::file_operation(format!(
                    "Failed to write '{}': {e}",
                    upload.file_name
                )));
            }
            stored.push(StoredFile {
                file_name: upload.file_name.clone(),
                file_url: format!("{}/{}", self.public_url_prefix, name),
            });
        }
        Ok(stored)
    }

    pub async fn remove_stored(&self, files: &[StoredFile]) {
        let urls: Vec<String> = files.iter().map(|f| f.file_url.clone()).collect();
        self.remove_urls(&urls).await;
    }

    /// 尽力删除；不属于本目录的 URL 被忽略
    pub async fn remove_urls(&self, urls: &[String]) {
        for url in urls {
            let Some(path) = self.path_for_url(url) else {
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!("Failed to remove upload {}: {}", path.display(), e);
            }
        }
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(&self.public_url_prefix)?.strip_prefix('/')?;
        self.path_for_name(name)
    }

    /// 只接受本存储生成的平铺文件名
    pub fn path_for_name(&self, name: &str) -> Option<PathBuf> {
        let safe = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains("..")
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
        safe.then(|| self.dir.join(name))
    }
}

/// 按扩展名推断 Content-Type
pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("txt") => "text/plain; charset=utf-8",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> UploadStore {
        UploadStore::new(
            dir,
            "/uploads/",
            16,
            vec!["pdf".into(), "txt".into(), "png".into()],
            true,
        )
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("portal-upload-{}", Uuid::new_v4()))
    }

    fn upload(name: &str, data: &[u8]) -> PendingUpload {
        PendingUpload {
            file_name: name.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_validation_rules() {
        let s = store(Path::new("unused"));
        assert_eq!(s.validate(&upload("Essay.PDF", b"%PDF-1.4")).unwrap(), "pdf");
        assert!(s.validate(&upload("run.exe", b"MZ")).is_err());
        assert!(s.validate(&upload("noext", b"abc")).is_err());
        assert!(s.validate(&upload("big.txt", &[b'a'; 17])).is_err());
        assert!(s.validate(&upload("fake.png", b"%PDF-1.4")).is_err());
        assert!(s.validate(&upload("empty.txt", b"")).is_err());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = temp_dir();
        let s = store(&dir);
        let stored = s
            .save_all(&[upload("a.txt", b"hello"), upload("b.pdf", b"%PDF-1.4")])
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].file_url.starts_with("/uploads/"));
        assert!(stored[0].file_url.ends_with(".txt"));
        assert_eq!(stored[1].file_name, "b.pdf");

        let name = stored[0].file_url.trim_start_matches("/uploads/");
        let path = s.path_for_name(name).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        s.remove_stored(&stored).await;
        assert!(!path.exists());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_one_bad_file_writes_nothing() {
        let dir = temp_dir();
        let s = store(&dir);
        let err = s
            .save_all(&[upload("a.txt", b"hello"), upload("b.png", b"not png")])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
        assert!(!dir.exists());
    }

    #[test]
    fn test_path_for_name_rejects_traversal() {
        let s = store(Path::new("/srv/uploads"));
        assert!(s.path_for_name("1700000000-abc.pdf").is_some());
        assert!(s.path_for_name("../etc/passwd").is_none());
        assert!(s.path_for_name("a/b.txt").is_none());
        assert!(s.path_for_name(".hidden").is_none());
        assert_eq!(content_type_for("x.JPG"), "image/jpeg");
    }
}
