use actix_web::{HttpResponse, Result as ActixResult, http::header};

use crate::errors::PortalError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;
use crate::utils::upload::content_type_for;
use crate::utils::{SafeFileName, UploadStore};

/// 上传目录的只读访问，不依赖存储
pub struct FileService {
    store: Option<UploadStore>,
}

impl FileService {
    pub fn new_lazy() -> Self {
        Self { store: None }
    }

    pub fn with_store(store: UploadStore) -> Self {
        Self { store: Some(store) }
    }

    fn store(&self) -> UploadStore {
        self.store.clone().unwrap_or_else(UploadStore::from_config)
    }

    pub async fn serve_upload(&self, file: SafeFileName) -> ActixResult<HttpResponse> {
        let store = self.store();
        let Some(path) = store.path_for_name(&file.0) else {
            return Ok(file_not_found());
        };

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(HttpResponse::Ok()
                .insert_header((header::CONTENT_TYPE, content_type_for(&file.0)))
                .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
                .body(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(file_not_found()),
            Err(e) => Ok(error_response(&PortalError::from(e))),
        }
    }
}

fn file_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::FileNotFound,
        "File not found",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::PendingUpload;
    use actix_web::{App, test, web};
    use std::sync::Arc;

    fn temp_store() -> UploadStore {
        let dir = std::env::temp_dir().join(format!("portal-files-{}", uuid::Uuid::new_v4()));
        UploadStore::new(dir, "/uploads".to_string(), 1024, vec!["txt".into()], false)
    }

    #[actix_web::test]
    async fn test_serves_stored_file_and_404s_unknown() {
        let store = temp_store();
        let stored = store
            .save_all(&[PendingUpload {
                file_name: "notes.txt".into(),
                data: b"hello".to_vec(),
            }])
            .await
            .unwrap();
        let name = stored[0].file_url.trim_start_matches("/uploads/").to_string();

        let service = Arc::new(FileService::with_store(store.clone()));
        let app = test::init_service(App::new().route(
            "/uploads/{file}",
            web::get().to(move |file: SafeFileName| {
                let service = service.clone();
                async move { service.serve_upload(file).await }
            }),
        ))
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/uploads/{name}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(test::read_body(resp).await, "hello");

        let req = test::TestRequest::get()
            .uri("/uploads/missing.txt")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }
}
