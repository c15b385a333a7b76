use actix_web::{HttpResponse, Result as ActixResult, middleware, web};
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::services::FileService;
use crate::utils::SafeFileName;

// 懒加载的全局 FileService 实例
static FILE_SERVICE: Lazy<FileService> = Lazy::new(FileService::new_lazy);

pub async fn serve_upload(file: SafeFileName) -> ActixResult<HttpResponse> {
    FILE_SERVICE.serve_upload(file).await
}

// 上传目录只读公开在 public_url_prefix 下
pub fn configure_file_routes(cfg: &mut web::ServiceConfig) {
    let prefix = AppConfig::get()
        .upload
        .public_url_prefix
        .trim_end_matches('/')
        .to_string();
    cfg.service(
        web::scope(&prefix)
            .wrap(middleware::Compress::default())
            .route("/{file}", web::get().to(serve_upload)),
    );
}
