use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;

use super::SubmissionService;
use crate::config::AppConfig;
use crate::errors::PortalError;
use crate::models::{ApiResponse, ErrorCode, submissions::requests::SubmitWork};
use crate::services::{error_response, local_now, not_found_as, resolve_student_id};
use crate::utils::{PendingUpload, UploadStore};

/// 解析后的提交表单
#[derive(Debug, Default)]
struct SubmitForm {
    files: Vec<PendingUpload>,
    group_member_ids: Vec<i64>,
}

fn parse_group_members(raw: &str) -> Result<Vec<i64>, PortalError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<i64>>(raw).map_err(|_| {
        PortalError::validation("groupMembers must be a JSON array of student ids")
    })
}

/// 非文件字段的字节上限
const MAX_FIELD_BYTES: usize = 4 * 1024;
/// 单次提交允许的文件数
const MAX_FILES: usize = 10;

fn is_file_field(name: &str) -> bool {
    matches!(name, "file" | "files")
}

fn field_limit(name: &str, store: &UploadStore) -> usize {
    if is_file_field(name) {
        store.max_size()
    } else {
        MAX_FIELD_BYTES
    }
}

/// 读取整个 multipart；任一字段超过上限或文件过多时立即中止
async fn read_form(mut payload: Multipart, store: &UploadStore) -> Result<SubmitForm, PortalError> {
    let mut form = SubmitForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| PortalError::validation(format!("Malformed multipart payload: {e}")))?
    {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string());

        if is_file_field(&name) && form.files.len() >= MAX_FILES {
            return Err(PortalError::validation(format!(
                "At most {MAX_FILES} files can be submitted at once"
            )));
        }
        let known = is_file_field(&name) || matches!(name.as_str(), "groupMembers" | "group_members");
        let limit = field_limit(&name, store);

        let mut data = Vec::new();
        let mut read = 0usize;
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| PortalError::validation(format!("Failed to read upload: {e}")))?
        {
            read += chunk.len();
            if read > limit {
                return Err(if is_file_field(&name) {
                    PortalError::validation(format!(
                        "File '{}' exceeds the size limit of {} bytes",
                        file_name.as_deref().unwrap_or("upload"),
                        limit
                    ))
                } else {
                    PortalError::validation(format!(
                        "Field '{name}' exceeds the size limit of {limit} bytes"
                    ))
                });
            }
            // 未知字段只计数不缓存
            if known {
                data.extend_from_slice(&chunk);
            }
        }

        match name.as_str() {
            "file" | "files" => {
                let file_name = file_name
                    .filter(|n| !n.trim().is_empty())
                    .ok_or_else(|| PortalError::validation("Uploaded file has no file name"))?;
                form.files.push(PendingUpload { file_name, data });
            }
            "groupMembers" | "group_members" => {
                let raw = String::from_utf8(data)
                    .map_err(|_| PortalError::validation("groupMembers must be UTF-8 text"))?;
                form.group_member_ids = parse_group_members(&raw)?;
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

pub async fn handle_submit(
    service: &SubmissionService,
    assignment_id: i64,
    payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let student_id = match resolve_student_id(request, &storage).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    let store = UploadStore::from_config();
    let form = match read_form(payload, &store).await {
        Ok(form) => form,
        Err(e) => return Ok(error_response(&e)),
    };

    // 全部文件校验通过后才落盘
    let stored = match store.save_all(&form.files).await {
        Ok(stored) => stored,
        Err(e) => return Ok(error_response(&e)),
    };

    let work = SubmitWork {
        assignment_id,
        student_id,
        group_member_ids: form.group_member_ids,
        files: stored.clone(),
        now: local_now(),
        grace_period_hours: AppConfig::get().workflow.grace_period_hours,
    };

    match storage.submit_work(work).await {
        Ok(outcome) => {
            store.remove_urls(&outcome.replaced_file_urls).await;
            let response = outcome.response;
            tracing::info!(
                "Submission {} accepted for assignment {} (late: {}, files: {}, members: {})",
                response.submission_id,
                assignment_id,
                response.is_late,
                response.files.len(),
                response.group_member_ids.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Submission accepted",
            )))
        }
        Err(e) => {
            // 事务已回滚，撤销本次写入的文件
            store.remove_stored(&stored).await;
            Ok(not_found_as(&e, ErrorCode::AssignmentNotFound))
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::header::{self, HeaderMap, HeaderValue};
    use actix_web::web::Bytes;

    use super::*;

    const BOUNDARY: &str = "portal-boundary";

    fn store() -> UploadStore {
        UploadStore::new(
            std::env::temp_dir(),
            "/uploads/",
            16,
            vec!["txt".into()],
            false,
        )
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: text/plain\r\n\r\n{value}\r\n"
        )
    }

    fn multipart(parts: &[String]) -> Multipart {
        let mut body = parts.concat();
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/form-data; boundary={BOUNDARY}")).unwrap(),
        );
        let stream = futures_util::stream::once(async move {
            Ok::<_, actix_web::error::PayloadError>(Bytes::from(body))
        });
        Multipart::new(&headers, stream)
    }

    #[test]
    fn test_parse_group_members() {
        assert_eq!(parse_group_members("[3, 4]").unwrap(), vec![3, 4]);
        assert!(parse_group_members("  ").unwrap().is_empty());
        assert_eq!(
            parse_group_members("3,4").unwrap_err().code(),
            "E007"
        );
    }

    #[actix_web::test]
    async fn test_read_form_accepts_small_submission() {
        let form = read_form(
            multipart(&[file_part("a.txt", "hello"), text_part("groupMembers", "[7, 8]")]),
            &store(),
        )
        .await
        .unwrap();
        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].data, b"hello");
        assert_eq!(form.group_member_ids, vec![7, 8]);
    }

    #[actix_web::test]
    async fn test_read_form_bounds_every_field() {
        let big = "1".repeat(MAX_FIELD_BYTES + 1);
        let err = read_form(multipart(&[text_part("groupMembers", &big)]), &store())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let err = read_form(multipart(&[text_part("junk", &big)]), &store())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        // 小的未知字段照常忽略
        let form = read_form(multipart(&[text_part("note", "hi")]), &store())
            .await
            .unwrap();
        assert!(form.files.is_empty());

        let err = read_form(multipart(&[file_part("a.txt", &"x".repeat(17))]), &store())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[actix_web::test]
    async fn test_read_form_limits_file_count() {
        let parts: Vec<String> = (0..=MAX_FILES)
            .map(|i| file_part(&format!("{i}.txt"), "x"))
            .collect();
        let err = read_form(multipart(&parts), &store()).await.unwrap_err();
        assert_eq!(err.code(), "E007");
        assert!(err.message().contains("At most"));

        let form = read_form(multipart(&parts[..MAX_FILES]), &store())
            .await
            .unwrap();
        assert_eq!(form.files.len(), MAX_FILES);
    }
}
