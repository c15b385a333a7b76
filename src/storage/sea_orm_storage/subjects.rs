use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::subjects::{ActiveModel, Column, Entity as Subjects};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    subjects::{
        entities::Subject,
        requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PortalError::validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

impl SeaOrmStorage {
    pub async fn create_subject_impl(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let now = now_ts();

        let model = ActiveModel {
            name: Set(required(&req.name, "Name")?),
            code: Set(required(&req.code, "Code")?),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建科目失败"))?;

        Ok(result.into_subject())
    }

    pub async fn get_subject_impl(&self, id: i64) -> Result<Option<Subject>> {
        let result = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询科目失败"))?;

        Ok(result.map(|m| m.into_subject()))
    }

    pub async fn list_subjects_impl(
        &self,
        query: SubjectListParams,
    ) -> Result<PaginatedResponse<Subject>> {
        let (page, size) = query.pagination.normalized();

        let mut select = Subjects::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Name.contains(&escaped))
                    .add(Column::Code.contains(&escaped)),
            );
        }

        let paginator = select.order_by_asc(Column::Name).paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询科目总数失败"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询科目列表失败"))?;

        Ok(PaginatedResponse {
            items: items.into_iter().map(|m| m.into_subject()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_subject_impl(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        let Some(existing) = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询科目失败"))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(name) = update.name {
            model.name = Set(required(&name, "Name")?);
        }
        if let Some(code) = update.code {
            model.code = Set(required(&code, "Code")?);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        let updated = model.update(&self.db).await.map_err(db_err("更新科目失败"))?;

        Ok(Some(updated.into_subject()))
    }

    /// 仍有导师归属的科目无法删除（外键冲突）
    pub async fn delete_subject_impl(&self, id: i64) -> Result<bool> {
        let result = Subjects::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除科目失败"))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, subject, tutor};
    use crate::models::PaginationQuery;
    use crate::models::subjects::requests::{SubjectListParams, UpdateSubjectRequest};
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_subject_crud() {
        let storage = memory_storage().await;
        let math = subject(&storage, "MATH").await;
        subject(&storage, "PHYS").await;

        let page = storage
            .list_subjects(SubjectListParams {
                pagination: PaginationQuery::default(),
                search: Some("PHY".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);

        let updated = storage
            .update_subject(
                math.id,
                UpdateSubjectRequest {
                    description: Some("Algebra".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Algebra"));

        assert!(storage.delete_subject(math.id).await.unwrap());
        assert!(storage.get_subject(math.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let storage = memory_storage().await;
        subject(&storage, "MATH").await;
        let err = storage
            .create_subject(crate::models::subjects::requests::CreateSubjectRequest {
                name: "Other".to_string(),
                code: "MATH".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E010");
    }

    #[tokio::test]
    async fn test_subject_with_tutor_cannot_be_deleted() {
        let storage = memory_storage().await;
        let math = subject(&storage, "MATH").await;
        tutor(&storage, "t1", math.id).await;
        let err = storage.delete_subject(math.id).await.unwrap_err();
        assert_eq!(err.code(), "E010");
    }
}
