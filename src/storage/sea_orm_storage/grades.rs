use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::grades::{ActiveModel, Column, Entity as Grades};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    grades::{
        entities::Grade,
        requests::{CreateGradeRequest, GradeListParams, UpdateGradeRequest},
    },
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};

fn grade_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PortalError::validation("Grade name must not be empty"));
    }
    Ok(name.to_string())
}

impl SeaOrmStorage {
    pub async fn create_grade_impl(&self, req: CreateGradeRequest) -> Result<Grade> {
        let now = now_ts();

        let model = ActiveModel {
            name: Set(grade_name(&req.name)?),
            level: Set(req.level),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建年级失败"))?;

        Ok(result.into_grade())
    }

    pub async fn get_grade_impl(&self, id: i64) -> Result<Option<Grade>> {
        let result = Grades::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询年级失败"))?;

        Ok(result.map(|m| m.into_grade()))
    }

    /// 按层级升序
    pub async fn list_grades_impl(&self, query: GradeListParams) -> Result<PaginatedResponse<Grade>> {
        let (page, size) = query.pagination.normalized();

        let paginator = Grades::find()
            .order_by_asc(Column::Level)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询年级总数失败"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询年级列表失败"))?;

        Ok(PaginatedResponse {
            items: items.into_iter().map(|m| m.into_grade()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_grade_impl(
        &self,
        id: i64,
        update: UpdateGradeRequest,
    ) -> Result<Option<Grade>> {
        let Some(existing) = Grades::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询年级失败"))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(name) = update.name {
            model.name = Set(grade_name(&name)?);
        }
        if let Some(level) = update.level {
            model.level = Set(level);
        }

        let updated = model.update(&self.db).await.map_err(db_err("更新年级失败"))?;

        Ok(Some(updated.into_grade()))
    }

    pub async fn delete_grade_impl(&self, id: i64) -> Result<bool> {
        let result = Grades::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除年级失败"))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{campus, enroll, grade, memory_storage, student};
    use crate::models::PaginationQuery;
    use crate::models::grades::requests::{GradeListParams, UpdateGradeRequest};
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_grades_listed_by_level() {
        let storage = memory_storage().await;
        grade(&storage, "Grade 12", 12).await;
        grade(&storage, "Grade 9", 9).await;

        let page = storage
            .list_grades(GradeListParams {
                pagination: PaginationQuery::default(),
            })
            .await
            .unwrap();
        let levels: Vec<i32> = page.items.iter().map(|g| g.level).collect();
        assert_eq!(levels, vec![9, 12]);
    }

    #[tokio::test]
    async fn test_update_grade_rejects_blank_name() {
        let storage = memory_storage().await;
        let g = grade(&storage, "Grade 9", 9).await;
        let err = storage
            .update_grade(
                g.id,
                UpdateGradeRequest {
                    name: Some("  ".to_string()),
                    level: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
        assert!(storage.delete_grade(g.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_grade_with_enrollments_cannot_be_deleted() {
        let c = campus().await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;
        let e = enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;

        let err = c.storage.delete_grade(c.grade_a.id).await.unwrap_err();
        assert_eq!(err.code(), "E010");
        let err = c.storage.delete_tutor(c.tutor.id).await.unwrap_err();
        assert_eq!(err.code(), "E010");

        // 选课记录保留
        let kept = c.storage.list_student_enrollments(s.id).await.unwrap();
        assert!(kept.iter().any(|k| k.enrollment.id == e.id));

        assert!(c.storage.delete_grade(c.grade_b.id).await.unwrap());
    }
}
