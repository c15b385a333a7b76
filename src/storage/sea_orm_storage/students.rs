use std::collections::HashMap;

use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::prelude::{Grades, Users};
use crate::entity::students::{ActiveModel, Column, Entity as Students, Model};
use crate::entity::{grades, users};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    students::{
        entities::Student,
        requests::{CreateStudentRequest, StudentListParams, UpdateStudentRequest},
    },
    users::entities::{UserRole, UserStatus},
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// 拼装学生档案（账号信息 + 年级名称）
pub(super) async fn assemble_students<C: ConnectionTrait>(
    db: &C,
    models: Vec<Model>,
) -> Result<Vec<Student>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i64> = models.iter().map(|m| m.user_id).collect();
    let users: HashMap<i64, users::Model> = Users::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await
        .map_err(db_err("查询学生账号失败"))?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let grade_ids: Vec<i64> = models.iter().filter_map(|m| m.grade_id).collect();
    let grade_names: HashMap<i64, String> = if grade_ids.is_empty() {
        HashMap::new()
    } else {
        Grades::find()
            .filter(grades::Column::Id.is_in(grade_ids))
            .all(db)
            .await
            .map_err(db_err("查询年级失败"))?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect()
    };

    Ok(models
        .into_iter()
        .filter_map(|m| {
            let user = users.get(&m.user_id)?;
            Some(Student {
                id: m.id,
                user_id: m.user_id,
                username: user.username.clone(),
                email: user.email.clone(),
                status: user
                    .status
                    .parse::<UserStatus>()
                    .unwrap_or(UserStatus::Inactive),
                full_name: m.full_name,
                grade_name: m.grade_id.and_then(|g| grade_names.get(&g).cloned()),
                grade_id: m.grade_id,
                phone: m.phone,
                created_at: crate::entity::ts_to_utc(m.created_at),
                updated_at: crate::entity::ts_to_utc(m.updated_at),
            })
        })
        .collect())
}

async fn assemble_one<C: ConnectionTrait>(db: &C, model: Model) -> Result<Student> {
    assemble_students(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| PortalError::not_found("Student account not found"))
}

async fn ensure_grade<C: ConnectionTrait>(db: &C, grade_id: i64) -> Result<()> {
    let exists = Grades::find_by_id(grade_id)
        .one(db)
        .await
        .map_err(db_err("查询年级失败"))?
        .is_some();
    if !exists {
        return Err(PortalError::not_found(format!("Grade {grade_id} not found")));
    }
    Ok(())
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PortalError::validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

impl SeaOrmStorage {
    /// 账号与档案在同一事务中创建
    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<Student> {
        let now = now_ts();
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        if let Some(grade_id) = req.grade_id {
            ensure_grade(&txn, grade_id).await?;
        }

        let user = users::ActiveModel {
            username: Set(required(&req.username, "Username")?),
            email: Set(req.email.filter(|e| !e.trim().is_empty())),
            password_hash: Set(req.password),
            role: Set(UserRole::Student.to_string()),
            status: Set(UserStatus::Active.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("创建学生账号失败"))?;

        let profile = ActiveModel {
            user_id: Set(user.id),
            full_name: Set(required(&req.full_name, "Full name")?),
            grade_id: Set(req.grade_id),
            phone: Set(req.phone),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("创建学生档案失败"))?;

        let student = assemble_one(&txn, profile).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(student)
    }

    pub async fn get_student_impl(&self, id: i64) -> Result<Option<Student>> {
        let model = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询学生失败"))?;

        match model {
            Some(m) => Ok(assemble_students(&self.db, vec![m]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn get_student_by_user_id_impl(&self, user_id: i64) -> Result<Option<Student>> {
        let model = Students::find()
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err("查询学生失败"))?;

        match model {
            Some(m) => Ok(assemble_students(&self.db, vec![m]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn list_students_impl(
        &self,
        query: StudentListParams,
    ) -> Result<PaginatedResponse<Student>> {
        let (page, size) = query.pagination.normalized();

        let mut select = Students::find();

        if let Some(grade_id) = query.grade_id {
            select = select.filter(Column::GradeId.eq(grade_id));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::FullName.contains(&escaped))
                    .add(
                        Column::UserId.in_subquery(
                            Query::select()
                                .column(users::Column::Id)
                                .from(users::Entity)
                                .and_where(users::Column::Username.contains(&escaped))
                                .to_owned(),
                        ),
                    ),
            );
        }

        let paginator = select
            .order_by_asc(Column::FullName)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询学生总数失败"))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询学生列表失败"))?;

        Ok(PaginatedResponse {
            items: assemble_students(&self.db, models).await?,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_student_impl(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        let now = now_ts();
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let Some(existing) = Students::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询学生失败"))?
        else {
            return Ok(None);
        };
        let user_id = existing.user_id;

        let mut profile: ActiveModel = existing.into();
        profile.updated_at = Set(now);
        if let Some(full_name) = update.full_name {
            profile.full_name = Set(required(&full_name, "Full name")?);
        }
        if let Some(grade_id) = update.grade_id {
            ensure_grade(&txn, grade_id).await?;
            profile.grade_id = Set(Some(grade_id));
        }
        if let Some(phone) = update.phone {
            profile.phone = Set(Some(phone));
        }
        let profile = profile
            .update(&txn)
            .await
            .map_err(db_err("更新学生档案失败"))?;

        if update.email.is_some() || update.status.is_some() {
            let mut account = users::ActiveModel {
                id: Set(user_id),
                updated_at: Set(now),
                ..Default::default()
            };
            if let Some(email) = update.email {
                let email = email.trim().to_string();
                account.email = Set((!email.is_empty()).then_some(email));
            }
            if let Some(status) = update.status {
                account.status = Set(status.to_string());
            }
            account
                .update(&txn)
                .await
                .map_err(db_err("更新学生账号失败"))?;
        }

        let student = assemble_one(&txn, profile).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(Some(student))
    }

    /// 删除账号，档案与选课、提交随外键级联删除
    pub async fn delete_student_impl(&self, id: i64) -> Result<Option<i64>> {
        let Some(existing) = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询学生失败"))?
        else {
            return Ok(None);
        };

        Users::delete_by_id(existing.user_id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除学生失败"))?;

        Ok(Some(existing.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{grade, memory_storage, student};
    use crate::models::PaginationQuery;
    use crate::models::students::requests::{StudentListParams, UpdateStudentRequest};
    use crate::models::users::entities::{UserRole, UserStatus};
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_create_student_creates_account() {
        let storage = memory_storage().await;
        let g = grade(&storage, "Grade 10", 10).await;
        let s = student(&storage, "stu1", g.id).await;

        assert_eq!(s.grade_name.as_deref(), Some("Grade 10"));
        let user = storage.get_user_by_id(s.user_id).await.unwrap().unwrap();
        assert_eq!(user.role, UserRole::Student);

        let by_user = storage.get_student_by_user_id(s.user_id).await.unwrap().unwrap();
        assert_eq!(by_user.id, s.id);
    }

    #[tokio::test]
    async fn test_create_student_with_unknown_grade_rolls_back() {
        let storage = memory_storage().await;
        let err = storage
            .create_student(crate::models::students::requests::CreateStudentRequest {
                username: "ghost".to_string(),
                password: "hashed".to_string(),
                email: None,
                full_name: "Ghost".to_string(),
                grade_id: Some(999),
                phone: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
        assert!(storage.get_user_by_username("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_search_update_and_delete_student() {
        let storage = memory_storage().await;
        let g10 = grade(&storage, "Grade 10", 10).await;
        let g11 = grade(&storage, "Grade 11", 11).await;
        let s = student(&storage, "amy", g10.id).await;
        student(&storage, "ben", g11.id).await;

        let page = storage
            .list_students(StudentListParams {
                pagination: PaginationQuery::default(),
                grade_id: Some(g10.id),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);

        let page = storage
            .list_students(StudentListParams {
                pagination: PaginationQuery::default(),
                grade_id: None,
                search: Some("ben".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);

        let updated = storage
            .update_student(
                s.id,
                UpdateStudentRequest {
                    grade_id: Some(g11.id),
                    status: Some(UserStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.grade_id, Some(g11.id));
        assert_eq!(updated.status, UserStatus::Inactive);

        assert_eq!(storage.delete_student(s.id).await.unwrap(), Some(s.user_id));
        assert!(storage.get_student(s.id).await.unwrap().is_none());
        assert!(storage.get_user_by_id(s.user_id).await.unwrap().is_none());
    }
}
