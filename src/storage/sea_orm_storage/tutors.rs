use std::collections::HashMap;

use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::prelude::{Subjects, Users};
use crate::entity::tutors::{ActiveModel, Column, Entity as Tutors, Model};
use crate::entity::{subjects, users};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    tutors::{
        entities::Tutor,
        requests::{CreateTutorRequest, TutorListParams, UpdateTutorRequest},
    },
    users::entities::{UserRole, UserStatus},
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// 拼装导师档案（账号信息 + 科目名称）
async fn assemble_tutors<C: ConnectionTrait>(db: &C, models: Vec<Model>) -> Result<Vec<Tutor>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i64> = models.iter().map(|m| m.user_id).collect();
    let users: HashMap<i64, users::Model> = Users::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await
        .map_err(db_err("查询导师账号失败"))?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let subject_ids: Vec<i64> = models.iter().map(|m| m.subject_id).collect();
    let subject_names: HashMap<i64, String> = Subjects::find()
        .filter(subjects::Column::Id.is_in(subject_ids))
        .all(db)
        .await
        .map_err(db_err("查询科目失败"))?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    Ok(models
        .into_iter()
        .filter_map(|m| {
            let user = users.get(&m.user_id)?;
            Some(Tutor {
                id: m.id,
                user_id: m.user_id,
                username: user.username.clone(),
                email: user.email.clone(),
                status: user
                    .status
                    .parse::<UserStatus>()
                    .unwrap_or(UserStatus::Inactive),
                full_name: m.full_name,
                subject_name: subject_names.get(&m.subject_id).cloned().unwrap_or_default(),
                subject_id: m.subject_id,
                phone: m.phone,
                created_at: crate::entity::ts_to_utc(m.created_at),
                updated_at: crate::entity::ts_to_utc(m.updated_at),
            })
        })
        .collect())
}

async fn assemble_one<C: ConnectionTrait>(db: &C, model: Model) -> Result<Tutor> {
    assemble_tutors(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| PortalError::not_found("Tutor account not found"))
}

async fn ensure_subject<C: ConnectionTrait>(db: &C, subject_id: i64) -> Result<()> {
    let exists = Subjects::find_by_id(subject_id)
        .one(db)
        .await
        .map_err(db_err("查询科目失败"))?
        .is_some();
    if !exists {
        return Err(PortalError::not_found(format!(
            "Subject {subject_id} not found"
        )));
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
    pub async fn create_tutor_impl(&self, req: CreateTutorRequest) -> Result<Tutor> {
        let now = now_ts();
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        ensure_subject(&txn, req.subject_id).await?;

        let user = users::ActiveModel {
            username: Set(required(&req.username, "Username")?),
            email: Set(req.email.filter(|e| !e.trim().is_empty())),
            password_hash: Set(req.password),
            role: Set(UserRole::Tutor.to_string()),
            status: Set(UserStatus::Active.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("创建导师账号失败"))?;

        let profile = ActiveModel {
            user_id: Set(user.id),
            full_name: Set(required(&req.full_name, "Full name")?),
            subject_id: Set(req.subject_id),
            phone: Set(req.phone),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("创建导师档案失败"))?;

        let tutor = assemble_one(&txn, profile).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(tutor)
    }

    pub async fn get_tutor_impl(&self, id: i64) -> Result<Option<Tutor>> {
        let model = Tutors::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询导师失败"))?;

        match model {
            Some(m) => Ok(assemble_tutors(&self.db, vec![m]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn get_tutor_by_user_id_impl(&self, user_id: i64) -> Result<Option<Tutor>> {
        let model = Tutors::find()
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err("查询导师失败"))?;

        match model {
            Some(m) => Ok(assemble_tutors(&self.db, vec![m]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn list_tutors_impl(&self, query: TutorListParams) -> Result<PaginatedResponse<Tutor>> {
        let (page, size) = query.pagination.normalized();

        let mut select = Tutors::find();

        if let Some(subject_id) = query.subject_id {
            select = select.filter(Column::SubjectId.eq(subject_id));
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
            .map_err(db_err("查询导师总数失败"))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询导师列表失败"))?;

        Ok(PaginatedResponse {
            items: assemble_tutors(&self.db, models).await?,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_tutor_impl(
        &self,
        id: i64,
        update: UpdateTutorRequest,
    ) -> Result<Option<Tutor>> {
        let now = now_ts();
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let Some(existing) = Tutors::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询导师失败"))?
        else {
            return Ok(None);
        };
        let user_id = existing.user_id;

        let mut profile: ActiveModel = existing.into();
        profile.updated_at = Set(now);
        if let Some(full_name) = update.full_name {
            profile.full_name = Set(required(&full_name, "Full name")?);
        }
        if let Some(subject_id) = update.subject_id {
            ensure_subject(&txn, subject_id).await?;
            profile.subject_id = Set(subject_id);
        }
        if let Some(phone) = update.phone {
            profile.phone = Set(Some(phone));
        }
        let profile = profile
            .update(&txn)
            .await
            .map_err(db_err("更新导师档案失败"))?;

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
                .map_err(db_err("更新导师账号失败"))?;
        }

        let tutor = assemble_one(&txn, profile).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(Some(tutor))
    }

    /// 删除账号，档案随外键级联删除；仍有选课或作业时返回冲突
    pub async fn delete_tutor_impl(&self, id: i64) -> Result<Option<i64>> {
        let Some(existing) = Tutors::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询导师失败"))?
        else {
            return Ok(None);
        };

        Users::delete_by_id(existing.user_id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除导师失败"))?;

        Ok(Some(existing.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, subject, tutor};
    use crate::models::PaginationQuery;
    use crate::models::tutors::requests::{CreateTutorRequest, TutorListParams, UpdateTutorRequest};
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_create_tutor_with_subject_name() {
        let storage = memory_storage().await;
        let math = subject(&storage, "MATH").await;
        let t = tutor(&storage, "tina", math.id).await;

        assert_eq!(t.subject_name, "Subject MATH");
        let user = storage.get_user_by_id(t.user_id).await.unwrap().unwrap();
        assert_eq!(user.role, UserRole::Tutor);
        assert_eq!(
            storage.get_tutor_by_user_id(t.user_id).await.unwrap().unwrap().id,
            t.id
        );
    }

    #[tokio::test]
    async fn test_create_tutor_requires_subject() {
        let storage = memory_storage().await;
        let err = storage
            .create_tutor(CreateTutorRequest {
                username: "nobody".to_string(),
                password: "hashed".to_string(),
                email: None,
                full_name: "Nobody".to_string(),
                subject_id: 42,
                phone: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
        assert!(storage.get_user_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_list_and_delete_tutor() {
        let storage = memory_storage().await;
        let math = subject(&storage, "MATH").await;
        let phys = subject(&storage, "PHYS").await;
        let t = tutor(&storage, "tina", math.id).await;

        let updated = storage
            .update_tutor(
                t.id,
                UpdateTutorRequest {
                    subject_id: Some(phys.id),
                    phone: Some("555-0100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.subject_id, phys.id);

        let page = storage
            .list_tutors(TutorListParams {
                pagination: PaginationQuery::default(),
                subject_id: Some(phys.id),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);

        assert_eq!(storage.delete_tutor(t.id).await.unwrap(), Some(t.user_id));
        assert!(storage.get_tutor(t.id).await.unwrap().is_none());
    }
}
