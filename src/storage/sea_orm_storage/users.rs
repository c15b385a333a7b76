use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::Result;
use crate::models::{
    PaginatedResponse, PaginationInfo,
    users::{
        entities::{User, UserStatus},
        requests::{NewUser, UpdateUserRequest, UserListParams},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: NewUser) -> Result<User> {
        let now = now_ts();

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password_hash),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建用户失败"))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询用户失败"))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err("查询用户失败"))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListParams,
    ) -> Result<PaginatedResponse<User>> {
        let (page, size) = query.pagination.normalized();

        let mut select = Users::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Username.contains(&escaped))
                    .add(Column::Email.contains(&escaped)),
            );
        }

        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询用户总数失败"))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询用户列表失败"))?;

        Ok(PaginatedResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = now_ts();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err("更新最后登录时间失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        let Some(existing) = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询用户失败"))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(email) = update.email {
            let email = email.trim().to_string();
            model.email = Set((!email.is_empty()).then_some(email));
        }

        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }

        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        let updated = model.update(&self.db).await.map_err(db_err("更新用户失败"))?;

        Ok(Some(updated.into_user()))
    }

    /// 删除用户（档案随外键级联删除）
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除用户失败"))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(db_err("统计用户数量失败"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::memory_storage;
    use crate::models::PaginationQuery;
    use crate::models::users::entities::{UserRole, UserStatus};
    use crate::models::users::requests::{NewUser, UpdateUserRequest, UserListParams};
    use crate::storage::Storage;

    fn new_user(username: &str, role: UserRole) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            password_hash: "hash".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user("admin", UserRole::Admin))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.status, UserStatus::Active);

        let found = storage.get_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(storage.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let storage = memory_storage().await;
        storage
            .create_user(new_user("dup", UserRole::Admin))
            .await
            .unwrap();
        let mut again = new_user("dup", UserRole::Admin);
        again.email = None;
        let err = storage.create_user(again).await.unwrap_err();
        assert_eq!(err.code(), "E010");
    }

    #[tokio::test]
    async fn test_list_users_filters_by_role_and_search() {
        let storage = memory_storage().await;
        storage
            .create_user(new_user("alice", UserRole::Admin))
            .await
            .unwrap();
        storage
            .create_user(new_user("bob", UserRole::Admin))
            .await
            .unwrap();

        let page = storage
            .list_users_with_pagination(UserListParams {
                pagination: PaginationQuery::default(),
                role: Some(UserRole::Admin),
                status: None,
                search: Some("ali".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].username, "alice");
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user("carol", UserRole::Admin))
            .await
            .unwrap();

        let updated = storage
            .update_user(
                user.id,
                UpdateUserRequest {
                    status: Some(UserStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, UserStatus::Inactive);

        assert!(storage.update_last_login(user.id).await.unwrap());
        assert!(storage.delete_user(user.id).await.unwrap());
        assert!(!storage.delete_user(user.id).await.unwrap());
        assert!(storage.update_user(user.id, UpdateUserRequest::default()).await.unwrap().is_none());
    }
}
