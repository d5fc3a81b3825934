//! User repository (用户数据访问)
//!
//! 这里不修改 users.role，角色归属只能经由 AssociationRepository 变更。

use crate::{error::AppError, models::user::*, query::ListQuery, query::Page};
use sqlx::PgPool;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 分页列出用户
    pub async fn list(&self, query: &ListQuery) -> Result<Page<User>, AppError> {
        super::fetch_page(&self.db, "users", "user_id", query).await
    }

    /// 根据 ID 查找用户
    pub async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 创建用户
    pub async fn create(&self, req: &CreateUserRequest) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.email)
        .bind(req.status)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// 更新用户基本信息
    pub async fn update(
        &self,
        user_id: i32,
        req: &UpdateUserRequest,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, email = $3, status = $4
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.email)
        .bind(req.status)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 修改用户状态
    pub async fn set_status(&self, user_id: i32, status: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET status = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(status)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 列出角色中的用户
    pub async fn list_in_role(&self, role_id: i32) -> Result<Vec<User>, AppError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 ORDER BY user_id")
                .bind(role_id)
                .fetch_all(&self.db)
                .await?;

        Ok(users)
    }

    /// 列出不在角色中的用户，可按邮箱子串过滤
    pub async fn list_outside_role(
        &self,
        role_id: i32,
        email: Option<&str>,
    ) -> Result<Vec<User>, AppError> {
        let pattern = email.map(crate::query::contains_pattern);

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE (role IS NULL OR role <> $1)
              AND ($2::text IS NULL OR email ILIKE $2)
            ORDER BY user_id
            "#,
        )
        .bind(role_id)
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }
}
