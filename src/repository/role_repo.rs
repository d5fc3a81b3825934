//! Role repository (角色数据访问)
//!
//! user_count 只读；计数变更见 AssociationRepository。

use crate::{
    error::{is_foreign_key_violation, AppError},
    models::role::*,
    query::{ListQuery, Page},
};
use sqlx::PgPool;

pub struct RoleRepository {
    db: PgPool,
}

impl RoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 分页列出角色
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Role>, AppError> {
        super::fetch_page(&self.db, "roles", "id", query).await
    }

    /// 列出所有角色（不分页）
    pub async fn list_all(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        Ok(roles)
    }

    /// 根据 ID 查找角色
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    /// 创建角色
    pub async fn create(&self, req: &CreateRoleRequest) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, message, updated_at)
            VALUES ($1, $2, NOW())
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.message)
        .fetch_one(&self.db)
        .await?;

        Ok(role)
    }

    /// 更新角色
    pub async fn update(&self, id: i32, req: &UpdateRoleRequest) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2, message = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.message)
        .fetch_optional(&self.db)
        .await?;

        Ok(role)
    }

    /// 删除角色；仍有授权记录时拒绝删除
    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::conflict("Role still has permissions assigned")
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }
}
