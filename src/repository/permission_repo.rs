//! Permission repository (权限数据访问)

use crate::{
    error::{is_foreign_key_violation, AppError},
    models::permission::*,
    query::{ListQuery, Page},
};
use sqlx::PgPool;

pub struct PermissionRepository {
    db: PgPool,
}

impl PermissionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 分页列出权限
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Permission>, AppError> {
        super::fetch_page(&self.db, "permissions", "id", query).await
    }

    /// 列出所有权限（不分页）
    pub async fn list_all(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        Ok(permissions)
    }

    /// 根据 ID 查找权限
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(permission)
    }

    /// 创建权限
    pub async fn create(&self, req: &PermissionRequest) -> Result<Permission, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (name, about) VALUES ($1, $2) RETURNING *",
        )
        .bind(&req.name)
        .bind(&req.about)
        .fetch_one(&self.db)
        .await?;

        Ok(permission)
    }

    /// 更新权限
    pub async fn update(
        &self,
        id: i32,
        req: &PermissionRequest,
    ) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            "UPDATE permissions SET name = $2, about = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.about)
        .fetch_optional(&self.db)
        .await?;

        Ok(permission)
    }

    /// 删除权限；仍被角色引用时拒绝删除
    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::conflict("Permission is still assigned to roles")
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// 列出全部权限，并标记是否已授予指定角色
    pub async fn list_for_role(&self, role_id: i32) -> Result<Vec<PermissionStatus>, AppError> {
        let permissions = sqlx::query_as::<_, PermissionStatus>(
            r#"
            SELECT
                p.id,
                p.name,
                p.about,
                CASE WHEN rp.permission_id IS NOT NULL THEN 1 ELSE 0 END AS status
            FROM permissions p
            LEFT JOIN role_permissions rp
                ON p.id = rp.permission_id AND rp.role_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(permissions)
    }

    /// 列出角色的授权记录
    pub async fn grants_for_role(&self, role_id: i32) -> Result<Vec<RolePermission>, AppError> {
        let grants = sqlx::query_as::<_, RolePermission>(
            "SELECT role_id, permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(grants)
    }
}
