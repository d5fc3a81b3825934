//! Association repository (角色关联的事务性写入)
//!
//! users.role 与 roles.user_count 只在这里修改，且始终在同一个事务内同步变更。
//! 并发安全依赖数据库的条件更新与行锁，进程内不加锁。多行加锁时一律按主键升序。

use crate::{
    db,
    error::{is_foreign_key_violation, is_unique_violation, AppError},
};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, BTreeSet};

type Tx = Transaction<'static, Postgres>;

pub struct AssociationRepository {
    db: PgPool,
}

impl AssociationRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 批量分配用户到角色，返回实际变更的用户数
    pub async fn assign_users_to_role(
        &self,
        user_ids: &[i32],
        role_id: i32,
    ) -> Result<u64, AppError> {
        let mut tx = db::begin(&self.db).await?;
        let result = assign_users_in_tx(&mut tx, user_ids, role_id).await;
        db::finish_transaction(tx, result).await
    }

    /// 将用户移出角色；用户当前不在该角色时返回 NotAssigned
    pub async fn unassign_user_from_role(&self, user_id: i32, role_id: i32) -> Result<(), AppError> {
        let mut tx = db::begin(&self.db).await?;
        let result = unassign_user_in_tx(&mut tx, user_id, role_id).await;
        db::finish_transaction(tx, result).await
    }

    /// 删除用户，并释放其占用的角色计数
    pub async fn delete_user(&self, user_id: i32) -> Result<bool, AppError> {
        let mut tx = db::begin(&self.db).await?;
        let result = delete_user_in_tx(&mut tx, user_id).await;
        db::finish_transaction(tx, result).await
    }

    /// 授予权限；重复授予返回 Conflict
    pub async fn grant_permission(&self, role_id: i32, permission_id: i32) -> Result<(), AppError> {
        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
            .bind(role_id)
            .bind(permission_id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict("Permission is already assigned to this role")
                } else if is_foreign_key_violation(&e) {
                    AppError::not_found("role or permission")
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(())
    }

    /// 撤销权限；记录不存在不算错误，返回是否实际删除
    pub async fn revoke_permission(&self, role_id: i32, permission_id: i32) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
                .bind(role_id)
                .bind(permission_id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn assign_users_in_tx(tx: &mut Tx, user_ids: &[i32], role_id: i32) -> Result<u64, AppError> {
    let role_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)")
        .bind(role_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::transaction)?;

    if !role_exists {
        return Err(AppError::not_found("role"));
    }

    // 锁顺序固定：先按 user_id 升序锁用户行，再按 id 升序锁所有涉及的角色行。
    // 已在目标角色中的用户和不存在的 ID 不计入变更数
    let targets: Vec<(i32, Option<i32>)> = sqlx::query_as(
        r#"
        SELECT user_id, role
        FROM users
        WHERE user_id = ANY($2::int[]) AND role IS DISTINCT FROM $1
        ORDER BY user_id
        FOR UPDATE
        "#,
    )
    .bind(role_id)
    .bind(user_ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(AppError::transaction)?;

    if targets.is_empty() {
        return Ok(0);
    }

    let mut touched_roles: BTreeSet<i32> = targets.iter().filter_map(|(_, role)| *role).collect();
    touched_roles.insert(role_id);
    let touched_roles: Vec<i32> = touched_roles.into_iter().collect();

    sqlx::query("SELECT id FROM roles WHERE id = ANY($1::int[]) ORDER BY id FOR UPDATE")
        .bind(&touched_roles)
        .execute(&mut **tx)
        .await
        .map_err(AppError::transaction)?;

    let target_ids: Vec<i32> = targets.iter().map(|(user_id, _)| *user_id).collect();
    let changed = sqlx::query("UPDATE users SET role = $1 WHERE user_id = ANY($2::int[])")
        .bind(role_id)
        .bind(&target_ids)
        .execute(&mut **tx)
        .await
        .map_err(AppError::transaction)?
        .rows_affected();

    let mut released: BTreeMap<i32, i32> = BTreeMap::new();
    for previous in targets.into_iter().filter_map(|(_, role)| role) {
        *released.entry(previous).or_insert(0) += 1;
    }

    for (previous_role, count) in released {
        release_role_slot(tx, previous_role, count).await?;
    }

    sqlx::query(
        r#"
        UPDATE roles
        SET user_count = user_count + $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(changed as i32)
    .bind(role_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::transaction)?;

    Ok(changed)
}

async fn unassign_user_in_tx(tx: &mut Tx, user_id: i32, role_id: i32) -> Result<(), AppError> {
    // 条件更新与检查在同一语句内完成，避免检查后被并发改派
    let cleared = sqlx::query("UPDATE users SET role = NULL WHERE user_id = $1 AND role = $2")
        .bind(user_id)
        .bind(role_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::transaction)?
        .rows_affected();

    if cleared == 0 {
        return Err(AppError::NotAssigned(
            "User is not assigned to the specified role or does not exist.".to_string(),
        ));
    }

    release_role_slot(tx, role_id, 1).await
}

async fn delete_user_in_tx(tx: &mut Tx, user_id: i32) -> Result<bool, AppError> {
    let deleted: Option<Option<i32>> =
        sqlx::query_scalar("DELETE FROM users WHERE user_id = $1 RETURNING role")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::transaction)?;

    match deleted {
        None => Ok(false),
        Some(None) => Ok(true),
        Some(Some(role_id)) => {
            release_role_slot(tx, role_id, 1).await?;
            Ok(true)
        }
    }
}

/// 计数扣减，下限为 0
async fn release_role_slot(tx: &mut Tx, role_id: i32, count: i32) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE roles
        SET user_count = GREATEST(user_count - $1, 0), updated_at = NOW()
        WHERE id = $2 AND user_count > 0
        "#,
    )
    .bind(count)
    .bind(role_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::transaction)?;

    Ok(())
}
