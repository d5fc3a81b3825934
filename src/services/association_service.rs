//! Association service
//! 用户-角色分配与角色-权限授权
//!
//! 入参校验在这里完成，存储层只负责原子写入。任何校验失败都不会触达存储。

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::models::permission::PermissionAction;
use crate::store::RbacStore;

const INVALID_ASSIGN_INPUT: &str =
    "Invalid input. 'users' must be a non-empty array and 'role_id' is required.";

/// 关联服务
pub struct AssociationService {
    store: Arc<dyn RbacStore>,
}

impl AssociationService {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    /// 批量将用户分配到角色，返回实际变更的用户数
    ///
    /// 重复的用户 ID 只计一次；已在目标角色中的用户不重复计数。
    #[instrument(skip(self, user_ids), fields(requested = user_ids.len()))]
    pub async fn assign_users_to_role(&self, user_ids: &[i32], role_id: i32) -> Result<u64> {
        if user_ids.is_empty() || role_id <= 0 {
            return Err(AppError::validation(INVALID_ASSIGN_INPUT));
        }

        let unique: Vec<i32> = user_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let changed = self.store.assign_users_to_role(&unique, role_id).await?;

        metrics::counter!("rbac_role_assignments_total").increment(changed);
        info!(role_id, updated_rows = changed, "Users assigned to role");

        Ok(changed)
    }

    /// 将用户移出角色
    #[instrument(skip(self))]
    pub async fn unassign_user_from_role(&self, user_id: i32, role_id: i32) -> Result<()> {
        if user_id <= 0 || role_id <= 0 {
            return Err(AppError::validation("'user_id' and 'role_id' are required."));
        }

        self.store.unassign_user_from_role(user_id, role_id).await?;

        metrics::counter!("rbac_role_unassignments_total").increment(1);
        info!(user_id, role_id, "User unassigned from role");

        Ok(())
    }

    /// 授予或撤销角色权限
    #[instrument(skip(self))]
    pub async fn set_role_permission(
        &self,
        role_id: i32,
        permission_id: i32,
        action: PermissionAction,
    ) -> Result<()> {
        if role_id <= 0 || permission_id <= 0 {
            return Err(AppError::validation(
                "'role_id', 'permission_id' and 'action' are required.",
            ));
        }

        let action_label = match action {
            PermissionAction::Grant => {
                self.store.grant_permission(role_id, permission_id).await?;
                "grant"
            }
            PermissionAction::Revoke => {
                if !self.store.revoke_permission(role_id, permission_id).await? {
                    // 撤销不存在的授权视为成功
                    warn!(role_id, permission_id, "Revoked permission was not granted");
                }
                "revoke"
            }
        };

        metrics::counter!("rbac_permission_changes_total", "action" => action_label).increment(1);
        info!(role_id, permission_id, action = action_label, "Role permission updated");

        Ok(())
    }

    /// 删除用户，同步释放其角色计数
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i32) -> Result<()> {
        if !self.store.delete_user(user_id).await? {
            return Err(AppError::not_found("user"));
        }

        info!(user_id, "User deleted");
        Ok(())
    }
}
