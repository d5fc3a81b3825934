//! 内存存储实现
//!
//! 全部状态放在一把 `RwLock` 之后，写操作串行执行。多步写入在状态副本上执行，
//! 全部成功后才替换正式状态，以此模拟事务。
//!
//! 不持久化，仅用于测试与本地调试。[`FailPoint`] 可让下一次事务性写入在指定步骤失败。

use super::{RbacStore, StoreResult};
use crate::{
    error::AppError,
    models::{
        permission::{Permission, PermissionRequest, PermissionStatus, RolePermission},
        role::{CreateRoleRequest, Role, UpdateRoleRequest},
        user::{CreateUserRequest, UpdateUserRequest, User},
    },
    query::{Filterable, ListQuery, Page},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::{Mutex, RwLock};

/// 事务性写入中可注入一次性失败的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// 改写 users.role 的语句
    UserUpdate,
    /// 调整 roles.user_count 的语句（此时用户行已改动）
    CounterUpdate,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<i32, User>,
    roles: BTreeMap<i32, Role>,
    permissions: BTreeMap<i32, Permission>,
    grants: BTreeSet<RolePermission>,
    last_user_id: i32,
    last_role_id: i32,
    last_permission_id: i32,
}

impl MemoryState {
    fn role_mut(&mut self, role_id: i32) -> StoreResult<&mut Role> {
        self.roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::not_found("role"))
    }

    /// 计数扣减，下限为 0
    fn release_role_slot(&mut self, role_id: i32, count: i32) {
        if let Some(role) = self.roles.get_mut(&role_id) {
            if role.user_count > 0 {
                role.user_count = (role.user_count - count).max(0);
                role.updated_at = Utc::now();
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    failpoint: Mutex<Option<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 下一次执行到 `point` 的事务性写入将失败一次
    pub async fn inject_failure(&self, point: FailPoint) {
        *self.failpoint.lock().await = Some(point);
    }

    /// 直接改写角色计数（不改用户），用于模拟计数漂移
    pub async fn force_user_count(&self, role_id: i32, user_count: i32) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.role_mut(role_id)?.user_count = user_count;
        Ok(())
    }

    async fn transaction<T>(
        &self,
        body: impl FnOnce(&mut MemoryState, &mut Option<FailPoint>) -> StoreResult<T> + Send,
    ) -> StoreResult<T> {
        let mut state = self.state.write().await;
        let mut failpoint = self.failpoint.lock().await;

        let mut staged = state.clone();
        let value = body(&mut staged, &mut *failpoint)?;
        *state = staged;

        Ok(value)
    }
}

fn trip(failpoint: &mut Option<FailPoint>, point: FailPoint) -> StoreResult<()> {
    if *failpoint == Some(point) {
        *failpoint = None;
        return Err(AppError::transaction(format!("injected failure at {:?}", point)));
    }
    Ok(())
}

fn page_of<'a, T>(rows: impl Iterator<Item = &'a T>, query: &ListQuery) -> Page<T>
where
    T: Filterable + Clone + 'a,
{
    let matched: Vec<&T> = rows.filter(|row| query.matches(*row)).collect();
    let total = matched.len() as i64;
    let rows = matched
        .into_iter()
        .skip(query.page.offset() as usize)
        .take(query.page.page_size as usize)
        .cloned()
        .collect();

    Page { rows, total }
}

#[async_trait]
impl RbacStore for MemoryStore {
    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<User>> {
        let state = self.state.read().await;
        Ok(page_of(state.users.values(), query))
    }

    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn create_user(&self, req: &CreateUserRequest) -> StoreResult<User> {
        let mut state = self.state.write().await;
        state.last_user_id += 1;

        let user = User {
            user_id: state.last_user_id,
            username: req.name.clone(),
            email: req.email.clone(),
            status: req.status,
            role: None,
        };
        state.users.insert(user.user_id, user.clone());

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: i32,
        req: &UpdateUserRequest,
    ) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&user_id).map(|user| {
            user.username = req.name.clone();
            user.email = req.email.clone();
            user.status = req.status;
            user.clone()
        }))
    }

    async fn set_user_status(&self, user_id: i32, status: bool) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn users_in_role(&self, role_id: i32) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.role == Some(role_id))
            .cloned()
            .collect())
    }

    async fn users_outside_role(
        &self,
        role_id: i32,
        email: Option<&str>,
    ) -> StoreResult<Vec<User>> {
        let needle = email.map(str::to_lowercase);
        let state = self.state.read().await;

        Ok(state
            .users
            .values()
            .filter(|u| u.role != Some(role_id))
            .filter(|u| match &needle {
                Some(needle) => u.email.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn list_roles(&self, query: &ListQuery) -> StoreResult<Page<Role>> {
        let state = self.state.read().await;
        Ok(page_of(state.roles.values(), query))
    }

    async fn all_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.state.read().await.roles.values().cloned().collect())
    }

    async fn find_role(&self, role_id: i32) -> StoreResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn create_role(&self, req: &CreateRoleRequest) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        state.last_role_id += 1;

        let role = Role {
            id: state.last_role_id,
            name: req.name.clone(),
            message: req.message.clone(),
            user_count: 0,
            updated_at: Utc::now(),
        };
        state.roles.insert(role.id, role.clone());

        Ok(role)
    }

    async fn update_role(
        &self,
        role_id: i32,
        req: &UpdateRoleRequest,
    ) -> StoreResult<Option<Role>> {
        let mut state = self.state.write().await;
        Ok(state.roles.get_mut(&role_id).map(|role| {
            role.name = req.name.clone();
            role.message = req.message.clone();
            role.updated_at = Utc::now();
            role.clone()
        }))
    }

    async fn delete_role(&self, role_id: i32) -> StoreResult<bool> {
        self.transaction(|state, _| {
            if state.grants.iter().any(|g| g.role_id == role_id) {
                return Err(AppError::conflict("Role still has permissions assigned"));
            }
            if state.roles.remove(&role_id).is_none() {
                return Ok(false);
            }
            for user in state.users.values_mut() {
                if user.role == Some(role_id) {
                    user.role = None;
                }
            }
            Ok(true)
        })
        .await
    }

    async fn list_permissions(&self, query: &ListQuery) -> StoreResult<Page<Permission>> {
        let state = self.state.read().await;
        Ok(page_of(state.permissions.values(), query))
    }

    async fn all_permissions(&self) -> StoreResult<Vec<Permission>> {
        Ok(self.state.read().await.permissions.values().cloned().collect())
    }

    async fn find_permission(&self, permission_id: i32) -> StoreResult<Option<Permission>> {
        Ok(self.state.read().await.permissions.get(&permission_id).cloned())
    }

    async fn create_permission(&self, req: &PermissionRequest) -> StoreResult<Permission> {
        let mut state = self.state.write().await;
        state.last_permission_id += 1;

        let permission = Permission {
            id: state.last_permission_id,
            name: req.name.clone(),
            about: req.about.clone(),
        };
        state.permissions.insert(permission.id, permission.clone());

        Ok(permission)
    }

    async fn update_permission(
        &self,
        permission_id: i32,
        req: &PermissionRequest,
    ) -> StoreResult<Option<Permission>> {
        let mut state = self.state.write().await;
        Ok(state.permissions.get_mut(&permission_id).map(|p| {
            p.name = req.name.clone();
            p.about = req.about.clone();
            p.clone()
        }))
    }

    async fn delete_permission(&self, permission_id: i32) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.grants.iter().any(|g| g.permission_id == permission_id) {
            return Err(AppError::conflict("Permission is still assigned to roles"));
        }
        Ok(state.permissions.remove(&permission_id).is_some())
    }

    async fn permissions_for_role(&self, role_id: i32) -> StoreResult<Vec<PermissionStatus>> {
        let state = self.state.read().await;
        Ok(state
            .permissions
            .values()
            .map(|p| PermissionStatus {
                id: p.id,
                name: p.name.clone(),
                about: p.about.clone(),
                status: state.grants.contains(&RolePermission { role_id, permission_id: p.id })
                    as i32,
            })
            .collect())
    }

    async fn grants_for_role(&self, role_id: i32) -> StoreResult<Vec<RolePermission>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .filter(|g| g.role_id == role_id)
            .copied()
            .collect())
    }

    async fn assign_users_to_role(&self, user_ids: &[i32], role_id: i32) -> StoreResult<u64> {
        let requested: BTreeSet<i32> = user_ids.iter().copied().collect();

        self.transaction(move |state, failpoint| {
            state.role_mut(role_id)?;
            trip(failpoint, FailPoint::UserUpdate)?;

            let mut released: BTreeMap<i32, i32> = BTreeMap::new();
            let mut changed = 0_i32;
            for user_id in requested {
                if let Some(user) = state.users.get_mut(&user_id) {
                    if user.role != Some(role_id) {
                        if let Some(previous) = user.role {
                            *released.entry(previous).or_insert(0) += 1;
                        }
                        user.role = Some(role_id);
                        changed += 1;
                    }
                }
            }

            if changed == 0 {
                return Ok(0);
            }

            for (previous, count) in released {
                state.release_role_slot(previous, count);
            }

            trip(failpoint, FailPoint::CounterUpdate)?;
            let role = state.role_mut(role_id)?;
            role.user_count += changed;
            role.updated_at = Utc::now();

            Ok(changed as u64)
        })
        .await
    }

    async fn unassign_user_from_role(&self, user_id: i32, role_id: i32) -> StoreResult<()> {
        self.transaction(move |state, failpoint| {
            trip(failpoint, FailPoint::UserUpdate)?;

            match state.users.get_mut(&user_id) {
                Some(user) if user.role == Some(role_id) => user.role = None,
                _ => {
                    return Err(AppError::NotAssigned(
                        "User is not assigned to the specified role or does not exist."
                            .to_string(),
                    ))
                }
            }

            trip(failpoint, FailPoint::CounterUpdate)?;
            state.release_role_slot(role_id, 1);

            Ok(())
        })
        .await
    }

    async fn delete_user(&self, user_id: i32) -> StoreResult<bool> {
        self.transaction(move |state, failpoint| {
            let Some(user) = state.users.remove(&user_id) else {
                return Ok(false);
            };

            if let Some(role_id) = user.role {
                trip(failpoint, FailPoint::CounterUpdate)?;
                state.release_role_slot(role_id, 1);
            }

            Ok(true)
        })
        .await
    }

    async fn grant_permission(&self, role_id: i32, permission_id: i32) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) || !state.permissions.contains_key(&permission_id)
        {
            return Err(AppError::not_found("role or permission"));
        }

        if !state.grants.insert(RolePermission { role_id, permission_id }) {
            return Err(AppError::conflict("Permission is already assigned to this role"));
        }

        Ok(())
    }

    async fn revoke_permission(&self, role_id: i32, permission_id: i32) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.grants.remove(&RolePermission { role_id, permission_id }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
