//! PostgreSQL 存储实现，委托给各 repository

use super::{RbacStore, StoreResult};
use crate::{
    db,
    error::AppError,
    models::{
        permission::{Permission, PermissionRequest, PermissionStatus, RolePermission},
        role::{CreateRoleRequest, Role, UpdateRoleRequest},
        user::{CreateUserRequest, UpdateUserRequest, User},
    },
    query::{ListQuery, Page},
    repository::{AssociationRepository, PermissionRepository, RoleRepository, UserRepository},
};
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PgStore {
    pool: PgPool,
    users: UserRepository,
    roles: RoleRepository,
    permissions: PermissionRepository,
    associations: AssociationRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            roles: RoleRepository::new(pool.clone()),
            permissions: PermissionRepository::new(pool.clone()),
            associations: AssociationRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RbacStore for PgStore {
    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<User>> {
        self.users.list(query).await
    }

    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    async fn create_user(&self, req: &CreateUserRequest) -> StoreResult<User> {
        self.users.create(req).await
    }

    async fn update_user(
        &self,
        user_id: i32,
        req: &UpdateUserRequest,
    ) -> StoreResult<Option<User>> {
        self.users.update(user_id, req).await
    }

    async fn set_user_status(&self, user_id: i32, status: bool) -> StoreResult<bool> {
        self.users.set_status(user_id, status).await
    }

    async fn users_in_role(&self, role_id: i32) -> StoreResult<Vec<User>> {
        self.users.list_in_role(role_id).await
    }

    async fn users_outside_role(
        &self,
        role_id: i32,
        email: Option<&str>,
    ) -> StoreResult<Vec<User>> {
        self.users.list_outside_role(role_id, email).await
    }

    async fn list_roles(&self, query: &ListQuery) -> StoreResult<Page<Role>> {
        self.roles.list(query).await
    }

    async fn all_roles(&self) -> StoreResult<Vec<Role>> {
        self.roles.list_all().await
    }

    async fn find_role(&self, role_id: i32) -> StoreResult<Option<Role>> {
        self.roles.find_by_id(role_id).await
    }

    async fn create_role(&self, req: &CreateRoleRequest) -> StoreResult<Role> {
        self.roles.create(req).await
    }

    async fn update_role(
        &self,
        role_id: i32,
        req: &UpdateRoleRequest,
    ) -> StoreResult<Option<Role>> {
        self.roles.update(role_id, req).await
    }

    async fn delete_role(&self, role_id: i32) -> StoreResult<bool> {
        self.roles.delete(role_id).await
    }

    async fn list_permissions(&self, query: &ListQuery) -> StoreResult<Page<Permission>> {
        self.permissions.list(query).await
    }

    async fn all_permissions(&self) -> StoreResult<Vec<Permission>> {
        self.permissions.list_all().await
    }

    async fn find_permission(&self, permission_id: i32) -> StoreResult<Option<Permission>> {
        self.permissions.find_by_id(permission_id).await
    }

    async fn create_permission(&self, req: &PermissionRequest) -> StoreResult<Permission> {
        self.permissions.create(req).await
    }

    async fn update_permission(
        &self,
        permission_id: i32,
        req: &PermissionRequest,
    ) -> StoreResult<Option<Permission>> {
        self.permissions.update(permission_id, req).await
    }

    async fn delete_permission(&self, permission_id: i32) -> StoreResult<bool> {
        self.permissions.delete(permission_id).await
    }

    async fn permissions_for_role(&self, role_id: i32) -> StoreResult<Vec<PermissionStatus>> {
        self.permissions.list_for_role(role_id).await
    }

    async fn grants_for_role(&self, role_id: i32) -> StoreResult<Vec<RolePermission>> {
        self.permissions.grants_for_role(role_id).await
    }

    async fn assign_users_to_role(&self, user_ids: &[i32], role_id: i32) -> StoreResult<u64> {
        self.associations.assign_users_to_role(user_ids, role_id).await
    }

    async fn unassign_user_from_role(&self, user_id: i32, role_id: i32) -> StoreResult<()> {
        self.associations.unassign_user_from_role(user_id, role_id).await
    }

    async fn delete_user(&self, user_id: i32) -> StoreResult<bool> {
        self.associations.delete_user(user_id).await
    }

    async fn grant_permission(&self, role_id: i32, permission_id: i32) -> StoreResult<()> {
        self.associations.grant_permission(role_id, permission_id).await
    }

    async fn revoke_permission(&self, role_id: i32, permission_id: i32) -> StoreResult<bool> {
        self.associations.revoke_permission(role_id, permission_id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        db::record_pool_metrics(&self.pool);

        match db::health_check(&self.pool).await {
            db::HealthStatus::Healthy => Ok(()),
            db::HealthStatus::Unhealthy(reason) => Err(AppError::Internal(reason)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
