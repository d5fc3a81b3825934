//! 存储抽象
//!
//! 处理器与关联服务只依赖 `RbacStore`，生产环境使用 [`PgStore`]，
//! 测试和本地调试使用 [`MemoryStore`]。
//!
//! 实现方必须保证：
//! - `assign_users_to_role`、`unassign_user_from_role`、`delete_user` 是原子的，
//!   失败时不留下任何部分写入；
//! - `roles.user_count` 只随 `users.role` 同步变化，扣减下限为 0；
//! - 重复授权返回 `AppError::Conflict`，撤销不存在的授权不报错。

use crate::{
    error::AppError,
    models::{
        permission::{Permission, PermissionRequest, PermissionStatus, RolePermission},
        role::{CreateRoleRequest, Role, UpdateRoleRequest},
        user::{CreateUserRequest, UpdateUserRequest, User},
    },
    query::{ListQuery, Page},
};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, AppError>;

#[async_trait]
pub trait RbacStore: Send + Sync {
    // ==================== Users ====================

    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<User>>;
    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>>;
    async fn create_user(&self, req: &CreateUserRequest) -> StoreResult<User>;
    async fn update_user(&self, user_id: i32, req: &UpdateUserRequest)
        -> StoreResult<Option<User>>;
    async fn set_user_status(&self, user_id: i32, status: bool) -> StoreResult<bool>;
    async fn users_in_role(&self, role_id: i32) -> StoreResult<Vec<User>>;
    async fn users_outside_role(&self, role_id: i32, email: Option<&str>)
        -> StoreResult<Vec<User>>;

    // ==================== Roles ====================

    async fn list_roles(&self, query: &ListQuery) -> StoreResult<Page<Role>>;
    async fn all_roles(&self) -> StoreResult<Vec<Role>>;
    async fn find_role(&self, role_id: i32) -> StoreResult<Option<Role>>;
    async fn create_role(&self, req: &CreateRoleRequest) -> StoreResult<Role>;
    async fn update_role(&self, role_id: i32, req: &UpdateRoleRequest)
        -> StoreResult<Option<Role>>;
    async fn delete_role(&self, role_id: i32) -> StoreResult<bool>;

    // ==================== Permissions ====================

    async fn list_permissions(&self, query: &ListQuery) -> StoreResult<Page<Permission>>;
    async fn all_permissions(&self) -> StoreResult<Vec<Permission>>;
    async fn find_permission(&self, permission_id: i32) -> StoreResult<Option<Permission>>;
    async fn create_permission(&self, req: &PermissionRequest) -> StoreResult<Permission>;
    async fn update_permission(
        &self,
        permission_id: i32,
        req: &PermissionRequest,
    ) -> StoreResult<Option<Permission>>;
    async fn delete_permission(&self, permission_id: i32) -> StoreResult<bool>;
    async fn permissions_for_role(&self, role_id: i32) -> StoreResult<Vec<PermissionStatus>>;
    async fn grants_for_role(&self, role_id: i32) -> StoreResult<Vec<RolePermission>>;

    // ==================== Associations ====================

    /// 返回实际变更的用户数
    async fn assign_users_to_role(&self, user_ids: &[i32], role_id: i32) -> StoreResult<u64>;
    async fn unassign_user_from_role(&self, user_id: i32, role_id: i32) -> StoreResult<()>;
    async fn delete_user(&self, user_id: i32) -> StoreResult<bool>;
    async fn grant_permission(&self, role_id: i32, permission_id: i32) -> StoreResult<()>;
    /// 返回是否实际删除了授权记录
    async fn revoke_permission(&self, role_id: i32, permission_id: i32) -> StoreResult<bool>;

    /// 就绪检查
    async fn ping(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
