//! Database repository layer

pub mod association_repo;
pub mod permission_repo;
pub mod role_repo;
pub mod user_repo;

pub use association_repo::*;
pub use permission_repo::*;
pub use role_repo::*;
pub use user_repo::*;

use crate::{
    error::AppError,
    query::{FilterValue, FilteredQuery, ListQuery, Page},
};
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    FromRow, PgPool, Postgres,
};

/// 按顺序绑定 WHERE 条件参数
fn bind_filters<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [FilterValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            FilterValue::Bool(v) => query.bind(*v),
            FilterValue::Int(v) => query.bind(*v),
            FilterValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// 执行分页查询：数据与总数共用同一组过滤参数
pub(crate) async fn fetch_page<T>(
    db: &PgPool,
    table: &'static str,
    key_column: &'static str,
    query: &ListQuery,
) -> Result<Page<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let built = FilteredQuery::build(table, key_column, query);

    let rows = bind_filters(sqlx::query_as::<_, T>(&built.data_sql), &built.params)
        .bind(built.limit)
        .bind(built.offset)
        .fetch_all(db)
        .await?;

    let (total,) = bind_filters(sqlx::query_as::<_, (i64,)>(&built.count_sql), &built.params)
        .fetch_one(db)
        .await?;

    Ok(Page { rows, total })
}
