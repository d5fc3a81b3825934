//! 列表查询构建
//!
//! 根据可选过滤条件生成一对 SQL：分页数据查询与总数查询。两者共用同一段
//! WHERE 条件与参数，保证分页元数据与返回的数据一致。表名和列名只能来自
//! 代码中的 `&'static str`，请求中的值一律作为绑定参数。

use serde::Serialize;

/// 过滤值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Bool(bool),
    Int(i32),
    Text(String),
}

/// 过滤运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// 精确匹配（状态等布尔字段）
    Eq,
    /// 忽略大小写的子串匹配（ILIKE '%v%'）
    ContainsIgnoreCase,
}

/// 单个过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Filter {
    pub fn eq(column: &'static str, value: FilterValue) -> Self {
        Self { column, op: FilterOp::Eq, value }
    }

    pub fn contains(column: &'static str, text: impl Into<String>) -> Self {
        Self {
            column,
            op: FilterOp::ContainsIgnoreCase,
            value: FilterValue::Text(text.into()),
        }
    }

    /// 在内存中对一行数据求值，语义与生成的 SQL 一致
    pub fn matches<T: Filterable>(&self, row: &T) -> bool {
        let Some(actual) = row.column_value(self.column) else {
            return false;
        };

        match (self.op, &self.value, &actual) {
            (FilterOp::Eq, expected, actual) => expected == actual,
            (FilterOp::ContainsIgnoreCase, FilterValue::Text(needle), FilterValue::Text(hay)) => {
                hay.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => false,
        }
    }

    fn bound_value(&self) -> FilterValue {
        match (self.op, &self.value) {
            (FilterOp::ContainsIgnoreCase, FilterValue::Text(text)) => {
                FilterValue::Text(contains_pattern(text))
            }
            (_, value) => value.clone(),
        }
    }

    fn predicate(&self, placeholder: usize) -> String {
        match self.op {
            FilterOp::Eq => format!("{} = ${}", self.column, placeholder),
            FilterOp::ContainsIgnoreCase => format!("{} ILIKE ${}", self.column, placeholder),
        }
    }
}

/// 可被过滤条件求值的行类型
pub trait Filterable {
    fn column_value(&self, column: &str) -> Option<FilterValue>;
}

/// 生成 ILIKE 子串模式，转义 LIKE 通配符，使用户输入按字面匹配
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// 分页请求，page 从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// page < 1 视为第 1 页，page_size 至少为 1
    pub fn new(page: Option<i64>, page_size: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// 列表查询：过滤条件（按顺序 AND 组合）+ 分页
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub page: PageRequest,
}

impl ListQuery {
    pub fn new(page: PageRequest) -> Self {
        Self { filters: Vec::new(), page }
    }

    /// 追加过滤条件，None 表示该条件不存在，直接省略
    pub fn filter(mut self, filter: Option<Filter>) -> Self {
        if let Some(filter) = filter {
            self.filters.push(filter);
        }
        self
    }

    pub fn matches<T: Filterable>(&self, row: &T) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

/// 构建好的数据/总数查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredQuery {
    pub data_sql: String,
    pub count_sql: String,
    /// WHERE 条件的绑定参数，数据查询随后还要绑定 LIMIT 和 OFFSET
    pub params: Vec<FilterValue>,
    pub limit: i64,
    pub offset: i64,
}

impl FilteredQuery {
    pub fn build(table: &'static str, key_column: &'static str, query: &ListQuery) -> Self {
        let mut predicates = Vec::with_capacity(query.filters.len());
        let mut params = Vec::with_capacity(query.filters.len());

        for filter in &query.filters {
            params.push(filter.bound_value());
            predicates.push(filter.predicate(params.len()));
        }

        let where_clause = if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        };

        let data_sql = format!(
            "SELECT * FROM {table}{where_clause} ORDER BY {key_column} LIMIT ${} OFFSET ${}",
            params.len() + 1,
            params.len() + 2
        );
        let count_sql = format!("SELECT COUNT(*) FROM {table}{where_clause}");

        Self {
            data_sql,
            count_sql,
            params,
            limit: query.page.page_size,
            offset: query.page.offset(),
        }
    }
}

/// 存储层返回的一页数据
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

/// 分页元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub from: i64,
    pub to: i64,
    pub last_page: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: &PageRequest) -> Self {
        let offset = page.offset();
        let limit = page.page_size;
        let (from, to) = if total == 0 {
            (0, 0)
        } else {
            (offset.saturating_add(1), offset.saturating_add(limit).min(total))
        };

        Self {
            total,
            page: page.page,
            limit,
            from,
            to,
            last_page: total.saturating_add(limit - 1) / limit,
        }
    }
}

/// 分页响应：{total, page, limit, from, to, last_page, rows}
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub rows: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(page: Page<T>, request: &PageRequest) -> Self {
        Self { meta: PageMeta::new(page.total, request), rows: page.rows }
    }
}
