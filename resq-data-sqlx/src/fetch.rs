use resq_data::{FilterValue, Page, PageRequest, QueryBuilder, QueryTarget};
use sqlx::error::BoxDynError;
use sqlx::{Arguments, Database, Encode, Executor, FromRow, IntoArguments, Pool, Type};

use crate::error::{bind_error, SqlxErrorExt, SqlxResult};

/// Databases whose driver can bind every scalar [`FilterValue`].
///
/// Implemented for every sqlx database that encodes `i64`, `f64`, `bool`,
/// `String` and `Option<String>`, which covers the bundled drivers.
pub trait BindFilterValue: Database {
    fn add_value<'q>(
        args: &mut <Self as Database>::Arguments<'q>,
        value: FilterValue,
    ) -> Result<(), BoxDynError>;
}

impl<DB> BindFilterValue for DB
where
    DB: Database,
    i64: for<'q> Encode<'q, DB> + Type<DB>,
    f64: for<'q> Encode<'q, DB> + Type<DB>,
    bool: for<'q> Encode<'q, DB> + Type<DB>,
    String: for<'q> Encode<'q, DB> + Type<DB>,
    Option<String>: for<'q> Encode<'q, DB> + Type<DB>,
{
    fn add_value<'q>(
        args: &mut <DB as Database>::Arguments<'q>,
        value: FilterValue,
    ) -> Result<(), BoxDynError> {
        match value {
            FilterValue::Null => args.add(None::<String>),
            FilterValue::Bool(b) => args.add(b),
            FilterValue::Int(i) => args.add(i),
            FilterValue::Float(f) => args.add(f),
            FilterValue::String(s) => args.add(s),
            // Collections reach here only through a callback rule.
            other => args.add(other.to_param_string()),
        }
    }
}

fn arguments<'q, DB: BindFilterValue>(
    params: Vec<FilterValue>,
) -> SqlxResult<<DB as Database>::Arguments<'q>> {
    let mut args: <DB as Database>::Arguments<'q> = Default::default();
    for (position, value) in params.into_iter().enumerate() {
        DB::add_value(&mut args, value).map_err(|e| bind_error(position, e))?;
    }
    Ok(args)
}

/// Run `query` without paging and decode every row.
pub async fn fetch_all<DB, T>(
    pool: &Pool<DB>,
    query: &QueryBuilder,
    columns: &[&str],
) -> SqlxResult<Vec<T>>
where
    DB: BindFilterValue,
    for<'q> <DB as Database>::Arguments<'q>: IntoArguments<'q, DB>,
    for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
    T: for<'r> FromRow<'r, DB::Row> + Send + Unpin,
{
    let (sql, params) = query.build_select_checked(columns)?;
    tracing::debug!(sql = %sql, params = params.len(), "fetching rows");
    let args = arguments::<DB>(params)?;
    sqlx::query_as_with::<DB, T, _>(&sql, args)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)
}

/// Count matching rows, ignoring any ordering and paging on `query`.
pub async fn count<DB>(pool: &Pool<DB>, query: &QueryBuilder) -> SqlxResult<u64>
where
    DB: BindFilterValue,
    for<'q> <DB as Database>::Arguments<'q>: IntoArguments<'q, DB>,
    for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
    (i64,): for<'r> FromRow<'r, DB::Row>,
{
    let (sql, params) = query.without_paging().build_count_checked()?;
    let args = arguments::<DB>(params)?;
    let total: i64 = sqlx::query_scalar_with::<DB, i64, _>(&sql, args)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    Ok(u64::try_from(total).unwrap_or_default())
}

/// Run `query` for one page and return it with page metadata.
pub async fn fetch_page<DB, T>(
    pool: &Pool<DB>,
    query: &QueryBuilder,
    columns: &[&str],
    page: &PageRequest,
) -> SqlxResult<Page<T>>
where
    DB: BindFilterValue,
    for<'q> <DB as Database>::Arguments<'q>: IntoArguments<'q, DB>,
    for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
    T: for<'r> FromRow<'r, DB::Row> + Send + Unpin,
    (i64,): for<'r> FromRow<'r, DB::Row>,
{
    let total = count(pool, query).await?;
    let mut paged = query.clone();
    paged.paginate(page);
    let rows = fetch_all(pool, &paged, columns).await?;
    Ok(Page::new(rows, page, total))
}

/// [`fetch_page`] when `page` is set, otherwise an unpaged [`fetch_all`].
pub async fn fetch<DB, T>(
    pool: &Pool<DB>,
    query: &QueryBuilder,
    columns: &[&str],
    page: Option<&PageRequest>,
) -> SqlxResult<Page<T>>
where
    DB: BindFilterValue,
    for<'q> <DB as Database>::Arguments<'q>: IntoArguments<'q, DB>,
    for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
    T: for<'r> FromRow<'r, DB::Row> + Send + Unpin,
    (i64,): for<'r> FromRow<'r, DB::Row>,
{
    match page {
        Some(page) => fetch_page(pool, query, columns, page).await,
        None => Ok(Page::unpaged(fetch_all(pool, query, columns).await?)),
    }
}
