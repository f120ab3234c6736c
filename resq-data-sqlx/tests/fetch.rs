use resq_data::{Comparison, DataError, Dialect, Direction, FilterValue, IdentifierPolicy, PageRequest, QueryBuilder, QueryTarget};
use resq_data_sqlx::{count, fetch, fetch_all, fetch_page};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct Item {
    id: i64,
    name: String,
    kind: String,
}

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, kind TEXT NOT NULL, price REAL NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    let rows = [
        ("apple", "fruit", 1.5),
        ("banana", "fruit", 0.5),
        ("carrot", "vegetable", 0.8),
        ("cherry", "fruit", 4.0),
        ("leek", "vegetable", 2.2),
    ];
    for (name, kind, price) in rows {
        sqlx::query("INSERT INTO items (name, kind, price) VALUES (?, ?, ?)")
            .bind(name)
            .bind(kind)
            .bind(price)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool
}

fn items() -> QueryBuilder {
    QueryBuilder::new_with_dialect("items", Dialect::Sqlite).identifier_policy(IdentifierPolicy::Quote)
}

const COLUMNS: &[&str] = &["id", "name", "kind"];

#[tokio::test]
async fn fetch_all_applies_predicates_and_order() {
    let pool = setup_pool().await;
    let mut query = items();
    query.where_cmp("kind", Comparison::Eq, &FilterValue::from("fruit"));
    QueryTarget::order_by(&mut query, "name", Direction::Desc);

    let rows: Vec<Item> = fetch_all(&pool, &query, COLUMNS).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["cherry", "banana", "apple"]);
}

#[tokio::test]
async fn binds_like_and_in_values() {
    let pool = setup_pool().await;
    let mut query = items();
    query.where_cmp("name", Comparison::Like, &FilterValue::from("%an%"));
    let rows: Vec<Item> = fetch_all(&pool, &query, COLUMNS).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "banana");

    let mut query = items();
    query.where_in("id", &[FilterValue::Int(1), FilterValue::from("3")]);
    QueryTarget::order_by(&mut query, "id", Direction::Asc);
    let rows: Vec<Item> = fetch_all(&pool, &query, COLUMNS).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);

    let mut query = items();
    query.where_cmp("price", Comparison::Gte, &FilterValue::Float(2.0));
    assert_eq!(count(&pool, &query).await.unwrap(), 2);
}

#[tokio::test]
async fn fetch_page_counts_without_paging() {
    let pool = setup_pool().await;
    let mut query = items();
    QueryTarget::order_by(&mut query, "id", Direction::Asc);

    let page: resq_data::Page<Item> = fetch_page(&pool, &query, COLUMNS, &PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(page.data.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 4]);
    let meta = page.meta.unwrap();
    assert_eq!(meta.total, 5);
    assert_eq!(meta.last_page, 3);
    assert_eq!(meta.current_page, 2);
}

#[tokio::test]
async fn fetch_without_page_is_unpaged() {
    let pool = setup_pool().await;
    let page: resq_data::Page<Item> = fetch(&pool, &items(), COLUMNS, None).await.unwrap();
    assert_eq!(page.data.len(), 5);
    assert!(page.meta.is_none());
}

#[tokio::test]
async fn invalid_identifier_is_a_query_error() {
    let pool = setup_pool().await;
    let mut query = items();
    query.where_cmp("name; DROP TABLE items", Comparison::Eq, &FilterValue::from("x"));

    let err = fetch_all::<_, Item>(&pool, &query, COLUMNS).await.unwrap_err();
    assert!(matches!(err, DataError::Query(_)));
    assert_eq!(count(&pool, &items()).await.unwrap(), 5);
}
