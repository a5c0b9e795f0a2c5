//! CRUD round trips against a live database.
//!
//! Set `DATABASE_URL` (or put it in `.env`) to run these; they are skipped otherwise.

use chrono::{DateTime, Utc};
use pgcrud::qb::{self, WhereClause};
use pgcrud::{FromRow, Pool, Record, StoreError, StoreResult, Value};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, FromRow)]
struct Task {
    id: i64,
    title: String,
    #[pgcrud(column = "description")]
    details: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

fn database_url(test: &str) -> Option<String> {
    let _ = dotenvy::dotenv();
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

fn unique_table(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("{prefix}_{}_{}", std::process::id(), nanos % 1_000_000_000)
}

async fn create_tasks_table(pool: &Pool, table: &str) -> StoreResult<()> {
    pool.execute(
        &format!(
            "CREATE TABLE {table} (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL UNIQUE,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'new',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"
        ),
        &[],
    )
    .await?;
    Ok(())
}

async fn drop_table(pool: &Pool, table: &str) {
    let _ = pool
        .execute(&format!("DROP TABLE IF EXISTS {table}"), &[])
        .await;
}

#[tokio::test]
async fn task_crud_round_trip() -> StoreResult<()> {
    let Some(url) = database_url("task_crud_round_trip") else {
        return Ok(());
    };
    let pool = Pool::connect(&url).await?;
    let table = unique_table("pgcrud_tasks");
    create_tasks_table(&pool, &table).await?;

    let result = async {
        let created: Task = qb::build_insert(
            &table,
            &["title", "description", "status"],
            [Value::from("buy milk"), Value::Null, Value::from("new")],
        )?
        .fetch_one(&pool)
        .await?;
        assert!(created.id > 0);
        assert_eq!(created.title, "buy milk");
        assert_eq!(created.details, None);

        let read_back: Task = qb::build_select(&table, &[] as &[&str], [("id", created.id)])?
            .fetch_one(&pool)
            .await?;
        assert_eq!(read_back, created);

        qb::build_insert(&table, &["title"], ["walk dog"])?
            .execute(&pool)
            .await?;

        let open: Vec<Task> = qb::build_select(
            &table,
            &["id", "title", "description", "status", "created_at"],
            WhereClause::new().eq("status", "new"),
        )?
        .fetch_all(&pool)
        .await?;
        assert_eq!(open.len(), 2);

        let affected = qb::build_update(
            &table,
            &["title", "status"],
            ["done task", "done"],
            WhereClause::new().eq("id", created.id),
        )?
        .execute(&pool)
        .await?;
        assert_eq!(affected, 1);

        let updated: Task = qb::build_select(&table, &[] as &[&str], [("id", created.id)])?
            .fetch_one(&pool)
            .await?;
        assert_eq!(updated.title, "done task");
        assert_eq!(updated.status, "done");
        assert_eq!(updated.created_at, created.created_at);

        let deleted = qb::build_delete(&table, WhereClause::new().eq("id", created.id))?
            .execute(&pool)
            .await?;
        assert_eq!(deleted, 1);

        let missing = qb::build_select(&table, &[] as &[&str], [("id", created.id)])?
            .fetch_one::<Task>(&pool)
            .await
            .unwrap_err();
        assert!(missing.is_not_found());

        Ok::<(), StoreError>(())
    }
    .await;

    drop_table(&pool, &table).await;
    pool.close();
    result
}

#[tokio::test]
async fn collect_one_rejects_multiple_rows() -> StoreResult<()> {
    let Some(url) = database_url("collect_one_rejects_multiple_rows") else {
        return Ok(());
    };
    let pool = Pool::connect(&url).await?;
    let table = unique_table("pgcrud_multi");
    create_tasks_table(&pool, &table).await?;

    let result = async {
        for title in ["a", "b", "c"] {
            qb::build_insert(&table, &["title"], [title])?
                .execute(&pool)
                .await?;
        }

        let rows = qb::build_select(&table, &["title"], WhereClause::new())?
            .fetch_rows(&pool)
            .await?;
        assert_eq!(rows.len(), 3);
        let err = pgcrud::collect_one::<Record>(rows).unwrap_err();
        assert!(matches!(err, StoreError::TooManyRows { expected: 1, got: 3 }));

        let rows = pool
            .query(
                &format!("SELECT id, title, description FROM {table} ORDER BY title"),
                &[],
            )
            .await?;
        let records: Vec<Record> = pgcrud::collect_many(rows)?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("title"), Some(&Value::from("a")));
        assert_eq!(records[0].get("description"), Some(&Value::Null));
        assert!(matches!(records[0].get("id"), Some(Value::Int(_))));

        Ok::<(), StoreError>(())
    }
    .await;

    drop_table(&pool, &table).await;
    pool.close();
    result
}

#[tokio::test]
async fn missing_column_is_scan_error() -> StoreResult<()> {
    let Some(url) = database_url("missing_column_is_scan_error") else {
        return Ok(());
    };
    let pool = Pool::connect(&url).await?;

    let rows = pool.query("SELECT 1::BIGINT AS id, 'x' AS title", &[]).await?;
    let err = pgcrud::collect_many::<Task>(rows).unwrap_err();
    assert!(matches!(err, StoreError::Scan { ref column, .. } if column == "description"));

    pool.close();
    Ok(())
}

#[tokio::test]
async fn unique_violation_is_classified() -> StoreResult<()> {
    let Some(url) = database_url("unique_violation_is_classified") else {
        return Ok(());
    };
    let pool = Pool::connect(&url).await?;
    let table = unique_table("pgcrud_unique");
    create_tasks_table(&pool, &table).await?;

    let insert = qb::build_insert(&table, &["title"], ["same"])?;
    insert.execute(&pool).await?;
    let err = insert.execute(&pool).await.unwrap_err();

    drop_table(&pool, &table).await;
    pool.close();

    assert!(err.is_unique_violation(), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn transaction_is_a_generic_client() -> StoreResult<()> {
    let Some(url) = database_url("transaction_is_a_generic_client") else {
        return Ok(());
    };
    let pool = Pool::connect(&url).await?;
    let table = unique_table("pgcrud_tx");
    create_tasks_table(&pool, &table).await?;

    let result = async {
        let mut conn = pool.get().await?;
        let client: &mut tokio_postgres::Client = &mut conn;
        let tx = client
            .transaction()
            .await
            .map_err(StoreError::from_db_error)?;
        qb::build_insert(&table, &["title"], ["rolled back"])?
            .execute(&tx)
            .await?;
        tx.rollback().await.map_err(StoreError::from_db_error)?;

        let rows = qb::build_select(&table, &["id"], WhereClause::new())?
            .fetch_rows(&pool)
            .await?;
        assert!(rows.is_empty());
        Ok::<(), StoreError>(())
    }
    .await;

    drop_table(&pool, &table).await;
    pool.close();
    result
}

#[tokio::test]
async fn closed_pool_reports_connection_error() -> StoreResult<()> {
    let Some(url) = database_url("closed_pool_reports_connection_error") else {
        return Ok(());
    };
    let pool = Pool::connect(&url).await?;
    pool.close();
    pool.close();
    assert!(pool.is_closed());

    let err = pool.execute("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, StoreError::Connection(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn validation_fails_before_any_io() {
    // No database needed: rejected inputs never reach the pool.
    let err = qb::build_delete("tasks", WhereClause::new()).unwrap_err();
    assert_eq!(
        err,
        pgcrud::ValidationError::EmptyWhereClause { statement: "DELETE" }
    );
}

#[tokio::test]
async fn unreachable_server_fails_fast() {
    let err = Pool::connect("postgres://postgres@127.0.0.1:1/postgres?connect_timeout=2")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn malformed_dsn_is_connection_error() {
    let err = Pool::connect("not a dsn ===").await.unwrap_err();
    assert!(matches!(err, StoreError::Connection(_)), "got {err:?}");
}
