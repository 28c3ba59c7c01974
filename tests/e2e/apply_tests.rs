//! End-to-end tests applying generated migrations to SQL Server
//!
//! Each test creates a scratch database, brings it to a current state,
//! applies the migration to the desired state, and checks that the live
//! database matches the desired rows.
//!
//! Environment variables (with defaults):
//! - SQL_SERVER_HOST (default: localhost)
//! - SQL_SERVER_PORT (default: 1433)
//! - SQL_SERVER_USER (default: sa)
//! - SQL_SERVER_PASSWORD (default: Password1)
//!
//! Run with: cargo test --test e2e_tests -- --ignored

use std::sync::LazyLock;

use rust_sqldiff::project::split_batches;
use rust_sqldiff::{Database, NullLogger, ScriptSet};
use tiberius::{AuthMethod, Client, Config, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::common::database;

/// Load environment variables from .env file (if present)
fn load_env() {
    let _ = dotenvy::dotenv();
}

static SQL_CONFIG: LazyLock<SqlServerConfig> = LazyLock::new(|| {
    load_env();
    SqlServerConfig {
        host: std::env::var("SQL_SERVER_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: std::env::var("SQL_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(1433),
        user: std::env::var("SQL_SERVER_USER").unwrap_or_else(|_| "sa".to_string()),
        password: std::env::var("SQL_SERVER_PASSWORD").unwrap_or_else(|_| "Password1".to_string()),
    }
});

struct SqlServerConfig {
    host: String,
    port: u16,
    user: String,
    password: String,
}

const TEST_DATABASE: &str = "SqlDiff_E2E";

type SqlClient = Client<Compat<TcpStream>>;

fn create_config(database: Option<&str>) -> Config {
    let mut config = Config::new();
    config.host(&SQL_CONFIG.host);
    config.port(SQL_CONFIG.port);
    config.authentication(AuthMethod::sql_server(&SQL_CONFIG.user, &SQL_CONFIG.password));
    config.trust_cert();
    if let Some(db) = database {
        config.database(db);
    }
    config
}

async fn connect(database: Option<&str>) -> Result<SqlClient, Box<dyn std::error::Error>> {
    let config = create_config(database);
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    let client = Client::connect(config, tcp.compat_write()).await?;
    Ok(client)
}

fn get_count(row: Option<Row>) -> i32 {
    row.and_then(|r| r.get::<i32, _>(0)).unwrap_or(0)
}

async fn recreate_database() -> Result<SqlClient, Box<dyn std::error::Error>> {
    let mut master = connect(None).await?;
    let query = format!(
        "IF EXISTS (SELECT 1 FROM sys.databases WHERE name = '{0}') \
         BEGIN \
             ALTER DATABASE [{0}] SET SINGLE_USER WITH ROLLBACK IMMEDIATE; \
             DROP DATABASE [{0}]; \
         END; \
         CREATE DATABASE [{0}];",
        TEST_DATABASE
    );
    master.execute(&query, &[]).await?;
    connect(Some(TEST_DATABASE)).await
}

async fn run(client: &mut SqlClient, sql: &str) -> Result<(), Box<dyn std::error::Error>> {
    for batch in split_batches(sql) {
        client
            .execute(batch.as_str(), &[])
            .await
            .map_err(|e| format!("{}\n--- batch ---\n{}", e, batch))?;
    }
    Ok(())
}

fn migration(desired: &Database, current: &Database) -> ScriptSet {
    let mut scripts = desired.create_diff_scripts(current, &mut NullLogger).unwrap();
    scripts.sort(&mut NullLogger);
    scripts
}

async fn count(client: &mut SqlClient, query: &str) -> i32 {
    let row = client
        .query(query, &[])
        .await
        .unwrap()
        .into_row()
        .await
        .unwrap();
    get_count(row)
}

#[tokio::test]
#[ignore = "Requires SQL Server"]
async fn test_apply_destructive_change_keeps_surviving_rows() {
    let current_sql = "CREATE TABLE foo (a varchar(10), b varchar(20))
                       INSERT INTO foo VALUES ('A', 'B'), ('X', 'foo')";
    let desired_sql = "CREATE TABLE foo (a varchar(10) NOT NULL)
                       INSERT INTO foo VALUES ('A'), ('C')";

    let mut client = recreate_database().await.expect("Failed to prepare database");
    let current = database(current_sql);
    run(&mut client, &migration(&current, &Database::new()).to_sql())
        .await
        .expect("Failed to create current state");

    let desired = database(desired_sql);
    run(&mut client, &migration(&desired, &current).to_sql())
        .await
        .expect("Failed to apply migration");

    assert_eq!(count(&mut client, "SELECT COUNT(*) FROM dbo.foo").await, 2);
    assert_eq!(
        count(&mut client, "SELECT COUNT(*) FROM dbo.foo WHERE a IN ('A', 'C')").await,
        2
    );
    assert_eq!(
        count(
            &mut client,
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = 'Tmp__foo'"
        )
        .await,
        0
    );
}

#[tokio::test]
#[ignore = "Requires SQL Server"]
async fn test_apply_key_rename_cascade() {
    let current_sql = "CREATE TABLE foo (a int PRIMARY KEY)
                       CREATE TABLE bar (a int REFERENCES foo)
                       INSERT INTO foo VALUES (1)
                       INSERT INTO bar VALUES (1)";
    let desired_sql = "CREATE TABLE foo (a int CONSTRAINT PK_foo_a PRIMARY KEY)
                       CREATE TABLE bar (a int REFERENCES foo)
                       INSERT INTO foo VALUES (1)
                       INSERT INTO bar VALUES (1)";

    let mut client = recreate_database().await.expect("Failed to prepare database");
    let current = database(current_sql);
    run(&mut client, &migration(&current, &Database::new()).to_sql())
        .await
        .expect("Failed to create current state");
    run(&mut client, &migration(&database(desired_sql), &current).to_sql())
        .await
        .expect("Failed to apply migration");

    assert_eq!(
        count(
            &mut client,
            "SELECT COUNT(*) FROM sys.key_constraints WHERE name = 'PK_foo_a'"
        )
        .await,
        1
    );
    assert_eq!(
        count(&mut client, "SELECT COUNT(*) FROM sys.foreign_keys").await,
        1
    );
}
