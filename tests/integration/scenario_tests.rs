//! Diff scenarios on in-memory snapshots

use pretty_assertions::assert_eq;
use rust_sqldiff::{Database, MessageLog, NullLogger, ScriptParser, ScriptSet, ScriptType};

use crate::common::database;

fn sorted_diff(desired: &Database, current: &Database) -> ScriptSet {
    let mut scripts = desired.create_diff_scripts(current, &mut NullLogger).unwrap();
    scripts.sort(&mut NullLogger);
    scripts
}

const SHOP: &str = r#"
CREATE TABLE customer (
    id int IDENTITY(1,1) PRIMARY KEY,
    name nvarchar(50) NOT NULL,
    region varchar(10) DEFAULT 'north'
)
GO
CREATE TABLE orders (
    id int NOT NULL,
    customer_id int NOT NULL REFERENCES customer,
    total decimal(10,2) NULL,
    CONSTRAINT PK_orders PRIMARY KEY (id)
)
GO
CREATE VIEW customer_totals AS
SELECT c.name, SUM(o.total) AS total
FROM customer c JOIN orders o ON o.customer_id = c.id
GROUP BY c.name
GO
INSERT INTO customer (name) VALUES (N'Ann'), (N'Bob')
INSERT INTO customer (name, region) VALUES (N'Cy', 'south')
INSERT INTO orders VALUES (1, 1, 10.50), (2, 3, NULL)
"#;

#[test]
fn test_idempotence() {
    let db = database(SHOP);
    let mut log = MessageLog::new();
    let scripts = db.create_diff_scripts(&db, &mut log).unwrap();
    assert!(scripts.is_empty(), "{}", scripts.to_sql());
}

#[test]
fn test_round_trip_through_generated_scripts() {
    let desired = database(SHOP);
    let scripts = sorted_diff(&desired, &Database::new());

    let mut parser = ScriptParser::new();
    parser.parse(&scripts.to_sql());
    let rebuilt = parser.into_database();

    let residual = desired.create_diff_scripts(&rebuilt, &mut NullLogger).unwrap();
    assert!(residual.is_empty(), "{}", residual.to_sql());
}

#[test]
fn test_additive_column_with_default() {
    let desired = database(
        r#"
CREATE TABLE foo (a varchar(10))
GO
ALTER TABLE foo ADD b varchar(20) DEFAULT 'foo'
GO
INSERT INTO foo (a) VALUES ('X')
INSERT INTO foo VALUES ('A', 'B')
"#,
    );
    let scripts = sorted_diff(&desired, &Database::new());
    assert_eq!(
        scripts.types(),
        vec![
            ScriptType::Table,
            ScriptType::DefaultConstraint,
            ScriptType::TableData
        ]
    );
    let data = &scripts.scripts()[2].text;
    assert_eq!(
        data,
        "INSERT INTO [dbo].[foo]([a],[b]) VALUES('X','foo')\n\nINSERT INTO [dbo].[foo]([a],[b]) VALUES('A','B')"
    );
}

#[test]
fn test_destructive_column_removal() {
    let desired = database(
        "CREATE TABLE foo (a varchar(10))
         INSERT INTO foo VALUES ('C'), ('D')",
    );
    let current = database(
        "CREATE TABLE foo (a varchar(10), b varchar(20))
         INSERT INTO foo VALUES ('A', 'B'), ('X', 'foo')",
    );
    let scripts = sorted_diff(&desired, &current);
    assert_eq!(
        scripts.types(),
        vec![
            ScriptType::TableRemoveData,
            ScriptType::TableSaveData,
            ScriptType::Table,
            ScriptType::TableData
        ]
    );
    assert!(scripts.scripts()[1]
        .text
        .starts_with("EXEC sp_rename '[dbo].[foo]', 'Tmp__foo'"));
}

#[test]
fn test_primary_key_rename_cascade() {
    let desired = database(
        "CREATE TABLE foo (a int CONSTRAINT PK_foo_a PRIMARY KEY)
         CREATE TABLE bar (a int REFERENCES foo)",
    );
    let current = database(
        "CREATE TABLE foo (a int PRIMARY KEY)
         CREATE TABLE bar (a int REFERENCES foo)",
    );
    let scripts = sorted_diff(&desired, &current);
    assert_eq!(
        scripts.types(),
        vec![
            ScriptType::DropForeignKey,
            ScriptType::DropPrimaryKey,
            ScriptType::PrimaryKey,
            ScriptType::ForeignKey
        ]
    );
}

#[test]
fn test_output_is_deterministic() {
    let desired = database(SHOP);
    let current = database(
        "CREATE TABLE customer (id int IDENTITY PRIMARY KEY, name nvarchar(40) NOT NULL)
         CREATE TABLE legacy (id int)
         INSERT INTO customer (name) VALUES (N'Ann'), (N'Zed')",
    );
    let first = sorted_diff(&desired, &current).to_sql();
    for _ in 0..5 {
        assert_eq!(sorted_diff(&desired, &current).to_sql(), first);
    }
}
