//! SQL text of generated scripts
//!
//! Identifiers are bracket-quoted, statements inside one script are
//! separated by blank lines, and structural statements end with a `GO` batch
//! separator.

use std::fmt::Write;

use crate::model::{
    Column, DefaultConstraint, ForeignKey, FullTextCatalog, Name, PrimaryKey, ReferentialAction,
    Routine, RoutineKind, Row, SqlValue, Table, TableType,
};
use crate::parser::identifier_utils::quote_identifier;
use crate::parser::tokenize;
use crate::util::quote_string;

const GO: &str = "GO";
const INDENT: &str = "    ";

/// Name of the table a rebuilt table's data is parked in.
pub fn temp_table_name(table: &Name) -> Name {
    table.with_object(&format!("Tmp__{}", table.object_name()))
}

pub fn column_definition(column: &Column) -> String {
    let mut sql = quote_identifier(&column.name);
    if let Some(expression) = &column.computed {
        let _ = write!(sql, " AS ({})", expression.render());
        return sql;
    }
    let _ = write!(sql, " {}", column.data_type);
    if let Some(collation) = &column.collation {
        let _ = write!(sql, " COLLATE {}", collation);
    }
    if let Some(identity) = column.identity {
        let _ = write!(sql, " IDENTITY({},{})", identity.seed, identity.increment);
    }
    sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
    sql
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(",")
}

fn table_body(columns: &[Column], trailer: Option<String>) -> String {
    let mut lines: Vec<String> = columns
        .iter()
        .map(|c| format!("{}{}", INDENT, column_definition(c)))
        .collect();
    if let Some(trailer) = trailer {
        lines.push(format!("{}{}", INDENT, trailer));
    }
    format!("(\n{}\n)", lines.join(",\n"))
}

pub fn create_table(table: &Table) -> String {
    format!("CREATE TABLE {}{}\n{}", table.name, table_body(&table.columns, None), GO)
}

pub fn drop_table(table: &Name) -> String {
    format!("DROP TABLE {}\n{}", table, GO)
}

pub fn add_column(table: &Name, column: &Column, default: Option<&DefaultConstraint>) -> String {
    let mut sql = format!("ALTER TABLE {} ADD {}", table, column_definition(column));
    if let Some(default) = default {
        let _ = write!(
            sql,
            " CONSTRAINT {} DEFAULT {} WITH VALUES",
            quote_identifier(default.name.object_name()),
            default.expression.render()
        );
    }
    format!("{}\n{}", sql, GO)
}

pub fn alter_column(table: &Name, column: &Column) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {}\n{}",
        table,
        column_definition(column),
        GO
    )
}

pub fn rename_to_temp(table: &Name) -> String {
    let temp = temp_table_name(table);
    format!(
        "EXEC sp_rename {}, {}\n{}",
        quote_string(&table.to_string(), false),
        quote_string(temp.object_name(), false),
        GO
    )
}

/// Copy `columns` back from the parked table, then drop it.
pub fn restore_from_temp(table: &Name, columns: &[String], identity_insert: bool) -> String {
    let temp = temp_table_name(table);
    let list = column_list(columns);
    let mut sql = String::new();
    if identity_insert {
        let _ = writeln!(sql, "SET IDENTITY_INSERT {} ON", table);
    }
    let _ = writeln!(sql, "INSERT INTO {}({})", table, list);
    let _ = writeln!(sql, "SELECT {} FROM {}", list, temp);
    if identity_insert {
        let _ = writeln!(sql, "SET IDENTITY_INSERT {} OFF", table);
    }
    let _ = write!(sql, "{}\n\n{}", GO, drop_table(&temp));
    sql
}

pub fn add_primary_key(pk: &PrimaryKey) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY {}({})\n{}",
        pk.table,
        quote_identifier(pk.name.object_name()),
        if pk.clustered { "CLUSTERED" } else { "NONCLUSTERED" },
        column_list(&pk.columns),
        GO
    )
}

pub fn add_foreign_key(fk: &ForeignKey) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY({}) REFERENCES {}({})",
        fk.table,
        quote_identifier(fk.name.object_name()),
        column_list(&fk.columns),
        fk.referenced_table,
        column_list(&fk.referenced_columns)
    );
    if fk.on_delete != ReferentialAction::NoAction {
        let _ = write!(sql, " ON DELETE {}", fk.on_delete);
    }
    if fk.on_update != ReferentialAction::NoAction {
        let _ = write!(sql, " ON UPDATE {}", fk.on_update);
    }
    format!("{}\n{}", sql, GO)
}

pub fn add_default(df: &DefaultConstraint) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT {} FOR {}\n{}",
        df.table,
        quote_identifier(df.name.object_name()),
        df.expression.render(),
        quote_identifier(&df.column),
        GO
    )
}

pub fn drop_constraint(table: &Name, constraint: &Name) -> String {
    format!(
        "ALTER TABLE {} DROP CONSTRAINT {}\n{}",
        table,
        quote_identifier(constraint.object_name()),
        GO
    )
}

/// Definition as written, with a leading `ALTER` turned into `CREATE`.
pub fn create_routine(routine: &Routine) -> String {
    let tokens = tokenize(&routine.definition);
    let definition = match tokens.tokens().first() {
        Some(first) if first.is_word("ALTER") => routine
            .definition
            .get(first.end_index()..)
            .map_or_else(|| routine.definition.clone(), |rest| format!("CREATE{}", rest)),
        _ => routine.definition.clone(),
    };
    format!("{}\n{}", definition.trim_end(), GO)
}

pub fn drop_routine(kind: RoutineKind, name: &Name) -> String {
    format!("DROP {} {}\n{}", kind.keyword(), name, GO)
}

pub fn create_table_type(table_type: &TableType) -> String {
    let trailer = table_type
        .primary_key
        .as_ref()
        .map(|columns| format!("PRIMARY KEY ({})", column_list(columns)));
    format!(
        "CREATE TYPE {} AS TABLE{}\n{}",
        table_type.name,
        table_body(&table_type.columns, trailer),
        GO
    )
}

pub fn drop_table_type(name: &Name) -> String {
    format!("DROP TYPE {}\n{}", name, GO)
}

pub fn create_fulltext_catalog(catalog: &FullTextCatalog) -> String {
    let mut sql = format!(
        "CREATE FULLTEXT CATALOG {}",
        quote_identifier(catalog.name.object_name())
    );
    if let Some(sensitive) = catalog.accent_sensitive {
        let _ = write!(
            sql,
            " WITH ACCENT_SENSITIVITY = {}",
            if sensitive { "ON" } else { "OFF" }
        );
    }
    if catalog.is_default {
        sql.push_str(" AS DEFAULT");
    }
    format!("{}\n{}", sql, GO)
}

pub fn drop_fulltext_catalog(name: &Name) -> String {
    format!(
        "DROP FULLTEXT CATALOG {}\n{}",
        quote_identifier(name.object_name()),
        GO
    )
}

/// `INSERT` statements for `rows` of `table`, one per row.
pub fn insert_rows<'a>(table: &Table, rows: impl IntoIterator<Item = &'a Row>) -> String {
    let stored: Vec<(usize, &Column)> = table.stored_columns().collect();
    let names: Vec<String> = stored.iter().map(|(_, c)| c.name.clone()).collect();
    let list = column_list(&names);
    let mut statements = Vec::new();
    for row in rows {
        let values: Vec<String> = stored
            .iter()
            .map(|(i, c)| {
                row.get(*i)
                    .unwrap_or(&SqlValue::Null)
                    .to_sql(Some(&c.data_type))
            })
            .collect();
        statements.push(format!(
            "INSERT INTO {}({}) VALUES({})",
            table.name,
            list,
            values.join(",")
        ));
    }
    if table.identity_column().is_some() {
        statements.insert(0, format!("SET IDENTITY_INSERT {} ON", table.name));
        statements.push(format!("SET IDENTITY_INSERT {} OFF", table.name));
    }
    statements.join("\n\n")
}

/// `WHERE` clause matching `row` on `columns` of `table`.
pub fn row_predicate(table: &Table, row: &Row, columns: &[usize]) -> String {
    columns
        .iter()
        .map(|&i| {
            let column = &table.columns[i];
            let value = row.get(i).unwrap_or(&SqlValue::Null);
            let target = match column.data_type.comparable_cast() {
                Some(cast) => format!("CAST({} AS {})", quote_identifier(&column.name), cast),
                None => quote_identifier(&column.name),
            };
            if value.is_null() {
                format!("{} IS NULL", target)
            } else {
                format!("{} = {}", target, value.to_sql(Some(&column.data_type)))
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `DELETE` of the rows matching `predicate`; `top` limits how many.
pub fn delete_rows(table: &Name, predicate: &str, top: Option<usize>) -> String {
    match top {
        Some(n) => format!("DELETE TOP ({}) FROM {} WHERE {}", n, table, predicate),
        None => format!("DELETE FROM {} WHERE {}", table, predicate),
    }
}
