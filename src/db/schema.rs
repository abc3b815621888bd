use sqlx::{PgPool, SqlitePool};

pub const POSTGRES_SCHEMA: &str = include_str!("../../sql/postgres_schema.sql");
pub const SQLITE_SCHEMA: &str = include_str!("../../sql/sqlite_schema.sql");

pub async fn apply_postgres(pool: &PgPool) -> Result<(), sqlx::Error> {
    for stmt in split_sql_statements(POSTGRES_SCHEMA) {
        sqlx::query(&stmt).execute(pool).await?;
    }
    Ok(())
}

pub async fn apply_sqlite(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in split_sql_statements(SQLITE_SCHEMA) {
        sqlx::query(&stmt).execute(pool).await?;
    }
    Ok(())
}

/// Splits a script on `;` outside quotes, dropping `--` comment lines.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for line in sql.lines() {
        if !in_single_quote && !in_double_quote && line.trim_start().starts_with("--") {
            continue;
        }
        for ch in line.chars() {
            match ch {
                '\'' if !in_double_quote => in_single_quote = !in_single_quote,
                '"' if !in_single_quote => in_double_quote = !in_double_quote,
                ';' if !in_single_quote && !in_double_quote => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        current.push('\n');
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_statements() {
        let sql = "-- header\nCREATE TABLE \"a;b\" (x TEXT DEFAULT ';');\n\nSELECT 1;";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE \"a;b\""));
        assert_eq!(statements[1], "SELECT 1");
    }

    #[test]
    fn test_bundled_schemas_split() {
        assert_eq!(split_sql_statements(SQLITE_SCHEMA).len(), 3);
        assert_eq!(split_sql_statements(POSTGRES_SCHEMA).len(), 3);
    }
}
