use duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "0001_index_tables",
    sql: r#"
CREATE TABLE IF NOT EXISTS quarterly_shares (
    ticker TEXT NOT NULL,
    report_date DATE NOT NULL,
    shares_outstanding DOUBLE NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (ticker, report_date)
);

CREATE TABLE IF NOT EXISTS market_caps (
    date DATE NOT NULL,
    ticker TEXT NOT NULL,
    shares_outstanding DOUBLE NOT NULL,
    closing_price DOUBLE NOT NULL,
    market_cap DOUBLE NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (date, ticker)
);

CREATE TABLE IF NOT EXISTS index_composition (
    date DATE NOT NULL,
    ticker TEXT NOT NULL,
    ticker_qty DOUBLE NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (date, ticker)
);

CREATE TABLE IF NOT EXISTS index_performance (
    date DATE PRIMARY KEY,
    index_value DOUBLE NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_market_caps_date_cap ON market_caps(date, market_cap);
CREATE INDEX IF NOT EXISTS idx_quarterly_shares_ticker_date ON quarterly_shares(ticker, report_date);
"#,
}];

pub fn apply_migrations(connection: &Connection) -> Result<(), duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let query = format!(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = '{}'",
            escape_sql_string(migration.version)
        );
        let applied_count: i64 = connection.query_row(query.as_str(), [], |row| row.get(0))?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            let insert = format!(
                "INSERT INTO schema_migrations (version) VALUES ('{}')",
                escape_sql_string(migration.version)
            );
            connection.execute_batch(insert.as_str())?;
        }
    }

    Ok(())
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
