//! PostgreSQL Connector
//!
//! The sole production implementor of [`crate::exec::Database`]. A thin
//! wrapper over `postgres::Client`, grounded on the teacher's practice of
//! keeping the concrete collaborator behind the narrow trait in `exec.rs`
//! to a single small file rather than spreading driver calls through the
//! orchestration layer.

use crate::config::DatabaseConfig;
use crate::error::{HopError, HopResult};
use crate::exec::{Database, Row};
use postgres::types::ToSql;
use postgres::{Client, NoTls, SimpleQueryMessage};

pub struct PgDatabase {
  client: Client,
  name: String,
}

/// Connect to the database described by `config`.
pub fn connect(config: &DatabaseConfig) -> HopResult<PgDatabase> {
  let mut pg_config = postgres::Config::new();
  pg_config.dbname(&config.name);
  pg_config.user(&config.user);
  pg_config.port(config.port);
  if let Some(host) = &config.host {
    pg_config.host(host);
  }
  if let Some(password) = &config.password {
    pg_config.password(password);
  }

  let client = pg_config
    .connect(NoTls)
    .map_err(|e| HopError::message(format!("failed to connect to database '{}': {}", config.name, e)))?;

  Ok(PgDatabase { client, name: config.name.clone() })
}

impl Database for PgDatabase {
  fn execute(&mut self, sql: &str) -> HopResult<()> {
    self.client.batch_execute(sql).map_err(|e| HopError::message(format!("statement failed: {}", e)))
  }

  fn insert(&mut self, table: &str, row: &[(&str, &str)]) -> HopResult<()> {
    let columns: Vec<&str> = row.iter().map(|(k, _)| *k).collect();
    let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("${}", i)).collect();
    let query = format!("insert into {} ({}) values ({})", table, columns.join(", "), placeholders.join(", "));

    let params: Vec<&(dyn ToSql + Sync)> = row.iter().map(|(_, v)| v as &(dyn ToSql + Sync)).collect();
    self.client.execute(&query, &params).map_err(|e| HopError::message(format!("insert into {} failed: {}", table, e)))?;
    Ok(())
  }

  fn query(&mut self, sql: &str) -> HopResult<Vec<Row>> {
    let messages = self.client.simple_query(sql).map_err(|e| HopError::message(format!("query failed: {}", e)))?;
    Ok(
      messages
        .into_iter()
        .filter_map(|message| match message {
          SimpleQueryMessage::Row(row) => {
            let values: Row = (0..row.columns().len()).map(|i| row.get(i).map(str::to_string)).collect();
            Some(values)
          }
          _ => None,
        })
        .collect(),
    )
  }

  fn name(&self) -> &str {
    &self.name
  }
}
