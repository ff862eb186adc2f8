use super::payload::ScalarId;
use super::query::TemplateQuery;
use crate::config::MySqlSettings;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};
use std::collections::HashMap;
use std::sync::Mutex;

/// Source of template version rows.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// First row of the query result as a JSON object, `None` when empty.
    async fn fetch_first(&self, query: &TemplateQuery) -> Result<Option<Map<String, Value>>>;
}

/// Opens a fresh connection per lookup and closes it afterwards.
#[derive(Debug, Clone)]
pub struct MySqlTemplateStore {
    settings: MySqlSettings,
}

impl MySqlTemplateStore {
    pub fn new(settings: MySqlSettings) -> Self {
        Self { settings }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .username(&self.settings.user)
            .password(&self.settings.password)
            .database(&self.settings.database)
            .charset("utf8mb4")
    }
}

#[async_trait]
impl TemplateStore for MySqlTemplateStore {
    async fn fetch_first(&self, query: &TemplateQuery) -> Result<Option<Map<String, Value>>> {
        let mut conn = MySqlConnection::connect_with(&self.connect_options()).await?;

        let mut statement = sqlx::query(&query.sql);
        for param in &query.params {
            statement = match param {
                ScalarId::Int(i) => statement.bind(*i),
                ScalarId::Text(s) => statement.bind(s.clone()),
            };
        }

        let row = statement.fetch_optional(&mut conn).await;
        if let Err(e) = conn.close().await {
            tracing::warn!("Failed to close MySQL connection: {}", e);
        }

        Ok(row?.as_ref().map(row_to_json))
    }
}

fn row_to_json(row: &MySqlRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|column| {
            let value = column_value(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// Decode one column by its MySQL type name; anything unrecognized is read
/// as text, then as lossy UTF-8 bytes.
fn column_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let is_null = row
        .try_get_raw(index)
        .map(|raw| raw.is_null())
        .unwrap_or(true);
    if is_null {
        return Value::Null;
    }

    let decoded = match type_name {
        "BOOLEAN" => row.try_get::<bool, _>(index).ok().map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).ok().map(Value::from)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).ok().map(Value::from),
        "FLOAT" | "DOUBLE" => row.try_get::<f64, _>(index).ok().map(Value::from),
        "DATETIME" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .ok()
            .map(|v| Value::from(v.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIMESTAMP" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(index)
            .ok()
            .map(|v| Value::from(v.to_rfc3339())),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(index)
            .ok()
            .map(|v| Value::from(v.to_string())),
        "JSON" => row.try_get::<Value, _>(index).ok(),
        _ => None,
    };

    decoded
        .or_else(|| row.try_get_unchecked::<String, _>(index).ok().map(Value::from))
        .or_else(|| {
            row.try_get_unchecked::<Vec<u8>, _>(index)
                .ok()
                .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned()))
        })
        .unwrap_or(Value::Null)
}

/// Rows keyed by the query's bound parameters, for runs without a database.
#[derive(Default)]
pub struct InMemoryTemplateStore {
    rows: Mutex<HashMap<Vec<String>, Map<String, Value>>>,
    queries: Mutex<Vec<TemplateQuery>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries bound to exactly `params` with `row`.
    pub fn with_row(self, params: &[ScalarId], row: Value) -> Self {
        let key = params.iter().map(ToString::to_string).collect();
        let row = match row {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, row);
        self
    }

    pub fn queries(&self) -> Vec<TemplateQuery> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn fetch_first(&self, query: &TemplateQuery) -> Result<Option<Map<String, Value>>> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.clone());
        let key: Vec<String> = query.params.iter().map(ToString::to_string).collect();
        Ok(self
            .rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned())
    }
}
