//! Test helpers for PostgreSQL-backed tests.
//!
//! Each context recreates the `widgets` and `widget_histories` tables, so tests using
//! it must run serially against a database reachable through `DATABASE_URL`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use history_core_db::models::{Field, Versioned, VersioningPolicy};
use history_core_db::versioning::HistoryManager;
use sqlx::Executor;

use crate::config::HistoryDbConfig;
use crate::connections::PgConnections;
use crate::store::PgStore;

pub const WIDGETS: &str = "widgets";
pub const WIDGET_HISTORIES: &str = "widget_histories";

const SCHEMA: &str = r#"
DROP TABLE IF EXISTS widget_histories;
DROP TABLE IF EXISTS widgets;
CREATE TABLE widgets (
    id BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ
);
CREATE TABLE widget_histories (
    id BIGSERIAL PRIMARY KEY,
    widget_id BIGINT NOT NULL,
    name TEXT,
    status TEXT,
    created_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ
);
"#;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetModel {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Versioned for WidgetModel {
    fn table_name() -> &'static str {
        WIDGETS
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::new("id", |w| w.id.into(), |w, v| {
                w.id = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("name", |w| w.name.clone().into(), |w, v| {
                w.name = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("status", |w| w.status.clone().into(), |w, v| {
                w.status = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("created_at", |w| w.created_at.into(), |w, v| {
                w.created_at = v.into_option()?;
                Ok(())
            }),
            Field::<Self>::new("updated_at", |w| w.updated_at.into(), |w, v| {
                w.updated_at = v.into_option()?;
                Ok(())
            }),
        ]
    }
}

pub fn create_test_widget(id: i64, name: &str, status: &str) -> WidgetModel {
    WidgetModel {
        id,
        name: name.to_string(),
        status: status.to_string(),
        created_at: None,
        updated_at: None,
    }
}

pub struct TestContext {
    pub manager: HistoryManager<PgConnections>,
    pub store: Arc<PgStore>,
    pub policy: VersioningPolicy<WidgetModel>,
}

/// Connect through `DATABASE_URL` and recreate the widget tables
pub async fn setup_test_context() -> Result<TestContext, Box<dyn std::error::Error + Send + Sync>> {
    let config = HistoryDbConfig {
        max_connections: 1,
        ..HistoryDbConfig::from_env()
    };
    let pool = config.pool_options().connect(&config.database_url).await?;
    pool.execute(SCHEMA).await?;

    let connections = PgConnections::new(Arc::new(pool));
    let store = connections.default_store().clone();

    Ok(TestContext {
        manager: HistoryManager::new(connections),
        store,
        policy: VersioningPolicy::with_defaults()?,
    })
}
