use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{Field, Tracked, Versioned, VersioningOptions, VersioningPolicy};
use crate::repository::memory::{MemoryConnections, MemoryStore};
use crate::versioning::HistoryManager;

pub const PROJECTS: &str = "projects";
pub const PROJECT_HISTORIES: &str = "project_histories";
pub const ENTITIES: &str = "entities";
pub const ENTITY_HISTORIES: &str = "entity_histories";
pub const CODED_ITEMS: &str = "coded_items";
pub const CODED_ITEM_HISTORIES: &str = "coded_item_histories";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectModel {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub view_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Versioned for ProjectModel {
    fn table_name() -> &'static str {
        PROJECTS
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::new("id", |p| p.id.into(), |p, v| {
                p.id = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("name", |p| p.name.clone().into(), |p, v| {
                p.name = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("status", |p| p.status.clone().into(), |p, v| {
                p.status = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("view_count", |p| p.view_count.into(), |p, v| {
                p.view_count = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("created_at", |p| p.created_at.into(), |p, v| {
                p.created_at = v.into_option()?;
                Ok(())
            }),
            Field::<Self>::new("updated_at", |p| p.updated_at.into(), |p, v| {
                p.updated_at = v.into_option()?;
                Ok(())
            }),
        ]
    }
}

/// Entity without timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityModel {
    pub id: i64,
    pub name: String,
    pub status: String,
}

impl Versioned for EntityModel {
    fn table_name() -> &'static str {
        ENTITIES
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::new("id", |e| e.id.into(), |e, v| {
                e.id = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("name", |e| e.name.clone().into(), |e, v| {
                e.name = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("status", |e| e.status.clone().into(), |e, v| {
                e.status = v.try_into()?;
                Ok(())
            }),
        ]
    }
}

/// Entity keyed by a natural `code` instead of `id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodedItemModel {
    pub code: String,
    pub label: String,
}

impl Versioned for CodedItemModel {
    fn table_name() -> &'static str {
        CODED_ITEMS
    }

    fn key_name() -> &'static str {
        "code"
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::new("code", |c| c.code.clone().into(), |c, v| {
                c.code = v.try_into()?;
                Ok(())
            }),
            Field::<Self>::new("label", |c| c.label.clone().into(), |c, v| {
                c.label = v.try_into()?;
                Ok(())
            }),
        ]
    }
}

pub struct TestContext {
    pub manager: HistoryManager<MemoryConnections>,
    pub store: Arc<MemoryStore>,
    pub archive: Arc<MemoryStore>,
    pub policy: VersioningPolicy<ProjectModel>,
}

pub fn create_test_project(id: i64) -> ProjectModel {
    ProjectModel {
        id,
        name: format!("Project {id}"),
        status: "open".to_string(),
        view_count: 0,
        created_at: None,
        updated_at: None,
    }
}

pub fn project_options() -> VersioningOptions {
    VersioningOptions {
        ignored_fields: vec!["view_count".to_string()],
        ..VersioningOptions::default()
    }
}

pub fn project_policy() -> VersioningPolicy<ProjectModel> {
    VersioningPolicy::register(project_options()).expect("project policy is valid")
}

/// Default store and an `archive` connection, each with the project tables created
pub fn setup_projects() -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let archive = Arc::new(MemoryStore::new());
    for s in [&store, &archive] {
        s.create_table(PROJECTS);
        s.create_table(PROJECT_HISTORIES);
        s.create_table(ENTITIES);
        s.create_table(ENTITY_HISTORIES);
        s.create_table(CODED_ITEMS);
        s.create_table(CODED_ITEM_HISTORIES);
    }

    let connections =
        MemoryConnections::new(store.clone()).with_connection("archive", archive.clone());

    TestContext {
        manager: HistoryManager::new(connections),
        store,
        archive,
        policy: project_policy(),
    }
}

/// Insert a fresh project through the save path
pub async fn persist_project(ctx: &TestContext, project: ProjectModel) -> Tracked<ProjectModel> {
    let mut tracked = Tracked::new(project);
    ctx.manager
        .save(&mut tracked, &ctx.policy, None)
        .await
        .expect("project is inserted");
    tracked
}
