//! Project create form and the in-memory store it submits to

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemaform::{
    Form, FormConfig, FormStateSnapshot, ObjectSchema, Property, Record, SubmitErrors,
    SubmitHandler,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Data collected by the project create form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    pub status: String,
    pub team: String,
}

/// A stored project
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub team: String,
    pub created: DateTime<Utc>,
}

pub type ProjectForm = Form<ObjectSchema<ProjectCreate>>;

pub fn project_create_schema() -> ObjectSchema<ProjectCreate> {
    ObjectSchema::new()
        .property(
            Property::string("name")
                .label("Project name")
                .min_len(1, "Project name is required")
                .max_len(100, "Project name cannot be longer than 100 characters"),
        )
        .property(
            Property::enumeration("status", ["planned", "active", "completed"])
                .label("Status")
                .default_value(json!("active")),
        )
        .property(
            Property::string("team")
                .label("Team")
                .min_len(1, "Team is required"),
        )
}

/// Build the project create form wired to a store
pub fn project_form(config: &FormConfig, store: ProjectStore) -> ProjectForm {
    let mut defaults = Record::new();
    defaults.insert("status".to_string(), json!("active"));
    Form::builder(project_create_schema())
        .defaults(defaults)
        .options(config.form_options())
        .on_submit(store)
        .build()
}

/// In-memory project collection; project names are unique (case-insensitive)
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    projects: Arc<Mutex<Vec<Project>>>,
}

impl ProjectStore {
    pub async fn list(&self) -> Vec<Project> {
        self.projects.lock().await.clone()
    }
}

#[async_trait]
impl SubmitHandler<ProjectCreate> for ProjectStore {
    async fn submit(
        &self,
        data: ProjectCreate,
        _state: FormStateSnapshot,
        errors: SubmitErrors,
    ) -> anyhow::Result<()> {
        let mut projects = self.projects.lock().await;
        if projects
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&data.name))
        {
            errors.set_error(format!("A project named '{}' already exists", data.name));
            return Ok(());
        }

        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            status: data.status,
            team: data.team,
            created: Utc::now(),
        };
        tracing::info!(id = %project.id, name = %project.name, "Project created");
        projects.push(project);
        Ok(())
    }
}
