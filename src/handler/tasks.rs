//! Task endpoint handlers
//!
//! One function per route; each turns the decoded request into store calls.

use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::collections::HashMap;

use super::decode::{TaskDraft, TaskPayload};
use super::error::ApiError;
use crate::http;
use crate::logger;
use crate::routing::TaskAction;
use crate::store::{NewTask, Store, Table, TaskPatch, TaskSearch};

/// Everything a handler gets from the dispatcher
#[derive(Debug, Default)]
pub struct TaskRequest {
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Option<TaskPayload>,
}

impl TaskRequest {
    fn id(&self) -> &str {
        self.params.get("id").map_or("", String::as_str)
    }

    fn payload(&self) -> TaskPayload {
        self.body.clone().unwrap_or_default()
    }
}

type HandlerResult = Result<Response<Full<Bytes>>, ApiError>;

pub async fn handle(action: TaskAction, request: TaskRequest, store: &Store) -> HandlerResult {
    match action {
        TaskAction::List => list_tasks(&request, store).await,
        TaskAction::Create => create_task(&request, store).await,
        TaskAction::Update => update_task(&request, store).await,
        TaskAction::Delete => delete_task(&request, store).await,
        TaskAction::Complete => complete_task(&request, store).await,
        TaskAction::Populate => populate_tasks(&request, store).await,
    }
}

/// GET /tasks[?search=text]
async fn list_tasks(request: &TaskRequest, store: &Store) -> HandlerResult {
    let search = request
        .query
        .get("search")
        .filter(|s| !s.is_empty())
        .map(|s| TaskSearch::text(s));

    let tasks = store.select(Table::Tasks, search.as_ref()).await;
    Ok(http::build_json_response(StatusCode::OK, &tasks))
}

/// POST /tasks
async fn create_task(request: &TaskRequest, store: &Store) -> HandlerResult {
    let payload = request.payload();

    if let Some(drafts) = payload.tasks {
        insert_drafts(drafts, store).await;
        return Ok(http::build_empty_response(StatusCode::CREATED));
    }

    let (Some(title), Some(description)) = (
        non_empty(payload.title),
        non_empty(payload.description),
    ) else {
        return Err(ApiError::Validation("title and description are required"));
    };

    let task = store
        .insert(Table::Tasks, NewTask::new(title, description, Utc::now()))
        .await;
    logger::log_debug(&format!("[Tasks] Created {}", task.id));

    Ok(http::build_empty_response(StatusCode::CREATED))
}

/// PUT /tasks/:id
async fn update_task(request: &TaskRequest, store: &Store) -> HandlerResult {
    let payload = request.payload();
    let patch = TaskPatch {
        title: non_empty(payload.title),
        description: non_empty(payload.description),
        completed_at: None,
    };

    if patch.title.is_none() && patch.description.is_none() {
        return Err(ApiError::Validation("title or description is required"));
    }

    store.update(Table::Tasks, request.id(), &patch).await?;
    Ok(http::build_empty_response(StatusCode::NO_CONTENT))
}

/// DELETE /tasks/:id
async fn delete_task(request: &TaskRequest, store: &Store) -> HandlerResult {
    store.delete(Table::Tasks, request.id()).await?;
    Ok(http::build_empty_response(StatusCode::NO_CONTENT))
}

/// PATCH /tasks/:id/complete
async fn complete_task(request: &TaskRequest, store: &Store) -> HandlerResult {
    store
        .update(Table::Tasks, request.id(), &TaskPatch::complete(Utc::now()))
        .await?;
    Ok(http::build_empty_response(StatusCode::NO_CONTENT))
}

/// POST /tasks/populate
async fn populate_tasks(request: &TaskRequest, store: &Store) -> HandlerResult {
    let Some(drafts) = request.payload().tasks else {
        return Err(ApiError::Validation("tasks are required"));
    };

    insert_drafts(drafts, store).await;
    Ok(http::build_empty_response(StatusCode::CREATED))
}

async fn insert_drafts(drafts: Vec<TaskDraft>, store: &Store) {
    let now = Utc::now();
    let records = drafts.into_iter().map(|d| d.into_new_task(now)).collect();
    let tasks = store.insert_many(Table::Tasks, records).await;
    logger::log_debug(&format!("[Tasks] Bulk inserted {} tasks", tasks.len()));
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
