//! REST client for a remote task store.
//!
//! Talks JSON to any server implementing the task store contract described in
//! [`crate::api`]. Non-success responses are decoded from the
//! `{message, errors?}` error body and mapped onto [`TaskError`]:
//!
//! - **404** becomes [`TaskError::NotFound`]
//! - **400 / 422** with field errors becomes [`TaskError::Validation`]
//! - anything else, including transport failures, becomes [`TaskError::Fetch`]
//!
//! Requests are never retried here; the caller decides what to do with a
//! failure.

use super::{ApiErrorResponse, TaskStore, TasksResponse};
use crate::libs::config::ServerConfig;
use crate::libs::error::TaskError;
use crate::libs::task::{NewTask, Task, TaskDetail, TaskPatch};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug)]
pub struct HttpTaskStore {
    client: Client,
    config: ServerConfig,
}

// Servers differ in what `GET /tasks/{id}` returns: the detail envelope or the
// bare task.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetailBody {
    Detail(TaskDetail),
    Bare(Task),
}

/// Maps a failed response onto the matching [`TaskError`].
///
/// `id` is the task the request was about, reported in `NotFound`.
pub fn error_from_response(status: u16, body: &str, id: Option<&str>) -> TaskError {
    let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        parsed.message
    };

    match (status, parsed.errors) {
        (404, _) => TaskError::NotFound(id.map(str::to_string).unwrap_or(message)),
        (400 | 422, Some(errors)) if !errors.is_empty() => TaskError::Validation(errors),
        _ => TaskError::fetch(Some(status), message),
    }
}

impl HttpTaskStore {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
        }
    }

    /// Absolute URL for a path relative to the configured base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, id: Option<&str>) -> Result<Response, TaskError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "task store responded");

        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &body, id))
    }
}

impl TaskStore for HttpTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        let response = self.send(self.request(Method::GET, "tasks"), None).await?;
        Ok(response.json::<TasksResponse>().await?.tasks)
    }

    async fn get_task_detail(&self, id: &str) -> Result<TaskDetail, TaskError> {
        let response = self.send(self.request(Method::GET, &format!("tasks/{}", id)), Some(id)).await?;

        match response.json::<DetailBody>().await? {
            DetailBody::Detail(detail) => Ok(detail),
            DetailBody::Bare(task) => {
                let tasks = self.list_tasks().await?;
                Ok(TaskDetail::from_tasks(&tasks, id).unwrap_or(TaskDetail {
                    task,
                    subtasks: Vec::new(),
                    parent_task: None,
                }))
            }
        }
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, TaskError> {
        let response = self.send(self.request(Method::POST, "tasks").json(new_task), None).await?;
        Ok(response.json::<Task>().await?)
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, TaskError> {
        let builder = self.request(Method::PUT, &format!("tasks/{}", id)).json(patch);
        let response = self.send(builder, Some(id)).await?;
        Ok(response.json::<Task>().await?)
    }

    async fn delete_task(&self, id: &str) -> Result<(), TaskError> {
        self.send(self.request(Method::DELETE, &format!("tasks/{}", id)), Some(id)).await?;
        Ok(())
    }
}
