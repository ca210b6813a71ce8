//! Task list backed by the `/api/todos` REST resource.
//!
//! Every mutation goes to the server first and local items only change
//! once the server has answered, except `toggle`, which flips locally
//! right away and then confirms or rolls back.

use crate::errors::TrackerError;
use crate::models::{Priority, Todo, TodoStatus};
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Shared cancellation flag; once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    #[serde(flatten)]
    pub fields: Todo,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoListState {
    pub items: Vec<TodoItem>,
    pub loading: bool,
    pub submitting: bool,
    pub error: Option<String>,
}

/// A completion flip applied locally and awaiting the server's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingToggle {
    id: String,
    previous: bool,
    requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Confirmed(bool),
    RolledBack(bool),
}

impl PendingToggle {
    /// Flips the item in place; `None` when `id` is not in `items`.
    pub fn begin(items: &mut [TodoItem], id: &str) -> Option<Self> {
        let item = items.iter_mut().find(|item| item.id == id)?;
        let previous = item.fields.completed;
        item.fields.completed = !previous;
        Some(Self {
            id: id.to_string(),
            previous,
            requested: !previous,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn requested(&self) -> bool {
        self.requested
    }

    /// The server's value wins; a response without one keeps the request.
    pub fn confirm(self, items: &mut [TodoItem], server_value: Option<bool>) -> ToggleOutcome {
        let completed = server_value.unwrap_or(self.requested);
        self.set(items, completed);
        ToggleOutcome::Confirmed(completed)
    }

    pub fn roll_back(self, items: &mut [TodoItem]) -> ToggleOutcome {
        self.set(items, self.previous);
        ToggleOutcome::RolledBack(self.previous)
    }

    fn set(&self, items: &mut [TodoItem], completed: bool) {
        if let Some(item) = items.iter_mut().find(|item| item.id == self.id) {
            item.fields.completed = completed;
        }
    }
}

/// Server representation; every field is optional and `_id` beats `id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTodo {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    task: Option<String>,
    priority: Option<Priority>,
    status: Option<TodoStatus>,
    category: Option<String>,
    #[serde(default, deserialize_with = "calendar_date")]
    due_date: Option<NaiveDate>,
    completed: Option<bool>,
}

impl WireTodo {
    fn into_item(self, sent: &Todo, known_id: Option<&str>) -> Option<TodoItem> {
        let id = self
            .mongo_id
            .or(self.id)
            .or_else(|| known_id.map(str::to_string))?;
        Some(TodoItem {
            id,
            fields: Todo {
                task: self.task.unwrap_or_else(|| sent.task.clone()),
                priority: self.priority.unwrap_or(sent.priority),
                status: self.status.unwrap_or(sent.status),
                category: self.category.unwrap_or_else(|| sent.category.clone()),
                due_date: self.due_date.or(sent.due_date),
                completed: self.completed.unwrap_or(sent.completed),
            },
        })
    }
}

/// Accepts `YYYY-MM-DD` or a full ISO-8601 timestamp, keeping the date.
fn calendar_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone)]
pub struct RemoteTodoList {
    client: Client,
    base_url: String,
    state: Arc<Mutex<TodoListState>>,
    cancel: CancelToken,
}

impl RemoteTodoList {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            state: Arc::new(Mutex::new(TodoListState::default())),
            cancel: CancelToken::new(),
        }
    }

    pub async fn snapshot(&self) -> TodoListState {
        self.state.lock().await.clone()
    }

    /// Teardown: in-flight requests resolve as `Aborted` and their
    /// responses are never applied.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.error = None;
    }

    pub async fn initialize(&self) -> Result<(), TrackerError> {
        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
        }

        let fetched = async {
            let response = self.send(self.client.get(&self.base_url), "Fetch").await?;
            let wire: Vec<WireTodo> = self.decode(response, "Fetch").await?;
            wire.into_iter()
                .map(|todo| {
                    todo.into_item(&Todo::default(), None)
                        .ok_or_else(|| TrackerError::Network("Fetch failed: todo without an id".into()))
                })
                .collect::<Result<Vec<_>, TrackerError>>()
        }
        .await;

        match fetched.and_then(|items| self.unless_cancelled(items)) {
            Ok(items) => {
                let mut state = self.state.lock().await;
                state.items = items;
                state.loading = false;
                Ok(())
            }
            Err(err) => Err(self.fail(err, |state| state.loading = false).await),
        }
    }

    pub async fn create(&self, draft: Todo) -> Result<TodoItem, TrackerError> {
        let body = Todo {
            completed: false,
            ..normalized(draft)
        };
        self.begin_submit().await;

        let created = async {
            let request = self.client.post(&self.base_url).json(&body);
            let response = self.send(request, "Create").await?;
            let wire: WireTodo = self.decode(response, "Create").await?;
            wire.into_item(&body, None)
                .ok_or_else(|| TrackerError::Network("Create failed: response without an id".into()))
        }
        .await;

        match created.and_then(|item| self.unless_cancelled(item)) {
            Ok(item) => {
                let mut state = self.state.lock().await;
                state.items.push(item.clone());
                state.submitting = false;
                Ok(item)
            }
            Err(err) => Err(self.fail(err, |state| state.submitting = false).await),
        }
    }

    /// Sends the full record; the current completion flag is preserved.
    pub async fn update(&self, id: &str, draft: Todo) -> Result<TodoItem, TrackerError> {
        let completed = {
            let mut state = self.state.lock().await;
            state.submitting = true;
            state.error = None;
            state
                .items
                .iter()
                .find(|item| item.id == id)
                .is_some_and(|item| item.fields.completed)
        };
        let body = Todo {
            completed,
            ..normalized(draft)
        };

        let updated = async {
            let request = self.client.put(self.item_url(id)).json(&body);
            let response = self.send(request, "Update").await?;
            let wire: WireTodo = self.decode(response, "Update").await?;
            wire.into_item(&body, Some(id))
                .ok_or_else(|| TrackerError::Network("Update failed: response without an id".into()))
        }
        .await;

        match updated.and_then(|item| self.unless_cancelled(item)) {
            Ok(item) => {
                let mut state = self.state.lock().await;
                if let Some(slot) = state.items.iter_mut().find(|existing| existing.id == id) {
                    *slot = item.clone();
                }
                state.submitting = false;
                Ok(item)
            }
            Err(err) => Err(self.fail(err, |state| state.submitting = false).await),
        }
    }

    pub async fn remove(&self, id: &str) -> Result<(), TrackerError> {
        let deleted = self.send(self.client.delete(self.item_url(id)), "Delete").await;
        match deleted.and_then(|response| self.unless_cancelled(response)) {
            Ok(_) => {
                let mut state = self.state.lock().await;
                state.items.retain(|item| item.id != id);
                Ok(())
            }
            Err(err) => Err(self.fail(err, |_| {}).await),
        }
    }

    /// Optimistic flip, then confirm with the server's value or roll back.
    /// `Ok(None)` when the id is unknown locally.
    pub async fn toggle(&self, id: &str) -> Result<Option<TodoItem>, TrackerError> {
        let pending = {
            let mut state = self.state.lock().await;
            match PendingToggle::begin(&mut state.items, id) {
                Some(pending) => pending,
                None => return Ok(None),
            }
        };

        let confirmed = async {
            let request = self
                .client
                .patch(self.item_url(pending.id()))
                .json(&serde_json::json!({ "completed": pending.requested() }));
            let response = self.send(request, "Toggle").await?;
            let wire: WireTodo = self.decode(response, "Toggle").await?;
            Ok::<_, TrackerError>(wire.completed)
        }
        .await;

        match confirmed.and_then(|value| self.unless_cancelled(value)) {
            Ok(server_value) => {
                let mut state = self.state.lock().await;
                let outcome = pending.confirm(&mut state.items, server_value);
                debug!(id, ?outcome, "todo toggle settled");
                Ok(state.items.iter().find(|item| item.id == id).cloned())
            }
            Err(err) => {
                // The optimistic flip is undone even after teardown.
                let outcome = pending.roll_back(&mut self.state.lock().await.items);
                debug!(id, ?outcome, "todo toggle settled");
                Err(self.fail(err, |_| {}).await)
            }
        }
    }

    /// A response that lands after teardown is discarded as `Aborted`.
    fn unless_cancelled<T>(&self, value: T) -> Result<T, TrackerError> {
        if self.cancel.is_cancelled() {
            return Err(TrackerError::Aborted);
        }
        Ok(value)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{id}", self.base_url)
    }

    async fn begin_submit(&self) {
        let mut state = self.state.lock().await;
        state.submitting = true;
        state.error = None;
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response, TrackerError> {
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(TrackerError::Aborted),
            sent = request.send() => sent
                .map_err(|err| TrackerError::Network(format!("{action} failed: {err}")))?,
        };
        if !response.status().is_success() {
            return Err(TrackerError::Network(format!(
                "{action} failed: {}",
                response.status()
            )));
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response, action: &str) -> Result<T, TrackerError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TrackerError::Aborted),
            decoded = response.json::<T>() => decoded
                .map_err(|err| TrackerError::Network(format!("{action} failed: {err}"))),
        }
    }

    /// Clears the operation's busy flag and records the error. After
    /// teardown nothing is written and the error becomes `Aborted`.
    async fn fail(&self, err: TrackerError, settle: impl FnOnce(&mut TodoListState)) -> TrackerError {
        if !err.is_user_visible() || self.cancel.is_cancelled() {
            debug!(base_url = %self.base_url, "todo request aborted");
            return TrackerError::Aborted;
        }

        let mut state = self.state.lock().await;
        settle(&mut *state);
        warn!(base_url = %self.base_url, "todo request failed: {err}");
        state.error = Some(err.to_string());
        err
    }
}

fn normalized(draft: Todo) -> Todo {
    Todo {
        task: draft.task.trim().to_string(),
        category: draft.category.trim().to_string(),
        ..draft
    }
}
