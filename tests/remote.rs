mod common;

use axum::{
    Json, Router,
    routing::{get, patch},
};
use chrono::NaiveDate;
use common::{pick_free_port, spawn_server};
use life_tracker::models::{Priority, Todo, TodoStatus};
use life_tracker::{RemoteTodoList, TrackerError};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn draft(task: &str) -> Todo {
    Todo {
        task: task.to_string(),
        priority: Priority::High,
        status: TodoStatus::Planned,
        category: "Work".to_string(),
        due_date: NaiveDate::from_ymd_opt(2024, 1, 31),
        completed: false,
    }
}

#[tokio::test]
async fn remote_todos_round_trip_through_server() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server().await;
    let todos = RemoteTodoList::new(server.url("/api/todos"));

    todos.initialize().await.unwrap();
    let state = todos.snapshot().await;
    assert!(state.items.is_empty());
    assert!(!state.loading);

    let created = todos.create(draft("  Write report  ")).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.fields.task, "Write report");
    assert_eq!(created.fields.due_date, NaiveDate::from_ymd_opt(2024, 1, 31));

    let toggled = todos.toggle(&created.id).await.unwrap().unwrap();
    assert!(toggled.fields.completed);

    let updated = todos
        .update(
            &created.id,
            Todo {
                status: TodoStatus::InProgress,
                ..draft("Write final report")
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.fields.status, TodoStatus::InProgress);
    assert!(updated.fields.completed);

    let stored: Value = Client::new()
        .get(server.url("/api/todos"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored[0]["id"], created.id.as_str());
    assert_eq!(stored[0]["task"], "Write final report");
    assert_eq!(stored[0]["completed"], true);

    let reloaded = RemoteTodoList::new(server.url("/api/todos"));
    reloaded.initialize().await.unwrap();
    assert_eq!(reloaded.snapshot().await.items, todos.snapshot().await.items);

    todos.remove(&created.id).await.unwrap();
    assert!(todos.snapshot().await.items.is_empty());
    let state = todos.snapshot().await;
    assert!(state.error.is_none());
}

#[tokio::test]
async fn remote_create_failure_leaves_items_unchanged() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server().await;
    let todos = RemoteTodoList::new(server.url("/api/todos"));
    todos.initialize().await.unwrap();
    todos.create(draft("Existing")).await.unwrap();
    let before = todos.snapshot().await.items;

    drop(server);
    let err = todos.create(draft("Never stored")).await.unwrap_err();
    assert!(matches!(err, TrackerError::Network(_)));

    let state = todos.snapshot().await;
    assert_eq!(state.items, before);
    assert!(!state.submitting);
    assert!(state.error.as_deref().is_some_and(|msg| msg.starts_with("Create failed")));

    todos.dismiss_error().await;
    assert!(todos.snapshot().await.error.is_none());
}

#[tokio::test]
async fn remote_toggle_failure_rolls_back() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server().await;
    let todos = RemoteTodoList::new(server.url("/api/todos"));
    todos.initialize().await.unwrap();
    let created = todos.create(draft("Flaky")).await.unwrap();

    drop(server);
    let err = todos.toggle(&created.id).await.unwrap_err();
    assert!(matches!(err, TrackerError::Network(_)));

    let state = todos.snapshot().await;
    assert!(!state.items[0].fields.completed);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn remote_non_success_status_is_a_network_error() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server().await;
    let todos = RemoteTodoList::new(server.url("/api/todos"));
    todos.initialize().await.unwrap();

    let err = todos.update("missing", draft("Ghost")).await.unwrap_err();
    match err {
        TrackerError::Network(message) => assert!(message.contains("404")),
        other => panic!("unexpected error: {other}"),
    }
    let state = todos.snapshot().await;
    assert!(state.items.is_empty());
    assert!(!state.submitting);
}

#[tokio::test]
async fn remote_initialize_failure_keeps_last_known_items() {
    let port = pick_free_port();
    let todos = RemoteTodoList::new(format!("http://127.0.0.1:{port}/api/todos"));

    let err = todos.initialize().await.unwrap_err();
    assert!(matches!(err, TrackerError::Network(_)));

    let state = todos.snapshot().await;
    assert!(state.items.is_empty());
    assert!(!state.loading);
    assert!(state.error.as_deref().is_some_and(|msg| msg.starts_with("Fetch failed")));
}

#[tokio::test]
async fn remote_cancel_suppresses_in_flight_fetch() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let todos = RemoteTodoList::new(format!("http://{addr}/api/todos"));
    let in_flight = {
        let todos = todos.clone();
        tokio::spawn(async move { todos.initialize().await })
    };

    for _ in 0..50 {
        if todos.snapshot().await.loading {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(todos.snapshot().await.loading);

    todos.cancel();
    let result = in_flight.await.unwrap();
    assert!(matches!(result, Err(TrackerError::Aborted)));

    let state = todos.snapshot().await;
    assert!(state.error.is_none());
    assert!(state.items.is_empty());
    assert!(state.loading);
}

#[tokio::test]
async fn remote_cancel_rolls_back_in_flight_toggle() {
    let stub = Router::new()
        .route(
            "/api/todos",
            get(|| async { Json(json!([{ "_id": "a1", "task": "Stretch", "completed": false }])) }),
        )
        .route(
            "/api/todos/:id",
            patch(|| std::future::pending::<Json<Value>>()),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, stub).await.unwrap() });

    let todos = RemoteTodoList::new(format!("http://{addr}/api/todos"));
    todos.initialize().await.unwrap();
    assert!(!todos.snapshot().await.items[0].fields.completed);

    let in_flight = {
        let todos = todos.clone();
        tokio::spawn(async move { todos.toggle("a1").await })
    };

    for _ in 0..50 {
        if todos.snapshot().await.items[0].fields.completed {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(todos.snapshot().await.items[0].fields.completed);

    todos.cancel();
    let result = in_flight.await.unwrap();
    assert!(matches!(result, Err(TrackerError::Aborted)));

    let state = todos.snapshot().await;
    assert!(!state.items[0].fields.completed);
    assert!(state.error.is_none());
}
