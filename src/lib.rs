pub mod app;
pub mod collection;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use collection::{LocalCollection, SharedCollection};
pub use config::AppConfig;
pub use errors::{AppError, TrackerError};
pub use remote::{CancelToken, RemoteTodoList, TodoItem, TodoListState};
pub use state::AppState;
pub use storage::{CollectionStore, FileBackend, MemoryBackend, StorageBackend};
