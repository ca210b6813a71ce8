use crate::collection::SharedCollection;
use crate::handlers;
use crate::models::Completable;
use crate::state::AppState;
use crate::stats::Summarize;
use crate::storage::StorageBackend;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn router<B: StorageBackend>(state: AppState<B>) -> Router {
    Router::new()
        .route("/api/stats", get(handlers::get_dashboard::<B>))
        .with_state(state.clone())
        .merge(completable_routes(state.todos))
        .merge(completable_routes(state.plans))
        .merge(collection_routes(state.exercises))
        .merge(collection_routes(state.developments))
        .merge(completable_routes(state.worships))
        .merge(completable_routes(state.houseworks))
        .merge(collection_routes(state.health_moods))
        .merge(collection_routes(state.reflections))
        .merge(collection_routes(state.finances))
        .merge(collection_routes(state.foods))
}

fn collection_routes<T: Summarize, B: StorageBackend>(collection: SharedCollection<T, B>) -> Router {
    let base = format!("/api/{}", T::COLLECTION);
    Router::new()
        .route(
            &base,
            get(handlers::list_records::<T, B>).post(handlers::create_record::<T, B>),
        )
        .route(
            &format!("{base}/:id"),
            put(handlers::update_record::<T, B>)
                .patch(handlers::patch_record::<T, B>)
                .delete(handlers::delete_record::<T, B>),
        )
        .route(
            &format!("/api/stats/{}", T::COLLECTION),
            get(handlers::collection_stats::<T, B>),
        )
        .with_state(collection)
}

fn completable_routes<T: Summarize + Completable, B: StorageBackend>(
    collection: SharedCollection<T, B>,
) -> Router {
    let toggle = Router::new()
        .route(
            &format!("/api/{}/:id/toggle", T::COLLECTION),
            post(handlers::toggle_record::<T, B>),
        )
        .with_state(collection.clone());
    collection_routes(collection).merge(toggle)
}
