use crate::collection::{LocalCollection, SharedCollection};
use crate::models::{
    Development, Entry, Exercise, Finance, Food, HealthMood, HouseWork, Plan, Reflection, Todo, Worship,
};
use crate::storage::{CollectionStore, FileBackend, StorageBackend};

/// One controller per collection, shared by every request.
#[derive(Clone)]
pub struct AppState<B = FileBackend> {
    pub todos: SharedCollection<Todo, B>,
    pub plans: SharedCollection<Plan, B>,
    pub exercises: SharedCollection<Exercise, B>,
    pub developments: SharedCollection<Development, B>,
    pub worships: SharedCollection<Worship, B>,
    pub houseworks: SharedCollection<HouseWork, B>,
    pub health_moods: SharedCollection<HealthMood, B>,
    pub reflections: SharedCollection<Reflection, B>,
    pub finances: SharedCollection<Finance, B>,
    pub foods: SharedCollection<Food, B>,
}

impl<B: StorageBackend> AppState<B> {
    pub async fn load(backend: B) -> Self {
        let store = CollectionStore::new(backend);
        Self {
            todos: open(&store).await,
            plans: open(&store).await,
            exercises: open(&store).await,
            developments: open(&store).await,
            worships: open(&store).await,
            houseworks: open(&store).await,
            health_moods: open(&store).await,
            reflections: open(&store).await,
            finances: open(&store).await,
            foods: open(&store).await,
        }
    }
}

async fn open<T: Entry, B: StorageBackend>(store: &CollectionStore<B>) -> SharedCollection<T, B> {
    LocalCollection::<T, B>::initialize(store.clone()).await.shared()
}
