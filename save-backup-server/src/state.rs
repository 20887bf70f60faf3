use crate::config::AppConfig;
use crate::models::registry::ConfigStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub config: AppConfig,
    pub store: ConfigStore,
    pub game_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: ConfigStore::new(config.config_file.clone()),
            config,
            game_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lock serialising backups of one game. The registry document itself
    /// is not covered.
    pub async fn get_game_lock(&self, game_name: &str) -> Arc<Mutex<()>> {
        let mut map = self.game_locks.lock().await;
        map.entry(game_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock for `game_name` once nobody holds or waits on it.
    pub async fn release_game_lock(&self, game_name: &str) {
        let mut map = self.game_locks.lock().await;
        if map.get(game_name).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(game_name);
        }
    }
}
