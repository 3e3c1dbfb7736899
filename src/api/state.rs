use std::sync::Arc;
use crate::config::Settings;
use crate::store::SeriesStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SeriesStore>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(store: Arc<SeriesStore>, settings: Settings) -> Self {
        Self { store, settings }
    }
}
