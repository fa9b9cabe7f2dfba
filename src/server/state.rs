use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::delivery::DeliveryStrategy;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub delivery: Arc<dyn DeliveryStrategy>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, delivery: Arc<dyn DeliveryStrategy>) -> Self {
        Self {
            settings: Arc::new(settings),
            delivery,
            start_time: Instant::now(),
        }
    }
}
