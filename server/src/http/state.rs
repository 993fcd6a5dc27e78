use crate::providers::CarrierProvider;
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CarrierProvider>,
    pub start_time: SystemTime,
}
