use std::sync::Arc;

use crate::services::DashboardService;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
}
