use std::sync::Arc;

use crate::config::Settings;
use crate::fcm::Messenger;
use crate::gateway::NotificationGateway;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub gateway: Arc<NotificationGateway>,
}

impl AppState {
    /// The messenger is created once at startup and shared read-only by all requests.
    pub fn new(settings: Settings, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            settings: Arc::new(settings),
            gateway: Arc::new(NotificationGateway::new(messenger)),
        }
    }
}
