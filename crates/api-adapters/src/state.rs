use services::Services;

pub const DEFAULT_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self { services, body_limit: DEFAULT_BODY_LIMIT }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }
}
