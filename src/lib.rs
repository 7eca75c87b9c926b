//! An expiring paste service: text blobs behind short random ids, limited by
//! time-to-live, view count, or both.

pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub mod models {
    pub mod paste;
}

pub mod repositories {
    pub mod memory;
    pub mod paste_store;
    pub mod postgres;
    pub mod redis;
}

pub mod services {
    pub mod expiry;
    pub mod ids;
    pub mod pastes;
}

pub mod handlers {
    pub mod pastes;
}

pub mod middleware_layer {
    pub mod request_time;
}

pub mod validation {
    pub mod paste;
}

pub use config::Config;
pub use error::{AppError, StoreError, Unavailable};
pub use state::AppState;
