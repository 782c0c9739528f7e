pub mod auth;
pub mod blogs;
pub mod categories;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod password;
pub mod router;
pub mod slug;
pub mod state;
pub mod token;
pub mod uploads;
pub mod users;

pub use config::Config;
pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, AppStateInner};
