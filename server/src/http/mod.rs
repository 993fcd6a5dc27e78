pub mod errors;
pub mod models;
pub mod routes;
pub mod state;

pub use errors::ApiError;
pub use models::*;
pub use routes::create_router;
pub use state::AppState;
