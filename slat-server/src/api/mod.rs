//! HTTP API handlers for slat-server

pub mod annotate;
pub mod assign;
pub mod assignments;
pub mod auth;
pub mod health;
pub mod progress;
pub mod sentences;
pub mod upload;
pub mod users;

pub use annotate::annotate_sentence;
pub use assign::assign_batch;
pub use assignments::user_assignment_detail;
pub use auth::{admin_auth, user_auth};
pub use health::health_routes;
pub use progress::{all_assignments, user_progress};
pub use sentences::assigned_sentences;
pub use upload::upload_csv;
pub use users::list_users;
