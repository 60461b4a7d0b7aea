//! Request validation support.
//!
//! Type-safe request validation using the `validator` crate. Handlers
//! take [`ValidatedJson`] instead of `axum::Json` and receive a body
//! that has already passed its derive-declared rules.
//!
//! ```rust,no_run
//! use tallyward::validation::ValidatedJson;
//! use validator::Validate;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Validate)]
//! struct LoginRequest {
//!     #[validate(email)]
//!     email: String,
//!     #[validate(length(min = 1))]
//!     password: String,
//! }
//!
//! async fn login(
//!     ValidatedJson(req): ValidatedJson<LoginRequest>,
//! ) -> tallyward::Result<axum::Json<serde_json::Value>> {
//!     Ok(axum::Json(serde_json::json!({"status": "ok"})))
//! }
//! ```

mod extractor;

pub use extractor::ValidatedJson;
pub use validator;
