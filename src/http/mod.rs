//! HTTP surface: shared state, routes, responses and the server loop.
//!
//! ```rust,ignore
//! use tallyward::config::ConfigBuilder;
//! use tallyward::http::{AppState, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tallyward::init_tracing();
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     let app = AppState::in_memory(&config);
//!     serve(config, app.state).await?;
//!     Ok(())
//! }
//! ```

mod response;
mod routes;
mod server;
mod state;

pub use response::{Attachment, CreatedResponse, JsonResponse};
pub use routes::{SIGNATURE_HEADER, build_router};
pub use server::serve;
pub use state::{AppState, AppStateBuilder, InMemoryApp};
