pub mod claims;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod storage;
pub mod token;

pub use claims::Claims;
pub use error::AuthError;
pub use extractors::{CurrentCaller, OptionalCaller};
pub use middleware::require_identity;
pub use password::{PasswordConfig, PasswordHasher};
pub use resolver::IdentityResolver;
pub use storage::{InMemoryUserStore, User, UserStore};
pub use token::{BearerToken, IssuedToken, TokenIssuer, TokenVerifier};
