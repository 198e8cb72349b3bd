//! Email/password accounts with HS256 session tokens.

pub mod error;
pub mod handlers;
pub mod password;
pub mod router;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use handlers::{AuthResponse, AuthState, Credentials, MeResponse, PublicUser};
pub use router::{create_router, serve};
pub use store::{InMemoryUserStore, StoreError, UserRecord, UserStore};
pub use token::{Claims, TokenError, TokenSigner};
