pub mod source;
pub mod auth;
pub mod mock;

pub use auth::{AccessToken, AuthenticatedSource, FlightApi, RetryPolicy, TokenCache};
pub use mock::MockFlightSource;
pub use source::{FlightSource, SourceError, SourceResult};
