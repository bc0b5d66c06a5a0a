//! Batch caller and auth resolution for ActionKit registries.

pub mod caller;
pub mod error;
pub mod resolver;
pub mod result;

pub use caller::{ActionCaller, ActionRequest, CallerConfig, RequestShape, UnknownActionPolicy};
pub use error::{RuntimeError, RuntimeResult};
pub use resolver::{OAuthTokenResolver, StoreAuthResolver, TokenAuthResolver, TokenRefresher};
pub use result::{CallMetadata, CallResult};
