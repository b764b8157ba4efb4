//! Insight engine: API client, timers, and effect execution for the analysis
//! orchestrator.
mod api;
mod debounce;
mod entitlement;
mod poller;
mod session;
mod wire;

pub use api::{
    ApiClient, ApiError, ApiSettings, ReqwestApiClient, StaticTokenProvider, StatusReport,
    TokenError, TokenProvider,
};
pub use debounce::Debouncer;
pub use entitlement::{EntitlementFlag, EntitlementSource};
pub use poller::PollTask;
pub use session::SessionHandle;
