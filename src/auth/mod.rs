//! Sign-in: platform strategy, single-flight flow state, error taxonomy.
//!
//! DESIGN
//! ======
//! `PlatformAuthAdapter` is the only entry point screens use. It owns an
//! `AuthFlow` (single-flight + observable phase) and one `SignInStrategy`
//! resolved from `Platform` at construction. `loopback` provides the
//! delegated authorizer used by the native demo.

pub mod adapter;
pub mod delegated;
pub mod error;
pub mod flow;
pub mod loopback;
pub mod platform;

pub use adapter::{PlatformAuthAdapter, SignInStrategy};
pub use delegated::{DelegatedAuthorizer, DelegatedOutcome};
pub use error::AuthError;
pub use flow::{AuthFlowState, FlowPhase};
pub use loopback::LoopbackAuthorizer;
pub use platform::Platform;
