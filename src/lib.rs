// uiharness - end-to-end UI test harness core
//
// Boots an application's hosted (foreign-toolkit) event loop on a
// dedicated worker thread and gives test suites bounded, observable
// primitives for driving it: a readiness/shutdown lifecycle, cross-thread
// marshaling, and polling condition waits. The concrete toolkit and the
// application under test stay behind the HostedLoop seam.

pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod loop_host;
pub mod metrics;
pub mod models;
pub mod session;
pub mod wait;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use lifecycle::{LifecycleState, ShutdownOutcome, StartupError, UiThreadLifecycle};
pub use loop_host::{BridgeError, HostedLoop, LoopWaker, WorkerBridge};
pub use metrics::HarnessMetrics;
pub use models::{HarnessSettings, ProfileRotation, SignatureProfile};
pub use session::TestSession;
pub use wait::{ConditionWaiter, WaitError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
