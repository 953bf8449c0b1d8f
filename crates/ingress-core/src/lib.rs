pub mod config;
pub mod endpoint;
pub mod engine;
pub mod enumeration;
pub mod errors;
pub mod executor;
pub mod health;
pub mod model;
pub mod naming;
pub mod report;
pub mod schedule;
pub mod session;
pub mod sftp;

pub use config::{parse_batch_sizes, HealthConfig, LoadTestConfig};
pub use endpoint::{Credential, Endpoint};
pub use engine::{EngineObserver, EngineState, LoadTestEngine, NoopObserver};
pub use health::{AlertSink, HealthCheck, HealthMonitor, HealthStatus, NoAlert};
pub use model::{AttemptOutcome, BatchRun, RunSummary, TransferAttempt};
pub use naming::NamingScheme;
pub use report::{ReportOptions, TapReporter, TAP_VERSION};
pub use schedule::{Pause, ThreadPause};
pub use session::{SessionGuard, SessionProvider, TransferSession};
pub use sftp::SftpConnector;
