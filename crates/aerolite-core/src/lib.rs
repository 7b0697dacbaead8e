// aerolite-core: Polling and shaping layer between aerolite-api and consumers.

pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod entity;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_SCAN_INTERVAL, PollerConfig};
pub use coordinator::{Coordinator, CycleStatus};
pub use diagnostics::{DiagnosticsReport, entry_diagnostics};
pub use entity::{SensorClass, SensorEntity, project_entities};
pub use error::CoreError;
pub use registry::{AccountEntry, CloudCoordinator, Registry};
pub use snapshot::{CycleSnapshot, DeviceSnapshot, MetricValue, shape_cycle};
pub use source::{ReadingsSource, TokenProvider};
