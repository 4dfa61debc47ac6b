mod normalize;
mod pipeline;
mod types;

pub use normalize::{DEFAULT_CLOUD, DEFAULT_REGION, normalize};
pub use pipeline::{ScanOutput, ScannedEvent, event_key, parse_line, scan_exports};
pub use types::{
    EventShape, InboundEvent, IngestError, IngestIssue, IngestStats, Result, TelemetryEvent,
    UsagePayload, WorkloadInfo, WorkloadMetrics, WorkloadTimestamps,
};
