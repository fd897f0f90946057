pub mod correlation;
pub mod field_map;
pub mod run_counters;
pub mod work_item;

pub use correlation::CorrelationHandle;
pub use field_map::{FieldMap, FieldMapTier};
pub use run_counters::{MatchResult, RunCounters};
pub use work_item::{ClassGroup, DedupIndex, GroupedWork, WorkItem};
