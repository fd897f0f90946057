//! 服务层
//!
//! 每个服务只负责一项能力，通过 `UiDriver` 与页面交互，
//! 不持有会话，也不决定流程顺序。

pub mod class_matcher;
pub mod dedup_grouper;
pub mod field_mapping;
pub mod form_service;
pub mod reconciler;
pub mod selection_resolver;

pub use class_matcher::{match_class_option, ClassMatcher, StudentLookup};
pub use dedup_grouper::DedupGrouper;
pub use field_mapping::FieldMappingResolver;
pub use form_service::FormService;
pub use reconciler::{ReconcileReport, Reconciler};
pub use selection_resolver::{SelectionOutcome, SelectionResolver, SelectionTier, NOT_FOUND_LABEL};
