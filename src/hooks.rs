//! Typed registry of build observers.
//!
//! Hooks are registered on the service and invoked in registration order at
//! fixed points of a build cycle. This replaces name-based dynamic dispatch
//! with checked interface dispatch.

use crate::model::types::Entity;
use crate::service::BuildReport;

/// Observer of build-cycle hook points. All methods default to no-ops so
/// implementors pick the points they care about.
pub trait BuildHook {
    /// An entity was encoded and upserted.
    fn entity_encoded(&mut self, _entity: &Entity) {}
    /// An entity was skipped (de-duplication rule).
    fn entity_skipped(&mut self, _entity: &Entity) {}
    /// The build cycle committed.
    fn build_finished(&mut self, _report: &BuildReport) {}
}
