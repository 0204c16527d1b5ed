pub mod error;
pub mod health;
pub mod maintenance;
pub mod session;
pub mod tree;
pub mod visit;

pub use error::CoreError;
pub use health::HealthStatus;
pub use maintenance::{MaintenanceKind, MaintenanceToggleSet, YesNo};
pub use session::{FieldEditSession, SessionState};
pub use tree::{TreeRecord, UpdateTree};
pub use visit::{CreateVisit, TreeVisitRecord};
