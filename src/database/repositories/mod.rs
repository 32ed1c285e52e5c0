pub mod activity;
pub mod identity;
pub mod processing;

pub use activity::{ActivityFilter, ActivityRepository};
pub use identity::IdentityRepository;
pub use processing::{ArtifactValidation, ProcessingRepository};
