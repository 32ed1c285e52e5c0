pub mod coordinator;
pub mod enrichment;
pub mod extraction;
pub mod publishing;
pub mod spool;

pub use coordinator::Coordinator;
pub use enrichment::Enricher;
pub use extraction::Extractor;
pub use publishing::Publisher;
pub use spool::UploadSpool;
