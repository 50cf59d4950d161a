pub mod errors;
pub mod pipeline;

pub use errors::{AcquisitionError, ErrorKind};
pub use pipeline::AcquisitionPipeline;
