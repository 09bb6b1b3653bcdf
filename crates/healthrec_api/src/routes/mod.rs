// HTTP routes
pub mod clients;
pub mod enrollments;
pub mod health;
pub mod programs;

pub use clients::*;
pub use enrollments::*;
pub use health::*;
pub use programs::*;
