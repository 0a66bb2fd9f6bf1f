pub mod completion;
pub mod gateway;
pub mod prompt;

pub use crate::domain::model::{PlanRequest, PlanResponse};
pub use crate::domain::ports::{CompletionRequest, CompletionService};
pub use crate::utils::error::Result;
