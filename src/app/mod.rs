// Application layer - Use case interactors

pub mod batch_interactor;
pub mod container;
pub mod pipeline_interactor;

// Re-export interactors
pub use batch_interactor::{expand_inputs, BatchInteractor};
pub use container::{AppContainer, DefaultAppContainer};
pub use pipeline_interactor::{JobReport, JobRequest, PipelineInteractor};
