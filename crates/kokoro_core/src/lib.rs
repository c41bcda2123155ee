pub mod config;
pub mod report;
pub mod state;

pub use config::{BindingConfig, KokoroConfig, MeaningConfig, QuantityConfig, ReleaseConfig};
pub use report::{GoalSystemState, IdentityMonitorState, MetaLearnerState, Prediction};
pub use state::{StateVector, BASELINE};
