pub mod apply;
pub mod plan;

pub use apply::{apply, BootstrapReport};
pub use plan::{plan, BootstrapPlan, Step};
