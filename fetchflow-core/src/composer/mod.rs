pub mod factory;
pub mod runner;

pub use self::factory::FlowFactory;
pub use self::runner::{
    CachePolicy, FlowRunner, Freshness, Origin, Retrieval, Stage, StageOutcome, StageReport,
};
