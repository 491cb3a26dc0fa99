//! The background tick engine: a task registry ticked at a fixed cadence,
//! diffing each task's [`skiros_bt::ProgressSnapshot`] every round and
//! publishing only what changed.

pub mod engine;
pub mod id_gen;
pub mod progress;
pub mod task;

pub use engine::Ticker;
pub use id_gen::IdGen;
pub use progress::ProgressMessage;
pub use task::Task;
