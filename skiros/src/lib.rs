//! Facade tying a [`skiros_model::WorldModel`], a [`skiros_ticker::Ticker`]
//! and a [`skiros_pddl::PddlInterface`] together behind the task-submission,
//! skill-description and progress-topic contract. Transport, wire codec and
//! triple-store concerns live outside this crate; it is driven directly by
//! the `skirosd` binary or by an embedding process.

pub mod api;
pub mod config;
pub mod manager;

pub use api::{SkillDescription, SkillInvocation, TaskAction, TaskRequest, TaskResponse};
pub use config::{Cli, Config};
pub use manager::{SkillConstructor, SkillManager};
