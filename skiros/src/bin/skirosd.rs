//! Transport-free front end: loads a small demonstration skill library,
//! submits one task, and prints progress-topic messages to stdout as they
//! arrive. Stands in for the RPC/pub-sub transport this crate deliberately
//! leaves out of scope.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use skiros::{Cli, Config, SkillManager, TaskAction, TaskRequest};
use skiros_bt::library::wait;
use skiros_model::{InMemoryWorldModel, ParamHandler, WorldModel};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::layered(&cli);

    let filter = if config.verbose { EnvFilter::new("debug") } else { EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")) };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let wm: Arc<dyn WorldModel> = Arc::new(InMemoryWorldModel::new());
    let manager = SkillManager::new(wm, config.robot_name.clone());
    manager.observe_progress(|message| {
        if let Ok(line) = serde_json::to_string(&message) {
            println!("{line}");
        }
    });
    manager.register_skill("skiros:Wait", "Wait", ParamHandler::new(), Box::new(|_params| wait(5)));

    let response = manager.submit(TaskRequest { action: TaskAction::Start, execution_id: -1, skills: Vec::new() });
    println!("empty task -> ok={} task_id={}", response.ok, response.task_id);

    let response = manager.submit(TaskRequest {
        action: TaskAction::Start,
        execution_id: -1,
        skills: vec![skiros::SkillInvocation { type_iri: "skiros:Wait".to_string(), name: "Wait".to_string(), params: Default::default() }],
    });
    println!("wait task -> ok={} task_id={}", response.ok, response.task_id);

    while manager.ticker().task_count() > 0 {
        std::thread::sleep(Duration::from_millis(20));
    }
    manager.ticker().clear();
    Ok(())
}
