use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use env_param::EnvParam;
use tracing::{info, warn};

use skiros_model::{Result, SkirosError};

/// Scratch directory the compiler writes `domain.pddl`/`p01.pddl` into and the
/// planner is invoked from. Mirrors the original implementation's convention
/// of planning inside a dedicated workspace rather than the process cwd.
static WORKSPACE_DIR: EnvParam<String> = EnvParam::new("SKIROS_WORKSPACE_DIR", "/tmp/skiros_pddl");

pub fn workspace_dir() -> PathBuf {
    PathBuf::from(WORKSPACE_DIR.get_ref().as_str())
}

/// Invokes an external classical planner over a compiled domain/problem pair
/// and returns the raw plan text, or `None` if the problem is infeasible.
///
/// This is the only blocking point on the PDDL pathway: `invoke` waits on a
/// subprocess. [`FakePlannerBinary`] backs tests with no real planner
/// process, the planner-side analogue of `InMemoryWorldModel`.
pub trait PlannerBinary: Send + Sync {
    fn invoke(&self, workspace: &Path, domain: &Path, problem: &Path) -> Result<Option<String>>;
}

/// Shells out to an external planner binary, then scans `workspace` for the
/// plan file it left behind (any entry whose name contains `pddlplan`), reads
/// it, and deletes the planner's byproducts.
pub struct SubprocessPlanner {
    pub program: String,
    pub args: Vec<String>,
}

impl SubprocessPlanner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        SubprocessPlanner { program: program.into(), args }
    }
}

const BYPRODUCTS: &[&str] = &["output", "all.groups", "variables.groups", "output.sas"];

impl PlannerBinary for SubprocessPlanner {
    fn invoke(&self, workspace: &Path, domain: &Path, problem: &Path) -> Result<Option<String>> {
        info!(program = %self.program, workspace = %workspace.display(), "invoking planner");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(domain)
            .arg(problem)
            .current_dir(workspace)
            .status()
            .map_err(|e| SkirosError::RpcFailure(e.to_string()))?;
        if !status.success() {
            warn!(?status, "planner process exited with a non-zero status");
        }

        let plan_path = fs::read_dir(workspace)
            .map_err(|e| SkirosError::RpcFailure(e.to_string()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.contains("pddlplan")));

        let Some(plan_path) = plan_path else {
            warn!("no plan file found in workspace after invoking planner");
            return Ok(None);
        };
        let plan = fs::read_to_string(&plan_path).map_err(|e| SkirosError::RpcFailure(e.to_string()))?;
        let _ = fs::remove_file(&plan_path);
        for byproduct in BYPRODUCTS {
            let _ = fs::remove_file(workspace.join(byproduct));
        }
        Ok(Some(plan))
    }
}

/// Returns `Err(SkirosError::PlannerInfeasible)` when `invoke` found no plan
/// file, `Ok(plan)` otherwise. A thin convenience over the trait for callers
/// that want the infeasible case as an error rather than `None`.
pub fn plan_or_infeasible(
    planner: &dyn PlannerBinary,
    workspace: &Path,
    domain: &Path,
    problem: &Path,
) -> Result<String> {
    planner.invoke(workspace, domain, problem)?.ok_or(SkirosError::PlannerInfeasible)
}

/// In-memory stand-in for a real planner process. Used by tests the way
/// `InMemoryWorldModel` stands in for the ontology store: no subprocess, no
/// filesystem scanning, just a canned answer.
pub struct FakePlannerBinary {
    plan: Option<String>,
}

impl FakePlannerBinary {
    pub fn returning(plan: impl Into<String>) -> Self {
        FakePlannerBinary { plan: Some(plan.into()) }
    }

    pub fn infeasible() -> Self {
        FakePlannerBinary { plan: None }
    }
}

impl PlannerBinary for FakePlannerBinary {
    fn invoke(&self, _workspace: &Path, _domain: &Path, _problem: &Path) -> Result<Option<String>> {
        Ok(self.plan.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_planner_returns_its_canned_plan() {
        let planner = FakePlannerBinary::returning("(moveto b room1 room2)\n");
        let plan = plan_or_infeasible(&planner, Path::new("."), Path::new("domain.pddl"), Path::new("p01.pddl")).unwrap();
        assert_eq!(plan, "(moveto b room1 room2)\n");
    }

    #[test]
    fn infeasible_fake_planner_surfaces_as_the_planner_infeasible_error() {
        let planner = FakePlannerBinary::infeasible();
        let err = plan_or_infeasible(&planner, Path::new("."), Path::new("domain.pddl"), Path::new("p01.pddl")).unwrap_err();
        assert!(matches!(err, SkirosError::PlannerInfeasible));
    }
}
