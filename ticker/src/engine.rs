use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use env_param::EnvParam;
use indexmap::IndexMap;
use skiros_bt::{BehaviorTreeNode, ProgressVisitor, State, Visitor};
use skiros_model::WorldModel;
use tracing::{debug, info};

use crate::id_gen::IdGen;
use crate::progress::{changed_entries, ProgressMessage};
use crate::task::Task;

/// Tick cadence, tunable the way the reference planning workspace tunes
/// knobs too narrow to deserve a CLI flag.
static TICK_HZ: EnvParam<u64> = EnvParam::new("SKIROS_TICK_HZ", "25");

type ProgressCallback = dyn Fn(ProgressMessage) + Send + Sync;

struct Registry {
    tasks: IndexMap<i32, Task>,
    preempt_set: HashSet<i32>,
    id_gen: IdGen,
}

struct Inner {
    wm: Arc<dyn WorldModel>,
    robot_name: String,
    registry: Mutex<Registry>,
    progress_cb: Mutex<Option<Box<ProgressCallback>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
}

/// Background tick engine: registers behavior trees as tasks and drives them
/// to completion at a fixed cadence on one worker thread.
///
/// The task registry, id generator and preemption set live behind one
/// mutex, matching the concurrency model's requirement that it never be
/// held across a world-model call or a progress callback: every method here
/// locks only long enough to read or mutate that bookkeeping, then drops the
/// guard before touching `wm` or invoking user code.
pub struct Ticker {
    inner: Arc<Inner>,
}

impl Ticker {
    pub fn new(wm: Arc<dyn WorldModel>, robot_name: impl Into<String>) -> Self {
        Ticker {
            inner: Arc::new(Inner {
                wm,
                robot_name: robot_name.into(),
                registry: Mutex::new(Registry {
                    tasks: IndexMap::new(),
                    preempt_set: HashSet::new(),
                    id_gen: IdGen::new(),
                }),
                progress_cb: Mutex::new(None),
                worker: Mutex::new(None),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Registers `root` as a new task, returning its uid. `desired_uid`
    /// requests a specific uid (used when a caller needs a stable id across
    /// a restart); `None` allocates the next free one.
    pub fn add_task(&self, root: BehaviorTreeNode, desired_uid: Option<i32>) -> skiros_model::Result<i32> {
        let mut registry = self.inner.registry.lock().unwrap();
        let uid = match desired_uid {
            Some(uid) => {
                registry.id_gen.reserve(uid);
                uid
            }
            None => registry.id_gen.alloc()?,
        };
        registry.tasks.insert(uid, Task::new(uid, root));
        info!(uid, "task registered");
        Ok(uid)
    }

    /// Enqueues `uid` for preemption; it exits within one tick.
    pub fn preempt(&self, uid: i32) {
        self.inner.registry.lock().unwrap().preempt_set.insert(uid);
    }

    /// Installs the progress callback, replacing any previous one.
    pub fn observe_progress(&self, cb: impl Fn(ProgressMessage) + Send + Sync + 'static) {
        *self.inner.progress_cb.lock().unwrap() = Some(Box::new(cb));
    }

    /// Idempotent: spawns the tick loop if none is live. Returns `false` if
    /// a loop is already running.
    pub fn start(&self) -> bool {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            return false;
        }
        let inner = Arc::clone(&self.inner);
        let handle = std::thread::spawn(move || run_loop(&inner));
        *self.inner.worker.lock().unwrap() = Some(handle);
        true
    }

    /// Preempts every live task and joins the tick loop.
    pub fn clear(&self) {
        let uids: Vec<i32> = {
            let mut registry = self.inner.registry.lock().unwrap();
            let uids: Vec<i32> = registry.tasks.keys().copied().collect();
            registry.preempt_set.extend(uids.iter().copied());
            uids
        };
        debug!(count = uids.len(), "clearing all tasks");
        if let Some(handle) = self.inner.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    pub fn task_count(&self) -> usize {
        self.inner.registry.lock().unwrap().tasks.len()
    }
}

fn run_loop(inner: &Arc<Inner>) {
    let period = Duration::from_secs_f64(1.0 / TICK_HZ.get() as f64);
    loop {
        let remaining = {
            let registry = inner.registry.lock().unwrap();
            registry.tasks.len()
        };
        if remaining == 0 {
            break;
        }
        tick(inner);
        std::thread::sleep(period);
    }
    inner.running.store(false, Ordering::Release);
}

/// Ascending uid order for one tick, independent of the registry's
/// insertion order (which drifts once a released uid is reallocated and the
/// reinserted task lands at the back of the map).
fn visiting_order(tasks: &IndexMap<i32, Task>) -> Vec<i32> {
    let mut uids: Vec<i32> = tasks.keys().copied().collect();
    uids.sort_unstable();
    uids
}

fn tick(inner: &Arc<Inner>) {
    let uids: Vec<i32> = {
        let registry = inner.registry.lock().unwrap();
        visiting_order(&registry.tasks)
    };
    debug!(count = uids.len(), "tick");

    for uid in uids {
        let mut task = {
            let mut registry = inner.registry.lock().unwrap();
            match registry.tasks.shift_remove(&uid) {
                Some(task) => task,
                None => continue,
            }
        };
        let preempted = inner.registry.lock().unwrap().preempt_set.remove(&uid);
        let msg = if preempted {
            task.visitor.preempt();
            "Preempted."
        } else {
            "Terminated."
        };

        let result = task.visitor.traverse(&mut task.root, inner.wm.as_ref());

        let mut progress = ProgressVisitor::new();
        progress.traverse(&mut task.root, inner.wm.as_ref());
        let snapshot = progress.into_snapshot();
        for event in changed_entries(&task.last_snapshot, &snapshot) {
            emit(
                inner,
                ProgressMessage {
                    robot: inner.robot_name.clone(),
                    task_id: uid,
                    id: event.node_id.clone(),
                    node_type: event.node_type.clone(),
                    label: event.label.clone(),
                    state: event.state,
                    progress_code: event.code,
                    progress_time: event.time,
                    progress_message: event.msg.clone(),
                },
            );
        }
        task.last_snapshot = snapshot;

        if result == State::Running {
            inner.registry.lock().unwrap().tasks.insert(uid, task);
            continue;
        }

        info!(uid, ?result, "task finished");
        emit(
            inner,
            ProgressMessage {
                robot: inner.robot_name.clone(),
                task_id: uid,
                id: uid.to_string(),
                node_type: "Task".to_string(),
                label: String::new(),
                state: result,
                progress_code: 0,
                progress_time: task.start_time.elapsed().as_secs_f32(),
                progress_message: msg.to_string(),
            },
        );
        inner.registry.lock().unwrap().id_gen.release(uid);
    }
}

fn emit(inner: &Inner, message: ProgressMessage) {
    if let Some(cb) = inner.progress_cb.lock().unwrap().as_ref() {
        cb(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiros_model::{InMemoryWorldModel, ParamHandler};

    fn dummy_task(uid: i32) -> Task {
        let root = BehaviorTreeNode::root(ParamHandler::new(), BehaviorTreeNode::skill(skiros_bt::library::wait(0)));
        Task::new(uid, root)
    }

    #[test]
    fn visiting_order_is_ascending_even_after_release_and_realloc_diverges_insertion_order() {
        let mut tasks: IndexMap<i32, Task> = IndexMap::new();
        tasks.insert(0, dummy_task(0));
        tasks.insert(1, dummy_task(1));
        tasks.insert(2, dummy_task(2));

        // Task 1 finishes and releases its uid; a fresh task reallocates it
        // and is reinserted at the back, so insertion order is now 0, 2, 1.
        tasks.shift_remove(&1);
        tasks.insert(1, dummy_task(1));

        let insertion_order: Vec<i32> = tasks.keys().copied().collect();
        assert_eq!(insertion_order, vec![0, 2, 1], "precondition: insertion order has diverged from uid order");

        assert_eq!(visiting_order(&tasks), vec![0, 1, 2]);
    }

    #[test]
    fn add_task_with_a_desired_uid_reserves_it_so_auto_alloc_never_clobbers_it() {
        let wm: Arc<dyn WorldModel> = Arc::new(InMemoryWorldModel::new());
        let ticker = Ticker::new(wm, "robot1");

        let root_a = BehaviorTreeNode::root(ParamHandler::new(), BehaviorTreeNode::skill(skiros_bt::library::wait(1_000)));
        let uid_a = ticker.add_task(root_a, Some(0)).unwrap();

        let root_b = BehaviorTreeNode::root(ParamHandler::new(), BehaviorTreeNode::skill(skiros_bt::library::wait(1_000)));
        let uid_b = ticker.add_task(root_b, None).unwrap();

        assert_ne!(uid_a, uid_b);
        assert_eq!(ticker.task_count(), 2);
    }
}
