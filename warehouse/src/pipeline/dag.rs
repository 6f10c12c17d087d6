//! A small dependency graph of named tasks, run layer by layer.

use common::{Error, Result};
use etl::utils::retry::retry_with_fixed_delay;
use futures::future::{BoxFuture, FutureExt, join_all};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

type TaskFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub name: String,
    pub status: TaskStatus,
    pub attempts: u32,
    pub duration: Duration,
}

/// Outcomes recorded so far, in completion order. Tasks may read it while
/// the graph runs; only earlier layers are visible.
pub type RunJournal = Arc<Mutex<Vec<TaskOutcome>>>;

struct Task {
    name: String,
    depends_on: Vec<String>,
    run: TaskFn,
}

pub struct TaskGraph {
    tasks: Vec<Task>,
    policy: RetryPolicy,
    journal: RunJournal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRun {
    pub outcomes: Vec<TaskOutcome>,
}

impl GraphRun {
    pub fn succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| outcome.status == TaskStatus::Succeeded)
    }

    pub fn outcome(&self, name: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }

    /// Why the run did not succeed: the first task that failed after its
    /// retries, else the first skipped one.
    pub fn first_failure(&self) -> Option<Error> {
        self.outcomes
            .iter()
            .find_map(|outcome| match &outcome.status {
                TaskStatus::Failed(message) => Some(Error::StageFailed {
                    stage: outcome.name.clone(),
                    message: message.clone(),
                }),
                _ => None,
            })
            .or_else(|| {
                self.outcomes
                    .iter()
                    .find(|outcome| outcome.status == TaskStatus::Skipped)
                    .map(|outcome| Error::StageSkipped(outcome.name.clone()))
            })
    }
}

impl TaskGraph {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            tasks: Vec::new(),
            policy,
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn journal(&self) -> RunJournal {
        Arc::clone(&self.journal)
    }

    pub fn add_task<F, Fut>(&mut self, name: &str, depends_on: &[&str], run: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.push(Task {
            name: name.to_string(),
            depends_on: depends_on.iter().map(|dep| dep.to_string()).collect(),
            run: Arc::new(move || run().boxed()),
        });
        self
    }

    /// Groups task indices into layers whose dependencies all live in
    /// earlier layers. Rejects duplicate names, unknown dependencies and
    /// cycles.
    pub fn layers(&self) -> Result<Vec<Vec<usize>>> {
        let mut index_of = HashMap::new();
        for (index, task) in self.tasks.iter().enumerate() {
            if index_of.insert(task.name.as_str(), index).is_some() {
                return Err(Error::InvalidInput(format!(
                    "Task '{}' is declared twice",
                    task.name
                )));
            }
        }

        let mut pending: Vec<usize> = vec![0; self.tasks.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.tasks.len()];
        for (index, task) in self.tasks.iter().enumerate() {
            for dep in &task.depends_on {
                let dep_index = *index_of.get(dep.as_str()).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "Task '{}' depends on unknown task '{}'",
                        task.name, dep
                    ))
                })?;
                pending[index] += 1;
                dependents[dep_index].push(index);
            }
        }

        let mut layers = Vec::new();
        let mut ready: Vec<usize> = (0..self.tasks.len())
            .filter(|index| pending[*index] == 0)
            .collect();
        let mut placed = 0;

        while !ready.is_empty() {
            placed += ready.len();
            let mut next = Vec::new();
            for index in &ready {
                for dependent in &dependents[*index] {
                    pending[*dependent] -= 1;
                    if pending[*dependent] == 0 {
                        next.push(*dependent);
                    }
                }
            }
            next.sort_unstable();
            layers.push(ready);
            ready = next;
        }

        if placed != self.tasks.len() {
            let stuck: Vec<&str> = (0..self.tasks.len())
                .filter(|index| pending[*index] > 0)
                .map(|index| self.tasks[index].name.as_str())
                .collect();
            return Err(Error::InvalidInput(format!(
                "Task graph has a cycle through {:?}",
                stuck
            )));
        }

        Ok(layers)
    }

    /// Runs every layer concurrently. A task whose dependencies did not all
    /// succeed is skipped.
    pub async fn run(&self) -> Result<GraphRun> {
        let layers = self.layers()?;
        let mut succeeded: HashSet<&str> = HashSet::new();

        for (depth, layer) in layers.iter().enumerate() {
            let (runnable, blocked): (Vec<usize>, Vec<usize>) =
                layer.iter().copied().partition(|index| {
                    self.tasks[*index]
                        .depends_on
                        .iter()
                        .all(|dep| succeeded.contains(dep.as_str()))
                });

            for index in blocked {
                let task = &self.tasks[index];
                warn!(task = %task.name, "Skipping task, an upstream task did not succeed");
                self.record(TaskOutcome {
                    name: task.name.clone(),
                    status: TaskStatus::Skipped,
                    attempts: 0,
                    duration: Duration::ZERO,
                })
                .await;
            }

            info!(
                layer = depth,
                tasks = ?runnable.iter().map(|i| self.tasks[*i].name.as_str()).collect::<Vec<_>>(),
                "Running task layer"
            );

            let runs = runnable.iter().map(|index| self.run_task(&self.tasks[*index]));
            let outcomes = join_all(runs).await;
            for (index, outcome) in runnable.iter().zip(outcomes) {
                if outcome.status == TaskStatus::Succeeded {
                    succeeded.insert(self.tasks[*index].name.as_str());
                }
                self.record(outcome).await;
            }
        }

        let outcomes = self.journal.lock().await.clone();
        Ok(GraphRun { outcomes })
    }

    async fn run_task(&self, task: &Task) -> TaskOutcome {
        let started = Instant::now();
        let attempted = retry_with_fixed_delay(
            &task.name,
            self.policy.max_retries,
            self.policy.delay,
            || (task.run)(),
        )
        .await;
        let duration = started.elapsed();

        let status = match attempted.result {
            Ok(()) => {
                info!(
                    task = %task.name,
                    attempts = attempted.attempts,
                    elapsed_ms = duration.as_millis() as u64,
                    "Task succeeded"
                );
                TaskStatus::Succeeded
            }
            Err(e) => {
                error!(
                    task = %task.name,
                    attempts = attempted.attempts,
                    error = %e,
                    "Task failed"
                );
                TaskStatus::Failed(e.to_string())
            }
        };

        TaskOutcome {
            name: task.name.clone(),
            status,
            attempts: attempted.attempts,
            duration,
        }
    }

    async fn record(&self, outcome: TaskOutcome) {
        self.journal.lock().await.push(outcome);
    }
}
