use std::collections::HashMap;
use std::future::Future;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use super::task_list::TaskList;
use super::types::{Task, TaskId, TaskResult};

/// Execute one round of tasks concurrently and wait for all of them.
///
/// # Arguments
///
/// * `task_ids` - Tasks selected for this round, already marked running
/// * `list` - Task list snapshot; read-only while the round is in flight
/// * `executor_fn` - Async function executing a single task
///
/// # Returns
///
/// Map of task_id -> TaskResult for every task that was found in `list`
pub async fn execute_round<'a, F, Fut>(
    task_ids: &[TaskId],
    list: &'a TaskList,
    executor_fn: F,
) -> HashMap<TaskId, TaskResult>
where
    F: Fn(&'a Task) -> Fut,
    Fut: Future<Output = TaskResult>,
{
    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

    for id in task_ids {
        let Some(task) = list.get(*id) else {
            tracing::warn!(task_id = id, "selected task vanished from list");
            continue;
        };
        futs.push(executor_fn(task));
    }

    let mut results = HashMap::with_capacity(task_ids.len());
    while let Some(result) = futs.next().await {
        tracing::debug!(task_id = result.task_id, "task finished within round");
        results.insert(result.task_id, result);
    }

    results
}
