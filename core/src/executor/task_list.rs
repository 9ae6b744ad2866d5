use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExecutorError;
use crate::executor::types::{Task, TaskId, TaskOutcome, TaskStatus};

/// Ordered collection of every task in a run.
///
/// Insertion order is creation order and drives dispatch order. On duplicate
/// ids the first task wins; later ones are dropped and reported by `validate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Task>", into = "Vec<Task>")]
pub struct TaskList {
    tasks: Vec<Task>,
    #[serde(skip)]
    index: HashMap<TaskId, usize>,
    #[serde(skip)]
    duplicates: Vec<TaskId>,
}

impl From<Vec<Task>> for TaskList {
    fn from(tasks: Vec<Task>) -> Self {
        Self::new(tasks)
    }
}

impl From<TaskList> for Vec<Task> {
    fn from(list: TaskList) -> Self {
        list.tasks
    }
}

/// Structural problem found by [`TaskList::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListIssue {
    DuplicateId(TaskId),
    DanglingDependency { task_id: TaskId, missing: TaskId },
    SelfDependency(TaskId),
    Cycle(Vec<TaskId>),
}

impl fmt::Display for TaskListIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate task id {id}"),
            Self::DanglingDependency { task_id, missing } => {
                write!(f, "task {task_id} depends on unknown task {missing}")
            }
            Self::SelfDependency(id) => write!(f, "task {id} depends on itself"),
            Self::Cycle(path) => {
                let path: Vec<String> = path.iter().map(|id| id.to_string()).collect();
                write!(f, "circular dependency: {}", path.join(" -> "))
            }
        }
    }
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut index = HashMap::with_capacity(tasks.len());
        let mut kept = Vec::with_capacity(tasks.len());
        let mut duplicates = Vec::new();
        for task in tasks {
            if index.contains_key(&task.id) {
                tracing::warn!(task_id = task.id, "dropping task with duplicate id");
                duplicates.push(task.id);
                continue;
            }
            index.insert(task.id, kept.len());
            kept.push(task);
        }
        Self {
            tasks: kept,
            index,
            duplicates,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.index.get(&id).map(|&pos| &self.tasks[pos])
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut Task, ExecutorError> {
        let pos = *self.index.get(&id).ok_or(ExecutorError::TaskNotFound(id))?;
        Ok(&mut self.tasks[pos])
    }

    pub fn has_incomplete(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| t.status == TaskStatus::Incomplete)
    }

    pub fn count_by_status(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    pub fn running_ids(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .map(|t| t.id)
            .collect()
    }

    pub fn incomplete_ids(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Incomplete)
            .map(|t| t.id)
            .collect()
    }

    /// A dependency counts as satisfied only if it exists and is complete.
    pub fn is_ready(&self, task: &Task) -> bool {
        task.status == TaskStatus::Incomplete
            && task
                .dependent_task_ids
                .iter()
                .all(|dep| self.get(*dep).map(Task::is_complete).unwrap_or(false))
    }

    /// Tasks eligible to run now, in list order. Callers apply the batch cap.
    pub fn ready(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| self.is_ready(t)).collect()
    }

    pub fn mark_running(&mut self, id: TaskId) -> Result<(), ExecutorError> {
        let task = self.get_mut(id)?;
        if task.status != TaskStatus::Incomplete {
            return Err(ExecutorError::InvalidTransition {
                task_id: id,
                from: task.status,
                to: TaskStatus::Running,
            });
        }
        task.status = TaskStatus::Running;
        Ok(())
    }

    /// Record a finished execution. Output is immutable once set.
    pub fn complete(
        &mut self,
        id: TaskId,
        output: String,
        outcome: TaskOutcome,
    ) -> Result<(), ExecutorError> {
        let task = self.get_mut(id)?;
        if task.status != TaskStatus::Running {
            return Err(ExecutorError::InvalidTransition {
                task_id: id,
                from: task.status,
                to: TaskStatus::Complete,
            });
        }
        task.status = TaskStatus::Complete;
        task.output = Some(output);
        task.outcome = Some(outcome);
        Ok(())
    }

    /// Concatenate `"<description>: <output>\n"` for each existing dependency,
    /// in dependency order, capped at `limit` characters.
    pub fn dependency_context(&self, task: &Task, limit: usize) -> String {
        let mut context = String::new();
        for dep in task.dependent_task_ids.iter().filter_map(|id| self.get(*id)) {
            context.push_str(&dep.description);
            context.push_str(": ");
            context.push_str(dep.output.as_deref().unwrap_or_default());
            context.push('\n');
        }
        truncate_chars(context, limit)
    }

    /// Report structural problems without rejecting the list.
    pub fn validate(&self) -> Vec<TaskListIssue> {
        let mut issues = Vec::new();

        issues.extend(self.duplicates.iter().copied().map(TaskListIssue::DuplicateId));

        for task in &self.tasks {
            for dep in &task.dependent_task_ids {
                if *dep == task.id {
                    issues.push(TaskListIssue::SelfDependency(task.id));
                } else if !self.index.contains_key(dep) {
                    issues.push(TaskListIssue::DanglingDependency {
                        task_id: task.id,
                        missing: *dep,
                    });
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            issues.push(TaskListIssue::Cycle(cycle));
        }

        issues
    }

    /// Detect circular dependencies using DFS
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    fn detect_cycle(&self) -> Option<Vec<TaskId>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task in &self.tasks {
            if !visited.contains(&task.id) && self.dfs_cycle(task.id, &mut visited, &mut stack) {
                return Some(stack);
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: TaskId,
        visited: &mut HashSet<TaskId>,
        stack: &mut Vec<TaskId>,
    ) -> bool {
        visited.insert(node);
        stack.push(node);

        if let Some(task) = self.get(node) {
            for &dep in &task.dependent_task_ids {
                // Self-dependencies are reported separately
                if dep == node {
                    continue;
                }

                // Check if dependency is in current path (cycle detected)
                if let Some(pos) = stack.iter().position(|x| *x == dep) {
                    stack.push(dep);
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(&dep)
                    && self.index.contains_key(&dep)
                    && self.dfs_cycle(dep, visited, stack)
                {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

fn truncate_chars(mut s: String, limit: usize) -> String {
    if let Some((cut, _)) = s.char_indices().nth(limit) {
        s.truncate(cut);
    }
    s
}
