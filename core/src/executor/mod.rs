//! Task execution for one objective run
//!
//! A run turns an objective into a task list, then drives it in rounds:
//! - Readiness filtering in task-list order, capped per round
//! - Concurrent dispatch of a round with a full join before the next one
//! - Per-task user-input suspensions resolved from outside the run
//! - Run-wide cancellation through a single token
//! - Typed run events fanned out to renderers and subscribers
//!
//! # Architecture
//!
//! ```text
//! RunController::start(objective)
//!   ↓
//! TaskCreator::create() → Vec<Task>
//!   ↓
//! TaskList::new() → validate() (warnings only)
//!   ↓
//! TaskLoop::run()
//!   ├─ TaskList::ready().take(max_batch_size)
//!   ├─ mark_running → execute_round(ToolDispatcher::execute)
//!   └─ complete(output, outcome) in list order
//!   ↓
//! RunReport { status, tasks }
//! ```

mod controller;
mod dispatch;
mod engine;
mod events;
mod progress;
mod scheduler;
mod task_list;
pub mod traits;
pub mod types;
mod user_input;

pub use controller::{RunController, RunControllerBuilder};
pub use dispatch::ToolDispatcher;
pub use engine::{LoopExit, TaskLoop};
pub use events::{EventEnvelope, EventHub, RunEvent};
pub use progress::ProgressMonitor;
pub use scheduler::execute_round;
pub use task_list::{TaskList, TaskListIssue};
pub use types::{RunReport, RunStatus, Task, TaskId, TaskOutcome, TaskResult, TaskStatus, Tool};
pub use user_input::UserInputChannel;
