//! Per-request correlation context.
//!
//! The request id established by the request logger is stored in a Tokio
//! task-local, so any code awaited from within the request future can read
//! it without the id being threaded through function signatures:
//!
//! ```rust,ignore
//! context::run(id, async {
//!     // ... any depth of .await later
//!     assert_eq!(context::current_request_id().as_deref(), Some("abc-123"));
//! })
//! .await;
//! ```
//!
//! The value is keyed to the task-local scope of the future, not to the
//! worker thread polling it, so concurrently handled requests never see each
//! other's id even when they interleave on the same worker.
//!
//! A future handed to `tokio::spawn` leaves the scope and sees no id. Use
//! [`spawn`] to carry the current id into a background task.

use std::future::Future;

use tokio::task::JoinHandle;

/// What the current flow knows about the request it serves.
#[derive(Debug, Clone)]
struct Flow {
    request_id: String,
    /// Request path and query, when the flow serves an HTTP request
    path: Option<String>,
}

tokio::task_local! {
    static FLOW: Flow;
}

/// Run `future` with `request_id` as the current correlation id.
///
/// Nested calls shadow the outer id for the duration of the inner future.
pub async fn run<F>(request_id: String, future: F) -> F::Output
where
    F: Future,
{
    FLOW.scope(
        Flow {
            request_id,
            path: None,
        },
        future,
    )
    .await
}

/// Like [`run`], also recording the path of the request being served.
pub async fn run_request<F>(request_id: String, path: String, future: F) -> F::Output
where
    F: Future,
{
    FLOW.scope(
        Flow {
            request_id,
            path: Some(path),
        },
        future,
    )
    .await
}

/// The correlation id of the current flow, or `None` outside any [`run`].
pub fn current_request_id() -> Option<String> {
    FLOW.try_with(|flow| flow.request_id.clone()).ok()
}

/// The request path of the current flow, if it serves an HTTP request.
pub fn current_path() -> Option<String> {
    FLOW.try_with(|flow| flow.path.clone()).ok().flatten()
}

/// Spawn a task that inherits the caller's flow, if any.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match FLOW.try_with(Clone::clone) {
        Ok(flow) => tokio::spawn(FLOW.scope(flow, future)),
        Err(_) => tokio::spawn(future),
    }
}
