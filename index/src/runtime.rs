//! Driving async embedders from the blocking manager API.

use std::future::Future;
use std::thread;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::error::Result;

/// Runs `fut` to completion, blocking the caller.
///
/// Inside a multi-threaded tokio runtime the worker is handed over with `block_in_place`.
/// A current-thread runtime cannot give up its only thread, so the future runs on a scoped
/// helper thread with its own runtime. Outside any runtime a current-thread runtime is
/// created for the call.
pub(crate) fn block_on<F>(fut: F) -> Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    match Handle::try_current() {
        Ok(handle) if matches!(handle.runtime_flavor(), RuntimeFlavor::CurrentThread) => {
            thread::scope(|scope| {
                scope
                    .spawn(|| run_on_new_runtime(fut))
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
        }
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(fut))),
        Err(_) => run_on_new_runtime(fut),
    }
}

fn run_on_new_runtime<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(rt.block_on(fut))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_runtime() {
        assert_eq!(block_on(async { 1 + 1 }).unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn inside_multi_thread_runtime() {
        assert_eq!(block_on(async { "nested" }).unwrap(), "nested");
    }

    #[tokio::test]
    async fn inside_current_thread_runtime() {
        let caller = thread::current().id();
        let ran_on = block_on(async { thread::current().id() }).unwrap();
        assert_ne!(ran_on, caller);
    }
}
