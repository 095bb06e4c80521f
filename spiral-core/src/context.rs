//! Ambient container pointer
//!
//! The active container is kept in tokio task-local storage. A task that
//! suspends inside [`ContainerScope::run_async`] gets its own container back
//! when it resumes, whatever other tasks pushed in between. Synchronous code
//! uses [`ContainerScope::run`], which restores the previous value on return
//! or unwind.

use std::future::Future;

use crate::container::Container;

tokio::task_local! {
    static CURRENT: Container;
}

pub struct ContainerScope;

impl ContainerScope {
    /// The container made ambient by the innermost enclosing run, if any
    pub fn current() -> Option<Container> {
        CURRENT.try_with(Container::clone).ok()
    }

    /// Run `f` with `container` as the ambient container
    pub fn run<R>(container: &Container, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(container.clone(), f)
    }

    /// Poll `future` with `container` as the ambient container
    pub async fn run_async<F: Future>(container: Container, future: F) -> F::Output {
        CURRENT.scope(container, future).await
    }

    /// Like [`ContainerScope::run`], skipped when `container` is already ambient
    pub(crate) fn enter<R>(container: &Container, f: impl FnOnce() -> R) -> R {
        let current = CURRENT.try_with(|current| current.same(container));
        if let Ok(true) = current {
            f()
        } else {
            Self::run(container, f)
        }
    }
}
