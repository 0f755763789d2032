//! Callable bodies shared by commands, processors and derived producers.

use futures::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::value::{Args, Value};

/// Synchronous body: receives the resolved keyword set by reference.
pub type SyncFn = Rc<dyn Fn(&Args) -> anyhow::Result<Value>>;

/// Asynchronous body: receives an owned keyword set.
pub type AsyncFn = Rc<dyn Fn(Args) -> LocalBoxFuture<'static, anyhow::Result<Value>>>;

/// A sync or async callable producing a [`Value`].
#[derive(Clone)]
pub enum Body {
    Sync(SyncFn),
    Async(AsyncFn),
}

impl Body {
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<R> + 'static,
        R: Into<Value>,
    {
        Body::Sync(Rc::new(move |args| f(args).map(Into::into)))
    }

    pub fn from_async<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
        R: Into<Value>,
    {
        Body::Async(Rc::new(move |args| {
            let fut = f(args);
            async move { fut.await.map(Into::into) }.boxed_local()
        }))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Body::Async(_))
    }

    /// Runs the body, awaiting it when async.
    pub(crate) async fn call(&self, args: Args) -> anyhow::Result<Value> {
        match self {
            Body::Sync(f) => f(&args),
            Body::Async(f) => f(args).await,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Sync(_) => write!(f, "Body::Sync(..)"),
            Body::Async(_) => write!(f, "Body::Async(..)"),
        }
    }
}
