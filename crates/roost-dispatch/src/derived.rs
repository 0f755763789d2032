//! Derived parameters.
//!
//! A [`Derived`] node computes one value from other parameters: leaf option
//! descriptors and further derived nodes. Commands declare derived nodes next
//! to their plain options; the dispatcher resolves the whole graph before the
//! body runs and passes only the final value under the binding name.
//!
//! ```rust
//! use roost_dispatch::{Command, Derived, Opt};
//!
//! let pg_url = Derived::new("pg_url", |args| {
//!     let host: String = args.get("pg_host")?;
//!     let port: i64 = args.get("pg_port")?;
//!     Ok(format!("postgresql://{}:{}", host, port))
//! })
//! .option(Opt::keyword(["--pg-host"]).default("localhost"))
//! .option(Opt::keyword(["--pg-port"]).ty(roost_dispatch::ArgType::Int).default(5432))
//! .build();
//!
//! let command = Command::new("migrate", |args| {
//!     let url: String = args.get("url")?;
//!     Ok(url)
//! })
//! .derived("url", pg_url);
//! # let _ = command;
//! ```
//!
//! Nodes are shared by cloning the handle. A node reachable along several
//! paths is still evaluated once per dispatch.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::body::Body;
use crate::option::Opt;
use crate::value::{Args, Value};

/// One entry of a parameter list.
#[derive(Clone, Debug)]
pub enum Param {
    /// A leaf descriptor, bound under its logical name.
    Opt(Rc<Opt>),
    /// A derived node, bound under `name`.
    Derived { name: String, node: Derived },
}

impl Param {
    /// The keyword this entry is passed under.
    pub fn name(&self) -> &str {
        match self {
            Param::Opt(opt) => opt.name(),
            Param::Derived { name, .. } => name,
        }
    }
}

struct DerivedInner {
    label: String,
    params: Vec<Param>,
    body: Body,
}

/// A shared handle to a derived parameter node.
#[derive(Clone)]
pub struct Derived {
    inner: Rc<DerivedInner>,
}

impl Derived {
    /// Starts a node with a synchronous producer.
    pub fn new<F, R>(label: impl Into<String>, f: F) -> DerivedBuilder
    where
        F: Fn(&Args) -> anyhow::Result<R> + 'static,
        R: Into<Value>,
    {
        DerivedBuilder::new(label.into(), Body::sync(f))
    }

    /// Starts a node with an asynchronous producer.
    pub fn new_async<F, Fut, R>(label: impl Into<String>, f: F) -> DerivedBuilder
    where
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
        R: Into<Value>,
    {
        DerivedBuilder::new(label.into(), Body::from_async(f))
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn params(&self) -> &[Param] {
        &self.inner.params
    }

    pub fn is_async(&self) -> bool {
        self.inner.body.is_async()
    }

    pub fn ptr_eq(&self, other: &Derived) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    pub(crate) fn body(&self) -> &Body {
        &self.inner.body
    }
}

impl fmt::Debug for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("label", &self.inner.label)
            .field("params", &self.inner.params)
            .field("async", &self.is_async())
            .finish()
    }
}

/// Collects the parameters of a [`Derived`] node.
pub struct DerivedBuilder {
    label: String,
    params: Vec<Param>,
    body: Body,
}

impl DerivedBuilder {
    fn new(label: String, body: Body) -> Self {
        Self {
            label,
            params: Vec::new(),
            body,
        }
    }

    pub fn option(mut self, opt: Opt) -> Self {
        self.params.push(Param::Opt(Rc::new(opt)));
        self
    }

    /// Adds a descriptor shared with other nodes or commands.
    pub fn shared_option(mut self, opt: Rc<Opt>) -> Self {
        self.params.push(Param::Opt(opt));
        self
    }

    pub fn derived(mut self, name: impl Into<String>, node: impl Into<Derived>) -> Self {
        self.params.push(Param::Derived {
            name: name.into(),
            node: node.into(),
        });
        self
    }

    pub fn build(self) -> Derived {
        Derived {
            inner: Rc::new(DerivedInner {
                label: self.label,
                params: self.params,
                body: self.body,
            }),
        }
    }
}

impl From<DerivedBuilder> for Derived {
    fn from(builder: DerivedBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_names() {
        let node = Derived::new("one", |_| Ok(1i64)).build();
        let params = [
            Param::Opt(Rc::new(Opt::keyword(["--pg-host"]))),
            Param::Derived {
                name: "url".into(),
                node,
            },
        ];
        assert_eq!(params[0].name(), "pg_host");
        assert_eq!(params[1].name(), "url");
    }

    #[test]
    fn test_clones_share_identity() {
        let node = Derived::new("one", |_| Ok(1i64)).build();
        let copy = node.clone();
        let other = Derived::new("one", |_| Ok(1i64)).build();

        assert!(node.ptr_eq(&copy));
        assert_eq!(node.id(), copy.id());
        assert!(!node.ptr_eq(&other));
    }

    #[test]
    fn test_async_flag() {
        let node = Derived::new_async("later", |_| async { Ok::<_, anyhow::Error>(2i64) }).build();
        assert!(node.is_async());
        assert!(!Derived::new("now", |_| Ok(())).build().is_async());
    }
}
