//! Choice constraints.
//!
//! A descriptor's allowed values are either a static list, or a producer
//! evaluated lazily the first time the descriptor is validated in a given
//! invocation. Entries are plain values or anchored regular expressions.
//!
//! | Entry | Matches |
//! |-------|---------|
//! | `Choice::Value` | equal value (case-folded strings when the descriptor is case-insensitive) |
//! | `Choice::Pattern` | full match of the token, always case-sensitive |

use futures::future::{FutureExt, LocalBoxFuture};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::value::Value;

/// One allowed value, or a pattern of allowed values.
#[derive(Clone)]
pub enum Choice {
    Value(Value),
    /// Anchored regular expression, with its source text for display.
    Pattern(Regex, String),
}

impl Choice {
    /// Builds a pattern choice that must match the whole token.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Choice::Pattern(anchored, pattern.to_string()))
    }

    /// How the entry is listed in help and error output.
    pub fn display(&self) -> String {
        match self {
            Choice::Value(value) => value.to_token(),
            Choice::Pattern(_, source) => format!("/{}/", source),
        }
    }

    /// Returns the canonical value when `value` satisfies this entry.
    fn accept(&self, value: &Value, case_sensitive: bool) -> Option<Value> {
        match self {
            Choice::Value(allowed) => {
                if allowed == value {
                    return Some(allowed.clone());
                }
                let (a, b) = (allowed.to_token(), value.to_token());
                let same = if case_sensitive {
                    matches!((allowed, value), (Value::Str(_), _) | (_, Value::Str(_))) && a == b
                } else {
                    a.to_lowercase() == b.to_lowercase()
                };
                if !same {
                    return None;
                }
                match value {
                    Value::Str(_) => Some(allowed.clone()),
                    _ => Some(value.clone()),
                }
            }
            Choice::Pattern(re, _) => re.is_match(&value.to_token()).then(|| value.clone()),
        }
    }
}

impl fmt::Debug for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Choice::Pattern(_, source) => f.debug_tuple("Pattern").field(source).finish(),
        }
    }
}

macro_rules! impl_choice_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Choice {
                fn from(value: $ty) -> Self {
                    Choice::Value(value.into())
                }
            }
        )*
    };
}

impl_choice_from!(Value, &str, String, bool, i64, i32, u32, f64);

/// Synchronous choice producer.
pub type ProducerFn = Rc<dyn Fn() -> Vec<Choice>>;

/// Asynchronous choice producer.
pub type AsyncProducerFn = Rc<dyn Fn() -> LocalBoxFuture<'static, Vec<Choice>>>;

/// The allowed values of a descriptor.
#[derive(Clone)]
pub enum Choices {
    Static(Rc<Vec<Choice>>),
    Producer(ProducerFn),
    AsyncProducer(AsyncProducerFn),
}

impl Choices {
    pub fn values<I, C>(values: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Choice>,
    {
        Choices::Static(Rc::new(values.into_iter().map(Into::into).collect()))
    }

    /// Choices computed on first use in each invocation.
    pub fn producer<F, C>(f: F) -> Self
    where
        F: Fn() -> Vec<C> + 'static,
        C: Into<Choice>,
    {
        Choices::Producer(Rc::new(move || f().into_iter().map(Into::into).collect()))
    }

    /// Choices computed asynchronously on first use in each invocation.
    pub fn async_producer<F, Fut, C>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Vec<C>> + 'static,
        C: Into<Choice>,
    {
        Choices::AsyncProducer(Rc::new(move || {
            let fut = f();
            async move { fut.await.into_iter().map(Into::into).collect() }.boxed_local()
        }))
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Choices::Static(_))
    }

    /// The list, when known without running a producer.
    pub fn static_choices(&self) -> Option<&[Choice]> {
        match self {
            Choices::Static(list) => Some(list.as_slice()),
            _ => None,
        }
    }

    /// Identity of the underlying list or producer.
    fn key(&self) -> usize {
        match self {
            Choices::Static(list) => Rc::as_ptr(list) as *const () as usize,
            Choices::Producer(f) => Rc::as_ptr(f) as *const () as usize,
            Choices::AsyncProducer(f) => Rc::as_ptr(f) as *const () as usize,
        }
    }
}

impl fmt::Debug for Choices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choices::Static(list) => f.debug_tuple("Static").field(list).finish(),
            Choices::Producer(_) => write!(f, "Producer(..)"),
            Choices::AsyncProducer(_) => write!(f, "AsyncProducer(..)"),
        }
    }
}

impl<C: Into<Choice>> From<Vec<C>> for Choices {
    fn from(values: Vec<C>) -> Self {
        Choices::values(values)
    }
}

impl<C: Into<Choice>, const N: usize> From<[C; N]> for Choices {
    fn from(values: [C; N]) -> Self {
        Choices::values(values)
    }
}

impl<C: Into<Choice>> FromIterator<C> for Choices {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Choices::values(iter)
    }
}

/// Finds the first entry accepting `value` and returns the canonical value.
pub(crate) fn find_match(choices: &[Choice], value: &Value, case_sensitive: bool) -> Option<Value> {
    choices
        .iter()
        .find_map(|choice| choice.accept(value, case_sensitive))
}

/// Producer results memoized for the lifetime of one dispatch.
#[derive(Default)]
pub(crate) struct ChoiceCache {
    resolved: HashMap<usize, Rc<Vec<Choice>>>,
}

impl ChoiceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn resolve(&mut self, choices: &Choices) -> Rc<Vec<Choice>> {
        let key = match choices {
            Choices::Static(list) => return list.clone(),
            other => other.key(),
        };
        if let Some(hit) = self.resolved.get(&key) {
            return hit.clone();
        }
        let produced = match choices {
            Choices::Producer(f) => f(),
            Choices::AsyncProducer(f) => f().await,
            Choices::Static(list) => list.as_ref().clone(),
        };
        tracing::trace!(count = produced.len(), "resolved choice producer");
        let produced = Rc::new(produced);
        self.resolved.insert(key, produced.clone());
        produced
    }
}
