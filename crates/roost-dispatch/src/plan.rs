//! Resolution plans.
//!
//! A [`Plan`] is computed once per command (and per group) when the tree is
//! built. It flattens the parameter graph into the ordered list of leaf
//! descriptors the binder sees, plus the derived nodes in dependency order:
//!
//! ```text
//! params ──flatten──→ leaves  (deduplicated, unique names and flags)
//!        └──────────→ nodes   (post-order: every node after its inputs)
//! ```
//!
//! At dispatch time an [`Invocation`] casts the leaves, evaluates each node
//! at most once, and assembles the keyword set for the body.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::cast::{cast, Bound};
use crate::choices::ChoiceCache;
use crate::derived::{Derived, Param};
use crate::error::{DefinitionError, Error};
use crate::option::Opt;
use crate::value::{Args, Value};

#[derive(Debug, Clone, Default)]
pub(crate) struct Plan {
    params: Vec<Param>,
    leaves: Vec<Rc<Opt>>,
    nodes: Vec<Derived>,
}

impl Plan {
    /// Flattens and validates `params`. `scope` names the owner in errors.
    pub(crate) fn build(scope: &str, params: &[Param]) -> Result<Plan, DefinitionError> {
        let mut builder = PlanBuilder {
            scope,
            leaves: Vec::new(),
            owners: HashMap::new(),
            nodes: Vec::new(),
            visited: HashSet::new(),
            stack: Vec::new(),
        };
        builder.visit_params(params, scope)?;

        let plan = Plan {
            params: params.to_vec(),
            leaves: builder.leaves,
            nodes: builder.nodes,
        };
        plan.check_flags(scope)?;
        plan.check_positionals(scope)?;
        Ok(plan)
    }

    /// Every leaf descriptor reachable from the parameter list.
    pub(crate) fn leaves(&self) -> &[Rc<Opt>] {
        &self.leaves
    }

    pub(crate) fn positionals(&self) -> impl Iterator<Item = &Rc<Opt>> {
        self.leaves.iter().filter(|opt| opt.is_positional())
    }

    fn check_flags(&self, scope: &str) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for flag in self.leaves.iter().flat_map(|opt| opt.flags()) {
            if !seen.insert(flag.as_str()) {
                return Err(DefinitionError::DuplicateFlag {
                    flag: flag.clone(),
                    scope: scope.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_positionals(&self, scope: &str) -> Result<(), DefinitionError> {
        let positionals: Vec<&Rc<Opt>> = self.positionals().collect();
        let mut first_optional: Option<&Rc<Opt>> = None;
        for (index, opt) in positionals.iter().enumerate() {
            if opt.arg_type().is_list() && index + 1 < positionals.len() {
                return Err(DefinitionError::ListPositionalNotLast {
                    name: opt.name().to_string(),
                    scope: scope.to_string(),
                });
            }
            match first_optional {
                Some(optional) if opt.is_required() => {
                    return Err(DefinitionError::PositionalOrder {
                        required: opt.name().to_string(),
                        optional: optional.name().to_string(),
                        scope: scope.to_string(),
                    });
                }
                None if !opt.is_required() => first_optional = Some(*opt),
                _ => {}
            }
        }
        Ok(())
    }
}

struct PlanBuilder<'a> {
    scope: &'a str,
    leaves: Vec<Rc<Opt>>,
    /// Leaf name → description of who declared it.
    owners: HashMap<String, String>,
    nodes: Vec<Derived>,
    visited: HashSet<usize>,
    stack: Vec<usize>,
}

impl PlanBuilder<'_> {
    fn visit_params(&mut self, params: &[Param], owner: &str) -> Result<(), DefinitionError> {
        let mut siblings = HashSet::new();
        for param in params {
            if !siblings.insert(param.name()) {
                return Err(DefinitionError::NameCollision {
                    name: param.name().to_string(),
                    first: owner.to_string(),
                    second: owner.to_string(),
                    scope: self.scope.to_string(),
                });
            }
            match param {
                Param::Opt(opt) => self.add_leaf(opt, owner)?,
                Param::Derived { node, .. } => self.visit_node(node)?,
            }
        }
        Ok(())
    }

    fn visit_node(&mut self, node: &Derived) -> Result<(), DefinitionError> {
        let id = node.id();
        if self.stack.contains(&id) {
            return Err(DefinitionError::CyclicDerived(node.label().to_string()));
        }
        if self.visited.contains(&id) {
            return Ok(());
        }
        self.stack.push(id);
        self.visit_params(node.params(), &format!("derived '{}'", node.label()))?;
        self.stack.pop();
        self.visited.insert(id);
        self.nodes.push(node.clone());
        Ok(())
    }

    fn add_leaf(&mut self, opt: &Rc<Opt>, owner: &str) -> Result<(), DefinitionError> {
        opt.validate()?;
        if self.leaves.iter().any(|leaf| Rc::ptr_eq(leaf, opt)) {
            return Ok(());
        }
        if let Some(first) = self.owners.get(opt.name()) {
            return Err(DefinitionError::NameCollision {
                name: opt.name().to_string(),
                first: first.clone(),
                second: owner.to_string(),
                scope: self.scope.to_string(),
            });
        }
        self.owners.insert(opt.name().to_string(), owner.to_string());
        self.leaves.push(opt.clone());
        Ok(())
    }
}

/// The values computed for one plan.
#[derive(Debug, Clone, Default)]
pub(crate) struct Resolved {
    /// Leaf values by logical name.
    pub(crate) leaves: Args,
    /// The keyword set for the plan's own parameter list.
    pub(crate) args: Args,
}

/// Per-dispatch evaluation state: node results and producer choices.
#[derive(Default)]
pub(crate) struct Invocation {
    nodes: HashMap<usize, Value>,
    choices: ChoiceCache,
}

impl Invocation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Casts the plan's leaves from `bound` and evaluates its derived nodes.
    pub(crate) async fn resolve(
        &mut self,
        plan: &Plan,
        bound: &[Bound],
    ) -> Result<Resolved, Error> {
        let mut leaves = Args::new();
        for (opt, bound) in plan.leaves.iter().zip(bound) {
            let value = cast(opt, bound, &mut self.choices).await?;
            leaves.insert(opt.name(), value);
        }

        for node in &plan.nodes {
            if self.nodes.contains_key(&node.id()) {
                tracing::trace!(derived = node.label(), "reusing derived value");
                continue;
            }
            let args = self.bind(node.params(), &leaves);
            tracing::trace!(derived = node.label(), "evaluating derived parameter");
            let value = node.body().call(args).await.map_err(Error::from_body)?;
            self.nodes.insert(node.id(), value);
        }

        let args = self.bind(&plan.params, &leaves);
        Ok(Resolved { leaves, args })
    }

    /// Builds the keyword set for `params` from resolved leaves and nodes.
    pub(crate) fn bind(&self, params: &[Param], leaves: &Args) -> Args {
        let mut args = Args::new();
        for param in params {
            let value = match param {
                Param::Opt(opt) => leaves.value(opt.name()),
                Param::Derived { node, .. } => self.nodes.get(&node.id()),
            };
            if let Some(value) = value {
                args.insert(param.name(), value.clone());
            }
        }
        args
    }
}
