//! Token binding.
//!
//! Splits the tokens left after path matching across the descriptors in
//! scope. Each scope level (root group, nested groups, the command) brings
//! its own leaf descriptors; a flag declared at several levels binds to the
//! most specific one. A descriptor shared by several levels (the same
//! `Rc<Opt>`, e.g. a derived node used by a processor and its command) binds
//! once and every level holding it sees the same slot.
//!
//! Recognised forms:
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `--flag value` / `-f value` | keyword with a value |
//! | `--flag=value` | keyword with an inline value |
//! | `--switch` | boolean switch |
//! | `--items a b c` | list keyword, up to the next recognised flag |
//! | `--` | every following token is positional |
//! | `-3`, `-0.5` | positional (negative numbers are never flags) |

use std::collections::HashMap;
use std::rc::Rc;

use crate::cast::Bound;
use crate::error::CastError;
use crate::option::Opt;
use crate::suggest::did_you_mean;

/// Bound values per level, aligned with the descriptors of each level.
pub(crate) type Bindings = Vec<Vec<Bound>>;

/// Flag → (level, descriptor index), most specific level winning.
///
/// A shared descriptor is registered at the shallowest level holding it.
pub(crate) fn flag_table(levels: &[&[Rc<Opt>]]) -> HashMap<String, (usize, usize)> {
    let mut table = HashMap::new();
    for (level, opts) in levels.iter().enumerate() {
        for (index, opt) in opts.iter().enumerate() {
            if shallower(levels, level, opt).is_some() {
                continue;
            }
            for flag in opt.flags() {
                table.insert(flag.clone(), (level, index));
            }
        }
    }
    table
}

/// Position of the same descriptor at a level above `level`, if any.
fn shallower(levels: &[&[Rc<Opt>]], level: usize, opt: &Rc<Opt>) -> Option<(usize, usize)> {
    levels[..level].iter().enumerate().find_map(|(above, opts)| {
        opts.iter()
            .position(|other| Rc::ptr_eq(other, opt))
            .map(|index| (above, index))
    })
}

/// Copies each shared descriptor's slot to the deeper levels holding it.
fn share_slots(levels: &[&[Rc<Opt>]], bound: &mut Bindings) {
    for (level, opts) in levels.iter().enumerate().skip(1) {
        for (index, opt) in opts.iter().enumerate() {
            if let Some((above, at)) = shallower(levels, level, opt) {
                bound[level][index] = bound[above][at].clone();
            }
        }
    }
}

/// True for tokens shaped like an option rather than a value.
pub(crate) fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && token != "--" && token.parse::<f64>().is_err()
}

/// Splits `--flag=value` into its parts.
pub(crate) fn split_inline(token: &str) -> (&str, Option<&str>) {
    if looks_like_flag(token) {
        if let Some((flag, value)) = token.split_once('=') {
            return (flag, Some(value));
        }
    }
    (token, None)
}

pub(crate) fn bind(levels: &[&[Rc<Opt>]], tokens: &[String]) -> Result<Bindings, CastError> {
    let table = flag_table(levels);
    let mut bound: Bindings = levels
        .iter()
        .map(|opts| vec![Bound::Absent; opts.len()])
        .collect();
    let mut positional: Vec<String> = Vec::new();
    let mut only_positional = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if only_positional {
            positional.push(token.clone());
            continue;
        }
        if token == "--" {
            only_positional = true;
            continue;
        }

        let (flag, inline) = split_inline(token);
        let Some(&(level, index)) = table.get(flag) else {
            if looks_like_flag(token) {
                let suggestions = did_you_mean(flag, table.keys().map(String::as_str));
                return Err(CastError::unknown_option(flag).with_suggestions(suggestions));
            }
            positional.push(token.clone());
            continue;
        };

        let opt = &levels[level][index];
        let slot = &mut bound[level][index];
        let is_value = |t: &String| t != "--" && !table.contains_key(split_inline(t).0);

        if opt.arg_type().is_bool() {
            *slot = match inline {
                Some(value) => Bound::token(value),
                None => Bound::Switch,
            };
        } else if opt.arg_type().is_list() {
            let mut items = match std::mem::replace(slot, Bound::Absent) {
                Bound::Tokens(items) => items,
                _ => Vec::new(),
            };
            items.extend(inline.map(String::from));
            while i < tokens.len() && is_value(&tokens[i]) {
                items.push(tokens[i].clone());
                i += 1;
            }
            if items.is_empty() {
                return Err(CastError::missing_value(flag));
            }
            *slot = Bound::Tokens(items);
        } else {
            let value = match inline {
                Some(value) => value.to_string(),
                None if i < tokens.len() && is_value(&tokens[i]) => {
                    i += 1;
                    tokens[i - 1].clone()
                }
                None => return Err(CastError::missing_value(flag)),
            };
            *slot = Bound::Tokens(vec![value]);
        }
    }

    let target = levels.len() - 1;
    let positionals: Vec<usize> = levels[target]
        .iter()
        .enumerate()
        .filter(|(_, opt)| opt.is_positional())
        .map(|(index, _)| index)
        .collect();

    let mut rest = positional.into_iter();
    for &index in &positionals {
        if levels[target][index].arg_type().is_list() {
            let items: Vec<String> = rest.by_ref().collect();
            if !items.is_empty() {
                bound[target][index] = Bound::Tokens(items);
            }
        } else if let Some(token) = rest.next() {
            bound[target][index] = Bound::Tokens(vec![token]);
        }
    }
    if let Some(extra) = rest.next() {
        return Err(CastError::unexpected_argument(extra, positionals.len()));
    }

    share_slots(levels, &mut bound);
    Ok(bound)
}
