//! "Did you mean" suggestions and path completion.

use serde::Serialize;
use strsim::levenshtein;

use crate::tree::{CommandTree, Node};

/// Largest edit distance still worth suggesting.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Candidates within [`MAX_SUGGESTION_DISTANCE`] of `input`, closest first.
///
/// Comparison is case-insensitive; candidates keep their original spelling.
pub fn did_you_mean<'a, I>(input: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let input = input.to_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|candidate| (levenshtein(&input, &candidate.to_lowercase()), candidate))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .collect();
    scored.sort();
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().map(|(_, c)| c.to_string()).collect()
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// Full colon-separated path of the candidate.
    pub token: String,
    pub help: String,
}

/// Completes a colon-separated partial path such as `sub:ba`.
///
/// Every segment but the last must name a group exactly (case-insensitive);
/// children of that group whose token starts with the last segment are
/// returned in token order. A leading `/` is ignored.
pub fn suggestions(tree: &CommandTree, partial: &str) -> Vec<Suggestion> {
    let partial = partial.trim_start_matches('/');
    let (prefix, query) = match partial.rsplit_once(':') {
        Some((prefix, query)) => (prefix.split(':').collect::<Vec<_>>(), query),
        None => (Vec::new(), partial),
    };

    let mut group = tree.root();
    let mut resolved = Vec::with_capacity(prefix.len());
    for segment in prefix {
        let next = group.children().find_map(|(token, node)| match node {
            Node::Group(g) if token.eq_ignore_ascii_case(segment) => Some((token, g)),
            _ => None,
        });
        match next {
            Some((token, g)) => {
                resolved.push(token);
                group = g;
            }
            None => return Vec::new(),
        }
    }

    let query = query.to_lowercase();
    group
        .children()
        .filter(|(token, _)| token.to_lowercase().starts_with(&query))
        .map(|(token, node)| {
            let mut path = resolved.clone();
            path.push(token);
            Suggestion {
                token: path.join(":"),
                help: node.help_text().unwrap_or_default().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    #[test]
    fn test_suggests_close_candidates_only() {
        let candidates = ["foo", "bar", "baz", "sub"];
        assert_eq!(did_you_mean("fo", candidates), vec!["foo"]);
        assert_eq!(did_you_mean("bax", candidates), vec!["bar", "baz"]);
        assert!(did_you_mean("completely", candidates).is_empty());
    }

    #[test]
    fn test_suggestion_is_case_insensitive() {
        assert_eq!(did_you_mean("FOO", ["foo"]), vec!["foo"]);
    }

    fn tree() -> CommandTree {
        CommandTree::builder()
            .command(Command::new("foo", |_| Ok(())).help("Run foo command"))
            .command(Command::new("bar", |_| Ok(())).help("Run bar command"))
            .group("sub", |g| {
                g.help("A sub command")
                    .command(Command::new("bar", |_| Ok(())).help("Run sub bar"))
                    .command(Command::new("baz", |_| Ok(())))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_completes_root_tokens() {
        let found = suggestions(&tree(), "s");
        assert_eq!(
            found,
            vec![Suggestion {
                token: "sub".into(),
                help: "A sub command".into()
            }]
        );
        assert_eq!(suggestions(&tree(), "").len(), 3);
    }

    #[test]
    fn test_completes_nested_tokens() {
        let tokens: Vec<String> = suggestions(&tree(), "/SUB:ba")
            .into_iter()
            .map(|s| s.token)
            .collect();
        assert_eq!(tokens, vec!["sub:bar", "sub:baz"]);
    }

    #[test]
    fn test_unknown_prefix_yields_nothing() {
        assert!(suggestions(&tree(), "nope:ba").is_empty());
        assert!(suggestions(&tree(), "foo:x").is_empty());
    }
}
