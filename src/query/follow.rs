//! MATCH traversal steps for fuzzy matching and ancestor/descendant closures

use std::fmt;

use crate::error::FerroError;

use super::constants::{edge_list, Direction, FUZZY_CLASSES};

/// One edge-following step of a MATCH expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Follow {
    classes: Vec<String>,
    direction: Direction,
    depth: Option<u32>,
    active_only: bool,
}

impl Follow {
    /// Without a depth the step continues while matching edges remain,
    /// which is only bounded for a single direction.
    pub fn new(
        classes: Vec<String>,
        direction: Direction,
        depth: Option<u32>,
        active_only: bool,
    ) -> Result<Self, FerroError> {
        if direction == Direction::Both && depth.is_none() {
            return Err(FerroError::usage(
                "following edges requires a stopping point. Cannot have null depth with type 'both'",
            ));
        }
        Ok(Self {
            classes,
            direction,
            depth,
            active_only,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn depth(&self) -> Option<u32> {
        self.depth
    }

    /// Fuzzy-match step over the alias and deprecation edges
    pub fn fuzzy(depth: u32, active_only: bool) -> Self {
        Self {
            classes: FUZZY_CLASSES.iter().map(|c| c.to_string()).collect(),
            direction: Direction::Both,
            depth: Some(depth),
            active_only,
        }
    }

    /// Build the MATCH expressions for a query's closure options
    ///
    /// Each ancestor/descendant closure becomes its own expression; a fuzzy
    /// step brackets each of them, or stands alone when neither is given.
    pub fn from_options(
        ancestors: Option<&[String]>,
        descendants: Option<&[String]>,
        fuzzy_match: Option<u32>,
        active_only: bool,
    ) -> Vec<Vec<Follow>> {
        let mut follow = Vec::new();
        if let Some(classes) = ancestors {
            follow.push(vec![Follow {
                classes: classes.to_vec(),
                direction: Direction::In,
                depth: None,
                active_only,
            }]);
        }
        if let Some(classes) = descendants {
            follow.push(vec![Follow {
                classes: classes.to_vec(),
                direction: Direction::Out,
                depth: None,
                active_only,
            }]);
        }
        if let Some(depth) = fuzzy_match.filter(|d| *d > 0) {
            let fuzzy = Follow::fuzzy(depth, active_only);
            if follow.is_empty() {
                follow.push(vec![fuzzy]);
            } else {
                for steps in &mut follow {
                    steps.insert(0, fuzzy.clone());
                    steps.push(fuzzy.clone());
                }
            }
        }
        follow
    }
}

impl fmt::Display for Follow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges = edge_list(&self.classes);
        let dir = self.direction;
        let condition = match self.depth {
            None => format!("{}({}).size() > 0", dir, edges),
            Some(depth) => format!("$depth < {}", depth),
        };
        if self.active_only {
            write!(
                f,
                ".{}({}){{while: ({} AND deletedAt IS NULL), where: (deletedAt IS NULL)}}",
                dir, edges, condition
            )
        } else {
            write!(f, ".{}({}){{while: ({})}}", dir, edges, condition)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(classes: &[&str]) -> Vec<String> {
        classes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_open_ended_render() {
        let follow = Follow::new(names(&["blargh", "monkeys"]), Direction::Out, None, false).unwrap();
        assert_eq!(
            follow.to_string(),
            ".out('blargh', 'monkeys'){while: (out('blargh', 'monkeys').size() > 0)}"
        );

        let follow = Follow::new(names(&["SubclassOf"]), Direction::In, None, true).unwrap();
        assert_eq!(
            follow.to_string(),
            ".in('SubclassOf'){while: (in('SubclassOf').size() > 0 AND deletedAt IS NULL), where: (deletedAt IS NULL)}"
        );
    }

    #[test]
    fn test_depth_render() {
        assert_eq!(
            Follow::fuzzy(4, true).to_string(),
            ".both('AliasOf', 'DeprecatedBy'){while: ($depth < 4 AND deletedAt IS NULL), where: (deletedAt IS NULL)}"
        );
        assert_eq!(
            Follow::new(vec![], Direction::Both, Some(3), false)
                .unwrap()
                .to_string(),
            ".both(){while: ($depth < 3)}"
        );
    }

    #[test]
    fn test_both_requires_depth() {
        let err = Follow::new(vec![], Direction::Both, None, true).unwrap_err();
        assert!(matches!(err, FerroError::Usage { .. }));
    }

    #[test]
    fn test_from_options_fuzzy_only() {
        let follow = Follow::from_options(None, None, Some(2), false);
        assert_eq!(follow, vec![vec![Follow::fuzzy(2, false)]]);
        assert!(Follow::from_options(None, None, Some(0), false).is_empty());
    }

    #[test]
    fn test_from_options_brackets_closures() {
        let edges = names(&["SubclassOf"]);
        let follow = Follow::from_options(Some(&edges), Some(&edges), Some(1), true);
        assert_eq!(follow.len(), 2);
        for steps in &follow {
            assert_eq!(steps.len(), 3);
            assert_eq!(steps[0], Follow::fuzzy(1, true));
            assert_eq!(steps[2], Follow::fuzzy(1, true));
        }
        assert_eq!(follow[0][1].direction(), Direction::In);
        assert_eq!(follow[1][1].direction(), Direction::Out);
    }
}
