//! Calculation of follow set function.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID, TerminalSet},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// `FOLLOW(X)` for every nonterminal symbol `X` of the grammar before augmentation.
#[derive(Debug)]
pub struct FollowSets {
    sets: Map<NonterminalID, TerminalSet>,
}

impl FollowSets {
    /// Compute the follow sets of the grammar, ignoring the augmented start rule.
    ///
    /// `FOLLOW(S)` of the user-supplied start symbol `S` is seeded with `$`.
    #[tracing::instrument(skip_all)]
    pub fn new(g: &Grammar, first_sets: &FirstSets) -> Self {
        let mut sets: Map<NonterminalID, TerminalSet> = g
            .nonterminals
            .keys()
            .filter(|&&n| n != NonterminalID::START)
            .map(|&n| (n, TerminalSet::default()))
            .collect();
        if let Some(set) = sets.get_mut(&g.start_symbol) {
            set.insert(TerminalID::EOI);
        }

        let mut iterations = 0;
        let mut changed = true;
        while changed {
            changed = false;
            iterations += 1;

            for (_, rule) in g.rules.iter().filter(|(id, _)| **id != RuleID::ACCEPT) {
                for (i, symbol) in rule.right.iter().enumerate() {
                    let &SymbolID::N(b) = symbol else { continue };

                    // A -> α B β に対し First(β) \ {ε} を Follow(B) に加え、
                    // β が nullable であれば Follow(A) も加える
                    let (mut added, nullable) = first_sets.first_of(&rule.right[i + 1..]);
                    if nullable {
                        if let Some(follow) = sets.get(&rule.left) {
                            added.union_with(follow);
                        }
                    }

                    if let Some(slot) = sets.get_mut(&b) {
                        changed |= slot.extend_from(&added);
                    }
                }
            }
        }
        tracing::trace!("follow sets converged after {} iterations", iterations);

        Self { sets }
    }

    pub fn get(&self, n: NonterminalID) -> Option<&TerminalSet> {
        self.sets.get(&n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NonterminalID, &TerminalSet)> + '_ {
        self.sets.iter().map(|(n, set)| (*n, set))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (&n, set) in &self.sets {
                write!(f, "FOLLOW({}) = {{", g.nonterminal_name(n))?;
                for (i, t) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}", g.terminal_name(t))?;
                }
                writeln!(f, " }}")?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follow(g: &Grammar, sets: &FollowSets, name: &str) -> Vec<String> {
        let (&n, _) = g.nonterminals.iter().find(|(_, n)| *n == name).unwrap();
        let mut names: Vec<_> = sets
            .get(n)
            .unwrap()
            .iter()
            .map(|t| g.terminal_name(t).to_owned())
            .collect();
        names.sort();
        names
    }

    fn follow_sets(g: &Grammar) -> FollowSets {
        FollowSets::new(g, &FirstSets::new(g))
    }

    #[test]
    fn arithmetic() {
        let g = Grammar::augment(&rules![
            "E" => ["E", "+", "T"],
            "E" => ["T"],
            "T" => ["T", "*", "F"],
            "T" => ["F"],
            "F" => ["(", "E", ")"],
            "F" => ["a"],
        ])
        .unwrap();
        let sets = follow_sets(&g);

        assert_eq!(follow(&g, &sets, "E"), ["$", ")", "+"]);
        assert_eq!(follow(&g, &sets, "T"), ["$", ")", "*", "+"]);
        assert_eq!(follow(&g, &sets, "F"), ["$", ")", "*", "+"]);
        assert!(sets.get(NonterminalID::START).is_none());
    }

    #[test]
    fn start_symbol_is_followed_by_eoi() {
        let g = Grammar::augment(&rules!["S" => ["a"]]).unwrap();
        let sets = follow_sets(&g);
        assert_eq!(follow(&g, &sets, "S"), ["$"]);
    }

    #[test]
    fn nullable_suffix() {
        let g = Grammar::augment(&rules![
            "S" => ["A", "B"],
            "S" => ["B", "c"],
            "A" => ["a"],
            "B" => ["b"],
            "B" => [],
        ])
        .unwrap();
        let sets = follow_sets(&g);

        // B is nullable, so FOLLOW(A) includes FOLLOW(S).
        assert_eq!(follow(&g, &sets, "A"), ["$", "b"]);
        assert_eq!(follow(&g, &sets, "B"), ["$", "c"]);
    }

    #[test]
    fn unresolved_symbols_are_transparent() {
        let g = Grammar::augment(&rules!["S" => ["A", "X", "b"], "A" => ["a"]]).unwrap();
        let sets = follow_sets(&g);

        assert_eq!(follow(&g, &sets, "A"), ["b"]);
        assert_eq!(follow(&g, &sets, "X"), ["b"]);
    }

    #[test]
    fn display() {
        let g = Grammar::augment(&rules!["S" => ["A", "b"], "A" => ["a"]]).unwrap();
        let sets = follow_sets(&g);
        assert_eq!(
            sets.display(&g).to_string(),
            "FOLLOW(S) = { $ }\nFOLLOW(A) = { b }\n"
        );
    }
}
