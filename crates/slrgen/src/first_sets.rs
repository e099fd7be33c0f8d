//! Calculation of first set function.

use crate::{
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalSet, EPSILON},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

/// `FIRST(X)` for every nonterminal symbol `X` that has a production rule.
///
/// The membership of `ε` is kept apart from the terminal symbols as the
/// set of nullable nonterminals.
#[derive(Debug)]
pub struct FirstSets {
    sets: Map<NonterminalID, TerminalSet>,
    nullables: Set<NonterminalID>,
}

impl FirstSets {
    /// Compute the first sets of the grammar, ignoring the augmented start rule.
    #[tracing::instrument(skip_all)]
    pub fn new(g: &Grammar) -> Self {
        // First(X) = {} for every nonterminal symbols with production rules.
        // The ones without any rule are left unregistered.
        let mut sets: Map<NonterminalID, TerminalSet> = g
            .rules
            .iter()
            .filter(|(id, _)| **id != RuleID::ACCEPT)
            .map(|(_, rule)| (rule.left, TerminalSet::default()))
            .collect();
        let mut nullables = Set::default();

        let mut iterations = 0;
        let mut changed = true;
        while changed {
            changed = false;
            iterations += 1;

            for (_, rule) in g.rules.iter().filter(|(id, _)| **id != RuleID::ACCEPT) {
                // X -> Y1 Y2 ... Yn に対し、非nullableな記号 Yk に達するまで
                // First(Yi) \ {ε} を First(X) に加える
                let mut added = TerminalSet::default();
                let mut nullable = true;
                for symbol in &rule.right {
                    match symbol {
                        SymbolID::T(t) => {
                            added.insert(*t);
                            nullable = false;
                            break;
                        }
                        SymbolID::N(n) => {
                            // An unregistered symbol contributes nothing and
                            // does not block the propagation.
                            let Some(first) = sets.get(n) else { continue };
                            added.union_with(first);
                            if !nullables.contains(n) {
                                nullable = false;
                                break;
                            }
                        }
                    }
                }

                if let Some(slot) = sets.get_mut(&rule.left) {
                    changed |= slot.extend_from(&added);
                }
                if nullable {
                    changed |= nullables.insert(rule.left);
                }
            }
        }
        tracing::trace!("first sets converged after {} iterations", iterations);

        Self { sets, nullables }
    }

    /// Return the terminal symbols in `FIRST(n)`, or `None` if `n` has no production rules.
    pub fn get(&self, n: NonterminalID) -> Option<&TerminalSet> {
        self.sets.get(&n)
    }

    /// Return whether `FIRST(n)` contains `ε`.
    pub fn is_nullable(&self, n: NonterminalID) -> bool {
        self.nullables.contains(&n)
    }

    /// `First(symbols)`, along with whether the whole sequence may derive `ε`.
    pub fn first_of(&self, symbols: &[SymbolID]) -> (TerminalSet, bool) {
        let mut res = TerminalSet::default();
        for symbol in symbols {
            match symbol {
                SymbolID::T(t) => {
                    res.insert(*t);
                    return (res, false);
                }
                SymbolID::N(n) => {
                    let Some(first) = self.sets.get(n) else { continue };
                    res.union_with(first);
                    if !self.is_nullable(*n) {
                        return (res, false);
                    }
                }
            }
        }
        (res, true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NonterminalID, &TerminalSet)> + '_ {
        self.sets.iter().map(|(n, set)| (*n, set))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (&n, set) in &self.sets {
                write!(f, "FIRST({}) = {{", g.nonterminal_name(n))?;
                let mut names: Vec<&str> = set.iter().map(|t| g.terminal_name(t)).collect();
                if self.is_nullable(n) {
                    names.push(EPSILON);
                }
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}", name)?;
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

    fn nonterminal(g: &Grammar, name: &str) -> NonterminalID {
        g.nonterminals
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(id, _)| *id)
            .unwrap()
    }

    fn first(g: &Grammar, sets: &FirstSets, name: &str) -> Vec<String> {
        let n = nonterminal(g, name);
        let mut names: Vec<_> = sets
            .get(n)
            .unwrap()
            .iter()
            .map(|t| g.terminal_name(t).to_owned())
            .collect();
        if sets.is_nullable(n) {
            names.push(EPSILON.to_owned());
        }
        names.sort();
        names
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
        let sets = FirstSets::new(&g);

        for name in ["E", "T", "F"] {
            assert_eq!(first(&g, &sets, name), ["(", "a"], "FIRST({})", name);
        }
        assert!(sets.get(NonterminalID::START).is_none());
    }

    #[test]
    fn epsilon_propagation() {
        let g = Grammar::augment(&rules![
            "S" => ["A", "B", "c"],
            "A" => ["a"],
            "A" => [],
            "B" => ["A"],
            "B" => ["b"],
        ])
        .unwrap();
        let sets = FirstSets::new(&g);

        assert_eq!(first(&g, &sets, "A"), ["a", "ε"]);
        assert_eq!(first(&g, &sets, "B"), ["a", "b", "ε"]);
        assert_eq!(first(&g, &sets, "S"), ["a", "b", "c"]);
    }

    #[test]
    fn unresolved_symbols_are_transparent() {
        let g = Grammar::augment(&rules!["S" => ["X", "b"], "T" => ["Y"]]).unwrap();
        let sets = FirstSets::new(&g);

        assert!(sets.get(nonterminal(&g, "X")).is_none());
        assert_eq!(first(&g, &sets, "S"), ["b"]);
        assert_eq!(first(&g, &sets, "T"), ["ε"]);
    }

    #[test]
    fn first_of_sequence() {
        let g = Grammar::augment(&rules!["S" => ["A", "b"], "A" => ["a"], "A" => []]).unwrap();
        let sets = FirstSets::new(&g);
        let right = &g.rules.get_index(1).unwrap().1.right;

        let (set, nullable) = sets.first_of(right);
        assert!(!nullable);
        assert_eq!(set.len(), 2);

        let (set, nullable) = sets.first_of(&right[..1]);
        assert!(nullable);
        assert_eq!(set.len(), 1);

        let (set, nullable) = sets.first_of(&[]);
        assert!(nullable);
        assert!(set.is_empty());
    }

    #[test]
    fn display() {
        let g = Grammar::augment(&rules!["S" => ["A", "b"], "A" => ["a"], "A" => []]).unwrap();
        let sets = FirstSets::new(&g);
        assert_eq!(
            sets.display(&g).to_string(),
            "FIRST(S) = { b, a }\nFIRST(A) = { a, ε }\n"
        );
    }
}
