//! An SLR(1) parse table generator.
//!
//! Given the production rules of a context-free grammar, [`compute`] builds
//! the canonical collection of LR(0) item sets and derives the SLR(1)
//! action and goto tables from it:
//!
//! ```
//! let tables = slrgen::compute(&slrgen::rules![
//!     "S" => ["A", "B"],
//!     "A" => ["a"],
//!     "B" => ["b"],
//! ])?;
//! let output = tables.to_output();
//! assert_eq!(output.states.len(), 6);
//! assert_eq!(output.action_table[1].get("$"), Some("Accept"));
//! # Ok::<(), slrgen::grammar::GrammarError>(())
//! ```

/// Build a list of [`RuleDef`](grammar::RuleDef)s.
///
/// Each rule is written as `"head" => ["symbol", ...]`; an empty list is
/// an ε-production.
#[macro_export]
macro_rules! rules {
    ($($head:expr => [$($symbol:expr),* $(,)?]),* $(,)?) => {
        vec![$(
            $crate::grammar::RuleDef {
                head: ::std::string::String::from($head),
                body: vec![$(::std::string::String::from($symbol)),*],
            }
        ),*]
    };
}

pub mod first_sets;
pub mod follow_sets;
pub mod grammar;
pub mod lr0;
pub mod output;
pub mod table;
pub mod types;
mod util;

use crate::{
    first_sets::FirstSets,
    follow_sets::FollowSets,
    grammar::{Grammar, GrammarError, RuleDef},
    lr0::LR0Automaton,
    output::Output,
    table::ParseTable,
    util::display_fn,
};
use std::fmt;

/// Everything derived from a grammar.
#[derive(Debug)]
#[non_exhaustive]
pub struct Tables {
    pub grammar: Grammar,
    pub first_sets: FirstSets,
    pub follow_sets: FollowSets,
    pub automaton: LR0Automaton,
    pub table: ParseTable,
}

impl Tables {
    /// Project the automaton and the parse table into the row-oriented form.
    pub fn to_output(&self) -> Output {
        Output::new(&self.grammar, &self.automaton, &self.table)
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            writeln!(f, "{}", self.grammar)?;
            writeln!(f, "## first sets:")?;
            writeln!(f, "{}", self.first_sets.display(&self.grammar))?;
            writeln!(f, "## follow sets:")?;
            writeln!(f, "{}", self.follow_sets.display(&self.grammar))?;
            writeln!(f, "{}", self.automaton.display(&self.grammar))?;
            write!(f, "{}", self.table.display(&self.grammar))
        })
    }
}

/// Compute the SLR(1) automaton and parse table from the specified rules.
///
/// The head of the first rule is the start symbol. Reductions refer to the
/// rules by their index in the augmented sequence, where the fresh start
/// rule occupies index 0.
pub fn compute(rules: &[RuleDef]) -> Result<Tables, GrammarError> {
    let grammar = Grammar::augment(rules)?;
    let first_sets = FirstSets::new(&grammar);
    let follow_sets = FollowSets::new(&grammar, &first_sets);
    let automaton = lr0::lr0(&grammar);
    let table = table::generate(&grammar, &automaton, &follow_sets);

    Ok(Tables {
        grammar,
        first_sets,
        follow_sets,
        automaton,
        table,
    })
}
