//! Calculation of SLR(1) parse table.

use crate::{
    follow_sets::FollowSets,
    grammar::{Grammar, NonterminalID, RuleID, TerminalID},
    lr0::{LR0Automaton, StateID},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(RuleID),

    Accept,
}

// `"S<n>"`, `"R<n>"` or `"Accept"`
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(next) => write!(f, "S{}", next),
            Self::Reduce(rule) => write!(f, "R{}", rule),
            Self::Accept => f.write_str("Accept"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    /// The accept action competes with a reduction on the end of input.
    AcceptReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => f.write_str("shift/reduce"),
            Self::ReduceReduce => f.write_str("reduce/reduce"),
            Self::AcceptReduce => f.write_str("accept/reduce"),
        }
    }
}

/// A table cell written more than once during the construction.
///
/// The later action wins; `previous` is the action it has overwritten.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub terminal: TerminalID,
    pub previous: Action,
    pub current: Action,
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match (self.previous, self.current) {
            (Action::Accept, _) | (_, Action::Accept) => ConflictKind::AcceptReduce,
            (Action::Reduce(..), Action::Reduce(..)) => ConflictKind::ReduceReduce,
            _ => ConflictKind::ShiftReduce,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "{} conflict in state {} on `{}': {} was overwritten by {}",
                self.kind(),
                self.state,
                g.terminal_name(self.terminal),
                self.previous,
                self.current,
            )
        })
    }
}

#[derive(Debug, Default)]
#[non_exhaustive]
pub struct ParseTableRow {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, ParseTableRow>,
    /// Every overwritten cell, in the order of construction.
    pub conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn action(&self, state: StateID, t: TerminalID) -> Option<Action> {
        self.states.get(&state)?.actions.get(&t).copied()
    }

    pub fn goto(&self, state: StateID, n: NonterminalID) -> Option<StateID> {
        self.states.get(&state)?.gotos.get(&n).copied()
    }

    /// Return whether no cell has been written more than once, i.e. the grammar is SLR(1).
    pub fn is_consistent(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }

                writeln!(f, "#### State {:?}", id)?;
                writeln!(f, "## actions")?;
                for (&t, action) in &row.actions {
                    let token = g.terminal_name(t);
                    match action {
                        Action::Shift(n) => writeln!(f, "- {} => shift({:?})", token, n)?,
                        Action::Reduce(rule) => writeln!(
                            f,
                            "- {} => reduce({})",
                            token,
                            g.rule(*rule).display(g)
                        )?,
                        Action::Accept => writeln!(f, "- {} => accept", token)?,
                    }
                }

                writeln!(f, "## gotos")?;
                for (&n, goto) in &row.gotos {
                    writeln!(f, "- {} => goto({:?})", g.nonterminal_name(n), goto)?;
                }
            }

            if !self.conflicts.is_empty() {
                writeln!(f, "\n## conflicts")?;
                for conflict in &self.conflicts {
                    writeln!(f, "- {}", conflict.display(g))?;
                }
            }
            Ok(())
        })
    }
}

/// Derive the SLR(1) action and goto tables from the LR(0) automaton.
///
/// Within a state, shifts are written first, then the complete items in
/// item order: `[S' -> S .]` writes accept on `$`, any other `[A -> γ .]`
/// writes a reduction on every terminal in `FOLLOW(A)`. A cell written twice
/// keeps the last action and the overwrite is recorded as a conflict.
#[tracing::instrument(skip_all)]
pub fn generate(g: &Grammar, lr0: &LR0Automaton, follow_sets: &FollowSets) -> ParseTable {
    let mut states = Map::default();
    let mut conflicts = vec![];
    for (&id, lr0_state) in &lr0.states {
        let mut row = ParseTableRow::default();

        for (&t, &next) in &lr0_state.shifts {
            row.actions.insert(t, Action::Shift(next));
        }
        for (&n, &next) in &lr0_state.gotos {
            row.gotos.insert(n, next);
        }

        let mut write = |t: TerminalID, current: Action| {
            if let Some(previous) = row.actions.insert(t, current) {
                if previous != current {
                    let conflict = Conflict {
                        state: id,
                        terminal: t,
                        previous,
                        current,
                    };
                    tracing::debug!("{}", conflict.display(g));
                    conflicts.push(conflict);
                }
            }
        };
        for &reduce in &lr0_state.reduces {
            if reduce == RuleID::ACCEPT {
                write(TerminalID::EOI, Action::Accept);
                continue;
            }
            let left = g.rule(reduce).left;
            if let Some(follow) = follow_sets.get(left) {
                for t in follow.iter() {
                    write(t, Action::Reduce(reduce));
                }
            }
        }

        states.insert(id, row);
    }

    ParseTable { states, conflicts }
}
