//! Row-oriented projection of the automaton and the parse table.
//!
//! This is the data handed over to the renderers: item strings per state,
//! the transition list, and one row per state in each table where every
//! column maps to `"S<n>"`, `"R<n>"`, `"Accept"`, `"I<n>"` or `""`.

use crate::{
    grammar::{Grammar, NonterminalID, TerminalID},
    lr0::LR0Automaton,
    table::ParseTable,
    types::Map,
};
use serde::{ser::SerializeMap, Serialize, Serializer};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub states: Vec<Vec<String>>,
    pub transitions: Vec<TransitionRow>,
    pub action_table: Vec<TableRow>,
    pub goto_table: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRow {
    pub from: usize,
    pub to: usize,
    pub symbol: String,
}

/// A row of the action or goto table.
///
/// Serialized as a flat map: the `state` key first, then the cells in
/// column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub state: String,
    pub cells: Map<String, String>,
}

impl TableRow {
    /// Return the cell of `column`, or `None` if there is no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len() + 1))?;
        map.serialize_entry("state", &self.state)?;
        for (column, cell) in &self.cells {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// The columns of the action table: every terminal in the production
/// bodies in order of appearance, followed by `$`.
pub fn action_columns(g: &Grammar) -> Vec<TerminalID> {
    g.terminals
        .keys()
        .copied()
        .filter(|&t| t != TerminalID::EOI)
        .chain(Some(TerminalID::EOI))
        .collect()
}

/// The columns of the goto table: every nonterminal that heads a rule in
/// order of appearance, followed by the ones without any rule.
///
/// The trailing columns go beyond the rule heads: a nonterminal referenced
/// in a body but never defined still labels transitions, and its goto
/// entries would be lost otherwise. Such nonterminals are also reported by
/// [`Grammar::unresolved_nonterminals`], and a grammar without them gets
/// exactly one column per rule head.
///
/// The augmented start symbol never labels a transition and has no column.
pub fn goto_columns(g: &Grammar) -> Vec<NonterminalID> {
    let (mut columns, unresolved): (Vec<_>, Vec<_>) = g
        .nonterminals
        .keys()
        .copied()
        .filter(|&n| n != NonterminalID::START)
        .partition(|&n| g.is_defined(n));
    columns.extend(unresolved);
    columns
}

impl Output {
    pub fn new(g: &Grammar, lr0: &LR0Automaton, table: &ParseTable) -> Self {
        let states = lr0
            .states
            .values()
            .map(|state| {
                state
                    .items
                    .iter()
                    .map(|item| item.display(g).to_string())
                    .collect()
            })
            .collect();

        let transitions = lr0
            .transitions
            .iter()
            .map(|t| TransitionRow {
                from: t.from.index(),
                to: t.to.index(),
                symbol: g.symbol_name(t.symbol).to_owned(),
            })
            .collect();

        let action_columns = action_columns(g);
        let goto_columns = goto_columns(g);
        let mut action_table = Vec::with_capacity(table.states.len());
        let mut goto_table = Vec::with_capacity(table.states.len());
        for (id, row) in &table.states {
            action_table.push(TableRow {
                state: id.to_string(),
                cells: action_columns
                    .iter()
                    .map(|t| {
                        let cell = row.actions.get(t).map(ToString::to_string);
                        (g.terminal_name(*t).to_owned(), cell.unwrap_or_default())
                    })
                    .collect(),
            });
            goto_table.push(TableRow {
                state: id.to_string(),
                cells: goto_columns
                    .iter()
                    .map(|n| {
                        let cell = row.gotos.get(n).map(|next| format!("I{}", next));
                        (g.nonterminal_name(*n).to_owned(), cell.unwrap_or_default())
                    })
                    .collect(),
            });
        }

        Self {
            states,
            transitions,
            action_table,
            goto_table,
        }
    }
}
