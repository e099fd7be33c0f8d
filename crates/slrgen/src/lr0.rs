//! LR(0) items, item sets and the canonical collection.

use crate::{
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u32);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl StateID {
    /// The initial state, built from the closure of the augmented start item.
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The LR(0) item, a.k.a. LR item core.
///
/// Items are ordered by the rule index and then by the marker position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub rule: RuleID,
    pub index: u16,
}

impl LR0Item {
    /// `[S' -> . S]`
    pub const START: Self = Self {
        rule: RuleID::ACCEPT,
        index: 0,
    };

    /// The symbol right after the marker, or `None` if the item is complete.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.rule(self.rule).right.get(usize::from(self.index)).copied()
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        usize::from(self.index) >= g.rule(self.rule).right.len()
    }

    /// Move the marker over the next symbol.
    pub fn advance(self) -> Self {
        Self {
            index: self.index + 1,
            ..self
        }
    }

    // `"A -> a . B"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let rule = g.rule(self.rule);
            write!(f, "{} ->", g.nonterminal_name(rule.left))?;
            for (i, symbol) in rule.right.iter().enumerate() {
                if i == usize::from(self.index) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.is_complete(g) {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// A canonical set of LR(0) items: sorted and free of duplicates.
///
/// Two item sets are equal iff they contain the same items, regardless of
/// the order in which the items were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemSet {
    items: Vec<LR0Item>,
}

impl ItemSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, item: &LR0Item) -> bool {
        self.items.binary_search(item).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = LR0Item> + '_ {
        self.items.iter().copied()
    }

    pub fn as_slice(&self) -> &[LR0Item] {
        &self.items[..]
    }
}

impl FromIterator<LR0Item> for ItemSet {
    fn from_iter<I: IntoIterator<Item = LR0Item>>(iter: I) -> Self {
        let mut items: Vec<_> = iter.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self { items }
    }
}

/// Calculate the smallest item set that contains `items` and is closed
/// under the expansion of the nonterminal symbol after each marker.
pub fn closure<I>(g: &Grammar, items: I) -> ItemSet
where
    I: IntoIterator<Item = LR0Item>,
{
    let mut closure: Set<LR0Item> = items.into_iter().collect();
    let mut pending: Vec<LR0Item> = closure.iter().copied().collect();
    while let Some(item) = pending.pop() {
        // [X -> ... . Y β] に対し Y -> γ のすべてについて [Y -> . γ] を加える
        let Some(SymbolID::N(n)) = item.next_symbol(g) else { continue };
        for (rule, _) in g.rules_of(n) {
            let new_item = LR0Item { rule, index: 0 };
            if closure.insert(new_item) {
                pending.push(new_item);
            }
        }
    }
    closure.into_iter().collect()
}

/// Calculate the item set reached from `items` by reading `symbol`.
///
/// The result is empty iff no item in `items` expects `symbol`, which means
/// that there is no transition on `symbol`.
pub fn goto(g: &Grammar, items: &ItemSet, symbol: SymbolID) -> ItemSet {
    closure(
        g,
        items
            .iter()
            .filter(|item| item.next_symbol(g) == Some(symbol))
            .map(LR0Item::advance),
    )
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: StateID,
    pub to: StateID,
    pub symbol: SymbolID,
}

#[derive(Debug, Clone)]
pub struct LR0State {
    pub items: ItemSet,
    pub shifts: Map<TerminalID, StateID>,
    pub gotos: Map<NonterminalID, StateID>,
    /// The rules of the complete items, in item order.
    pub reduces: Vec<RuleID>,
}

impl LR0State {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## items:")?;
            for item in self.items.iter() {
                writeln!(f, "- {}", item.display(g))?;
            }
            if !self.shifts.is_empty() {
                writeln!(f, "## shifts:")?;
                for (&t, to) in &self.shifts {
                    writeln!(f, "- {} => {:?}", g.terminal_name(t), to)?;
                }
            }
            if !self.gotos.is_empty() {
                writeln!(f, "## gotos:")?;
                for (&n, to) in &self.gotos {
                    writeln!(f, "- {} => {:?}", g.nonterminal_name(n), to)?;
                }
            }
            if !self.reduces.is_empty() {
                writeln!(f, "## reduces:")?;
                for &reduce in &self.reduces {
                    writeln!(f, "- {}", g.rule(reduce).display(g))?;
                }
            }
            Ok(())
        })
    }
}

/// The canonical collection of LR(0) item sets and the transitions between them.
#[derive(Debug)]
pub struct LR0Automaton {
    pub states: Map<StateID, LR0State>,
    pub transitions: Vec<Transition>,
}

impl LR0Automaton {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Calculate the LR(0) automaton based on the specified grammar.
///
/// States are numbered in the order of discovery, and processed in the
/// same order, starting from the closure of `[S' -> . S]`.
#[tracing::instrument(skip_all)]
pub fn lr0(g: &Grammar) -> LR0Automaton {
    let mut state_id = {
        let mut next_state_id = 0;
        move || {
            let id = StateID(next_state_id);
            next_state_id += 1;
            id
        }
    };

    let mut isocores = Map::<ItemSet, StateID>::default();
    isocores.insert(closure(g, Some(LR0Item::START)), state_id());

    let mut states = Map::<StateID, LR0State>::default();
    let mut transitions = vec![];
    let mut symbols = Set::<SymbolID>::default();
    let mut current = 0;
    while let Some((items, &id)) = isocores.get_index(current) {
        let items = items.clone();
        current += 1;

        symbols.clear();
        let mut reduces = vec![];
        for item in items.iter() {
            match item.next_symbol(g) {
                Some(symbol) => {
                    symbols.insert(symbol);
                }
                None => reduces.push(item.rule),
            }
        }

        let mut shifts = Map::default();
        let mut gotos = Map::default();
        for &symbol in &symbols {
            let next_items = goto(g, &items, symbol);
            if next_items.is_empty() {
                continue;
            }
            let next = match isocores.get(&next_items) {
                Some(&next) => next,
                None => {
                    let next = state_id();
                    tracing::trace!("discovered {:?} from {:?}", next, id);
                    isocores.insert(next_items, next);
                    next
                }
            };
            match symbol {
                SymbolID::T(t) => {
                    shifts.insert(t, next);
                }
                SymbolID::N(n) => {
                    gotos.insert(n, next);
                }
            }
            transitions.push(Transition {
                from: id,
                to: next,
                symbol,
            });
        }

        states.insert(
            id,
            LR0State {
                items,
                shifts,
                gotos,
                reduces,
            },
        );
    }
    tracing::debug!(
        "{} states, {} transitions",
        states.len(),
        transitions.len()
    );

    LR0Automaton {
        states,
        transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(g: &Grammar, items: &ItemSet) -> Vec<String> {
        items.iter().map(|item| item.display(g).to_string()).collect()
    }

    fn symbol(g: &Grammar, name: &str) -> SymbolID {
        let t = g.terminals.iter().find(|(_, t)| *t == name).map(|(id, _)| SymbolID::T(*id));
        let n = g.nonterminals.iter().find(|(_, n)| *n == name).map(|(id, _)| SymbolID::N(*id));
        t.or(n).unwrap()
    }

    fn arithmetic() -> Grammar {
        Grammar::augment(&rules![
            "E" => ["E", "+", "T"],
            "E" => ["T"],
            "T" => ["T", "*", "F"],
            "T" => ["F"],
            "F" => ["a"],
        ])
        .unwrap()
    }

    #[test]
    fn closure_of_start_item() {
        let g = arithmetic();
        let items = closure(&g, Some(LR0Item::START));
        assert_eq!(
            render(&g, &items),
            [
                "E' -> . E",
                "E -> . E + T",
                "E -> . T",
                "T -> . T * F",
                "T -> . F",
                "F -> . a",
            ]
        );
    }

    #[test]
    fn closure_is_idempotent() {
        let g = arithmetic();
        let once = closure(&g, Some(LR0Item::START));
        let twice = closure(&g, once.iter());
        assert_eq!(once, twice);
    }

    #[test]
    fn item_set_is_canonical() {
        let a = LR0Item::START;
        let b = a.advance();
        let left: ItemSet = [b, a, b].into_iter().collect();
        let right: ItemSet = [a, b].into_iter().collect();
        assert_eq!(left, right);
        assert_eq!(left.as_slice(), &[a, b]);
        assert!(left.contains(&b));
    }

    #[test]
    fn goto_advances_marker() {
        let g = arithmetic();
        let start = closure(&g, Some(LR0Item::START));

        let items = goto(&g, &start, symbol(&g, "E"));
        assert_eq!(render(&g, &items), ["E' -> E .", "E -> E . + T"]);

        let items = goto(&g, &items, symbol(&g, "+"));
        assert_eq!(
            render(&g, &items),
            ["E -> E + . T", "T -> . T * F", "T -> . F", "F -> . a"]
        );

        // goto is deterministic.
        assert_eq!(items, goto(&g, &goto(&g, &start, symbol(&g, "E")), symbol(&g, "+")));
    }

    #[test]
    fn goto_without_transition_is_empty() {
        let g = arithmetic();
        let start = closure(&g, Some(LR0Item::START));
        assert!(goto(&g, &start, symbol(&g, "+")).is_empty());
        assert!(goto(&g, &start, symbol(&g, "$")).is_empty());
    }

    #[test]
    fn epsilon_item_display() {
        let g = Grammar::augment(&rules!["S" => ["A", "b"], "A" => []]).unwrap();
        let items = closure(&g, Some(LR0Item::START));
        assert_eq!(render(&g, &items), ["S' -> . S", "S -> . A b", "A -> ."]);
    }

    #[test]
    fn canonical_collection() {
        let g = Grammar::augment(&rules!["S" => ["A", "B"], "A" => ["a"], "B" => ["b"]]).unwrap();
        let lr0 = lr0(&g);

        assert_eq!(lr0.states.len(), 6);
        let transitions: Vec<_> = lr0
            .transitions
            .iter()
            .map(|t| (t.from.index(), t.to.index(), g.symbol_name(t.symbol)))
            .collect();
        assert_eq!(
            transitions,
            [(0, 1, "S"), (0, 2, "A"), (0, 3, "a"), (2, 4, "B"), (2, 5, "b")]
        );

        let reduces: Vec<_> = lr0
            .states
            .values()
            .map(|state| state.reduces.iter().map(|r| r.index()).collect::<Vec<_>>())
            .collect();
        assert_eq!(reduces, [vec![], vec![0], vec![], vec![2], vec![1], vec![3]]);
    }

    #[test]
    fn unreachable_rules_produce_no_states() {
        let g = Grammar::augment(&rules!["S" => ["a"], "U" => ["b", "U"]]).unwrap();
        let lr0 = lr0(&g);

        assert_eq!(lr0.states.len(), 3);
        for state in lr0.states.values() {
            assert!(state.items.iter().all(|item| item.rule.index() < 2));
        }
    }
}
