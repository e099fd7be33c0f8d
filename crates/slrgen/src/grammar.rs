//! Context-free grammars and their augmentation.

use crate::{
    types::{Map, Set},
    util::display_fn,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of the reserved terminal symbol that means the end of input.
pub const END_OF_INPUT: &str = "$";

/// The name of the reserved marker of the empty string.
pub const EPSILON: &str = "ε";

/// Return whether `symbol` is a nonterminal symbol.
///
/// A nonterminal symbol is written as exactly one uppercase ASCII letter.
/// Any other string (lowercase letters, multi-character words, punctuation)
/// is a terminal symbol.
pub fn is_nonterminal(symbol: &str) -> bool {
    matches!(symbol.as_bytes(), [ch] if ch.is_ascii_uppercase())
}

/// Return whether `symbol` is a terminal symbol.
pub fn is_terminal(symbol: &str) -> bool {
    !is_nonterminal(symbol)
}

// ==== symbols ====

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalID(u16);
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.0
    }
}
impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

/// A set of terminal symbols.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}
impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.0.into())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.0.into())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| u16::try_from(raw).ok().map(TerminalID))
    }

    /// Union `other` into this set and report whether anything was added.
    pub(crate) fn extend_from(&mut self, other: &Self) -> bool {
        let len = self.len();
        self.union_with(other);
        self.len() != len
    }
}
impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.0.into()).collect(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalID(u16);
impl NonterminalID {
    /// Reserved symbol used as the fresh start symbol of the augmented grammar.
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;
}
impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

/// A grammar symbol, classified once when the grammar is loaded.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

// ==== production rules ====

/// The position of a production rule in the augmented rule sequence.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleID(u16);
impl RuleID {
    /// The augmented start rule `S' -> S`, always at index 0.
    pub const ACCEPT: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
impl fmt::Debug for RuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::ACCEPT => write!(f, "P#Accept"),
            _ => write!(f, "P#{:03}", self.0),
        }
    }
}
impl fmt::Display for RuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A production rule as supplied by the caller, before symbol classification.
///
/// An empty `body` denotes an ε-production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDef {
    pub head: String,
    #[serde(default)]
    pub body: Vec<String>,
}

impl RuleDef {
    pub fn new<I, S>(head: impl Into<String>, body: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            head: head.into(),
            body: body.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an ε-production for `head`.
    pub fn epsilon(head: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            body: vec![],
        }
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct Rule {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
}

impl Rule {
    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", g.nonterminal_name(self.left))?;
            if self.right.is_empty() {
                return write!(f, " {}", EPSILON);
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

// ==== grammar ====

/// The augmented grammar used to derive the parser tables.
///
/// The rule at [`RuleID::ACCEPT`] is the fresh start rule `S' -> S`; the
/// remaining rules keep their input order, shifted by one.
///
/// A rule repeated in the input keeps its index, but only the last copy
/// takes part in the automaton, so that items with the same head, body and
/// marker position are the same item.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, String>,
    pub nonterminals: Map<NonterminalID, String>,
    pub rules: Map<RuleID, Rule>,
    pub start_symbol: NonterminalID,
    shadowed: Set<RuleID>,
}

impl Grammar {
    /// Classify the symbols of `defs` and prepend the augmented start rule.
    ///
    /// The head of the first rule is the start symbol of the grammar. The
    /// input is left untouched.
    pub fn augment(defs: &[RuleDef]) -> Result<Self, GrammarError> {
        let start = defs.first().ok_or(GrammarError::EmptyGrammar)?;

        for (index, def) in defs.iter().enumerate() {
            if !is_nonterminal(&def.head) {
                return Err(GrammarError::InvalidHead {
                    index,
                    head: def.head.clone(),
                });
            }
            for symbol in &def.body {
                match symbol.as_str() {
                    "" => return Err(GrammarError::EmptySymbol { index }),
                    END_OF_INPUT | EPSILON => {
                        return Err(GrammarError::ReservedSymbol {
                            index,
                            symbol: symbol.clone(),
                        })
                    }
                    _ => (),
                }
            }
            if u16::try_from(def.body.len()).is_err() {
                return Err(GrammarError::Capacity {
                    what: "symbols in a production body",
                });
            }
        }

        // The fresh start symbol must not collide with any symbol in use.
        let names: Set<&str> = defs
            .iter()
            .flat_map(|def| {
                Some(def.head.as_str())
                    .into_iter()
                    .chain(def.body.iter().map(String::as_str))
            })
            .collect();
        let mut start_name = format!("{}'", start.head);
        while names.contains(start_name.as_str()) {
            start_name.push('\'');
        }

        let mut def = GrammarDef::new(start_name);
        // Heads are registered first so that the defined nonterminals come
        // before the ones only referenced from production bodies.
        for rule in defs {
            def.nonterminal(&rule.head)?;
        }
        for rule in defs {
            let left = def.nonterminal(&rule.head)?;
            let right = rule
                .body
                .iter()
                .map(|symbol| def.symbol(symbol))
                .collect::<Result<Vec<_>, _>>()?;
            def.rule(left, right)?;
        }
        let start_symbol = def.nonterminal(&start.head)?;

        Ok(def.end(start_symbol))
    }

    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    /// Iterate over the rules whose head is `n`, in rule order.
    ///
    /// Of identical rules only the last one is yielded.
    pub fn rules_of(&self, n: NonterminalID) -> impl Iterator<Item = (RuleID, &Rule)> + '_ {
        self.rules
            .iter()
            .filter(move |(id, rule)| rule.left == n && !self.shadowed.contains(*id))
            .map(|(id, rule)| (*id, rule))
    }

    /// Return whether the rule is superseded by a later rule with the same head and body.
    pub fn is_shadowed(&self, id: RuleID) -> bool {
        self.shadowed.contains(&id)
    }

    pub fn terminal_name(&self, t: TerminalID) -> &str {
        self.terminals.get(&t).map_or("<unknown>", String::as_str)
    }

    pub fn nonterminal_name(&self, n: NonterminalID) -> &str {
        self.nonterminals.get(&n).map_or("<unknown>", String::as_str)
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminal_name(t),
            SymbolID::N(n) => self.nonterminal_name(n),
        }
    }

    /// Return whether the nonterminal has at least one production rule.
    pub fn is_defined(&self, n: NonterminalID) -> bool {
        self.rules.values().any(|rule| rule.left == n)
    }

    /// Nonterminals referenced in some production body without any production rule.
    pub fn unresolved_nonterminals(&self) -> Vec<NonterminalID> {
        self.nonterminals
            .keys()
            .copied()
            .filter(|&n| !self.is_defined(n))
            .collect()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for name in self.terminals.values() {
            writeln!(f, "{}", name)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for (&id, name) in &self.nonterminals {
            write!(f, "{}", name)?;
            if id == self.start_symbol {
                write!(f, " (start)")?;
            }
            if !self.is_defined(id) {
                write!(f, " (unresolved)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for (&id, rule) in &self.rules {
            write!(f, "{}: {}", id, rule.display(self))?;
            if self.is_shadowed(id) {
                write!(f, " (duplicate)")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
struct GrammarDef {
    terminals: Map<TerminalID, String>,
    nonterminals: Map<NonterminalID, String>,
    rules: Map<RuleID, Rule>,
    terminal_ids: Map<String, TerminalID>,
    nonterminal_ids: Map<String, NonterminalID>,
    rule_ids: Map<Rule, RuleID>,
    shadowed: Set<RuleID>,
    next_terminal_id: u32,
    next_nonterminal_id: u32,
    next_rule_id: u32,
}

impl GrammarDef {
    fn new(start_name: String) -> Self {
        let mut def = Self {
            terminals: Map::default(),
            nonterminals: Map::default(),
            rules: Map::default(),
            terminal_ids: Map::default(),
            nonterminal_ids: Map::default(),
            rule_ids: Map::default(),
            shadowed: Set::default(),
            next_terminal_id: TerminalID::OFFSET.into(),
            next_nonterminal_id: NonterminalID::OFFSET.into(),
            next_rule_id: RuleID::OFFSET.into(),
        };
        def.terminals
            .insert(TerminalID::EOI, END_OF_INPUT.to_owned());
        def.nonterminals.insert(NonterminalID::START, start_name);
        def
    }

    fn symbol(&mut self, name: &str) -> Result<SymbolID, GrammarError> {
        if is_nonterminal(name) {
            self.nonterminal(name).map(SymbolID::N)
        } else {
            self.terminal(name).map(SymbolID::T)
        }
    }

    /// Declare a terminal symbol used in this grammar.
    fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarError> {
        if let Some(&id) = self.terminal_ids.get(name) {
            return Ok(id);
        }
        let id = u16::try_from(self.next_terminal_id)
            .map(TerminalID)
            .map_err(|_| GrammarError::Capacity {
                what: "terminal symbols",
            })?;
        self.next_terminal_id += 1;
        self.terminals.insert(id, name.to_owned());
        self.terminal_ids.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarError> {
        if let Some(&id) = self.nonterminal_ids.get(name) {
            return Ok(id);
        }
        let id = u16::try_from(self.next_nonterminal_id)
            .map(NonterminalID)
            .map_err(|_| GrammarError::Capacity {
                what: "nonterminal symbols",
            })?;
        self.next_nonterminal_id += 1;
        self.nonterminals.insert(id, name.to_owned());
        self.nonterminal_ids.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Specify a production rule into this grammer.
    fn rule(&mut self, left: NonterminalID, right: Vec<SymbolID>) -> Result<RuleID, GrammarError> {
        let id = u16::try_from(self.next_rule_id)
            .map(RuleID)
            .map_err(|_| GrammarError::Capacity {
                what: "production rules",
            })?;
        self.next_rule_id += 1;

        let rule = Rule { left, right };
        if let Some(previous) = self.rule_ids.insert(rule.clone(), id) {
            tracing::trace!("{:?} is superseded by the identical rule {:?}", previous, id);
            self.shadowed.insert(previous);
        }
        self.rules.insert(id, rule);
        Ok(id)
    }

    fn end(mut self, start: NonterminalID) -> Grammar {
        self.rules.insert(
            RuleID::ACCEPT,
            Rule {
                left: NonterminalID::START,
                right: vec![SymbolID::N(start)],
            },
        );
        self.rules.sort_keys();

        Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            rules: self.rules,
            start_symbol: start,
            shadowed: self.shadowed,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GrammarError {
    #[error("the grammar has no production rules")]
    EmptyGrammar,

    #[error("rule #{index}: the head `{head}' is not a single uppercase letter")]
    InvalidHead { index: usize, head: String },

    #[error("rule #{index}: the reserved symbol `{symbol}' must not appear in a production body")]
    ReservedSymbol { index: usize, symbol: String },

    #[error("rule #{index}: empty symbol in the production body")]
    EmptySymbol { index: usize },

    #[error("too many {what}")]
    Capacity { what: &'static str },
}
