use anyhow::Context as _;
use slrgen::{grammar::RuleDef, table::Action, Tables};
use std::{collections::HashSet, env, fs, path::PathBuf};

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() -> anyhow::Result<()> {
            let rules = load(concat!("tests/grammars/", stringify!($name), ".json"))?;
            let tables = slrgen::compute(&rules)?;
            eprintln!("{}", tables.display());
            check_tables(&tables);
            check_deterministic(&rules, &tables)?;
            Ok(())
        }
    )*};
}

define_tests! {
    simple,
    arithmetic,
    arithmetic_paren,
    epsilon,
    unreachable,
    ambiguous,
    json,
    statements,
    cyclic,
    duplicates,
}

fn load(path: &str) -> anyhow::Result<Vec<RuleDef>> {
    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join(path);
    let source =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("failed to parse {}", path.display()))
}

fn cell_index(cell: &str, prefix: char) -> Option<usize> {
    cell.strip_prefix(prefix)?.parse().ok()
}

fn check_tables(tables: &Tables) {
    let output = tables.to_output();
    let num_states = output.states.len();
    let num_rules = tables.grammar.rules.len();

    assert_eq!(num_states, tables.automaton.states.len());
    assert_eq!(output.action_table.len(), num_states);
    assert_eq!(output.goto_table.len(), num_states);

    let mut num_accepts = 0;
    for (i, row) in output.action_table.iter().enumerate() {
        assert_eq!(row.state, i.to_string());
        assert!(row.get("ε").is_none());
        for (column, cell) in &row.cells {
            if cell == "Accept" {
                assert_eq!(column, "$");
                num_accepts += 1;
            } else if let Some(next) = cell_index(cell, 'S') {
                assert!(next < num_states, "{}", cell);
            } else if let Some(rule) = cell_index(cell, 'R') {
                assert!(rule > 0 && rule < num_rules, "{}", cell);
            } else {
                assert_eq!(cell, "");
            }
        }
    }
    // the accept action is written once, unless a reduction overwrote it.
    let num_overwritten = tables
        .table
        .conflicts
        .iter()
        .filter(|conflict| conflict.previous == Action::Accept)
        .count();
    assert_eq!(num_accepts + num_overwritten, 1);

    for items in &output.states {
        let unique: HashSet<_> = items.iter().collect();
        assert_eq!(unique.len(), items.len(), "{:?}", items);
    }

    for row in &output.goto_table {
        for cell in row.cells.values() {
            if !cell.is_empty() {
                let next = cell_index(cell, 'I').unwrap();
                assert!(next < num_states, "{}", cell);
            }
        }
    }

    // every transition on a nonterminal shows up in the goto table.
    for t in &output.transitions {
        if let Some(cell) = output.goto_table[t.from].get(&t.symbol) {
            assert_eq!(cell, format!("I{}", t.to));
        }
    }
}

fn check_deterministic(rules: &[RuleDef], tables: &Tables) -> anyhow::Result<()> {
    let expected = serde_json::to_string(&tables.to_output())?;
    let actual = serde_json::to_string(&slrgen::compute(rules)?.to_output())?;
    assert_eq!(actual, expected);
    Ok(())
}
