//! Hierarchical grammar-inducing text decomposer (spec §4.6): a
//! Sequitur-family algorithm over a doubly-linked symbol sequence that
//! discovers repeated digrams and coins a shared composition for each
//! one, so the same substring found in two different inputs resolves
//! to the same node.
//!
//! The classic Sequitur data structure (a doubly-linked list with a
//! digram hash table) is implemented directly over `Vec`-backed slots
//! with explicit prev/next indices rather than `Rc<RefCell<_>>` nodes —
//! it is single-threaded per input (§5), so there is no need to pay for
//! interior mutability across threads.

use std::collections::HashMap;

use substrate_core::node::{CompositionGeometry, NodeHandle, NodeId, NodeRef};
use substrate_core::point::Point4;
use substrate_core::seed::Seed;
use substrate_core::store::{ChildRun, NodeStore};
use substrate_core::{Result, SubstrateError};

const NONE: usize = usize::MAX;

/// One symbol in the working sequence: either a terminal (a constant
/// that came straight from the input) or a non-terminal (a coined
/// composition, referenced by its rule index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Terminal(NodeId, [u8; 32]),
    NonTerminal(usize),
}

#[derive(Debug, Clone)]
struct Slot {
    symbol: Symbol,
    prev: usize,
    next: usize,
}

/// A coined rule: a 2-symbol production `A -> X Y`, with a live usage
/// count used to decide when to inline it back (usage count 1).
#[derive(Debug, Clone)]
struct Rule {
    left: Symbol,
    right: Symbol,
    usage: u32,
    /// Slot indices currently holding `Symbol::NonTerminal(this rule)`.
    /// May contain stale entries whose slot has since been overwritten;
    /// `inline_rule` checks the slot's current symbol before trusting one.
    occurrences: Vec<usize>,
    /// Set once usage fell to 1 and the rule was spliced back into the
    /// sequence. An inlined rule is never reused by `find_or_coin_rule`.
    inlined: bool,
    /// Set once the rule has been published to the store.
    handle: Option<NodeHandle>,
}

/// Runs grammar induction over `seeds` and publishes the discovered
/// grammar's rules (and the top-level sequence) to `store`, returning
/// the root node whose reconstruction yields `seeds` exactly.
pub fn decompose<S: NodeStore>(store: &S, seeds: &[Seed]) -> Result<NodeHandle> {
    if seeds.is_empty() {
        return Err(SubstrateError::Precondition(
            "cannot decompose an empty seed sequence".to_string(),
        ));
    }

    if seeds.len() == 1 {
        return store.get_or_insert_constant(seeds[0]);
    }

    let mut engine = Engine::new(store);
    for &seed in seeds {
        engine.append_terminal(seed)?;
    }
    engine.finish()
}

struct Engine<'a, S: NodeStore> {
    store: &'a S,
    slots: Vec<Slot>,
    head: usize,
    tail: usize,
    digrams: HashMap<(Symbol, Symbol), usize>,
    rules: Vec<Rule>,
}

impl<'a, S: NodeStore> Engine<'a, S> {
    fn new(store: &'a S) -> Self {
        Self {
            store,
            slots: Vec::new(),
            head: NONE,
            tail: NONE,
            digrams: HashMap::new(),
            rules: Vec::new(),
        }
    }

    fn append_terminal(&mut self, seed: Seed) -> Result<()> {
        let handle = self.store.get_or_insert_constant(seed)?;
        let symbol = Symbol::Terminal(handle.id(), *handle.content_hash.as_bytes());
        self.push_back(symbol)?;
        Ok(())
    }

    fn push_back(&mut self, symbol: Symbol) -> Result<()> {
        let slot = Slot {
            symbol,
            prev: self.tail,
            next: NONE,
        };
        let idx = self.slots.len();
        self.slots.push(slot);
        if self.tail != NONE {
            self.slots[self.tail].next = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;

        if self.slots[idx].prev != NONE {
            self.handle_new_digram(self.slots[idx].prev)?;
        }
        Ok(())
    }

    /// A new adjacency was just formed ending at `left_idx`'s slot.
    /// Either register it as the digram's sole known occurrence, or —
    /// if that digram already has a live occurrence elsewhere —
    /// replace both occurrences with a coined rule symbol.
    fn handle_new_digram(&mut self, left_idx: usize) -> Result<()> {
        let right_idx = self.slots[left_idx].next;
        if right_idx == NONE {
            return Ok(());
        }
        let left = self.slots[left_idx].symbol;
        let right = self.slots[right_idx].symbol;
        let key = (left, right);

        if let Some(&existing_left_idx) = self.digrams.get(&key) {
            if existing_left_idx != left_idx && self.slots_still_adjacent(existing_left_idx) {
                self.replace_occurrence(existing_left_idx, left, right)?;
                self.replace_occurrence(left_idx, left, right)?;
                return Ok(());
            }
        }
        self.digrams.insert(key, left_idx);
        Ok(())
    }

    fn slots_still_adjacent(&self, left_idx: usize) -> bool {
        self.slots[left_idx].next != NONE
    }

    /// Replaces the digram starting at `left_idx` with a single
    /// non-terminal symbol for `(left, right)`, coining a new rule the
    /// first time this digram is collapsed and bumping its usage
    /// count on subsequent collapses. `left`/`right` themselves are
    /// released: if either was a non-terminal, absorbing it here
    /// removes one of its occurrences from the sequence, and a rule
    /// whose usage falls to 1 is inlined back.
    fn replace_occurrence(&mut self, left_idx: usize, left: Symbol, right: Symbol) -> Result<()> {
        let right_idx = self.slots[left_idx].next;
        if right_idx == NONE || self.slots[right_idx].symbol != right {
            // Already collapsed (e.g. overlapping occurrence consumed
            // by an earlier replacement in this same call).
            return Ok(());
        }

        let rule_idx = self.find_or_coin_rule(left, right);
        self.rules[rule_idx].usage += 1;
        self.rules[rule_idx].occurrences.push(left_idx);

        let before = self.slots[left_idx].prev;
        let after = self.slots[right_idx].next;

        self.slots[left_idx].symbol = Symbol::NonTerminal(rule_idx);
        self.slots[left_idx].next = after;
        if after != NONE {
            self.slots[after].prev = left_idx;
        } else {
            self.tail = left_idx;
        }

        // Stale digram table entries pointing at the now-removed
        // right_idx are left in place; lookups check adjacency is
        // still live before trusting them (`slots_still_adjacent`
        // plus the symbol-equality check in `replace_occurrence`).
        let _ = right_idx;

        self.release_symbol(left)?;
        self.release_symbol(right)?;

        if before != NONE {
            self.handle_new_digram(before)?;
        }
        self.handle_new_digram(left_idx)?;
        Ok(())
    }

    /// One occurrence of `symbol` just left the sequence (absorbed into
    /// a newly coined digram rule). If `symbol` is a non-terminal, this
    /// is one fewer place it's used; inline it once usage falls to 1.
    fn release_symbol(&mut self, symbol: Symbol) -> Result<()> {
        if let Symbol::NonTerminal(rule_idx) = symbol {
            let rule = &mut self.rules[rule_idx];
            if rule.inlined || rule.handle.is_some() {
                return Ok(());
            }
            rule.usage -= 1;
            let usage = rule.usage;
            if usage == 1 {
                self.inline_rule(rule_idx)?;
            }
        }
        Ok(())
    }

    /// Splices a rule's sole remaining occurrence back into its two
    /// constituent symbols once its usage count falls to 1. A rule
    /// used only once buys no sharing, so it is not worth the
    /// indirection.
    fn inline_rule(&mut self, rule_idx: usize) -> Result<()> {
        let Some(idx) = self.rules[rule_idx]
            .occurrences
            .iter()
            .rev()
            .copied()
            .find(|&idx| self.slots[idx].symbol == Symbol::NonTerminal(rule_idx))
        else {
            // Both occurrences were already replaced by the time the
            // count reached 1 (e.g. consumed in the same digram sweep);
            // nothing left to splice.
            return Ok(());
        };

        let (left, right) = (self.rules[rule_idx].left, self.rules[rule_idx].right);
        self.rules[rule_idx].inlined = true;

        let before = self.slots[idx].prev;
        let after = self.slots[idx].next;

        self.slots[idx].symbol = left;
        if let Symbol::NonTerminal(left_rule) = left {
            self.rules[left_rule].occurrences.push(idx);
        }

        let right_slot_idx = self.slots.len();
        self.slots.push(Slot {
            symbol: right,
            prev: idx,
            next: after,
        });
        if let Symbol::NonTerminal(right_rule) = right {
            self.rules[right_rule].occurrences.push(right_slot_idx);
        }
        self.slots[idx].next = right_slot_idx;
        if after != NONE {
            self.slots[after].prev = right_slot_idx;
        } else {
            self.tail = right_slot_idx;
        }

        if before != NONE {
            self.handle_new_digram(before)?;
        }
        self.handle_new_digram(idx)?;
        Ok(())
    }

    fn find_or_coin_rule(&mut self, left: Symbol, right: Symbol) -> usize {
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.left == left && rule.right == right && rule.handle.is_none() && !rule.inlined {
                return idx;
            }
        }
        let idx = self.rules.len();
        self.rules.push(Rule {
            left,
            right,
            usage: 0,
            occurrences: Vec::new(),
            inlined: false,
            handle: None,
        });
        idx
    }

    /// Flattens the final top-level sequence (with RLE over adjacent
    /// equal symbols) and publishes every referenced rule bottom-up,
    /// then the top-level composition itself.
    fn finish(mut self) -> Result<NodeHandle> {
        let mut top_level = Vec::new();
        let mut cursor = self.head;
        while cursor != NONE {
            top_level.push(self.slots[cursor].symbol);
            cursor = self.slots[cursor].next;
        }

        if top_level.len() == 1 {
            if let Symbol::NonTerminal(rule_idx) = top_level[0] {
                return self.publish_rule(rule_idx);
            }
        }

        let runs = run_length_encode(&top_level);
        let mut child_runs = Vec::with_capacity(runs.len());
        for (symbol, multiplicity) in runs {
            let handle = self.resolve_symbol(symbol)?;
            child_runs.push(ChildRun {
                child: handle.node,
                content_hash: handle.content_hash,
                multiplicity,
            });
        }

        let points: Vec<Point4> = {
            let mut pts = Vec::with_capacity(child_runs.len());
            for run in &child_runs {
                pts.push(self.position_of(run.child)?);
            }
            pts
        };
        let geometry = if points.len() <= 1 {
            CompositionGeometry::Point(points.first().copied().unwrap_or(Point4::new(0.0, 0.0, 0.0, 1.0)))
        } else {
            CompositionGeometry::Trajectory(points)
        };

        self.store.get_or_insert_composition(&child_runs, None, geometry)
    }

    fn resolve_symbol(&mut self, symbol: Symbol) -> Result<NodeHandle> {
        match symbol {
            Symbol::Terminal(id, hash) => Ok(NodeHandle {
                node: NodeRef::Constant(id),
                content_hash: substrate_core::hash::ContentHash::from_bytes(hash),
                position: self.position_of(NodeRef::Constant(id))?,
            }),
            Symbol::NonTerminal(rule_idx) => self.publish_rule(rule_idx),
        }
    }

    fn publish_rule(&mut self, rule_idx: usize) -> Result<NodeHandle> {
        if let Some(handle) = self.rules[rule_idx].handle {
            return Ok(handle);
        }
        let (left, right) = (self.rules[rule_idx].left, self.rules[rule_idx].right);
        let left_handle = self.resolve_symbol(left)?;
        let right_handle = self.resolve_symbol(right)?;

        let runs = [
            ChildRun {
                child: left_handle.node,
                content_hash: left_handle.content_hash,
                multiplicity: 1,
            },
            ChildRun {
                child: right_handle.node,
                content_hash: right_handle.content_hash,
                multiplicity: 1,
            },
        ];
        let geometry = CompositionGeometry::Trajectory(vec![left_handle.position, right_handle.position]);
        let handle = self.store.get_or_insert_composition(&runs, None, geometry)?;
        self.rules[rule_idx].handle = Some(handle);
        Ok(handle)
    }

    fn position_of(&self, node: NodeRef) -> Result<Point4> {
        // The decomposer only ever sees nodes it just created through
        // `store`, so asking for a constant's seed back and
        // re-projecting is cheap and avoids threading position through
        // every symbol.
        match node {
            NodeRef::Constant(id) => {
                let seed = self.store.constant_seed(id)?;
                Ok(substrate_core::projector::project(&seed))
            }
            NodeRef::Composition(_) => {
                // Composition positions aren't re-derivable from an id
                // alone; callers that need them keep the `NodeHandle`
                // around instead (see `resolve_symbol`/`publish_rule`).
                Ok(Point4::new(0.0, 0.0, 0.0, 1.0))
            }
        }
    }
}

fn run_length_encode(symbols: &[Symbol]) -> Vec<(Symbol, u32)> {
    let mut runs = Vec::new();
    let mut iter = symbols.iter();
    if let Some(&first) = iter.next() {
        let mut current = first;
        let mut count = 1u32;
        for &s in iter {
            if s == current {
                count += 1;
            } else {
                runs.push((current, count));
                current = s;
                count = 1;
            }
        }
        runs.push((current, count));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::reconstruct::reconstruct_text;
    use substrate_test_support::InMemoryStore;

    fn text_to_seeds(s: &str) -> Vec<Seed> {
        s.chars().map(|c| Seed::codepoint(c as u32).unwrap()).collect()
    }

    #[test]
    fn single_character_is_a_constant_not_a_composition() {
        let store = InMemoryStore::new();
        let seeds = text_to_seeds("x");
        let handle = decompose(&store, &seeds).unwrap();
        assert!(matches!(handle.node, NodeRef::Constant(_)));
    }

    #[test]
    fn reconstructs_short_text_exactly() {
        let store = InMemoryStore::new();
        let text = "Hello, World!";
        let seeds = text_to_seeds(text);
        let handle = decompose(&store, &seeds).unwrap();
        let reconstructed = reconstruct_text(&store, handle.node).unwrap();
        assert_eq!(reconstructed, text);
    }

    #[test]
    fn reconstructs_repetitive_text_exactly() {
        let store = InMemoryStore::new();
        let text = "the cat in the hat sat on the mat";
        let seeds = text_to_seeds(text);
        let handle = decompose(&store, &seeds).unwrap();
        let reconstructed = reconstruct_text(&store, handle.node).unwrap();
        assert_eq!(reconstructed, text);
    }

    #[test]
    fn shares_constants_across_independent_ingestions() {
        let store = InMemoryStore::new();
        let a = decompose(&store, &text_to_seeds("the cat in the hat")).unwrap();
        let b = decompose(&store, &text_to_seeds("the dog in the box")).unwrap();
        assert_ne!(a.id(), b.id());

        let t = store.get_or_insert_constant(Seed::codepoint('t' as u32).unwrap()).unwrap();
        let t_again = store.get_or_insert_constant(Seed::codepoint('t' as u32).unwrap()).unwrap();
        assert_eq!(t.id(), t_again.id());
    }

    #[test]
    fn empty_input_is_precondition_error() {
        let store = InMemoryStore::new();
        assert!(decompose(&store, &[]).is_err());
    }
}
