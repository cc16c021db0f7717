#![cfg(test)]

// Property tests for both engines kept inside the crate so they can reach
// the bucket layout of HashSymTable.

use crate::hash_table::HashSymTable;
use crate::list_table::ListSymTable;
use crate::table::{PutError, SymTable};
use hashbrown::HashMap;
use proptest::prelude::*;
use std::collections::BTreeSet;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Replace(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives any engine through `ops` next to a hashbrown model.
// Invariants exercised across random operation sequences:
// - Duplicate puts are rejected and leave the existing value in place.
// - `get`/`contains` parity with the model for present and absent keys.
// - `replace`/`remove` return the model's previous value, `None` when absent.
// - `for_each` visits each live binding exactly once.
// - `len`/`is_empty` parity with the model after each op.
fn run_state_machine<T>(sut: &mut T, pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    T: SymTable<i32>,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = &pool[i];
                let already = model.contains_key(k);
                match sut.put(k, v) {
                    Ok(()) => {
                        prop_assert!(!already, "put must fail on duplicate");
                        model.insert(k.clone(), v);
                    }
                    Err(PutError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                    Err(e) => prop_assert!(false, "unexpected error: {}", e),
                }
            }
            OpI::Replace(i, v) => {
                let k = &pool[i];
                let expected = model.get_mut(k).map(|mv| std::mem::replace(mv, v));
                prop_assert_eq!(sut.replace(k, v), expected);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
                prop_assert!(!sut.contains(k));
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains(&s), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(vr) = sut.get_mut(k) {
                    *vr = vr.saturating_add(d);
                    let mv = model.get_mut(k);
                    prop_assert!(mv.is_some(), "live in table but not in model");
                    if let Some(mv) = mv {
                        *mv = mv.saturating_add(d);
                    }
                } else {
                    prop_assert!(!model.contains_key(k));
                }
            }
            OpI::Iterate => {
                let mut visits = 0usize;
                let mut seen = BTreeSet::new();
                sut.for_each(|k, _| {
                    visits += 1;
                    seen.insert(k.to_string());
                });
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(visits, model.len());
                prop_assert_eq!(seen, m_keys);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_hash_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: HashSymTable<i32> = HashSymTable::new();
        run_state_machine(&mut sut, &pool, ops)?;
    }

    #[test]
    fn prop_list_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: ListSymTable<i32> = ListSymTable::new();
        run_state_machine(&mut sut, &pool, ops)?;
    }
}

// Property: every binding sits in the bucket its hash selects under the
// current bucket count, and chain lengths add up to `len`, across growth and
// interleaved removals.
proptest! {
    #![proptest_config(ProptestConfig { cases: 16, .. ProptestConfig::default() })]
    #[test]
    fn prop_bindings_live_in_their_bucket(
        ids in proptest::collection::btree_set(0u32..5000, 400..1200),
        drop_every in 2usize..7,
    ) {
        let mut t: HashSymTable<u32> = HashSymTable::new();
        for &id in &ids {
            t.put(&format!("id{id}"), id).unwrap();
        }
        for (n, &id) in ids.iter().enumerate() {
            if n % drop_every == 0 {
                prop_assert_eq!(t.remove(&format!("id{id}")), Some(id));
            }
        }
        let expected_count = match ids.len() {
            0..=509 => 509,
            510..=1021 => 1021,
            _ => 2039,
        };
        prop_assert_eq!(t.bucket_count(), expected_count);
        prop_assert_eq!(t.misplaced_bindings(), 0);
        prop_assert_eq!(t.chain_lengths().iter().sum::<usize>(), t.len());
        for &id in &ids {
            let k = format!("id{id}");
            if t.contains(&k) {
                prop_assert_eq!(t.get(&k), Some(&id));
            }
        }
    }
}
