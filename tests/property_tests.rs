use proptest::prelude::*;

use mdds::{CellType, MultiTypeVector, PackedTrieMap, SegmentTree, Value};

/// One vector mutation, with raw coordinates reduced against the current
/// length at apply time so every generated op is valid.
#[derive(Debug, Clone)]
enum Op {
    Set(usize, Value),
    SetRange(usize, Vec<Value>),
    SetEmpty(usize, usize),
    InsertEmpty(usize, usize),
    InsertRange(usize, Vec<Value>),
    Erase(usize, usize),
    Resize(usize),
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1000i32..1000).prop_map(|v| Value::Numeric(f64::from(v) / 8.0)),
        any::<bool>().prop_map(Value::Boolean),
        "[a-d]{0,3}".prop_map(Value::String),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::UInt),
    ]
}

/// A short homogeneous run: one category, 1..=6 values.
fn run_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop_oneof![
        prop::collection::vec((-100i32..100).prop_map(|v| Value::Numeric(f64::from(v))), 1..6),
        prop::collection::vec(any::<bool>().prop_map(Value::Boolean), 1..6),
        prop::collection::vec("[a-c]{1,2}".prop_map(Value::String), 1..6),
        prop::collection::vec(any::<i64>().prop_map(Value::Int), 1..6),
        prop::collection::vec(any::<u64>().prop_map(Value::UInt), 1..6),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), value_strategy()).prop_map(|(r, v)| Op::Set(r, v)),
        (any::<usize>(), run_strategy()).prop_map(|(r, vs)| Op::SetRange(r, vs)),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::SetEmpty(a, b)),
        (any::<usize>(), 0usize..6).prop_map(|(r, n)| Op::InsertEmpty(r, n)),
        (any::<usize>(), run_strategy()).prop_map(|(r, vs)| Op::InsertRange(r, vs)),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Erase(a, b)),
        (0usize..48).prop_map(Op::Resize),
    ]
}

/// Apply one op to the vector and to a naive `Vec<Option<Value>>` model.
fn apply(db: &mut MultiTypeVector, model: &mut Vec<Option<Value>>, op: &Op) {
    let len = model.len();
    match op {
        Op::Set(row, value) => {
            if len == 0 {
                return;
            }
            let row = row % len;
            db.set(row, value.clone()).unwrap();
            model[row] = Some(value.clone());
        }
        Op::SetRange(row, values) => {
            if len == 0 {
                return;
            }
            let row = row % len;
            let take = values.len().min(len - row);
            if take == 0 {
                return;
            }
            let values = &values[..take];
            db.set_range(row, values).unwrap();
            for (i, v) in values.iter().enumerate() {
                model[row + i] = Some(v.clone());
            }
        }
        Op::SetEmpty(a, b) => {
            if len == 0 {
                return;
            }
            let (a, b) = (a % len, b % len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            db.set_empty(start, end).unwrap();
            for cell in &mut model[start..=end] {
                *cell = None;
            }
        }
        Op::InsertEmpty(row, count) => {
            if len == 0 {
                return;
            }
            let row = row % len;
            db.insert_empty(row, *count).unwrap();
            model.splice(row..row, std::iter::repeat(None).take(*count));
        }
        Op::InsertRange(row, values) => {
            let row = row % (len + 1);
            db.insert_range(row, values).unwrap();
            model.splice(row..row, values.iter().cloned().map(Some));
        }
        Op::Erase(a, b) => {
            if len == 0 {
                return;
            }
            let (a, b) = (a % len, b % len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            db.erase(start, end).unwrap();
            model.drain(start..=end);
        }
        Op::Resize(new_len) => {
            db.resize(*new_len);
            model.resize(*new_len, None);
        }
    }
}

/// The structural invariants promised at every public-API boundary.
fn check_invariants(db: &MultiTypeVector) -> std::result::Result<(), TestCaseError> {
    let views: Vec<_> = db.iter_blocks().collect();
    let total: usize = views.iter().map(|b| b.size).sum();
    prop_assert_eq!(total, db.len());
    for view in &views {
        prop_assert!(view.size >= 1);
        if let Some(data) = view.data {
            prop_assert_eq!(data.len(), view.size);
            prop_assert_eq!(data.cell_type(), view.cell_type);
        } else {
            prop_assert_eq!(view.cell_type, CellType::Empty);
        }
    }
    for pair in views.windows(2) {
        prop_assert_ne!(pair[0].cell_type, pair[1].cell_type);
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_vector_matches_naive_model(
        initial_size in 0usize..24,
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut db = MultiTypeVector::with_size(initial_size);
        let mut model: Vec<Option<Value>> = vec![None; initial_size];

        for op in &ops {
            apply(&mut db, &mut model, op);
            check_invariants(&db)?;

            prop_assert_eq!(db.len(), model.len());
            for (row, expected) in model.iter().enumerate() {
                prop_assert_eq!(&db.get(row).unwrap(), expected, "row {}", row);
                prop_assert_eq!(db.is_empty_cell(row).unwrap(), expected.is_none());
            }
        }
    }

    #[test]
    fn test_clone_is_equal_and_independent(
        initial_size in 1usize..16,
        ops in prop::collection::vec(op_strategy(), 1..12),
        probe in value_strategy(),
    ) {
        let mut db = MultiTypeVector::with_size(initial_size);
        let mut model: Vec<Option<Value>> = vec![None; initial_size];
        for op in &ops {
            apply(&mut db, &mut model, op);
        }

        let snapshot = db.clone();
        prop_assert_eq!(&snapshot, &db);

        let mut mutated = db.clone();
        if !mutated.is_empty() {
            mutated.set(0, probe).unwrap();
        } else {
            mutated.resize(1);
        }
        // The original never observes the clone's mutation.
        prop_assert_eq!(&snapshot, &db);
    }

    #[test]
    fn test_set_empty_is_idempotent(
        initial_size in 1usize..16,
        ops in prop::collection::vec(op_strategy(), 0..10),
        a in any::<usize>(),
        b in any::<usize>(),
    ) {
        let mut db = MultiTypeVector::with_size(initial_size);
        let mut model: Vec<Option<Value>> = vec![None; initial_size];
        for op in &ops {
            apply(&mut db, &mut model, op);
        }
        if db.is_empty() {
            return Ok(());
        }
        let len = db.len();
        let (a, b) = (a % len, b % len);
        let (start, end) = if a <= b { (a, b) } else { (b, a) };

        db.set_empty(start, end).unwrap();
        let once = db.clone();
        db.set_empty(start, end).unwrap();
        prop_assert_eq!(db, once);
    }

    #[test]
    fn test_insert_empty_then_erase_is_identity(
        initial_size in 1usize..16,
        ops in prop::collection::vec(op_strategy(), 0..10),
        row in any::<usize>(),
        count in 1usize..6,
    ) {
        let mut db = MultiTypeVector::with_size(initial_size);
        let mut model: Vec<Option<Value>> = vec![None; initial_size];
        for op in &ops {
            apply(&mut db, &mut model, op);
        }
        if db.is_empty() {
            return Ok(());
        }
        let row = row % db.len();

        let before = db.clone();
        db.insert_empty(row, count).unwrap();
        db.erase(row, row + count - 1).unwrap();
        prop_assert_eq!(db, before);
    }

    #[test]
    fn test_resize_is_idempotent(
        initial_size in 0usize..16,
        ops in prop::collection::vec(op_strategy(), 0..10),
        new_len in 0usize..24,
    ) {
        let mut db = MultiTypeVector::with_size(initial_size);
        let mut model: Vec<Option<Value>> = vec![None; initial_size];
        for op in &ops {
            apply(&mut db, &mut model, op);
        }

        db.resize(new_len);
        let once = db.clone();
        db.resize(new_len);
        prop_assert_eq!(db, once);
    }

    #[test]
    fn test_trie_find_and_prefix_agree_with_input(
        keys in prop::collection::btree_set("[a-c]{1,5}", 1..24),
        prefix in "[a-c]{0,3}",
    ) {
        let sorted: Vec<(String, usize)> =
            keys.iter().cloned().zip(0..).collect();
        let entries: Vec<(&str, usize)> =
            sorted.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let map = PackedTrieMap::new(&entries).unwrap();

        prop_assert_eq!(map.len(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(map.find(key), Some(value));
        }

        let hits = map.prefix_search(&prefix);
        let expected: Vec<(String, usize)> = sorted
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .cloned()
            .collect();
        prop_assert_eq!(hits.len(), expected.len());
        for ((key, value), (expected_key, expected_value)) in hits.iter().zip(&expected) {
            prop_assert_eq!(key, expected_key);
            prop_assert_eq!(**value, *expected_value);
        }
    }

    #[test]
    fn test_segment_tree_matches_linear_scan(
        intervals in prop::collection::vec((-20i64..20, 1i64..8), 1..16),
        points in prop::collection::vec(-24i64..32, 1..24),
    ) {
        let mut tree = SegmentTree::new();
        let spans: Vec<(i64, i64)> = intervals
            .iter()
            .map(|&(start, width)| (start, start + width))
            .collect();
        for (id, &(start, end)) in spans.iter().enumerate() {
            tree.insert(start, end, id).unwrap();
        }
        tree.build();

        for &point in &points {
            let mut hits: Vec<usize> =
                tree.search(point).unwrap().into_iter().copied().collect();
            hits.sort_unstable();
            let expected: Vec<usize> = spans
                .iter()
                .enumerate()
                .filter(|(_, &(start, end))| start <= point && point < end)
                .map(|(id, _)| id)
                .collect();
            prop_assert_eq!(&hits, &expected, "stab at {}", point);
        }
    }
}
