#![no_main]
use libfuzzer_sys::fuzz_target;
use mdds::{CellType, MultiTypeVector, Value};

fn value_for(tag: u8, seed: u16) -> Value {
    match tag % 5 {
        0 => Value::Numeric(f64::from(seed)),
        1 => Value::Boolean(seed % 2 == 0),
        2 => Value::String(format!("s{}", seed % 8)),
        3 => Value::Int(i64::from(seed)),
        _ => Value::UInt(u64::from(seed)),
    }
}

fn check_invariants(db: &MultiTypeVector) {
    let views: Vec<_> = db.iter_blocks().collect();
    let total: usize = views.iter().map(|b| b.size).sum();
    assert_eq!(total, db.len());
    for view in &views {
        assert!(view.size >= 1);
        match view.data {
            Some(data) => assert_eq!(data.len(), view.size),
            None => assert_eq!(view.cell_type, CellType::Empty),
        }
    }
    for pair in views.windows(2) {
        assert_ne!(pair[0].cell_type, pair[1].cell_type);
    }
}

fuzz_target!(|ops: Vec<(u8, u16, u16)>| {
    let mut db = MultiTypeVector::with_size(8);

    for (kind, a, b) in ops {
        let len = db.len();
        match kind % 7 {
            0 => {
                if len > 0 {
                    db.set(a as usize % len, value_for(kind / 7, b)).unwrap();
                }
            }
            1 => {
                if len > 0 {
                    let row = a as usize % len;
                    let count = (b as usize % 4 + 1).min(len - row);
                    let values: Vec<Value> =
                        (0..count).map(|i| value_for(kind / 7, b.wrapping_add(i as u16))).collect();
                    db.set_range(row, &values).unwrap();
                }
            }
            2 => {
                if len > 0 {
                    let (x, y) = (a as usize % len, b as usize % len);
                    db.set_empty(x.min(y), x.max(y)).unwrap();
                }
            }
            3 => {
                if len > 0 && len < 1 << 16 {
                    db.insert_empty(a as usize % len, b as usize % 4).unwrap();
                }
            }
            4 => {
                if len < 1 << 16 {
                    let row = a as usize % (len + 1);
                    let values: Vec<Value> = (0..b as usize % 3 + 1)
                        .map(|i| value_for(kind / 7, a.wrapping_add(i as u16)))
                        .collect();
                    db.insert_range(row, &values).unwrap();
                }
            }
            5 => {
                if len > 0 {
                    let (x, y) = (a as usize % len, b as usize % len);
                    db.erase(x.min(y), x.max(y)).unwrap();
                }
            }
            _ => db.resize(a as usize % 64),
        }
        check_invariants(&db);
    }

    let copy = db.clone();
    assert_eq!(copy, db);
});
