use proptest::collection::vec;
use proptest::prelude::*;
use wirepack::{pack, unpack, PackError, Value};

proptest! {
    #[test]
    fn lv_dword_array_round_trips(xs in vec(any::<i32>(), 0..64)) {
        let values = vec![Value::List(xs.into_iter().map(Value::Dword).collect())];
        let mut buf = vec![0u8; 2 + 64 * 4];
        let n = pack(&mut buf, "=64d", &values).unwrap();

        let (tree, read) = unpack(&buf[..n], "=64d").unwrap();
        prop_assert_eq!(read, n);
        prop_assert_eq!(tree, values);
    }

    #[test]
    fn scalar_wire_bytes_are_canonical(
        c in any::<i8>(),
        w in any::<i16>(),
        d in any::<i32>(),
        dd in any::<i64>(),
    ) {
        let values = vec![Value::Char(c), Value::Word(w), Value::Dword(d), Value::Ddword(dd)];
        let mut buf = [0u8; 15];
        let n = pack(&mut buf, "cwdD", &values).unwrap();
        prop_assert_eq!(n, 15);
        prop_assert_eq!(&buf[1..3], &w.to_be_bytes());
        prop_assert_eq!(&buf[3..7], &d.to_be_bytes());
        prop_assert_eq!(&buf[7..15], &dd.to_be_bytes());

        let (tree, _) = unpack(&buf, "cwdD").unwrap();
        prop_assert_eq!(tree, values);
    }

    #[test]
    fn floats_round_trip_by_bit_pattern(fb in any::<u32>(), db in any::<u64>()) {
        // bit patterns cover NaN payloads; compare bits, not values
        let values = vec![Value::Float(f32::from_bits(fb)), Value::Double(f64::from_bits(db))];
        let mut buf = [0u8; 12];
        pack(&mut buf, "fF", &values).unwrap();
        prop_assert_eq!(&buf[..4], &fb.to_be_bytes());
        prop_assert_eq!(&buf[4..], &db.to_be_bytes());

        let (tree, _) = unpack(&buf, "fF").unwrap();
        match (&tree[0], &tree[1]) {
            (Value::Float(f), Value::Double(g)) => {
                prop_assert_eq!(f.to_bits(), fb);
                prop_assert_eq!(g.to_bits(), db);
            }
            _ => prop_assert!(false, "wrong kinds decoded"),
        }
    }

    #[test]
    fn lv_string_round_trips(s in "[a-zA-Z0-9 ]{0,60}") {
        let values = vec![Value::Str(s)];
        let mut buf = [0u8; 64];
        let n = pack(&mut buf, "-64s", &values).unwrap();

        let (tree, read) = unpack(&buf[..n], "-64s").unwrap();
        prop_assert_eq!(read, n);
        prop_assert_eq!(tree, values);
    }

    #[test]
    fn capacity_boundary_is_exact(xs in vec(any::<i16>(), 1..32)) {
        let exact = 1 + 2 * xs.len();
        let values = vec![Value::List(xs.into_iter().map(Value::Word).collect())];
        let mut buf = vec![0u8; exact];

        prop_assert_eq!(pack(&mut buf, "-32w", &values).unwrap(), exact);
        let short = pack(&mut buf[..exact - 1], "-32w", &values).unwrap_err();
        prop_assert!(matches!(short, PackError::OutOfBuffer(_)));
    }

    #[test]
    fn nested_groups_round_trip(rows in vec((any::<i32>(), "[a-z]{0,10}"), 1..8)) {
        let elems: Vec<Value> = rows
            .into_iter()
            .map(|(d, s)| Value::Struct(vec![Value::Dword(d), Value::Str(s)]))
            .collect();
        let values = vec![Value::List(elems)];
        let mut buf = vec![0u8; 256];
        let n = pack(&mut buf, "-8[d -16s]", &values).unwrap();

        let (tree, read) = unpack(&buf[..n], "-8[d -16s]").unwrap();
        prop_assert_eq!(read, n);
        prop_assert_eq!(tree, values);
    }
}
