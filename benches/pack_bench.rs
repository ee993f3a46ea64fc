use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wirepack::{pack, unpack, Value};

fn bench_flat_scalars(c: &mut Criterion) {
    let values = vec![
        Value::Char(10),
        Value::Word(1),
        Value::Dword(2),
        Value::Ddword(237_417_076_350_464),
        Value::Float(3.4),
        Value::Double(5.6),
    ];
    let mut buf = [0u8; 64];
    let n = pack(&mut buf, "cwdDfF", &values).unwrap();

    c.bench_function("pack_flat_scalars", |b| {
        b.iter(|| pack(black_box(&mut buf), "cwdDfF", black_box(&values)).unwrap())
    });
    c.bench_function("unpack_flat_scalars", |b| {
        b.iter(|| unpack(black_box(&buf[..n]), "cwdDfF").unwrap())
    });
}

fn bench_nested_message(c: &mut Criterion) {
    let users: Vec<Value> = (0..10)
        .map(|i| {
            Value::Struct(vec![
                Value::Dword(i),
                Value::Str(format!("user_{i:04}")),
                Value::Ddword(i as i64 * 7),
            ])
        })
        .collect();
    let message = vec![Value::Struct(vec![
        Value::Dword(0),
        Value::List(users),
        Value::Word(10),
    ])];
    let fmt = "[d =10[d -100s D] w]";
    let mut buf = [0u8; 1024];
    let n = pack(&mut buf, fmt, &message).unwrap();

    c.bench_function("pack_nested_message", |b| {
        b.iter(|| pack(black_box(&mut buf), fmt, black_box(&message)).unwrap())
    });
    c.bench_function("unpack_nested_message", |b| {
        b.iter(|| unpack(black_box(&buf[..n]), fmt).unwrap())
    });
}

criterion_group!(benches, bench_flat_scalars, bench_nested_message);
criterion_main!(benches);
