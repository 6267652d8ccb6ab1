use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use oxiby_language::Language;

fn benchmark_parser(c: &mut Criterion) {
    let language = Language::load(&oxiby_grammar::language()).expect("bundled grammar loads");
    let inputs = vec![
        (
            "Simple",
            r#"
            fn foo() {
                42
            }
            "#,
        ),
        (
            "Medium",
            r#"
            fn foo() {
                if a == 1 {}
                if a == 2 {} else {}
                if a == 3 {} else { bar(a) }
            }

            fn bar(x: Int) {
                loop {}
            }
            "#,
        ),
    ];

    let mut group = c.benchmark_group("Parser Benchmark");

    for (name, code) in inputs {
        group.throughput(Throughput::Bytes(code.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_code", name), &code, |b, &code| {
            b.iter(|| {
                let tree = oxiby_parse::parse(&language, code, None);
                black_box(tree).expect("engine version matches");
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);
