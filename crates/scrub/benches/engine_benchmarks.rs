//! Rule engine performance benchmarks.
//!
//! Measures parsing and rule application on synthetic cafe-sales data.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scrub::{Parser, RuleEngine, RuleRecord, RuleSet, Table};

const ITEMS: &[&str] = &["Coffee", "Tea", "Cake", "Cookie", "Salad", "UNKNOWN", "ERROR", ""];
const PAYMENTS: &[&str] = &["Cash", "Credit Card", "Digital Wallet", "UNKNOWN", ""];

/// Generate synthetic cafe-sales CSV with placeholder and missing values.
fn generate_sales_csv(rows: usize) -> String {
    let mut data =
        String::from("Transaction ID,Item,Quantity,Price Per Unit,Total Spent,Payment Method\n");

    for row in 0..rows {
        let quantity = (row % 5) + 1;
        let price = 1.0 + (row % 4) as f64;
        let total = if row % 17 == 0 {
            "ERROR".to_string()
        } else if row % 11 == 0 {
            String::new()
        } else {
            format!("{:.1}", quantity as f64 * price + (row % 13 == 0) as u8 as f64)
        };
        let price = if row % 7 == 0 {
            String::new()
        } else {
            format!("{:.1}", price)
        };

        data.push_str(&format!(
            "TXN_{:07},{},{},{},{},{}\n",
            row,
            ITEMS[row % ITEMS.len()],
            quantity,
            price,
            total,
            PAYMENTS[row % PAYMENTS.len()]
        ));
    }

    data
}

/// A rule document exercising every rule type.
fn cafe_rules() -> Vec<RuleRecord> {
    RuleSet::from_json_str(
        r#"[
            {"rule_id": "normalize_item", "rule_type": "transformation", "columns": ["Item"],
             "pattern": "^(UNKNOWN|ERROR)$", "replacement": ""},
            {"rule_id": "normalize_payment", "rule_type": "transformation",
             "columns": ["Payment Method"], "pattern": "^UNKNOWN$", "replacement": ""},
            {"rule_id": "clear_total_error", "rule_type": "transformation",
             "columns": ["Total Spent"], "pattern": "^ERROR$", "replacement": ""},
            {"rule_id": "impute_price", "rule_type": "imputation",
             "columns": ["Price Per Unit"], "strategy": "group_median", "group_by": "Item"},
            {"rule_id": "impute_total", "rule_type": "imputation", "columns": ["Total Spent"],
             "strategy": "product", "factors": ["Quantity", "Price Per Unit"]},
            {"rule_id": "impute_payment", "rule_type": "imputation",
             "columns": ["Payment Method"], "strategy": "mode"},
            {"rule_id": "flag_total", "rule_type": "anomaly_flag", "columns": ["Total Spent"],
             "predicate": {"kind": "product_mismatch", "factors": ["Quantity", "Price Per Unit"]}},
            {"rule_id": "round_total", "rule_type": "format_string", "columns": ["Total Spent"],
             "replacement": "%.2f"}
        ]"#,
    )
    .expect("benchmark rules are valid JSON")
    .rules
}

fn sales_table(rows: usize) -> Table {
    Parser::new()
        .parse_str(&generate_sales_csv(rows))
        .expect("generated data parses")
}

/// Benchmark parsing generated sales data.
fn bench_parse_sales(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_sales");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_sales_csv(*rows);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            let parser = Parser::new();
            b.iter(|| black_box(parser.parse_str(data).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark applying the full rule document.
fn bench_apply_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_rules");
    let rules = cafe_rules();

    for rows in [100, 1_000, 10_000].iter() {
        let table = sales_table(*rows);

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, table| {
            let engine = RuleEngine::new();
            b.iter_with_setup(
                || table.clone(),
                |mut table| black_box(engine.apply(&mut table, &rules).unwrap()),
            )
        });
    }

    group.finish();
}

/// Benchmark rule count scaling on a fixed table.
fn bench_rule_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_scaling");
    let table = sales_table(1_000);
    let base = cafe_rules();

    for copies in [1, 4, 16].iter() {
        let rules: Vec<RuleRecord> = (0..*copies)
            .flat_map(|copy| {
                base.iter().cloned().map(move |mut rule| {
                    rule.rule_id = rule.rule_id.map(|id| format!("{}_{}", id, copy));
                    rule
                })
            })
            .collect();

        group.throughput(Throughput::Elements(rules.len() as u64));
        group.bench_with_input(BenchmarkId::new("rules", rules.len()), &rules, |b, rules| {
            let engine = RuleEngine::new();
            b.iter_with_setup(
                || table.clone(),
                |mut table| black_box(engine.apply(&mut table, rules).unwrap()),
            )
        });
    }

    group.finish();
}

/// Benchmark the cost of recording the audit trail.
fn bench_audit_trail(c: &mut Criterion) {
    let mut group = c.benchmark_group("audit_trail");
    let table = sales_table(10_000);
    let rules = cafe_rules();

    for record_changes in [false, true].iter() {
        let engine = RuleEngine::with_config(scrub::EngineConfig {
            record_changes: *record_changes,
            ..Default::default()
        });
        group.bench_with_input(
            BenchmarkId::new("record_changes", record_changes),
            &engine,
            |b, engine| {
                b.iter_with_setup(
                    || table.clone(),
                    |mut table| black_box(engine.apply(&mut table, &rules).unwrap()),
                )
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_sales,
    bench_apply_rules,
    bench_rule_scaling,
    bench_audit_trail,
);
criterion_main!(benches);
