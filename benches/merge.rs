use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use namesake::{parse_raw_name, OrgDictionary, PersonRegistry, PositionHint};

const SURNAMES: &[&str] = &[
    "Dunn", "Temko", "Teague", "Baker", "Henson", "Wakeham", "Shinn", "Hardy", "Yeaman", "Ramm",
];

fn dictionary() -> OrgDictionary {
    OrgDictionary::from_json_str(
        r#"{
            "Philip Morris": ["PM", "PHILIP MORRIS INC"],
            "Covington & Burling": ["COVINGTON AND BURLING"],
            "Shook, Hardy & Bacon": ["SHOOK, HARDY & BACON", "SHOOK HARDY"],
            "@skip@": ["UNK"]
        }"#,
    )
    .unwrap_or_default()
}

/// Spelling variants of a few hundred people: initials, full names, and
/// organization tails.
fn raw_names() -> Vec<(String, u64)> {
    let mut names = Vec::new();
    for (i, last) in SURNAMES.iter().enumerate() {
        for j in 0..25u8 {
            let first = char::from(b'A' + j);
            let middle = char::from(b'A' + ((j + 7) % 26));
            let count = u64::from(j % 5) + 1;
            names.push((format!("{last}, {first}{middle}"), count));
            names.push((format!("{}, {first}. {middle}.", last.to_uppercase()), count));
            names.push((format!("{last}, {first}ndrew {middle}"), count + i as u64));
            names.push((
                format!("{} {first}{middle}, COVINGTON AND BURLING", last.to_uppercase()),
                1,
            ));
        }
    }
    names
}

fn populated(dictionary: &OrgDictionary, names: &[(String, u64)]) -> PersonRegistry {
    let mut registry = PersonRegistry::new(dictionary.clone());
    for (raw, count) in names {
        registry.add_person_raw(raw, *count, PositionHint::None);
    }
    registry
}

fn bench_parse(c: &mut Criterion) {
    let dictionary = dictionary();
    let names = raw_names();

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("parse_raw_name", |b| {
        b.iter(|| {
            for (raw, count) in &names {
                let _ = black_box(parse_raw_name(raw, *count, &dictionary));
            }
        });
    });
    group.finish();
}

fn bench_add(c: &mut Criterion) {
    let dictionary = dictionary();
    let names = raw_names();

    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("add_person_raw", |b| {
        b.iter(|| black_box(populated(&dictionary, &names)));
    });
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let dictionary = dictionary();
    let names = raw_names();

    c.bench_function("registry/merge_duplicates", |b| {
        b.iter_batched(
            || populated(&dictionary, &names),
            |mut registry| black_box(registry.merge_duplicates().map(|r| r.merges)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_parse, bench_add, bench_merge);
criterion_main!(benches);
