use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use attrbus::{key_match, Attribute, Broker, IntegerDefinition};

/// One owner with an integer attribute and `subscribers` clients watching it with `>`.
fn make_broker(subscribers: usize) -> (Broker, Attribute) {
    let broker = Broker::new();
    let owner = broker.create_client("owner").unwrap();
    for i in 0..subscribers {
        let client = broker.create_client(&format!("sub{i}")).unwrap();
        client.subscribe(">", |_, _, _| Ok(())).unwrap();
        // Non-matching filters so the matcher does real work per client.
        client.subscribe("other.*", |_, _, _| Ok(())).unwrap();
    }
    let (attr, _) = owner
        .attribute("temp")
        .definition(IntegerDefinition::bounded(-1000, 1000, 0))
        .create()
        .unwrap();
    (broker, attr)
}

fn bench_update_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout/update");
    for subscribers in [1_usize, 16, 128] {
        let (_broker, attr) = make_broker(subscribers);
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(subscribers), &attr, |b, attr| {
            let mut n = 0_i64;
            b.iter(|| {
                n = (n + 1) % 1000;
                attr.update(n).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_external_publish(c: &mut Criterion) {
    let (broker, _attr) = make_broker(16);
    let publisher = broker.create_client("publisher").unwrap();
    c.bench_function("fanout/publish_16", |b| {
        b.iter(|| publisher.publish("owner.temp", 42_u16).unwrap());
    });
}

fn bench_key_match(c: &mut Criterion) {
    c.bench_function("keymatch/mixed", |b| {
        b.iter(|| {
            key_match("home.kitchen.light.level", "home.*.light.>")
                && !key_match("home.kitchen.light.level", "home.*.door")
                && key_match("a", "a.*")
        });
    });
}

fn bench_list(c: &mut Criterion) {
    let broker = Broker::new();
    for i in 0..64 {
        let client = broker.create_client(&format!("room{i}")).unwrap();
        client.create_attribute("light", None, Vec::new()).unwrap();
        client.create_attribute("temp", None, Vec::new()).unwrap();
    }
    c.bench_function("list/wildcard_64_rooms", |b| {
        b.iter(|| broker.list("*.light").unwrap().len());
    });
}

criterion_group!(
    benches,
    bench_update_fanout,
    bench_external_publish,
    bench_key_match,
    bench_list
);
criterion_main!(benches);
