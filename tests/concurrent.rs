use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use attrbus::{Broker, Value};

const ATTRIBUTES: usize = 4;
const PUBLISHES: i64 = 200;
const WATCHERS: [&str; 3] = ["w0", "w1", "w2"];

#[test]
fn concurrent_publishers_each_get_every_stable_subscriber() {
    let broker = Broker::new();
    let owner = broker.create_client("pub").unwrap();
    for n in 0..ATTRIBUTES {
        owner.create_attribute(&format!("a{n}"), None, Vec::new()).unwrap();
    }

    let hits = Arc::new(AtomicUsize::new(0));
    for name in WATCHERS {
        let count = Arc::clone(&hits);
        broker
            .create_client(name)
            .unwrap()
            .subscribe("pub.>", move |_, _, _| {
                count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .unwrap();
    }
    let churners: Vec<_> = (0..2)
        .map(|n| broker.create_client(&format!("churn{n}")).unwrap())
        .collect();
    let most_reports = WATCHERS.len() + churners.len();

    thread::scope(|s| {
        for churner in &churners {
            s.spawn(move || {
                for _ in 0..PUBLISHES {
                    let sub = churner.subscribe("pub.>", |_, _, _| Ok(())).unwrap();
                    sub.cancel().unwrap();
                }
            });
        }
        for n in 0..ATTRIBUTES {
            let publisher = broker.create_client(&format!("publisher{n}")).unwrap();
            s.spawn(move || {
                let name = format!("pub.a{n}");
                for i in 0..PUBLISHES {
                    let reports = publisher.publish(&name, i).unwrap();
                    assert!(reports.iter().all(|r| r.is_ok()));
                    for watcher in WATCHERS {
                        let seen = reports.iter().filter(|r| r.source.client() == watcher).count();
                        assert_eq!(seen, 1, "{name} missed {watcher}");
                    }
                    assert!(reports
                        .iter()
                        .all(|r| WATCHERS.contains(&r.source.client()) || r.source.client().starts_with("churn")));
                    assert!(reports.len() <= most_reports);
                }
            });
        }
    });

    assert_eq!(
        hits.load(Ordering::Relaxed),
        WATCHERS.len() * ATTRIBUTES * usize::try_from(PUBLISHES).unwrap()
    );
    for n in 0..ATTRIBUTES {
        let datum = broker.value(&format!("pub.a{n}")).unwrap().unwrap();
        assert_eq!(datum.value(), &Value::Int(PUBLISHES - 1));
    }
    for churner in &churners {
        assert!(churner.subscribe("pub.>", |_, _, _| Ok(())).is_ok());
    }
}
