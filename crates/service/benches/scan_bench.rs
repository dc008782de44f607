use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use models::RestaurantRecord;
use service::restaurant::RestaurantLookupService;
use service::table::LocalTableStore;

fn bench_scans(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(LocalTableStore::in_memory().with_max_segment_size(100));
    let svc = RestaurantLookupService::new(store, "Restaurants");

    // 50 cities x 100 restaurants, populated outside of the measured loop
    rt.block_on(async {
        svc.initialize().await.unwrap();
        for city in 0..50 {
            for id in 0..100 {
                let r = RestaurantRecord::with_details(
                    &format!("city{city:02}"),
                    "TN",
                    &format!("{id:05}"),
                    "1 Main Street",
                    "37000",
                    (id % 101) as i32,
                    id % 3 == 0,
                );
                svc.upsert(r).await.unwrap();
            }
        }
    });

    c.bench_function("full_table_property_scan", |b| {
        b.iter(|| rt.block_on(svc.has_gorditas()).unwrap());
    });

    c.bench_function("state_range_scan", |b| {
        b.iter(|| rt.block_on(svc.list_by_partition_range_and_minimum("TN", 90)).unwrap());
    });
}

criterion_group!(benches, bench_scans);
criterion_main!(benches);
