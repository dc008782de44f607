use std::collections::BTreeMap;

use models::RestaurantRecord;

/// Sample restaurants loaded by `seed_fixture_data`.
///
/// Three Tennessee cities with several restaurants each, plus one Alabama
/// restaurant so state range scans can be checked for leakage.
pub fn fixture_records() -> Vec<RestaurantRecord> {
    vec![
        RestaurantRecord::with_details("Chattanooga", "TN", "00001", "9918 Pennywood Lane", "37363", 98, true),
        RestaurantRecord::with_details("Chattanooga", "TN", "00002", "837 Stellar View", "37405", 100, true),
        RestaurantRecord::with_details("Chattanooga", "TN", "00019", "1467 Market Street", "37409", 97, false),
        RestaurantRecord::with_details("Knoxville", "TN", "00119", "27 Cumberland Blvd", "37996", 88, true),
        RestaurantRecord::with_details("Knoxville", "TN", "00128", "987 Scenic Highway", "37994", 88, false),
        RestaurantRecord::with_details("Charleston", "TN", "02006", "100 Elm Street", "37310", 95, true),
        RestaurantRecord::with_details("Charleston", "TN", "02298", "15010 NE 36th Street", "37996", 97, false),
        RestaurantRecord::with_details("Birmingham", "AL", "92763", "839 Sherman Oaks Drive", "35235", 70, true),
    ]
}

/// Fixture records grouped by partition key, in partition-key order.
pub fn fixtures_by_partition() -> BTreeMap<String, Vec<RestaurantRecord>> {
    let mut groups: BTreeMap<String, Vec<RestaurantRecord>> = BTreeMap::new();
    for r in fixture_records() {
        groups.entry(r.partition_key().to_string()).or_default().push(r);
    }
    groups
}
