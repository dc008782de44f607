use std::sync::Arc;

use configs::StorageConfig;
use models::restaurant::{HAS_GORDITAS, HEALTH_RATING, ZIPCODE};
use models::{EntityKey, PropertyValue, RestaurantRecord, TableRow};
use tracing::{debug, info, instrument};

use crate::errors::ServiceError;
use crate::pagination::drain_scan;
use crate::restaurant::fixtures::fixtures_by_partition;
use crate::table::{Comparison, Condition, Filter, LocalTableStore, StorageAccount, TableStoreBackend};

pub const DEFAULT_TABLE_NAME: &str = "Restaurants";

/// Restaurant lookups and maintenance over a table-store backend.
///
/// Holds no state besides the backend handle and table name; every call is an
/// independent round trip and scans are drained before returning.
pub struct RestaurantLookupService<B: TableStoreBackend = LocalTableStore> {
    backend: Arc<B>,
    table: String,
}

impl RestaurantLookupService<LocalTableStore> {
    /// Opens the storage account named by the connection string and makes sure
    /// the table exists. Any failure here means the service cannot start.
    #[instrument(skip(config), fields(table = %config.table_name))]
    pub async fn connect(config: &StorageConfig) -> Result<Self, ServiceError> {
        let account = StorageAccount::parse(&config.connection_string)?;
        let backend = LocalTableStore::open(&account).await?;
        let svc = Self::new(Arc::new(backend), config.table_name.clone());
        svc.initialize().await?;
        Ok(svc)
    }
}

impl<B: TableStoreBackend> RestaurantLookupService<B> {
    pub fn new(backend: Arc<B>, table: impl Into<String>) -> Self {
        Self { backend, table: table.into() }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Creates the table if it does not exist yet.
    pub async fn initialize(&self) -> Result<(), ServiceError> {
        let created = self
            .backend
            .ensure_table_exists(&self.table)
            .await
            .map_err(ServiceError::unavailable)?;
        info!(table = %self.table, created, "restaurant table ready");
        Ok(())
    }

    async fn query(&self, filter: Filter) -> Result<Vec<RestaurantRecord>, ServiceError> {
        let rows = drain_scan(self.backend.as_ref(), &self.table, &filter).await?;
        let records = rows
            .into_iter()
            .map(RestaurantRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        info!(%filter, count = records.len(), "query completed");
        Ok(records)
    }

    /// Point query on the full key. `None` when no such restaurant exists.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::restaurant::RestaurantLookupService;
    /// use service::table::LocalTableStore;
    ///
    /// let svc = RestaurantLookupService::new(Arc::new(LocalTableStore::in_memory()), "Restaurants");
    /// tokio_test::block_on(async {
    ///     svc.initialize().await.unwrap();
    ///     svc.seed_fixture_data().await.unwrap();
    ///     let found = svc.get_by_key("tn_knoxville", "00119").await.unwrap().unwrap();
    ///     assert_eq!(found.address, "27 Cumberland Blvd");
    ///     assert!(svc.get_by_key("tn_knoxville", "").await.unwrap().is_none());
    /// });
    /// ```
    #[instrument(skip(self))]
    pub async fn get_by_key(&self, partition_key: &str, row_key: &str) -> Result<Option<RestaurantRecord>, ServiceError> {
        let key = EntityKey::new(partition_key, row_key);
        let row = self.backend.point_lookup(&self.table, &key).await?;
        debug!(found = row.is_some(), "point lookup");
        row.map(RestaurantRecord::try_from).transpose().map_err(ServiceError::from)
    }

    /// Exact match on the partition key and one property.
    #[instrument(skip(self, value))]
    pub async fn list_by_partition_and_property(
        &self,
        partition_key: &str,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<Vec<RestaurantRecord>, ServiceError> {
        let filter = Filter::all()
            .and(Condition::partition_key(Comparison::Equal, partition_key))
            .and(Condition::property(property, Comparison::Equal, value));
        self.query(filter).await
    }

    /// Restaurants in one city partition with the given zip code.
    pub async fn search_by_city_state_and_zip(
        &self,
        city_state: &str,
        zip_code: &str,
    ) -> Result<Vec<RestaurantRecord>, ServiceError> {
        self.list_by_partition_and_property(city_state, ZIPCODE, zip_code).await
    }

    /// Partition range scan over every city of `state`, keeping ratings of at
    /// least `min_health_rating`.
    ///
    /// Partitions are bounded by `<state>_a ..= <state>_z`. Cities whose
    /// lowercase name sorts outside that range (a leading digit or symbol, or a
    /// name past `z` such as `zion`) are not returned.
    #[instrument(skip(self))]
    pub async fn list_by_partition_range_and_minimum(
        &self,
        state: &str,
        min_health_rating: i32,
    ) -> Result<Vec<RestaurantRecord>, ServiceError> {
        let state = state.to_lowercase();
        let filter = Filter::all()
            .and(Condition::partition_key(Comparison::GreaterThanOrEqual, &format!("{state}_a")))
            .and(Condition::partition_key(Comparison::LessThanOrEqual, &format!("{state}_z")))
            .and(Condition::property(HEALTH_RATING, Comparison::GreaterThanOrEqual, min_health_rating));
        self.query(filter).await
    }

    /// Full table scan on one property. The most expensive query there is.
    #[instrument(skip(self, value))]
    pub async fn list_by_property_equals(
        &self,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<Vec<RestaurantRecord>, ServiceError> {
        self.query(Filter::all().and(Condition::property(property, Comparison::Equal, value))).await
    }

    pub async fn has_gorditas(&self) -> Result<Vec<RestaurantRecord>, ServiceError> {
        self.list_by_property_equals(HAS_GORDITAS, true).await
    }

    #[instrument(skip(self, record), fields(key = %record.key()))]
    pub async fn upsert(&self, record: RestaurantRecord) -> Result<(), ServiceError> {
        self.backend.upsert(&self.table, TableRow::from(record)).await?;
        Ok(())
    }

    /// Overwrites every property of an existing restaurant.
    #[instrument(skip(self, record), fields(key = %record.key()))]
    pub async fn replace(&self, record: RestaurantRecord) -> Result<(), ServiceError> {
        self.backend.replace(&self.table, TableRow::from(record)).await?;
        info!("restaurant replaced");
        Ok(())
    }

    /// Deletes by key; the other fields of `record` are ignored.
    pub async fn delete(&self, record: &RestaurantRecord) -> Result<(), ServiceError> {
        self.delete_by_key(&record.key()).await
    }

    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete_by_key(&self, key: &EntityKey) -> Result<(), ServiceError> {
        self.backend.delete(&self.table, key).await?;
        info!("restaurant deleted");
        Ok(())
    }

    /// Insert-or-replace the fixture restaurants. Partitions holding several
    /// restaurants are written as one atomic batch each; single-restaurant
    /// partitions use a plain upsert. Returns the number of records written.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn seed_fixture_data(&self) -> Result<usize, ServiceError> {
        let mut written = 0usize;
        for (partition, records) in fixtures_by_partition() {
            let count = records.len();
            if count == 1 {
                for r in records {
                    self.upsert(r).await?;
                }
            } else {
                let rows = records.into_iter().map(TableRow::from).collect();
                self.backend.batch_upsert(&self.table, rows).await?;
            }
            debug!(%partition, count, "seeded partition");
            written += count;
        }
        info!(written, "fixture data seeded");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TableError;
    use crate::test_support::{seeded_service, ScriptedBackend};
    use models::partition_key_for;

    fn ids(records: &[RestaurantRecord]) -> Vec<&str> {
        let mut ids: Vec<&str> = records.iter().map(|r| r.row_key.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    #[tokio::test]
    async fn point_lookup_hits_and_misses() {
        let svc = seeded_service(1000).await;
        let hit = svc.get_by_key("tn_chattanooga", "00002").await.unwrap().unwrap();
        assert_eq!(hit.health_rating, 100);
        assert_eq!(hit.city, "Chattanooga");
        assert!(svc.get_by_key("tn_chattanooga", "").await.unwrap().is_none());
        assert!(svc.get_by_key("", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_row_key_is_its_own_record() {
        let svc = seeded_service(1000).await;
        svc.upsert(RestaurantRecord::with_details("Knoxville", "TN", "", "1 Nowhere", "37996", 50, false))
            .await
            .unwrap();
        let found = svc.get_by_key("tn_knoxville", "").await.unwrap().unwrap();
        assert_eq!(found.address, "1 Nowhere");
    }

    #[tokio::test]
    async fn city_state_zip_filters_within_one_partition() {
        let svc = seeded_service(1000).await;
        let knox = svc.search_by_city_state_and_zip("tn_knoxville", "37996").await.unwrap();
        assert_eq!(ids(&knox), vec!["00119"]);
        // 37996 also appears in Charleston, which is a different partition.
        let charleston = svc.list_by_partition_and_property("tn_charleston", ZIPCODE, "37996").await.unwrap();
        assert_eq!(ids(&charleston), vec!["02298"]);
        assert!(svc.search_by_city_state_and_zip("tn_knoxville", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn state_range_scan_respects_minimum_rating() {
        let svc = seeded_service(1000).await;
        let found = svc.list_by_partition_range_and_minimum("TN", 90).await.unwrap();
        assert_eq!(ids(&found), vec!["00001", "00002", "00019", "02006", "02298"]);
        assert!(found.iter().all(|r| r.state == "TN" && r.health_rating >= 90));

        let all_tn = svc.list_by_partition_range_and_minimum("tn", 0).await.unwrap();
        assert_eq!(all_tn.len(), 7);
        let al = svc.list_by_partition_range_and_minimum("AL", 0).await.unwrap();
        assert_eq!(ids(&al), vec!["92763"]);
    }

    #[tokio::test]
    async fn state_range_scan_misses_cities_outside_a_to_z() {
        let svc = seeded_service(1000).await;
        svc.upsert(RestaurantRecord::with_details("1000 Oaks", "TN", "1", "a", "1", 99, true)).await.unwrap();
        svc.upsert(RestaurantRecord::with_details("Zion", "TN", "2", "b", "2", 99, true)).await.unwrap();
        let found = svc.list_by_partition_range_and_minimum("TN", 90).await.unwrap();
        assert!(found.iter().all(|r| r.row_key != "1" && r.row_key != "2"));
    }

    #[tokio::test]
    async fn gorditas_scan_crosses_partitions() {
        let svc = seeded_service(1000).await;
        let found = svc.has_gorditas().await.unwrap();
        assert_eq!(ids(&found), vec!["00001", "00002", "00119", "02006", "92763"]);
        let mut partitions: Vec<&str> = found.iter().map(|r| r.partition_key()).collect();
        partitions.dedup();
        assert_eq!(partitions, vec!["al_birmingham", "tn_charleston", "tn_chattanooga", "tn_knoxville"]);
    }

    #[tokio::test]
    async fn small_segments_return_the_same_results() {
        let paged = seeded_service(2).await;
        let whole = seeded_service(1000).await;
        assert_eq!(paged.has_gorditas().await.unwrap(), whole.has_gorditas().await.unwrap());
        assert_eq!(
            paged.list_by_partition_range_and_minimum("TN", 90).await.unwrap(),
            whole.list_by_partition_range_and_minimum("TN", 90).await.unwrap()
        );
    }

    #[tokio::test]
    async fn five_matches_over_two_row_segments() {
        let rows: Vec<Vec<TableRow>> = (0..5)
            .map(|i| TableRow::from(RestaurantRecord::with_details("Knoxville", "TN", &format!("{i}"), "x", "1", 90, true)))
            .collect::<Vec<_>>()
            .chunks(2)
            .map(|c| c.to_vec())
            .collect();
        let svc = RestaurantLookupService::new(Arc::new(ScriptedBackend::new(rows)), "Restaurants");
        let found = svc.has_gorditas().await.unwrap();
        assert_eq!(ids(&found), vec!["0", "1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn replace_overwrites_every_field() {
        let svc = seeded_service(1000).await;
        let mut updated = RestaurantRecord::new("Knoxville", "TN", "00119");
        updated.zip_code = "37919".into();
        svc.replace(updated.clone()).await.unwrap();

        let got = svc.get_by_key("tn_knoxville", "00119").await.unwrap().unwrap();
        assert_eq!(got, updated);
        assert_eq!(got.address, "");
        assert!(!got.has_gorditas);
    }

    #[tokio::test]
    async fn replace_of_missing_record_fails() {
        let svc = seeded_service(1000).await;
        let err = svc.replace(RestaurantRecord::new("Memphis", "TN", "1")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, ServiceError::BackendOperation(TableError::EntityNotFound(_))));
    }

    #[tokio::test]
    async fn delete_ignores_non_key_fields() {
        let svc = seeded_service(1000).await;
        let stale = RestaurantRecord::with_details("Charleston", "TN", "02006", "wrong", "00000", 1, false);
        svc.delete(&stale).await.unwrap();
        assert!(svc.get_by_key("tn_charleston", "02006").await.unwrap().is_none());
        assert!(svc.delete(&stale).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn seeding_twice_keeps_one_row_per_key() {
        let svc = seeded_service(3).await;
        assert_eq!(svc.seed_fixture_data().await.unwrap(), 8);
        let everything = svc.query(Filter::all()).await.unwrap();
        assert_eq!(everything.len(), 8);
        let mut keys: Vec<_> = everything.iter().map(|r| r.key()).collect();
        keys.dedup();
        assert_eq!(keys.len(), 8);
    }

    #[tokio::test]
    async fn connect_rejects_malformed_connection_string() {
        let config = StorageConfig {
            connection_string: "AccountName=tacos".into(),
            table_name: DEFAULT_TABLE_NAME.into(),
            seed_on_startup: false,
        };
        let err = RestaurantLookupService::connect(&config).await.err().unwrap();
        assert!(matches!(err, ServiceError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn connect_creates_the_table() {
        let config = StorageConfig {
            connection_string: "UseDevelopmentStorage=true".into(),
            table_name: DEFAULT_TABLE_NAME.into(),
            seed_on_startup: false,
        };
        let svc = RestaurantLookupService::connect(&config).await.unwrap();
        assert!(!svc.backend().ensure_table_exists(DEFAULT_TABLE_NAME).await.unwrap());
        assert_eq!(svc.get_by_key(&partition_key_for("Knoxville", "TN"), "00119").await.unwrap(), None);
    }
}
