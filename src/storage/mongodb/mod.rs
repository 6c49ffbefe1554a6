//! MongoDB-backed storage, grounded on the teacher's `storage/mongodb.rs`:
//! a `Database` handle, one `Collection` per concern, indexes created in
//! `init()`.

pub mod consolidation_store;
pub mod idempotency_store;
pub mod manifest_store;
pub mod outbox_store;
pub mod pack_task_store;
pub mod pick_task_store;
pub mod process_path_store;
pub mod route_store;
pub mod shipment_store;
pub mod station_store;
pub mod template_store;

pub use consolidation_store::MongoConsolidationRepository;
pub use idempotency_store::MongoIdempotencyStore;
pub use manifest_store::MongoManifestRepository;
pub use outbox_store::MongoOutboxStore;
pub use pack_task_store::MongoPackTaskRepository;
pub use pick_task_store::MongoPickTaskRepository;
pub use process_path_store::MongoProcessPathRepository;
pub use route_store::MongoRouteRepository;
pub use shipment_store::MongoShipmentRepository;
pub use station_store::MongoStationRepository;
pub use template_store::MongoTemplateStore;
