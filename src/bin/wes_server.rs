//! wes-server: boots the REST gateway plus the outbox publisher, wiring
//! storage and event-bus backends from the compiled feature set (spec §6.4,
//! §6.5). Mirrors the teacher's per-service `main` shape (`angzarr_topology`,
//! `angzarr_gateway`): build the backend, spawn the background worker, serve
//! HTTP, wait on Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use wes_core::clients::inventory::{HttpInventoryClient, InventoryClient};
use wes_core::clients::labor::{HttpLaborClient, LaborClient};
use wes_core::config::Config;
use wes_core::execution_plan::consolidation_store::ConsolidationRepository;
use wes_core::execution_plan::manifest_store::ManifestRepository;
use wes_core::execution_plan::pack_task_store::PackTaskRepository;
use wes_core::execution_plan::pick_task_store::PickTaskRepository;
use wes_core::execution_plan::route::RouteRepository;
use wes_core::execution_plan::shipment_store::ShipmentRepository;
use wes_core::execution_plan::station_store::StationRepository;
use wes_core::execution_plan::template_store::TemplateStore;
use wes_core::idempotency::IdempotencyStore;
use wes_core::outbox::bus::EventBus;
use wes_core::outbox::publisher::Publisher;
use wes_core::outbox::OutboxStore;
use wes_core::process_path::store::ProcessPathRepository;
use wes_core::{http, telemetry};

struct Backends {
    templates: Arc<dyn TemplateStore>,
    routes: Arc<dyn RouteRepository>,
    stations: Arc<dyn StationRepository>,
    process_paths: Arc<dyn ProcessPathRepository>,
    pick_tasks: Arc<dyn PickTaskRepository>,
    pack_tasks: Arc<dyn PackTaskRepository>,
    consolidations: Arc<dyn ConsolidationRepository>,
    shipments: Arc<dyn ShipmentRepository>,
    manifests: Arc<dyn ManifestRepository>,
    outbox: Arc<dyn OutboxStore>,
    idempotency: Arc<dyn IdempotencyStore>,
}

#[cfg(feature = "mongodb-storage")]
async fn build_backends(config: &Config) -> Result<Backends, Box<dyn std::error::Error>> {
    let client = mongodb::Client::with_uri_str(&config.storage.uri).await?;
    let database = client.database(&config.storage.database);
    Ok(Backends {
        templates: Arc::new(wes_core::storage::mongodb::MongoTemplateStore::new(&database).await?),
        routes: Arc::new(wes_core::storage::mongodb::MongoRouteRepository::new(&database).await?),
        stations: Arc::new(wes_core::storage::mongodb::MongoStationRepository::new(&database).await?),
        process_paths: Arc::new(wes_core::storage::mongodb::MongoProcessPathRepository::new(&database).await?),
        pick_tasks: Arc::new(wes_core::storage::mongodb::MongoPickTaskRepository::new(&database).await?),
        pack_tasks: Arc::new(wes_core::storage::mongodb::MongoPackTaskRepository::new(&database).await?),
        consolidations: Arc::new(wes_core::storage::mongodb::MongoConsolidationRepository::new(&database).await?),
        shipments: Arc::new(wes_core::storage::mongodb::MongoShipmentRepository::new(&database).await?),
        manifests: Arc::new(wes_core::storage::mongodb::MongoManifestRepository::new(&database).await?),
        outbox: Arc::new(wes_core::storage::mongodb::MongoOutboxStore::new(&database).await?),
        idempotency: Arc::new(wes_core::storage::mongodb::MongoIdempotencyStore::new(&database).await?),
    })
}

#[cfg(not(feature = "mongodb-storage"))]
async fn build_backends(_config: &Config) -> Result<Backends, Box<dyn std::error::Error>> {
    use wes_core::execution_plan::consolidation_store::in_memory::InMemoryConsolidationRepository;
    use wes_core::execution_plan::manifest_store::in_memory::InMemoryManifestRepository;
    use wes_core::execution_plan::pack_task_store::in_memory::InMemoryPackTaskRepository;
    use wes_core::execution_plan::pick_task_store::in_memory::InMemoryPickTaskRepository;
    use wes_core::execution_plan::route::in_memory::InMemoryRouteRepository;
    use wes_core::execution_plan::shipment_store::in_memory::InMemoryShipmentRepository;
    use wes_core::execution_plan::station_store::in_memory::InMemoryStationRepository;
    use wes_core::execution_plan::template_store::in_memory::InMemoryTemplateStore;
    use wes_core::idempotency::in_memory::InMemoryIdempotencyStore;
    use wes_core::outbox::in_memory::InMemoryOutboxStore;
    use wes_core::process_path::store::in_memory::InMemoryProcessPathRepository;

    let template_store = InMemoryTemplateStore::default();
    template_store.seed(wes_core::domain::stage_template::StageTemplate::built_in_pick_pack());

    Ok(Backends {
        templates: Arc::new(template_store),
        routes: Arc::new(InMemoryRouteRepository::default()),
        stations: Arc::new(InMemoryStationRepository::default()),
        process_paths: Arc::new(InMemoryProcessPathRepository::default()),
        pick_tasks: Arc::new(InMemoryPickTaskRepository::default()),
        pack_tasks: Arc::new(InMemoryPackTaskRepository::default()),
        consolidations: Arc::new(InMemoryConsolidationRepository::default()),
        shipments: Arc::new(InMemoryShipmentRepository::default()),
        manifests: Arc::new(InMemoryManifestRepository::default()),
        outbox: Arc::new(InMemoryOutboxStore::default()),
        idempotency: Arc::new(InMemoryIdempotencyStore::default()),
    })
}

#[cfg(feature = "kafka")]
fn build_bus(config: &Config) -> Result<Arc<dyn EventBus>, Box<dyn std::error::Error>> {
    Ok(Arc::new(wes_core::outbox::bus::kafka::KafkaEventBus::new(&config.bus.brokers)?))
}

#[cfg(not(feature = "kafka"))]
fn build_bus(_config: &Config) -> Result<Arc<dyn EventBus>, Box<dyn std::error::Error>> {
    Ok(Arc::new(wes_core::outbox::bus::channel::InMemoryEventBus::new(1024)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    telemetry::init(&config);

    info!(environment = %config.environment, addr = %config.server.addr, "starting wes-server");

    let backends = build_backends(&config).await?;
    let bus = build_bus(&config)?;

    let client_timeout = Duration::from_secs(10);
    let labor: Arc<dyn LaborClient> = Arc::new(HttpLaborClient::new(
        config.services.labor_url.clone(),
        client_timeout,
        config.retry.clone(),
    )?);
    let inventory: Arc<dyn InventoryClient> = Arc::new(HttpInventoryClient::new(
        config.services.inventory_url.clone(),
        client_timeout,
        config.retry.clone(),
    )?);

    let publisher = Publisher::new(backends.outbox.clone(), bus, config.outbox.clone());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let publisher_task = tokio::spawn(async move { publisher.run(shutdown_rx).await });

    let state = http::AppState {
        templates: backends.templates,
        routes: backends.routes,
        stations: backends.stations,
        process_paths: backends.process_paths,
        labor,
        inventory,
        outbox: backends.outbox.clone(),
        thresholds: config.thresholds,
        retry: config.retry.clone(),
    };

    let app = http::router(state, backends.idempotency, config.idempotency.clone(), "wes-core");

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    info!(addr = %config.server.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = publisher_task.await;
    Ok(())
}
