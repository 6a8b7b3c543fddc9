//! `configgate run` -- gate the service on its distributed configuration.
//!
//! Resolves settings, connects the coordination store, initializes the
//! configurable microservice, serves `/health` and `/ready`, and blocks on
//! configuration readiness. A background task judges the loaded
//! configuration against the required paths. On SIGTERM / Ctrl+C the
//! readiness wait is cancelled, the server drains, and the monitor is
//! stopped and terminated.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::cli::RunArgs;
use crate::configuration::validation::settle_configuration_state;
use crate::configuration::ConfigurableMicroservice;
use crate::error::ConfigGateError;
use crate::logging;
use crate::monitor::StoreMonitorFactory;
use crate::server::{self, AppState};
use crate::settings::{self, model::Settings, model::StoreSettings, validation};
use crate::store::{ConfigStore, DirectoryStore, MemoryStore};

pub async fn execute(args: RunArgs) -> Result<(), ConfigGateError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let settings = resolve_settings(&args).await?;
    let store = connect_store(&settings.store).await?;
    let store_name = store.name();

    let service = Arc::new(ConfigurableMicroservice::with_readiness(
        settings.name.clone(),
        StoreMonitorFactory::new(store, settings.root.clone(), settings.poll_interval()),
        settings.readiness.into(),
    ));

    // Shutdown signal: trips the readiness wait and drains the server
    let (shutdown_tx, _) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    {
        let shutdown_tx = shutdown_tx.clone();
        let service = service.clone();
        tokio::spawn(async move {
            server::shutdown_signal().await;
            service.cancel_wait();
            shutdown_tx.send_replace(true);
        });
    }

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let router = server::build_router(Arc::new(AppState {
        service: service.clone(),
        start_time: Instant::now(),
        store: store_name,
        root: settings.root.clone(),
    }));
    let mut server_shutdown = shutdown_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    tracing::info!(
        addr = %addr,
        service = %settings.name,
        store = store_name,
        root = %settings.root,
        "configgate started"
    );

    if let Err(e) = service.initialize().await {
        tracing::error!(error = %e, "microservice initialization failed");
        shutdown_tx.send_replace(true);
        finish(&service, server_handle).await?;
        return Err(e);
    }

    let judge = {
        let service = service.clone();
        let required = settings.required_paths.clone();
        let poll = settings.readiness.poll_interval_secs;
        tokio::spawn(async move {
            settle_configuration_state(&service, &required, std::time::Duration::from_secs(poll))
                .await
        })
    };

    let readiness = service.wait_for_configuration_ready().await;
    judge.abort();

    match &readiness {
        Ok(()) if !*shutdown_tx.borrow() => {
            tracing::info!(service = %settings.name, "service ready");
            let mut stop = shutdown_tx.subscribe();
            let _ = stop.wait_for(|stop| *stop).await;
        }
        Ok(()) => {}
        Err(e) => {
            tracing::error!(error = %e, "configuration not ready, shutting down");
            shutdown_tx.send_replace(true);
        }
    }

    finish(&service, server_handle).await?;
    tracing::info!("configgate stopped");
    readiness
}

async fn finish(
    service: &ConfigurableMicroservice,
    server_handle: tokio::task::JoinHandle<std::io::Result<()>>,
) -> Result<(), ConfigGateError> {
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "health server failed"),
        Err(e) => tracing::error!(error = %e, "health server task failed"),
    }
    service.terminate().await
}

async fn resolve_settings(args: &RunArgs) -> Result<Settings, ConfigGateError> {
    let mut settings = settings::resolve(args.settings.as_deref()).await?;

    if let Some(ref name) = args.name {
        settings.name.clone_from(name);
    }
    if let Some(ref root) = args.root {
        settings.root.clone_from(root);
    }
    if !args.required_paths.is_empty() {
        settings.required_paths.clone_from(&args.required_paths);
    }
    if let Some(ref dir) = args.store_dir {
        settings.store = StoreSettings::Directory { path: dir.clone() };
    }
    #[cfg(feature = "redis")]
    if let Some(ref url) = args.redis_url {
        settings.store = StoreSettings::Redis { url: url.clone() };
    }
    if let Some(interval) = args.poll_interval {
        settings.poll_interval_secs = interval;
    }
    if let Some(ref host) = args.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    validation::validate(&settings)
        .map_err(|errors| ConfigGateError::SettingsValidation { errors })?;
    Ok(settings)
}

async fn connect_store(store: &StoreSettings) -> Result<Arc<dyn ConfigStore>, ConfigGateError> {
    match store {
        StoreSettings::Directory { path } => Ok(Arc::new(DirectoryStore::new(path.clone()))),
        StoreSettings::Memory => {
            tracing::warn!("memory store selected, configuration will stay empty");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "redis")]
        StoreSettings::Redis { url } => Ok(Arc::new(
            crate::store::redis_store::RedisStore::new(url).await?,
        )),
        #[cfg(not(feature = "redis"))]
        StoreSettings::Redis { .. } => Err(ConfigGateError::NoConfigStore {
            hint: "This build has no redis support. Rebuild with --features redis,\n  \
                   or use --store-dir <path> for a directory store."
                .into(),
        }),
    }
}
