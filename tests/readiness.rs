//! Integration tests for the readiness wait, listener gating, data reads
//! and lifecycle orchestration of the configurable microservice.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;

use configgate::configuration::{
    ChangeCounts, ConfigurableMicroservice, ConfigurationListener, ConfigurationMonitor,
    ConfigurationState, ReadinessSettings,
};
use configgate::error::ConfigGateError;
use configgate::lifecycle::{ComponentStatus, LifecycleComponent};

const FIXED_BYTES: &[u8] = b"\x00\x01tenant: acme\n\xff";

#[derive(Default)]
struct StubMonitor {
    fail_initialize: bool,
    fail_stop: bool,
    calls: Mutex<Vec<&'static str>>,
    listeners: Mutex<Vec<Arc<dyn ConfigurationListener>>>,
}

impl StubMonitor {
    fn failing_initialize() -> Self {
        Self {
            fail_initialize: true,
            ..Self::default()
        }
    }

    fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn listeners(&self) -> Vec<Arc<dyn ConfigurationListener>> {
        self.listeners.lock().clone()
    }

    fn cache_initialized(&self) {
        for listener in self.listeners() {
            listener.on_configuration_cache_initialized();
        }
    }

    fn churn(&self, rounds: usize) {
        let data = Bytes::from_static(b"v");
        for listener in self.listeners() {
            for _ in 0..rounds {
                listener.on_configuration_added("app.yaml", &data);
                listener.on_configuration_updated("app.yaml", &data);
                listener.on_configuration_deleted("app.yaml");
            }
        }
    }
}

#[async_trait]
impl LifecycleComponent for StubMonitor {
    fn component_name(&self) -> &str {
        "stub monitor"
    }

    async fn initialize(&self) -> Result<(), ConfigGateError> {
        self.calls.lock().push("initialize");
        if self.fail_initialize {
            return Err(ConfigGateError::StoreUnavailable {
                store: "stub",
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }

    async fn start(&self) -> Result<(), ConfigGateError> {
        self.calls.lock().push("start");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ConfigGateError> {
        self.calls.lock().push("stop");
        if self.fail_stop {
            return Err(ConfigGateError::StoreUnavailable {
                store: "stub",
                reason: "watch task did not exit".into(),
            });
        }
        Ok(())
    }

    async fn terminate(&self) -> Result<(), ConfigGateError> {
        self.calls.lock().push("terminate");
        Ok(())
    }
}

impl ConfigurationMonitor for StubMonitor {
    fn add_listener(&self, listener: Arc<dyn ConfigurationListener>) {
        self.listeners.lock().push(listener);
    }

    fn configuration_data_for(&self, _path: &str) -> Result<Bytes, ConfigGateError> {
        Ok(Bytes::from_static(FIXED_BYTES))
    }
}

fn service_with(stub: &Arc<StubMonitor>) -> ConfigurableMicroservice {
    let stub = stub.clone();
    ConfigurableMicroservice::new(
        "test-service",
        move || -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError> { Ok(stub.clone()) },
    )
}

fn idle_service() -> Arc<ConfigurableMicroservice> {
    Arc::new(service_with(&Arc::new(StubMonitor::default())))
}

// -- waitForConfigurationReady --

#[tokio::test(start_paused = true)]
async fn wait_returns_once_configuration_succeeds() {
    let service = idle_service();
    let writer = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4_500)).await;
        writer
            .set_configuration_state(ConfigurationState::Succeeded)
            .unwrap();
    });

    let started = Instant::now();
    service.wait_for_configuration_ready().await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(4_500));
    assert!(elapsed <= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn wait_returns_immediately_when_already_succeeded() {
    let service = idle_service();
    service
        .set_configuration_state(ConfigurationState::Succeeded)
        .unwrap();

    let started = Instant::now();
    service.wait_for_configuration_ready().await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn wait_fails_fast_on_failed_configuration() {
    let service = idle_service();
    let writer = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        writer
            .set_configuration_state(ConfigurationState::Loading)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        writer
            .set_configuration_state(ConfigurationState::Failed)
            .unwrap();
    });

    let started = Instant::now();
    let err = service.wait_for_configuration_ready().await.unwrap_err();
    assert!(matches!(err, ConfigGateError::ConfigurationFailed));
    assert!(started.elapsed() < Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn wait_times_out_after_thirty_seconds() {
    let service = idle_service();

    let started = Instant::now();
    let err = service.wait_for_configuration_ready().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ConfigGateError::ConfigurationTimeout { .. }));
    assert!(elapsed >= Duration::from_secs(30), "timed out early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(31), "timed out late: {elapsed:?}");
    assert_eq!(service.configuration_state(), ConfigurationState::NotStarted);
}

#[tokio::test(start_paused = true)]
async fn failure_just_before_deadline_is_not_a_timeout() {
    let service = idle_service();
    let writer = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(29_500)).await;
        writer
            .set_configuration_state(ConfigurationState::Failed)
            .unwrap();
    });

    let started = Instant::now();
    let err = service.wait_for_configuration_ready().await.unwrap_err();
    assert!(matches!(err, ConfigGateError::ConfigurationFailed), "got {err:?}");
    assert_eq!(started.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn deadline_is_not_rounded_up_to_the_poll_interval() {
    let stub = Arc::new(StubMonitor::default());
    let factory_stub = stub.clone();
    let service = ConfigurableMicroservice::with_readiness(
        "test-service",
        move || -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError> {
            Ok(factory_stub.clone())
        },
        ReadinessSettings {
            max_wait: Duration::from_secs(30),
            poll_interval: Duration::from_secs(7),
        },
    );

    let started = Instant::now();
    let err = service.wait_for_configuration_ready().await.unwrap_err();
    assert!(matches!(err, ConfigGateError::ConfigurationTimeout { .. }));
    assert_eq!(started.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn loading_state_still_times_out() {
    let service = idle_service();
    service
        .set_configuration_state(ConfigurationState::Loading)
        .unwrap();

    let err = service.wait_for_configuration_ready().await.unwrap_err();
    assert!(matches!(err, ConfigGateError::ConfigurationTimeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_returns_quietly() {
    let service = idle_service();
    let canceller = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        canceller.cancel_wait();
    });

    let started = Instant::now();
    service.wait_for_configuration_ready().await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_millis(2_500));
    assert_eq!(service.configuration_state(), ConfigurationState::NotStarted);
}

#[tokio::test(start_paused = true)]
async fn wait_after_cancel_returns_immediately() {
    let service = idle_service();
    service.cancel_wait();

    let started = Instant::now();
    service.wait_for_configuration_ready().await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn terminate_cancels_pending_wait() {
    let service = idle_service();
    let waiter = {
        let service = service.clone();
        tokio::spawn(async move { service.wait_for_configuration_ready().await })
    };

    tokio::time::sleep(Duration::from_secs(2)).await;
    service.terminate().await.unwrap();
    assert!(waiter.await.unwrap().is_ok());
}

// -- listener gating --

#[tokio::test]
async fn mutation_callbacks_before_cache_ready_have_no_effect() {
    let stub = Arc::new(StubMonitor::default());
    let service = service_with(&stub);
    service.initialize().await.unwrap();

    stub.churn(10);

    assert!(!service.is_configuration_cache_ready());
    assert_eq!(service.configuration_changes(), ChangeCounts::default());
    assert_eq!(service.configuration_state(), ConfigurationState::NotStarted);
}

#[tokio::test]
async fn mutation_callbacks_after_cache_ready_are_observed_once_each() {
    let stub = Arc::new(StubMonitor::default());
    let service = service_with(&stub);
    service.initialize().await.unwrap();

    stub.churn(2);
    stub.cache_initialized();
    assert!(service.is_configuration_cache_ready());
    assert_eq!(service.configuration_state(), ConfigurationState::Loading);

    stub.churn(3);
    assert_eq!(
        service.configuration_changes(),
        ChangeCounts {
            added: 3,
            updated: 3,
            deleted: 3
        }
    );

    stub.cache_initialized();
    assert!(service.is_configuration_cache_ready());
}

// -- getConfigurationDataFor --

#[tokio::test]
async fn data_read_requires_cache_ready() {
    let stub = Arc::new(StubMonitor::default());
    let service = service_with(&stub);
    service.initialize().await.unwrap();

    assert!(matches!(
        service.configuration_data_for("app.yaml"),
        Err(ConfigGateError::ConfigurationNotReady)
    ));

    stub.cache_initialized();
    let data = service.configuration_data_for("app.yaml").unwrap();
    assert_eq!(data.as_ref(), FIXED_BYTES);
}

#[test]
fn data_read_before_initialize_is_not_ready() {
    let service = idle_service();
    assert!(matches!(
        service.configuration_data_for("app.yaml"),
        Err(ConfigGateError::ConfigurationNotReady)
    ));
}

// -- lifecycle orchestration --

#[tokio::test]
async fn initialize_runs_init_then_start() {
    let stub = Arc::new(StubMonitor::default());
    let service = service_with(&stub);

    service.initialize().await.unwrap();

    assert_eq!(stub.calls(), vec!["initialize", "start"]);
    assert_eq!(stub.listeners().len(), 1);
    assert_eq!(service.status(), ComponentStatus::Initialized);
    assert!(service.configuration_monitor().is_some());
}

#[tokio::test]
async fn failed_monitor_init_aborts_before_start() {
    let stub = Arc::new(StubMonitor::failing_initialize());
    let service = service_with(&stub);

    let err = service.initialize().await.unwrap_err();
    match err {
        ConfigGateError::LifecycleStepFailed {
            step,
            message,
            source,
        } => {
            assert_eq!(step, "Initialize Configuration Monitor");
            assert_eq!(message, "Unable to initialize configuration monitor");
            assert!(matches!(*source, ConfigGateError::StoreUnavailable { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stub.calls(), vec!["initialize"]);
    assert_eq!(service.status(), ComponentStatus::Error);
}

#[tokio::test]
async fn initialize_twice_is_rejected() {
    let stub = Arc::new(StubMonitor::default());
    let service = service_with(&stub);
    service.initialize().await.unwrap();

    assert!(matches!(
        service.initialize().await,
        Err(ConfigGateError::InvalidComponentState {
            action: "initialize",
            ..
        })
    ));
    assert_eq!(stub.calls(), vec!["initialize", "start"]);
}

#[tokio::test]
async fn factory_failure_surfaces_unchanged() {
    let service = ConfigurableMicroservice::new(
        "broken",
        || -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError> {
            Err(ConfigGateError::NoConfigStore {
                hint: "none".into(),
            })
        },
    );
    assert!(matches!(
        service.initialize().await,
        Err(ConfigGateError::NoConfigStore { .. })
    ));
    service.terminate().await.unwrap();
}

#[tokio::test]
async fn terminate_stops_then_terminates_unconfigured_monitor() {
    let stub = Arc::new(StubMonitor::default());
    let service = service_with(&stub);
    service.initialize().await.unwrap();

    service.terminate().await.unwrap();

    assert_eq!(stub.calls(), vec!["initialize", "start", "stop", "terminate"]);
    assert_eq!(service.status(), ComponentStatus::Terminated);
    assert!(service.configuration_monitor().is_none());
}

#[tokio::test]
async fn terminate_after_failed_init_still_tears_down() {
    let stub = Arc::new(StubMonitor::failing_initialize());
    let service = service_with(&stub);
    assert!(service.initialize().await.is_err());

    service.terminate().await.unwrap();
    assert_eq!(stub.calls(), vec!["initialize", "stop", "terminate"]);
}

#[tokio::test]
async fn failed_monitor_stop_still_terminates_monitor() {
    let stub = Arc::new(StubMonitor::failing_stop());
    let service = service_with(&stub);
    service.initialize().await.unwrap();

    service.terminate().await.unwrap();

    assert_eq!(stub.calls(), vec!["initialize", "start", "stop", "terminate"]);
    assert_eq!(service.status(), ComponentStatus::Terminated);
}

#[tokio::test]
async fn terminate_without_initialize_is_harmless() {
    let stub = Arc::new(StubMonitor::default());
    let service = service_with(&stub);

    service.terminate().await.unwrap();
    service.terminate().await.unwrap();

    assert!(stub.calls().is_empty());
    assert_eq!(service.status(), ComponentStatus::Terminated);
}
