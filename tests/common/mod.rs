//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use proxy_controller::api::{self, ApiState, RouterError};
use proxy_controller::checker::Checker;
use proxy_controller::config::{ControllerConfig, DatabaseConfig};
use proxy_controller::lifecycle::{self, ComponentFactory, Shutdown};
use proxy_controller::nginx::{GenerateError, Generator, NginxGenerator};
use proxy_controller::proxyconfig::ProxyConfigManager;
use proxy_controller::registry::{Registry, RegistryError, RegistryFuture};
use proxy_controller::storage::{
    LoadBalance, RegistryEndpoint, ServiceCatalog, Storage, StorageError, TenantConfig,
};

pub const TEMPLATE: &str = "# {{tenant}}\n{{upstreams}}\nserver {\n{{locations}}\n}\n";

/// A configuration that passes validation.
pub fn valid_config() -> ControllerConfig {
    ControllerConfig {
        control_token: "token".into(),
        secret_key: "0123456789abcdef".into(),
        metrics_host: "127.0.0.1:9125".into(),
        ..ControllerConfig::default()
    }
}

/// Registry that counts lookups and reports no instances.
#[derive(Default)]
pub struct CountingRegistry {
    pub calls: AtomicUsize,
}

impl Registry for CountingRegistry {
    fn instances<'a>(&'a self, _endpoint: &'a RegistryEndpoint) -> RegistryFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok::<_, RegistryError>(Vec::new()) })
    }
}

/// In-process collaborators with one pre-seeded tenant.
///
/// When gated, the storage step blocks until the gate is released.
pub struct TestComponents {
    pub registry: Arc<CountingRegistry>,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
}

impl TestComponents {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(CountingRegistry::default()),
            gate: Mutex::new(None),
        }
    }

    /// Components whose bootstrap waits for the returned sender.
    pub fn gated() -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let components = Self::new();
        *components.gate.lock().unwrap() = Some(rx);
        (components, tx)
    }
}

impl ComponentFactory for TestComponents {
    fn storage(&self, _database: &DatabaseConfig) -> Result<Storage, StorageError> {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            let _ = gate.recv();
        }

        let storage = Storage::memory();
        storage.rules.create(TenantConfig {
            id: "t1".into(),
            registry: RegistryEndpoint {
                url: "http://registry.invalid".into(),
                token: String::new(),
            },
            load_balance: LoadBalance::RoundRobin,
            versions: Vec::new(),
        })?;
        storage.catalog.create(ServiceCatalog::empty("t1"))?;
        Ok(storage)
    }

    fn registry(&self, _config: &ControllerConfig) -> Result<Arc<dyn Registry>, RegistryError> {
        Ok(self.registry.clone())
    }

    fn generator(
        &self,
        _config: &ControllerConfig,
        checker: Arc<Checker>,
        proxy_config: Arc<ProxyConfigManager>,
    ) -> Result<Arc<dyn Generator>, GenerateError> {
        let generator =
            NginxGenerator::from_template("test.tmpl".into(), TEMPLATE.into(), checker, proxy_config)?;
        Ok(Arc::new(generator))
    }

    fn router(&self, config: &ControllerConfig, state: ApiState) -> Result<Router, RouterError> {
        api::build_router(state, config.request_timeout())
    }
}

/// A controller running in the background on an ephemeral port.
pub struct RunningController {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<std::io::Result<()>>,
}

impl RunningController {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("controller did not stop")
            .unwrap()
            .unwrap();
    }
}

pub async fn start_controller<F: ComponentFactory>(config: ControllerConfig, factory: F) -> RunningController {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { lifecycle::run(config, factory, listener, &shutdown).await })
    };

    RunningController { addr, shutdown, task }
}

/// Poll `url` until it answers with `status`, returning the body.
pub async fn wait_for_status(client: &reqwest::Client, url: &str, status: u16) -> String {
    for _ in 0..100 {
        if let Ok(res) = client.get(url).send().await {
            if res.status().as_u16() == status {
                return res.text().await.unwrap();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{url} never returned {status}");
}
