//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Initialize all subsystems in dependency order
//! - Assemble the API router handed to the setup handler
//!
//! # Design Decisions
//! - Fail fast: the first failing step ends the sequence
//! - Subsystems initialize in order, not concurrently
//! - The listener is already serving; a failure is reported, never fatal
//! - Fallible constructions go through `ComponentFactory` so tests can
//!   substitute or fail any of them

use std::fmt;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;

use crate::api::{self, ApiState, RouterError};
use crate::checker::Checker;
use crate::config::{validate_config, ControllerConfig, DatabaseConfig, ValidationError};
use crate::nginx::{GenerateError, Generator, NginxGenerator};
use crate::notification::TenantProducerCache;
use crate::observability::metrics::Reporter;
use crate::proxyconfig::ProxyConfigManager;
use crate::registry::{HttpRegistry, Registry, RegistryError};
use crate::storage::{Storage, StorageError};

/// Bootstrap steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    ValidateConfig,
    Storage,
    Registry,
    ProxyConfig,
    Checker,
    Generator,
    Router,
}

impl BootstrapStep {
    pub const ALL: [BootstrapStep; 7] = [
        Self::ValidateConfig,
        Self::Storage,
        Self::Registry,
        Self::ProxyConfig,
        Self::Checker,
        Self::Generator,
        Self::Router,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidateConfig => "validate_config",
            Self::Storage => "storage",
            Self::Registry => "registry",
            Self::ProxyConfig => "proxy_config",
            Self::Checker => "checker",
            Self::Generator => "generator",
            Self::Router => "router",
        }
    }
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration invalid: {}", join_errors(.0))]
    Configuration(Vec<ValidationError>),
    #[error("storage backend construction failed: {0}")]
    Storage(#[source] StorageError),
    #[error("registry client construction failed: {0}")]
    Registry(#[source] RegistryError),
    #[error("config generator construction failed: {0}")]
    Generator(#[source] GenerateError),
    #[error("router construction failed: {0}")]
    Router(#[source] RouterError),
}

impl BootstrapError {
    /// The step that failed.
    pub fn step(&self) -> BootstrapStep {
        match self {
            Self::Configuration(_) => BootstrapStep::ValidateConfig,
            Self::Storage(_) => BootstrapStep::Storage,
            Self::Registry(_) => BootstrapStep::Registry,
            Self::Generator(_) => BootstrapStep::Generator,
            Self::Router(_) => BootstrapStep::Router,
        }
    }
}

/// Constructors for the fallible collaborators.
pub trait ComponentFactory: Send + 'static {
    fn storage(&self, database: &DatabaseConfig) -> Result<Storage, StorageError>;

    fn registry(&self, config: &ControllerConfig) -> Result<Arc<dyn Registry>, RegistryError>;

    fn generator(
        &self,
        config: &ControllerConfig,
        checker: Arc<Checker>,
        proxy_config: Arc<ProxyConfigManager>,
    ) -> Result<Arc<dyn Generator>, GenerateError>;

    fn router(&self, config: &ControllerConfig, state: ApiState) -> Result<Router, RouterError>;
}

/// Production collaborators.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultComponents;

impl ComponentFactory for DefaultComponents {
    fn storage(&self, database: &DatabaseConfig) -> Result<Storage, StorageError> {
        Storage::for_kind(&database.kind)
    }

    fn registry(&self, config: &ControllerConfig) -> Result<Arc<dyn Registry>, RegistryError> {
        Ok(Arc::new(HttpRegistry::new(config.registry_timeout())?))
    }

    fn generator(
        &self,
        config: &ControllerConfig,
        checker: Arc<Checker>,
        proxy_config: Arc<ProxyConfigManager>,
    ) -> Result<Arc<dyn Generator>, GenerateError> {
        let generator =
            NginxGenerator::from_template_file(&config.nginx_template, checker, proxy_config)?;
        Ok(Arc::new(generator))
    }

    fn router(&self, config: &ControllerConfig, state: ApiState) -> Result<Router, RouterError> {
        api::build_router(state, config.request_timeout())
    }
}

/// Result of a successful bootstrap.
pub struct Application {
    pub router: Router,
    pub checker: Arc<Checker>,
    pub proxy_config: Arc<ProxyConfigManager>,
    pub producers: Arc<TenantProducerCache>,
}

/// Runs the ordered setup sequence exactly once.
pub struct Bootstrapper<F> {
    config: ControllerConfig,
    factory: F,
}

impl<F: ComponentFactory> Bootstrapper<F> {
    pub fn new(config: ControllerConfig, factory: F) -> Self {
        Self { config, factory }
    }

    pub fn run(self) -> Result<Application, BootstrapError> {
        let config = &self.config;
        let factory = &self.factory;

        step(BootstrapStep::ValidateConfig);
        validate_config(config).map_err(BootstrapError::Configuration)?;
        let reporter = Reporter::new();

        step(BootstrapStep::Storage);
        let storage = factory
            .storage(&config.database)
            .map_err(BootstrapError::Storage)?;

        step(BootstrapStep::Registry);
        let registry = factory.registry(config).map_err(BootstrapError::Registry)?;
        let producers = Arc::new(TenantProducerCache::new(config.producer_idle()));

        step(BootstrapStep::ProxyConfig);
        let proxy_config = Arc::new(ProxyConfigManager::new(
            storage.rules,
            Arc::clone(&producers),
        ));

        step(BootstrapStep::Checker);
        let checker = Arc::new(Checker::new(
            storage.catalog,
            Arc::clone(&proxy_config),
            registry,
            Arc::clone(&producers),
            config.registry_timeout(),
        ));

        step(BootstrapStep::Generator);
        let generator = factory
            .generator(config, Arc::clone(&checker), Arc::clone(&proxy_config))
            .map_err(BootstrapError::Generator)?;

        step(BootstrapStep::Router);
        let state = ApiState {
            checker: Arc::clone(&checker),
            generator,
            proxy_config: Arc::clone(&proxy_config),
            reporter,
        };
        let router = factory
            .router(config, state)
            .map_err(BootstrapError::Router)?;

        tracing::info!("Bootstrap complete");
        Ok(Application {
            router,
            checker,
            proxy_config,
            producers,
        })
    }
}

fn step(step: BootstrapStep) {
    tracing::debug!(step = step.as_str(), "Bootstrap step starting");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::registry::RegistryFuture;
    use crate::storage::RegistryEndpoint;

    struct NoRegistry;

    impl Registry for NoRegistry {
        fn instances<'a>(&'a self, endpoint: &'a RegistryEndpoint) -> RegistryFuture<'a> {
            Box::pin(async move {
                Err(RegistryError::Timeout {
                    url: endpoint.url.clone(),
                })
            })
        }
    }

    struct StubGenerator;

    impl Generator for StubGenerator {
        fn generate(&self, sink: &mut dyn std::io::Write, id: &str) -> Result<(), GenerateError> {
            write!(sink, "# {id}")?;
            Ok(())
        }
    }

    /// Records every factory call and fails at `fail_at`.
    struct RecordingFactory {
        calls: Arc<Mutex<Vec<BootstrapStep>>>,
        fail_at: Option<BootstrapStep>,
    }

    impl RecordingFactory {
        fn new(fail_at: Option<BootstrapStep>) -> (Self, Arc<Mutex<Vec<BootstrapStep>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    calls: Arc::clone(&calls),
                    fail_at,
                },
                calls,
            )
        }

        fn enter(&self, step: BootstrapStep) -> bool {
            self.calls.lock().unwrap().push(step);
            self.fail_at == Some(step)
        }
    }

    impl ComponentFactory for RecordingFactory {
        fn storage(&self, database: &DatabaseConfig) -> Result<Storage, StorageError> {
            if self.enter(BootstrapStep::Storage) {
                return Err(StorageError::UnsupportedBackend(database.kind.clone()));
            }
            Ok(Storage::memory())
        }

        fn registry(&self, _config: &ControllerConfig) -> Result<Arc<dyn Registry>, RegistryError> {
            if self.enter(BootstrapStep::Registry) {
                return Err(RegistryError::Timeout {
                    url: "http://registry".into(),
                });
            }
            Ok(Arc::new(NoRegistry))
        }

        fn generator(
            &self,
            _config: &ControllerConfig,
            _checker: Arc<Checker>,
            _proxy_config: Arc<ProxyConfigManager>,
        ) -> Result<Arc<dyn Generator>, GenerateError> {
            if self.enter(BootstrapStep::Generator) {
                return Err(GenerateError::TemplatePlaceholder {
                    path: "nginx.conf.tmpl".into(),
                    placeholder: "{{upstreams}}",
                });
            }
            Ok(Arc::new(StubGenerator))
        }

        fn router(&self, _config: &ControllerConfig, state: ApiState) -> Result<Router, RouterError> {
            if self.enter(BootstrapStep::Router) {
                return Err(RouterError::Duplicate {
                    method: "GET".into(),
                    path: "/health".into(),
                });
            }
            api::build_router(state, Duration::from_secs(5))
        }
    }

    fn valid_config() -> ControllerConfig {
        ControllerConfig {
            control_token: "token".into(),
            secret_key: "0123456789abcdef".into(),
            metrics_host: "127.0.0.1:9125".into(),
            ..ControllerConfig::default()
        }
    }

    const FACTORY_STEPS: [BootstrapStep; 4] = [
        BootstrapStep::Storage,
        BootstrapStep::Registry,
        BootstrapStep::Generator,
        BootstrapStep::Router,
    ];

    #[test]
    fn test_success_runs_every_step_in_order() {
        let (factory, calls) = RecordingFactory::new(None);
        let app = Bootstrapper::new(valid_config(), factory).run();
        assert!(app.is_ok());
        assert_eq!(*calls.lock().unwrap(), FACTORY_STEPS.to_vec());
    }

    #[test]
    fn test_invalid_config_runs_no_construction() {
        let (factory, calls) = RecordingFactory::new(None);
        let mut config = valid_config();
        config.secret_key = "short".into();

        let err = Bootstrapper::new(config, factory).run().err().unwrap();
        assert_eq!(err.step(), BootstrapStep::ValidateConfig);
        assert!(err.to_string().starts_with("configuration invalid: secret_key"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_short_circuits_later_steps() {
        for (index, failing) in FACTORY_STEPS.iter().enumerate() {
            let (factory, calls) = RecordingFactory::new(Some(*failing));
            let err = Bootstrapper::new(valid_config(), factory).run().err().unwrap();

            assert_eq!(err.step(), *failing);
            assert!(err.to_string().contains("construction failed"));
            assert_eq!(*calls.lock().unwrap(), FACTORY_STEPS[..=index].to_vec());
        }
    }

    #[test]
    fn test_default_components_reject_unknown_backend() {
        let mut config = valid_config();
        config.database.kind = "cloudant".into();
        config.database.username = "u".into();
        config.database.password = "p".into();
        config.database.host = "db.example.com".into();

        let err = Bootstrapper::new(config, DefaultComponents).run().err().unwrap();
        assert_eq!(err.step(), BootstrapStep::Storage);
        assert_eq!(
            err.to_string(),
            "storage backend construction failed: unsupported database type \"cloudant\""
        );
    }

    #[test]
    fn test_default_components_report_missing_template() {
        let mut config = valid_config();
        config.nginx_template = "/nonexistent/nginx.conf.tmpl".into();

        let err = Bootstrapper::new(config, DefaultComponents).run().err().unwrap();
        assert_eq!(err.step(), BootstrapStep::Generator);
        assert!(err.to_string().contains("/nonexistent/nginx.conf.tmpl"));
    }

    #[test]
    fn test_step_order_is_stable() {
        let names: Vec<_> = BootstrapStep::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["validate_config", "storage", "registry", "proxy_config", "checker", "generator", "router"]
        );
    }
}
