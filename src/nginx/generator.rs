//! Template-based NGINX configuration renderer.

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checker::Checker;
use crate::nginx::{GenerateError, Generator};
use crate::proxyconfig::ProxyConfigManager;
use crate::storage::{Endpoint, LoadBalance, Service, ServiceCatalog, TenantConfig};

pub const TENANT_PLACEHOLDER: &str = "{{tenant}}";
pub const UPSTREAMS_PLACEHOLDER: &str = "{{upstreams}}";
pub const LOCATIONS_PLACEHOLDER: &str = "{{locations}}";

pub struct NginxGenerator {
    template: String,
    checker: Arc<Checker>,
    proxy_config: Arc<ProxyConfigManager>,
}

impl NginxGenerator {
    /// Load the template at `path` and check it can be rendered.
    pub fn from_template_file(
        path: &Path,
        checker: Arc<Checker>,
        proxy_config: Arc<ProxyConfigManager>,
    ) -> Result<Self, GenerateError> {
        let template = fs::read_to_string(path).map_err(|source| GenerateError::TemplateIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_template(path.to_path_buf(), template, checker, proxy_config)
    }

    pub fn from_template(
        path: PathBuf,
        template: String,
        checker: Arc<Checker>,
        proxy_config: Arc<ProxyConfigManager>,
    ) -> Result<Self, GenerateError> {
        for placeholder in [UPSTREAMS_PLACEHOLDER, LOCATIONS_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(GenerateError::TemplatePlaceholder { path, placeholder });
            }
        }
        Ok(Self {
            template,
            checker,
            proxy_config,
        })
    }
}

impl Generator for NginxGenerator {
    fn generate(&self, sink: &mut dyn Write, id: &str) -> Result<(), GenerateError> {
        let tenant = self.proxy_config.get(id)?;
        let catalog = self.checker.catalog(id)?;
        let rendered = render(&self.template, &tenant, &catalog);
        sink.write_all(rendered.as_bytes())?;
        sink.flush()?;
        Ok(())
    }
}

fn upstream_name(tenant: &str, service: &str, version: Option<&str>) -> String {
    let mut name = format!("{tenant}_{service}");
    if let Some(version) = version {
        name.push('_');
        name.push_str(version);
    }
    name.replace(|c: char| !c.is_ascii_alphanumeric() && c != '_', "_")
}

fn balance_directive(load_balance: LoadBalance) -> Option<&'static str> {
    match load_balance {
        LoadBalance::RoundRobin => None,
        LoadBalance::LeastConn => Some("least_conn;"),
        LoadBalance::IpHash => Some("ip_hash;"),
    }
}

fn write_upstream(out: &mut String, name: &str, load_balance: LoadBalance, endpoints: &[&Endpoint]) {
    let _ = writeln!(out, "upstream {name} {{");
    if let Some(directive) = balance_directive(load_balance) {
        let _ = writeln!(out, "    {directive}");
    }
    if endpoints.is_empty() {
        // NGINX rejects an empty upstream block.
        let _ = writeln!(out, "    server 127.0.0.1:65535 down;");
    }
    for endpoint in endpoints {
        let _ = writeln!(out, "    server {};", endpoint.address);
    }
    let _ = writeln!(out, "}}");
}

/// Upstream blocks for one service; returns the upstream default traffic uses.
fn render_service(out: &mut String, tenant: &TenantConfig, service: &Service) -> String {
    let Some(rule) = tenant.version_rule(&service.name) else {
        let name = upstream_name(&tenant.id, &service.name, None);
        let endpoints: Vec<&Endpoint> = service.endpoints.iter().collect();
        write_upstream(out, &name, tenant.load_balance, &endpoints);
        return name;
    };

    let mut versions: Vec<&str> = service
        .endpoints
        .iter()
        .flat_map(|e| e.tags.iter().map(String::as_str))
        .collect();
    versions.push(&rule.default_version);
    versions.sort_unstable();
    versions.dedup();

    for version in versions {
        let name = upstream_name(&tenant.id, &service.name, Some(version));
        let endpoints: Vec<&Endpoint> = service
            .endpoints
            .iter()
            .filter(|e| e.tags.iter().any(|t| t == version))
            .collect();
        write_upstream(out, &name, tenant.load_balance, &endpoints);
    }
    upstream_name(&tenant.id, &service.name, Some(&rule.default_version))
}

/// Render the template for a tenant.
pub fn render(template: &str, tenant: &TenantConfig, catalog: &ServiceCatalog) -> String {
    let mut upstreams = String::new();
    let mut locations = String::new();

    for service in &catalog.services {
        let target = render_service(&mut upstreams, tenant, service);
        let _ = writeln!(locations, "location /{}/ {{", service.name);
        let _ = writeln!(locations, "    proxy_pass http://{target}/;");
        let _ = writeln!(locations, "}}");
    }

    template
        .replace(TENANT_PLACEHOLDER, &tenant.id)
        .replace(UPSTREAMS_PLACEHOLDER, upstreams.trim_end())
        .replace(LOCATIONS_PLACEHOLDER, locations.trim_end())
}
