//! HTTP registry client.

use std::time::Duration;

use serde::Deserialize;

use crate::registry::{Instance, Registry, RegistryError, RegistryFuture};
use crate::storage::{Endpoint, RegistryEndpoint};

#[derive(Debug, Deserialize)]
struct InstancesResponse {
    #[serde(default)]
    instances: Vec<InstanceRecord>,
}

#[derive(Debug, Deserialize)]
struct InstanceRecord {
    service_name: String,
    endpoint: EndpointRecord,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EndpointRecord {
    value: String,
}

impl From<InstanceRecord> for Instance {
    fn from(record: InstanceRecord) -> Self {
        (
            record.service_name,
            Endpoint {
                address: record.endpoint.value,
                tags: record.tags,
            },
        )
    }
}

/// Registry client speaking the registry's JSON instances API.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
}

impl HttpRegistry {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RegistryError::Client)?;
        Ok(Self { client })
    }

    fn instances_url(endpoint: &RegistryEndpoint) -> String {
        format!("{}/api/v1/instances", endpoint.url.trim_end_matches('/'))
    }
}

impl Registry for HttpRegistry {
    fn instances<'a>(&'a self, endpoint: &'a RegistryEndpoint) -> RegistryFuture<'a> {
        Box::pin(async move {
            let url = Self::instances_url(endpoint);
            let mut request = self.client.get(&url);
            if !endpoint.token.is_empty() {
                request = request.bearer_auth(&endpoint.token);
            }

            let response = request.send().await.map_err(|source| {
                if source.is_timeout() {
                    RegistryError::Timeout { url: url.clone() }
                } else {
                    RegistryError::Request {
                        url: url.clone(),
                        source,
                    }
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RegistryError::Status {
                    url,
                    status: status.as_u16(),
                });
            }

            let body: InstancesResponse = response
                .json()
                .await
                .map_err(|source| RegistryError::Request { url, source })?;

            Ok(body.instances.into_iter().map(Instance::from).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_url() {
        let endpoint = RegistryEndpoint {
            url: "http://registry:8080/".into(),
            token: String::new(),
        };
        assert_eq!(
            HttpRegistry::instances_url(&endpoint),
            "http://registry:8080/api/v1/instances"
        );
    }

    #[test]
    fn test_decode_instances() {
        let body = r#"{
            "instances": [
                {"service_name": "reviews", "endpoint": {"type": "http", "value": "10.0.0.1:9080"}, "tags": ["v1"]},
                {"service_name": "details", "endpoint": {"type": "http", "value": "10.0.0.2:9080"}}
            ]
        }"#;
        let decoded: InstancesResponse = serde_json::from_str(body).unwrap();
        let instances: Vec<Instance> = decoded.instances.into_iter().map(Instance::from).collect();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].0, "reviews");
        assert_eq!(instances[0].1.tags, vec!["v1"]);
        assert!(instances[1].1.tags.is_empty());
    }
}
