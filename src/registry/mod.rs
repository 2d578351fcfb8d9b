//! Confluent-style schema registry client.
//!
//! Speaks the registry's HTTP/JSON protocol: schemas are fetched by id and
//! registered under a subject. Both directions are cached - fetched schemas
//! by id, assigned ids by (subject, fingerprint) - so a long-running
//! producer or consumer hits the network once per schema.
//!
//! The client is deliberately not concurrent; wrap it in a mutex if it must
//! be shared.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::schema::{parse_schema, AvroSchema};

/// SHA-256 of a schema's canonical JSON form. Keys the id caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a schema via its canonical JSON.
    pub fn of(schema: &AvroSchema) -> Self {
        let digest = Sha256::digest(schema.to_json().as_bytes());
        Self(digest.into())
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Registry client configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL of the registry, without a trailing slash.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Optional PEM bundle with additional root certificates.
    pub ca_file: Option<PathBuf>,
    /// Optional PEM with the client certificate and private key.
    pub identity_file: Option<PathBuf>,
}

impl RegistryConfig {
    /// Configuration with default timeout and no TLS extras.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(15),
            ca_file: None,
            identity_file: None,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Trust an additional CA bundle (PEM).
    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Present a client certificate (PEM with certificate and key).
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }
}

#[derive(Deserialize)]
struct SchemaResponse {
    schema: String,
}

#[derive(Deserialize)]
struct RegisterResponse {
    id: u32,
}

/// Client for a Confluent-style schema registry.
pub struct RegistryClient {
    config: RegistryConfig,
    http: reqwest::blocking::Client,
    by_id: HashMap<u32, AvroSchema>,
    by_subject: HashMap<String, HashMap<Fingerprint, u32>>,
}

impl RegistryClient {
    /// Build a client from the given configuration.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let mut builder = reqwest::blocking::Client::builder().timeout(config.timeout);
        if let Some(ca) = &config.ca_file {
            let pem = fs::read(ca)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
        if let Some(identity) = &config.identity_file {
            let pem = fs::read(identity)?;
            builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
        }
        Ok(Self {
            config,
            http: builder.build()?,
            by_id: HashMap::new(),
            by_subject: HashMap::new(),
        })
    }

    /// Fetch the schema registered under `schema_id`, caching the result.
    pub fn get(&mut self, schema_id: u32) -> Result<AvroSchema, RegistryError> {
        if let Some(schema) = self.by_id.get(&schema_id) {
            return Ok(schema.clone());
        }

        let url = format!("{}/schemas/ids/{}", self.config.url, schema_id);
        let response = self.http.get(&url).send()?;
        if !response.status().is_success() {
            return Err(unexpected(response));
        }
        let body: SchemaResponse = response.json()?;
        let schema = parse_schema(&body.schema)?;
        debug!(schema_id, "fetched schema from registry");

        self.by_id.insert(schema_id, schema.clone());
        Ok(schema)
    }

    /// Resolve the registry id for `schema` under `subject`, registering
    /// the schema when the registry does not know it yet. Cached by the
    /// schema's fingerprint.
    pub fn get_schema_id(
        &mut self,
        schema: &AvroSchema,
        subject: &str,
    ) -> Result<u32, RegistryError> {
        let fingerprint = Fingerprint::of(schema);
        if let Some(id) = self
            .by_subject
            .get(subject)
            .and_then(|ids| ids.get(&fingerprint))
        {
            return Ok(*id);
        }

        info!(subject, schema = schema.type_name(), "registering schema");
        let url = format!("{}/subjects/{}/versions", self.config.url, subject);
        let mut payload = HashMap::new();
        payload.insert("schema", schema.to_json());
        let response = self.http.post(&url).json(&payload).send()?;
        if !response.status().is_success() {
            return Err(unexpected(response));
        }
        let body: RegisterResponse = response.json()?;
        debug!(subject, id = body.id, "registry assigned schema id");

        self.by_subject
            .entry(subject.to_string())
            .or_default()
            .insert(fingerprint, body.id);
        Ok(body.id)
    }
}

fn unexpected(response: reqwest::blocking::Response) -> RegistryError {
    let status = response.status().as_u16();
    let message = response.text().unwrap_or_default();
    RegistryError::UnexpectedResponse { status, message }
}
