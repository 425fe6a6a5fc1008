use std::collections::HashSet;

use regex::Regex;

use crate::core::error::ConfigError;

/// A backend mounted under `/<key>` on the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub key: String,
    pub route_prefix: String,
    pub target_host: String,
    pub target_port: u16,
    pub display_name: String,
}

impl ServiceEntry {
    pub fn new(key: &str, target_host: &str, target_port: u16, display_name: &str) -> Self {
        Self {
            key: key.to_owned(),
            route_prefix: format!("/{key}"),
            target_host: target_host.to_owned(),
            target_port,
            display_name: display_name.to_owned(),
        }
    }

    pub fn target_url(&self) -> String {
        format!("http://{}:{}", self.target_host, self.target_port)
    }

    /// Matches the prefix exactly or followed by a path separator, so
    /// `/auth-service` never captures `/auth-service-v2`.
    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(&self.route_prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Immutable prefix table, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new(entries: Vec<ServiceEntry>) -> Result<Self, ConfigError> {
        let key_pattern = Regex::new(r"^[a-z0-9][a-z0-9_-]*$")?;
        let mut seen = HashSet::new();

        for entry in &entries {
            if !key_pattern.is_match(&entry.key) {
                return Err(ConfigError::InvalidService(
                    entry.key.clone(),
                    "key must be a lowercase path segment",
                ));
            }
            if entry.target_port == 0 {
                return Err(ConfigError::InvalidService(entry.key.clone(), "port must be non-zero"));
            }
            if !seen.insert(entry.key.as_str()) {
                return Err(ConfigError::DuplicateService(entry.key.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Parses `key:port:Display Name` or `key:host:port:Display Name`
    /// entries separated by commas.
    pub fn parse(services: &str, default_host: &str) -> Result<Self, ConfigError> {
        let entries = services
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| parse_entry(entry, default_host))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(entries)
    }

    pub fn lookup(&self, path: &str) -> Option<&ServiceEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(path))
            .max_by_key(|entry| entry.route_prefix.len())
    }

    /// Entries in registration order.
    pub fn list(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entry(entry: &str, default_host: &str) -> Result<ServiceEntry, ConfigError> {
    let fields = entry.split(':').map(str::trim).collect::<Vec<_>>();

    let (key, host, port, name) = match fields.as_slice() {
        [key, port, name] => (*key, default_host, *port, *name),
        [key, host, port, name] => (*key, *host, *port, *name),
        _ => {
            return Err(ConfigError::InvalidService(
                entry.to_owned(),
                "expected key:port:name or key:host:port:name",
            ));
        }
    };

    let port = port
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidService(entry.to_owned(), "port is not a valid u16"))?;

    if host.is_empty() {
        return Err(ConfigError::InvalidService(entry.to_owned(), "host must not be empty"));
    }

    Ok(ServiceEntry::new(key, host, port, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_SERVICES;

    #[test]
    fn parses_default_services_in_order() {
        let registry = ServiceRegistry::parse(DEFAULT_SERVICES, "localhost").unwrap();

        let keys = registry
            .list()
            .iter()
            .map(|entry| entry.key.as_str())
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            [
                "property-service",
                "auth-service",
                "booking-service",
                "payment-service",
                "review-service",
                "notification-service",
            ]
        );

        let auth = &registry.list()[1];
        assert_eq!(auth.route_prefix, "/auth-service");
        assert_eq!(auth.target_url(), "http://localhost:5002");
        assert_eq!(auth.display_name, "Auth Service");
    }

    #[test]
    fn parses_explicit_host() {
        let registry = ServiceRegistry::parse("auth-service:10.0.0.7:7000:Auth", "localhost").unwrap();

        assert_eq!(registry.list()[0].target_url(), "http://10.0.0.7:7000");
    }

    #[test]
    fn rejects_duplicate_keys() {
        let result = ServiceRegistry::parse("a:5001:A,a:5002:Again", "localhost");

        assert!(matches!(result, Err(ConfigError::DuplicateService(key)) if key == "a"));
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(ServiceRegistry::parse("a:notaport:A", "localhost").is_err());
        assert!(ServiceRegistry::parse("a:0:A", "localhost").is_err());
        assert!(ServiceRegistry::parse("a-only", "localhost").is_err());
        assert!(ServiceRegistry::parse("Bad/Key:5001:A", "localhost").is_err());
    }

    #[test]
    fn lookup_matches_on_segment_boundary() {
        let registry = ServiceRegistry::parse(DEFAULT_SERVICES, "localhost").unwrap();

        assert_eq!(registry.lookup("/auth-service").unwrap().key, "auth-service");
        assert_eq!(registry.lookup("/auth-service/").unwrap().key, "auth-service");
        assert_eq!(registry.lookup("/auth-service/graphql").unwrap().key, "auth-service");
        assert!(registry.lookup("/auth-service-v2/graphql").is_none());
        assert!(registry.lookup("/unknown").is_none());
        assert!(registry.lookup("/").is_none());
    }

    #[test]
    fn lookup_prefers_longest_prefix() {
        let registry = ServiceRegistry::new(vec![
            ServiceEntry::new("api", "localhost", 7001, "Api"),
            ServiceEntry::new("api-v2", "localhost", 7002, "Api v2"),
        ])
        .unwrap();

        assert_eq!(registry.lookup("/api/x").unwrap().target_port, 7001);
        assert_eq!(registry.lookup("/api-v2/x").unwrap().target_port, 7002);
    }

    #[test]
    fn empty_list_yields_empty_registry() {
        let registry = ServiceRegistry::parse(" , ", "localhost").unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
