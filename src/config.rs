use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectConfig {
    /// Recursive resolvers used for SOA/NS/DNSKEY/DS lookups and address resolution
    pub resolvers: Vec<SocketAddr>,

    /// Timeout for every individual query
    pub query_timeout: Duration,

    /// Port the zone's nameservers are probed on
    pub nameserver_port: u16,

    /// Mirror debug trace entries to the trace sink as they are appended
    pub debug: bool,

    /// Whether to look the zone up in a DNSSEC lookaside registry
    pub check_dlv: bool,

    /// Lookaside registry suffix appended to the zone name
    pub dlv_suffix: String,

    /// Upper bound on reachability probes in flight at once
    pub max_concurrent_probes: usize,

    /// Payload size advertised by the EDNS0 reachability probe
    pub edns_payload_size: u16,

    /// Payload size advertised on DNSSEC-OK lookups
    pub dnssec_payload_size: u16,

    /// Wall-clock bound on a whole zone inspection (None = unbounded)
    pub deadline: Option<Duration>,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            resolvers: vec![
                SocketAddr::from(([1, 1, 1, 1], 53)),
                SocketAddr::from(([8, 8, 8, 8], 53)),
            ],
            query_timeout: Duration::from_secs(5),
            nameserver_port: crate::dns::constants::DNS_PORT,
            debug: false,
            check_dlv: true,
            dlv_suffix: "dlv.isc.org.".to_string(),
            max_concurrent_probes: 32,
            edns_payload_size: 1460,
            dnssec_payload_size: crate::dnssec::DNSSEC_UDP_SIZE,
            deadline: None,
        }
    }
}

impl InspectConfig {
    /// Create an InspectConfig from environment variables
    /// Returns Err if a variable is present but invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(resolvers) = std::env::var("ZONEINFO_RESOLVERS") {
            config.resolvers = parse_resolvers(&resolvers)?;
        }

        if let Ok(timeout_str) = std::env::var("ZONEINFO_QUERY_TIMEOUT") {
            config.query_timeout = parse_seconds(&timeout_str)?;
        }

        if let Ok(debug) = std::env::var("ZONEINFO_DEBUG") {
            config.debug = parse_bool(&debug, false);
        }

        if let Ok(check_dlv) = std::env::var("ZONEINFO_CHECK_DLV") {
            config.check_dlv = parse_bool(&check_dlv, true);
        }

        if let Ok(suffix) = std::env::var("ZONEINFO_DLV_SUFFIX") {
            if suffix.trim().is_empty() {
                return Err(ConfigError::ParseError(
                    "DLV suffix must not be empty".to_string(),
                ));
            }
            config.dlv_suffix = suffix.trim().to_string();
        }

        if let Ok(max_probes) = std::env::var("ZONEINFO_MAX_CONCURRENT_PROBES") {
            let max = max_probes
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidConcurrency(max_probes.clone()))?;
            if max == 0 {
                return Err(ConfigError::InvalidConcurrency(
                    "Concurrent probes must be greater than 0".to_string(),
                ));
            }
            config.max_concurrent_probes = max;
        }

        if let Ok(deadline) = std::env::var("ZONEINFO_DEADLINE") {
            config.deadline = Some(parse_seconds(&deadline)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolvers.is_empty() {
            return Err(ConfigError::InvalidResolver(
                "At least one resolver is required".to_string(),
            ));
        }

        if self.query_timeout.is_zero() || self.query_timeout.as_secs() > 300 {
            return Err(ConfigError::InvalidTimeout(
                "Query timeout must be between 1ms and 300 seconds".to_string(),
            ));
        }

        if self.max_concurrent_probes == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "Concurrent probes must be greater than 0".to_string(),
            ));
        }

        if self.edns_payload_size < 512 || self.dnssec_payload_size < 512 {
            return Err(ConfigError::ParseError(
                "EDNS payload sizes must be at least 512".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a comma separated resolver list; bare IPs get port 53.
pub fn parse_resolvers(list: &str) -> Result<Vec<SocketAddr>, ConfigError> {
    let servers = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_resolver)
        .collect::<Result<Vec<_>, _>>()?;

    if servers.is_empty() {
        return Err(ConfigError::InvalidResolver(
            "No valid resolvers provided".to_string(),
        ));
    }
    Ok(servers)
}

pub fn parse_resolver(s: &str) -> Result<SocketAddr, ConfigError> {
    s.parse::<SocketAddr>()
        .or_else(|_| {
            s.parse::<std::net::IpAddr>()
                .map(|ip| SocketAddr::new(ip, crate::dns::constants::DNS_PORT))
        })
        .map_err(|_| ConfigError::InvalidResolver(s.to_string()))
}

fn parse_seconds(s: &str) -> Result<Duration, ConfigError> {
    let secs = s
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTimeout(s.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidTimeout(
            "Timeout must be greater than 0".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = InspectConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.dlv_suffix, "dlv.isc.org.");
        assert!(!config.debug);
    }

    #[test]
    fn test_invalid_timeout() {
        let config = InspectConfig {
            query_timeout: Duration::from_secs(400),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_resolvers_is_invalid() {
        let config = InspectConfig {
            resolvers: vec![],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidResolver(_))
        ));
    }

    #[test]
    fn test_parse_resolvers() {
        let servers = parse_resolvers("9.9.9.9, 127.0.0.1:5353,[2001:db8::53]:53").unwrap();
        assert_eq!(servers.len(), 3);
        assert_eq!(servers[0].port(), 53);
        assert_eq!(servers[1].port(), 5353);
        assert!(servers[2].is_ipv6());
        assert!(parse_resolvers("not-an-ip").is_err());
        assert!(parse_resolvers(" , ").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true", false));
        assert!(parse_bool("YES", false));
        assert!(parse_bool("1", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("invalid", true));
        assert!(!parse_bool("invalid", false));
    }
}
