// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["nomad-dns-controller"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    fn valid_config() -> Config {
        parse(&[
            "--nomad-address",
            "http://nomad.service.consul:4646",
            "--nomad-token",
            "nomad-secret",
            "--cloudflare-token",
            "cf-secret",
            "--cloudflare-zone-id",
            "zone-123",
            "--job-name",
            "traefik",
            "--dns-record-name",
            "edge.example.com",
        ])
    }

    #[test]
    fn test_valid_configuration_passes_validation() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.nomad_address, "http://nomad.service.consul:4646");
        assert_eq!(config.job_name, "traefik");
        assert_eq!(config.dns_record_name, "edge.example.com");
    }

    #[test]
    fn test_defaults_applied_for_optional_settings() {
        let config = valid_config();
        assert_eq!(config.nomad_namespace, "default");
        assert_eq!(config.node_address_attribute, "unique.network.ip-address");
        assert_eq!(config.cloudflare_api_url, "https://api.cloudflare.com/client/v4");
        assert_eq!(config.dns_record_ttl, 1);
        assert!(!config.dns_record_proxied);
        assert_eq!(config.sync_interval(), Duration::from_secs(300));
        assert_eq!(config.debounce(), Duration::from_millis(2000));
        assert_eq!(config.event_queue_capacity, 32);
        assert_eq!(config.watch_max_failures, 1);
    }

    #[test]
    fn test_missing_cloudflare_token_is_rejected() {
        let mut config = valid_config();
        config.cloudflare_token = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing {
                variable: "CLOUDFLARE_API_TOKEN"
            })
        );
    }

    #[test]
    fn test_missing_zone_id_is_rejected() {
        let mut config = valid_config();
        config.cloudflare_zone_id = "   ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing {
                variable: "CLOUDFLARE_ZONE_ID"
            })
        );
    }

    #[test]
    fn test_missing_record_name_and_job_are_rejected() {
        let mut config = valid_config();
        config.dns_record_name = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                variable: "DNS_RECORD_NAME"
            })
        ));

        let mut config = valid_config();
        config.job_name = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                variable: "TRAEFIK_JOB_NAME"
            })
        ));
    }

    #[test]
    fn test_missing_nomad_token_is_rejected() {
        let mut config = valid_config();
        config.nomad_token = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                variable: "NOMAD_TOKEN"
            })
        ));
    }

    #[test]
    fn test_negative_ttl_is_rejected() {
        let mut config = valid_config();
        config.dns_record_ttl = -5;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                variable: "DNS_RECORD_TTL",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_intervals_and_capacity_are_rejected() {
        let mut config = valid_config();
        config.sync_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.event_queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.watch_max_failures = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unparsable_nomad_address_is_rejected() {
        let mut config = valid_config();
        config.nomad_address = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                variable: "NOMAD_ADDR",
                ..
            })
        ));
    }

    #[test]
    fn test_debug_output_redacts_tokens() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains("nomad-secret"));
        assert!(!rendered.contains("cf-secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("edge.example.com"));
    }
}
