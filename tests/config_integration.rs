//! Configuration loading from disk

#[cfg(test)]
mod config_integration {
    use chain_access::ChainConfig;
    use solana_sdk::signature::Keypair;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config_from_file() {
        let funder = Keypair::new().to_base58_string();
        let file = write_config(&format!(
            r#"
backend = "solana"
endpoint = "https://api.devnet.solana.com"
ws_endpoint = "wss://api.devnet.solana.com"
funder = "{funder}"
default_priority_fee = 20000
compute_unit_limit = 300000
rate_limit = 8
confirm_timeout_secs = 45
priority_fee_percentile = 90
max_priority_fee = 500000
"#
        ));

        let config = ChainConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.backend(), "solana");
        config.validate().unwrap();

        let ChainConfig::Solana(solana) = config;
        assert_eq!(solana.default_priority_fee, 20_000);
        assert_eq!(solana.compute_unit_limit, 300_000);
        assert_eq!(solana.rate_limit, 8);
        assert_eq!(solana.confirm_timeout_secs, 45);
        assert_eq!(solana.priority_fee_percentile, 90);
        assert_eq!(solana.max_priority_fee, Some(500_000));
        assert_eq!(solana.funder.expose(), funder);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ChainConfig::from_file("/nonexistent/chain.toml").is_err());
    }

    #[test]
    fn test_funder_never_serialized() {
        let funder = Keypair::new().to_base58_string();
        let config = ChainConfig::from_toml_str(&format!(
            "backend = \"solana\"\nendpoint = \"http://localhost:8899\"\nfunder = \"{funder}\"\n"
        ))
        .unwrap();

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains(&funder));
        assert!(!format!("{config:?}").contains(&funder));
    }
}
