use std::{fs, sync::Arc};

use crate::networks::{MAINNET, MINIMAL, NetworkSpec};

pub fn network_parser(network_string: &str) -> Result<Arc<NetworkSpec>, String> {
    match network_string {
        "mainnet" => Ok(MAINNET.clone()),
        "minimal" => Ok(MINIMAL.clone()),
        path => read_network_spec(path).map(Arc::new),
    }
}

fn read_network_spec(path: &str) -> Result<NetworkSpec, String> {
    let contents = fs::read_to_string(path).map_err(|err| format!("Failed to read file: {err}"))?;
    let spec: NetworkSpec = serde_yaml::from_str(&contents)
        .map_err(|err| format!("Failed to parse YAML from: {err}"))?;
    spec.validate()
        .map_err(|err| format!("Invalid network spec {path}: {err}"))?;
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use alloy_primitives::fixed_bytes;

    use super::*;
    use crate::networks::Network;

    #[test]
    fn test_named_networks() {
        assert_eq!(network_parser("mainnet").unwrap().network, Network::Mainnet);
        assert_eq!(network_parser("minimal").unwrap().network, Network::Minimal);
    }

    #[test]
    fn test_network_spec_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
network: custom
seconds_per_slot: 4
slots_per_epoch: 16
genesis_time: 1700000000
attestation_subnet_count: 64
sync_committee_subnet_count: 4
data_column_sidecar_subnet_count: 32
number_of_columns: 64
fork_digest: "0x01020304"
"#
        )
        .unwrap();

        let spec = network_parser(file.path().to_str().unwrap()).unwrap();
        assert_eq!(spec.network, Network::Custom);
        assert_eq!(spec.seconds_per_slot, 4);
        assert_eq!(spec.data_column_sidecar_subnet_count, 32);
        assert_eq!(spec.fork_digest, fixed_bytes!("0x01020304"));
    }

    #[test]
    fn test_invalid_yaml_spec_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
network: custom
seconds_per_slot: 0
slots_per_epoch: 16
genesis_time: 0
attestation_subnet_count: 64
sync_committee_subnet_count: 4
data_column_sidecar_subnet_count: 32
number_of_columns: 64
fork_digest: "0x01020304"
"#
        )
        .unwrap();

        assert!(network_parser(file.path().to_str().unwrap()).is_err());
        assert!(network_parser("/does/not/exist.yaml").is_err());
    }
}
