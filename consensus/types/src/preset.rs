use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum Error {
    /// The preset file could not be opened.
    UnableToOpenFile(io::Error),
    /// The preset file could not be parsed as YAML.
    UnableToParseFile(serde_yaml::Error),
}

/// The collection sizes which parameterize the record schema.
///
/// Field names match the upper-case constants of a preset YAML file. Other keys in the file
/// (e.g., fork versions or reward quotients) are ignored, so a complete chain config may be
/// loaded directly.
///
/// https://github.com/ethereum/eth2.0-specs/tree/v0.9.0/configs
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Preset {
    pub max_validators_per_committee: u64,
    pub slots_per_epoch: u64,
    pub slots_per_historical_root: u64,
    pub historical_roots_limit: u64,
    pub slots_per_eth1_voting_period: u64,
    pub validator_registry_limit: u64,
    pub epochs_per_historical_vector: u64,
    pub epochs_per_slashings_vector: u64,
    pub max_proposer_slashings: u64,
    pub max_attester_slashings: u64,
    pub max_attestations: u64,
    pub max_deposits: u64,
    pub max_voluntary_exits: u64,
    #[serde(default = "default_deposit_contract_tree_depth")]
    pub deposit_contract_tree_depth: u64,
    #[serde(default = "default_justification_bits_length")]
    pub justification_bits_length: u64,
}

fn default_deposit_contract_tree_depth() -> u64 {
    32
}

fn default_justification_bits_length() -> u64 {
    4
}

impl Preset {
    /// The mainnet preset.
    pub fn mainnet() -> Self {
        Self {
            max_validators_per_committee: 2_048,
            slots_per_epoch: 32,
            slots_per_historical_root: 8_192,
            historical_roots_limit: 16_777_216,
            slots_per_eth1_voting_period: 1_024,
            validator_registry_limit: 1_099_511_627_776,
            epochs_per_historical_vector: 65_536,
            epochs_per_slashings_vector: 8_192,
            max_proposer_slashings: 16,
            max_attester_slashings: 1,
            max_attestations: 128,
            max_deposits: 16,
            max_voluntary_exits: 16,
            deposit_contract_tree_depth: default_deposit_contract_tree_depth(),
            justification_bits_length: default_justification_bits_length(),
        }
    }

    /// Ethereum Foundation minimal preset, for testing.
    ///
    /// Differs from mainnet only in its epoch length and the lengths of the state's
    /// per-slot and per-epoch vectors.
    pub fn minimal() -> Self {
        Self {
            slots_per_epoch: 8,
            slots_per_historical_root: 64,
            slots_per_eth1_voting_period: 16,
            epochs_per_historical_vector: 64,
            epochs_per_slashings_vector: 64,
            ..Self::mainnet()
        }
    }

    /// Load a preset from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path.as_ref()).map_err(Error::UnableToOpenFile)?;
        serde_yaml::from_reader(file).map_err(Error::UnableToParseFile)
    }

    /// The maximum number of pending attestations held in each of the state's epoch
    /// attestation lists.
    pub fn max_epoch_attestations(&self) -> Option<u64> {
        self.max_attestations.checked_mul(self.slots_per_epoch)
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    fn presets_base_path() -> PathBuf {
        env::var("CARGO_MANIFEST_DIR")
            .expect("should know manifest dir")
            .parse::<PathBuf>()
            .expect("should parse manifest dir as path")
            .join("presets")
    }

    #[test]
    fn mainnet_presets_consistent() {
        let preset = Preset::from_file(presets_base_path().join("mainnet.yaml")).unwrap();
        assert_eq!(preset, Preset::mainnet());
    }

    #[test]
    fn minimal_presets_consistent() {
        let preset = Preset::from_file(presets_base_path().join("minimal.yaml")).unwrap();
        assert_eq!(preset, Preset::minimal());
    }

    #[test]
    fn unknown_keys_and_defaults() {
        let yaml = "
            MAX_VALIDATORS_PER_COMMITTEE: 4
            SLOTS_PER_EPOCH: 2
            SLOTS_PER_HISTORICAL_ROOT: 8
            HISTORICAL_ROOTS_LIMIT: 16
            SLOTS_PER_ETH1_VOTING_PERIOD: 4
            VALIDATOR_REGISTRY_LIMIT: 64
            EPOCHS_PER_HISTORICAL_VECTOR: 8
            EPOCHS_PER_SLASHINGS_VECTOR: 8
            MAX_PROPOSER_SLASHINGS: 1
            MAX_ATTESTER_SLASHINGS: 1
            MAX_ATTESTATIONS: 2
            MAX_DEPOSITS: 1
            MAX_VOLUNTARY_EXITS: 1
            GENESIS_FORK_VERSION: 0x00000000
            BASE_REWARD_FACTOR: 64
        ";
        let preset: Preset = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(preset.max_validators_per_committee, 4);
        assert_eq!(preset.deposit_contract_tree_depth, 32);
        assert_eq!(preset.justification_bits_length, 4);
        assert_eq!(preset.max_epoch_attestations(), Some(4));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Preset::from_file(presets_base_path().join("nonexistent.yaml")),
            Err(Error::UnableToOpenFile(_))
        ));
    }

    #[test]
    fn missing_key() {
        assert!(serde_yaml::from_str::<Preset>("SLOTS_PER_EPOCH: 8").is_err());
    }
}
