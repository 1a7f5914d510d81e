use crate::{Error, Preset, RecordKind};
use lazy_static::lazy_static;
use ssz::{ConfigError, SszType};
use std::str::FromStr;

lazy_static! {
    static ref MAINNET: Schema = Schema::new(&Preset::mainnet()).expect("mainnet preset is valid");
    static ref MINIMAL: Schema = Schema::new(&Preset::minimal()).expect("minimal preset is valid");
}

// Aliases used throughout the schema.
const UINT64: SszType = SszType::U64;
const EPOCH: SszType = SszType::U64;
const SLOT: SszType = SszType::U64;
const GWEI: SszType = SszType::U64;
const VALIDATOR_INDEX: SszType = SszType::U64;
const HASH: SszType = SszType::ByteVector(32);
const VERSION: SszType = SszType::ByteVector(4);
const BLS_PUBKEY: SszType = SszType::ByteVector(48);
const BLS_SIGNATURE: SszType = SszType::ByteVector(96);

/// The descriptors of every v0.9.0 record, with collection limits taken from a `Preset`.
///
/// Descriptors are immutable once built. Shared sub-records (e.g., `Checkpoint`) are built once
/// and referenced by each of their parents.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    preset: Preset,
    fork: SszType,
    checkpoint: SszType,
    validator: SszType,
    attestation_data: SszType,
    attestation_data_and_custody_bit: SszType,
    indexed_attestation: SszType,
    pending_attestation: SszType,
    eth1_data: SszType,
    historical_batch: SszType,
    deposit_data: SszType,
    beacon_block_header: SszType,
    proposer_slashing: SszType,
    attester_slashing: SszType,
    attestation: SszType,
    deposit: SszType,
    voluntary_exit: SszType,
    beacon_block_body: SszType,
    beacon_block: SszType,
    beacon_state: SszType,
}

impl Schema {
    /// Builds the descriptors for `preset`.
    ///
    /// Returns an error if any limit in `preset` is zero or too large to merkleize.
    pub fn new(preset: &Preset) -> Result<Self, ConfigError> {
        let committee_indices = SszType::list(
            VALIDATOR_INDEX,
            to_usize("list", preset.max_validators_per_committee)?,
        )?;
        let committee_bits =
            SszType::bitlist(to_usize("bitlist", preset.max_validators_per_committee)?)?;
        let slot_roots = SszType::list(
            HASH,
            to_usize("list", preset.slots_per_historical_root)?,
        )?;

        let fork = SszType::container(
            "Fork",
            vec![
                ("previous_version", VERSION),
                ("current_version", VERSION),
                ("epoch", EPOCH),
            ],
        )?;

        let checkpoint = SszType::container("Checkpoint", vec![("epoch", EPOCH), ("root", HASH)])?;

        let validator = SszType::container(
            "Validator",
            vec![
                ("pubkey", BLS_PUBKEY),
                ("withdrawal_credentials", HASH),
                ("effective_balance", GWEI),
                ("slashed", SszType::Bool),
                ("activation_eligibility_epoch", EPOCH),
                ("activation_epoch", EPOCH),
                ("exit_epoch", EPOCH),
                ("withdrawable_epoch", EPOCH),
            ],
        )?;

        let attestation_data = SszType::container(
            "AttestationData",
            vec![
                ("slot", SLOT),
                ("index", UINT64),
                ("beacon_block_root", HASH),
                ("source", checkpoint.clone()),
                ("target", checkpoint.clone()),
            ],
        )?;

        let attestation_data_and_custody_bit = SszType::container(
            "AttestationDataAndCustodyBit",
            vec![
                ("data", attestation_data.clone()),
                ("custody_bit", SszType::Bool),
            ],
        )?;

        let indexed_attestation = SszType::container(
            "IndexedAttestation",
            vec![
                ("custody_bit_0_indices", committee_indices.clone()),
                ("custody_bit_1_indices", committee_indices),
                ("data", attestation_data.clone()),
                ("signature", BLS_SIGNATURE),
            ],
        )?;

        let pending_attestation = SszType::container(
            "PendingAttestation",
            vec![
                ("aggregation_bits", committee_bits.clone()),
                ("data", attestation_data.clone()),
                ("inclusion_delay", SLOT),
                ("proposer_index", VALIDATOR_INDEX),
            ],
        )?;

        let eth1_data = SszType::container(
            "Eth1Data",
            vec![
                ("deposit_root", HASH),
                ("deposit_count", UINT64),
                ("block_hash", HASH),
            ],
        )?;

        let historical_batch = SszType::container(
            "HistoricalBatch",
            vec![
                ("block_roots", slot_roots.clone()),
                ("state_roots", slot_roots.clone()),
            ],
        )?;

        let deposit_data = SszType::container(
            "DepositData",
            vec![
                ("pubkey", BLS_PUBKEY),
                ("withdrawal_credentials", HASH),
                ("amount", GWEI),
                ("signature", BLS_SIGNATURE),
            ],
        )?;

        let beacon_block_header = SszType::container(
            "BeaconBlockHeader",
            vec![
                ("slot", SLOT),
                ("parent_root", HASH),
                ("state_root", HASH),
                ("body_root", HASH),
                ("signature", BLS_SIGNATURE),
            ],
        )?;

        let proposer_slashing = SszType::container(
            "ProposerSlashing",
            vec![
                ("proposer_index", VALIDATOR_INDEX),
                ("header_1", beacon_block_header.clone()),
                ("header_2", beacon_block_header.clone()),
            ],
        )?;

        let attester_slashing = SszType::container(
            "AttesterSlashing",
            vec![
                ("attestation_1", indexed_attestation.clone()),
                ("attestation_2", indexed_attestation.clone()),
            ],
        )?;

        let attestation = SszType::container(
            "Attestation",
            vec![
                ("aggregation_bits", committee_bits.clone()),
                ("data", attestation_data.clone()),
                ("custody_bits", committee_bits),
                ("signature", BLS_SIGNATURE),
            ],
        )?;

        let deposit_proof_len = preset
            .deposit_contract_tree_depth
            .checked_add(1)
            .ok_or(ConfigError::LimitTooLarge {
                kind: "vector",
                limit: usize::max_value(),
            })?;
        let deposit = SszType::container(
            "Deposit",
            vec![
                (
                    "proof",
                    SszType::vector(HASH, to_usize("vector", deposit_proof_len)?)?,
                ),
                ("data", deposit_data.clone()),
            ],
        )?;

        let voluntary_exit = SszType::container(
            "VoluntaryExit",
            vec![
                ("epoch", EPOCH),
                ("validator_index", VALIDATOR_INDEX),
                ("signature", BLS_SIGNATURE),
            ],
        )?;

        let beacon_block_body = SszType::container(
            "BeaconBlockBody",
            vec![
                ("randao_reveal", BLS_SIGNATURE),
                ("eth1_data", eth1_data.clone()),
                ("graffiti", HASH),
                (
                    "proposer_slashings",
                    list(&proposer_slashing, preset.max_proposer_slashings)?,
                ),
                (
                    "attester_slashings",
                    list(&attester_slashing, preset.max_attester_slashings)?,
                ),
                (
                    "attestations",
                    list(&attestation, preset.max_attestations)?,
                ),
                ("deposits", list(&deposit, preset.max_deposits)?),
                (
                    "voluntary_exits",
                    list(&voluntary_exit, preset.max_voluntary_exits)?,
                ),
            ],
        )?;

        let beacon_block = SszType::container(
            "BeaconBlock",
            vec![
                ("slot", SLOT),
                ("parent_root", HASH),
                ("state_root", HASH),
                ("body", beacon_block_body.clone()),
                ("signature", BLS_SIGNATURE),
            ],
        )?;

        let max_epoch_attestations = preset.max_epoch_attestations().ok_or(
            ConfigError::LimitTooLarge {
                kind: "list",
                limit: usize::max_value(),
            },
        )?;
        let epoch_attestations = list(&pending_attestation, max_epoch_attestations)?;

        let beacon_state = SszType::container(
            "BeaconState",
            vec![
                // Versioning
                ("genesis_time", UINT64),
                ("slot", SLOT),
                ("fork", fork.clone()),
                // History
                ("latest_block_header", beacon_block_header.clone()),
                ("block_roots", slot_roots.clone()),
                ("state_roots", slot_roots),
                (
                    "historical_roots",
                    list(&HASH, preset.historical_roots_limit)?,
                ),
                // Eth1
                ("eth1_data", eth1_data.clone()),
                (
                    "eth1_data_votes",
                    list(&eth1_data, preset.slots_per_eth1_voting_period)?,
                ),
                ("eth1_deposit_index", UINT64),
                // Registry
                (
                    "validators",
                    list(&validator, preset.validator_registry_limit)?,
                ),
                ("balances", list(&GWEI, preset.validator_registry_limit)?),
                // Randomness
                (
                    "randao_mixes",
                    SszType::vector(
                        HASH,
                        to_usize("vector", preset.epochs_per_historical_vector)?,
                    )?,
                ),
                // Slashings
                (
                    "slashings",
                    SszType::vector(
                        GWEI,
                        to_usize("vector", preset.epochs_per_slashings_vector)?,
                    )?,
                ),
                // Attestations
                ("previous_epoch_attestations", epoch_attestations.clone()),
                ("current_epoch_attestations", epoch_attestations),
                // Finality
                (
                    "justification_bits",
                    SszType::bitvector(to_usize(
                        "bitvector",
                        preset.justification_bits_length,
                    )?)?,
                ),
                ("previous_justified_checkpoint", checkpoint.clone()),
                ("current_justified_checkpoint", checkpoint.clone()),
                ("finalized_checkpoint", checkpoint.clone()),
            ],
        )?;

        Ok(Self {
            preset: preset.clone(),
            fork,
            checkpoint,
            validator,
            attestation_data,
            attestation_data_and_custody_bit,
            indexed_attestation,
            pending_attestation,
            eth1_data,
            historical_batch,
            deposit_data,
            beacon_block_header,
            proposer_slashing,
            attester_slashing,
            attestation,
            deposit,
            voluntary_exit,
            beacon_block_body,
            beacon_block,
            beacon_state,
        })
    }

    /// The schema for the mainnet preset, built on first use.
    pub fn mainnet() -> &'static Self {
        &MAINNET
    }

    /// The schema for the minimal preset, built on first use.
    pub fn minimal() -> &'static Self {
        &MINIMAL
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    /// Returns the descriptor of `kind`.
    pub fn descriptor(&self, kind: RecordKind) -> &SszType {
        match kind {
            RecordKind::Fork => &self.fork,
            RecordKind::Checkpoint => &self.checkpoint,
            RecordKind::Validator => &self.validator,
            RecordKind::AttestationData => &self.attestation_data,
            RecordKind::AttestationDataAndCustodyBit => &self.attestation_data_and_custody_bit,
            RecordKind::IndexedAttestation => &self.indexed_attestation,
            RecordKind::PendingAttestation => &self.pending_attestation,
            RecordKind::Eth1Data => &self.eth1_data,
            RecordKind::HistoricalBatch => &self.historical_batch,
            RecordKind::DepositData => &self.deposit_data,
            RecordKind::BeaconBlockHeader => &self.beacon_block_header,
            RecordKind::ProposerSlashing => &self.proposer_slashing,
            RecordKind::AttesterSlashing => &self.attester_slashing,
            RecordKind::Attestation => &self.attestation,
            RecordKind::Deposit => &self.deposit,
            RecordKind::VoluntaryExit => &self.voluntary_exit,
            RecordKind::BeaconBlockBody => &self.beacon_block_body,
            RecordKind::BeaconBlock => &self.beacon_block,
            RecordKind::BeaconState => &self.beacon_state,
        }
    }

    /// Returns the descriptor of the record named `name` (e.g., `"BeaconState"`).
    pub fn descriptor_by_name(&self, name: &str) -> Result<&SszType, Error> {
        RecordKind::from_str(name)
            .map(|kind| self.descriptor(kind))
            .map_err(|_| Error::UnknownRecord(name.to_string()))
    }
}

fn to_usize(kind: &'static str, n: u64) -> Result<usize, ConfigError> {
    usize::try_from(n).map_err(|_| ConfigError::LimitTooLarge {
        kind,
        limit: usize::max_value(),
    })
}

fn list(elem: &SszType, limit: u64) -> Result<SszType, ConfigError> {
    SszType::list(elem.clone(), to_usize("list", limit)?)
}
