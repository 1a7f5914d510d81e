use serde_derive::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Names each record of the v0.9.0 schema.
///
/// Parses from and displays as the record's container name, e.g. `"BeaconBlockHeader"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
    Display,
)]
pub enum RecordKind {
    Fork,
    Checkpoint,
    Validator,
    AttestationData,
    AttestationDataAndCustodyBit,
    IndexedAttestation,
    PendingAttestation,
    Eth1Data,
    HistoricalBatch,
    DepositData,
    BeaconBlockHeader,
    ProposerSlashing,
    AttesterSlashing,
    Attestation,
    Deposit,
    VoluntaryExit,
    BeaconBlockBody,
    BeaconBlock,
    BeaconState,
}
