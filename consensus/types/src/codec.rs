use crate::proof::{generate_proof, Proof};
use crate::{Error, Hash256, RecordKind, Schema};
use slog::{debug, Logger};
use ssz::{PathSegment, Value};
use tree_hash::CachedRoot;

/// Encodes, decodes and hashes records by `RecordKind`, using the descriptors of one `Schema`.
///
/// Rejected inputs are logged at `debug`, with the location of the fault within the record.
pub struct RecordCodec<'a> {
    schema: &'a Schema,
    log: Logger,
}

impl<'a> RecordCodec<'a> {
    pub fn new(schema: &'a Schema, log: Logger) -> Self {
        let preset = schema.preset();
        debug!(
            log,
            "Record schema selected";
            "slots_per_epoch" => preset.slots_per_epoch,
            "slots_per_historical_root" => preset.slots_per_historical_root,
            "validator_registry_limit" => preset.validator_registry_limit,
        );

        Self { schema, log }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Returns the default (all-zero, empty-list) instance of `kind`.
    pub fn default_record(&self, kind: RecordKind) -> Value {
        Value::default_for(self.schema.descriptor(kind))
    }

    pub fn encode(&self, kind: RecordKind, value: &Value) -> Result<Vec<u8>, Error> {
        ssz::encode(value, self.schema.descriptor(kind))
            .map_err(Error::from)
            .map_err(|e| self.rejected("encode", kind, None, e))
    }

    pub fn encoded_len(&self, kind: RecordKind, value: &Value) -> Result<usize, Error> {
        ssz::encoded_len(value, self.schema.descriptor(kind))
            .map_err(Error::from)
            .map_err(|e| self.rejected("encode", kind, None, e))
    }

    /// Decodes `bytes` as a `kind`, which must occupy all of `bytes`.
    pub fn decode(&self, kind: RecordKind, bytes: &[u8]) -> Result<Value, Error> {
        ssz::decode(bytes, self.schema.descriptor(kind))
            .map_err(Error::from)
            .map_err(|e| self.rejected("decode", kind, Some(bytes.len()), e))
    }

    pub fn hash_tree_root(&self, kind: RecordKind, value: &Value) -> Result<Hash256, Error> {
        tree_hash::hash_tree_root(value, self.schema.descriptor(kind))
            .map_err(Error::from)
            .map_err(|e| self.rejected("hash_tree_root", kind, None, e))
    }

    /// Returns a proof of the node at `path` within `value` against its `hash_tree_root`.
    pub fn proof(
        &self,
        kind: RecordKind,
        value: &Value,
        path: &[PathSegment],
    ) -> Result<Proof, Error> {
        generate_proof(value, self.schema.descriptor(kind), path)
            .map_err(|e| self.rejected("proof", kind, None, e))
    }

    /// Returns an incremental hasher for successive versions of a `kind`.
    pub fn cached_root(&self, kind: RecordKind) -> CachedRoot {
        CachedRoot::new(self.schema.descriptor(kind).clone())
    }

    fn rejected(&self, op: &'static str, kind: RecordKind, len: Option<usize>, e: Error) -> Error {
        debug!(
            self.log,
            "Rejected record";
            "op" => op,
            "kind" => %kind,
            "len" => len,
            "path" => e.path().unwrap_or_default(),
            "error" => ?e,
        );
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sloggers::{null::NullLoggerBuilder, Build};
    use ssz::DecodeError;

    fn codec() -> RecordCodec<'static> {
        let log = NullLoggerBuilder.build().expect("should build null logger");
        RecordCodec::new(Schema::minimal(), log)
    }

    #[test]
    fn default_fork() {
        let codec = codec();
        let fork = codec.default_record(RecordKind::Fork);
        let bytes = codec.encode(RecordKind::Fork, &fork).unwrap();

        assert_eq!(bytes, vec![0; 16]);
        assert_eq!(codec.decode(RecordKind::Fork, &bytes), Ok(fork));
    }

    #[test]
    fn decode_error_reports_path() {
        let codec = codec();
        let mut checkpoint = codec.default_record(RecordKind::Checkpoint);
        checkpoint.as_mut_slice().unwrap()[0] = Value::Uint(7);
        let mut bytes = codec.encode(RecordKind::Checkpoint, &checkpoint).unwrap();
        bytes.pop();

        let err = codec.decode(RecordKind::Checkpoint, &bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::TooShort {
                len: 39,
                expected: 40
            })
        ));
        assert_eq!(err.path(), Some(String::new()));
    }

    #[test]
    fn encode_error_reports_path() {
        let codec = codec();
        let mut exit = codec.default_record(RecordKind::VoluntaryExit);
        exit.as_mut_slice().unwrap()[2] = Value::bytes(vec![0; 95]);

        let err = codec.encode(RecordKind::VoluntaryExit, &exit).unwrap_err();
        assert_eq!(err.path(), Some("signature".to_string()));

        let err = codec
            .hash_tree_root(RecordKind::VoluntaryExit, &exit)
            .unwrap_err();
        assert_eq!(err.path(), Some("signature".to_string()));
    }

    #[test]
    fn cached_root_matches() {
        let codec = codec();
        let mut state = codec.default_record(RecordKind::BeaconState);
        let mut cache = codec.cached_root(RecordKind::BeaconState);

        assert_eq!(
            cache.recalculate(&state).ok(),
            codec.hash_tree_root(RecordKind::BeaconState, &state).ok()
        );

        state.as_mut_slice().unwrap()[1] = Value::Uint(42);
        assert_eq!(
            cache.recalculate(&state).ok(),
            codec.hash_tree_root(RecordKind::BeaconState, &state).ok()
        );
    }
}
