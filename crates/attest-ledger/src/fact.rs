// Fact types exchanged with an external oracle
//
// A query names a datasource, an expression evaluated against it and the kind
// of proof the oracle must attach. The answer is immutable once received and
// travels inside the attestation command.

use std::fmt;
use std::str::FromStr;

use attest_crypto::{domain_hash, HashOutput, PublicKey};
use serde::{Deserialize, Serialize};

use crate::commitment::canonical_bytes;
use crate::{LedgerError, LedgerResult};

const ANSWER_DOMAIN: &str = "attest/answer";

/// Kind of evidence an oracle attaches to an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProofType {
    /// Transport-layer notarization transcript
    #[serde(rename = "TLS_PROOF")]
    TlsNotary,
    /// Hardware-backed attestation from an Android device
    #[serde(rename = "ANDROID_PROOF")]
    Android,
    /// Hardware wallet attestation
    #[serde(rename = "LEDGER_PROOF")]
    Ledger,
    /// Oracle-native signature without third-party evidence
    #[serde(rename = "NATIVE_PROOF")]
    Native,
}

impl ProofType {
    /// Wire name of the proof type
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofType::TlsNotary => "TLS_PROOF",
            ProofType::Android => "ANDROID_PROOF",
            ProofType::Ledger => "LEDGER_PROOF",
            ProofType::Native => "NATIVE_PROOF",
        }
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TLS_PROOF" => Ok(ProofType::TlsNotary),
            "ANDROID_PROOF" => Ok(ProofType::Android),
            "LEDGER_PROOF" => Ok(ProofType::Ledger),
            "NATIVE_PROOF" => Ok(ProofType::Native),
            other => Err(LedgerError::EncodingError(format!("unknown proof type: {}", other))),
        }
    }
}

/// Query for a fact held by an external datasource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Datasource kind, e.g. `URL`
    pub datasource: String,
    /// Expression evaluated against the datasource
    pub expression: String,
    /// Evidence the oracle must attach
    pub proof_type: ProofType,
}

impl Query {
    /// Create a new query
    pub fn new(
        datasource: impl Into<String>,
        expression: impl Into<String>,
        proof_type: ProofType,
    ) -> Self {
        Self {
            datasource: datasource.into(),
            expression: expression.into(),
            proof_type,
        }
    }
}

/// Evidence bundle attached to an answer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proof {
    /// Scheme the evidence claims to follow
    pub proof_type: ProofType,
    /// Opaque evidence bytes
    #[serde(with = "evidence_hex")]
    pub evidence: Vec<u8>,
}

impl Proof {
    /// Create a new proof
    pub fn new(proof_type: ProofType, evidence: impl Into<Vec<u8>>) -> Self {
        Self {
            proof_type,
            evidence: evidence.into(),
        }
    }
}

/// Answer returned by an oracle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Answer {
    /// Attested value, e.g. a price
    pub value: String,
    /// Evidence of how the value was obtained
    pub proof: Proof,
    /// Key of the oracle that produced the answer
    pub attester: PublicKey,
}

impl Answer {
    /// Create a new answer
    pub fn new(value: impl Into<String>, proof: Proof, attester: PublicKey) -> Self {
        Self {
            value: value.into(),
            proof,
            attester,
        }
    }

    /// Digest the oracle signs when it hands out this answer
    pub fn digest(&self) -> LedgerResult<HashOutput> {
        let bytes = canonical_bytes(self)?;
        Ok(domain_hash(ANSWER_DOMAIN, &[&bytes]))
    }
}

mod evidence_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_crypto::KeyPair;

    #[test]
    fn test_proof_type_wire_names() {
        let json = serde_json::to_string(&ProofType::TlsNotary).unwrap();
        assert_eq!(json, "\"TLS_PROOF\"");
        assert_eq!("ANDROID_PROOF".parse::<ProofType>().unwrap(), ProofType::Android);
        assert!("SMOKE_SIGNAL".parse::<ProofType>().is_err());
    }

    #[test]
    fn test_query_serialization() {
        let query = Query::new("URL", "json(https://example.org/ticker).result.0.last", ProofType::TlsNotary);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["datasource"], "URL");
        assert_eq!(json["proof_type"], "TLS_PROOF");
    }

    #[test]
    fn test_answer_digest_binds_every_field() {
        let oracle = KeyPair::from_seed([9u8; 32]).public_key();
        let answer = Answer::new("25000.12", Proof::new(ProofType::TlsNotary, vec![1, 2, 3]), oracle);

        let mut other_value = answer.clone();
        other_value.value = "25000.13".to_string();
        let mut other_evidence = answer.clone();
        other_evidence.proof.evidence.push(4);

        let digest = answer.digest().unwrap();
        assert_eq!(digest, answer.clone().digest().unwrap());
        assert_ne!(digest, other_value.digest().unwrap());
        assert_ne!(digest, other_evidence.digest().unwrap());
    }

    #[test]
    fn test_evidence_is_hex_on_the_wire() {
        let proof = Proof::new(ProofType::Native, vec![0xde, 0xad]);
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["evidence"], "dead");
    }
}
