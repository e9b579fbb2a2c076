// Oracle-assisted issuance flow
//
// Sequences the oracle query, proof verification, transaction assembly,
// selective disclosure, signature collection and notarization of one run,
// and tracks its progress.

pub mod commit;
pub mod config;
pub mod flow;
pub mod issue;
pub mod progress;
pub mod telemetry;

pub use commit::{
    Committer, InMemoryLedger, InMemoryNotary, NotarisationResponse, NotaryService, TransactionSink,
};
pub use config::{FlowConfig, TimeoutConfig};
pub use flow::{FlowError, FlowFailure, FlowResult, FlowServices, OracleIssueFlow};
pub use issue::{CashIssueContract, CashOwningState};
pub use progress::{ProgressError, ProgressTracker, ProtocolStep};
pub use telemetry::{init_from_config, init_test_logging, init_tracing};
