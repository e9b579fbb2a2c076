// Ledger model for oracle-attested transactions
//
// This crate holds the transaction model the protocol operates on: parties,
// output states, commands, the assembler, contract verification, the
// selectively disclosed view handed to the oracle and signature aggregation.

pub mod builder;
pub mod command;
pub mod commitment;
pub mod component;
pub mod contract;
pub mod fact;
pub mod filter;
pub mod identity;
pub mod signatures;
pub mod signed;
pub mod state;
pub mod transaction;

pub use attest_error::{LedgerError, LedgerResult};

pub use builder::TransactionBuilder;
pub use command::{Command, CommandData};
pub use component::{Component, ComponentGroup, DisclosedComponent};
pub use contract::{Contract, ContractRegistry};
pub use fact::{Answer, Proof, ProofType, Query};
pub use filter::{DisclosurePredicate, FilteredComponent, FilteredTransaction};
pub use identity::Party;
pub use signatures::{SignatureSet, TransactionSignature};
pub use signed::{FinalizedTransaction, NotarisationProof, SignedTransaction};
pub use state::{ContractId, OutputState, TransactionState};
pub use transaction::{PrivacySalt, UnsignedTransaction};
