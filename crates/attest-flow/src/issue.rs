// Cash issuance conditioned on an oracle-attested fact
//
// The state records an amount owned by a key. The contract accepts a
// transaction that issues such states under exactly one Issue command signed
// by every owner, alongside at least one oracle attestation.

use std::collections::BTreeSet;

use attest_crypto::PublicKey;
use attest_ledger::{Command, Contract, ContractId, OutputState, UnsignedTransaction};

/// Contract identifier referenced by issued cash states
pub const CASH_ISSUE_CONTRACT_ID: &str = "attest.examples.CashIssueContract";

/// Kind tag of cash output states
pub const CASH_STATE_KIND: &str = "CashOwningState";

/// Name of the issuance command
pub const ISSUE_COMMAND: &str = "Issue";

/// An amount of cash owned by a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashOwningState {
    pub amount: u64,
    pub owner: PublicKey,
}

impl CashOwningState {
    /// Create a new cash state
    pub fn new(amount: u64, owner: PublicKey) -> Self {
        Self { amount, owner }
    }

    /// Generic output representation
    pub fn to_output_state(&self) -> OutputState {
        OutputState::new(CASH_STATE_KIND)
            .with_participant(self.owner)
            .with_field("amount", self.amount.to_string())
            .with_field("owner", self.owner.to_hex())
    }

    /// Read a cash state back from its generic representation
    pub fn from_output_state(state: &OutputState) -> Result<Self, String> {
        if state.kind != CASH_STATE_KIND {
            return Err(format!("expected {} output, found {}", CASH_STATE_KIND, state.kind));
        }
        let amount = state
            .field("amount")
            .ok_or("cash state has no amount")?
            .parse::<u64>()
            .map_err(|e| format!("invalid amount: {}", e))?;
        let owner = state
            .field("owner")
            .ok_or("cash state has no owner")
            .and_then(|hex| PublicKey::from_hex(hex).map_err(|_| "invalid owner key"))?;
        Ok(Self { amount, owner })
    }
}

/// Acceptance rules for cash issuance
#[derive(Debug, Clone, Copy, Default)]
pub struct CashIssueContract;

impl CashIssueContract {
    /// Identifier of this contract
    pub fn contract_id() -> ContractId {
        ContractId::new(CASH_ISSUE_CONTRACT_ID)
    }

    /// Issue command signed by `issuer`
    pub fn issue_command(issuer: PublicKey) -> Command {
        Command::business(Self::contract_id(), ISSUE_COMMAND, [issuer])
    }
}

impl Contract for CashIssueContract {
    fn id(&self) -> ContractId {
        Self::contract_id()
    }

    fn verify(&self, tx: &UnsignedTransaction) -> Result<(), String> {
        let id = Self::contract_id();

        let issues: Vec<&Command> = tx
            .commands()
            .iter()
            .filter(|command| command.business_name() == Some((&id, ISSUE_COMMAND)))
            .collect();
        let issue = match issues.as_slice() {
            [issue] => *issue,
            [] => return Err("no Issue command".to_string()),
            _ => return Err("more than one Issue command".to_string()),
        };

        if !tx.commands().iter().any(Command::is_attestation) {
            return Err("issuance requires an oracle attestation".to_string());
        }

        let mut owners = BTreeSet::new();
        for output in tx.outputs().iter().filter(|state| state.contract == id) {
            let cash = CashOwningState::from_output_state(&output.data)?;
            if cash.amount == 0 {
                return Err("issued amount must be positive".to_string());
            }
            owners.insert(cash.owner);
        }
        if owners.is_empty() {
            return Err("no cash issued".to_string());
        }
        if let Some(owner) = owners.iter().find(|owner| !issue.requires(owner)) {
            return Err(format!("owner {} must sign the Issue command", owner.short()));
        }
        Ok(())
    }
}
