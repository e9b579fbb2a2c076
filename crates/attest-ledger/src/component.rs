// Transaction components as seen by disclosure predicates
//
// Every transaction is committed to as an ordered list of components:
// the notary, then each output, then each command.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::commitment::canonical_bytes;
use crate::identity::Party;
use crate::state::TransactionState;
use crate::LedgerResult;

/// Component group, in commitment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentGroup {
    Notary,
    Outputs,
    Commands,
}

impl ComponentGroup {
    /// Numeric tag mixed into component nonces
    pub fn tag(&self) -> u32 {
        match self {
            ComponentGroup::Notary => 0,
            ComponentGroup::Outputs => 1,
            ComponentGroup::Commands => 2,
        }
    }
}

impl fmt::Display for ComponentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentGroup::Notary => write!(f, "notary"),
            ComponentGroup::Outputs => write!(f, "outputs"),
            ComponentGroup::Commands => write!(f, "commands"),
        }
    }
}

/// A borrowed view of one transaction component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component<'a> {
    Notary(&'a Party),
    Output(&'a TransactionState),
    Command(&'a Command),
}

impl<'a> Component<'a> {
    /// Group this component belongs to
    pub fn group(&self) -> ComponentGroup {
        match self {
            Component::Notary(_) => ComponentGroup::Notary,
            Component::Output(_) => ComponentGroup::Outputs,
            Component::Command(_) => ComponentGroup::Commands,
        }
    }

    /// Canonical bytes committed to by the component's leaf
    pub fn encode(&self) -> LedgerResult<Vec<u8>> {
        match self {
            Component::Notary(party) => canonical_bytes(*party),
            Component::Output(state) => canonical_bytes(*state),
            Component::Command(command) => canonical_bytes(*command),
        }
    }

    /// Owned copy suitable for disclosure
    pub fn disclose(&self) -> DisclosedComponent {
        match self {
            Component::Notary(party) => DisclosedComponent::Notary((*party).clone()),
            Component::Output(state) => DisclosedComponent::Output((*state).clone()),
            Component::Command(command) => DisclosedComponent::Command((*command).clone()),
        }
    }
}

/// An owned component revealed in a filtered view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisclosedComponent {
    Notary(Party),
    Output(TransactionState),
    Command(Command),
}

impl DisclosedComponent {
    /// Borrow as a component
    pub fn as_component(&self) -> Component<'_> {
        match self {
            DisclosedComponent::Notary(party) => Component::Notary(party),
            DisclosedComponent::Output(state) => Component::Output(state),
            DisclosedComponent::Command(command) => Component::Command(command),
        }
    }
}
