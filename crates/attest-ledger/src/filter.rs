// Selective disclosure of transaction components
//
// A filtered transaction carries, for every component in commitment order,
// either the component with its nonce or only its leaf hash. The receiver
// recomputes the Merkle root from the view and compares it to the id it is
// asked to sign, without learning anything about hidden components.

use attest_crypto::{merkle_root, HashOutput, PublicKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::Command;
use crate::commitment::{component_nonce, leaf_hash};
use crate::component::{Component, ComponentGroup, DisclosedComponent};
use crate::identity::Party;
use crate::state::TransactionState;
use crate::transaction::UnsignedTransaction;
use crate::{LedgerError, LedgerResult};

/// Decides which components a viewer may see
pub trait DisclosurePredicate: Send + Sync {
    /// Whether `component` is revealed to `viewer`
    fn reveal(&self, viewer: &PublicKey, component: &Component<'_>) -> LedgerResult<bool>;
}

impl<F> DisclosurePredicate for F
where
    F: Fn(&PublicKey, &Component<'_>) -> bool + Send + Sync,
{
    fn reveal(&self, viewer: &PublicKey, component: &Component<'_>) -> LedgerResult<bool> {
        Ok(self(viewer, component))
    }
}

/// One component position in a filtered transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilteredComponent {
    /// Component visible to the viewer
    Revealed {
        group: ComponentGroup,
        index: u32,
        nonce: HashOutput,
        component: DisclosedComponent,
    },
    /// Component withheld from the viewer
    Hidden {
        group: ComponentGroup,
        index: u32,
        leaf: HashOutput,
    },
}

impl FilteredComponent {
    /// Group and index of this position
    pub fn position(&self) -> (ComponentGroup, u32) {
        match self {
            FilteredComponent::Revealed { group, index, .. }
            | FilteredComponent::Hidden { group, index, .. } => (*group, *index),
        }
    }

    /// Whether the component is visible
    pub fn is_revealed(&self) -> bool {
        matches!(self, FilteredComponent::Revealed { .. })
    }

    fn leaf(&self) -> LedgerResult<HashOutput> {
        match self {
            FilteredComponent::Revealed {
                group,
                nonce,
                component,
                ..
            } => {
                let component = component.as_component();
                if component.group() != *group {
                    return Err(LedgerError::disclosure(format!(
                        "revealed {} component placed in {} group",
                        component.group(),
                        group
                    )));
                }
                Ok(leaf_hash(nonce, &component.encode()?))
            }
            FilteredComponent::Hidden { leaf, .. } => Ok(*leaf),
        }
    }
}

/// A partial view of a transaction bound to its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransaction {
    id: HashOutput,
    components: Vec<FilteredComponent>,
}

impl FilteredTransaction {
    /// Build the view of `tx` that `predicate` allows `viewer` to see.
    ///
    /// The predicate is consulted exactly once per component. Any predicate
    /// failure or a view whose root does not match the id fails closed.
    pub fn build(
        tx: &UnsignedTransaction,
        predicate: &dyn DisclosurePredicate,
        viewer: &PublicKey,
    ) -> LedgerResult<Self> {
        let salt = tx.privacy_salt();
        let mut components = Vec::new();

        for (group, index, component) in tx.components() {
            let nonce = component_nonce(salt.as_bytes(), group, index);
            let reveal = predicate.reveal(viewer, &component).map_err(|e| {
                LedgerError::disclosure(format!(
                    "predicate failed on {} #{}: {}",
                    group, index, e
                ))
            })?;

            components.push(if reveal {
                FilteredComponent::Revealed {
                    group,
                    index,
                    nonce,
                    component: component.disclose(),
                }
            } else {
                FilteredComponent::Hidden {
                    group,
                    index,
                    leaf: leaf_hash(&nonce, &component.encode()?),
                }
            });
        }

        let view = Self {
            id: tx.id()?,
            components,
        };
        view.verify()?;

        debug!(
            id = %view.id,
            viewer = %viewer.short(),
            revealed = view.revealed_count(),
            hidden = view.hidden_count(),
            "Built filtered transaction"
        );
        Ok(view)
    }

    /// Recompute the root from the view and compare it to the id
    pub fn verify(&self) -> LedgerResult<()> {
        self.check_positions()?;

        let leaves = self
            .components
            .iter()
            .map(FilteredComponent::leaf)
            .collect::<LedgerResult<Vec<_>>>()?;
        let root = merkle_root(&leaves)
            .map_err(|e| LedgerError::disclosure(format!("cannot commit to view: {}", e)))?;

        if root != self.id {
            return Err(LedgerError::disclosure(format!(
                "view commits to {} but claims id {}",
                root, self.id
            )));
        }
        Ok(())
    }

    fn check_positions(&self) -> LedgerResult<()> {
        let mut previous: Option<(ComponentGroup, u32)> = None;
        for component in &self.components {
            let (group, index) = component.position();
            let in_order = match previous {
                None => group == ComponentGroup::Notary && index == 0,
                Some((prev_group, prev_index)) => {
                    (group == prev_group && group != ComponentGroup::Notary && index == prev_index + 1)
                        || (group > prev_group && index == 0)
                }
            };
            if !in_order {
                return Err(LedgerError::disclosure(format!(
                    "component {} #{} out of commitment order",
                    group, index
                )));
            }
            previous = Some((group, index));
        }
        Ok(())
    }

    /// Id of the transaction this view belongs to
    pub fn id(&self) -> HashOutput {
        self.id
    }

    /// All positions in commitment order
    pub fn components(&self) -> &[FilteredComponent] {
        &self.components
    }

    /// The notary, if revealed
    pub fn notary(&self) -> Option<&Party> {
        self.components.iter().find_map(|c| match c {
            FilteredComponent::Revealed {
                component: DisclosedComponent::Notary(party),
                ..
            } => Some(party),
            _ => None,
        })
    }

    /// Revealed outputs
    pub fn revealed_outputs(&self) -> Vec<&TransactionState> {
        self.components
            .iter()
            .filter_map(|c| match c {
                FilteredComponent::Revealed {
                    component: DisclosedComponent::Output(state),
                    ..
                } => Some(state),
                _ => None,
            })
            .collect()
    }

    /// Revealed commands
    pub fn revealed_commands(&self) -> Vec<&Command> {
        self.components
            .iter()
            .filter_map(|c| match c {
                FilteredComponent::Revealed {
                    component: DisclosedComponent::Command(command),
                    ..
                } => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Number of revealed components
    pub fn revealed_count(&self) -> usize {
        self.components.iter().filter(|c| c.is_revealed()).count()
    }

    /// Number of hidden components
    pub fn hidden_count(&self) -> usize {
        self.components.len() - self.revealed_count()
    }
}
