use crate::connection::{AccountDetails, Denomination};
use parking_lot::RwLock;
use tracing::warn;

/// Sender and receiver account details for one connection.
pub trait AssetDetailsTracker: Send + Sync {
    fn source_account(&self) -> AccountDetails;

    fn destination_account(&self) -> AccountDetails;

    /// Record the asset details the receiver shared. The first value sticks;
    /// a different value later on is flagged as a conflict and returns `false`.
    fn set_destination_denomination(&self, denomination: Denomination) -> bool;

    fn has_destination_conflict(&self) -> bool;
}

pub struct InMemoryAssetDetailsTracker {
    source_account: AccountDetails,
    destination: RwLock<DestinationDetails>,
}

struct DestinationDetails {
    account: AccountDetails,
    conflict: bool,
}

impl InMemoryAssetDetailsTracker {
    pub fn new(source_account: AccountDetails, destination_account: AccountDetails) -> Self {
        InMemoryAssetDetailsTracker {
            source_account,
            destination: RwLock::new(DestinationDetails {
                account: destination_account,
                conflict: false,
            }),
        }
    }
}

impl AssetDetailsTracker for InMemoryAssetDetailsTracker {
    fn source_account(&self) -> AccountDetails {
        self.source_account.clone()
    }

    fn destination_account(&self) -> AccountDetails {
        self.destination.read().account.clone()
    }

    fn set_destination_denomination(&self, denomination: Denomination) -> bool {
        let mut destination = self.destination.write();
        match destination.account.denomination() {
            None => {
                destination.account = destination.account.with_denomination(Some(denomination));
                true
            }
            Some(existing) if *existing == denomination => true,
            Some(existing) => {
                warn!(
                    "Receiver changed its asset details from {:?} to {:?}",
                    existing, denomination
                );
                destination.conflict = true;
                false
            }
        }
    }

    fn has_destination_conflict(&self) -> bool {
        self.destination.read().conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interledger_packet::Address;
    use std::str::FromStr;

    fn tracker() -> InMemoryAssetDetailsTracker {
        InMemoryAssetDetailsTracker::new(
            AccountDetails::new(
                Address::from_str("example.sender").unwrap(),
                Some(Denomination::new("XRP", 9)),
            ),
            AccountDetails::new(Address::from_str("example.receiver").unwrap(), None),
        )
    }

    #[test]
    fn sets_destination_details_once() {
        let tracker = tracker();
        assert!(tracker.destination_account().denomination().is_none());
        assert!(tracker.set_destination_denomination(Denomination::new("USD", 6)));
        assert!(tracker.set_destination_denomination(Denomination::new("USD", 6)));
        assert_eq!(
            tracker.destination_account().denomination(),
            Some(&Denomination::new("USD", 6))
        );
        assert!(!tracker.has_destination_conflict());
    }

    #[test]
    fn flags_conflicting_details_without_overwriting() {
        let tracker = tracker();
        tracker.set_destination_denomination(Denomination::new("USD", 6));
        assert!(!tracker.set_destination_denomination(Denomination::new("EUR", 2)));
        assert!(tracker.has_destination_conflict());
        assert_eq!(
            tracker.destination_account().denomination(),
            Some(&Denomination::new("USD", 6))
        );
        assert_eq!(tracker.source_account().scheme(), "example");
    }
}
