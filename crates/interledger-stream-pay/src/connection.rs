use interledger_packet::Address;
use std::fmt;
use uuid::Uuid;

/// The asset an account is denominated in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Denomination {
    asset_code: String,
    asset_scale: u8,
}

impl Denomination {
    pub fn new<S: Into<String>>(asset_code: S, asset_scale: u8) -> Self {
        Denomination {
            asset_code: asset_code.into(),
            asset_scale,
        }
    }

    #[inline]
    pub fn asset_code(&self) -> &str {
        &self.asset_code
    }

    #[inline]
    pub fn asset_scale(&self) -> u8 {
        self.asset_scale
    }
}

/// An Interledger account, as seen by the sender.
///
/// The denomination is optional because a receiver only reveals its asset
/// once it replies to a STREAM packet.
#[derive(Clone, Debug, PartialEq)]
pub struct AccountDetails {
    interledger_address: Address,
    denomination: Option<Denomination>,
}

impl AccountDetails {
    pub fn new(interledger_address: Address, denomination: Option<Denomination>) -> Self {
        AccountDetails {
            interledger_address,
            denomination,
        }
    }

    #[inline]
    pub fn interledger_address(&self) -> &Address {
        &self.interledger_address
    }

    #[inline]
    pub fn denomination(&self) -> Option<&Denomination> {
        self.denomination.as_ref()
    }

    pub fn with_denomination(&self, denomination: Option<Denomination>) -> Self {
        AccountDetails {
            interledger_address: self.interledger_address.clone(),
            denomination,
        }
    }

    /// The first segment of the address, for example `g` or `test`.
    pub fn scheme(&self) -> String {
        address_scheme(&self.interledger_address)
    }
}

pub(crate) fn address_scheme(address: &Address) -> String {
    address
        .to_string()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Secret shared with the receiver, used to encrypt packets and derive fulfillments.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    pub fn new(bytes: [u8; 32]) -> Self {
        SharedSecret(bytes)
    }

    /// Returns `None` unless exactly 32 bytes are given.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 32 {
            return None;
        }
        let mut secret = [0; 32];
        secret.copy_from_slice(bytes);
        Some(SharedSecret(secret))
    }
}

impl AsRef<[u8]> for SharedSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

/// Everything needed to talk to a single receiver.
#[derive(Clone, Debug)]
pub struct StreamConnection {
    connection_id: Uuid,
    source_account: AccountDetails,
    destination_address: Address,
    shared_secret: SharedSecret,
}

impl StreamConnection {
    pub fn new(
        source_account: AccountDetails,
        destination_address: Address,
        shared_secret: SharedSecret,
    ) -> Self {
        StreamConnection {
            connection_id: Uuid::new_v4(),
            source_account,
            destination_address,
            shared_secret,
        }
    }

    /// Random id used to correlate log lines
    #[inline]
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    #[inline]
    pub fn source_account(&self) -> &AccountDetails {
        &self.source_account
    }

    #[inline]
    pub fn destination_address(&self) -> &Address {
        &self.destination_address
    }

    #[inline]
    pub fn shared_secret(&self) -> &SharedSecret {
        &self.shared_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn extracts_address_scheme() {
        let account = AccountDetails::new(Address::from_str("g.alice.wallet").unwrap(), None);
        assert_eq!(account.scheme(), "g");
        let account = AccountDetails::new(Address::from_str("test.bob").unwrap(), None);
        assert_eq!(account.scheme(), "test");
    }

    #[test]
    fn shared_secret_is_redacted_and_sized() {
        let secret = SharedSecret::new([7; 32]);
        assert_eq!(format!("{:?}", secret), "SharedSecret([REDACTED])");
        assert!(SharedSecret::from_slice(&[0; 31]).is_none());
        assert_eq!(SharedSecret::from_slice(&[7; 32]).unwrap(), secret);
    }

    #[test]
    fn connections_get_unique_ids() {
        let account = AccountDetails::new(
            Address::from_str("example.sender").unwrap(),
            Some(Denomination::new("XRP", 9)),
        );
        let destination = Address::from_str("example.receiver").unwrap();
        let first = StreamConnection::new(
            account.clone(),
            destination.clone(),
            SharedSecret::new([0; 32]),
        );
        let second = StreamConnection::new(account, destination, SharedSecret::new([0; 32]));
        assert_ne!(first.connection_id(), second.connection_id());
        assert_eq!(
            first.source_account().denomination().unwrap().asset_code(),
            "XRP"
        );
    }
}
