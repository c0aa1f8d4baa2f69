use std::{env, str::FromStr};

use alloy::{
    network::EthereumWallet,
    signers::{local::PrivateKeySigner, SignerSync},
};
use alloy_primitives::{Address, PrimitiveSignature as Signature, B256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use dotenv::dotenv;

use crate::execution::{errors::ExecutionError, evm::constants::PRIVATE_KEY_ENV};

/// The operating account: a local private key and the wallet used to sign transactions with it.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    network_wallet: EthereumWallet,
}

impl Wallet {
    pub fn from_private_key(private_key: &str) -> Result<Self, ExecutionError> {
        let pk = B256::from_str(private_key.trim()).map_err(|_| {
            ExecutionError::FatalError("Failed to convert private key to B256".to_string())
        })?;
        let signer = PrivateKeySigner::from_bytes(&pk).map_err(|_| {
            ExecutionError::FatalError("Failed to create signer from private key".to_string())
        })?;
        Ok(Self { network_wallet: EthereumWallet::from(signer.clone()), signer })
    }

    /// Loads the key from `PRIVATE_KEY`, reading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, ExecutionError> {
        dotenv().ok();
        let private_key = env::var(PRIVATE_KEY_ENV).map_err(|_| {
            ExecutionError::FatalError(format!(
                "Private key not found. Set the {} environment variable",
                PRIVATE_KEY_ENV
            ))
        })?;
        Self::from_private_key(&private_key)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub(crate) fn network_wallet(&self) -> &EthereumWallet {
        &self.network_wallet
    }

    /// Signs the EIP-712 hash of `value` under `domain`. No network access.
    pub fn sign_typed_data<T: SolStruct>(
        &self,
        value: &T,
        domain: &Eip712Domain,
    ) -> Result<Signature, ExecutionError> {
        let hash = value.eip712_signing_hash(domain);
        self.signer
            .sign_hash_sync(&hash)
            .map_err(|e| {
                ExecutionError::FatalError(format!("Failed to sign typed data with error: {}", e))
            })
    }
}

#[cfg(test)]
mod tests {
    use alloy_sol_types::eip712_domain;

    use super::*;
    use crate::execution::evm::contracts::PermitDetails;

    const ANVIL_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_from_private_key() {
        let wallet = Wallet::from_private_key(ANVIL_PRIVATE_KEY).unwrap();
        assert_eq!(
            wallet.address(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );

        let unprefixed = Wallet::from_private_key(&ANVIL_PRIVATE_KEY[2..]).unwrap();
        assert_eq!(unprefixed.address(), wallet.address());
    }

    #[test]
    fn test_from_invalid_private_key() {
        assert!(matches!(
            Wallet::from_private_key("not-a-key"),
            Err(ExecutionError::FatalError(_))
        ));
    }

    #[test]
    fn test_sign_typed_data_recovers_signer() {
        let wallet = Wallet::from_private_key(ANVIL_PRIVATE_KEY).unwrap();
        let permit2 = Address::from_str("0x000000000022D473030F116dDEE9F6B43aC78BA3").unwrap();
        let domain = eip712_domain! {
            name: "Permit2",
            chain_id: 8453,
            verifying_contract: permit2,
        };
        let details = PermitDetails {
            token: Address::from_str("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").unwrap(),
            amount: Default::default(),
            expiration: Default::default(),
            nonce: Default::default(),
        };

        let signature = wallet
            .sign_typed_data(&details, &domain)
            .unwrap();
        let recovered = signature
            .recover_address_from_prehash(&details.eip712_signing_hash(&domain))
            .unwrap();
        assert_eq!(recovered, wallet.address());
    }
}
