use std::sync::Arc;

use alloy::{
    providers::{ProviderBuilder, RootProvider},
    transports::BoxTransport,
};
use alloy_primitives::{Address, B256, U256};
use num_bigint::BigUint;
use tokio::runtime::{Handle, Runtime};
use tycho_common::Bytes;

use crate::execution::errors::ExecutionError;

/// Safely converts a `Bytes` object to an `Address` object.
///
/// Checks the length of the `Bytes` before attempting to convert, and returns an `ExecutionError`
/// if not 20 bytes long.
pub fn bytes_to_address(address: &Bytes) -> Result<Address, ExecutionError> {
    if address.len() == 20 {
        Ok(Address::from_slice(address))
    } else {
        Err(ExecutionError::InvalidInput(format!("Invalid address: {:?}", address)))
    }
}

/// Converts a `Bytes` salt into a 32-byte word.
pub fn bytes_to_b256(value: &Bytes) -> Result<B256, ExecutionError> {
    if value.len() == 32 {
        Ok(B256::from_slice(value))
    } else {
        Err(ExecutionError::InvalidInput(format!(
            "Expected 32 bytes, got {} bytes: {:?}",
            value.len(),
            value
        )))
    }
}

pub fn biguint_to_u256(value: &BigUint) -> U256 {
    let bytes = value.to_bytes_be();
    U256::from_be_slice(&bytes)
}

pub fn u256_to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Orders entries by token address, the order the vault registers pool tokens in.
///
/// Returns an error if the same token appears twice.
pub fn sort_by_address<T>(
    mut entries: Vec<(Address, T)>,
) -> Result<Vec<(Address, T)>, ExecutionError> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(pair) = entries
        .windows(2)
        .find(|pair| pair[0].0 == pair[1].0)
    {
        return Err(ExecutionError::InvalidInput(format!("Duplicate token: {}", pair[0].0)));
    }
    Ok(entries)
}

/// Returns the current tokio runtime handle, creating a runtime if none is running.
///
/// The runtime must be kept alive for as long as the handle is used.
pub fn get_runtime() -> Result<(Handle, Option<Arc<Runtime>>), ExecutionError> {
    match Handle::try_current() {
        Ok(handle) => Ok((handle, None)),
        Err(_) => {
            let runtime = Runtime::new().map_err(|e| {
                ExecutionError::FatalError(format!("Failed to create a new tokio runtime: {}", e))
            })?;
            let runtime = Arc::new(runtime);
            Ok((runtime.handle().clone(), Some(runtime)))
        }
    }
}

pub async fn get_client(
    rpc_url: &str,
) -> Result<Arc<RootProvider<BoxTransport>>, ExecutionError> {
    let client = ProviderBuilder::new()
        .on_builtin(rpc_url)
        .await
        .map_err(|e| {
            ExecutionError::FatalError(format!("Failed to connect to RPC {}: {}", rpc_url, e))
        })?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_bytes_to_address() {
        let bytes = Bytes::from_str("0x000000000022D473030F116dDEE9F6B43aC78BA3").unwrap();
        assert_eq!(
            bytes_to_address(&bytes).unwrap(),
            Address::from_str("0x000000000022D473030F116dDEE9F6B43aC78BA3").unwrap()
        );
        assert!(bytes_to_address(&Bytes::from_str("0x1234").unwrap()).is_err());
    }

    #[test]
    fn test_bytes_to_b256() {
        let salt = Bytes::from(vec![0u8; 32]);
        assert_eq!(bytes_to_b256(&salt).unwrap(), B256::ZERO);
        assert!(bytes_to_b256(&Bytes::from(vec![0u8; 31])).is_err());
    }

    #[test]
    fn test_u256_biguint_conversions() {
        let value = BigUint::from_str(
            "115792089237316195423570985008687907853269984665640564039457584007913129639935",
        )
        .unwrap();
        assert_eq!(biguint_to_u256(&value), U256::MAX);
        assert_eq!(u256_to_biguint(U256::MAX), value);
        assert_eq!(u256_to_biguint(U256::ZERO), BigUint::ZERO);
    }

    #[test]
    fn test_sort_by_address() {
        let usdt = Address::from_str("0xB8CE59FC3717ada4C02eaDF9682A9e934F625ebb").unwrap();
        let feusd = Address::from_str("0x02c6a2fA58cC01A18B8D9E00eA48d65E4dF26c70").unwrap();

        let sorted = sort_by_address(vec![(usdt, "usdt"), (feusd, "feusd")]).unwrap();
        assert_eq!(sorted, vec![(feusd, "feusd"), (usdt, "usdt")]);

        let duplicated = sort_by_address(vec![(usdt, 1), (usdt, 2)]);
        assert!(matches!(duplicated, Err(ExecutionError::InvalidInput(_))));
    }
}
