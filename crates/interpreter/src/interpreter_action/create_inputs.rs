use primitives::{keccak256, Address, Bytes, U256};

/// Create scheme.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CreateScheme {
    /// Legacy create scheme of `CREATE`.
    #[default]
    Create,
    /// Create scheme of `CREATE2`.
    Create2 {
        /// Salt.
        salt: U256,
    },
}

/// Inputs for a create call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreateInputs {
    /// Caller address of the EVM.
    pub caller: Address,
    /// The create scheme.
    pub scheme: CreateScheme,
    /// The value to transfer.
    pub value: U256,
    /// The init code of the contract.
    pub init_code: Bytes,
    /// The gas limit of the call.
    pub gas_limit: u64,
}

impl CreateInputs {
    /// Returns the address that this create call will create.
    pub fn created_address(&self, nonce: u64) -> Address {
        match self.scheme {
            CreateScheme::Create => self.caller.create(nonce),
            CreateScheme::Create2 { salt } => self
                .caller
                .create2(salt.to_be_bytes::<32>(), keccak256(&self.init_code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::{address, bytes};

    #[test]
    fn create_address() {
        let inputs = CreateInputs {
            caller: address!("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            ..Default::default()
        };
        assert_eq!(
            inputs.created_address(0),
            address!("0x3e4ea2156166390f880071d94458efb098473311")
        );
    }

    #[test]
    fn create2_address() {
        // EIP-1014 example 0
        let inputs = CreateInputs {
            caller: Address::ZERO,
            scheme: CreateScheme::Create2 { salt: U256::ZERO },
            init_code: bytes!("00"),
            ..Default::default()
        };
        assert_eq!(
            inputs.created_address(0),
            address!("0x4D1A2e2bB4F88F0250f26Ffff098B0b30B26BF38")
        );
    }
}
