//! Call specifications handed to the wallet provider
//!
//! The engine's only wire protocol is the shape of the call it hands to the
//! wallet (target, selector, ABI-encoded arguments, optional native value)
//! and the receipt it reads back; both are determined by the target
//! contracts.

use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};
use sha3::{Digest, Keccak256};

/// A fully specified contract call, ready for signing
#[derive(Debug, Clone)]
pub struct CallSpec {
    /// Target contract
    pub to: Address,
    /// 4-byte function selector
    pub selector: [u8; 4],
    /// ABI arguments
    pub args: Vec<Token>,
    /// Native value attached to the call
    pub value: U256,
}

impl CallSpec {
    pub fn new(to: Address, selector: [u8; 4], args: Vec<Token>) -> Self {
        Self {
            to,
            selector,
            args,
            value: U256::zero(),
        }
    }

    /// Encode selector + arguments into calldata
    pub fn calldata(&self) -> Bytes {
        let mut data = self.selector.to_vec();
        data.extend(ethers::abi::encode(&self.args));
        Bytes::from(data)
    }
}

/// Compute a 4-byte selector from a function signature
fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Function selectors for the contracts the engine talks to
pub mod selectors {
    use super::selector;
    use lazy_static::lazy_static;

    lazy_static! {
        // ERC-20
        pub static ref APPROVE: [u8; 4] = selector("approve(address,uint256)");
        pub static ref ALLOWANCE: [u8; 4] = selector("allowance(address,address)");
        pub static ref BALANCE_OF: [u8; 4] = selector("balanceOf(address)");
        pub static ref TOTAL_SUPPLY: [u8; 4] = selector("totalSupply()");

        // Pool views
        pub static ref TOKEN0: [u8; 4] = selector("token0()");
        pub static ref TOKEN1: [u8; 4] = selector("token1()");
        pub static ref GET_RESERVES: [u8; 4] = selector("getReserves()");
        pub static ref GET_AMOUNT_OUT: [u8; 4] = selector("getAmountOut(address,uint256)");

        // Router actions
        pub static ref ADD_LIQUIDITY: [u8; 4] =
            selector("addLiquidity(address,uint256,uint256,uint256,uint256,uint256)");
        pub static ref REMOVE_LIQUIDITY: [u8; 4] =
            selector("removeLiquidity(address,uint256,uint256,uint256,uint256)");
        pub static ref SWAP: [u8; 4] =
            selector("swap(address,address,uint256,uint256,uint256)");

        // Launchpad
        pub static ref PROJECTS: [u8; 4] = selector("projects(uint256)");
        pub static ref DEPOSIT_TOKENS: [u8; 4] = selector("depositTokens(uint256,uint256)");
        pub static ref WITHDRAW_UNSOLD: [u8; 4] = selector("withdrawUnsoldTokens(uint256)");
    }
}

/// Build an exact-amount ERC-20 approval call. The engine never requests
/// an unbounded approval.
pub fn approve_call(token: Address, spender: Address, amount: U256) -> CallSpec {
    CallSpec::new(
        token,
        *selectors::APPROVE,
        vec![Token::Address(spender), Token::Uint(amount)],
    )
}
