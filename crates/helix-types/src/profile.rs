//! Chain identity and endpoint configuration.

use crate::Coin;

/// Static description of the target network. Constructed by the embedder;
/// `Default` is the reference network profile.
#[derive(Debug, Clone)]
pub struct ChainProfile {
    /// Cosmos-side chain id, e.g. "helix_4242-1".
    pub chain_id: String,
    /// EVM-side numeric chain id for provider network switching.
    pub evm_chain_id: u64,
    /// Bech32 human-readable prefix for account addresses.
    pub bech32_prefix: String,
    /// Base (atomic) denom, e.g. "ahlx".
    pub base_denom: String,
    /// Display symbol, e.g. "HLX".
    pub display_denom: String,
    /// Display exponent: base atomics per display unit is 10^decimals.
    pub decimals: u32,
    /// LCD REST endpoint.
    pub lcd_url: String,
    /// Gas price in base atomics per gas unit.
    pub gas_price: u128,
    /// Gas limit used when simulation is unavailable.
    pub default_gas_limit: u64,
    /// Safety margin applied to simulated gas, in basis points.
    pub gas_adjustment_bps: u32,
}

impl Default for ChainProfile {
    fn default() -> Self {
        Self {
            chain_id: "helix_4242-1".to_string(),
            evm_chain_id: 4242,
            bech32_prefix: "helix".to_string(),
            base_denom: "ahlx".to_string(),
            display_denom: "HLX".to_string(),
            decimals: 18,
            lcd_url: "https://lcd.helix.zone".to_string(),
            gas_price: 20_000_000_000,
            default_gas_limit: 200_000,
            gas_adjustment_bps: 13_000,
        }
    }
}

impl ChainProfile {
    /// Fee coin for a gas limit at the configured gas price.
    pub fn fee_for_gas(&self, gas_limit: u64) -> Coin {
        Coin::new(
            self.base_denom.clone(),
            (gas_limit as u128).saturating_mul(self.gas_price),
        )
    }

    /// Apply the gas adjustment margin to a simulated gas figure.
    pub fn adjust_gas(&self, gas_used: u64) -> u64 {
        ((gas_used as u128).saturating_mul(self.gas_adjustment_bps as u128) / 10_000) as u64
    }

    /// EVM chain id in the 0x-hex form providers expect.
    pub fn evm_chain_id_hex(&self) -> String {
        format!("0x{:x}", self.evm_chain_id)
    }

    /// Bech32 prefix for validator operator addresses.
    pub fn valoper_prefix(&self) -> String {
        format!("{}valoper", self.bech32_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_for_gas() {
        let profile = ChainProfile::default();
        let fee = profile.fee_for_gas(200_000);
        assert_eq!(fee.denom, "ahlx");
        assert_eq!(fee.amount, 200_000u128 * 20_000_000_000u128);
    }

    #[test]
    fn test_adjust_gas_applies_margin() {
        let profile = ChainProfile::default();
        assert_eq!(profile.adjust_gas(100_000), 130_000);
    }

    #[test]
    fn test_evm_chain_id_hex() {
        let profile = ChainProfile::default();
        assert_eq!(profile.evm_chain_id_hex(), "0x1092");
    }
}
