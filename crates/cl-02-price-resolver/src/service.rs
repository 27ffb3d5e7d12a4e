//! Pair registry and valuation service.

use crate::domain::{
    PairConfig, PairKey, PriceReading, ResolverError, ResolverResult, Valuation,
};
use crate::ports::PriceSource;
use parking_lot::RwLock;
use shared_types::entities::is_zero_address;
use shared_types::{Address, Module, ModuleId, Token, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Widest decimal precision the normalization math accepts.
const MAX_DECIMALS: u32 = 38;

fn pow10(exp: u32) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}

/// Registry mapping asset pairs to price sources with
/// inversion/decimals metadata.
pub struct PriceResolver {
    admin: Address,
    pairs: RwLock<HashMap<PairKey, PairConfig>>,
}

impl PriceResolver {
    /// Empty registry administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            pairs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a source for `(base, quote)`.
    pub fn register(
        &self,
        caller: Address,
        base: Token,
        quote: Token,
        source: Arc<dyn PriceSource>,
        inverted: bool,
        source_decimals: u32,
        base_decimals: u32,
    ) -> ResolverResult<()> {
        self.require_admin(caller)?;
        if is_zero_address(&base) || is_zero_address(&quote) {
            return Err(ResolverError::InvalidPair("zero address"));
        }
        if base == quote {
            return Err(ResolverError::InvalidPair("base equals quote"));
        }
        if source_decimals > MAX_DECIMALS {
            return Err(ResolverError::InvalidDecimals(source_decimals));
        }
        if base_decimals > MAX_DECIMALS {
            return Err(ResolverError::InvalidDecimals(base_decimals));
        }

        let key = PairKey::new(base, quote);
        let mut pairs = self.pairs.write();
        if pairs.contains_key(&key) {
            return Err(ResolverError::PairAlreadyRegistered { base, quote });
        }
        pairs.insert(
            key,
            PairConfig {
                source,
                inverted,
                source_decimals,
                base_decimals,
            },
        );
        info!(
            "[PriceResolver] Registered {:?}/{:?} (inverted: {}, decimals: {}/{})",
            base, quote, inverted, source_decimals, base_decimals
        );
        Ok(())
    }

    /// Remove one pair.
    pub fn deregister(&self, caller: Address, base: Token, quote: Token) -> ResolverResult<()> {
        self.require_admin(caller)?;
        if self.pairs.write().remove(&PairKey::new(base, quote)).is_none() {
            return Err(ResolverError::PairNotSupported { base, quote });
        }
        info!("[PriceResolver] Deregistered {:?}/{:?}", base, quote);
        Ok(())
    }

    /// Remove every pair referencing `token`. Returns how many were
    /// removed.
    pub fn deregister_token(&self, caller: Address, token: Token) -> ResolverResult<usize> {
        self.require_admin(caller)?;
        let mut pairs = self.pairs.write();
        let before = pairs.len();
        pairs.retain(|key, _| !key.references(&token));
        let removed = before - pairs.len();
        if removed > 0 {
            info!(
                "[PriceResolver] Deregistered {} pair(s) referencing {:?}",
                removed, token
            );
        }
        Ok(removed)
    }

    /// Whether any registered pair references `token`.
    pub fn is_token_supported(&self, token: &Token) -> bool {
        self.pairs.read().keys().any(|key| key.references(token))
    }

    /// All registered pairs.
    pub fn supported_pairs(&self) -> Vec<PairKey> {
        self.pairs.read().keys().copied().collect()
    }

    /// Latest reading for `(base, quote)` with inversion applied,
    /// still at the source's decimal precision.
    pub fn latest_answer_for(&self, base: Token, quote: Token) -> ResolverResult<PriceReading> {
        let config = self.pair_config(base, quote)?;
        let reading = config
            .source
            .latest_answer()
            .map_err(ResolverError::SourceFailure)?;
        let value = Self::oriented_price(&config, reading.value)?;
        Ok(PriceReading {
            value,
            timestamp: reading.timestamp,
        })
    }

    /// Value of `amount` base units in quote units at `target_decimals`
    /// precision, tagged with the reading's timestamp.
    pub fn value_for(
        &self,
        base: Token,
        quote: Token,
        amount: u128,
        target_decimals: u32,
    ) -> ResolverResult<Valuation> {
        if target_decimals > MAX_DECIMALS {
            return Err(ResolverError::InvalidDecimals(target_decimals));
        }
        let config = self.pair_config(base, quote)?;
        let reading = config
            .source
            .latest_answer()
            .map_err(ResolverError::SourceFailure)?;
        let price = Self::oriented_price(&config, reading.value)?;

        let scaled = U256::from(amount)
            .checked_mul(price)
            .and_then(|v| v.checked_mul(pow10(target_decimals)))
            .ok_or(ResolverError::ValueOverflow)?;
        let value = scaled / pow10(config.source_decimals + config.base_decimals);
        if value > U256::from(u128::MAX) {
            return Err(ResolverError::ValueOverflow);
        }

        Ok(Valuation {
            value: value.as_u128(),
            timestamp: reading.timestamp,
        })
    }

    fn pair_config(&self, base: Token, quote: Token) -> ResolverResult<PairConfig> {
        self.pairs
            .read()
            .get(&PairKey::new(base, quote))
            .cloned()
            .ok_or(ResolverError::PairNotSupported { base, quote })
    }

    /// Orient a raw reading to quote-per-base, inverting when the
    /// source quotes the reciprocal: `10^(2·decimals) / raw`.
    fn oriented_price(config: &PairConfig, raw: U256) -> ResolverResult<U256> {
        if raw.is_zero() {
            return Err(ResolverError::InvalidReading);
        }
        if !config.inverted {
            return Ok(raw);
        }
        let price = pow10(2 * config.source_decimals) / raw;
        if price.is_zero() {
            return Err(ResolverError::InvalidReading);
        }
        Ok(price)
    }

    fn require_admin(&self, caller: Address) -> ResolverResult<()> {
        if caller != self.admin {
            return Err(ResolverError::Unauthorized(caller));
        }
        Ok(())
    }
}

impl Module for PriceResolver {
    fn id(&self) -> ModuleId {
        ModuleId::PriceResolver
    }
    fn name(&self) -> &'static str {
        "price-resolver"
    }
    fn version(&self) -> u32 {
        1
    }
}
