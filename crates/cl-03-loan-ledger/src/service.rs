//! Loan ledger service.
//!
//! Operations follow one shape: authorization first, then validation
//! against the current loan status and platform settings, then a single
//! commit against the state aggregate. Collateral sufficiency is judged
//! through resolver valuations whose readings must be fresh within the
//! platform's oracle-staleness bound.

use crate::domain::{
    interest_for, required_collateral_value, AcceptedTerms, LedgerError, LedgerResult, Loan,
    LoanStatus, MarketState, RepayOutcome,
};
use crate::ports::EscrowGateway;
use crate::state::{LedgerState, MarketConfig};
use cl_01_consensus::{
    ConsensusDeps, InterestConsensus, LoanTermsConsensus, LoanTermsRequest, LoanTermsResponse,
};
use cl_02_price_resolver::{PriceResolver, Valuation};
use parking_lot::RwLock;
use shared_types::{
    Address, Clock, Module, ModuleId, SettingName, SettingsProvider, Token, U256,
};
use std::sync::Arc;
use tracing::{debug, info};

/// The collateralized loan state machine for one lending market.
pub struct LoanLedger<S, C, E>
where
    S: SettingsProvider,
    C: Clock,
    E: EscrowGateway,
{
    admin: Address,
    config: MarketConfig,
    terms_consensus: LoanTermsConsensus<S, C>,
    interest_consensus: InterestConsensus<S, C>,
    resolver: Arc<PriceResolver>,
    escrow: Arc<E>,
    settings: Arc<S>,
    clock: Arc<C>,
    state: RwLock<LedgerState>,
}

impl<S, C, E> LoanLedger<S, C, E>
where
    S: SettingsProvider,
    C: Clock,
    E: EscrowGateway,
{
    /// Wire a ledger over shared consensus dependencies.
    pub fn new(
        admin: Address,
        config: MarketConfig,
        consensus: ConsensusDeps<S, C>,
        resolver: Arc<PriceResolver>,
        escrow: Arc<E>,
    ) -> Self {
        let settings = Arc::clone(&consensus.settings);
        let clock = Arc::clone(&consensus.clock);
        Self {
            admin,
            config,
            terms_consensus: LoanTermsConsensus::new(consensus.clone()),
            interest_consensus: InterestConsensus::new(consensus),
            resolver,
            escrow,
            settings,
            clock,
            state: RwLock::new(LedgerState::new()),
        }
    }

    // =========================================================================
    // LOAN LIFECYCLE
    // =========================================================================

    /// Originate a loan from a quorum-accepted terms batch. The new loan
    /// starts in `TermsSet`, optionally seeded with collateral.
    pub fn create_loan_with_terms(
        &self,
        caller: Address,
        request: &LoanTermsRequest,
        responses: &[LoanTermsResponse],
        collateral_amount: u128,
    ) -> LedgerResult<u64> {
        self.ensure_not_paused()?;

        // Aggregation enforces borrower identity, rate limiting, and
        // quorum/tolerance; it commits nothing on failure.
        let finalized = self
            .terms_consensus
            .process_request(caller, request, responses)?;

        let now = self.clock.unix_now();
        let terms_expiry = now.saturating_add(self.settings.setting(SettingName::TermsExpiryTime));

        let mut state = self.state.write();
        let loan_id = state.allocate_loan_id();
        let mut loan = Loan::with_terms(
            loan_id,
            request.borrower,
            request.recipient,
            AcceptedTerms::new(finalized, request.duration),
            terms_expiry,
        );
        if collateral_amount > 0 {
            loan.collateral = collateral_amount;
            loan.last_collateral_in = now;
        }
        state.loans.insert(loan_id, loan);

        info!(
            "[LoanLedger] Loan {} terms set for borrower {:?} (rate {} bps, ratio {} bps, max {})",
            loan_id, request.borrower, finalized.interest_rate, finalized.collateral_ratio,
            finalized.max_loan_amount
        );
        Ok(loan_id)
    }

    /// Add collateral to a `TermsSet` or `Active` loan. Anyone may pay
    /// in, but the named borrower must match the loan.
    pub fn deposit_collateral(
        &self,
        caller: Address,
        borrower: Address,
        loan_id: u64,
        amount: u128,
    ) -> LedgerResult<()> {
        self.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("collateral deposit is zero"));
        }

        let now = self.clock.unix_now();
        let mut state = self.state.write();
        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.borrower != borrower {
            return Err(LedgerError::BorrowerLoanMismatch {
                loan_id,
                got: borrower,
            });
        }
        match loan.status {
            LoanStatus::TermsSet | LoanStatus::Active => {}
            status => {
                return Err(LedgerError::InvalidLoanStatus {
                    status,
                    operation: "deposit collateral into",
                })
            }
        }

        loan.collateral = loan
            .collateral
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount("collateral overflows"))?;
        loan.last_collateral_in = now;
        debug!(
            "[LoanLedger] Loan {}: collateral +{} from {:?} (total {})",
            loan_id, amount, caller, loan.collateral
        );
        Ok(())
    }

    /// Draw principal against accepted terms, activating the loan.
    pub fn take_out_loan(&self, caller: Address, loan_id: u64, amount: u128) -> LedgerResult<()> {
        self.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("borrow amount is zero"));
        }

        let now = self.clock.unix_now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.borrower != caller {
            return Err(LedgerError::NotLoanOwner { loan_id, caller });
        }
        if loan.status != LoanStatus::TermsSet {
            return Err(LedgerError::InvalidLoanStatus {
                status: loan.status,
                operation: "take out",
            });
        }
        if now > loan.terms_expiry {
            return Err(LedgerError::TermsExpired {
                expired_at: loan.terms_expiry,
                now,
            });
        }
        if amount > loan.terms.max_loan_amount {
            return Err(LedgerError::AmountExceedsMaximum {
                amount,
                max: loan.terms.max_loan_amount,
            });
        }

        // Debt-ratio gate against the pool totals
        let max_debt = self.settings.setting(SettingName::MaximumDebtRatio);
        let ratio = state.market.supply_to_debt_for(amount).unwrap_or(u64::MAX);
        if ratio > max_debt {
            return Err(LedgerError::DebtRatioExceeded {
                ratio,
                max: max_debt,
            });
        }

        // Collateral must have aged past the safety interval
        let safety = self.settings.setting(SettingName::SafetyInterval);
        if loan.collateral > 0 {
            let age = now.saturating_sub(loan.last_collateral_in);
            if age < safety {
                return Err(LedgerError::CollateralTooRecent {
                    age,
                    required: safety,
                });
            }
        }

        // Fresh valuation must cover the accepted ratio of the principal
        let valuation = self.collateral_valuation(loan.collateral)?;
        self.ensure_fresh(&valuation, now)?;
        let required = required_collateral_value(amount, loan.terms.collateral_ratio);
        if U256::from(valuation.value) < required {
            return Err(LedgerError::MoreCollateralRequired {
                required_value: required,
                collateral_value: U256::from(valuation.value),
            });
        }

        // Borrowed funds leaving the borrower's custody get an escrow
        let escrow_address = if loan.recipient != loan.borrower {
            Some(
                self.escrow
                    .create_escrow(loan_id)
                    .map_err(LedgerError::EscrowFailure)?,
            )
        } else {
            None
        };

        loan.advance(LoanStatus::Active, "take out")?;
        loan.principal_owed = amount;
        loan.interest_owed = interest_for(amount, loan.terms.interest_rate, loan.terms.duration)?;
        loan.start_time = now;
        loan.end_time = now.saturating_add(loan.terms.duration);
        loan.escrow = escrow_address;
        let interest_owed = loan.interest_owed;
        let end_time = loan.end_time;
        state.market.on_borrow(amount);

        info!(
            "[LoanLedger] Loan {} active: principal {}, interest {}, ends {}",
            loan_id, amount, interest_owed, end_time
        );
        Ok(())
    }

    /// Withdraw collateral. An over-ask is clamped to the largest amount
    /// that keeps the loan at its minimum required ratio; the payout is
    /// returned.
    pub fn withdraw_collateral(
        &self,
        caller: Address,
        amount: u128,
        loan_id: u64,
    ) -> LedgerResult<u128> {
        self.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("withdrawal is zero"));
        }

        let now = self.clock.unix_now();
        let mut state = self.state.write();
        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.borrower != caller {
            return Err(LedgerError::NotLoanOwner { loan_id, caller });
        }

        let withdrawable = match loan.status {
            // Nothing is owed yet; everything may leave
            LoanStatus::TermsSet => loan.collateral,
            LoanStatus::Active => {
                let valuation = self.collateral_valuation(loan.collateral)?;
                self.ensure_fresh(&valuation, now)?;
                let required =
                    required_collateral_value(loan.total_owed(), loan.terms.collateral_ratio);
                let value = U256::from(valuation.value);
                if value <= required {
                    0
                } else {
                    // Tokens proportional to the surplus share of value;
                    // floor rounding keeps the remainder at or above the
                    // required ratio
                    (U256::from(loan.collateral) * (value - required) / value).as_u128()
                }
            }
            status => {
                return Err(LedgerError::InvalidLoanStatus {
                    status,
                    operation: "withdraw collateral from",
                })
            }
        };

        let payout = amount.min(withdrawable);
        loan.collateral -= payout;
        debug!(
            "[LoanLedger] Loan {}: collateral -{} to {:?} (requested {}, remaining {})",
            loan_id, payout, caller, amount, loan.collateral
        );
        Ok(payout)
    }

    /// Pay down an active loan. Interest settles before principal; an
    /// overpayment is capped at the total owed. Reaching zero owed
    /// releases all collateral and closes the loan.
    pub fn repay(&self, caller: Address, amount: u128, loan_id: u64) -> LedgerResult<RepayOutcome> {
        self.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("repayment is zero"));
        }

        let mut state = self.state.write();
        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.status != LoanStatus::Active {
            return Err(LedgerError::InvalidLoanStatus {
                status: loan.status,
                operation: "repay",
            });
        }

        let applied = amount.min(loan.total_owed());
        let interest_paid = applied.min(loan.interest_owed);
        let principal_paid = applied - interest_paid;
        loan.interest_owed -= interest_paid;
        loan.principal_owed -= principal_paid;

        let mut outcome = RepayOutcome {
            applied,
            interest_paid,
            principal_paid,
            collateral_released: 0,
            closed: false,
        };
        if loan.total_owed() == 0 {
            outcome.collateral_released = loan.collateral;
            outcome.closed = true;
            loan.collateral = 0;
            loan.advance(LoanStatus::Closed, "close")?;
            info!(
                "[LoanLedger] Loan {} repaid in full by {:?}; {} collateral released",
                loan_id, caller, outcome.collateral_released
            );
        } else {
            debug!(
                "[LoanLedger] Loan {}: repaid {} ({} owed)",
                loan_id,
                applied,
                loan.total_owed()
            );
        }
        state.market.on_repay(principal_paid);
        Ok(outcome)
    }

    /// Whether a loan currently qualifies for liquidation. Always false
    /// while the platform or this market is paused.
    pub fn can_liquidate_loan(&self, loan_id: u64) -> bool {
        let state = self.state.read();
        if state.is_paused(&self.config.lending_token) {
            return false;
        }
        let Some(loan) = state.loans.get(&loan_id) else {
            return false;
        };
        if loan.status != LoanStatus::Active {
            return false;
        }

        let now = self.clock.unix_now();
        if loan.is_expired(now) {
            return true;
        }

        // Undercollateralization needs a usable fresh reading; a stale
        // or failing oracle never makes a loan liquidatable by itself
        if let Ok(valuation) = self.collateral_valuation(loan.collateral) {
            if self.ensure_fresh(&valuation, now).is_ok() {
                let required =
                    required_collateral_value(loan.total_owed(), loan.terms.collateral_ratio);
                if U256::from(valuation.value) < required {
                    return true;
                }
            }
        }

        if loan.escrow.is_some() {
            return self.escrow.is_under_valued(loan_id).unwrap_or(false);
        }
        false
    }

    /// Liquidate a qualifying loan, paying its whole collateral to the
    /// caller. Requires a fresh oracle reading.
    pub fn liquidate_loan(&self, caller: Address, loan_id: u64) -> LedgerResult<u128> {
        let now = self.clock.unix_now();
        let mut state = self.state.write();
        let paused = state.is_paused(&self.config.lending_token);
        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;

        if paused || loan.status != LoanStatus::Active {
            return Err(LedgerError::LiquidationNotRequired(loan_id));
        }

        let valuation = self.collateral_valuation(loan.collateral)?;
        self.ensure_fresh(&valuation, now)?;

        let required = required_collateral_value(loan.total_owed(), loan.terms.collateral_ratio);
        let undercollateralized = U256::from(valuation.value) < required;
        let escrow_under_valued = loan.escrow.is_some()
            && self
                .escrow
                .is_under_valued(loan_id)
                .map_err(LedgerError::EscrowFailure)?;
        if !loan.is_expired(now) && !undercollateralized && !escrow_under_valued {
            return Err(LedgerError::LiquidationNotRequired(loan_id));
        }

        let payout = loan.collateral;
        loan.advance(LoanStatus::Liquidated, "liquidate")?;
        loan.collateral = 0;
        loan.principal_owed = 0;
        loan.interest_owed = 0;
        loan.liquidated = true;

        info!(
            "[LoanLedger] Loan {} liquidated by {:?}; {} collateral paid out",
            loan_id, caller, payout
        );
        Ok(payout)
    }

    // =========================================================================
    // MARKET SURFACE
    // =========================================================================

    /// Supply lending tokens to the market.
    pub fn deposit(&self, caller: Address, amount: u128) -> LedgerResult<()> {
        self.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("deposit is zero"));
        }
        let mut state = self.state.write();
        let balance = state.lender_supply.entry(caller).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount("supply overflows"))?;
        state.market.on_deposit(amount);
        debug!("[LoanLedger] {:?} supplied {}", caller, amount);
        Ok(())
    }

    /// Withdraw a finalized interest accrual, at most once per window.
    pub fn withdraw_interest(&self, caller: Address, end_time: u64) -> LedgerResult<u128> {
        self.ensure_not_paused()?;
        let accrued = self
            .interest_consensus
            .result_for(caller, end_time)
            .ok_or(LedgerError::InterestNotFinalized {
                lender: caller,
                end_time,
            })?;

        let mut state = self.state.write();
        if !state.claimed_interest.insert((caller, end_time)) {
            return Err(LedgerError::InterestAlreadyClaimed {
                lender: caller,
                end_time,
            });
        }
        let payout = accrued.min(U256::from(u128::MAX)).as_u128();
        info!(
            "[LoanLedger] {:?} withdrew {} interest for window ending {}",
            caller, payout, end_time
        );
        Ok(payout)
    }

    /// Value the escrow delegate tracks for an escrowed loan,
    /// lending-token units.
    pub fn escrow_value(&self, loan_id: u64) -> LedgerResult<u128> {
        let state = self.state.read();
        let loan = state
            .loans
            .get(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.escrow.is_none() {
            return Err(LedgerError::LoanHasNoEscrow(loan_id));
        }
        self.escrow
            .calculate_total_value(loan_id)
            .map_err(LedgerError::EscrowFailure)
    }

    /// Pool debt ratio in basis points if `new_loan_amount` were
    /// borrowed now; `None` for an empty pool.
    pub fn supply_to_debt_for(&self, new_loan_amount: u128) -> Option<u64> {
        self.state.read().market.supply_to_debt_for(new_loan_amount)
    }

    /// Snapshot of a loan.
    pub fn loan(&self, loan_id: u64) -> Option<Loan> {
        self.state.read().loans.get(&loan_id).cloned()
    }

    /// Snapshot of the market totals.
    pub fn market_state(&self) -> MarketState {
        self.state.read().market
    }

    /// A lender's supplied balance.
    pub fn lender_balance(&self, lender: &Address) -> u128 {
        self.state
            .read()
            .lender_supply
            .get(lender)
            .copied()
            .unwrap_or(0)
    }

    // =========================================================================
    // ADMIN SURFACE
    // =========================================================================

    pub fn pause_platform(&self, caller: Address) -> LedgerResult<()> {
        self.require_admin(caller)?;
        self.state.write().platform_paused = true;
        info!("[LoanLedger] Platform paused");
        Ok(())
    }

    pub fn unpause_platform(&self, caller: Address) -> LedgerResult<()> {
        self.require_admin(caller)?;
        self.state.write().platform_paused = false;
        info!("[LoanLedger] Platform unpaused");
        Ok(())
    }

    pub fn pause_market(&self, caller: Address, market: Token) -> LedgerResult<()> {
        self.require_admin(caller)?;
        self.state.write().paused_markets.insert(market);
        info!("[LoanLedger] Market {:?} paused", market);
        Ok(())
    }

    pub fn unpause_market(&self, caller: Address, market: Token) -> LedgerResult<()> {
        self.require_admin(caller)?;
        self.state.write().paused_markets.remove(&market);
        info!("[LoanLedger] Market {:?} unpaused", market);
        Ok(())
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn collateral_valuation(&self, collateral: u128) -> LedgerResult<Valuation> {
        Ok(self.resolver.value_for(
            self.config.collateral_token,
            self.config.lending_token,
            collateral,
            self.config.lending_decimals,
        )?)
    }

    fn ensure_fresh(&self, valuation: &Valuation, now: u64) -> LedgerResult<()> {
        let limit = self.settings.setting(SettingName::PriceMaxAge);
        let age = now.saturating_sub(valuation.timestamp);
        if age > limit {
            return Err(LedgerError::StaleOraclePrice { age, limit });
        }
        Ok(())
    }

    fn ensure_not_paused(&self) -> LedgerResult<()> {
        let state = self.state.read();
        if state.platform_paused {
            return Err(LedgerError::PlatformPaused);
        }
        if state.paused_markets.contains(&self.config.lending_token) {
            return Err(LedgerError::MarketPaused(self.config.lending_token));
        }
        Ok(())
    }

    fn require_admin(&self, caller: Address) -> LedgerResult<()> {
        if caller != self.admin {
            return Err(LedgerError::Unauthorized(caller));
        }
        Ok(())
    }
}

impl<S, C, E> Module for LoanLedger<S, C, E>
where
    S: SettingsProvider,
    C: Clock,
    E: EscrowGateway,
{
    fn id(&self) -> ModuleId {
        ModuleId::LoanLedger
    }
    fn name(&self) -> &'static str {
        "loan-ledger"
    }
    fn version(&self) -> u32 {
        1
    }
}
