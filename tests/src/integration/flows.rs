//! # Integration Test Flows
//!
//! End-to-end choreography across the three subsystems: signers price a
//! request, the consensus aggregator finalizes it, and the loan ledger
//! drives the collateral-backed lifecycle against resolver valuations.
//!
//! All flows run with the real platform settings store (timelocked
//! updates included) and real secp256k1 signers; only the price feed and
//! escrow are mocked at the port boundary.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use parking_lot::RwLock;

    use cl_01_consensus::{
        ConsensusDeps, ConsensusError, InterestConsensus, InterestRequest, InterestResponse,
        LoanTermsConsensus, LoanTermsRequest, LoanTermsResponse, SignatureDomain, SignerSet,
        SubmitOutcome,
    };
    use cl_02_price_resolver::{PriceReading, PriceResolver, PriceSource};
    use cl_03_loan_ledger::{
        LedgerError, LoanLedger, LoanStatus, MarketConfig, NullEscrow,
    };
    use shared_crypto::{EcdsaSignature, SignerKeyPair};
    use shared_types::{
        Address, Clock, ManualClock, Module, ModuleRegistry, PlatformSettings, SettingName,
        SettingsProvider, SharedSettings, Token, U256,
    };

    const ADMIN: Address = [0xAD; 20];
    const BORROWER: Address = [0xB0; 20];
    const LENDER: Address = [0x1E; 20];
    const LIQUIDATOR: Address = [0x77; 20];
    const DAI: Token = [0x02; 20];
    const WETH: Token = [0x01; 20];
    const START: u64 = 1_700_000_000;
    const PRINCIPAL: u128 = 100_000;
    const DURATION: u64 = 2_592_000;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// Adjustable price feed: 2-decimal readings.
    struct FeedSource {
        price: AtomicU64,
        timestamp: AtomicU64,
    }

    impl FeedSource {
        fn new(price: u64, timestamp: u64) -> Arc<Self> {
            Arc::new(Self {
                price: AtomicU64::new(price),
                timestamp: AtomicU64::new(timestamp),
            })
        }

        fn set_price(&self, price: u64) {
            self.price.store(price, Ordering::SeqCst);
        }

        fn refresh(&self, timestamp: u64) {
            self.timestamp.store(timestamp, Ordering::SeqCst);
        }
    }

    impl PriceSource for FeedSource {
        fn latest_answer(&self) -> Result<PriceReading, String> {
            Ok(PriceReading {
                value: U256::from(self.price.load(Ordering::SeqCst)),
                timestamp: self.timestamp.load(Ordering::SeqCst),
            })
        }
    }

    struct Protocol {
        clock: Arc<ManualClock>,
        settings: Arc<SharedSettings>,
        keypairs: Vec<SignerKeyPair>,
        deps: ConsensusDeps<SharedSettings, ManualClock>,
        resolver: Arc<PriceResolver>,
        source: Arc<FeedSource>,
        ledger: Arc<LoanLedger<SharedSettings, ManualClock, NullEscrow>>,
    }

    /// Deterministic signer identities shared across deployments.
    fn signer_keypairs() -> Vec<SignerKeyPair> {
        (1u8..=4)
            .map(|i| SignerKeyPair::from_bytes([i; 32]).unwrap())
            .collect()
    }

    fn build_protocol(chain_id: u64) -> Protocol {
        init_tracing();
        let clock = Arc::new(ManualClock::new(START));
        let settings = Arc::new(SharedSettings::new(PlatformSettings::new(ADMIN)));
        let keypairs = signer_keypairs();

        let mut signer_set = SignerSet::new(ADMIN);
        for keypair in &keypairs {
            signer_set.add_signer(ADMIN, keypair.address()).unwrap();
        }

        let deps = ConsensusDeps::new(
            SignatureDomain::new(chain_id, [0xCC; 20]),
            Arc::clone(&settings),
            Arc::clone(&clock),
            Arc::new(RwLock::new(signer_set)),
        );

        // 200.00 lending units per collateral unit
        let source = FeedSource::new(20_000, START);
        let resolver = Arc::new(PriceResolver::new(ADMIN));
        resolver
            .register(ADMIN, WETH, DAI, source.clone(), false, 2, 0)
            .unwrap();

        let ledger = Arc::new(LoanLedger::new(
            ADMIN,
            MarketConfig {
                lending_token: DAI,
                collateral_token: WETH,
                lending_decimals: 0,
            },
            deps.clone(),
            Arc::clone(&resolver),
            Arc::new(NullEscrow),
        ));

        Protocol {
            clock,
            settings,
            keypairs,
            deps,
            resolver,
            source,
            ledger,
        }
    }

    fn terms_request(protocol: &Protocol, nonce: u64) -> LoanTermsRequest {
        LoanTermsRequest {
            borrower: BORROWER,
            recipient: BORROWER,
            amount: PRINCIPAL,
            duration: DURATION,
            request_nonce: nonce,
            request_time: protocol.clock.unix_now(),
        }
    }

    fn sign_terms_response(
        protocol: &Protocol,
        signer_idx: usize,
        request: &LoanTermsRequest,
        interest_rate: u64,
        base_nonce: u64,
    ) -> LoanTermsResponse {
        let keypair = &protocol.keypairs[signer_idx];
        let mut response = LoanTermsResponse {
            signer: keypair.address(),
            nonce: base_nonce + signer_idx as u64,
            response_time: protocol.clock.unix_now(),
            interest_rate,
            collateral_ratio: 15_000,
            max_loan_amount: 500_000,
            signature: EcdsaSignature {
                r: [0u8; 32],
                s: [0u8; 32],
                v: 27,
            },
        };
        let request_hash = protocol.deps.domain.hash_loan_terms_request(request);
        let digest = protocol
            .deps
            .domain
            .hash_loan_terms_response(&request_hash, &response);
        response.signature = keypair.sign_prehash(&digest).unwrap();
        response
    }

    fn quorum_responses(
        protocol: &Protocol,
        request: &LoanTermsRequest,
        rates: &[u64],
        base_nonce: u64,
    ) -> Vec<LoanTermsResponse> {
        rates
            .iter()
            .enumerate()
            .map(|(i, &rate)| sign_terms_response(protocol, i, request, rate, base_nonce))
            .collect()
    }

    /// Fund the pool, originate with collateral, wait out the safety
    /// interval, and activate the loan.
    fn activate_loan(protocol: &Protocol, collateral: u128) -> u64 {
        protocol.ledger.deposit(LENDER, 10_000_000).unwrap();

        let request = terms_request(protocol, 1);
        let responses = quorum_responses(protocol, &request, &[1_200, 1_200, 1_200], 0);
        let loan_id = protocol
            .ledger
            .create_loan_with_terms(BORROWER, &request, &responses, collateral)
            .unwrap();

        protocol.clock.advance(300);
        protocol.source.refresh(protocol.clock.unix_now());
        protocol
            .ledger
            .take_out_loan(BORROWER, loan_id, PRINCIPAL)
            .unwrap();
        loan_id
    }

    // =========================================================================
    // ORIGINATION → ACTIVATION → REPAYMENT
    // =========================================================================

    #[test]
    fn test_origination_to_repayment_flow() {
        let protocol = build_protocol(1);
        let loan_id = activate_loan(&protocol, 800);

        let loan = protocol.ledger.loan(loan_id).unwrap();
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.principal_owed, PRINCIPAL);
        // 12% yearly over 30 days, floor-rounded
        assert_eq!(loan.interest_owed, 986);

        // Partial payment keeps the loan active
        let outcome = protocol.ledger.repay(BORROWER, 40_000, loan_id).unwrap();
        assert_eq!(outcome.interest_paid, 986);
        assert!(!outcome.closed);

        // Clearing the debt releases collateral and closes the loan
        let owed = protocol.ledger.loan(loan_id).unwrap().total_owed();
        let outcome = protocol.ledger.repay(BORROWER, owed, loan_id).unwrap();
        assert!(outcome.closed);
        assert_eq!(outcome.collateral_released, 800);
        assert_eq!(
            protocol.ledger.loan(loan_id).unwrap().status,
            LoanStatus::Closed
        );

        // Principal flowed through the market totals
        let market = protocol.ledger.market_state();
        assert_eq!(market.total_borrowed, PRINCIPAL);
        assert_eq!(market.total_repaid, PRINCIPAL);
        assert_eq!(market.total_supplied, 10_000_000);

        // A terminated loan accepts no further mutation
        let err = protocol.ledger.repay(BORROWER, 1, loan_id).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLoanStatus { .. }));
    }

    #[test]
    fn test_expired_loan_liquidation_pays_caller() {
        let protocol = build_protocol(1);
        let loan_id = activate_loan(&protocol, 800);

        assert!(!protocol.ledger.can_liquidate_loan(loan_id));
        protocol.clock.advance(DURATION + 1);
        protocol.source.refresh(protocol.clock.unix_now());

        assert!(protocol.ledger.can_liquidate_loan(loan_id));
        let payout = protocol.ledger.liquidate_loan(LIQUIDATOR, loan_id).unwrap();
        assert_eq!(payout, 800);

        let loan = protocol.ledger.loan(loan_id).unwrap();
        assert_eq!(loan.status, LoanStatus::Liquidated);
        assert_eq!(loan.total_owed(), 0);

        let err = protocol
            .ledger
            .withdraw_collateral(BORROWER, 1, loan_id)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLoanStatus { .. }));
    }

    #[test]
    fn test_price_collapse_triggers_liquidation() {
        let protocol = build_protocol(1);
        let loan_id = activate_loan(&protocol, 800);

        // 150.00 per unit leaves 120_000 of value against a 151_479
        // requirement
        protocol.source.set_price(15_000);
        assert!(protocol.ledger.can_liquidate_loan(loan_id));
        let payout = protocol.ledger.liquidate_loan(LIQUIDATOR, loan_id).unwrap();
        assert_eq!(payout, 800);
    }

    #[test]
    fn test_withdraw_clamps_to_safe_surplus() {
        let protocol = build_protocol(1);
        let loan_id = activate_loan(&protocol, 1_000);

        // Worth 200_000 against a 151_479 requirement; the 500-token ask
        // clamps to the 242-token surplus
        let payout = protocol
            .ledger
            .withdraw_collateral(BORROWER, 500, loan_id)
            .unwrap();
        assert_eq!(payout, 242);
        assert_eq!(protocol.ledger.loan(loan_id).unwrap().collateral, 758);
    }

    // =========================================================================
    // QUORUM BEHAVIOR UNDER THE REAL SETTINGS STORE
    // =========================================================================

    #[test]
    fn test_settings_timelock_raises_quorum_and_tolerance_bands_apply() {
        let protocol = build_protocol(1);
        let terms = LoanTermsConsensus::new(protocol.deps.clone());

        // Raise the quorum from 3 to 4 through the timelock
        let wait = protocol.settings.setting(SettingName::MinimumTimelock);
        protocol
            .settings
            .write()
            .timelock_setting(ADMIN, SettingName::RequiredSubmissions, 4, START)
            .unwrap();
        protocol.clock.advance(wait);
        protocol
            .settings
            .write()
            .update_setting(ADMIN, SettingName::RequiredSubmissions, 4, START + wait)
            .unwrap();

        // Three responses no longer meet quorum
        let request = terms_request(&protocol, 1);
        let responses = quorum_responses(&protocol, &request, &[1_200, 1_200, 1_200], 0);
        let err = terms
            .process_request(BORROWER, &request, &responses)
            .unwrap_err();
        assert_eq!(
            err,
            ConsensusError::InsufficientResponses {
                got: 3,
                required: 4
            }
        );

        // An outlier batch fails the band check around the average
        let varied = quorum_responses(
            &protocol,
            &request,
            &[35_976, 34_732, 34_732, 34_000],
            100,
        );
        let err = terms.process_request(BORROWER, &request, &varied).unwrap_err();
        assert!(matches!(err, ConsensusError::ResponsesTooVaried { .. }));

        // An agreeing batch finalizes at the floor average
        let agreeing = quorum_responses(
            &protocol,
            &request,
            &[35_976, 34_732, 34_000, 34_736],
            200,
        );
        let finalized = terms.process_request(BORROWER, &request, &agreeing).unwrap();
        assert_eq!(finalized.interest_rate, 34_861);
    }

    #[test]
    fn test_signed_responses_do_not_replay_across_deployments() {
        let mainnet = build_protocol(1);
        let fork = build_protocol(1337);
        let terms_on_fork = LoanTermsConsensus::new(fork.deps.clone());

        // Same signers, same payload, signed under the mainnet domain
        let request = terms_request(&mainnet, 1);
        let responses = quorum_responses(&mainnet, &request, &[1_200, 1_200, 1_200], 0);

        let err = terms_on_fork
            .process_request(BORROWER, &request, &responses)
            .unwrap_err();
        assert!(matches!(err, ConsensusError::SignatureNotValid(_)));
    }

    #[test]
    fn test_consumed_nonces_block_batch_replay() {
        let protocol = build_protocol(1);
        let terms = LoanTermsConsensus::new(protocol.deps.clone());

        let request = terms_request(&protocol, 1);
        let responses = quorum_responses(&protocol, &request, &[1_200, 1_200, 1_200], 0);
        terms.process_request(BORROWER, &request, &responses).unwrap();

        // Past the rate limit, the identical batch is still dead: its
        // nonces were consumed by the accepted round
        protocol
            .clock
            .advance(protocol.settings.setting(SettingName::RequestTermsRateLimit));
        let err = terms
            .process_request(BORROWER, &request, &responses)
            .unwrap_err();
        assert!(matches!(err, ConsensusError::NonceTaken { .. }));
    }

    // =========================================================================
    // INTEREST ACCRUAL FLOW
    // =========================================================================

    #[test]
    fn test_interest_round_to_withdrawal() {
        let protocol = build_protocol(1);
        let interest = InterestConsensus::new(protocol.deps.clone());

        let now = protocol.clock.unix_now();
        let request = InterestRequest {
            lender: LENDER,
            start_time: now - 86_400,
            end_time: now - 1,
            request_nonce: 1,
            request_time: now,
        };
        interest.request_interest_update(LENDER, request).unwrap();

        let request_hash = protocol.deps.domain.hash_interest_request(&request);
        let values = [4_980u64, 5_000, 5_020];
        let mut last = SubmitOutcome::Accepted { submissions: 0 };
        for (i, &value) in values.iter().enumerate() {
            let keypair = &protocol.keypairs[i];
            let mut response = InterestResponse {
                signer: keypair.address(),
                nonce: 500 + i as u64,
                response_time: now,
                interest: U256::from(value),
                signature: EcdsaSignature {
                    r: [0u8; 32],
                    s: [0u8; 32],
                    v: 27,
                },
            };
            let digest = protocol
                .deps
                .domain
                .hash_interest_response(&request_hash, &response);
            response.signature = keypair.sign_prehash(&digest).unwrap();
            last = interest.submit(&request, response).unwrap();
        }
        assert_eq!(
            last,
            SubmitOutcome::Finalized {
                average: U256::from(5_000u64)
            }
        );

        let payout = protocol
            .ledger
            .withdraw_interest(LENDER, request.end_time)
            .unwrap();
        assert_eq!(payout, 5_000);

        let err = protocol
            .ledger
            .withdraw_interest(LENDER, request.end_time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InterestAlreadyClaimed { .. }));
    }

    // =========================================================================
    // MODULE REGISTRY
    // =========================================================================

    #[test]
    fn test_module_registry_resolves_and_upgrades() {
        let protocol = build_protocol(1);
        let mut registry = ModuleRegistry::new(ADMIN);

        let resolver_module: shared_types::registry::DynModule = protocol.resolver.clone();
        let ledger_module: shared_types::registry::DynModule = protocol.ledger.clone();
        registry.register(ADMIN, resolver_module).unwrap();
        registry.register(ADMIN, ledger_module).unwrap();

        let resolved = registry
            .resolve(shared_types::ModuleId::PriceResolver)
            .unwrap();
        assert_eq!(resolved.name(), "price-resolver");
        assert_eq!(protocol.ledger.version(), 1);

        // The mutation path stays gated separately from resolution
        let replacement: shared_types::registry::DynModule = Arc::new(PriceResolver::new(ADMIN));
        let err = registry
            .upgrade([0x31; 20], Arc::clone(&replacement))
            .unwrap_err();
        assert_eq!(
            err,
            shared_types::RegistryError::Unauthorized([0x31; 20])
        );
        registry.upgrade(ADMIN, replacement).unwrap();
    }
}
