//! Consensus services.
//!
//! The generic validation pipeline is shared by both specializations:
//! [`InterestConsensus`] accepts responses one at a time against an
//! explicitly opened round, [`LoanTermsConsensus`] validates a collected
//! batch in one atomic call. Either way a submission passes the same
//! gauntlet: signer membership, round liveness, duplicate and nonce
//! checks, freshness, and signer recovery over the domain-separated
//! digest.

use crate::domain::{
    ConsensusError, ConsensusResult, FinalizedTerms, InterestRequest, InterestResponse,
    LoanTermsRequest, LoanTermsResponse, NumericSubmissions, SignatureDomain, SignerSet,
};
use crate::state::{ConsensusState, InterestRound};
use parking_lot::RwLock;
use shared_crypto::{batch_verify, recover_address, VerificationRequest};
use shared_types::entities::is_zero_address;
use shared_types::{Address, Clock, SettingName, SettingsProvider, U256};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared wiring for the consensus services.
pub struct ConsensusDeps<S, C>
where
    S: SettingsProvider,
    C: Clock,
{
    pub domain: SignatureDomain,
    pub settings: Arc<S>,
    pub clock: Arc<C>,
    pub signers: Arc<RwLock<SignerSet>>,
    pub state: Arc<ConsensusState>,
}

impl<S, C> ConsensusDeps<S, C>
where
    S: SettingsProvider,
    C: Clock,
{
    pub fn new(
        domain: SignatureDomain,
        settings: Arc<S>,
        clock: Arc<C>,
        signers: Arc<RwLock<SignerSet>>,
    ) -> Self {
        Self {
            domain,
            settings,
            clock,
            signers,
            state: Arc::new(ConsensusState::new()),
        }
    }
}

impl<S, C> Clone for ConsensusDeps<S, C>
where
    S: SettingsProvider,
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            domain: self.domain,
            settings: Arc::clone(&self.settings),
            clock: Arc::clone(&self.clock),
            signers: Arc::clone(&self.signers),
            state: Arc::clone(&self.state),
        }
    }
}

/// Outcome of accepting one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted; the round is still below quorum.
    Accepted { submissions: u32 },
    /// Accepted and the round finalized with this average.
    Finalized { average: U256 },
}

/// Interest-accrual consensus: explicit rounds, incremental submission.
pub struct InterestConsensus<S, C>
where
    S: SettingsProvider,
    C: Clock,
{
    deps: ConsensusDeps<S, C>,
}

impl<S, C> InterestConsensus<S, C>
where
    S: SettingsProvider,
    C: Clock,
{
    pub fn new(deps: ConsensusDeps<S, C>) -> Self {
        Self { deps }
    }

    /// Open an aggregation round for a lender's accrual window.
    pub fn request_interest_update(
        &self,
        caller: Address,
        request: InterestRequest,
    ) -> ConsensusResult<()> {
        if caller != request.lender {
            return Err(ConsensusError::Unauthorized(caller));
        }
        if is_zero_address(&request.lender) {
            return Err(ConsensusError::InvalidRequest("lender is the zero address"));
        }
        if request.start_time >= request.end_time {
            return Err(ConsensusError::InvalidRequest(
                "window start must precede window end",
            ));
        }
        let now = self.deps.clock.unix_now();
        if request.end_time > now {
            return Err(ConsensusError::InvalidRequest("window end is in the future"));
        }

        let key = (request.lender, request.end_time);
        if self.deps.state.interest_result(&request.lender, request.end_time).is_some() {
            return Err(ConsensusError::AlreadyFinalized);
        }
        let mut rounds = self.deps.state.interest_rounds.write();
        if rounds.contains_key(&key) {
            return Err(ConsensusError::AlreadyRequested);
        }

        let request_hash = self.deps.domain.hash_interest_request(&request);
        rounds.insert(
            key,
            InterestRound {
                request,
                request_hash,
                submissions: NumericSubmissions::new(),
                submitted: HashSet::new(),
            },
        );
        debug!(
            "[InterestConsensus] Opened round for lender {:?} ending {}",
            request.lender, request.end_time
        );
        Ok(())
    }

    /// Submit one signer response for an open round.
    pub fn submit(
        &self,
        request: &InterestRequest,
        response: InterestResponse,
    ) -> ConsensusResult<SubmitOutcome> {
        let now = self.deps.clock.unix_now();

        if !self.deps.signers.read().contains(&response.signer) {
            return Err(ConsensusError::UnknownSigner(response.signer));
        }

        let key = (request.lender, request.end_time);
        if self.deps.state.interest_result(&request.lender, request.end_time).is_some() {
            return Err(ConsensusError::AlreadyFinalized);
        }
        let mut rounds = self.deps.state.interest_rounds.write();
        let round = rounds.get_mut(&key).ok_or(ConsensusError::NotRequested)?;

        let request_hash = self.deps.domain.hash_interest_request(request);
        if round.request_hash != request_hash {
            return Err(ConsensusError::NotRequested);
        }
        if round.submitted.contains(&response.signer) {
            return Err(ConsensusError::AlreadySubmitted(response.signer));
        }
        if self.deps.state.nonce_taken(&response.signer, response.nonce) {
            return Err(ConsensusError::NonceTaken {
                signer: response.signer,
                nonce: response.nonce,
            });
        }

        let expiry = self.deps.settings.setting(SettingName::ResponseExpiryLength);
        let age = now.saturating_sub(response.response_time);
        if age > expiry {
            return Err(ConsensusError::ResponseExpired { age, limit: expiry });
        }

        let digest = self.deps.domain.hash_interest_response(&request_hash, &response);
        match recover_address(&digest, &response.signature) {
            Ok(recovered) if recovered == response.signer => {}
            _ => return Err(ConsensusError::SignatureNotValid(response.signer)),
        }

        // Trial the accumulator before committing so a failed tolerance
        // check retains the already-accepted submissions untouched.
        let mut trial = round.submissions.clone();
        trial.record(response.interest);

        let required = self.deps.settings.setting(SettingName::RequiredSubmissions) as u32;
        if trial.count >= required {
            let tolerance = self.deps.settings.setting(SettingName::MaximumTolerance);
            if !trial.within_tolerance(tolerance) {
                return Err(ConsensusError::ResponsesTooVaried {
                    average: trial.average(),
                    deviation: trial.max_deviation(),
                    allowed: trial.allowed_deviation(tolerance),
                });
            }
            trial.finalize();
        }

        let count = trial.count;
        let average = trial.average();
        self.deps.state.consume_nonce(response.signer, response.nonce);

        if trial.finalized {
            // The round is spent: drop it, keep its result and the
            // consumed nonces
            rounds.remove(&key);
            self.deps
                .state
                .interest_results
                .write()
                .insert(key, average);
            info!(
                "[InterestConsensus] Finalized round for lender {:?} ending {}: average {}",
                request.lender, request.end_time, average
            );
            Ok(SubmitOutcome::Finalized { average })
        } else {
            round.submissions = trial;
            round.submitted.insert(response.signer);
            debug!(
                "[InterestConsensus] Accepted submission {}/{} from {:?}",
                count, required, response.signer
            );
            Ok(SubmitOutcome::Accepted { submissions: count })
        }
    }

    /// Finalized average for a lender's window, if any.
    pub fn result_for(&self, lender: Address, end_time: u64) -> Option<U256> {
        self.deps.state.interest_result(&lender, end_time)
    }
}

/// Loan-terms consensus: one atomic batch per origination.
pub struct LoanTermsConsensus<S, C>
where
    S: SettingsProvider,
    C: Clock,
{
    deps: ConsensusDeps<S, C>,
}

impl<S, C> LoanTermsConsensus<S, C>
where
    S: SettingsProvider,
    C: Clock,
{
    pub fn new(deps: ConsensusDeps<S, C>) -> Self {
        Self { deps }
    }

    /// Validate a collected response batch and finalize accepted terms.
    ///
    /// The call is atomic: any failing response fails the whole batch and
    /// nothing (nonces included) is consumed.
    pub fn process_request(
        &self,
        caller: Address,
        request: &LoanTermsRequest,
        responses: &[LoanTermsResponse],
    ) -> ConsensusResult<FinalizedTerms> {
        if caller != request.borrower {
            return Err(ConsensusError::Unauthorized(caller));
        }
        if is_zero_address(&request.borrower) {
            return Err(ConsensusError::InvalidRequest("borrower is the zero address"));
        }
        if is_zero_address(&request.recipient) {
            return Err(ConsensusError::InvalidRequest(
                "recipient is the zero address",
            ));
        }
        if request.amount == 0 {
            return Err(ConsensusError::InvalidRequest("requested amount is zero"));
        }

        let now = self.deps.clock.unix_now();
        let limit = self
            .deps
            .settings
            .setting(SettingName::RequestTermsRateLimit);
        if let Some(last) = self
            .deps
            .state
            .last_terms_request
            .read()
            .get(&request.borrower)
            .copied()
        {
            let elapsed = now.saturating_sub(last);
            if elapsed < limit {
                return Err(ConsensusError::RequestRateLimited { elapsed, limit });
            }
        }

        let max_duration = self
            .deps
            .settings
            .setting(SettingName::MaximumLoanDuration);
        if request.duration > max_duration {
            return Err(ConsensusError::DurationExceedsMaximum {
                duration: request.duration,
                max: max_duration,
            });
        }

        // Quorum size gates everything else
        let required = self.deps.settings.setting(SettingName::RequiredSubmissions) as usize;
        if responses.len() < required {
            return Err(ConsensusError::InsufficientResponses {
                got: responses.len(),
                required,
            });
        }

        let request_hash = self.deps.domain.hash_loan_terms_request(request);
        let expiry = self.deps.settings.setting(SettingName::ResponseExpiryLength);

        let mut batch = Vec::with_capacity(responses.len());
        {
            let signers = self.deps.signers.read();
            let mut seen = HashSet::new();
            for response in responses {
                if !signers.contains(&response.signer) {
                    return Err(ConsensusError::UnknownSigner(response.signer));
                }
                if !seen.insert(response.signer) {
                    return Err(ConsensusError::AlreadySubmitted(response.signer));
                }
                if self.deps.state.nonce_taken(&response.signer, response.nonce) {
                    return Err(ConsensusError::NonceTaken {
                        signer: response.signer,
                        nonce: response.nonce,
                    });
                }
                let age = now.saturating_sub(response.response_time);
                if age > expiry {
                    return Err(ConsensusError::ResponseExpired { age, limit: expiry });
                }
                batch.push(VerificationRequest {
                    message_hash: self
                        .deps
                        .domain
                        .hash_loan_terms_response(&request_hash, response),
                    signature: response.signature,
                    expected_signer: Some(response.signer),
                });
            }
        }

        let verification = batch_verify(&batch);
        if let Some(bad) = verification.results.iter().position(|r| r.is_err()) {
            return Err(ConsensusError::SignatureNotValid(responses[bad].signer));
        }

        let mut rates = NumericSubmissions::new();
        let mut ratios = NumericSubmissions::new();
        let mut amounts = NumericSubmissions::new();
        for response in responses {
            rates.record(U256::from(response.interest_rate));
            ratios.record(U256::from(response.collateral_ratio));
            amounts.record(U256::from(response.max_loan_amount));
        }

        let tolerance = self.deps.settings.setting(SettingName::MaximumTolerance);
        for accumulator in [&rates, &ratios, &amounts] {
            if !accumulator.within_tolerance(tolerance) {
                return Err(ConsensusError::ResponsesTooVaried {
                    average: accumulator.average(),
                    deviation: accumulator.max_deviation(),
                    allowed: accumulator.allowed_deviation(tolerance),
                });
            }
        }

        // Commit: the batch is valid as a whole
        {
            let mut nonces = self.deps.state.nonces.write();
            for response in responses {
                nonces.insert((response.signer, response.nonce));
            }
        }
        self.deps
            .state
            .last_terms_request
            .write()
            .insert(request.borrower, now);

        // Averages of u64/u128 inputs fit their source widths
        let terms = FinalizedTerms {
            interest_rate: rates.average().as_u64(),
            collateral_ratio: ratios.average().as_u64(),
            max_loan_amount: amounts.average().as_u128(),
        };
        info!(
            "[LoanTermsConsensus] Finalized terms for borrower {:?}: rate {} bps, ratio {} bps, max {}",
            request.borrower, terms.interest_rate, terms.collateral_ratio, terms.max_loan_amount
        );
        Ok(terms)
    }

    /// Seconds since the borrower's last accepted request, if any.
    pub fn last_request_time(&self, borrower: &Address) -> Option<u64> {
        self.deps.state.last_terms_request.read().get(borrower).copied()
    }
}
