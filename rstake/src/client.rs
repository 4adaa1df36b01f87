use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::login::validate_two_fa_code;
use crate::auth::{LoginOutcome, TokenStore};
use crate::balance::BalanceTracker;
use crate::config::ClientConfig;
use crate::error::{Result, RstakeError, ValidationError};
use crate::events::{ClientEvent, EventBus, Notification};
use crate::invoice::{InvoiceWatcher, PendingInvoiceStore};
use crate::rest::{StakingHttpClient, CONTRACTS_PAGE_SIZE};
use crate::session::ProfileSession;
use crate::storage::{FileStore, KeyValueStore};
use crate::types::*;
use crate::validation::{self, PurchaseDecision};

pub const STAKE_STARTED: &str = "You successfully started staking";
pub const UNSTAKE_STARTED: &str = "Your 7 days unstaking period started";
pub const STAKE_RESUMED: &str = "You successfully resumed staking";
pub const LOGGED_OUT: &str = "You have been logged out";

/// Result of a "stake" action.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    /// The contract was opened. The server does not always echo it back.
    Purchased(Option<Contract>),
    /// There was nothing to stake with, so a deposit invoice was requested.
    DepositRequested(PendingInvoice),
}

/// Everything the staking page shows, fetched in one go.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub active: Page<Contract>,
    pub completed: Page<Contract>,
    pub statistic: Option<ContractStatistic>,
}

/// Main client for the staking service.
///
/// Owns the HTTP client and the client-side state shared between commands
/// and background tasks: the token, the pending deposit invoice, the
/// balance, and the profile.
pub struct StakingClient {
    config: ClientConfig,
    http: Arc<StakingHttpClient>,
    tokens: TokenStore,
    invoices: PendingInvoiceStore,
    events: EventBus,
    balance: BalanceTracker<StakingHttpClient>,
    session: ProfileSession<StakingHttpClient>,
}

impl StakingClient {
    /// Create a client persisting its state to `config.storage_path`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = Arc::new(FileStore::new(config.storage_path.clone()));
        Self::with_store(config, store)
    }

    /// Create a client on top of an arbitrary key-value store.
    pub fn with_store(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;

        let events = EventBus::default();
        let tokens = TokenStore::new(Arc::clone(&store), config.token_key.clone(), events.clone());
        let invoices = PendingInvoiceStore::new(store, events.clone());
        let http = Arc::new(StakingHttpClient::new(
            &config.base_url,
            tokens.clone(),
            config.request_timeout,
        )?);
        let balance = BalanceTracker::new(Arc::clone(&http), tokens.clone(), events.clone());
        let session = ProfileSession::new(Arc::clone(&http), tokens.clone());

        debug!(base_url = %config.base_url, "staking client ready");

        Ok(Self {
            config,
            http,
            tokens,
            invoices,
            events,
            balance,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &StakingHttpClient {
        &self.http
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn balance(&self) -> &BalanceTracker<StakingHttpClient> {
        &self.balance
    }

    pub fn session(&self) -> &ProfileSession<StakingHttpClient> {
        &self.session
    }

    pub fn invoices(&self) -> &PendingInvoiceStore {
        &self.invoices
    }

    /// Fails with [`RstakeError::Unauthenticated`] when no token is stored.
    pub fn require_session(&self) -> Result<()> {
        if self.tokens.is_authenticated() {
            Ok(())
        } else {
            Err(RstakeError::Unauthenticated)
        }
    }

    /// A watcher for the pending deposit invoice, wired to this client.
    pub fn invoice_watcher(&self) -> InvoiceWatcher<StakingHttpClient> {
        InvoiceWatcher::new(
            Arc::clone(&self.http),
            self.invoices.clone(),
            self.balance.clone(),
            self.events.clone(),
            self.config.poll_interval,
            self.config.balance_reload_delay,
        )
    }

    /// Start the balance listener, the profile listener and the invoice
    /// watcher. All of them stop when `cancel` fires.
    pub fn start(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let watcher = self.invoice_watcher();
        let watcher_cancel = cancel.clone();
        vec![
            self.balance.spawn(cancel.clone()),
            self.session.spawn(cancel),
            tokio::spawn(watcher.run(watcher_cancel)),
        ]
    }

    // ---- Authentication ----

    /// Log in. A supplied 2FA code must be six characters long.
    ///
    /// On [`LoginOutcome::EmailNotVerified`] a new verification email is
    /// requested; failures of that request are only logged.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        two_fa: Option<&str>,
    ) -> Result<LoginOutcome> {
        let two_fa_token = match two_fa.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                validate_two_fa_code(code)?;
                Some(code.to_string())
            }
            None => None,
        };

        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            two_fa_token,
        };
        let outcome = LoginOutcome::classify(self.http.login(&req).await?);

        match &outcome {
            LoginOutcome::Authenticated(tokens) => {
                self.tokens.set(&tokens.access);
                info!(%email, "logged in");
            }
            LoginOutcome::SecondFactorRequired => debug!(%email, "second factor required"),
            LoginOutcome::EmailNotVerified(_) => {
                let req = EmailVerificationRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                };
                match self.http.request_email_verification(&req).await {
                    Ok(resp) if resp.success => info!(%email, "verification email sent"),
                    Ok(resp) => warn!(%email, message = %resp.message, "verification email refused"),
                    Err(e) => warn!(%email, error = %e, "verification email request failed"),
                }
            }
            LoginOutcome::Rejected(message) => debug!(%email, %message, "login rejected"),
        }
        Ok(outcome)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<String> {
        self.http.register(req).await?.into_ack()
    }

    pub async fn request_email_verification(&self, email: &str, password: &str) -> Result<String> {
        let req = EmailVerificationRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.http.request_email_verification(&req).await?.into_ack()
    }

    pub async fn reset_password_request(&self, email: &str) -> Result<String> {
        let req = ResetPasswordRequest {
            email: email.to_string(),
        };
        self.http.reset_password_request(&req).await?.into_ack()
    }

    pub async fn reset_password_verify(
        &self,
        email: &str,
        code: &str,
        password: &str,
    ) -> Result<String> {
        let req = ResetPasswordVerify {
            email: email.to_string(),
            code: code.to_string(),
            password: password.to_string(),
        };
        self.http.reset_password_verify(&req).await?.into_ack()
    }

    /// End the session. The local token is cleared even if the server call
    /// fails.
    pub async fn logout(&self) {
        if self.tokens.is_authenticated() {
            match self.http.logout().await {
                Ok(resp) if resp.success => debug!("session closed on server"),
                Ok(resp) => debug!(message = %resp.message, "server logout refused"),
                Err(e) => warn!(error = %e, "server logout failed"),
            }
        }
        self.tokens.clear();
        self.events.notify(Notification::success(LOGGED_OUT));
    }

    // ---- Account ----

    /// Fetch the profile and update the session state.
    pub async fn load_profile(&self) -> Result<Profile> {
        self.require_session()?;
        self.session
            .reload()
            .await?
            .ok_or(RstakeError::Unauthenticated)
    }

    /// Fetch the balance and update the tracker.
    pub async fn load_balance(&self) -> Result<f64> {
        self.require_session()?;
        self.balance.reload().await?;
        self.balance
            .snapshot()
            .real_balance()
            .ok_or(RstakeError::Unauthenticated)
    }

    pub async fn set_lang(&self, lang: &str) -> Result<String> {
        self.require_session()?;
        let message = self.http.set_lang(lang).await?.into_ack()?;
        if let Err(e) = self.session.reload().await {
            warn!(error = %e, "profile reload after language change failed");
        }
        Ok(message)
    }

    pub async fn active_sessions(&self) -> Result<Vec<ActiveSession>> {
        self.require_session()?;
        self.http.active_sessions().await?.into_data()
    }

    pub async fn generate_2fa(&self) -> Result<TwoFactorSecret> {
        self.require_session()?;
        self.http.generate_2fa().await?.into_data()
    }

    pub async fn set_2fa(&self, code: &str) -> Result<String> {
        self.require_session()?;
        let code = code.trim();
        validate_two_fa_code(code)?;
        self.http.set_2fa(code).await?.into_ack()
    }

    // ---- Staking ----

    /// Active and completed contracts plus statistics, requested
    /// concurrently.
    pub async fn dashboard(&self) -> Result<Dashboard> {
        self.require_session()?;
        let page = PageQuery::new(0, CONTRACTS_PAGE_SIZE);
        let (active, completed, statistic) = tokio::try_join!(
            self.http.active_contracts(page),
            self.http.completed_contracts(page),
            self.http.contract_statistic(),
        )?;
        Ok(Dashboard {
            active: active.into_data()?,
            completed: completed.into_data()?,
            statistic: statistic.data,
        })
    }

    /// Stake `amount` on `plan`.
    ///
    /// With no known or a non-positive balance a deposit invoice for the
    /// suggested amount is requested instead. Validation failures are also
    /// published as error notifications.
    pub async fn buy_contract(&self, plan: ContractType, amount: Decimal) -> Result<PurchaseOutcome> {
        self.require_session()?;
        let balance = self.known_balance().await;

        let decision = match validation::decide_purchase(&plan, amount, balance) {
            Ok(decision) => decision,
            Err(e) => return self.reject(e),
        };
        if let PurchaseDecision::DepositFirst { suggested_amount } = decision {
            info!(%plan, %amount, "no balance to stake with, requesting a deposit");
            let invoice = self.request_deposit(suggested_amount).await?;
            return Ok(PurchaseOutcome::DepositRequested(invoice));
        }

        let wire_amount = validation::to_wire(amount)?;
        let resp = self.http.buy_contract(plan.clone(), wire_amount).await?;
        if !resp.success {
            return self.fail(resp.status, resp.message);
        }

        info!(%plan, %amount, "contract purchased");
        self.reload_balance_quietly().await;
        self.events.publish(ClientEvent::BalanceReload);
        self.events.notify(Notification::success(STAKE_STARTED));
        Ok(PurchaseOutcome::Purchased(resp.data))
    }

    pub async fn unstake(&self, puid: &str) -> Result<Option<ContractStateChange>> {
        self.require_session()?;
        let resp = self.http.unstake_contract(puid).await?;
        if !resp.success {
            return self.fail(resp.status, resp.message);
        }
        info!(%puid, "contract unstaked");
        self.reload_balance_quietly().await;
        self.events.notify(Notification::success(UNSTAKE_STARTED));
        Ok(resp.data)
    }

    pub async fn resume(&self, puid: &str) -> Result<Option<ContractStateChange>> {
        self.require_session()?;
        let resp = self.http.resume_unstaked_contract(puid).await?;
        if !resp.success {
            return self.fail(resp.status, resp.message);
        }
        info!(%puid, "contract resumed");
        self.reload_balance_quietly().await;
        self.events.notify(Notification::success(STAKE_RESUMED));
        Ok(resp.data)
    }

    // ---- Deposits ----

    /// Request a deposit invoice and make it the pending one. Amounts below 1
    /// are raised to 1.
    pub async fn request_deposit(&self, amount: Decimal) -> Result<PendingInvoice> {
        self.require_session()?;
        let amount = validation::to_wire(validation::deposit_amount(amount))?;
        let invoice = self.http.request_invoice(amount).await?.into_data()?;

        // Keep the amount asked for; the server may echo it rounded.
        let pending = PendingInvoice {
            amount,
            ..PendingInvoice::from(&invoice)
        };
        info!(puid = %pending.puid, amount, "deposit invoice requested");
        self.invoices.save(&pending);
        Ok(pending)
    }

    pub fn pending_invoice(&self) -> Option<PendingInvoice> {
        self.invoices.read()
    }

    pub fn clear_pending_invoice(&self) {
        self.invoices.clear();
    }

    pub async fn latest_invoice(&self) -> Result<Invoice> {
        self.require_session()?;
        self.http.latest_invoice().await?.into_data()
    }

    // ---- Withdrawals ----

    pub async fn withdraw(
        &self,
        amount: Decimal,
        address: &str,
        memo: Option<&str>,
    ) -> Result<WithdrawReceipt> {
        self.require_session()?;
        let balance = self.known_balance().await;
        if let Err(e) = validation::validate_withdrawal(amount, balance)
            .and_then(|_| validation::validate_withdraw_address(address))
        {
            return self.reject(e);
        }

        let req = WithdrawRequest {
            amount: validation::to_wire(amount)?,
            address: address.trim().to_string(),
            memo: memo.map(str::trim).filter(|m| !m.is_empty()).map(String::from),
        };
        let resp = self.http.request_withdraw(&req).await?;
        if !resp.success {
            return self.fail(resp.status, resp.message);
        }
        let receipt = resp.into_data()?;
        info!(puid = %receipt.puid, %amount, "withdrawal requested");
        self.reload_balance_quietly().await;
        self.events.publish(ClientEvent::BalanceReload);
        Ok(receipt)
    }

    pub async fn cancel_withdraw(&self, puid: &str) -> Result<CancelWithdrawReceipt> {
        self.require_session()?;
        let receipt = self.http.cancel_withdraw(puid).await?.into_data()?;
        info!(%puid, "withdrawal canceled");
        self.reload_balance_quietly().await;
        self.events.publish(ClientEvent::BalanceReload);
        Ok(receipt)
    }

    pub async fn withdraw_history(&self, page: PageQuery) -> Result<Page<WithdrawHistoryItem>> {
        self.require_session()?;
        self.http.withdraw_history(page).await?.into_data()
    }

    pub async fn inner_transactions(&self, page: PageQuery) -> Result<Page<InnerTransaction>> {
        self.require_session()?;
        self.http.inner_transactions(page).await?.into_data()
    }

    // ---- System ----

    pub async fn healthcheck(&self) -> Result<ApiResponse<serde_json::Value>> {
        self.http.healthcheck().await
    }

    // ---- Helpers ----

    /// The exact balance, fetching it once if the tracker has none yet.
    async fn known_balance(&self) -> Option<Decimal> {
        if self.balance.snapshot().real_balance().is_none() {
            self.reload_balance_quietly().await;
        }
        self.balance
            .snapshot()
            .real_balance()
            .and_then(validation::from_wire)
    }

    async fn reload_balance_quietly(&self) {
        if let Err(e) = self.balance.reload().await {
            warn!(error = %e, "balance reload failed");
        }
    }

    fn reject<T>(&self, err: ValidationError) -> Result<T> {
        self.events.notify(Notification::error(err.to_string()));
        Err(err.into())
    }

    fn fail<T>(&self, status: u16, message: String) -> Result<T> {
        self.events.notify(Notification::error(message.clone()));
        Err(RstakeError::Api { status, message })
    }
}
