use chrono::Utc;
use rstake::contract::{
    can_resume, can_unstake, next_reward_countdown, potential_profit, resume_countdown,
};
use rstake::types::RegisterRequest;
use rstake::{
    ClientEvent, Contract, ContractType, DepositWait, EventSubscription, LoginOutcome, PageQuery,
    PurchaseOutcome, StakingClient,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::{
    Command, DepositCommand, PageArgs, ResetPasswordCommand, StakeCommand, TwoFaCommand,
    WithdrawCommand,
};
use crate::error::CliError;
use crate::output::{amount, or_dash, Output};

/// Run one subcommand, then print any notifications it produced.
pub async fn run(
    client: &StakingClient,
    command: Command,
    out: Output,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let mut notes = client.events().subscribe();

    match command {
        Command::Login(args) => {
            login(client, &args.email, &args.password, args.code.as_deref(), out).await?
        }
        Command::Register(args) => {
            let req = RegisterRequest {
                name: args.name,
                surname: args.surname,
                email: args.email,
                password: args.password,
            };
            let message = client.register(&req).await?;
            out.line(non_empty(message, "Account created; check your email to verify it"))?;
        }
        Command::Logout => client.logout().await,
        Command::VerifyEmail(args) => {
            let message = client
                .request_email_verification(&args.email, &args.password)
                .await?;
            out.line(non_empty(message, "Verification email sent"))?;
        }
        Command::ResetPassword(cmd) => reset_password(client, cmd, out).await?,
        Command::Profile => profile(client, out).await?,
        Command::Sessions => sessions(client, out).await?,
        Command::Lang { lang } => {
            let message = client.set_lang(&lang).await?;
            out.line(non_empty(message, "Language updated"))?;
        }
        Command::Balance => balance(client, out).await?,
        Command::TwoFa(cmd) => two_fa(client, cmd, out).await?,
        Command::Stake(cmd) => stake(client, cmd, out).await?,
        Command::Deposit(cmd) => deposit(client, cmd, out, &mut notes, cancel).await?,
        Command::Withdraw(cmd) => withdraw(client, cmd, out).await?,
        Command::History(page) => history(client, page, out).await?,
        Command::Health => {
            let resp = client.healthcheck().await?;
            if out.is_json() {
                out.json(&resp)?;
            } else {
                out.line(if resp.success { "ok" } else { resp.message.as_str() })?;
            }
        }
    }

    out.drain(&mut notes)
}

async fn login(
    client: &StakingClient,
    email: &str,
    password: &str,
    code: Option<&str>,
    out: Output,
) -> Result<(), CliError> {
    match client.login(email, password, code).await? {
        LoginOutcome::Authenticated(_) => out.line("Logged in"),
        LoginOutcome::SecondFactorRequired => Err(CliError::Login(
            "two-factor code required; run again with --code <CODE>".into(),
        )),
        LoginOutcome::EmailNotVerified(message) => Err(CliError::Login(format!(
            "{message}; a new verification email has been sent"
        ))),
        LoginOutcome::Rejected(message) => Err(CliError::Login(message)),
    }
}

async fn reset_password(
    client: &StakingClient,
    cmd: ResetPasswordCommand,
    out: Output,
) -> Result<(), CliError> {
    let message = match cmd {
        ResetPasswordCommand::Request { email } => {
            let message = client.reset_password_request(&email).await?;
            non_empty(message, "Reset code sent")
        }
        ResetPasswordCommand::Verify {
            email,
            code,
            password,
        } => {
            let message = client.reset_password_verify(&email, &code, &password).await?;
            non_empty(message, "Password changed")
        }
    };
    out.line(message)
}

async fn profile(client: &StakingClient, out: Output) -> Result<(), CliError> {
    let p = client.load_profile().await?;
    if out.is_json() {
        return out.json(&p);
    }
    out.fields(&[
        ("puid", p.puid),
        ("name", format!("{} {}", p.name, p.surname).trim().to_string()),
        ("email", p.email),
        ("lang", p.lang),
        ("verified", p.is_verified.to_string()),
        ("telegram", or_dash(p.telegram_id)),
    ])
}

async fn sessions(client: &StakingClient, out: Output) -> Result<(), CliError> {
    let sessions = client.active_sessions().await?;
    if out.is_json() {
        return out.json(&sessions);
    }
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.location().to_string(),
                s.ip.clone(),
                or_dash(s.user_agent.as_deref()),
                s.expires_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    out.table(&["id", "location", "ip", "user_agent", "expires"], &rows)
}

async fn balance(client: &StakingClient, out: Output) -> Result<(), CliError> {
    let raw = client.load_balance().await?;
    let state = client.balance().snapshot();
    if out.is_json() {
        return out.json(&serde_json::json!({ "balance": raw, "display": state.display() }));
    }
    out.line(format!("{} XRP", state.display()))
}

async fn two_fa(client: &StakingClient, cmd: TwoFaCommand, out: Output) -> Result<(), CliError> {
    match cmd {
        TwoFaCommand::Generate => {
            let secret = client.generate_2fa().await?;
            if out.is_json() {
                return out.json(&secret);
            }
            out.fields(&[
                ("secret", secret.secret),
                ("otpauth_url", or_dash(secret.otpauth_url)),
            ])
        }
        TwoFaCommand::Set { code } => {
            let message = client.set_2fa(&code).await?;
            out.line(non_empty(message, "Two-factor authentication enabled"))
        }
    }
}

async fn stake(client: &StakingClient, cmd: StakeCommand, out: Output) -> Result<(), CliError> {
    match cmd {
        StakeCommand::Buy { plan, amount: qty } => {
            let plan = ContractType::from(plan);
            match client.buy_contract(plan.clone(), qty).await? {
                PurchaseOutcome::Purchased(contract) => {
                    if out.is_json() {
                        return out.json(&contract);
                    }
                    out.line(format!(
                        "{} XRP on {}; expected profit {} XRP per month",
                        qty,
                        plan.label(),
                        potential_profit(&plan, qty).round_dp(2)
                    ))
                }
                PurchaseOutcome::DepositRequested(invoice) => {
                    if out.is_json() {
                        return out.json(&serde_json::json!({ "depositRequested": invoice }));
                    }
                    out.line("No balance to stake with, a deposit invoice was created instead")?;
                    print_invoice(out, &invoice.puid, invoice.amount, &invoice.address, &invoice.memo)
                }
            }
        }
        StakeCommand::Unstake { puid } => {
            client.unstake(&puid).await?;
            Ok(())
        }
        StakeCommand::Resume { puid } => {
            client.resume(&puid).await?;
            Ok(())
        }
        StakeCommand::List => {
            let dashboard = client.dashboard().await?;
            if out.is_json() {
                return out.json(&dashboard);
            }
            let now = Utc::now();
            let rows: Vec<Vec<String>> = dashboard
                .active
                .rows
                .iter()
                .chain(dashboard.completed.rows.iter())
                .map(|c| contract_row(c, now))
                .collect();
            out.table(
                &["puid", "plan", "staked", "reward", "next_reward", "state", "actions"],
                &rows,
            )?;
            if let Some(stat) = dashboard.statistic {
                out.line(format!(
                    "total staked {} XRP in {} contracts, rewards received {} XRP",
                    amount(stat.total_amount),
                    stat.total_contracts,
                    amount(stat.total_reward_received)
                ))?;
            }
            Ok(())
        }
    }
}

fn contract_row(c: &Contract, now: chrono::DateTime<Utc>) -> Vec<String> {
    let cap = if c.contract_type == ContractType::Unlimited {
        "∞".to_string()
    } else {
        amount(c.max_contract_reward)
    };
    let state = if c.is_completed {
        "completed".to_string()
    } else if c.is_unstaked {
        format!("unstaked, resume within {}", resume_countdown(c, now))
    } else {
        format!("active {:.0}%", c.progress_percent())
    };
    let mut actions = Vec::new();
    if can_unstake(c) {
        actions.push("unstake");
    }
    if can_resume(c, now) {
        actions.push("resume");
    }
    vec![
        or_dash(c.puid.as_deref()),
        c.contract_type.to_string(),
        amount(c.staked_amount),
        format!("{} / {}", amount(c.total_reward_received), cap),
        if c.is_completed {
            "-".into()
        } else {
            format!(
                "{} in {}",
                amount(c.next_reward_amount),
                next_reward_countdown(c, now)
            )
        },
        state,
        if actions.is_empty() {
            "-".into()
        } else {
            actions.join(",")
        },
    ]
}

async fn deposit(
    client: &StakingClient,
    cmd: DepositCommand,
    out: Output,
    notes: &mut EventSubscription,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    match cmd {
        DepositCommand::Request { amount: qty } => {
            let invoice = client.request_deposit(qty).await?;
            if out.is_json() {
                return out.json(&invoice);
            }
            print_invoice(out, &invoice.puid, invoice.amount, &invoice.address, &invoice.memo)
        }
        DepositCommand::Watch => watch_deposit(client, out, notes, cancel).await,
        DepositCommand::Status => {
            client.require_session()?;
            let pending = client.pending_invoice();
            let latest = client.latest_invoice().await.ok();
            if out.is_json() {
                return out.json(&serde_json::json!({ "pending": pending, "latest": latest }));
            }
            match &pending {
                Some(inv) => {
                    out.line("pending")?;
                    print_invoice(out, &inv.puid, inv.amount, &inv.address, &inv.memo)?;
                }
                None => out.line("No pending deposit")?,
            }
            if let Some(inv) = latest {
                out.fields(&[
                    ("latest", inv.puid.clone()),
                    ("latest_status", inv.status().to_string()),
                    ("latest_amount", amount(inv.amount)),
                ])?;
            }
            Ok(())
        }
        DepositCommand::Clear => {
            client.clear_pending_invoice();
            out.line("Pending deposit cleared")
        }
    }
}

/// Poll the pending invoice until it settles, the user interrupts, or it is
/// cleared from elsewhere.
async fn watch_deposit(
    client: &StakingClient,
    out: Output,
    notes: &mut EventSubscription,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    client.require_session()?;
    let Some(invoice) = client.pending_invoice().filter(|i| i.is_pending()) else {
        return out.line("No pending deposit");
    };
    info!(puid = %invoice.puid, "waiting for deposit");
    if !out.is_json() {
        out.line(format!(
            "Waiting for deposit {} of {} XRP (Ctrl-C to stop)",
            invoice.puid,
            amount(invoice.amount)
        ))?;
    }

    let wait = client.invoice_watcher().run_until_settled(cancel);
    tokio::pin!(wait);

    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            Some(event) = notes.next() => {
                if let ClientEvent::Notification(n) = event {
                    out.notification(&n)?;
                }
            }
        }
    };

    match outcome {
        DepositWait::Confirmed => {
            out.drain(notes)?;
            let balance = client.balance().snapshot();
            out.line(format!("Balance: {} XRP", balance.display()))
        }
        DepositWait::Cleared => out.line("Pending deposit cleared"),
        DepositWait::Cancelled => Ok(()),
    }
}

fn print_invoice(
    out: Output,
    puid: &str,
    qty: f64,
    address: &str,
    memo: &str,
) -> Result<(), CliError> {
    out.fields(&[
        ("invoice", puid.to_string()),
        ("amount", amount(qty)),
        ("address", address.to_string()),
        ("memo", memo.to_string()),
    ])
}

async fn withdraw(
    client: &StakingClient,
    cmd: WithdrawCommand,
    out: Output,
) -> Result<(), CliError> {
    match cmd {
        WithdrawCommand::Request {
            amount: qty,
            address,
            memo,
        } => {
            let receipt = client.withdraw(qty, &address, memo.as_deref()).await?;
            if out.is_json() {
                return out.json(&receipt);
            }
            out.fields(&[
                ("request", receipt.puid),
                ("address", receipt.address),
                ("balance_left", or_dash(receipt.left_balance.map(amount))),
            ])
        }
        WithdrawCommand::Cancel { puid } => {
            let receipt = client.cancel_withdraw(&puid).await?;
            out.line(format!("Withdraw request {} canceled", receipt.puid))
        }
        WithdrawCommand::History(page) => {
            let page = client.withdraw_history(page_query(page)).await?;
            if out.is_json() {
                return out.json(&page);
            }
            let rows: Vec<Vec<String>> = page
                .rows
                .iter()
                .map(|w| {
                    vec![
                        w.puid.clone(),
                        w.status.to_string(),
                        amount(w.amount),
                        w.destination_address.clone(),
                        w.requested_at.format("%Y-%m-%d %H:%M").to_string(),
                        if w.is_cancelable() { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            out.table(
                &["puid", "status", "amount", "address", "requested", "cancelable"],
                &rows,
            )
        }
    }
}

async fn history(client: &StakingClient, page: PageArgs, out: Output) -> Result<(), CliError> {
    let page = client.inner_transactions(page_query(page)).await?;
    if out.is_json() {
        return out.json(&page);
    }
    let rows: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|t| {
            vec![
                or_dash(t.created_at.map(|at| at.format("%Y-%m-%d %H:%M"))),
                t.kind.clone(),
                t.action_text.clone(),
                amount(t.amount),
                amount(t.balance),
                t.status.clone(),
            ]
        })
        .collect();
    out.table(&["time", "type", "action", "amount", "balance", "status"], &rows)
}

fn page_query(page: PageArgs) -> PageQuery {
    PageQuery::new(page.offset, page.limit)
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.is_empty() || message.eq_ignore_ascii_case("ok") {
        fallback.to_string()
    } else {
        message
    }
}
