use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use rstake::ContractType;

/// Command line client for the XRP staking service.
#[derive(Parser, Debug)]
#[command(name = "rstake", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Output as JSON instead of TSV
    #[arg(long, global = true)]
    pub json: bool,

    /// Base URL of the staking API (overrides RSTAKE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Create a new account
    Register(RegisterArgs),

    /// End the session and forget the token
    Logout,

    /// Resend the email verification link
    VerifyEmail(CredentialsArgs),

    /// Reset a forgotten password
    #[command(subcommand)]
    ResetPassword(ResetPasswordCommand),

    /// Show the account profile
    Profile,

    /// List active sessions
    Sessions,

    /// Change the interface language
    Lang {
        /// Language code (e.g. en, ru)
        lang: String,
    },

    /// Show the account balance
    Balance,

    /// Two-factor authentication setup
    #[command(subcommand)]
    TwoFa(TwoFaCommand),

    /// Staking contracts
    #[command(subcommand)]
    Stake(StakeCommand),

    /// Deposit invoices
    #[command(subcommand)]
    Deposit(DepositCommand),

    /// Withdrawals
    #[command(subcommand)]
    Withdraw(WithdrawCommand),

    /// Balance movement history
    History(PageArgs),

    /// Check that the API is reachable
    Health,
}

/// Arguments for the `login` subcommand.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "RSTAKE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Six-digit 2FA code, when the account has 2FA enabled
    #[arg(long)]
    pub code: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub surname: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "RSTAKE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct CredentialsArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "RSTAKE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum ResetPasswordCommand {
    /// Email a reset code
    Request {
        #[arg(long)]
        email: String,
    },

    /// Set a new password using the emailed code
    Verify {
        #[arg(long)]
        email: String,

        #[arg(long)]
        code: String,

        /// The new password
        #[arg(long, env = "RSTAKE_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TwoFaCommand {
    /// Start 2FA setup and print the secret
    Generate,

    /// Confirm 2FA setup with a code from the authenticator app
    Set {
        /// Six-digit code
        code: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum StakeCommand {
    /// Open a staking contract
    Buy {
        /// Staking plan
        #[arg(long, value_enum, default_value = "unlimited")]
        plan: Plan,

        /// Amount in XRP
        amount: Decimal,
    },

    /// Start the 7-day unstaking period of a flexible contract
    Unstake {
        /// Contract puid
        puid: String,
    },

    /// Resume an unstaked flexible contract
    Resume {
        /// Contract puid
        puid: String,
    },

    /// Show active and completed contracts
    List,
}

#[derive(Subcommand, Debug)]
pub enum DepositCommand {
    /// Request a deposit invoice
    Request {
        /// Amount in XRP
        #[arg(default_value = "100")]
        amount: Decimal,
    },

    /// Wait until the pending deposit is confirmed
    Watch,

    /// Show the pending and the most recent invoice
    Status,

    /// Forget the pending deposit invoice
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum WithdrawCommand {
    /// Request a payout
    Request {
        /// Amount in XRP
        amount: Decimal,

        /// Destination address
        #[arg(long)]
        address: String,

        /// Destination tag / memo
        #[arg(long)]
        memo: Option<String>,
    },

    /// Cancel a pending payout
    Cancel {
        /// Withdraw request puid
        puid: String,
    },

    /// List past payout requests
    History(PageArgs),
}

#[derive(Parser, Debug, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value = "0")]
    pub offset: u32,

    #[arg(long, default_value = "20")]
    pub limit: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Flexible, 9% per month, can be unstaked
    Unlimited,
    /// 20% per month
    Monthly,
    /// 30% per month
    Yearly,
}

impl From<Plan> for ContractType {
    fn from(p: Plan) -> Self {
        match p {
            Plan::Unlimited => ContractType::Unlimited,
            Plan::Monthly => ContractType::Monthly,
            Plan::Yearly => ContractType::Yearly,
        }
    }
}
