use std::{sync::Arc, time::Duration};

use clap::{Args, Subcommand};
use shopfront_app::{
    context::AppContext,
    domain::{
        checkout::records::CheckoutAttemptRecord,
        payments::http::{HttpPaymentGateway, PaymentServiceConfig},
    },
};

mod compensate;
mod list;

#[derive(Debug, Args)]
pub(crate) struct AttemptsCommand {
    #[command(subcommand)]
    command: AttemptsSubcommand,
}

#[derive(Debug, Subcommand)]
enum AttemptsSubcommand {
    /// List checkout attempts in a given state
    List(list::ListAttemptsArgs),

    /// Settle an abandoned attempt: commit it if its order exists, otherwise refund it
    Compensate(compensate::CompensateAttemptArgs),
}

/// Connection settings shared by the attempt commands.
#[derive(Debug, Args)]
pub(crate) struct ConnectionArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Payment service base URL
    #[arg(long, env = "PAYMENT_SERVICE_URL", default_value = "http://localhost:8081")]
    payment_service_url: String,

    /// Payment request timeout in seconds
    #[arg(long, env = "PAYMENT_TIMEOUT_SECONDS", default_value_t = 10)]
    payment_timeout_seconds: u64,

    /// Currency sent with refunds
    #[arg(long, env = "PAYMENT_CURRENCY", default_value = "GBP")]
    currency: String,
}

impl ConnectionArgs {
    async fn context(&self) -> Result<AppContext, String> {
        let gateway = HttpPaymentGateway::new(PaymentServiceConfig {
            base_url: self.payment_service_url.clone(),
            timeout: Duration::from_secs(self.payment_timeout_seconds),
        })
        .map_err(|error| format!("failed to build payment client: {error}"))?;

        AppContext::from_database_url(&self.database_url, Arc::new(gateway), &self.currency)
            .await
            .map_err(|error| format!("failed to initialise application: {error}"))
    }
}

pub(crate) async fn run(command: AttemptsCommand) -> Result<(), String> {
    match command.command {
        AttemptsSubcommand::List(args) => list::run(args).await,
        AttemptsSubcommand::Compensate(args) => compensate::run(args).await,
    }
}

fn print_attempt(attempt: &CheckoutAttemptRecord) {
    println!(
        "{}\t{}\tuser={}\tamount={}\torder={}\tupdated={}\t{}",
        attempt.uuid,
        attempt.state,
        attempt.user_uuid,
        attempt.amount,
        attempt
            .order_uuid
            .map_or_else(|| "-".to_string(), |order| order.to_string()),
        attempt.updated_at,
        attempt.detail.as_deref().unwrap_or(""),
    );
}
