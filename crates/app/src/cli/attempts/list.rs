use clap::Args;
use shopfront_app::domain::checkout::{CheckoutService, records::AttemptState};

use super::{ConnectionArgs, print_attempt};

#[derive(Debug, Args)]
pub(crate) struct ListAttemptsArgs {
    /// Attempt state, e.g. `reconciliation_required`
    #[arg(long)]
    state: AttemptState,

    #[command(flatten)]
    connection: ConnectionArgs,
}

pub(crate) async fn run(args: ListAttemptsArgs) -> Result<(), String> {
    let ctx = args.connection.context().await?;

    let attempts = ctx
        .checkout
        .list_attempts(args.state)
        .await
        .map_err(|error| format!("failed to list attempts: {error}"))?;

    if attempts.is_empty() {
        println!("no attempts in state {}", args.state);
    }

    for attempt in &attempts {
        print_attempt(attempt);
    }

    Ok(())
}
