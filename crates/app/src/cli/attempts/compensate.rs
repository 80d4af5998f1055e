use clap::Args;
use shopfront_app::domain::checkout::{CheckoutService, records::AttemptUuid};

use super::{ConnectionArgs, print_attempt};

#[derive(Debug, Args)]
pub(crate) struct CompensateAttemptArgs {
    /// Checkout attempt UUID
    attempt_uuid: AttemptUuid,

    #[command(flatten)]
    connection: ConnectionArgs,
}

pub(crate) async fn run(args: CompensateAttemptArgs) -> Result<(), String> {
    let ctx = args.connection.context().await?;

    let attempt = ctx
        .checkout
        .compensate_attempt(args.attempt_uuid)
        .await
        .map_err(|error| format!("failed to compensate attempt: {error}"))?;

    print_attempt(&attempt);

    Ok(())
}
