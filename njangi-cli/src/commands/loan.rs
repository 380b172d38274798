use super::{print_json, Context};
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum LoanCommand {
    /// Submit a loan request for a member
    Request {
        member: String,
        amount: u64,
        #[arg(long)]
        purpose: String,
    },
    /// Approve a pending request
    Approve { id: String },
    /// Reject a pending request
    Reject { id: String },
    /// List loan requests
    List {
        /// Only requests awaiting a decision
        #[arg(long)]
        pending: bool,
        /// Only requests from this member
        #[arg(long)]
        member: Option<String>,
    },
}

pub async fn run(ctx: &Context, cmd: LoanCommand) -> Result<()> {
    let loans = ctx.association.loans();
    match cmd {
        LoanCommand::Request { member, amount, purpose } => {
            let member = ctx.member(&member).await?;
            print_json(&loans.request(&member.id, amount, &purpose).await?)
        }
        LoanCommand::Approve { id } => print_json(&loans.approve(&id, &ctx.actor).await?),
        LoanCommand::Reject { id } => print_json(&loans.reject(&id, &ctx.actor).await?),
        LoanCommand::List { pending, member } => {
            let mut requests = match member {
                Some(member) => loans.for_member(&ctx.member(&member).await?.id).await?,
                None => loans.all().await?,
            };
            if pending {
                requests.retain(|loan| loan.is_pending());
            }
            for loan in requests {
                println!(
                    "{}  {}  {:<24} {:>12} XAF  {:<9} {}",
                    loan.id,
                    loan.request_date.format("%Y-%m-%d"),
                    loan.member_name,
                    loan.amount,
                    loan.status,
                    loan.purpose
                );
            }
            Ok(())
        }
    }
}
