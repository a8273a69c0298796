use serde::Serialize;

use bursary_core::enums::RequestMode;
use bursary_core::outcome::OutcomeReport;
use bursary_core::response::RenderedResponse;
use bursary_db::orchestrator::MutationRequest;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::MutateArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct MutateResponse {
    outcome: OutcomeReport,
    response: RenderedResponse,
}

/// Build the pipeline request from command-line arguments.
fn request(args: &MutateArgs) -> MutationRequest {
    let mode = RequestMode::from_header(args.fragment.then_some("true"));
    args.fields
        .iter()
        .fold(
            MutationRequest::new(args.action, args.entity),
            |request, (key, value)| request.field(key.as_str(), value.as_str()),
        )
        .actor(args.actor)
        .mode(mode)
        .ip(args.ip.as_deref())
}

/// Handle `bursary mutate`.
pub async fn handle(args: &MutateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let (outcome, response) = ctx.service.execute_and_resolve(&request(args)).await;
    output(&MutateResponse { outcome, response }, flags.format)
}
