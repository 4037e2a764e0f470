//! `mediarr get` - GET an endpoint through the resilient client.

use anyhow::Result;
use mediarr::RequestSpec;

use super::{describe, Context};
use crate::cli::args::GetArgs;
use crate::output;

pub async fn execute(ctx: Context, args: GetArgs) -> Result<()> {
    let client = ctx.client(args.service)?;

    let spec = RequestSpec::get(&args.path).queries(args.query);
    let value: serde_json::Value = client.execute(spec).await.map_err(describe)?;

    println!("{}", output::render(&value, ctx.output_format)?);

    Ok(())
}
