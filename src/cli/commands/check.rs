//! check command - Validate a workload and summarize it

use std::path::Path;

use anyhow::{Context as _, Result};
use serde_json::json;

use super::read_workload;
use crate::core::config::OutputFormat;
use crate::core::manager::OpKind;
use crate::engine::{Context, Workload};
use crate::ui::output::{self, Verbosity};

fn summary_text(workload: &Workload) -> String {
    let topology = &workload.topology;
    format!(
        "nodes: {}\narity: {}\nheight: {}\nrequests: {} (lock {}, unlock {}, upgrade {})",
        topology.node_count(),
        topology.arity(),
        topology.height(),
        workload.requests.len(),
        workload.count(OpKind::Lock),
        workload.count(OpKind::Unlock),
        workload.count(OpKind::Upgrade),
    )
}

fn summary_json(workload: &Workload) -> serde_json::Value {
    let topology = &workload.topology;
    json!({
        "nodes": topology.node_count(),
        "arity": topology.arity(),
        "height": topology.height(),
        "requests": {
            "total": workload.requests.len(),
            "lock": workload.count(OpKind::Lock),
            "unlock": workload.count(OpKind::Unlock),
            "upgrade": workload.count(OpKind::Upgrade),
        },
    })
}

/// Parse and validate a workload without executing it.
pub fn check(ctx: &Context, input: Option<&Path>, format: OutputFormat) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let workload = read_workload(input)?;

    match format {
        OutputFormat::Text => output::print(summary_text(&workload), verbosity),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary_json(&workload))
                .context("Failed to encode summary")?;
            println!("{}", json);
        }
    }

    Ok(())
}
