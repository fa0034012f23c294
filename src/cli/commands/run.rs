//! run command - Execute a workload and print the results

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::read_workload;
use crate::core::config::{Config, OutputFormat, MAX_WORKERS};
use crate::core::manager::Strategy;
use crate::engine::{self, Context, ExecMode, RunSettings};
use crate::ui::output::{self, Verbosity};

/// Flags accepted by `run`, before config defaults are applied.
#[derive(Debug, Default)]
pub struct RunFlags<'a> {
    pub input: Option<&'a Path>,
    pub strategy: Option<Strategy>,
    pub parallel: bool,
    pub workers: Option<usize>,
    pub json: bool,
    pub verify: bool,
}

/// Resolve flags against the config: flags win, config fills the rest.
fn resolve(flags: &RunFlags<'_>, config: &Config) -> Result<(RunSettings, OutputFormat)> {
    let workers = flags.workers.unwrap_or_else(|| config.workers());
    if workers == 0 || workers > MAX_WORKERS {
        bail!(
            "--workers must be between 1 and {}, got {}",
            MAX_WORKERS,
            workers
        );
    }

    let mode = if flags.parallel || config.parallel() {
        ExecMode::Parallel { workers }
    } else {
        ExecMode::Sequential
    };

    let format = if flags.json {
        OutputFormat::Json
    } else {
        config.output()
    };

    let settings = RunSettings {
        strategy: flags.strategy.unwrap_or_else(|| config.strategy()),
        mode,
        verify: flags.verify || config.verify(),
    };
    Ok((settings, format))
}

/// Execute a workload.
pub fn run(ctx: &Context, config: &Config, flags: RunFlags<'_>) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let (settings, format) = resolve(&flags, config)?;

    let workload = read_workload(flags.input)?;
    output::debug(
        format!(
            "tree: {} nodes, arity {}; {} requests",
            workload.topology.node_count(),
            workload.topology.arity(),
            workload.requests.len()
        ),
        verbosity,
    );
    output::debug(
        format!(
            "strategy: {}, mode: {}",
            settings.strategy,
            settings.mode.describe()
        ),
        verbosity,
    );

    let report = engine::run_workload(&workload, &settings).context("Run failed")?;

    let rendered = match format {
        OutputFormat::Text => output::format_outcomes(&report.outcomes),
        OutputFormat::Json => {
            let mut json =
                output::outcomes_json(&report.outcomes).context("Failed to encode outcomes")?;
            json.push('\n');
            json
        }
    };
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write results")?;

    output::debug(
        format!(
            "granted {}, denied {} in {:?}",
            report.granted(),
            report.denied(),
            report.elapsed
        ),
        verbosity,
    );

    if let Some(result) = &report.verification {
        if !result.ok {
            for err in &result.errors {
                output::error(err);
            }
            bail!(
                "Invariant verification failed with {} error(s)",
                result.errors.len()
            );
        }
        output::debug("verification passed", verbosity);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GlobalConfig;

    fn config(global: GlobalConfig) -> Config {
        Config::from(global)
    }

    #[test]
    fn defaults_are_sequential_fine_text() {
        let (settings, format) = resolve(&RunFlags::default(), &Config::default()).unwrap();
        assert_eq!(settings.strategy, Strategy::Fine);
        assert_eq!(settings.mode, ExecMode::Sequential);
        assert!(!settings.verify);
        assert_eq!(format, OutputFormat::Text);
    }

    #[test]
    fn config_fills_unset_flags() {
        let cfg = config(GlobalConfig {
            strategy: Some(Strategy::Coarse),
            parallel: Some(true),
            workers: Some(3),
            verify: Some(true),
            output: Some(OutputFormat::Json),
        });

        let (settings, format) = resolve(&RunFlags::default(), &cfg).unwrap();
        assert_eq!(settings.strategy, Strategy::Coarse);
        assert_eq!(settings.mode, ExecMode::Parallel { workers: 3 });
        assert!(settings.verify);
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn flags_override_config() {
        let cfg = config(GlobalConfig {
            strategy: Some(Strategy::Coarse),
            workers: Some(3),
            ..Default::default()
        });
        let flags = RunFlags {
            strategy: Some(Strategy::Fine),
            parallel: true,
            workers: Some(5),
            ..Default::default()
        };

        let (settings, _) = resolve(&flags, &cfg).unwrap();
        assert_eq!(settings.strategy, Strategy::Fine);
        assert_eq!(settings.mode, ExecMode::Parallel { workers: 5 });
    }

    #[test]
    fn rejects_zero_workers() {
        let flags = RunFlags {
            parallel: true,
            workers: Some(0),
            ..Default::default()
        };
        assert!(resolve(&flags, &Config::default()).is_err());
    }
}
