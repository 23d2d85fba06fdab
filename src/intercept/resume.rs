//! Turns decisions into behaviours the blocked hook can run.

use std::sync::Arc;

use super::call::DecisionKind;
use super::coordinator::Resumption;
use crate::config::NestedPolicy;
use crate::shell::{ExecContext, ExecHook, ExitStatus, Program, Runner, RunnerConfig};

/// Builds [`Resumption`]s around a real-exec hook.
#[derive(Clone)]
pub struct ResumeExecutor {
    real: Arc<dyn ExecHook>,
    nested: NestedPolicy,
}

impl ResumeExecutor {
    /// Creates an executor that falls through to `real`.
    #[must_use]
    pub fn new(real: Arc<dyn ExecHook>, nested: NestedPolicy) -> Self {
        Self { real, nested }
    }

    /// Runs the real command.
    #[must_use]
    pub fn fall_through(&self) -> Resumption {
        let real = Arc::clone(&self.real);
        Resumption::new(
            DecisionKind::FallThrough,
            Box::new(move |ctx: &ExecContext, args: &[String]| real.exec(ctx, args)),
        )
    }

    /// Runs the real command, then reports `code` instead when it is non-zero.
    #[must_use]
    pub fn fall_through_with_override(&self, code: ExitStatus) -> Resumption {
        let real = Arc::clone(&self.real);
        Resumption::new(
            DecisionKind::FallThrough,
            Box::new(move |ctx: &ExecContext, args: &[String]| {
                let status = real.exec(ctx, args);
                if code.success() {
                    status
                } else {
                    code
                }
            }),
        )
    }

    /// Reports `code` without running anything.
    #[must_use]
    pub fn forced_exit(code: ExitStatus) -> Resumption {
        Resumption::new(DecisionKind::ForcedExit, Box::new(move |_: &ExecContext, _: &[String]| code))
    }

    /// Runs `program` as a stand-in for the call.
    #[must_use]
    pub fn mock(&self, program: Program) -> Resumption {
        let real = Arc::clone(&self.real);
        let nested = self.nested;
        Resumption::new(
            DecisionKind::Mock,
            Box::new(move |ctx: &ExecContext, args: &[String]| {
                let hook = match nested {
                    NestedPolicy::FallThrough => real,
                    NestedPolicy::Intercept => Arc::clone(&ctx.hook),
                };
                run_mock(&program, ctx, args, hook)
            }),
        )
    }
}

/// Runs `program` in the call's context with `args[1..]` as its positional
/// parameters, sending its own commands to `hook`.
pub fn run_mock(program: &Program, ctx: &ExecContext, args: &[String], hook: Arc<dyn ExecHook>) -> ExitStatus {
    let mut params = vec!["--".to_string()];
    params.extend(args.iter().skip(1).cloned());
    let config = RunnerConfig {
        dir: ctx.dir.clone(),
        env: ctx.env.clone(),
        streams: ctx.streams.clone(),
        params,
    };
    let mut runner = match Runner::new(config, hook) {
        Ok(runner) => runner,
        Err(err) => {
            tracing::error!(program = %program.name, error = %err, "failed to start mock");
            ctx.streams.stderr.diagnostic(&format!("{}: {err}", program.name));
            return ExitStatus::FAILURE;
        }
    };
    match runner.run(program) {
        Ok(()) => ExitStatus::SUCCESS,
        Err(err) => err.exit_status(),
    }
}
