// Copyright (c) 2026 rezky_nightky

use log::{debug, info};

use crate::error::{Error, Result};
use crate::rain::{Phase, RainField};
use crate::runtime::Finale;
use crate::scheduler::{Clock, FrameHost, FrameRate, Outcome, RunReport, Scheduler};

#[derive(Clone, Copy, Debug)]
pub struct SequenceConfig {
    pub rate: FrameRate,
    pub finale: Finale,
}

#[derive(Clone, Debug, Default)]
pub struct ShowReport {
    pub phases: Vec<(Phase, RunReport)>,
    pub cancelled: bool,
}

pub fn phases_for(finale: Finale) -> &'static [Phase] {
    match finale {
        Finale::Full => &[Phase::Fall, Phase::Fade, Phase::Disappear, Phase::Cleared],
        Finale::Fade => &[Phase::Fall, Phase::Fade, Phase::Cleared],
        Finale::Cut => &[Phase::Fall, Phase::Cleared],
    }
}

/// Plays each phase to completion in order. The disappear phase runs at half
/// the configured rate.
pub fn play<H: FrameHost, C: Clock>(
    scheduler: &Scheduler<C>,
    host: &mut H,
    field: &mut RainField,
    config: &SequenceConfig,
) -> Result<ShowReport> {
    let layout = field.layout();
    info!(
        "{} columns, message in columns {}..{} at y={:.2}",
        layout.num_drops,
        layout.text_left,
        layout.text_right(),
        layout.text_top
    );

    let mut report = ShowReport::default();
    for &phase in phases_for(config.finale) {
        let rate = match phase {
            Phase::Disappear => config.rate.halved(),
            _ => config.rate,
        };
        if phase == Phase::Disappear {
            field.set_disappear_budget(rate);
        }
        field.enter(phase);

        let run = scheduler.run(host, field, rate)?;
        debug!(
            "{} phase: {} ticks, avg {:.2} ms/tick",
            phase,
            run.ticks,
            run.avg_tick_ms()
        );
        report.phases.push((phase, run));

        match run.outcome {
            Outcome::Finished => {}
            Outcome::Cancelled => {
                info!("{} phase cancelled", phase);
                report.cancelled = true;
                break;
            }
            Outcome::TimedOut => {
                return Err(Error::Timeout {
                    phase,
                    limit_ms: scheduler.timeout_ms().unwrap_or_default() as u64,
                });
            }
        }
    }
    Ok(report)
}
