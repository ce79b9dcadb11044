use std::time::{Duration, Instant};

/// Wall-clock budget and sampled span logging for one step.
///
/// - owns the step deadline checked by every sweep
/// - when sampled, logs a begin/end wrapper and sequential phase spans at `debug`
/// - `span()` ends the previous span
pub struct StepStopwatch {
    started: Instant,
    budget: Duration,
    step: u64,
    span: Option<(&'static str, Instant)>,
    should_sample: bool,
}

impl StepStopwatch {
    /// Starts timing step number `step`.
    ///
    /// Sampling: logs when `profile_every > 0` and `step` is a multiple of it.
    pub fn new(step: u64, budget: Duration, profile_every: u32) -> Self {
        let should_sample = profile_every > 0 && step % u64::from(profile_every) == 0;

        if should_sample {
            log::debug!("--------- step {step} begin ---------");
        }

        Self {
            started: Instant::now(),
            budget,
            step,
            span: None,
            should_sample,
        }
    }

    /// Starts a new span within the step, ending any previous span.
    pub fn span(&mut self, section_name: &'static str) {
        if !self.should_sample {
            return;
        }
        self.end_span();
        self.span = Some((section_name, Instant::now()));
    }

    /// Ends the current span, if any.
    pub fn end_span(&mut self) {
        if let Some((name, since)) = self.span.take() {
            log::debug!("{name}: {:?}", since.elapsed());
        }
    }

    /// Whether the step's wall-clock budget is used up.
    #[inline]
    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn should_sample(&self) -> bool {
        self.should_sample
    }
}

impl Drop for StepStopwatch {
    fn drop(&mut self) {
        if !self.should_sample {
            return;
        }

        self.end_span();
        log::debug!("---------- step {} end ({:?}) ----------", self.step, self.started.elapsed());
    }
}
