use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use vdock::engine::progress::{Progress, ProgressCallback};

/// Renders pipeline stage events as a single stderr spinner. Each stage
/// gets its own spinner line, finished with a check mark when the next
/// stage begins or the handler is finalized.
pub struct CliProgressHandler {
    active: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl CliProgressHandler {
    pub fn new(quiet: bool) -> Self {
        Self {
            active: Mutex::new(None),
            hidden: quiet,
        }
    }

    pub fn callback(&self) -> ProgressCallback<'_> {
        Box::new(move |progress: Progress| self.handle(progress))
    }

    /// Clears any spinner that is still running, marking it finished.
    pub fn finalize(&self) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(bar) = active.take() {
                bar.finish();
            }
        }
    }

    fn handle(&self, progress: Progress) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        match progress {
            Progress::StageStart { name } => {
                if let Some(previous) = active.take() {
                    previous.finish();
                }
                let bar = ProgressBar::new_spinner();
                if self.hidden {
                    bar.set_draw_target(ProgressDrawTarget::hidden());
                } else {
                    bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
                }
                bar.set_style(Self::spinner_style());
                bar.set_message(name);
                bar.enable_steady_tick(Duration::from_millis(100));
                *active = Some(bar);
            }
            Progress::StageFinish => {
                if let Some(bar) = active.take() {
                    bar.finish_with_message(format!("✔ {}", bar.message()));
                }
            }
            Progress::Message(msg) => {
                if let Some(bar) = active.as_ref() {
                    bar.set_message(msg);
                }
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_start_replaces_the_previous_spinner() {
        let handler = CliProgressHandler::new(true);
        handler.handle(Progress::StageStart { name: "Embed" });
        handler.handle(Progress::StageStart { name: "Refine" });
        let active = handler.active.lock().unwrap();
        assert_eq!(active.as_ref().unwrap().message(), "Refine");
    }

    #[test]
    fn finalize_clears_the_active_spinner() {
        let handler = CliProgressHandler::new(true);
        handler.handle(Progress::StageStart { name: "Dock" });
        handler.finalize();
        assert!(handler.active.lock().unwrap().is_none());
    }
}
