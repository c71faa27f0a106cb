/// Events emitted by long-running engine operations.
///
/// Phases nest tasks: a consumer sees `PhaseStart`, then any number of
/// `TaskStart` / `TaskIncrement` / `TaskFinish` sequences, then `PhaseFinish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback. The default reporter
/// discards everything.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        if self.callback.is_some() {
            self.report(Progress::Message(text.into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn default_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
        reporter.message("nothing listens");
    }

    #[test]
    fn callback_receives_events_in_order() {
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
                events.lock().unwrap().push(event);
            }));
            reporter.report(Progress::PhaseStart { name: "Search" });
            reporter.report(Progress::TaskStart { total_steps: 2 });
            reporter.message("halfway");
            reporter.report(Progress::PhaseFinish);
        }
        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Progress::PhaseStart { name: "Search" },
                Progress::TaskStart { total_steps: 2 },
                Progress::Message("halfway".to_string()),
                Progress::PhaseFinish,
            ]
        );
    }
}
