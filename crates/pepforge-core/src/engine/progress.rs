/// Events emitted while a run advances through its stages.
#[derive(Debug, Clone)]
pub enum Progress {
    /// A pipeline stage began; `index` is 1-based out of `total` planned stages.
    StageStart {
        name: &'static str,
        index: usize,
        total: usize,
    },
    StageFinish,
    StageSkipped {
        name: &'static str,
        reason: &'static str,
    },

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

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
        self.report(Progress::Message(text.into()));
    }
}
