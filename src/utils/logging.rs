use anyhow::Error;
use tracing::span::Span;

pub trait LogError {
    /// Logs the error inside this span, so that it carries the span's fields.
    fn log_error(&self, error: Error);
}

impl LogError for Span {
    fn log_error(&self, error: Error) {
        self.in_scope(|| {
            tracing::error!("Error: {error:?}");
        });
    }
}
