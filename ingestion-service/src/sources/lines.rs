use futures::stream;

use crate::pipeline::{Envelope, EnvelopeStream, Source};

/// Flow file content that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct LinesSource {
    lines: Vec<String>,
}

impl LinesSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }
}

#[async_trait::async_trait]
impl Source<String> for LinesSource {
    async fn stream(&self) -> EnvelopeStream<String> {
        let items: Vec<_> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                Ok(Envelope {
                    payload: line.clone(),
                    line_number: i + 1,
                })
            })
            .collect();

        Box::pin(stream::iter(items))
    }
}
