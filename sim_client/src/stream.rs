use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use sim_proto::{DecodeStats, FrameDecoder, StreamChunk};

use crate::error::ClientError;
use crate::reactions::ReactionSynthesizer;

/// Response body of a simulate call.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Decoded chunks of one simulation response, in frame order.
///
/// Single pass: once it returns `None` it stays exhausted. It ends at end of
/// body, right after the `complete` chunk, or after yielding one transport
/// error. Dropping it releases the underlying body.
pub struct ChunkStream<S> {
    source: S,
    decoder: FrameDecoder,
    ready: VecDeque<StreamChunk>,
    reactions: Option<ReactionSynthesizer>,
    final_stats: Option<DecodeStats>,
}

impl<S> ChunkStream<S> {
    pub fn new(source: S, reactions: Option<ReactionSynthesizer>) -> Self {
        Self {
            source,
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
            reactions,
            final_stats: None,
        }
    }

    pub fn stats(&self) -> DecodeStats {
        self.final_stats.unwrap_or_else(|| self.decoder.stats())
    }

    pub fn is_finished(&self) -> bool {
        self.final_stats.is_some() && self.ready.is_empty()
    }

    fn enqueue(&mut self, chunk: StreamChunk) {
        let chunk = match chunk {
            StreamChunk::Event(mut event) => {
                event.clamp_scalars();
                if event.comments.is_empty() {
                    if let Some(reactions) = self.reactions.as_mut() {
                        event.comments = reactions.synthesize(&event);
                    }
                }
                StreamChunk::Event(event)
            }
            other => other,
        };
        self.ready.push_back(chunk);
    }

    fn finish(&mut self, reason: &'static str) {
        if self.final_stats.is_some() {
            return;
        }
        let stats = std::mem::take(&mut self.decoder).finish();
        tracing::info!(
            target: "policy_sim::client",
            reason,
            frames = stats.frames,
            chunks = stats.chunks,
            skipped = stats.skipped,
            malformed = stats.malformed,
            after_complete = stats.after_complete,
            "stream.finished"
        );
        self.final_stats = Some(stats);
    }
}

impl<S, B, E> ChunkStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    ClientError: From<E>,
{
    /// Waits for the next chunk.
    pub async fn next_chunk(&mut self) -> Option<Result<StreamChunk, ClientError>> {
        self.next().await
    }
}

impl<S, B, E> Stream for ChunkStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    ClientError: From<E>,
{
    type Item = Result<StreamChunk, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(chunk) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(chunk)));
            }
            if this.final_stats.is_some() {
                return Poll::Ready(None);
            }
            if this.decoder.is_complete() {
                this.finish("complete");
                continue;
            }
            match Pin::new(&mut this.source).poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(bytes))) => {
                    for chunk in this.decoder.push_bytes(bytes.as_ref()) {
                        this.enqueue(chunk);
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    let err = ClientError::from(err);
                    tracing::warn!(
                        target: "policy_sim::client",
                        error = %err,
                        "stream.transport_failed"
                    );
                    this.finish("transport_error");
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => this.finish("end_of_body"),
            }
        }
    }
}
