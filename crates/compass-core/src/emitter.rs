//! Streaming emitter: forwards fragments in order, accumulates the final text,
//! and detects caller disconnect.
//!
//! Invariant: the returned final text equals the exact ordered concatenation of
//! every fragment sent to the caller. Persistence never starts before the
//! stream is fully drained; a closed channel means cancellation and the caller
//! gets `CoreError::Cancelled` with nothing persisted.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::CoreError;
use crate::pipeline::FragmentStream;

/// Substituted when a pipeline completes without producing any fragment, so the
/// final text is never empty.
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "I don't have a response for that one. Could you rephrase your question?";

/// Drains the stream into the caller's channel. Returns the concatenated final
/// text, or `Cancelled` when the receiver is gone.
pub async fn drain(
    mut stream: FragmentStream,
    tx: &mpsc::Sender<String>,
) -> Result<String, CoreError> {
    let mut final_text = String::new();
    let mut fragments = 0usize;

    while let Some(fragment) = stream.next().await {
        if fragment.is_empty() {
            continue;
        }
        if tx.send(fragment.clone()).await.is_err() {
            debug!("fragment channel closed mid-stream, abandoning turn");
            return Err(CoreError::Cancelled);
        }
        final_text.push_str(&fragment);
        fragments += 1;
    }

    if fragments == 0 {
        return emit_single(EMPTY_RESPONSE_FALLBACK, tx).await;
    }
    Ok(final_text)
}

/// Emits one fragment (canned replies, clarifying questions, apologies) and
/// returns it as the final text.
pub async fn emit_single(text: &str, tx: &mpsc::Sender<String>) -> Result<String, CoreError> {
    if tx.send(text.to_string()).await.is_err() {
        return Err(CoreError::Cancelled);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn fragments(parts: &[&str]) -> FragmentStream {
        Box::pin(stream::iter(
            parts.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        ))
    }

    #[tokio::test]
    async fn final_text_is_exact_ordered_concatenation() {
        let (tx, mut rx) = mpsc::channel(16);
        let final_text = drain(fragments(&["Hel", "lo ", "world"]), &tx).await.unwrap();
        drop(tx);

        let mut received = String::new();
        while let Some(f) = rx.recv().await {
            received.push_str(&f);
        }
        assert_eq!(final_text, "Hello world");
        assert_eq!(received, final_text);
    }

    #[tokio::test]
    async fn empty_stream_substitutes_fallback() {
        let (tx, mut rx) = mpsc::channel(4);
        let final_text = drain(fragments(&[]), &tx).await.unwrap();
        assert_eq!(final_text, EMPTY_RESPONSE_FALLBACK);
        assert_eq!(rx.recv().await.unwrap(), EMPTY_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn empty_fragments_are_skipped_not_counted() {
        let (tx, _rx) = mpsc::channel(4);
        let final_text = drain(fragments(&["", "a", "", "b"]), &tx).await.unwrap();
        assert_eq!(final_text, "ab");
    }

    #[tokio::test]
    async fn dropped_receiver_cancels() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = drain(fragments(&["never delivered"]), &tx).await.unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
    }
}
