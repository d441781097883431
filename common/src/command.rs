//! ビューアーへのコマンドチャネル
//!
//! The page that hosts a viewer does not call into it directly; it sends
//! [`ViewerCommand`]s through a [`ViewerHandle`], and the viewer drains its
//! [`ViewerCommands`].

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    /// Run OCR for the current page.
    RecognizeText,
    /// Jump to a 0-based page (clamped by the viewer).
    SetPage(usize),
}

#[derive(Debug, Clone)]
pub struct ViewerHandle {
    tx: UnboundedSender<ViewerCommand>,
}

impl ViewerHandle {
    /// Returns false once the viewer is gone.
    pub fn send(&self, command: ViewerCommand) -> bool {
        match self.tx.unbounded_send(command) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(?command, "viewer gone, command dropped");
                false
            }
        }
    }

    pub fn recognize_text(&self) -> bool {
        self.send(ViewerCommand::RecognizeText)
    }

    pub fn set_page(&self, page: usize) -> bool {
        self.send(ViewerCommand::SetPage(page))
    }
}

#[derive(Debug)]
pub struct ViewerCommands {
    rx: UnboundedReceiver<ViewerCommand>,
}

impl ViewerCommands {
    /// Commands queued so far, without waiting.
    #[cfg(test)]
    fn drain(&mut self) -> Vec<ViewerCommand> {
        use futures::{FutureExt, StreamExt};
        let mut out = Vec::new();
        while let Some(Some(command)) = self.rx.next().now_or_never() {
            out.push(command);
        }
        out
    }
}

impl Stream for ViewerCommands {
    type Item = ViewerCommand;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

pub fn channel() -> (ViewerHandle, ViewerCommands) {
    let (tx, rx) = mpsc::unbounded();
    (ViewerHandle { tx }, ViewerCommands { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_commands_arrive_in_order() {
        let (handle, mut commands) = channel();
        assert!(handle.set_page(3));
        assert!(handle.recognize_text());
        assert_eq!(
            commands.drain(),
            vec![ViewerCommand::SetPage(3), ViewerCommand::RecognizeText]
        );
        assert!(commands.drain().is_empty());
    }

    #[test]
    fn test_send_after_viewer_dropped() {
        let (handle, commands) = channel();
        drop(commands);
        assert!(!handle.recognize_text());
    }

    #[test]
    fn test_stream() {
        let (handle, commands) = channel();
        handle.set_page(1);
        drop(handle);
        let all: Vec<_> = futures::executor::block_on(commands.collect());
        assert_eq!(all, vec![ViewerCommand::SetPage(1)]);
    }
}
