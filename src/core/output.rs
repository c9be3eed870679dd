// ripestat-text - Output Queue
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ordered queue of output lines
//!
//! The pipeline never writes to stdout or a socket directly. It pushes lines
//! into an [`Output`]; the front end owns the receiving end and is the only
//! writer to its terminal or connection.

use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Output {
    tx: mpsc::UnboundedSender<String>,
}

impl Output {
    pub fn channel() -> (Output, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Output { tx }, rx)
    }

    /// Queue one line. A closed receiver (peer gone) is not an error.
    pub fn line(&self, line: impl Into<String>) {
        let _ = self.tx.send(line.into());
    }

    pub fn lines<I, S>(&self, lines: I) where I: IntoIterator<Item = S>, S: Into<String> {
        for line in lines {
            self.line(line);
        }
    }

    /// Queue a block of text, one entry per `\n` separated line
    pub fn text(&self, text: &str) {
        self.lines(text.split('\n').map(|l| l.trim_end_matches('\r')));
    }

    /// True once the receiving side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drain everything already queued; for tests and one-shot callers
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}
