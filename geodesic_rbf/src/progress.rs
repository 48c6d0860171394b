/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for interpolant construction.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for interpolant construction.

use std::fmt::Debug;
use std::sync::{Arc, mpsc};
use std::thread;

/// Progress events emitted while an interpolant is assembled and solved.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMsg {
    /// Construction started for a system of `num_points` collocation points.
    Interpolating { num_points: usize },

    /// The collocation matrix has been assembled.
    MatrixAssembled { nrows: usize, ncols: usize },

    /// The linear system was solved.
    SystemSolved,

    /// The coefficient matrix is not of full rank; weights were left at zero.
    SingularSystem,

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        let _ = self.tx.try_send(msg);
    }
}

/// Spawns a listener thread that runs a handler closure for each progress message.
///
/// The listener exits once every clone of the returned sink has been dropped.
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}

/// Emits `msg` if a sink is attached.
#[inline]
pub(crate) fn report(sink: &Option<Arc<dyn ProgressSink>>, msg: ProgressMsg) {
    if let Some(sink) = sink {
        sink.emit(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Mutex<Vec<ProgressMsg>>,
    }

    impl ProgressSink for Recorder {
        fn emit(&self, msg: ProgressMsg) {
            self.seen.lock().unwrap().push(msg);
        }
    }

    #[test]
    fn report_only_emits_to_attached_sinks() {
        let recorder = Arc::new(Recorder::default());
        let sink: Option<Arc<dyn ProgressSink>> = Some(recorder.clone());

        report(&sink, ProgressMsg::SystemSolved);
        report(&None, ProgressMsg::SingularSystem);

        assert!(*recorder.seen.lock().unwrap() == vec![ProgressMsg::SystemSolved]);
    }

    #[test]
    fn closure_sink_forwards_messages() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();

        let (sink, handle) = closure_sink(8, move |msg| {
            received_clone.lock().unwrap().push(msg);
        });

        sink.emit(ProgressMsg::Interpolating { num_points: 3 });
        sink.emit(ProgressMsg::MatrixAssembled { nrows: 3, ncols: 3 });
        drop(sink);
        handle.join().unwrap();

        let received = received.lock().unwrap();
        assert!(received.len() == 2);
        assert!(received[0] == ProgressMsg::Interpolating { num_points: 3 });
    }
}
