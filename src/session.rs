// src/session.rs

//! Drives one stream from a byte source through the interpreter to a sink.
//!
//! Bytes are read in chunks and fed to a [`StreamDecoder`]; each complete
//! record goes to the [`Interpreter`], and the frame is handed to the sink via
//! the [`Presenter`] according to the [`RepaintPolicy`]. A final repaint always
//! happens when the stream ends, however it ends.

use crate::config::RepaintPolicy;
use crate::interpreter::{Interpreter, StreamEnd};
use crate::protocol::StreamDecoder;
use crate::sink::{DisplaySink, Presenter};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};

const DEFAULT_CHUNK_SIZE: usize = 4096;

pub struct Session<'s> {
    interpreter: Interpreter,
    decoder: StreamDecoder,
    presenter: Presenter,
    sink: &'s mut dyn DisplaySink,
    repaint: RepaintPolicy,
    chunk_size: usize,
    interrupt: Option<&'s AtomicBool>,
}

impl<'s> Session<'s> {
    pub fn new(sink: &'s mut dyn DisplaySink, repaint: RepaintPolicy) -> Self {
        Session {
            interpreter: Interpreter::new(),
            decoder: StreamDecoder::new(),
            presenter: Presenter::new(),
            sink,
            repaint,
            chunk_size: DEFAULT_CHUNK_SIZE,
            interrupt: None,
        }
    }

    /// Stops processing at the next record boundary once `flag` is set.
    pub fn with_interrupt(mut self, flag: &'s AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    fn interrupted(&self) -> bool {
        self.interrupt.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Reads `reader` to the end (or to End-Of-Stream) and paints the result.
    /// Only read errors other than `Interrupted` fail the session.
    pub fn run<R: Read>(&mut self, mut reader: R) -> Result<StreamEnd> {
        let mut buf = vec![0u8; self.chunk_size];
        let end = loop {
            if self.interrupted() {
                break StreamEnd::Interrupted;
            }
            let n = match reader.read(&mut buf) {
                Ok(0) => break self.exhausted(),
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("Session: failed to read input stream"),
            };
            debug!("Session: read {} byte(s)", n);
            if let Some(end) = self.feed_bytes(&buf[..n]) {
                break end;
            }
        };
        self.repaint();
        info!(
            "Session: {:?} after {} record(s)",
            end,
            self.interpreter.records_seen()
        );
        Ok(end)
    }

    /// Feeds a chunk of the stream. Returns how the stream ended if it did so
    /// inside this chunk; bytes after an End-Of-Stream record are ignored.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<StreamEnd> {
        self.decoder.push(bytes);
        while let Some(record) = self.decoder.next_record() {
            if self.interrupted() {
                return Some(StreamEnd::Interrupted);
            }
            let keep_going = self.interpreter.feed(record.as_record());
            if self.repaint == RepaintPolicy::EveryCommand {
                self.repaint();
            }
            if !keep_going {
                return Some(StreamEnd::EndOfStream);
            }
        }
        None
    }

    /// Ends a stream whose source ran dry, painting whatever is outstanding.
    pub fn finish(&mut self) -> StreamEnd {
        let end = self.exhausted();
        self.repaint();
        end
    }

    fn exhausted(&self) -> StreamEnd {
        let trailing = self.decoder.pending_len();
        if trailing > 0 {
            warn!(
                "Session: stream ended inside a record; {} trailing byte(s) dropped",
                trailing
            );
        }
        StreamEnd::Exhausted { trailing }
    }

    fn repaint(&mut self) {
        let dirty = self.interpreter.take_dirty_lines();
        self.presenter.present(
            self.interpreter.frame(),
            self.interpreter.color_mode(),
            &dirty,
            &mut *self.sink,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;
    use crate::config::Config;
    use crate::protocol::StreamBuilder;
    use crate::sink::{ConsoleSink, HeadlessSink};
    use test_log::test;

    /// Hands out the wrapped bytes a few at a time.
    struct Dribble<'a> {
        bytes: &'a [u8],
        step: usize,
    }

    impl Read for Dribble<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.bytes.len());
            buf[..n].copy_from_slice(&self.bytes[..n]);
            self.bytes = &self.bytes[n..];
            Ok(n)
        }
    }

    fn hello_stream() -> Vec<u8> {
        let mut b = StreamBuilder::new();
        b.screen_setup(10, 3, 1);
        b.render_text(0, 0, 1, "hello").expect("text");
        b.draw_line(0, 2, 9, 2, 2, b'-');
        b.end_of_stream();
        b.into_bytes()
    }

    #[test]
    fn runs_stream_to_end_of_stream() {
        let bytes = hello_stream();
        let mut sink = HeadlessSink::default();
        let end = Session::new(&mut sink, RepaintPolicy::EveryCommand)
            .run(bytes.as_slice())
            .expect("run");
        assert_eq!(end, StreamEnd::EndOfStream);
        assert_eq!(sink.to_text(), "hello\n\n----------");
    }

    #[test]
    fn chunking_does_not_change_the_result() {
        let bytes = hello_stream();
        for step in [1, 2, 3, 7] {
            let mut sink = HeadlessSink::default();
            let end = Session::new(&mut sink, RepaintPolicy::EveryCommand)
                .with_chunk_size(5)
                .run(Dribble { bytes: &bytes, step })
                .expect("run");
            assert_eq!(end, StreamEnd::EndOfStream, "step {}", step);
            assert_eq!(sink.to_text(), "hello\n\n----------", "step {}", step);
        }
    }

    #[test]
    fn on_finish_presents_once() {
        let bytes = hello_stream();
        let mut sink = HeadlessSink::default();
        let mut session = Session::new(&mut sink, RepaintPolicy::OnFinish);
        session.run(bytes.as_slice()).expect("run");
        assert_eq!(session.presenter().presents(), 1);
        drop(session);
        assert_eq!(sink.presents(), 1);
        assert_eq!(sink.to_text(), "hello\n\n----------");
    }

    #[test]
    fn every_command_presents_after_each_change() {
        let bytes = hello_stream();
        let mut sink = HeadlessSink::default();
        Session::new(&mut sink, RepaintPolicy::EveryCommand)
            .run(bytes.as_slice())
            .expect("run");
        // Setup, text and line each change the frame; end-of-stream does not.
        assert_eq!(sink.presents(), 3);
    }

    #[test]
    fn color_mode_change_reaches_the_console_palette() {
        let mut b = StreamBuilder::new();
        b.screen_setup(4, 1, 1)
            .screen_setup(4, 1, 2)
            .draw_character(0, 0, 200, b'x')
            .end_of_stream();
        let bytes = b.into_bytes();

        let mut sink = ConsoleSink::with_writer(Vec::new(), 80, 24, &Config::default());
        let mut session = Session::new(&mut sink, RepaintPolicy::EveryCommand);
        session.run(bytes.as_slice()).expect("run");
        assert_eq!(session.interpreter().color_mode(), ColorMode::Extended);
        drop(session);

        assert_eq!(sink.palette().map(|p| p.size()), Some(256));
        let written = String::from_utf8_lossy(sink.get_ref()).into_owned();
        assert!(written.contains("\x1b[38;5;200mx"), "output: {:?}", written);
    }

    #[test]
    fn truncated_tail_is_reported_and_dropped() {
        let mut bytes = {
            let mut b = StreamBuilder::new();
            b.screen_setup(4, 1, 0);
            b.draw_character(1, 0, 0, b'x');
            b.into_bytes()
        };
        bytes.extend_from_slice(&[0x02, 0x04, 0x00]);
        let mut sink = HeadlessSink::default();
        let end = Session::new(&mut sink, RepaintPolicy::OnFinish)
            .run(bytes.as_slice())
            .expect("run");
        assert_eq!(end, StreamEnd::Exhausted { trailing: 3 });
        assert_eq!(sink.to_text(), " x");
    }

    #[test]
    fn bytes_after_end_of_stream_are_ignored() {
        let mut bytes = hello_stream();
        bytes.extend_from_slice(&[0x07, 0x00]);
        let mut sink = HeadlessSink::default();
        let mut session = Session::new(&mut sink, RepaintPolicy::EveryCommand);
        assert_eq!(session.feed_bytes(&bytes), Some(StreamEnd::EndOfStream));
        assert!(session.interpreter().is_stopped());
        drop(session);
        assert_eq!(sink.to_text(), "hello\n\n----------");
    }

    #[test]
    fn feed_then_finish() {
        let bytes = hello_stream();
        let body = &bytes[..bytes.len() - 2];
        let mut sink = HeadlessSink::default();
        let mut session = Session::new(&mut sink, RepaintPolicy::OnFinish);
        assert_eq!(session.feed_bytes(body), None);
        assert_eq!(session.finish(), StreamEnd::Exhausted { trailing: 0 });
        drop(session);
        assert_eq!(sink.to_text(), "hello\n\n----------");
    }

    #[test]
    fn interrupt_stops_at_record_boundary() {
        let flag = AtomicBool::new(true);
        let bytes = hello_stream();
        let mut sink = HeadlessSink::default();
        let mut session =
            Session::new(&mut sink, RepaintPolicy::EveryCommand).with_interrupt(&flag);
        assert_eq!(
            session.run(bytes.as_slice()).expect("run"),
            StreamEnd::Interrupted
        );
        assert_eq!(session.interpreter().records_seen(), 0);
        drop(session);
        assert_eq!(sink.dimensions(), (0, 0));
    }

    #[test]
    fn read_errors_fail_the_session() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "device gone"))
            }
        }
        let mut sink = HeadlessSink::default();
        let err = Session::new(&mut sink, RepaintPolicy::EveryCommand)
            .run(Broken)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("device gone"));
    }
}
