/*!
 * Online Arrivals
 *
 * Line-oriented command streams feeding the online scheduler. Polling never
 * blocks the driver; a reader thread only forwards lines over a channel and
 * never touches scheduling state.
 */

use flume::{Receiver, TryRecvError};
use log::{debug, warn};
use std::collections::VecDeque;
use std::io::BufRead;
use std::thread;

/// Lines that arrived since the previous poll
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Polled {
    pub lines: Vec<String>,
    /// No more lines will ever arrive
    pub closed: bool,
}

pub trait ArrivalSource {
    fn poll(&mut self) -> Polled;
}

/// Arrivals read from any line reader (stdin in production)
pub struct ReaderArrivals {
    rx: Receiver<String>,
    closed: bool,
}

impl ReaderArrivals {
    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = flume::unbounded();
        thread::Builder::new()
            .name("arrivals".into())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Arrival stream read error: {}", e);
                            break;
                        }
                    }
                }
                debug!("Arrival stream reached end of input");
            })
            .map(|_| ())
            .unwrap_or_else(|e| warn!("Failed to start arrival reader: {}", e));
        Self { rx, closed: false }
    }

    pub fn stdin() -> Self {
        Self::spawn(std::io::BufReader::new(std::io::stdin()))
    }
}

impl ArrivalSource for ReaderArrivals {
    fn poll(&mut self) -> Polled {
        let mut polled = Polled::default();
        if self.closed {
            polled.closed = true;
            return polled;
        }
        loop {
            match self.rx.try_recv() {
                Ok(line) => polled.lines.push(line.trim_end_matches('\r').to_string()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    polled.closed = true;
                    break;
                }
            }
        }
        polled
    }
}

/// Pre-recorded arrival batches, one batch per poll
#[derive(Debug, Default)]
pub struct ScriptedArrivals {
    batches: VecDeque<Vec<String>>,
    close_when_drained: bool,
}

impl ScriptedArrivals {
    pub fn new<I, B, S>(batches: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            batches: batches
                .into_iter()
                .map(|b| b.into_iter().map(Into::into).collect())
                .collect(),
            close_when_drained: true,
        }
    }

    /// Keep reporting empty polls instead of closing once drained
    pub fn keep_open(mut self) -> Self {
        self.close_when_drained = false;
        self
    }
}

impl ArrivalSource for ScriptedArrivals {
    fn poll(&mut self) -> Polled {
        let lines = self.batches.pop_front().unwrap_or_default();
        Polled {
            lines,
            closed: self.close_when_drained && self.batches.is_empty(),
        }
    }
}
