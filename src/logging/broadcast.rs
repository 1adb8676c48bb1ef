use super::state::LOG_BROADCAST_TX;
use std::io::{self, Write};
use tokio::sync::broadcast;
use tracing_subscriber::fmt::writer::MakeWriter;

const LOG_CHANNEL_CAPACITY: usize = 1024;

/// Hands each formatted event to the broadcast channel as one line
#[derive(Clone)]
pub struct BroadcastMakeWriter {
    pub(crate) tx: broadcast::Sender<String>,
}

pub struct BroadcastWriter {
    tx: broadcast::Sender<String>,
    buffer: Vec<u8>,
}

impl<'a> MakeWriter<'a> for BroadcastMakeWriter {
    type Writer = BroadcastWriter;
    fn make_writer(&'a self) -> Self::Writer {
        BroadcastWriter {
            tx: self.tx.clone(),
            buffer: Vec::with_capacity(256),
        }
    }
}

impl Write for BroadcastWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for BroadcastWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end_matches(['\n', '\r']);
        // No subscribers is the normal case
        let _ = self.tx.send(line.to_string());
    }
}

pub fn get_or_init_log_tx() -> broadcast::Sender<String> {
    LOG_BROADCAST_TX
        .get_or_init(|| broadcast::channel::<String>(LOG_CHANNEL_CAPACITY).0)
        .clone()
}

/// Subscribe to a stream of formatted log lines
pub fn subscribe_log_lines() -> broadcast::Receiver<String> {
    get_or_init_log_tx().subscribe()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sends_one_trimmed_line_on_drop() {
        let (tx, mut rx) = broadcast::channel(4);
        let make = BroadcastMakeWriter { tx };
        {
            let mut w = make.make_writer();
            w.write_all(b"2026-10-19T10:00:00Z  INFO ").unwrap();
            w.write_all(b"refresh cycle applied\r\n").unwrap();
        }
        let line = rx.try_recv().unwrap();
        assert_eq!(line, "2026-10-19T10:00:00Z  INFO refresh cycle applied");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn empty_writer_sends_nothing() {
        let (tx, mut rx) = broadcast::channel(4);
        drop(BroadcastMakeWriter { tx }.make_writer());
        assert!(rx.try_recv().is_err());
    }
}
