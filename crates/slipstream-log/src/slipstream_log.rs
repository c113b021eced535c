use chrono::Local;
use log::{Level, Log, SetLoggerError, set_boxed_logger, set_max_level};
use std::io::{BufWriter, Write, stdout};
use std::sync::mpsc;
use std::thread;

enum Command {
    Record(String),
    Flush,
}

/// Stdout logger that never blocks the caller on terminal I/O: records are
/// formatted on the logging thread and handed to a dedicated writer thread
/// over a bounded channel. When the channel is full the record is dropped.
pub struct SlipstreamLogger {
    max_level: Level,
    sender: mpsc::SyncSender<Command>,
}

impl SlipstreamLogger {
    /// Installs the logger as the global `log` backend. `buffer` is the
    /// number of records held between the caller and the writer thread.
    pub fn init(max_level: Level, buffer: usize) -> Result<(), SetLoggerError> {
        let (sender, receiver) = mpsc::sync_channel(buffer);

        thread::Builder::new()
            .name("slipstream-log".into())
            .spawn(move || writer_loop(receiver))
            .expect("failed to spawn log writer thread");

        set_boxed_logger(Box::new(SlipstreamLogger { max_level, sender }))?;
        set_max_level(max_level.to_level_filter());
        Ok(())
    }
}

fn writer_loop(receiver: mpsc::Receiver<Command>) {
    let mut writer = BufWriter::new(stdout());
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Record(line) => {
                if let Err(e) = writer.write_all(line.as_bytes()) {
                    eprintln!("[SlipstreamLogger] failed to write record: {}", e);
                }
            }
            Command::Flush => {
                if let Err(e) = writer.flush() {
                    eprintln!("[SlipstreamLogger] failed to flush: {}", e);
                }
            }
        }
    }
    // channel closed, push out whatever is buffered
    let _ = writer.flush();
}

impl Log for SlipstreamLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let now = Local::now();
            let line = format!(
                "{} {:5} [{}] {}\n",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );
            let _ = self.sender.try_send(Command::Record(line));
        }
    }

    fn flush(&self) {
        let _ = self.sender.send(Command::Flush);
    }
}
