//! Replays a JSON-lines event log into the `FromNet` channel, one message per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{Sender, unbounded};
use rs_utils::{FromNet, FromNetMessage};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot open feed {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("feed read failed: {0}")]
    Read(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

pub fn parse_line(line_no: usize, line: &str) -> Result<Option<FromNetMessage>, FeedError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| FeedError::Parse {
            line: line_no,
            source,
        })
}

/// Forwards every parseable line; bad lines are logged and skipped. Stops early
/// when the receiver is gone. Returns the number of messages sent.
pub fn pump<R: BufRead>(
    reader: R,
    to_client: &Sender<FromNetMessage>,
    interval: Duration,
) -> Result<usize, FeedError> {
    let mut sent = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let message = match parse_line(index + 1, &line) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(err) => {
                warn!(%err, "skipping feed line");
                continue;
            }
        };
        if to_client.send(message).is_err() {
            break;
        }
        sent += 1;
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    Ok(sent)
}

fn open(path: &Path) -> Result<Box<dyn BufRead + Send>, FeedError> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|source| FeedError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

pub fn start_feed_thread(path: PathBuf, interval: Duration) -> Result<FromNet, FeedError> {
    let reader = open(&path)?;
    let (to_client, from_feed) = unbounded();
    thread::spawn(move || match pump(reader, &to_client, interval) {
        Ok(sent) => info!(sent, path = %path.display(), "feed finished"),
        Err(err) => warn!(%err, "feed stopped"),
    });
    Ok(FromNet(from_feed))
}
