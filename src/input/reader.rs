use crate::error::{Result, SnazyError};
use std::fmt;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

/// Lines buffered between the reader task and the consumer
pub const CHANNEL_CAPACITY: usize = 1024;

/// How long a followed file is left alone after hitting EOF
const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` names standard input, anything else a file
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            InputSource::Stdin
        } else {
            InputSource::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => f.write_str("<stdin>"),
            InputSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Options for reading lines
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Keep tailing the last file after EOF
    pub follow: bool,
    /// Bound of the hand-off channel
    pub capacity: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            follow: false,
            capacity: CHANNEL_CAPACITY,
        }
    }
}

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// A stream of raw lines produced by a background reader task.
///
/// Dropping the stream closes the channel; the reader notices on its next
/// send (or poll, when following) and exits.
pub struct LineStream {
    /// Receiver for lines or a terminal read error
    receiver: mpsc::Receiver<Result<String>>,
    /// Handle to the background task
    _task_handle: tokio::task::JoinHandle<()>,
}

impl LineStream {
    /// Open every source up front and start reading them in order.
    ///
    /// # Returns
    /// * `Ok(LineStream)` - All sources opened
    /// * `Err(SnazyError::InputError)` - A file could not be opened
    pub async fn open(sources: &[InputSource], options: ReadOptions) -> Result<Self> {
        let mut readers: Vec<(String, BoxedReader)> = Vec::with_capacity(sources.len());
        for source in sources {
            let reader: BoxedReader = match source {
                InputSource::Stdin => Box::new(tokio::io::stdin()),
                InputSource::File(path) => {
                    let file = File::open(path)
                        .await
                        .map_err(|e| SnazyError::InputError(source.to_string(), e))?;
                    Box::new(file)
                }
            };
            readers.push((source.to_string(), reader));
        }

        // Only a trailing file can be tailed; stdin ends when its writer does
        let follow = options.follow && matches!(sources.last(), Some(InputSource::File(_)));
        Ok(Self::spawn(readers, follow, options.capacity))
    }

    /// Read lines from an arbitrary reader
    pub fn from_reader<R>(reader: R, options: ReadOptions) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        Self::spawn(
            vec![("<reader>".to_string(), reader)],
            options.follow,
            options.capacity,
        )
    }

    fn spawn(readers: Vec<(String, BoxedReader)>, follow: bool, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let count = readers.len();

        let task_handle = tokio::spawn(async move {
            for (index, (name, reader)) in readers.into_iter().enumerate() {
                let tail = follow && index + 1 == count;
                tracing::debug!(input = %name, follow = tail, "Reading input");
                if !pump(reader, &tx, tail).await {
                    break;
                }
            }
        });

        Self {
            receiver: rx,
            _task_handle: task_handle,
        }
    }

    /// Receive the next line
    ///
    /// # Returns
    /// * `Some(Ok(line))` - Next line, without its terminator
    /// * `Some(Err(_))` - Reading failed; no more lines follow
    /// * `None` - All input consumed
    pub async fn next(&mut self) -> Option<Result<String>> {
        self.receiver.recv().await
    }

    /// Whether no line is ready right now
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Forward lines from one reader. Returns false when the stream should stop
/// (consumer gone or read error).
async fn pump(reader: BoxedReader, tx: &mpsc::Sender<Result<String>>, follow: bool) -> bool {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                if !follow {
                    return true;
                }
                if tx.is_closed() {
                    return false;
                }
                sleep(FOLLOW_POLL_INTERVAL).await;
            }
            Ok(_) => {
                // A partial line of a followed file waits for the rest of it
                if follow && buf.last() != Some(&b'\n') {
                    continue;
                }
                let line = decode_line(&buf);
                buf.clear();
                if tx.send(Ok(line)).await.is_err() {
                    return false;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Read error, stopping input");
                let _ = tx.send(Err(SnazyError::ReadError(e))).await;
                return false;
            }
        }
    }
}

/// Strip the line terminator and decode, replacing invalid UTF-8
pub fn decode_line(bytes: &[u8]) -> String {
    let mut end = bytes.len();
    if end > 0 && bytes[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && bytes[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
