use std::{
    fs,
    io::{self, BufRead, BufReader, Read},
    mem,
    path::Path,
    thread::{self, JoinHandle},
};

use crossbeam::channel::{Receiver, Sender};
use thiserror::Error;
use xz2::read::XzDecoder;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read address stream: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: `{content}` is not a valid address")]
    Parse { line: usize, content: String },
}

pub type Block = Result<Vec<u64>, TraceError>;

/// Parses one line of an address stream. Blank lines yield `None`.
pub fn parse_address(text: &str, line: usize) -> Result<Option<u64>, TraceError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    match parsed {
        Ok(addr) => Ok(Some(addr)),
        Err(_) => Err(TraceError::Parse {
            line,
            content: text.to_string(),
        }),
    }
}

/// Address stream decoded on a background thread and handed over in blocks.
///
/// The channel closes after the last block, or right after the first error.
pub struct Trace {
    pub rec: Receiver<Block>,
    _thread: JoinHandle<()>,
}

impl Trace {
    pub fn read(
        path: impl AsRef<Path>,
        addrs_per_block: usize,
        blocks_per_queue: usize,
    ) -> io::Result<Trace> {
        let path = path.as_ref();
        let stream = fs::File::open(path)?;
        let reader: Box<dyn Read + Send> = if path.extension().is_some_and(|ext| ext == "xz") {
            Box::new(XzDecoder::new(stream))
        } else {
            Box::new(stream)
        };
        Ok(Trace::from_reader(reader, addrs_per_block, blocks_per_queue))
    }

    pub fn from_reader<R: Read + Send + 'static>(
        reader: R,
        addrs_per_block: usize,
        blocks_per_queue: usize,
    ) -> Trace {
        let (sender, receiver) = crossbeam::channel::bounded(blocks_per_queue);
        let addrs_per_block = addrs_per_block.max(1);

        let t = thread::spawn(move || Trace::run_thread(reader, addrs_per_block, sender));

        Trace {
            rec: receiver,
            _thread: t,
        }
    }

    fn run_thread<R: Read>(stream: R, addrs_per_block: usize, queue: Sender<Block>) {
        let mut buffer = Vec::with_capacity(addrs_per_block);
        for (idx, line) in BufReader::new(stream).lines().enumerate() {
            let parsed = line
                .map_err(TraceError::from)
                .and_then(|text| parse_address(&text, idx + 1));
            match parsed {
                Ok(None) => {}
                Ok(Some(addr)) => {
                    buffer.push(addr);
                    if buffer.len() == addrs_per_block {
                        let full = mem::replace(&mut buffer, Vec::with_capacity(addrs_per_block));
                        if queue.send(Ok(full)).is_err() {
                            // Receiver hung up
                            return;
                        }
                    }
                }
                Err(err) => {
                    let _ = queue.send(Err(err));
                    return;
                }
            }
        }
        if !buffer.is_empty() {
            let _ = queue.send(Ok(buffer));
        }
    }
}
