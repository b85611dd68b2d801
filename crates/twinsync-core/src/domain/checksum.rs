//! Rolling checksum
//!
//! A 64-bit Adler-class checksum: two running sums modulo the largest
//! prime below 2^32, packed as `(b << 32) | a`. State can be fed in any
//! number of chunks and yields the same value as a one-shot pass, which is
//! what lets two streams be compared chunk by chunk and abandoned at the
//! first divergence.

use std::io::{self, Read};

/// Largest prime below 2^32
const MODULUS: u64 = 4_294_967_291;

/// Bytes folded between two modulo reductions
///
/// With `a` and `b` below 2^32 on entry, 4096 additions keep `b` well below
/// 2^64.
const REDUCE_EVERY: usize = 4096;

/// Streaming, resumable checksum state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingChecksum {
    a: u64,
    b: u64,
    length: u64,
}

impl RollingChecksum {
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 1,
            b: 0,
            length: 0,
        }
    }

    /// Folds `bytes` into the running state
    pub fn update(&mut self, bytes: &[u8]) {
        for block in bytes.chunks(REDUCE_EVERY) {
            for &byte in block {
                self.a += u64::from(byte);
                self.b += self.a;
            }
            self.a %= MODULUS;
            self.b %= MODULUS;
        }
        self.length += bytes.len() as u64;
    }

    /// Current checksum value
    #[must_use]
    pub fn value(&self) -> u64 {
        (self.b << 32) | self.a
    }

    /// Total number of bytes folded so far
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// One-shot checksum of a byte slice
    #[must_use]
    pub fn of(bytes: &[u8]) -> u64 {
        let mut checksum = Self::new();
        checksum.update(bytes);
        checksum.value()
    }
}

impl Default for RollingChecksum {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads until `buf` is full or the stream ends
///
/// Returns the number of bytes placed in `buf`; fewer than `buf.len()` means
/// EOF was reached. Interrupted reads are retried.
pub fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Which side of a comparison an I/O error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSide {
    Left,
    Right,
}

/// Failure while comparing two streams
#[derive(Debug)]
pub enum CompareError<E> {
    /// Reading one of the streams failed
    Io(StreamSide, io::Error),
    /// The per-chunk hook aborted the comparison
    Aborted(E),
}

/// Outcome of [`compare_streams`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamComparison {
    /// Both streams ended with the same cumulative checksum
    Equal(u64),
    /// The running checksums diverged; reading stopped there
    Different,
}

impl StreamComparison {
    #[must_use]
    pub fn is_equal(&self) -> bool {
        matches!(self, StreamComparison::Equal(_))
    }
}

/// Compares two streams chunk by chunk, stopping at the first divergence
///
/// Matching chunks of `chunk_size` bytes are read from both streams in
/// lockstep and the two rolling values are compared after every chunk.
/// `on_chunk` receives the number of bytes consumed from each stream so far
/// and may abort the comparison by returning an error.
pub fn compare_streams<L, R, E, F>(
    left: &mut L,
    right: &mut R,
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<StreamComparison, CompareError<E>>
where
    L: Read + ?Sized,
    R: Read + ?Sized,
    F: FnMut(u64) -> Result<(), E>,
{
    let chunk_size = chunk_size.max(1);
    let mut left_buf = vec![0u8; chunk_size];
    let mut right_buf = vec![0u8; chunk_size];
    let mut left_sum = RollingChecksum::new();
    let mut right_sum = RollingChecksum::new();

    loop {
        let left_read = read_chunk(left, &mut left_buf)
            .map_err(|e| CompareError::Io(StreamSide::Left, e))?;
        let right_read = read_chunk(right, &mut right_buf)
            .map_err(|e| CompareError::Io(StreamSide::Right, e))?;

        left_sum.update(&left_buf[..left_read]);
        right_sum.update(&right_buf[..right_read]);

        if left_read != right_read || left_sum.value() != right_sum.value() {
            return Ok(StreamComparison::Different);
        }

        on_chunk(left_sum.length()).map_err(CompareError::Aborted)?;

        if left_read < chunk_size {
            return Ok(StreamComparison::Equal(left_sum.value()));
        }
    }
}
