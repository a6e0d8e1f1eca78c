//! Synchronous snappy framing pipeline.
//!
//! Both directions move data in chunks of [`CHUNK_SIZE`] bytes. On the
//! compression side every full chunk becomes exactly one frame.

use std::io::{self, Read, Write};

use snap::read::FrameDecoder;
use snap::write::FrameEncoder;

use super::counting::{CountingReader, CountingWriter};
use crate::config::{StreamSummary, CHUNK_SIZE, STREAM_IDENTIFIER, STREAM_PROGRESS_STEP};
use crate::error::{Error, Result};
use crate::progress::{Progress, ProgressSink, Throttle};

/// Compresses data from a reader into a writer using the snappy framing format.
///
/// # Parameters
///
/// * `reader` - Input source implementing [`Read`] trait
/// * `writer` - Output destination implementing [`Write`] trait
/// * `expected` - Expected input length, used as progress total
/// * `progress` - Receives `"  {pct}%   {done} / {total} = {ratio}"` lines
///
/// # Returns
///
/// Returns a [`StreamSummary`] containing statistics about bytes read and written.
/// Empty input still yields a stream consisting of the stream identifier.
///
/// # Errors
///
/// This function will return an error if:
///
/// - Reading from `reader` fails
/// - Writing to `writer` fails
pub fn compress<R, W>(
    mut reader: R,
    writer: W,
    expected: u64,
    progress: &mut dyn ProgressSink,
) -> Result<StreamSummary>
where
    R: Read,
    W: Write,
{
    let mut state = Progress::new(expected, Throttle::Step(STREAM_PROGRESS_STEP));
    let mut encoder = FrameEncoder::new(CountingWriter::new(writer));
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut total_in = 0u64;

    loop {
        let filled = read_chunk(&mut reader, &mut chunk)?;
        if filled == 0 {
            break;
        }

        // Flushing per chunk keeps frames aligned with chunks.
        encoder
            .write_all(&chunk[..filled])
            .map_err(Error::from_codec_io)?;
        encoder.flush().map_err(Error::from_codec_io)?;
        total_in += filled as u64;

        if state.advance(filled as u64) {
            progress.update(&state.ratio_line(encoder.get_ref().count()));
        }
        if filled < CHUNK_SIZE {
            break;
        }
    }

    let mut output = encoder
        .into_inner()
        .map_err(|err| Error::Io(io::Error::new(err.error().kind(), err.error().to_string())))?;
    if output.count() == 0 {
        output.write_all(&STREAM_IDENTIFIER)?;
    }
    output.flush()?;

    state.complete();
    progress.update(&state.ratio_line(output.count()));
    progress.finish();

    Ok(StreamSummary::new(total_in, output.count()))
}

/// Decompresses a snappy framed stream from a reader into a writer.
///
/// # Parameters
///
/// * `reader` - Input source implementing [`Read`] trait
/// * `writer` - Output destination implementing [`Write`] trait
/// * `expected` - Expected length of the compressed input, used as progress total
/// * `progress` - Receives `"  {pct}%   {done} / {total}"` lines, measured on the input
///
/// # Returns
///
/// Returns a [`StreamSummary`] containing statistics about bytes read and written.
///
/// # Errors
///
/// This function will return an error if:
///
/// - The stream is malformed or fails its checksums ([`Error::Codec`])
/// - I/O operations on reader or writer fail
pub fn decompress<R, W>(
    reader: R,
    mut writer: W,
    expected: u64,
    progress: &mut dyn ProgressSink,
) -> Result<StreamSummary>
where
    R: Read,
    W: Write,
{
    let mut state = Progress::new(expected, Throttle::Step(STREAM_PROGRESS_STEP));
    let mut decoder = FrameDecoder::new(CountingReader::new(reader));
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut total_out = 0u64;

    loop {
        let filled = read_chunk(&mut decoder, &mut chunk).map_err(Error::from_codec_io)?;
        if filled > 0 {
            writer.write_all(&chunk[..filled])?;
            total_out += filled as u64;
        }

        let consumed = decoder.get_ref().count();
        if state.advance(consumed - state.done()) {
            progress.update(&state.bytes_line());
        }
        if filled < CHUNK_SIZE {
            break;
        }
    }
    writer.flush()?;

    state.complete();
    progress.update(&state.bytes_line());
    progress.finish();

    Ok(StreamSummary::new(decoder.get_ref().count(), total_out))
}

/// Fills `buf` from `reader` until it is full or the reader is exhausted.
///
/// Retries reads interrupted by signals.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
