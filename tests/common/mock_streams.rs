//! Mock byte streams for exercising the line codec
//!
//! `MockStream` serves a fixed buffer and records writes; `ChunkedMockStream`
//! hands data out in predetermined chunk sizes to force partial reads.

use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Basic mock stream for simple read/write testing
pub struct MockStream {
    read_cursor: Cursor<Vec<u8>>,
    write_buffer: Vec<u8>,
}

impl MockStream {
    pub fn new() -> Self {
        Self::with_data(Vec::new())
    }

    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            read_cursor: Cursor::new(data.into()),
            write_buffer: Vec::new(),
        }
    }

    pub fn written(&self) -> &[u8] {
        &self.write_buffer
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.read_cursor).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, std::io::Error>> {
        self.write_buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Returns predetermined read sizes to test lines split across reads
pub struct ChunkedMockStream {
    data: Vec<u8>,
    position: usize,
    chunk_sizes: Vec<usize>,
    reads: usize,
}

impl ChunkedMockStream {
    pub fn new(data: impl Into<Vec<u8>>, chunk_sizes: Vec<usize>) -> Self {
        Self {
            data: data.into(),
            position: 0,
            chunk_sizes,
            reads: 0,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl AsyncRead for ChunkedMockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.position >= self.data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = self.data.len() - self.position;
        let chunk = self
            .chunk_sizes
            .get(self.reads)
            .copied()
            .unwrap_or(remaining);
        let count = chunk.min(remaining).min(buf.remaining());

        let start = self.position;
        buf.put_slice(&self.data[start..start + count]);
        self.position += count;
        self.reads += 1;
        Poll::Ready(Ok(()))
    }
}
