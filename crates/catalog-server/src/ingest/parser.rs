//! Streaming CSV parser with bounded-memory batching
//!
//! The first line is a header; each subsequent line maps positionally onto
//! the header names to form a [`RawRecord`]. Blank lines are skipped and
//! field values are trimmed.
//!
//! Backpressure is expressed as a bounded-channel producer/consumer: a
//! spawned producer task reads records from the source and sends them into
//! a `tokio::sync::mpsc` channel whose capacity equals the batch size. The
//! producer suspends on a full channel, so while a batch handler is running
//! the source is read at most `batch_size` records ahead.

use std::future::Future;
use std::mem;

use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use super::models::RawRecord;
use super::IngestError;

/// Pull interface over a CSV source, yielding fixed-size record batches
///
/// `next_batch` returns batches of exactly `batch_size` records, then one
/// final short batch at end of input, then `None`. An input with no data
/// rows still yields a single empty batch, so downstream always observes a
/// final flush.
pub struct CsvBatchStream {
    rx: mpsc::Receiver<Result<RawRecord, csv_async::Error>>,
    batch_size: usize,
    buffer: Vec<RawRecord>,
    emitted: bool,
    finished: bool,
}

impl CsvBatchStream {
    /// Start reading `reader` in a background producer task
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    pub fn new<R>(reader: R, batch_size: usize) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        assert!(batch_size > 0, "batch size must be positive");
        let (tx, rx) = mpsc::channel(batch_size);
        tokio::spawn(read_records(reader, tx));
        Self {
            rx,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            emitted: false,
            finished: false,
        }
    }

    /// Next batch in input order, or `None` once the source is exhausted
    ///
    /// A structural CSV error aborts the stream; later calls return `None`.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<RawRecord>>, IngestError> {
        if self.finished {
            return Ok(None);
        }

        while let Some(item) = self.rx.recv().await {
            match item {
                Ok(record) => {
                    self.buffer.push(record);
                    if self.buffer.len() == self.batch_size {
                        self.emitted = true;
                        let batch =
                            mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
                        return Ok(Some(batch));
                    }
                },
                Err(e) => {
                    self.finished = true;
                    return Err(IngestError::Parse(e));
                },
            }
        }

        // Source exhausted: flush the remainder. Emit an empty final batch
        // only when no batch has been produced at all.
        self.finished = true;
        if self.buffer.is_empty() && self.emitted {
            Ok(None)
        } else {
            Ok(Some(mem::take(&mut self.buffer)))
        }
    }
}

/// Producer half: reads CSV records and feeds the bounded channel
///
/// Exits when the source is exhausted, on the first structural error, or
/// when the consumer hangs up (cancelled run).
async fn read_records<R>(reader: R, tx: mpsc::Sender<Result<RawRecord, csv_async::Error>>)
where
    R: AsyncRead + Send + Unpin,
{
    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .create_reader(reader);

    let headers = match rdr.headers().await {
        Ok(headers) => headers.clone(),
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return;
        },
    };

    let mut record = StringRecord::new();
    loop {
        match rdr.read_record(&mut record).await {
            Ok(true) => {
                let row: RawRecord = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(header, value)| (header.to_string(), value.to_string()))
                    .collect();
                if tx.send(Ok(row)).await.is_err() {
                    return;
                }
            },
            Ok(false) => return,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            },
        }
    }
}

/// Push form of the streaming parser
///
/// Invokes `on_batch` once per batch, strictly sequentially and in input
/// order, awaiting each call before the source is read further than the
/// channel allows. An `on_batch` error aborts the run as
/// [`IngestError::Batch`]; a structural CSV error as [`IngestError::Parse`].
pub async fn parse_csv_stream<R, F, Fut>(
    reader: R,
    batch_size: usize,
    mut on_batch: F,
) -> Result<(), IngestError>
where
    R: AsyncRead + Send + Unpin + 'static,
    F: FnMut(Vec<RawRecord>) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut stream = CsvBatchStream::new(reader, batch_size);
    while let Some(batch) = stream.next_batch().await? {
        on_batch(batch).await.map_err(IngestError::Batch)?;
    }
    Ok(())
}

/// Fully materialize a small CSV input into ordered records
///
/// Convenience for tests and small fixtures only; large uploads go through
/// [`parse_csv_stream`] to keep memory bounded.
pub fn parse_csv_str(content: &str) -> Result<Vec<RawRecord>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.to_string(), value.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use std::time::Duration;

    use tokio::io::ReadBuf;
    use tokio::sync::Notify;

    use super::*;

    fn reader(content: &str) -> Cursor<Vec<u8>> {
        Cursor::new(content.as_bytes().to_vec())
    }

    /// Reader that tracks how many bytes the consumer has pulled
    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        bytes_read: Arc<AtomicUsize>,
    }

    impl AsyncRead for CountingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let this = self.get_mut();
            let before = buf.filled().len();
            let result = Pin::new(&mut this.inner).poll_read(cx, buf);
            if let Poll::Ready(Ok(())) = result {
                this.bytes_read
                    .fetch_add(buf.filled().len() - before, Ordering::Relaxed);
            }
            result
        }
    }

    fn numbered_csv(rows: usize) -> String {
        let mut csv = String::from("sku,name,brand,mrp,price\n");
        for i in 1..=rows {
            csv.push_str(&format!("SKU-{i},Item {i},Brand,100,90\n"));
        }
        csv
    }

    async fn collect_batches(content: &str, batch_size: usize) -> Vec<Vec<RawRecord>> {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let sink = batches.clone();
        parse_csv_stream(reader(content), batch_size, move |batch| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(batch);
                Ok(())
            }
        })
        .await
        .unwrap();
        Arc::try_unwrap(batches).unwrap().into_inner().unwrap()
    }

    #[tokio::test]
    async fn test_batch_count_is_ceil_of_rows_over_size() {
        // 10 rows, batch size 3 -> 4 calls sized 3,3,3,1
        let batches = collect_batches(&numbered_csv(10), 3).await;
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3, 3, 1]);
    }

    #[tokio::test]
    async fn test_evenly_divisible_input_has_no_trailing_flush() {
        let batches = collect_batches(&numbered_csv(6), 3).await;
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3]);
    }

    #[tokio::test]
    async fn test_empty_input_flushes_once() {
        let batches = collect_batches("sku,name,brand,mrp,price\n", 3).await;
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
    }

    #[tokio::test]
    async fn test_row_order_preserved_across_batches() {
        let batches = collect_batches(&numbered_csv(7), 2).await;
        let skus: Vec<String> =
            batches.into_iter().flatten().map(|r| r["sku"].clone()).collect();
        let expected: Vec<String> = (1..=7).map(|i| format!("SKU-{i}")).collect();
        assert_eq!(skus, expected);
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let csv = "sku,name,brand,mrp,price\nA,One,B,10,9\n\n\nB,Two,B,10,9\n\n";
        let batches = collect_batches(csv, 10).await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][1]["sku"], "B");
    }

    #[tokio::test]
    async fn test_fields_are_trimmed_and_mapped_to_headers() {
        let csv = "sku, name ,brand,mrp,price\n TSHIRT-001 , Tee ,Brand, 799 ,499\n";
        let batches = collect_batches(csv, 10).await;
        let row = &batches[0][0];
        assert_eq!(row["sku"], "TSHIRT-001");
        assert_eq!(row["name"], "Tee");
        assert_eq!(row["mrp"], "799");
    }

    #[tokio::test]
    async fn test_ragged_row_is_a_parse_error() {
        let csv = "sku,name,brand,mrp,price\nA,One,B,10,9\nA,One\n";
        let result = parse_csv_stream(reader(csv), 10, |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(IngestError::Parse(_))));
    }

    #[tokio::test]
    async fn test_batch_handler_error_aborts_the_run() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let result = parse_csv_stream(reader(&numbered_csv(10)), 2, move |_| {
            let counter = counter.clone();
            async move {
                let mut calls = counter.lock().unwrap();
                *calls += 1;
                if *calls == 2 {
                    anyhow::bail!("handler refused batch");
                }
                Ok(())
            }
        })
        .await;
        assert!(matches!(result, Err(IngestError::Batch(_))));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_producer_suspends_while_a_batch_is_in_flight() {
        // Rows large enough that io-buffer readahead is small relative to
        // the input, so an unbounded producer would be clearly visible.
        const ROW_LEN: usize = 4096;
        const ROWS: usize = 64;
        const BATCH: usize = 2;

        let mut csv = String::from("sku,name,brand,mrp,price\n");
        let header_len = csv.len();
        for i in 0..ROWS {
            let skeleton = format!("SKU-{i:04},,Brand,100,90\n");
            let padding = "x".repeat(ROW_LEN - skeleton.len());
            csv.push_str(&format!("SKU-{i:04},{padding},Brand,100,90\n"));
        }
        let total_len = csv.len();

        let bytes_read = Arc::new(AtomicUsize::new(0));
        let counting = CountingReader {
            inner: Cursor::new(csv.into_bytes()),
            bytes_read: bytes_read.clone(),
        };

        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handler = {
            let entered = entered.clone();
            let release = release.clone();
            let calls = calls.clone();
            move |_batch: Vec<RawRecord>| {
                let entered = entered.clone();
                let release = release.clone();
                let calls = calls.clone();
                async move {
                    // Block on the first batch only.
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        entered.notify_one();
                        release.notified().await;
                    }
                    Ok(())
                }
            }
        };

        let run = tokio::spawn(parse_csv_stream(counting, BATCH, handler));

        // First batch delivered; the handler is now parked.
        entered.notified().await;
        // Give an unbounded producer ample opportunity to run ahead.
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Delivered batch + full channel + one in-flight record, plus the
        // reader's internal io buffer.
        let ceiling = header_len + (2 * BATCH + 1) * ROW_LEN + 64 * 1024;
        let read = bytes_read.load(Ordering::Relaxed);
        assert!(
            read <= ceiling,
            "producer read {read} bytes of {total_len} while the consumer was blocked (ceiling {ceiling})"
        );

        release.notify_one();
        run.await.unwrap().unwrap();
        assert_eq!(bytes_read.load(Ordering::Relaxed), total_len);
        assert_eq!(calls.load(Ordering::SeqCst), ROWS / BATCH);
    }

    #[tokio::test]
    async fn test_pull_interface_final_flush() {
        let mut stream = CsvBatchStream::new(reader(&numbered_csv(5)), 2);
        let mut sizes = Vec::new();
        while let Some(batch) = stream.next_batch().await.unwrap() {
            sizes.push(batch.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
        // Exhausted streams stay exhausted.
        assert!(stream.next_batch().await.unwrap().is_none());
    }

    #[test]
    fn test_parse_csv_str_convenience() {
        let rows = parse_csv_str("sku,name\nA, One \n\nB,Two\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "One");
        assert_eq!(rows[1]["sku"], "B");
    }

    #[test]
    fn test_parse_csv_str_reports_malformed_input() {
        assert!(parse_csv_str("sku,name\nA\n").is_err());
    }
}
