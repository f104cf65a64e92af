//! Chunked, retrying fan-out over [`FplApi::fetch`].

use crate::client::FplApi;
use futures_util::future::join_all;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;

/// Drives many paths through the fetcher, `concurrency` at a time.
///
/// Chunks run strictly one after another with `chunk_pause` in between.
/// Paths that fail a pass are retried as a new set, up to `max_retries`
/// more passes, with exponential backoff between passes. Anything still
/// failing resolves to `None`.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    pub concurrency: usize,
    pub max_retries: u32,
    pub chunk_pause: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_retries: 2,
            chunk_pause: Duration::from_millis(200),
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(4),
        }
    }
}

impl BatchScheduler {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency: concurrency.max(1), ..Self::default() }
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_pause(mut self, chunk_pause: Duration) -> Self {
        self.chunk_pause = chunk_pause;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_max = max;
        self
    }

    /// Delay before retry pass `attempt + 1`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    /// Fetch every path. The output has the same length and order as
    /// `paths`. `on_progress(done, total)` fires after each chunk, where
    /// `done` counts slots that are final (fetched, or given up on).
    pub async fn run<T, F>(
        &self,
        api: &FplApi,
        paths: &[String],
        current_event: Option<u32>,
        mut on_progress: F,
    ) -> Vec<Option<T>>
    where
        T: DeserializeOwned,
        F: FnMut(usize, usize),
    {
        let total = paths.len();
        let mut results: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut pending: Vec<usize> = (0..total).collect();
        let mut done = 0;
        let mut attempt = 0;
        let concurrency = self.concurrency.max(1);

        while !pending.is_empty() {
            let last_pass = attempt >= self.max_retries;
            let mut failed = Vec::new();
            let chunk_count = pending.len().div_ceil(concurrency);

            for (n, chunk) in pending.chunks(concurrency).enumerate() {
                let outcomes = join_all(
                    chunk
                        .iter()
                        .map(|&i| api.fetch::<T>(&paths[i], current_event)),
                )
                .await;

                for (&i, outcome) in chunk.iter().zip(outcomes) {
                    match outcome {
                        Ok(value) => {
                            results[i] = Some(value);
                            done += 1;
                        }
                        Err(e) if last_pass => {
                            warn!("giving up on {} after {} attempt(s): {e}", paths[i], attempt + 1);
                            done += 1;
                        }
                        Err(e) => {
                            debug!("attempt {} failed for {}: {e}", attempt + 1, paths[i]);
                            failed.push(i);
                        }
                    }
                }

                on_progress(done, total);

                if n + 1 < chunk_count {
                    sleep(self.chunk_pause).await;
                }
            }

            if failed.is_empty() {
                break;
            }

            let delay = self.backoff_delay(attempt);
            debug!("retrying {} path(s) in {delay:?}", failed.len());
            sleep(delay).await;
            attempt += 1;
            pending = failed;
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Transport;
    use serde_json::{Value, json};

    fn fast(concurrency: usize) -> BatchScheduler {
        BatchScheduler::new(concurrency)
            .with_pause(Duration::ZERO)
            .with_backoff(Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let s = BatchScheduler::new(1)
            .with_backoff(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(s.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(s.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(s.backoff_delay(2), Duration::from_millis(350));
        assert_eq!(s.backoff_delay(30), Duration::from_millis(350));
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        assert_eq!(BatchScheduler::new(0).concurrency, 1);
    }

    async fn server_with_failures(ok: &[u32], failing: &[u32]) -> mockito::ServerGuard {
        let mut server = mockito::Server::new_async().await;
        for id in ok {
            server
                .mock("GET", format!("/api/entry/{id}/history/").as_str())
                .with_status(200)
                .with_body(json!({ "id": id }).to_string())
                .create_async()
                .await;
        }
        for id in failing {
            server
                .mock("GET", format!("/api/entry/{id}/history/").as_str())
                .with_status(500)
                .create_async()
                .await;
        }
        server
    }

    fn paths(ids: &[u32]) -> Vec<String> {
        ids.iter().map(|id| format!("entry/{id}/history")).collect()
    }

    #[tokio::test]
    async fn output_preserves_input_order_with_failures() {
        let server = server_with_failures(&[1, 3, 4, 6], &[2, 5]).await;
        let api = FplApi::new().with_transports(vec![Transport::Direct(server.url())]);
        let ids = [1, 2, 3, 4, 5, 6];

        for concurrency in [1, 2, 4, 10] {
            let out: Vec<Option<Value>> = fast(concurrency)
                .with_retries(1)
                .run(&api, &paths(&ids), None, |_, _| {})
                .await;
            assert_eq!(out.len(), ids.len());
            for (id, slot) in ids.iter().zip(&out) {
                match id {
                    2 | 5 => assert!(slot.is_none(), "entry {id} should be null"),
                    _ => assert_eq!(slot.as_ref().and_then(|v| v["id"].as_u64()), Some(u64::from(*id))),
                }
            }
        }
    }

    #[tokio::test]
    async fn failing_path_is_attempted_once_per_pass() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/entry/9/history/")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;
        let api = FplApi::new().with_transports(vec![Transport::Direct(server.url())]);

        let out: Vec<Option<Value>> = fast(5)
            .with_retries(2)
            .run(&api, &paths(&[9]), None, |_, _| {})
            .await;

        assert_eq!(out, vec![None]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn progress_is_cumulative_and_ends_at_total() {
        let server = server_with_failures(&[1, 2, 3], &[4]).await;
        let api = FplApi::new().with_transports(vec![Transport::Direct(server.url())]);
        let mut seen = Vec::new();

        let _: Vec<Option<Value>> = fast(2)
            .with_retries(1)
            .run(&api, &paths(&[1, 2, 3, 4]), None, |d, t| seen.push((d, t)))
            .await;

        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(seen.last(), Some(&(4, 4)));
        // first pass: [1,2] then [3,4-fails]; retry pass: [4] given up.
        assert_eq!(seen, vec![(2, 4), (3, 4), (4, 4)]);
    }

    #[tokio::test]
    async fn retry_pass_recovers_a_failed_slot() {
        let mut server = mockito::Server::new_async().await;
        let failure = server
            .mock("GET", "/api/entry/1/history/")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let success = server
            .mock("GET", "/api/entry/1/history/")
            .with_status(200)
            .with_body(json!({ "id": 1 }).to_string())
            .expect(1)
            .create_async()
            .await;
        let api = FplApi::new().with_transports(vec![Transport::Direct(server.url())]);
        let mut seen = Vec::new();

        let out: Vec<Option<Value>> = BatchScheduler::new(1)
            .with_retries(2)
            .with_pause(Duration::ZERO)
            .with_backoff(Duration::from_millis(20), Duration::from_millis(20))
            .run(&api, &paths(&[1]), None, |d, t| seen.push((d, t)))
            .await;

        assert_eq!(out, vec![Some(json!({ "id": 1 }))]);
        assert_eq!(seen.last(), Some(&(1, 1)));
        failure.assert_async().await;
        success.assert_async().await;
    }

    #[tokio::test]
    async fn chunks_are_separated_by_the_pause() {
        let server = server_with_failures(&[1, 2, 3], &[]).await;
        let api = FplApi::new().with_transports(vec![Transport::Direct(server.url())]);
        let pause = Duration::from_millis(40);

        let started = std::time::Instant::now();
        let out: Vec<Option<Value>> = BatchScheduler::new(1)
            .with_pause(pause)
            .run(&api, &paths(&[1, 2, 3]), None, |_, _| {})
            .await;

        assert!(out.iter().all(Option::is_some));
        assert!(started.elapsed() >= pause * 2, "elapsed {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let api = FplApi::new().with_transports(vec![]);
        let out: Vec<Option<Value>> = fast(3).run(&api, &[], None, |_, _| {}).await;
        assert!(out.is_empty());
    }
}
