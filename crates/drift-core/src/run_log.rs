//! Deterministic run log.
//!
//! Workers append to private queues during the merge loop; the coordinator
//! folds those queues into the main log at the post-join barrier, ordered by
//! worker index and then per-worker sequence number. The resulting log is
//! identical across executions of the same workload regardless of how the
//! workers interleaved at runtime.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// One log line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Worker that produced the entry; `None` for the coordinator.
    pub worker: Option<usize>,
    /// Insertion sequence within the producing queue.
    pub sequence: u64,
    /// Wall-clock time of the append. Informational only; ordering is by
    /// `(worker, sequence)`.
    pub timestamp: DateTime<Utc>,
    /// The message.
    pub message: String,
}

impl LogEntry {
    /// Render the entry as one plain-text log line.
    pub fn render(&self) -> String {
        match self.worker {
            Some(idx) => format!(
                "{} [{}] {}",
                self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                idx,
                self.message
            ),
            None => format!(
                "{} [main] {}",
                self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                self.message
            ),
        }
    }
}

#[derive(Debug, Default)]
struct Queue {
    entries: Vec<LogEntry>,
    next_sequence: u64,
}

impl Queue {
    fn push(&mut self, worker: Option<usize>, message: String) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(LogEntry {
            worker,
            sequence,
            timestamp: Utc::now(),
            message,
        });
    }
}

/// Append-only log with one private queue per worker.
///
/// The per-worker queues are independent mutexes, so workers never contend
/// with each other or with the coordinator during the hot loop.
#[derive(Debug)]
pub struct RunLog {
    main: Mutex<Queue>,
    workers: Vec<Mutex<Queue>>,
}

impl RunLog {
    /// Create a log with `worker_count` worker queues.
    pub fn new(worker_count: usize) -> Self {
        Self {
            main: Mutex::new(Queue::default()),
            workers: (0..worker_count).map(|_| Mutex::new(Queue::default())).collect(),
        }
    }

    /// Append a coordinator message.
    pub fn append(&self, message: impl Into<String>) {
        let mut queue = self.main.lock().expect("run log lock poisoned");
        queue.push(None, message.into());
    }

    /// Append a message for `worker`.
    ///
    /// Falls back to the main queue when the index is out of range; a run
    /// never silently drops log lines.
    pub fn append_worker(&self, worker: usize, message: impl Into<String>) {
        match self.workers.get(worker) {
            Some(queue) => {
                let mut queue = queue.lock().expect("run log lock poisoned");
                queue.push(Some(worker), message.into());
            }
            None => self.append(message),
        }
    }

    /// Fold all worker queues into the main log.
    ///
    /// Called once per fan-out at the join barrier. Entries are appended in
    /// worker-index order, each worker's entries in sequence order, after
    /// everything the coordinator logged so far.
    pub fn merge_worker_logs(&self) {
        let mut merged: Vec<LogEntry> = Vec::new();
        for queue in &self.workers {
            let mut queue = queue.lock().expect("run log lock poisoned");
            merged.append(&mut queue.entries);
        }
        let mut main = self.main.lock().expect("run log lock poisoned");
        for mut entry in merged {
            entry.sequence = main.next_sequence;
            main.next_sequence += 1;
            main.entries.push(entry);
        }
    }

    /// Snapshot the merged main log as rendered lines.
    pub fn lines(&self) -> Vec<String> {
        let main = self.main.lock().expect("run log lock poisoned");
        main.entries.iter().map(LogEntry::render).collect()
    }

    /// Number of entries currently in the main log.
    pub fn len(&self) -> usize {
        self.main.lock().expect("run log lock poisoned").entries.len()
    }

    /// Whether the main log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_merge_orders_by_worker_then_sequence() {
        let log = RunLog::new(2);
        log.append("start");
        // Interleave appends the way concurrent workers would.
        log.append_worker(1, "w1 first");
        log.append_worker(0, "w0 first");
        log.append_worker(1, "w1 second");
        log.append_worker(0, "w0 second");
        log.merge_worker_logs();
        log.append("end");

        let lines = log.lines();
        let messages: Vec<&str> = lines
            .iter()
            .map(|l| l.splitn(3, ' ').nth(2).unwrap())
            .collect();
        assert_eq!(
            messages,
            vec!["start", "w0 first", "w0 second", "w1 first", "w1 second", "end"]
        );
    }

    #[test]
    fn test_merge_is_deterministic_across_interleavings() {
        let run = |order: &[usize]| {
            let log = RunLog::new(2);
            let mut counters = [0u32; 2];
            for &worker in order {
                counters[worker] += 1;
                log.append_worker(worker, format!("w{} m{}", worker, counters[worker]));
            }
            log.merge_worker_logs();
            log.lines()
                .iter()
                .map(|l| l.splitn(3, ' ').nth(2).unwrap().to_string())
                .collect::<Vec<_>>()
        };

        let a = run(&[0, 0, 1, 1]);
        let b = run(&[1, 0, 1, 0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_concurrent_appends_do_not_lose_entries() {
        let log = Arc::new(RunLog::new(4));
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        log.append_worker(worker, format!("{worker}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        log.merge_worker_logs();
        assert_eq!(log.len(), 400);
    }

    #[test]
    fn test_out_of_range_worker_falls_back_to_main() {
        let log = RunLog::new(1);
        log.append_worker(7, "stray");
        assert_eq!(log.len(), 1);
    }
}
