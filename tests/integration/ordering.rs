// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Integration Tests: Ordering and Loss
//!
//! Records must reach the destination in the order their pushes completed,
//! and nothing may be dropped or duplicated when many threads log at once.

#[cfg(test)]
mod tests {
    use crate::tests::{capturing_logger, without_timestamp};
    use drainlog::{log_info, Severity};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_single_thread_order_preserved() {
        let (logger, fallback, _reporter) = capturing_logger(Severity::Trace, Duration::from_secs(60));

        for i in 0..1_000 {
            log_info!(logger, "message {}", i);
        }
        assert_eq!(logger.flush(), 1_000);

        let lines = fallback.lines();
        assert_eq!(lines.len(), 1_000);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(without_timestamp(line), format!("Info: message {}", i));
        }
    }

    #[test]
    fn test_debug_scenario_two_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.log");
        let (logger, _fallback, _reporter) = capturing_logger(Severity::Debug, Duration::from_secs(1));
        logger.set_destination(path.as_path()).unwrap();

        logger.debug("A");
        logger.debug("B");
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Debug: A"));
        assert!(lines[1].ends_with("Debug: B"));
    }

    #[test]
    fn test_order_preserved_across_drains() {
        let (logger, fallback, _reporter) = capturing_logger(Severity::Trace, Duration::from_secs(60));

        logger.info("first");
        logger.flush();
        logger.info("second");
        logger.info("third");
        logger.flush();

        let lines: Vec<_> = fallback
            .lines()
            .iter()
            .map(|l| without_timestamp(l).to_string())
            .collect();
        assert_eq!(lines, vec!["Info: first", "Info: second", "Info: third"]);
    }

    #[test]
    fn test_no_loss_under_concurrency() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 2_500;

        let (logger, fallback, _reporter) =
            capturing_logger(Severity::Trace, Duration::from_millis(1));
        let logger = Arc::new(logger);
        logger.start().unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        log_info!(logger, "t{} m{}", t, i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // All pushes are complete: the final drain must see every record
        logger.stop();

        let lines = fallback.lines();
        assert_eq!(lines.len(), THREADS * PER_THREAD);

        let unique: HashSet<_> = lines.iter().collect();
        assert_eq!(unique.len(), lines.len(), "duplicate records written");

        // Per-thread order survives interleaving
        let mut next = vec![0usize; THREADS];
        for line in &lines {
            let body = without_timestamp(line)
                .strip_prefix("Info: t")
                .expect("well-formed record");
            let (t, i) = body.split_once(" m").unwrap();
            let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
            assert_eq!(i, next[t], "thread {} out of order", t);
            next[t] += 1;
        }
    }

    #[test]
    fn test_forced_flush_races_with_background_drain() {
        let (logger, fallback, _reporter) =
            capturing_logger(Severity::Trace, Duration::from_millis(1));
        logger.start().unwrap();

        for i in 0..500 {
            logger.info(&format!("{}", i));
            if i % 50 == 0 {
                logger.flush();
            }
        }
        logger.stop();

        let numbers: Vec<usize> = fallback
            .lines()
            .iter()
            .map(|l| without_timestamp(l).trim_start_matches("Info: ").parse().unwrap())
            .collect();
        assert_eq!(numbers, (0..500).collect::<Vec<_>>());
    }
}
