// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Integration Tests: Destinations
//!
//! File destinations, swapping while draining, and the stdout fallback.

#[cfg(test)]
mod tests {
    use crate::tests::{capturing_logger, MemorySink};
    use drainlog::{Logger, LoggerConfig, Severity};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_no_destination_falls_back() {
        let (logger, fallback, reporter) = capturing_logger(Severity::Trace, Duration::from_secs(60));
        logger.info("to fallback");
        logger.flush();
        assert_eq!(fallback.lines().len(), 1);
        assert!(reporter.reports().is_empty());
    }

    #[test]
    fn test_default_logger_writes_stdout_without_error() {
        // No destination configured: records go to the process's stdout
        let logger = Logger::new(LoggerConfig::new(Severity::Trace, Duration::from_secs(60)));
        logger.info("drainlog stdout fallback check");
        assert_eq!(logger.flush(), 1);
    }

    #[test]
    fn test_unopenable_destination_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.log");
        let (logger, _fallback, reporter) = capturing_logger(Severity::Trace, Duration::from_secs(60));

        logger.set_destination(good.as_path()).unwrap();
        assert!(logger
            .set_destination(dir.path().join("no/such/dir/x.log"))
            .is_err());
        assert_eq!(reporter.reports().len(), 1);

        logger.info("kept");
        logger.flush();
        assert_eq!(std::fs::read_to_string(&good).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_empty_destination_switches_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.log");
        let (logger, fallback, _reporter) = capturing_logger(Severity::Trace, Duration::from_secs(60));

        logger.set_destination(file.as_path()).unwrap();
        logger.info("to file");
        logger.flush();
        logger.set_destination("").unwrap();
        logger.info("to fallback");
        logger.flush();

        assert_eq!(std::fs::read_to_string(&file).unwrap().lines().count(), 1);
        assert_eq!(fallback.lines().len(), 1);
    }

    #[test]
    fn test_stop_clears_destination_and_restart_with_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");
        let (logger, _fallback, _reporter) = capturing_logger(Severity::Trace, Duration::from_millis(5));

        logger.set_destination(first.as_path()).unwrap();
        logger.start().unwrap();
        logger.info("one");
        logger.restart_with(second.as_path()).unwrap();
        logger.info("two");
        logger.stop();

        let first = std::fs::read_to_string(&first).unwrap();
        let second = std::fs::read_to_string(&second).unwrap();
        assert!(first.ends_with("Info: one\n"));
        assert!(second.ends_with("Info: two\n"));
    }

    #[test]
    fn test_swap_while_draining_keeps_every_line_intact() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..4).map(|i| dir.path().join(format!("swap{}.log", i))).collect();
        let (logger, _fallback, _reporter) = capturing_logger(Severity::Trace, Duration::from_millis(1));
        let logger = Arc::new(logger);
        logger.set_destination(paths[0].as_path()).unwrap();
        logger.start().unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let swapper = {
            let logger = Arc::clone(&logger);
            let paths = paths.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut n = 1;
                while !done.load(Ordering::Acquire) {
                    logger.set_destination(paths[n % paths.len()].as_path()).unwrap();
                    n += 1;
                    thread::sleep(Duration::from_millis(1));
                }
                // Park the final drain on a known file
                logger.set_destination(paths[0].as_path()).unwrap();
            })
        };

        for i in 0..3_000 {
            logger.info(&format!("line {}", i));
        }
        done.store(true, Ordering::Release);
        swapper.join().unwrap();
        logger.stop();

        let mut seen = Vec::new();
        for path in &paths {
            if let Ok(contents) = std::fs::read_to_string(path) {
                for line in contents.lines() {
                    let n: usize = line
                        .rsplit_once("Info: line ")
                        .expect("torn line")
                        .1
                        .parse()
                        .unwrap();
                    seen.push(n);
                }
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..3_000).collect::<Vec<_>>());
    }

    #[test]
    fn test_custom_sink_via_facade() {
        let (logger, fallback, _reporter) = capturing_logger(Severity::Trace, Duration::from_secs(60));
        let sink = MemorySink::default();
        logger.set_sink(Box::new(sink.clone()));
        logger.error("custom");
        logger.flush();
        assert_eq!(sink.lines().len(), 1);
        assert!(fallback.lines().is_empty());
    }
}
