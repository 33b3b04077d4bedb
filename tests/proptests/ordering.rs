//! Property-Based Tests: Ordering and Filtering
//!
//! These tests use the `proptest` framework to generate arbitrary sequences of
//! log calls and check the invariants of the drain path:
//!
//! - **Order preservation:** whatever is pushed between drains comes out in
//!   push order, across any split into drain snapshots.
//! - **Filtering:** exactly the calls at or above the threshold are written.

#[cfg(test)]
mod tests {
    use drainlog::logging::{DrainStack, LogSink};
    use drainlog::{Logger, LoggerConfig, Severity};
    use proptest::prelude::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct MemorySink(Arc<Mutex<Vec<String>>>);

    impl LogSink for MemorySink {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.0.lock().unwrap().push(line.to_string());
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn name(&self) -> String {
            "memory".to_string()
        }
    }

    fn severity() -> impl Strategy<Value = Severity> {
        prop::sample::select(Severity::ALL.to_vec())
    }

    proptest! {
        /// **Property:** draining after any interleaving of pushes and takes
        /// yields every value exactly once, in push order.
        #[test]
        fn stack_preserves_order_across_snapshots(
            values in prop::collection::vec(any::<u32>(), 0..200),
            cuts in prop::collection::vec(any::<bool>(), 0..200),
        ) {
            let stack = DrainStack::new();
            let mut out = Vec::new();
            for (i, value) in values.iter().enumerate() {
                stack.push(*value);
                if cuts.get(i).copied().unwrap_or(false) {
                    out.extend(stack.take_all());
                }
            }
            out.extend(stack.take_all());
            prop_assert_eq!(out, values);
        }

        /// **Property:** the logger writes exactly the records at or above
        /// its threshold, in call order.
        #[test]
        fn logger_filters_and_keeps_order(
            min in severity(),
            calls in prop::collection::vec((severity(), "[a-z]{1,12}"), 0..100),
        ) {
            let fallback = MemorySink::default();
            let logger = Logger::with_parts(
                LoggerConfig::new(min, Duration::from_secs(60)),
                Box::new(fallback.clone()),
                Arc::new(drainlog::logging::StderrReporter),
            );

            for (severity, message) in &calls {
                logger.log(*severity, message);
            }
            logger.flush();

            let expected: Vec<String> = calls
                .iter()
                .filter(|(severity, _)| *severity >= min)
                .map(|(severity, message)| format!("{}: {}", severity, message))
                .collect();
            let written: Vec<String> = fallback
                .0
                .lock()
                .unwrap()
                .iter()
                .map(|line| line[20..].to_string())
                .collect();
            prop_assert_eq!(written, expected);
        }
    }
}
