use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::info;

/// Periodically snapshots a set of counters to a CSV file, one row every
/// `write_period`, with a running total column per counter followed by its
/// rate since the previous row. Generalised over any counter-producing
/// closure so both the digestion run and the metadata collector can reuse
/// it.
pub struct StatisticsLogger {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StatisticsLogger {
    pub fn spawn<F>(
        path: impl AsRef<Path>,
        header: Vec<String>,
        write_period: Duration,
        snapshot: F,
    ) -> std::io::Result<Self>
    where
        F: Fn() -> Vec<u64> + Send + 'static,
    {
        let file = File::create(path)?;
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop_flag = Arc::clone(&stop_flag);

        let handle = thread::spawn(move || {
            info!("statistics logger is online");
            let mut writer = csv::Writer::from_writer(file);
            let mut full_header = vec!["seconds".to_string()];
            full_header.extend(header.iter().cloned());
            full_header.extend(header.iter().map(|name| format!("{name}_rate")));
            let _ = writer.write_record(&full_header);
            let _ = writer.flush();

            let start = Instant::now();
            let mut last = vec![0u64; header.len()];
            while !thread_stop_flag.load(Ordering::Relaxed) {
                thread::sleep(write_period);
                if thread_stop_flag.load(Ordering::Relaxed) {
                    break;
                }
                let current = snapshot();
                let seconds = start.elapsed().as_secs();
                let mut row = vec![seconds.to_string()];
                row.extend(current.iter().map(|v| v.to_string()));
                row.extend(
                    current
                        .iter()
                        .zip(last.iter())
                        .map(|(c, l)| c.saturating_sub(*l).to_string()),
                );
                let _ = writer.write_record(&row);
                let _ = writer.flush();
                last = current;
            }
            info!("statistics logger is stopping");
        });

        Ok(Self {
            stop_flag,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
