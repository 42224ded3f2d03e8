//! 各階段的處理筆數、耗時與記憶體用量。
//!
//! 筆數與耗時一律記錄；CPU/記憶體取樣需要 `cli` feature (sysinfo)。

use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: &'static str,
    pub records: usize,
    pub elapsed: Duration,
    pub memory_mb: Option<u64>,
    pub cpu_percent: Option<f32>,
}

impl StageReport {
    pub fn records_per_second(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.records as f64 / secs)
    }
}

struct StageLog {
    last_mark: Instant,
    stages: Vec<StageReport>,
}

pub struct SystemMonitor {
    enabled: bool,
    started: Instant,
    log: Mutex<StageLog>,
    #[cfg(feature = "cli")]
    process: Option<Mutex<(System, Pid)>>,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            log: Mutex::new(StageLog {
                last_mark: now,
                stages: Vec::new(),
            }),
            #[cfg(feature = "cli")]
            process: if enabled { Self::attach() } else { None },
        }
    }

    #[cfg(feature = "cli")]
    fn attach() -> Option<Mutex<(System, Pid)>> {
        match sysinfo::get_current_pid() {
            Ok(pid) => Some(Mutex::new((System::new(), pid))),
            Err(e) => {
                tracing::warn!("Unable to resolve current PID, resource sampling disabled: {}", e);
                None
            }
        }
    }

    #[cfg(feature = "cli")]
    fn sample(&self) -> (Option<u64>, Option<f32>) {
        let Some(process) = &self.process else {
            return (None, None);
        };
        let Ok(mut guard) = process.lock() else {
            return (None, None);
        };
        let (system, pid) = &mut *guard;
        system.refresh_processes(ProcessesToUpdate::Some(&[*pid]), true);
        match system.process(*pid) {
            Some(p) => (Some(p.memory() / 1024 / 1024), Some(p.cpu_usage())),
            None => (None, None),
        }
    }

    #[cfg(not(feature = "cli"))]
    fn sample(&self) -> (Option<u64>, Option<f32>) {
        (None, None)
    }

    /// 記錄一個階段結束；耗時從上一個階段結束起算
    pub fn record_stage(&self, stage: &'static str, records: usize) {
        let (memory_mb, cpu_percent) = self.sample();
        let Ok(mut log) = self.log.lock() else {
            return;
        };

        let now = Instant::now();
        let report = StageReport {
            stage,
            records,
            elapsed: now.duration_since(log.last_mark),
            memory_mb,
            cpu_percent,
        };
        log.last_mark = now;

        if self.enabled {
            tracing::info!(
                "📊 {} - {} records in {:?}{}{}",
                stage,
                records,
                report.elapsed,
                report
                    .records_per_second()
                    .map(|r| format!(" ({:.0} rows/s)", r))
                    .unwrap_or_default(),
                match (memory_mb, cpu_percent) {
                    (Some(mem), Some(cpu)) => format!(", Memory: {}MB, CPU: {:.1}%", mem, cpu),
                    _ => String::new(),
                }
            );
        }
        log.stages.push(report);
    }

    pub fn stages(&self) -> Vec<StageReport> {
        self.log
            .lock()
            .map(|log| log.stages.clone())
            .unwrap_or_default()
    }

    pub fn peak_memory_mb(&self) -> Option<u64> {
        self.stages().iter().filter_map(|s| s.memory_mb).max()
    }

    pub fn log_summary(&self) {
        if !self.enabled {
            return;
        }
        let stages = self.stages();
        let slowest = stages.iter().max_by_key(|s| s.elapsed);
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}, Slowest stage: {}",
            self.started.elapsed(),
            self.peak_memory_mb()
                .map(|mb| format!("{}MB", mb))
                .unwrap_or_else(|| "n/a".to_string()),
            slowest.map(|s| s.stage).unwrap_or("-")
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
