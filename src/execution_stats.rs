//! Wall time, CPU time and peak memory of a batch.
// Loss of precision is allowable in this module's use cases.
#![allow(clippy::cast_precision_loss)]

use std::time::{Duration, Instant};

use bytesize::ByteSize;
use humantime::format_duration;
use log::{debug, error, info};
use serde_derive::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// How frequently we update the max memory used value.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Computed final statistics. If no person-steps were simulated, the per person-step
/// statistics are zero.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionStatistics {
    pub max_memory_usage: u64,
    pub cpu_time: Duration,
    pub wall_time: Duration,

    pub completed_runs: usize,
    /// Population size summed over every step of every completed run
    pub person_steps: u64,
    pub cpu_time_per_person_step: Duration,
    pub wall_time_per_person_step: Duration,
}

pub struct ExecutionProfilingCollector {
    start_time: Instant,
    /// Refreshes are rate limited so callers can poll on every completed run.
    last_refresh: Instant,
    /// Accumulated CPU time of the process in CPU-milliseconds at batch start
    start_cpu_time: u64,
    /// Polled during execution to capture the max.
    max_memory_usage: u64,
    system: System,
    /// `None` on unsupported platforms
    process_id: Option<Pid>,
}

impl Default for ExecutionProfilingCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionProfilingCollector {
    #[must_use]
    pub fn new() -> ExecutionProfilingCollector {
        let process_id = sysinfo::get_current_pid().ok();
        let now = Instant::now();

        let mut collector = ExecutionProfilingCollector {
            start_time: now,
            last_refresh: now,
            start_cpu_time: 0,
            max_memory_usage: 0,
            system: System::new(),
            process_id,
        };
        if let Some(process_id) = process_id {
            debug!("Process ID: {}", process_id);
            collector.update_system_info(ProcessRefreshKind::nothing().with_cpu().with_memory());
            if let Some(process) = collector.system.process(process_id) {
                collector.max_memory_usage = process.memory();
                collector.start_cpu_time = process.accumulated_cpu_time();
            }
        }

        collector
    }

    /// Polls memory usage if at least `REFRESH_INTERVAL` has passed since the previous
    /// refresh.
    #[inline]
    pub fn refresh(&mut self) {
        if self.last_refresh.elapsed() >= REFRESH_INTERVAL {
            self.poll_memory();
            self.last_refresh = Instant::now();
        }
    }

    fn poll_memory(&mut self) {
        if let Some(pid) = self.process_id {
            self.update_system_info(ProcessRefreshKind::nothing().with_memory());
            if let Some(process) = self.system.process(pid) {
                self.max_memory_usage = self.max_memory_usage.max(process.memory());
            }
        }
    }

    /// Accumulated CPU time of the process in CPU-milliseconds since the batch started.
    pub fn cpu_time(&mut self) -> u64 {
        let Some(pid) = self.process_id else {
            return 0;
        };
        self.update_system_info(ProcessRefreshKind::nothing().with_cpu());
        self.system.process(pid).map_or(0, |process| {
            process
                .accumulated_cpu_time()
                .saturating_sub(self.start_cpu_time)
        })
    }

    #[inline]
    fn update_system_info(&mut self, process_refresh_kind: ProcessRefreshKind) {
        if let Some(pid) = self.process_id {
            if self.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                process_refresh_kind,
            ) < 1
            {
                error!("could not refresh process statistics");
            }
        }
    }

    pub fn compute_final_statistics(
        &mut self,
        completed_runs: usize,
        person_steps: u64,
    ) -> ExecutionStatistics {
        let mut cpu_time_millis = 0;

        if let Some(pid) = self.process_id {
            self.update_system_info(ProcessRefreshKind::nothing().with_cpu().with_memory());
            if let Some(process) = self.system.process(pid) {
                self.max_memory_usage = self.max_memory_usage.max(process.memory());
                cpu_time_millis = process
                    .accumulated_cpu_time()
                    .saturating_sub(self.start_cpu_time);
            }
        }

        let cpu_time = Duration::from_millis(cpu_time_millis);
        let wall_time = self.start_time.elapsed();

        let (cpu_time_per_person_step, wall_time_per_person_step) = if person_steps > 0 {
            (
                Duration::from_secs_f64(cpu_time_millis as f64 / person_steps as f64 / 1000.0),
                Duration::from_secs_f64(wall_time.as_secs_f64() / person_steps as f64),
            )
        } else {
            (Duration::ZERO, Duration::ZERO)
        };

        ExecutionStatistics {
            max_memory_usage: self.max_memory_usage,
            cpu_time,
            wall_time,
            completed_runs,
            person_steps,
            cpu_time_per_person_step,
            wall_time_per_person_step,
        }
    }
}

/// Prints execution statistics to the console.
pub fn print_execution_statistics(summary: &ExecutionStatistics) {
    println!("━━━━ Execution Summary ━━━━");
    if summary.max_memory_usage == 0 {
        println!("Memory and CPU statistics are not available on your platform.");
    } else {
        println!(
            "{:<28}{}",
            "Max memory usage:",
            ByteSize::b(summary.max_memory_usage)
        );
        println!("{:<28}{}", "CPU time:", format_duration(summary.cpu_time));
    }

    println!("{:<28}{}", "Wall time:", format_duration(summary.wall_time));
    println!("{:<28}{}", "Completed runs:", summary.completed_runs);

    if summary.person_steps > 0 {
        println!("{:<28}{}", "Person-steps:", summary.person_steps);
        if summary.max_memory_usage > 0 {
            println!(
                "{:<28}{}",
                "CPU time per person-step:",
                format_duration(summary.cpu_time_per_person_step)
            );
        }
        println!(
            "{:<28}{}",
            "Wall time per person-step:",
            format_duration(summary.wall_time_per_person_step)
        );
    }
}

/// Logs execution statistics at `info`.
pub fn log_execution_statistics(stats: &ExecutionStatistics) {
    info!("Batch complete.");
    if stats.max_memory_usage == 0 {
        info!("Memory and CPU statistics are not available on your platform.");
    } else {
        info!("Max memory usage: {}", ByteSize::b(stats.max_memory_usage));
        info!("CPU time: {}", format_duration(stats.cpu_time));
    }
    info!("Wall time: {}", format_duration(stats.wall_time));
    info!("Completed runs: {}", stats.completed_runs);

    if stats.person_steps > 0 {
        info!("Person-steps: {}", stats.person_steps);
        info!(
            "Wall time per person-step: {}",
            format_duration(stats.wall_time_per_person_step)
        );
    }
}
