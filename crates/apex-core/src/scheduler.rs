//! Three independent periodic tasks behind one clock.
//!
//! The scheduler never sleeps or spawns. The event loop asks for the next
//! deadline, waits for it however it likes, then hands the current instant to
//! [`Scheduler::run_due`].

use std::time::{Duration, Instant};

use crate::config::TimerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    Progress,
    Visualizer,
    Beat,
}

impl TaskId {
    pub const ALL: [TaskId; 3] = [TaskId::Progress, TaskId::Visualizer, TaskId::Beat];

    fn slot(self) -> usize {
        match self {
            TaskId::Progress => 0,
            TaskId::Visualizer => 1,
            TaskId::Beat => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct Task {
    period: Duration,
    next_due: Instant,
    enabled: bool,
    running: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    tasks: [Task; 3],
}

impl Scheduler {
    pub fn new(cfg: &TimerConfig) -> Self {
        Self::starting_at(cfg, Instant::now())
    }

    /// Every task first fires one period after `origin`.
    pub fn starting_at(cfg: &TimerConfig, origin: Instant) -> Self {
        let task = |ms: u64| {
            let period = Duration::from_millis(ms.max(1));
            Task {
                period,
                next_due: origin + period,
                enabled: true,
                running: false,
            }
        };
        Self {
            tasks: [
                task(cfg.progress_ms),
                task(cfg.visualizer_ms),
                task(cfg.beat_ms),
            ],
        }
    }

    pub fn period(&self, id: TaskId) -> Duration {
        self.tasks[id.slot()].period
    }

    pub fn next_due(&self, id: TaskId) -> Instant {
        self.tasks[id.slot()].next_due
    }

    pub fn is_enabled(&self, id: TaskId) -> bool {
        self.tasks[id.slot()].enabled
    }

    /// Suspend or resume one task. A resumed task is due one period after
    /// `now` rather than catching up on the time it spent suspended.
    pub fn set_enabled(&mut self, id: TaskId, enabled: bool, now: Instant) {
        let task = &mut self.tasks[id.slot()];
        if enabled && !task.enabled {
            task.next_due = now + task.period;
        }
        task.enabled = enabled;
    }

    /// Earliest deadline among enabled tasks, or `None` when all are off.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.next_due)
            .min()
    }

    /// Claim every enabled, idle task whose deadline has passed.
    ///
    /// Claimed tasks are marked running and rescheduled; they stay claimed
    /// until [`Scheduler::finish`] is called, so a second poll meanwhile
    /// skips them. A task that fell a full period or more behind is
    /// rescheduled from `now` and the missed ticks are dropped.
    pub fn poll_due(&mut self, now: Instant) -> Vec<TaskId> {
        let mut due = Vec::new();
        for id in TaskId::ALL {
            let task = &mut self.tasks[id.slot()];
            if !task.enabled || task.running || task.next_due > now {
                continue;
            }
            let late = now.duration_since(task.next_due);
            task.next_due = if late >= task.period {
                now + task.period
            } else {
                task.next_due + task.period
            };
            task.running = true;
            due.push(id);
        }
        due
    }

    pub fn finish(&mut self, id: TaskId) {
        self.tasks[id.slot()].running = false;
    }

    /// Run `f` once for every due task, in `Progress`, `Visualizer`, `Beat`
    /// order. Returns how many tasks ran.
    pub fn run_due<F: FnMut(TaskId)>(&mut self, now: Instant, mut f: F) -> usize {
        let due = self.poll_due(now);
        for &id in &due {
            f(id);
            self.finish(id);
        }
        due.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn sched() -> (Scheduler, Instant) {
        let t0 = Instant::now();
        (Scheduler::starting_at(&TimerConfig::default(), t0), t0)
    }

    #[test]
    fn periods_come_from_config() {
        let (s, t0) = sched();
        assert_eq!(s.period(TaskId::Progress), ms(100));
        assert_eq!(s.period(TaskId::Visualizer), ms(30));
        assert_eq!(s.period(TaskId::Beat), ms(20));
        assert_eq!(s.next_deadline(), Some(t0 + ms(20)));
    }

    #[test]
    fn counts_over_one_second_match_periods() {
        let (mut s, t0) = sched();
        let mut counts = [0usize; 3];
        for step in 1..=1_000u64 {
            s.run_due(t0 + ms(step), |id| counts[id.slot()] += 1);
        }
        assert_eq!(counts, [10, 33, 50]);
    }

    #[test]
    fn nothing_runs_before_first_deadline() {
        let (mut s, t0) = sched();
        assert_eq!(s.run_due(t0 + ms(19), |_| panic!("ran early")), 0);
        let mut ran = Vec::new();
        s.run_due(t0 + ms(20), |id| ran.push(id));
        assert_eq!(ran, vec![TaskId::Beat]);
    }

    #[test]
    fn disabled_tasks_never_run() {
        let (mut s, t0) = sched();
        s.set_enabled(TaskId::Visualizer, false, t0);
        s.set_enabled(TaskId::Beat, false, t0);
        assert_eq!(s.next_deadline(), Some(t0 + ms(100)));

        let mut ran = Vec::new();
        for step in 1..=500u64 {
            s.run_due(t0 + ms(step), |id| ran.push(id));
        }
        assert!(ran.iter().all(|&id| id == TaskId::Progress));
        assert_eq!(ran.len(), 5);

        s.set_enabled(TaskId::Progress, false, t0);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn resumed_task_does_not_catch_up() {
        let (mut s, t0) = sched();
        s.set_enabled(TaskId::Beat, false, t0);
        s.set_enabled(TaskId::Beat, true, t0 + ms(1_000));
        let mut beats = 0;
        s.run_due(t0 + ms(1_010), |id| {
            if id == TaskId::Beat {
                beats += 1
            }
        });
        assert_eq!(beats, 0);
        s.run_due(t0 + ms(1_020), |id| {
            if id == TaskId::Beat {
                beats += 1
            }
        });
        assert_eq!(beats, 1);
    }

    #[test]
    fn running_task_is_skipped_until_finished() {
        let (mut s, t0) = sched();
        assert_eq!(s.poll_due(t0 + ms(20)), vec![TaskId::Beat]);
        // Still claimed: the next period passes without a second invocation.
        assert_eq!(s.poll_due(t0 + ms(40)), vec![TaskId::Visualizer]);
        s.finish(TaskId::Beat);
        assert_eq!(s.poll_due(t0 + ms(40)), vec![TaskId::Beat]);
    }

    #[test]
    fn missed_ticks_are_dropped() {
        let (mut s, t0) = sched();
        // A stall of half a second: each task runs once, not once per
        // missed period.
        let mut ran = Vec::new();
        s.run_due(t0 + ms(500), |id| ran.push(id));
        assert_eq!(ran, TaskId::ALL.to_vec());
        assert_eq!(s.next_deadline(), Some(t0 + ms(520)));

        ran.clear();
        s.run_due(t0 + ms(519), |id| ran.push(id));
        assert!(ran.is_empty());
    }

    #[test]
    fn slight_lateness_keeps_the_cadence() {
        let (mut s, t0) = sched();
        s.run_due(t0 + ms(25), |_| {});
        // Beat was 5 ms late; its next deadline stays on the 20 ms grid.
        assert_eq!(s.next_due(TaskId::Beat), t0 + ms(40));
        assert_eq!(s.next_deadline(), Some(t0 + ms(30)));
    }
}
