//! Running statistics for a simulation run

use log::info;
use ordered_float::OrderedFloat;

use super::stepper::StepReport;

/// Totals accumulated over every tick
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    pub spawned: u64,
    pub ingested: u64,
    pub completed: u64,
    pub transferred: u64,
    pub dropped: u64,
    pub discarded: u64,
    pub malformed: u64,
    pub collisions: u64,
    pub wait_ticks: u64,
    pub closest_gap: Option<OrderedFloat<f32>>,
}

impl SimStats {
    pub fn absorb(&mut self, report: &StepReport) {
        self.completed += report.completed as u64;
        self.transferred += report.transferred as u64;
        self.dropped += report.dropped as u64;
        self.discarded += report.discarded as u64;
        self.wait_ticks += report.waited as u64;
        if let Some(gap) = report.closest_gap {
            self.closest_gap = Some(self.closest_gap.map_or(gap, |current| current.min(gap)));
        }
    }

    /// Vehicles that entered the simulation, spawned or ingested
    pub fn admitted(&self) -> u64 {
        self.spawned + self.ingested
    }

    /// Share of admitted vehicles that made it off the map
    pub fn completion_rate(&self) -> f32 {
        match self.admitted() {
            0 => 0.0,
            admitted => self.completed as f32 / admitted as f32 * 100.0,
        }
    }

    /// Log the end-of-run summary
    pub fn log_summary(&self, elapsed: f32, active: usize, phase_changes: u64) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Elapsed time: {:.2}s", elapsed);
        info!("Total vehicles spawned: {}", self.spawned);
        info!("Total vehicles ingested: {}", self.ingested);
        info!("Total vehicles completed: {}", self.completed);
        info!("Active vehicles: {}", active);
        info!("Queue transfers: {}", self.transferred);
        info!("Dropped (queue full): {}", self.dropped);
        info!("Discarded (invalid routing): {}", self.discarded);
        info!("Malformed records: {}", self.malformed);
        info!("Collisions detected: {}", self.collisions);
        info!("Light phase changes: {}", phase_changes);
        info!("Total wait ticks: {}", self.wait_ticks);
        if let Some(gap) = self.closest_gap {
            info!("Closest following gap: {:.1}", gap.into_inner());
        }
        info!("Completion rate: {:.1}%", self.completion_rate());
    }
}
