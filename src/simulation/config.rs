//! Tunables for the intersection simulation

/// How long a light phase stays green
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightPolicy {
    /// Constant dwell in simulated seconds
    Fixed { dwell: f32 },
    /// Dwell adapts to the load of the direction currently holding green
    Adaptive {
        base: f32,
        min: f32,
        max: f32,
        /// Below this many queued vehicles the phase is cut toward `min`
        low_load: usize,
        /// Above this many queued vehicles the phase is stretched toward `max`
        high_load: usize,
    },
}

impl LightPolicy {
    pub fn fixed() -> Self {
        LightPolicy::Fixed { dwell: 5.0 }
    }

    pub fn adaptive() -> Self {
        LightPolicy::Adaptive {
            base: 5.0,
            min: 3.0,
            max: 10.0,
            low_load: 2,
            high_load: 6,
        }
    }

    /// Longest dwell this policy can produce
    pub fn max_dwell(&self) -> f32 {
        match *self {
            LightPolicy::Fixed { dwell } => dwell,
            LightPolicy::Adaptive { base, max, .. } => base.max(max),
        }
    }
}

impl Default for LightPolicy {
    fn default() -> Self {
        Self::fixed()
    }
}

/// All simulation tunables
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Capacity of every lane queue
    pub queue_capacity: usize,
    /// Minimum centre-to-centre distance between following vehicles
    pub safe_distance: f32,
    /// Safe distance multiplier when either vehicle is an emergency vehicle
    pub emergency_distance_multiplier: f32,
    /// A priority lane is active once it holds more than this many vehicles
    pub priority_threshold: usize,
    /// Width of the band before the stop line where lights are enforced
    pub boundary_zone_width: f32,
    pub window_width: f32,
    pub window_height: f32,
    /// Width of a single lane, three lanes per travel direction
    pub lane_width: f32,
    pub vehicle_size: f32,
    pub max_speed: f32,
    pub light_policy: LightPolicy,
    /// Whether the inline spawner generates traffic
    pub spawn_enabled: bool,
    /// Bounds for the number of ticks between spawn waves
    pub spawn_interval_min: u32,
    pub spawn_interval_max: u32,
    /// A direction stops receiving spawns once its three queues hold this many vehicles
    pub spawn_direction_limit: usize,
    /// Probability that a spawned vehicle is an emergency vehicle
    pub emergency_chance: f64,
    /// Spawn into Right lanes too (otherwise they only receive merging traffic)
    pub spawn_right_lane: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            safe_distance: 30.0,
            emergency_distance_multiplier: 1.5,
            priority_threshold: 5,
            boundary_zone_width: 40.0,
            window_width: 800.0,
            window_height: 600.0,
            lane_width: 30.0,
            vehicle_size: 20.0,
            max_speed: 10.0,
            light_policy: LightPolicy::default(),
            spawn_enabled: true,
            spawn_interval_min: 15,
            spawn_interval_max: 30,
            spawn_direction_limit: 8,
            emergency_chance: 0.10,
            spawn_right_lane: false,
        }
    }
}

impl SimConfig {
    /// Road width covering both travel directions
    pub fn road_width(&self) -> f32 {
        self.lane_width * 6.0
    }
}
