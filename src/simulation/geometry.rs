//! Intersection layout: lane centerlines, stop lines, map bounds and turn arcs
//!
//! Positions along an approach are expressed as a longitudinal coordinate `s`
//! measured from the intersection centre along the heading (negative before the
//! centre, positive after it) plus a lateral lane offset to the right of the heading.

use std::f32::consts::FRAC_PI_2;

use super::config::SimConfig;
use super::types::{Direction, LanePosition, Position};

/// Tolerance for comparing longitudinal coordinates against fixed lines
pub const LINE_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone)]
pub struct IntersectionGeometry {
    pub center: Position,
    pub half_width: f32,
    pub half_height: f32,
    pub half_road: f32,
    pub lane_width: f32,
    pub vehicle_size: f32,
    pub boundary_zone_width: f32,
}

impl IntersectionGeometry {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            center: Position::new(config.window_width / 2.0, config.window_height / 2.0),
            half_width: config.window_width / 2.0,
            half_height: config.window_height / 2.0,
            half_road: config.road_width() / 2.0,
            lane_width: config.lane_width,
            vehicle_size: config.vehicle_size,
            boundary_zone_width: config.boundary_zone_width,
        }
    }

    /// Lateral offset of a lane centerline from the road centerline
    pub fn lane_offset(&self, lane: LanePosition) -> f32 {
        (lane.index() as f32 + 0.5) * self.lane_width
    }

    /// Longitudinal coordinate where vehicles wait for a green light
    pub fn stop_line(&self) -> f32 {
        -(self.half_road + self.vehicle_size / 2.0)
    }

    /// Longitudinal coordinate where a vehicle has cleared the intersection box
    pub fn exit_line(&self) -> f32 {
        self.half_road + self.vehicle_size / 2.0
    }

    /// Distance from the centre to the map edge along a heading
    fn extent(&self, heading: Direction) -> f32 {
        match heading {
            Direction::North | Direction::South => self.half_height,
            Direction::East | Direction::West => self.half_width,
        }
    }

    pub fn longitudinal(&self, position: &Position, heading: Direction) -> f32 {
        position.sub(&self.center).dot(&heading.unit())
    }

    pub fn lane_point(&self, heading: Direction, lane: LanePosition, s: f32) -> Position {
        self.center
            .offset(&heading.unit(), s)
            .offset(&heading.right_hand(), self.lane_offset(lane))
    }

    /// Keep the longitudinal coordinate, move laterally onto the lane centerline
    pub fn snap_to_lane(&self, position: &Position, heading: Direction, lane: LanePosition) -> Position {
        self.lane_point(heading, lane, self.longitudinal(position, heading))
    }

    /// Where a vehicle enters the map: just past the edge behind its heading
    pub fn entry_point(&self, heading: Direction, lane: LanePosition) -> Position {
        self.lane_point(heading, lane, -(self.extent(heading) + self.vehicle_size))
    }

    /// True once the vehicle has fully left the map in its direction of travel
    pub fn beyond_map(&self, position: &Position, heading: Direction) -> bool {
        self.longitudinal(position, heading) > self.extent(heading) + self.vehicle_size
    }

    /// True inside the band of `boundary_zone_width` that ends at the stop line
    pub fn in_boundary_zone(&self, s: f32) -> bool {
        let stop = self.stop_line();
        s >= stop - self.boundary_zone_width && s <= stop + LINE_EPSILON
    }

    pub fn past_stop_line(&self, s: f32) -> bool {
        s > self.stop_line() + LINE_EPSILON
    }

    /// Position along a turn from the stop line of one lane to the box exit of another.
    ///
    /// The path is a quarter ellipse around the box corner opposite the turn, so it
    /// leaves tangent to `from` and arrives tangent to `to`. `progress` is clamped to [0, 1].
    /// A U-turn or straight pair has no quarter arc and is interpolated linearly.
    pub fn turn_point(
        &self,
        from: Direction,
        from_lane: LanePosition,
        to: Direction,
        to_lane: LanePosition,
        progress: f32,
    ) -> Position {
        let progress = progress.clamp(0.0, 1.0);
        let start = self.lane_point(from, from_lane, self.stop_line());
        let end = self.lane_point(to, to_lane, self.exit_line());

        if to != from.rotate_left() && to != from.rotate_right() {
            return Position::new(
                start.x + (end.x - start.x) * progress,
                start.y + (end.y - start.y) * progress,
            );
        }

        let span = end.sub(&start);
        let along_exit = span.dot(&to.unit());
        let pivot = start.offset(&to.unit(), along_exit);

        let theta = progress * FRAC_PI_2;
        let (sin, cos) = theta.sin_cos();
        let from_pivot = start.sub(&pivot);
        let to_pivot = end.sub(&pivot);
        Position::new(
            pivot.x + from_pivot.x * cos + to_pivot.x * sin,
            pivot.y + from_pivot.y * cos + to_pivot.y * sin,
        )
    }
}
