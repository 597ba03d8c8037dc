// src/playback.rs
// Walks a solved PendulumModel frame by frame for a renderer.
// Owns the frame cursor and the trail; the renderer owns pixels and the wall clock.

use crate::config::ValidatedConfig;
use crate::error::EndOfSimulation;
use crate::model::PendulumModel;
use crate::path::PathHistory;
use serde::Serialize;
use std::time::Duration;

/// Integer pixel position, y growing downward as on a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub index: usize,
    pub time: f64,
    pub pivot: ScreenPoint,
    pub bob1: ScreenPoint,
    pub bob2: ScreenPoint,
    pub info: [String; 2],
}

/// Live info text for one body.
pub fn info_line(body: usize, x: f64, y: f64, angle_deg: f64, velocity_deg: f64) -> String {
    format!(
        "Mass {body} X: {x:05.2}m, Y: {y:05.2}m, Angle: {angle_deg:05.1}deg, Velocity: {velocity_deg:06.1}deg/s"
    )
}

pub struct Playback<'a> {
    model: &'a PendulumModel,
    index: usize,
    stride: usize,
    scale: f64,
    pivot: ScreenPoint,
    delay: Duration,
    path: PathHistory<ScreenPoint>,
    // Second body of the last frame handed out; joins the trail on the next call.
    pending: Option<ScreenPoint>,
}

impl<'a> Playback<'a> {
    /// Pivot sits at (width / 2, height / 3) of the configured resolution.
    pub fn new(model: &'a PendulumModel, config: &ValidatedConfig) -> Self {
        let (width, height) = config.resolution();
        Self {
            model,
            index: 0,
            stride: config.frame_stride(),
            scale: config.scale(),
            pivot: ScreenPoint {
                x: (width / 2) as i32,
                y: (height / 3) as i32,
            },
            delay: config.frame_delay(),
            path: PathHistory::new(config.path_depth()),
            pending: None,
        }
    }

    fn to_screen(&self, x: f64, y: f64) -> ScreenPoint {
        ScreenPoint {
            x: (f64::from(self.pivot.x) + x).round() as i32,
            y: (f64::from(self.pivot.y) - y).round() as i32,
        }
    }

    /// Moves the previous frame's second body into the trail, builds the frame at the
    /// cursor and advances the cursor by the stride. Afterwards [`Playback::path`] is the
    /// trail to draw with the returned frame. Past the last trajectory point this returns
    /// `EndOfSimulation`.
    pub fn next_frame(&mut self) -> Result<Frame, EndOfSimulation> {
        if let Some(previous) = self.pending.take() {
            self.path.append(previous);
        }
        let i = self.index;
        let raw = self.model.positions(i)?;
        let px = self.model.scaled_positions(i, self.scale)?;
        let (angle1, angle2) = self.model.angles(i)?;
        let (vel1, vel2) = self.model.angular_velocities(i)?;
        let time = self.model.time(i)?;

        let bob1 = self.to_screen(px.x1, px.y1);
        let bob2 = self.to_screen(px.x2, px.y2);
        let frame = Frame {
            index: i,
            time,
            pivot: self.pivot,
            bob1,
            bob2,
            info: [
                info_line(1, raw.x1, raw.y1, angle1, vel1),
                info_line(2, raw.x2, raw.y2, angle2, vel2),
            ],
        };

        self.pending = Some(bob2);
        self.index += self.stride;
        Ok(frame)
    }

    /// Back to the first frame with an empty trail.
    pub fn rewind(&mut self) {
        self.index = 0;
        self.path.clear();
        self.pending = None;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn frame_delay(&self) -> Duration {
        self.delay
    }

    /// Total number of frames a full playback yields.
    pub fn frame_count(&self) -> usize {
        self.model.len().div_ceil(self.stride)
    }

    pub fn path(&self) -> &PathHistory<ScreenPoint> {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.model.len()
    }
}

impl Iterator for Playback<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.next_frame().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn setup(cfg: SimulationConfig) -> (PendulumModel, ValidatedConfig) {
        let v = cfg.validate().unwrap();
        (PendulumModel::from_config(&v).unwrap(), v)
    }

    #[test]
    fn info_line_matches_display_format() {
        assert_eq!(
            info_line(1, 0.707, -0.5, 45.0, -12.34),
            "Mass 1 X: 00.71m, Y: -0.50m, Angle: 045.0deg, Velocity: -012.3deg/s"
        );
    }

    #[test]
    fn resting_pendulum_hangs_below_pivot() {
        let (m, v) = setup(SimulationConfig {
            theta: vec![0.0, 0.0],
            time: 1.0,
            ..Default::default()
        });
        let mut pb = Playback::new(&m, &v);
        let f = pb.next_frame().unwrap();
        assert_eq!(f.pivot, ScreenPoint { x: 400, y: 266 });
        // 1.1 m and 2.1 m at 150 px/m below the pivot.
        assert_eq!(f.bob1, ScreenPoint { x: 400, y: 266 + 165 });
        assert_eq!(f.bob2, ScreenPoint { x: 400, y: 266 + 315 });
        assert!(pb.path().is_empty());
        assert_eq!(
            f.info[1],
            "Mass 2 X: 00.00m, Y: -2.10m, Angle: 000.0deg, Velocity: 0000.0deg/s"
        );
    }

    #[test]
    fn walks_with_stride_until_end() {
        let (m, v) = setup(SimulationConfig {
            time: 5.0,
            dt: 0.5,
            fps: 1,
            speed: 1.5,
            ..Default::default()
        });
        // 1 / 1 / 0.5 * 1.5 = 3 indices per frame over 11 points: 0, 3, 6, 9.
        let mut pb = Playback::new(&m, &v);
        assert_eq!(pb.stride(), 3);
        assert_eq!(pb.frame_count(), 4);
        let indices: Vec<usize> = pb.by_ref().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 3, 6, 9]);
        assert!(pb.is_finished());
        assert_eq!(
            pb.next_frame().unwrap_err(),
            EndOfSimulation { index: 12, len: 11 }
        );
    }

    #[test]
    fn trail_lags_one_frame_and_is_bounded() {
        let (m, v) = setup(SimulationConfig {
            time: 2.0,
            dt: 0.01,
            path_depth: 3,
            ..Default::default()
        });
        let mut pb = Playback::new(&m, &v);
        let mut bobs = Vec::new();
        let mut trails = Vec::new();
        for _ in 0..6 {
            let frame = pb.next_frame().unwrap();
            bobs.push(frame.bob2);
            trails.push(pb.path().to_vec());
        }
        assert!(trails[0].is_empty());
        assert_eq!(trails[1], vec![bobs[0]]);
        assert_eq!(trails[5], vec![bobs[2], bobs[3], bobs[4]]);
        assert_eq!(pb.path().len(), 3);

        pb.rewind();
        assert_eq!(pb.index(), 0);
        assert!(pb.path().is_empty());
    }
}
