use serde::{Deserialize, Serialize};

use crate::error::TrackError;

/// One authored stretch of constant curvature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_length: usize,
    pub curvature: f64,
}

impl Run {
    pub const fn new(run_length: usize, curvature: f64) -> Self {
        Self {
            run_length,
            curvature,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub index: usize,
    pub curvature: f64,
}

pub const DEFAULT_BLUEPRINT: [Run; 15] = [
    Run::new(60, 0.0),
    Run::new(40, 0.6),
    Run::new(20, 1.05),
    Run::new(55, 0.35),
    Run::new(60, -0.65),
    Run::new(20, -1.1),
    Run::new(50, 0.0),
    Run::new(40, -0.4),
    Run::new(40, 0.45),
    Run::new(55, 0.0),
    Run::new(40, 0.55),
    Run::new(40, -0.55),
    Run::new(60, 0.0),
    Run::new(30, -0.1),
    Run::new(30, 0.0),
];

/// Immutable segment sequence for one race.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Track {
    segments: Vec<Segment>,
    segment_length: f64,
}

impl Track {
    /// Builds authored content. Panics on an empty blueprint or a zero-length
    /// run, since either would leave `segment_at` dividing by zero.
    pub fn build(blueprint: &[Run], segment_length: f64) -> Self {
        match Self::try_build(blueprint, segment_length) {
            Ok(track) => track,
            Err(err) => panic!("invalid track blueprint: {err}"),
        }
    }

    pub fn try_build(blueprint: &[Run], segment_length: f64) -> Result<Self, TrackError> {
        if blueprint.is_empty() {
            return Err(TrackError::EmptyBlueprint);
        }
        assert!(
            segment_length > 0.0,
            "segment length must be positive, got {segment_length}"
        );

        let total: usize = blueprint.iter().map(|run| run.run_length).sum();
        let mut segments = Vec::with_capacity(total);
        for (run_index, run) in blueprint.iter().enumerate() {
            if run.run_length == 0 {
                return Err(TrackError::ZeroLengthRun { run: run_index });
            }
            if !run.curvature.is_finite() {
                return Err(TrackError::NonFiniteCurvature { run: run_index });
            }
            for _ in 0..run.run_length {
                segments.push(Segment {
                    index: segments.len(),
                    curvature: run.curvature,
                });
            }
        }

        Ok(Self {
            segments,
            segment_length,
        })
    }

    pub fn default_circuit(segment_length: f64) -> Self {
        Self::build(&DEFAULT_BLUEPRINT, segment_length)
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    #[inline]
    pub fn total_length(&self) -> f64 {
        self.segments.len() as f64 * self.segment_length
    }

    /// `floor(position / segment_length) mod segment_count`, wrapping for
    /// positions outside `[0, total_length)` in either direction.
    #[inline]
    pub fn segment_index(&self, position: f64) -> usize {
        let raw = (position / self.segment_length).floor() as i64;
        raw.rem_euclid(self.segments.len() as i64) as usize
    }

    #[inline]
    pub fn segment_at(&self, position: f64) -> &Segment {
        &self.segments[self.segment_index(position)]
    }

    #[inline]
    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index % self.segments.len()]
    }

    /// Forward distance from `from` to `to` along the loop, in `[0, total_length)`.
    #[inline]
    pub fn forward_gap(&self, from: f64, to: f64) -> f64 {
        (to - from).rem_euclid(self.total_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_segment_straight() -> Track {
        Track::build(&[Run::new(2, 0.0)], 90.0)
    }

    #[test]
    fn two_segment_lookup_wraps() {
        let track = two_segment_straight();
        assert_eq!(track.total_length(), 180.0);
        assert_eq!(track.segment_at(0.0).index, 0);
        assert_eq!(track.segment_at(89.0).index, 0);
        assert_eq!(track.segment_at(90.0).index, 1);
        assert_eq!(track.segment_at(180.0).index, 0);
    }

    #[test]
    fn lookup_is_periodic_in_total_length() {
        let track = Track::default_circuit(90.0);
        let total = track.total_length();
        for position in [0.0, 45.0, 8_999.0, 30_015.5, total - 1.0] {
            let expected = track.segment_at(position).index;
            for k in [-3i32, -1, 1, 2, 7] {
                let shifted = position + f64::from(k) * total;
                assert_eq!(
                    track.segment_at(shifted).index,
                    expected,
                    "position {position} shifted by {k} laps"
                );
            }
        }
    }

    #[test]
    fn indices_follow_sequence_order_and_curvature_runs() {
        let track = Track::build(&[Run::new(2, 0.5), Run::new(3, -1.0)], 10.0);
        assert_eq!(track.segment_count(), 5);
        for (position, segment) in track.segments().iter().enumerate() {
            assert_eq!(segment.index, position);
        }
        assert_eq!(track.segment(1).curvature, 0.5);
        assert_eq!(track.segment(2).curvature, -1.0);
        assert_eq!(track.segment(7).index, 2);
    }

    #[test]
    fn default_circuit_has_640_segments() {
        let track = Track::default_circuit(90.0);
        assert_eq!(track.segment_count(), 640);
        assert_eq!(track.total_length(), 57_600.0);
    }

    #[test]
    fn try_build_rejects_malformed_blueprints() {
        assert_eq!(
            Track::try_build(&[], 90.0),
            Err(TrackError::EmptyBlueprint)
        );
        assert_eq!(
            Track::try_build(&[Run::new(4, 0.0), Run::new(0, 1.0)], 90.0),
            Err(TrackError::ZeroLengthRun { run: 1 })
        );
        assert_eq!(
            Track::try_build(&[Run::new(4, f64::NAN)], 90.0),
            Err(TrackError::NonFiniteCurvature { run: 0 })
        );
    }

    #[test]
    #[should_panic(expected = "invalid track blueprint")]
    fn build_fails_fast_on_empty_blueprint() {
        let _ = Track::build(&[], 90.0);
    }

    #[test]
    fn forward_gap_wraps_behind_to_ahead() {
        let track = two_segment_straight();
        assert_eq!(track.forward_gap(170.0, 10.0), 20.0);
        assert_eq!(track.forward_gap(10.0, 170.0), 160.0);
        assert_eq!(track.forward_gap(50.0, 50.0), 0.0);
    }
}
