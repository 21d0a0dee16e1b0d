use super::*;

const BASELINE: DriverProfile = DriverProfile {
    id: "",
    description: "",
    style: Style::Idle,
    lane: 0.0,
    lookahead_segments: 1,
    drift_horizon: 0.0,
    deadband: 0.05,
    brake_speed_ratio: 1.0,
    brake_curvature: 10.0,
    dodge: false,
    weave_hold_ticks: 0,
    weave_span: 0.0,
};

static PROFILES: [DriverProfile; 5] = [
    DriverProfile {
        id: "idle",
        description: "Never touches the controls; the field laps it.",
        ..BASELINE
    },
    DriverProfile {
        id: "flat-out",
        description: "Full throttle, no steering; drifts wide on every bend.",
        style: Style::FlatOut,
        ..BASELINE
    },
    DriverProfile {
        id: "line-keeper",
        description: "Holds the centerline, counter-steering against bend drift.",
        style: Style::LineKeeper,
        lookahead_segments: 6,
        drift_horizon: 0.35,
        deadband: 0.04,
        ..BASELINE
    },
    DriverProfile {
        id: "late-braker",
        description: "Centerline driver that brakes into sharp bends and dodges blockers.",
        style: Style::LateBraker,
        lookahead_segments: 10,
        drift_horizon: 0.35,
        deadband: 0.04,
        brake_speed_ratio: 0.82,
        brake_curvature: 0.9,
        dodge: true,
        ..BASELINE
    },
    DriverProfile {
        id: "weaver",
        description: "Picks a seeded random lane every second and chases it.",
        style: Style::Weaver,
        lookahead_segments: 6,
        drift_horizon: 0.3,
        deadband: 0.06,
        weave_hold_ticks: 60,
        weave_span: 0.7,
        ..BASELINE
    },
];

pub(super) fn driver_profiles() -> &'static [DriverProfile] {
    &PROFILES
}

pub(super) fn find_profile(id: &str) -> Option<DriverProfile> {
    driver_profiles()
        .iter()
        .find(|profile| profile.id == id)
        .copied()
}
