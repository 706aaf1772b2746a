//! Headless driver: runs the solver plugin for a fixed number of frames and
//! logs where the material is.
//!
//! Usage: `mpm3d [fluid|elastic] [low|medium|high|ultra] [frames]`

use bevy::log::LogPlugin;
use bevy::prelude::*;

use mpm3d::{MpmPlugin, MpmState, Quality, SolverParams};

const DEFAULT_FRAMES: u32 = 240;
const REPORT_EVERY: u32 = 30;

fn parse_quality(arg: &str) -> Option<Quality> {
    Quality::ALL
        .into_iter()
        .find(|quality| quality.name().eq_ignore_ascii_case(arg))
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut params = match args.first().map(String::as_str) {
        Some("elastic") => SolverParams::elastic(),
        _ => SolverParams::fluid(),
    };
    if let Some(quality) = args.get(1).and_then(|arg| parse_quality(arg)) {
        params = params.with_quality(quality);
    }
    let frames = args
        .get(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(MpmPlugin::new(params));

    for frame in 0..frames {
        app.update();

        let Some(state) = app.world().get_resource::<MpmState>() else {
            error!("solver state missing, stopping");
            return;
        };
        if frame % REPORT_EVERY == 0 || frame + 1 == frames {
            let report = state.last_report();
            info!(
                "frame {frame}: com {:?}, kinetic energy {:.3}, step {:.2}ms, dropped {}, recovered {}",
                state.center_of_mass(),
                state.kinetic_energy(),
                report.timings.total(),
                report.dropped,
                report.recovered,
            );
        }
    }
}
