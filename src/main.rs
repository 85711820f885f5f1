//! Isotet - tetrahedral isosurface extraction
//!
//! Samples the configured implicit field on a tetrahedral grid and extracts
//! its isosurface. Extra command line arguments are extra isovalues to
//! extract in turn, reusing the sampled field.

use std::process::ExitCode;

use isotet::config::AppConfig;
use isotet::systems::ExtractionSystem;

fn main() -> ExitCode {
    let loaded = AppConfig::load();
    let log_level = loaded
        .as_ref()
        .map(|c| c.debug.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
    log::info!("Starting Isotet");

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    let mut isovalues = vec![config.extraction.isovalue];
    for arg in std::env::args().skip(1) {
        match arg.parse::<f32>() {
            Ok(value) => isovalues.push(value),
            Err(_) => log::warn!("Ignoring argument '{}': not an isovalue", arg),
        }
    }

    let mut system = match ExtractionSystem::new(&config) {
        Ok(system) => system,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some((lo, hi)) = system.field_range() {
        log::info!("Field range: [{}, {}]", lo, hi);
    }

    for isovalue in isovalues {
        system.set_isovalue(isovalue);
        match system.run() {
            Ok(summary) if summary.is_empty() => {
                log::info!("Isovalue {} does not cross the field", isovalue);
            }
            Ok(_) => match system.surface_bounds() {
                Some((min, max)) => log::info!("Surface bounds: {:?} .. {:?}", min, max),
                None => log::info!(
                    "{} vertices written to GPU buffers; bounds are only computed for host output",
                    system.output_vertex_count()
                ),
            },
            Err(e) => {
                log::error!("Extraction at isovalue {} failed: {}", isovalue, e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
