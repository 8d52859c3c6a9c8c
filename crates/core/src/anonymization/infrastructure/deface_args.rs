use std::ffi::OsString;
use std::path::Path;

use crate::anonymization::domain::anonymization_params::{
    AnonymizationMethod, AnonymizationParams,
};
use crate::shared::constants::{DEFAULT_MASK_SCALE, DEFAULT_MOSAIC_SIZE, DEFAULT_THRESHOLD};

const EPSILON: f64 = 1e-9;

/// Builds the deface command line for one file.
///
/// Options equal to deface's own defaults are left out so the command stays
/// readable in the log.
pub fn build(
    input: &Path,
    output: &Path,
    params: &AnonymizationParams,
    detection_size: Option<(u32, u32)>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![input.into(), "-o".into(), output.into()];

    if (params.threshold - DEFAULT_THRESHOLD).abs() > EPSILON {
        args.push("--thresh".into());
        args.push(params.threshold.to_string().into());
    }
    if (params.mask_scale - DEFAULT_MASK_SCALE).abs() > EPSILON {
        args.push("--mask-scale".into());
        args.push(params.mask_scale.to_string().into());
    }
    match params.method {
        AnonymizationMethod::Blur => {}
        AnonymizationMethod::Box => {
            args.push("--replacewith".into());
            args.push("solid".into());
        }
        AnonymizationMethod::Mosaic => {
            args.push("--replacewith".into());
            args.push("mosaic".into());
            if params.mosaic_size != DEFAULT_MOSAIC_SIZE {
                args.push("--mosaicsize".into());
                args.push(params.mosaic_size.to_string().into());
            }
        }
    }
    if params.box_shape {
        args.push("--boxes".into());
    }
    if params.draw_scores {
        args.push("--draw-scores".into());
    }
    if let Some((w, h)) = detection_size {
        args.push("--scale".into());
        args.push(format!("{w}x{h}").into());
    }

    args
}

/// Renders arguments for logging.
pub fn display(program: &Path, args: &[OsString]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}
