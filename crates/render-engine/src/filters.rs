//! ffmpeg filter chain and watermark graph construction.
//!
//! Stage order is fixed and must not change: reordering alters the picture
//! (sharpening before scaling is not the same as after).
//!
//! ```text
//! fit ─► eq ─► unsharp ─► setpts ─► drawtext ─► fps
//! ```

use crate::options::{FitMode, ResolvedRender};
use crate::watermark::WatermarkPlacement;

const DEBUG_OVERLAY: &str =
    "drawtext=fontcolor=white:fontsize=24:text='%{n} %{filename}':x=20:y=20:box=1:boxcolor=black@0.5";

/// Format a number the way it appears in filter arguments and file names:
/// shortest round-trip form, with `.0` kept on integral values.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// The aspect-fit stage for a `width`x`height` output.
pub fn fit_filter(fit: FitMode, width: u32, height: u32) -> String {
    match fit {
        FitMode::Scale => format!("scale={width}:{height}:flags=lanczos"),
        FitMode::Pad => format!(
            "scale=iw*min({width}/iw\\,{height}/ih):ih*min({width}/iw\\,{height}/ih),pad={width}:{height}:(ow-iw)/2:(oh-ih)/2"
        ),
        FitMode::Crop(bias) => format!(
            "scale=iw*max({width}/iw\\,{height}/ih):ih*max({width}/iw\\,{height}/ih),crop={width}:{height}:(iw-ow)/2:{y}",
            y = bias.y_expr()
        ),
    }
}

/// Ordered filter stages; disabled stages are omitted.
pub fn filter_stages(render: &ResolvedRender) -> Vec<String> {
    let mut stages = vec![fit_filter(render.fit, render.width, render.height)];

    let grade = &render.grade;
    if grade.has_tone_adjustment() {
        stages.push(format!(
            "eq=gamma={}:contrast={}:saturation={}",
            format_number(grade.gamma),
            format_number(grade.contrast),
            format_number(grade.saturation)
        ));
    }

    if grade.has_clarity() {
        stages.push(format!("unsharp=3:3:{}", format_number(grade.clarity)));
    }

    if render.is_slowed() {
        stages.push(format!("setpts={}*PTS", format_number(render.slowdown)));
    }

    if render.debug_overlay {
        stages.push(DEBUG_OVERLAY.to_string());
    }

    // Lock fps last.
    stages.push(format!("fps={}", render.fps));

    stages
}

/// The `-vf` argument: stages joined with commas.
pub fn video_filter(render: &ResolvedRender) -> String {
    filter_stages(render).join(",")
}

/// The `-filter_complex` graph: the chain on input 0, the watermark (input 1)
/// scaled, faded and overlaid on top.
pub fn watermark_graph(chain: &str, watermark: &WatermarkPlacement) -> String {
    format!(
        "[0:v]{chain}[bg];[1:v]scale={px}:-1[wm];[wm]format=rgba,colorchannelmixer=aa={alpha}[wm2];[bg][wm2]overlay={pos}",
        px = watermark.target_px,
        alpha = format_number(watermark.alpha),
        pos = watermark.position.overlay_expr(),
    )
}
