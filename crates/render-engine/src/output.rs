//! Output file naming.
//!
//! `[YYYY-MM-DD_]<base>_<resolution>[_<look>][_slow<F>x][_boom][_vertical][_WM-<pos>].mp4`

use std::path::Path;

use chrono::NaiveDate;

use crate::filters::format_number;
use crate::options::ResolvedRender;

/// Base name for a manifest: its file stem, e.g. `night1` for `night1.txt`.
pub fn default_base_name(manifest_path: &Path) -> String {
    manifest_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "timelapse".to_string())
}

/// Suffix tags in their fixed order.
pub fn suffix_tags(render: &ResolvedRender) -> Vec<String> {
    let mut tags = vec![render.resolution.tag().to_string()];

    if let Some(look) = render.look {
        tags.push(look.name().to_string());
    }

    if render.is_slowed() {
        tags.push(format!("slow{}x", format_number(render.slowdown)));
    }

    if render.boomerang {
        tags.push("boom".to_string());
    }

    if render.orientation.is_vertical() {
        tags.push("vertical".to_string());
    }

    // Only tag the position when a watermark is actually composited.
    if let Some(wm) = &render.watermark {
        tags.push(format!("WM-{}", wm.position.name()));
    }

    tags
}

/// Full output file name, optionally prefixed with the capture date.
pub fn output_file_name(base: &str, date: Option<NaiveDate>, render: &ResolvedRender) -> String {
    let base = match date {
        Some(date) => format!("{}_{base}", date.format("%Y-%m-%d")),
        None => base.to_string(),
    };
    format!("{base}_{}.mp4", suffix_tags(render).join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::look::LookPreset;
    use crate::options::{Orientation, RenderOptions, Resolution};
    use crate::watermark::{WatermarkOptions, WatermarkPosition};

    #[test]
    fn test_base_name_from_manifest() {
        assert_eq!(default_base_name(Path::new("/x/night1.txt")), "night1");
        assert_eq!(default_base_name(Path::new("file_list")), "file_list");
    }

    #[test]
    fn test_seq1_aurora_name() {
        let render = RenderOptions {
            resolution: Resolution::K4,
            look: Some(LookPreset::Aurora),
            slowdown: 1.5,
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(
            output_file_name("seq1", None, &render),
            "seq1_4k_aurora_slow1.5x.mp4"
        );
    }

    #[test]
    fn test_all_tags_in_order_with_date() {
        let render = RenderOptions {
            resolution: Resolution::Hd,
            orientation: Orientation::Vertical,
            look: Some(LookPreset::AuroraBoosted),
            slowdown: 2.0,
            boomerang: true,
            watermark: Some(WatermarkOptions {
                position: WatermarkPosition::CenterBottom,
                ..WatermarkOptions::new("logo.png")
            }),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            output_file_name("lofoten", Some(date), &render),
            "2024-03-09_lofoten_HD_aurora-boosted_slow2.0x_boom_vertical_WM-center-bottom.mp4"
        );
    }

    #[test]
    fn test_plain_name_has_only_resolution() {
        let render = RenderOptions::default().resolve().unwrap();
        assert_eq!(output_file_name("x", None, &render), "x_1080p.mp4");
    }
}
