use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::category::PerformanceTier;
use crate::data::model::Grade;
use crate::recommend::Urgency;

// ---------------------------------------------------------------------------
// Color ramp
// ---------------------------------------------------------------------------

/// Convert an HSL triple (hue in degrees) into an egui colour.
fn hsl(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

/// `n` colours on a red → green ramp, worst first.
pub fn achievement_ramp(n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![hsl(120.0, 0.6, 0.45)],
        _ => (0..n)
            .map(|i| {
                let hue = i as f32 / (n - 1) as f32 * 120.0;
                hsl(hue, 0.65, 0.48)
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Per-value colours
// ---------------------------------------------------------------------------

pub fn grade_color(grade: Grade) -> Color32 {
    let ramp = achievement_ramp(4);
    let idx = match grade {
        Grade::C => 0,
        Grade::B => 1,
        Grade::A => 2,
        Grade::AD => 3,
    };
    ramp[idx]
}

pub fn tier_color(tier: PerformanceTier) -> Color32 {
    let ramp = achievement_ramp(4);
    let idx = match tier {
        PerformanceTier::Regular => 0,
        PerformanceTier::Good => 1,
        PerformanceTier::VeryGood => 2,
        PerformanceTier::Excellent => 3,
    };
    ramp[idx]
}

pub fn urgency_color(urgency: Urgency) -> Color32 {
    match urgency {
        Urgency::Success => hsl(120.0, 0.6, 0.40),
        Urgency::Warning => hsl(38.0, 0.9, 0.50),
        Urgency::Error => hsl(0.0, 0.75, 0.52),
    }
}
