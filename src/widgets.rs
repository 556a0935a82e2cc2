use eframe::egui::{Color32, Label, Response, RichText, Sense, Ui, Vec2, Widget};

use crate::countdown::Time;

/// the big zero-padded HH:MM:SS readout
pub struct TimeDisplay {
    time: Time,
    minimized: bool,
}

impl TimeDisplay {
    #[must_use]
    pub const fn new(time: Time) -> Self {
        Self {
            time,
            minimized: false,
        }
    }

    /// compact variant for the floating overlay
    #[must_use]
    pub const fn minimized(mut self) -> Self {
        self.minimized = true;
        self
    }
}

impl Widget for TimeDisplay {
    fn ui(self, ui: &mut Ui) -> Response {
        let size = if self.minimized { 28.0 } else { 72.0 };
        let text = format!(
            "{:02}:{:02}:{:02}",
            self.time.hours, self.time.minutes, self.time.seconds
        );
        ui.add(Label::new(RichText::new(text).monospace().size(size).strong()))
    }
}

/// compact form for list cards; the hours segment is hidden while zero
#[must_use]
pub fn format_time(time: Time) -> String {
    if time.hours > 0 {
        format!(
            "{:02}:{:02}:{:02}",
            time.hours, time.minutes, time.seconds
        )
    } else {
        format!("{:02}:{:02}", time.minutes, time.seconds)
    }
}

/// "#RRGGBB" to a color; anything unparseable falls back to gray
#[must_use]
pub fn parse_color(hex: &str) -> Color32 {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return Color32::GRAY;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Ok(r), Ok(g), Ok(b)) => Color32::from_rgb(r, g, b),
        _ => Color32::GRAY,
    }
}

/// the small square color tag shown next to timer names
pub fn color_dot(ui: &mut Ui, color: &str) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(10.0), Sense::hover());
    ui.painter().rect_filled(rect, 2.0, parse_color(color));
}

#[cfg(test)]
mod tests {
    use super::{format_time, parse_color};
    use crate::countdown::Time;
    use eframe::egui::Color32;

    #[test]
    fn hours_are_hidden_while_zero() {
        assert_eq!(format_time(Time::new(0, 5, 3)), "05:03");
        assert_eq!(format_time(Time::new(2, 5, 3)), "02:05:03");
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#FF5733"), Color32::from_rgb(0xFF, 0x57, 0x33));
        assert_eq!(parse_color("not a color"), Color32::GRAY);
    }
}
