use eframe::egui::Color32;

use crate::models::ThemeId;

#[derive(Clone, Copy)]
pub struct Palette {
    pub background: Color32,
    pub container: Color32,
    pub container_edge: Color32,
    pub text_main: Color32,
    pub text_row: Color32,
    pub text_header: Color32,
    pub on_pace_fill: Color32,
    pub on_pace_text: Color32,
    pub behind_fill: Color32,
    pub behind_text: Color32,
    pub row_odd: Color32,
    pub row_even: Color32,
    pub border: Color32,
    pub target_fill: Color32,
    pub target_text: Color32,
    pub progress_fill: Color32,
}

#[derive(Clone, Copy)]
pub struct HeaderLabels {
    pub operator: &'static str,
    pub hour_prefix: &'static str,
    pub total: &'static str,
    pub target: &'static str,
}

#[derive(Clone, Copy)]
pub struct Theme {
    pub id: ThemeId,
    pub label: &'static str,
    pub palette: Palette,
    pub headers: HeaderLabels,
}

impl Theme {
    pub fn hour_header(&self, index: usize) -> String {
        format!("{}{}", self.headers.hour_prefix, index + 1)
    }
}

pub const LEADER_GOLD: Color32 = Color32::from_rgb(250, 204, 21);
pub const TARGET_MET_FILL: Color32 = Color32::from_rgb(234, 179, 8);

pub fn theme_for(id: ThemeId) -> Theme {
    match id {
        ThemeId::YoungGuns => Theme {
            id,
            label: "Young Guns Industrial",
            palette: Palette {
                background: Color32::from_rgb(9, 9, 11),
                container: Color32::from_rgb(24, 24, 27),
                container_edge: Color32::from_rgb(255, 102, 0),
                text_main: Color32::WHITE,
                text_row: Color32::WHITE,
                text_header: Color32::from_rgb(255, 102, 0),
                on_pace_fill: Color32::from_rgb(20, 83, 45),
                on_pace_text: Color32::from_rgb(74, 222, 128),
                behind_fill: Color32::from_rgb(95, 25, 25),
                behind_text: Color32::from_rgb(248, 113, 113),
                row_odd: Color32::from_rgb(39, 39, 42),
                row_even: Color32::from_rgb(31, 31, 34),
                border: Color32::from_rgb(63, 63, 70),
                target_fill: Color32::from_rgb(30, 58, 138),
                target_text: Color32::from_rgb(219, 234, 254),
                progress_fill: Color32::from_rgb(249, 115, 22),
            },
            headers: HeaderLabels {
                operator: "Operator",
                hour_prefix: "H",
                total: "Total Units",
                target: "KPI Target",
            },
        },
        ThemeId::V8 => Theme {
            id,
            label: "V8 Supercars",
            palette: Palette {
                background: Color32::from_rgb(2, 6, 23),
                container: Color32::from_rgb(15, 23, 42),
                container_edge: Color32::from_rgb(34, 211, 238),
                text_main: Color32::WHITE,
                text_row: Color32::WHITE,
                text_header: Color32::from_rgb(34, 211, 238),
                on_pace_fill: Color32::from_rgb(22, 78, 99),
                on_pace_text: Color32::from_rgb(103, 232, 249),
                behind_fill: Color32::from_rgb(110, 20, 20),
                behind_text: Color32::from_rgb(252, 165, 165),
                row_odd: Color32::from_rgb(30, 41, 59),
                row_even: Color32::from_rgb(15, 23, 42),
                border: Color32::from_rgb(51, 65, 85),
                target_fill: Color32::from_rgb(220, 38, 38),
                target_text: Color32::WHITE,
                progress_fill: Color32::from_rgb(6, 182, 212),
            },
            headers: HeaderLabels {
                operator: "Driver",
                hour_prefix: "Lap",
                total: "Speed (KM/H)",
                target: "Pole Pos",
            },
        },
        ThemeId::Nrl => Theme {
            id,
            label: "NRL League",
            palette: Palette {
                background: Color32::from_rgb(5, 46, 22),
                container: Color32::from_rgb(20, 83, 45),
                container_edge: Color32::from_rgb(250, 204, 21),
                text_main: Color32::WHITE,
                text_row: Color32::WHITE,
                text_header: Color32::from_rgb(250, 204, 21),
                on_pace_fill: Color32::from_rgb(250, 204, 21),
                on_pace_text: Color32::from_rgb(20, 83, 45),
                behind_fill: Color32::from_rgb(127, 29, 29),
                behind_text: Color32::WHITE,
                row_odd: Color32::from_rgb(22, 101, 52),
                row_even: Color32::from_rgb(21, 92, 48),
                border: Color32::from_rgb(21, 128, 61),
                target_fill: Color32::WHITE,
                target_text: Color32::from_rgb(20, 83, 45),
                progress_fill: Color32::from_rgb(234, 179, 8),
            },
            headers: HeaderLabels {
                operator: "The Lineup",
                hour_prefix: "R",
                total: "Run Metres",
                target: "Try Line",
            },
        },
        ThemeId::Arcade => Theme {
            id,
            label: "Retro Arcade",
            palette: Palette {
                background: Color32::from_rgb(59, 7, 100),
                container: Color32::BLACK,
                container_edge: Color32::from_rgb(236, 72, 153),
                text_main: Color32::from_rgb(252, 231, 243),
                text_row: Color32::from_rgb(252, 231, 243),
                text_header: Color32::from_rgb(163, 230, 53),
                on_pace_fill: Color32::from_rgb(132, 204, 22),
                on_pace_text: Color32::BLACK,
                behind_fill: Color32::from_rgb(220, 38, 38),
                behind_text: Color32::WHITE,
                row_odd: Color32::from_rgb(46, 16, 72),
                row_even: Color32::from_rgb(24, 8, 38),
                border: Color32::from_rgb(112, 36, 78),
                target_fill: Color32::from_rgb(6, 182, 212),
                target_text: Color32::BLACK,
                progress_fill: Color32::from_rgb(132, 204, 22),
            },
            headers: HeaderLabels {
                operator: "Player 1",
                hour_prefix: "Lvl",
                total: "High Score",
                target: "Boss HP",
            },
        },
        ThemeId::Cricket => Theme {
            id,
            label: "Cricket Test Match",
            palette: Palette {
                background: Color32::from_rgb(2, 44, 34),
                container: Color32::WHITE,
                container_edge: Color32::from_rgb(6, 95, 70),
                text_main: Color32::WHITE,
                text_row: Color32::from_rgb(6, 78, 59),
                text_header: Color32::from_rgb(6, 95, 70),
                on_pace_fill: Color32::from_rgb(209, 250, 229),
                on_pace_text: Color32::from_rgb(6, 78, 59),
                behind_fill: Color32::from_rgb(254, 242, 242),
                behind_text: Color32::from_rgb(127, 29, 29),
                row_odd: Color32::from_rgb(243, 244, 246),
                row_even: Color32::WHITE,
                border: Color32::from_rgb(209, 213, 219),
                target_fill: Color32::from_rgb(153, 27, 27),
                target_text: Color32::WHITE,
                progress_fill: Color32::from_rgb(16, 185, 129),
            },
            headers: HeaderLabels {
                operator: "Batter",
                hour_prefix: "Ov",
                total: "Total Runs",
                target: "Target",
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_has_its_own_labels() {
        let labels: Vec<&str> = ThemeId::ALL.iter().map(|id| theme_for(*id).label).collect();
        assert_eq!(
            labels,
            vec![
                "Young Guns Industrial",
                "V8 Supercars",
                "NRL League",
                "Retro Arcade",
                "Cricket Test Match"
            ]
        );
        assert!(ThemeId::ALL.iter().all(|id| theme_for(*id).id == *id));
    }

    #[test]
    fn hour_headers_use_the_theme_prefix() {
        assert_eq!(theme_for(ThemeId::YoungGuns).hour_header(0), "H1");
        assert_eq!(theme_for(ThemeId::V8).hour_header(9), "Lap10");
        assert_eq!(theme_for(ThemeId::Cricket).headers.total, "Total Runs");
    }
}
