use ratatui::{prelude::*, widgets::Widget};

use crate::card::DeskStatus;

/// Side view of the desk. Two layers travel with the height: the desktop
/// (full travel) and the crossbar (two thirds of it), so raising the desk
/// visibly stretches the legs. The feet stay on the floor.
#[derive(Clone, Debug, Default)]
pub struct DeskFigure {
    pub status: DeskStatus,
    pub style: Style,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FigureRows {
    desktop: u16,
    crossbar: u16,
    floor: u16,
}

impl DeskFigure {
    pub fn new(status: DeskStatus) -> Self {
        Self {
            status,
            style: Style::default(),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn rows(&self, area: Rect) -> Option<FigureRows> {
        if area.height < 5 || area.width < 8 {
            return None;
        }

        let floor = area.bottom() - 1;
        let travel = area.height - 3;
        let crossbar_travel = travel * 2 / 3;

        let desktop = area.y + self.status.visual_offset(travel);
        let crossbar = floor - 1 - crossbar_travel + self.status.visual_offset(crossbar_travel);

        Some(FigureRows {
            desktop,
            crossbar,
            floor,
        })
    }

    fn leg_columns(area: Rect) -> (u16, u16) {
        let inset = area.width / 4;
        (area.x + inset, area.x + area.width - 1 - inset)
    }
}

impl Widget for DeskFigure {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(rows) = self.rows(area) else {
            return;
        };
        let (left, right) = Self::leg_columns(area);

        // Floor line with feet under the legs.
        for x in area.left()..area.right() {
            buf[(x, rows.floor)].set_symbol("─").set_style(self.style);
        }
        buf[(left, rows.floor)].set_symbol("┴").set_style(self.style);
        buf[(right, rows.floor)].set_symbol("┴").set_style(self.style);

        // Legs from below the desktop down to the feet.
        for y in (rows.desktop + 1)..rows.floor {
            buf[(left, y)].set_symbol("┃").set_style(self.style);
            buf[(right, y)].set_symbol("┃").set_style(self.style);
        }

        // Crossbar between the legs.
        for x in (left + 1)..right {
            buf[(x, rows.crossbar)].set_symbol("═").set_style(self.style);
        }
        buf[(left, rows.crossbar)].set_symbol("╠").set_style(self.style);
        buf[(right, rows.crossbar)].set_symbol("╣").set_style(self.style);

        // Desktop spans the full width, with a monitor on top when it fits.
        for x in area.left()..area.right() {
            buf[(x, rows.desktop)]
                .set_symbol("━")
                .set_style(self.style.bold());
        }
        if rows.desktop > area.y {
            let center = area.x + area.width / 2;
            for x in center.saturating_sub(1)..=(center + 1).min(area.right() - 1) {
                buf[(x, rows.desktop - 1)]
                    .set_symbol("▄")
                    .set_style(self.style);
            }
        }
    }
}
