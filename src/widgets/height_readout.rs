use ratatui::{prelude::*, widgets::Widget};

use crate::{card::DeskStatus, localize::localize, text};

/// Current height in large type, with a caption line underneath while the
/// desk is in motion or unreachable.
#[derive(Clone, Debug, Default)]
pub struct HeightReadout {
    pub status: DeskStatus,
}

impl HeightReadout {
    pub fn new(status: DeskStatus) -> Self {
        Self { status }
    }

    fn caption(&self) -> Option<(String, Style)> {
        if !self.status.connected {
            return Some((
                localize("card.disconnected"),
                Style::default().fg(Color::Red).bold(),
            ));
        }

        if self.status.moving {
            return Some((
                localize("card.moving"),
                Style::default().fg(Color::Yellow).italic(),
            ));
        }

        None
    }
}

impl Widget for HeightReadout {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![Line::styled(
            text::format_height(self.status.height, &localize("card.unit")),
            Style::default().bold(),
        )];

        if let Some((caption, style)) = self.caption() {
            lines.push(Line::styled(caption, style));
        }

        Text::from(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn status(moving: bool, connected: bool) -> DeskStatus {
        DeskStatus {
            height: 72.5,
            moving,
            connected,
            alpha: 0.0,
        }
    }

    #[test]
    fn test_idle_readout_has_no_caption() {
        assert_eq!(HeightReadout::new(status(false, true)).caption(), None);
    }

    #[test]
    fn test_moving_readout_is_captioned() {
        let (caption, _) = HeightReadout::new(status(true, true)).caption().unwrap();
        assert_eq!(caption, localize("card.moving"));
    }

    #[test]
    fn test_disconnected_wins_over_moving() {
        let (caption, _) = HeightReadout::new(status(true, false)).caption().unwrap();
        assert_eq!(caption, localize("card.disconnected"));
    }
}
