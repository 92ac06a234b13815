//! Dashboard screen: one tile per summarised resource

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::admin_tui::{app::Screen, traits::ScreenAction, ui::Styles};
use crate::api::ResourceApi;
use crate::dashboard::{load_summary, SummaryTile, TileValue, SUMMARY_RESOURCES};

const TILES_PER_ROW: usize = 3;

#[derive(Default)]
pub struct DashboardScreen {
    pub tiles: Vec<SummaryTile>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh(&mut self, api: &dyn ResourceApi) -> ScreenAction {
        self.tiles = load_summary(api, &SUMMARY_RESOURCES).await;
        let failed = self
            .tiles
            .iter()
            .filter(|t| matches!(t.value, TileValue::Unavailable(_)))
            .count();
        if failed == 0 {
            ScreenAction::SetStatus("Dashboard updated".to_string())
        } else {
            ScreenAction::SetError(format!("{} of {} tiles could not be loaded", failed, self.tiles.len()))
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent, api: &dyn ResourceApi) -> ScreenAction {
        match key.code {
            KeyCode::Char('r') => self.refresh(api).await,
            KeyCode::Enter => match self.tiles.first() {
                Some(tile) => ScreenAction::NavigateTo(Screen::Resource(tile.resource)),
                None => ScreenAction::None,
            },
            KeyCode::Esc => ScreenAction::NavigateBack,
            _ => ScreenAction::None,
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, styles: &Styles) {
        let block = Block::default()
            .title("Dashboard (r: refresh, Esc: back)")
            .borders(Borders::ALL)
            .border_style(styles.active_border());
        let inner = block.inner(area);
        f.render_widget(block, area);

        if self.tiles.is_empty() {
            f.render_widget(
                Paragraph::new("Loading...").style(styles.inactive()),
                inner,
            );
            return;
        }

        let rows: Vec<&[SummaryTile]> = self.tiles.chunks(TILES_PER_ROW).collect();
        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                rows.iter()
                    .map(|_| Constraint::Length(5))
                    .chain(std::iter::once(Constraint::Min(0)))
                    .collect::<Vec<_>>(),
            )
            .split(inner);

        for (row, row_area) in rows.iter().zip(row_areas.iter()) {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(
                    (0..TILES_PER_ROW)
                        .map(|_| Constraint::Ratio(1, TILES_PER_ROW as u32))
                        .collect::<Vec<_>>(),
                )
                .split(*row_area);

            for (tile, tile_area) in row.iter().zip(columns.iter()) {
                let value_style = match tile.value {
                    TileValue::Count(_) => styles.title(),
                    TileValue::Unavailable(_) => styles.error(),
                };
                let detail = match &tile.value {
                    TileValue::Count(_) => Span::styled("records", styles.inactive()),
                    TileValue::Unavailable(message) => Span::styled(message.clone(), styles.error()),
                };
                let text = vec![
                    Line::from(Span::styled(tile.display(), value_style)),
                    Line::from(detail),
                ];
                let tile_block = Block::default()
                    .title(tile.resource.as_str())
                    .borders(Borders::ALL)
                    .border_style(styles.inactive_border());
                f.render_widget(
                    Paragraph::new(text)
                        .alignment(Alignment::Center)
                        .block(tile_block),
                    *tile_area,
                );
            }
        }
    }
}
