use ratatui::prelude::*;

pub const COLUMNS: usize = 5;

/// Header, one row of five cells per visible trace, footer.
pub struct GridLayout {
    pub header: Rect,
    pub rows: Vec<[Rect; COLUMNS]>,
    pub footer: Rect,
}

impl GridLayout {
    pub fn create_layout(area: Rect, row_count: usize) -> GridLayout {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Header
                Constraint::Min(0),     // Trace rows
                Constraint::Length(3),  // Footer
            ])
            .split(area);

        let row_count = row_count.max(1) as u32;
        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Ratio(1, row_count); row_count as usize])
            .split(main_chunks[1]);

        let rows = row_areas
            .iter()
            .map(|row| {
                let cells = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints(vec![Constraint::Ratio(1, COLUMNS as u32); COLUMNS])
                    .split(*row);
                [cells[0], cells[1], cells[2], cells[3], cells[4]]
            })
            .collect();

        GridLayout {
            header: main_chunks[0],
            rows,
            footer: main_chunks[2],
        }
    }

    /// How many trace rows fit in `area` without going below `min_row_height`.
    pub fn visible_rows(area: Rect, min_row_height: u16, total: usize) -> usize {
        let content = area.height.saturating_sub(6);
        let fit = (content / min_row_height.max(1)).max(1) as usize;
        fit.min(total).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout() {
        let area = Rect::new(0, 0, 200, 46);
        let layout = GridLayout::create_layout(area, 2);
        assert_eq!(layout.rows.len(), 2);
        assert_eq!(layout.header.height, 3);
        assert_eq!(layout.footer.height, 3);
        assert_eq!(layout.rows[0][0].height, 20);
        assert_eq!(layout.rows[0].iter().map(|c| c.width).sum::<u16>(), 200);
    }

    #[test]
    fn test_visible_rows() {
        let area = Rect::new(0, 0, 200, 46);
        assert_eq!(GridLayout::visible_rows(area, 9, 10), 4);
        assert_eq!(GridLayout::visible_rows(area, 9, 2), 2);
        assert_eq!(GridLayout::visible_rows(Rect::new(0, 0, 80, 8), 9, 3), 1);
    }
}
