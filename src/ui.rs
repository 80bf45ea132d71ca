use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{
        Block, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
    },
};

use crate::filter::FilterField;
use crate::model::{Model, Modus};
use crate::record::VehicleCode;
use crate::sort::{Column, cell_text};
use crate::table::{TableView, ViewState};

pub const FILTERBAR_HEIGHT: u16 = 3;
pub const PAGER_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGH: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn draw(model: &Model, frame: &mut Frame) {
    let [filter_area, table_area, pager_area, status_area] = Layout::vertical([
        Constraint::Length(FILTERBAR_HEIGHT),
        Constraint::Min(3),
        Constraint::Length(PAGER_HEIGHT),
        Constraint::Length(CMDLINE_HEIGH),
    ])
    .areas(frame.area());

    draw_filter_bar(model, frame, filter_area);

    match model.view_state() {
        ViewState::Loaded => draw_table(model, frame, table_area),
        ViewState::Empty => draw_notice(frame, table_area, "Loading vehicles ...".into()),
        ViewState::Failed(e) => draw_notice(
            frame,
            table_area,
            Line::from(vec![
                "Could not load vehicles: ".into(),
                e.clone().red().bold(),
                "  (r to retry)".into(),
            ]),
        ),
        ViewState::Destroyed => {}
    }

    draw_pager(model.table(), frame, pager_area);
    draw_status_line(model, frame, status_area);

    match model.modus() {
        Modus::POPUP => draw_help(model, frame),
        Modus::FACETPICK(field) => draw_facet_picker(model, field, frame),
        Modus::RECORD => {
            if let Some(record) = model.table().selected_record() {
                draw_record(record, frame);
            }
        }
        _ => {}
    }
}

fn draw_filter_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let areas = Layout::horizontal([
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ])
    .split(area);

    let filter = model.table().filter();
    for (field, field_area) in FilterField::ALL.iter().zip(areas.iter()) {
        let editing = model.modus() == Modus::FILTERINPUT(*field);
        let value = if editing {
            model.input().input.clone()
        } else {
            filter.get(*field).to_string()
        };
        let border_style = if editing {
            Style::new().yellow().bold()
        } else if value.is_empty() {
            Style::new().dark_gray()
        } else {
            Style::new().cyan()
        };
        let block = Block::bordered()
            .title(format!(" {} ", field.label()))
            .border_style(border_style);
        frame.render_widget(Paragraph::new(value).block(block), *field_area);

        if editing {
            let x = (field_area.x + 1).saturating_add(clamp_u16(model.input().curser_pos));
            let max_x = field_area.x + field_area.width.saturating_sub(2);
            frame.set_cursor_position((std::cmp::min(x, max_x), field_area.y + 1));
        }
    }
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn column_widths(rows: &[&VehicleCode], max_column_width: usize) -> Vec<Constraint> {
    Column::ALL
        .iter()
        .map(|column| {
            let header = column.label().chars().count() + COLUMN_WIDTH_MARGIN;
            let content = rows
                .iter()
                .map(|r| cell_text(r, *column).chars().count())
                .max()
                .unwrap_or(0);
            let width = std::cmp::min(std::cmp::max(header, content), max_column_width);
            Constraint::Length(clamp_u16(width))
        })
        .collect()
}

fn draw_table(model: &Model, frame: &mut Frame, area: Rect) {
    let table = model.table();
    let rows = table.visible();
    let sort = table.sort();

    let header = Row::new(Column::ALL.iter().map(|column| {
        let mut label = column.label().to_string();
        if let Some(s) = sort.filter(|s| s.column == *column) {
            label.push(' ');
            label.push_str(s.indicator());
        }
        Cell::from(label)
    }))
    .style(Style::new().bold().underlined());

    let body = rows.iter().map(|record| {
        Row::new(
            Column::ALL
                .iter()
                .map(|column| Cell::from(cell_text(record, *column))),
        )
    });

    let title = Line::from(format!(" {} ", table.name()).bold());
    let block = Block::bordered()
        .title(title.centered())
        .border_set(border::THICK);

    let widget = Table::new(body, column_widths(&rows, model.max_column_width()))
        .header(header)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED))
        .column_highlight_style(Style::new().fg(Color::Yellow));

    let mut state = TableState::default()
        .with_selected(if rows.is_empty() {
            None
        } else {
            Some(table.curser_row)
        })
        .with_selected_column(Some(table.curser_column));

    if rows.is_empty() {
        frame.render_widget(widget, area);
        let hint = Paragraph::new("No vehicles match the current filter.".italic()).centered();
        let inner = Rect {
            y: area.y + 2,
            height: 1,
            ..area
        };
        frame.render_widget(hint, inner);
    } else {
        frame.render_stateful_widget(widget, area, &mut state);
    }
}

fn draw_notice(frame: &mut Frame, area: Rect, text: Line) {
    let block = Block::bordered().border_set(border::THICK);
    frame.render_widget(Paragraph::new(text).centered().block(block), area);
}

fn draw_pager(table: &TableView, frame: &mut Frame, area: Rect) {
    let filtered = table.filtered_len();
    let begin = table.page() * table.page_size();
    let shown = table.visible().len();
    let range = if shown == 0 {
        "0".to_string()
    } else {
        format!("{}-{}", begin + 1, begin + shown)
    };
    let mut spans = vec![
        Span::from(format!(" {range} of {filtered}")),
        Span::from(format!(
            "  page {}/{}",
            table.page() + 1,
            table.page_count()
        )),
        Span::from(format!("  {} per page", table.page_size())),
    ];
    if !table.filter().is_empty() {
        spans.push(format!("  (filtered from {})", table.total_len()).dark_gray());
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_status_line(model: &Model, frame: &mut Frame, area: Rect) {
    let message = if model.status_message_age() < STATUS_MESSAGE_TIMEOUT {
        model.status_message().to_string()
    } else {
        String::new()
    };
    let mode = match model.modus() {
        Modus::TABLE => "TABLE",
        Modus::RECORD => "RECORD",
        Modus::POPUP => "HELP",
        Modus::FILTERINPUT(_) => "FILTER",
        Modus::FACETPICK(_) => "PICK",
    };
    let table = model.table();
    let position = if table.selected_record().is_some() {
        format!(" {}/{} ", table.selected_position() + 1, table.filtered_len())
    } else {
        " ".to_string()
    };
    let line = Line::from(vec![
        format!(" {mode} ").black().on_cyan(),
        position.into(),
        message.into(),
    ]);
    let help = Line::from(vec![
        "?".blue().bold(),
        " help  ".into(),
        "q".blue().bold(),
        " quit ".into(),
    ]);
    let [left, right] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(16)]).areas(area);
    frame.render_widget(Paragraph::new(line), left);
    frame.render_widget(Paragraph::new(help.right_aligned()), right);
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    horizontal
}

fn draw_help(model: &Model, frame: &mut Frame) {
    let area = popup_area(frame.area(), 60, 70);
    let block = Block::bordered()
        .title(Line::from(" Help ".bold()).centered())
        .title_bottom(Line::from(" <Esc> close ").centered())
        .border_set(border::THICK);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(model.help_text())
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn draw_facet_picker(model: &Model, field: FilterField, frame: &mut Frame) {
    let picker = model.picker();
    let area = popup_area(frame.area(), 40, 60);
    let items: Vec<ListItem> = std::iter::once(ListItem::new("(any)".italic()))
        .chain(picker.options.iter().map(|o| ListItem::new(o.as_str())))
        .collect();
    let list = List::new(items)
        .block(
            Block::bordered()
                .title(Line::from(format!(" {} ", field.label()).bold()).centered())
                .title_bottom(Line::from(" <Enter> pick  <Esc> cancel ").centered()),
        )
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(picker.selected));
    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_record(record: &VehicleCode, frame: &mut Frame) {
    let area = popup_area(frame.area(), 70, 60);
    let rows = Column::ALL.iter().map(|column| {
        Row::new(vec![
            Cell::from(column.label().bold()),
            Cell::from(cell_text(record, *column)),
        ])
    });
    let widget = Table::new(rows, [Constraint::Length(14), Constraint::Fill(1)]).block(
        Block::bordered()
            .title(Line::from(" Record ".bold()).centered())
            .title_bottom(Line::from(" <Esc> back ").centered())
            .border_set(border::THICK),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(widget, area);
}
