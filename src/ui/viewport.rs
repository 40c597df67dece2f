//! Terminal implementation of the timeline viewport.
//!
//! Nodes are measured in rows by wrapping their text to the pane width. One row is
//! `ROW_UNITS` viewport units.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::widgets::sanitize_text;
use crate::constants::ROW_UNITS;
use crate::timeline::surface::NodeId;
use crate::timeline::{NodeKind, Placeholder, ScrollMetrics, Surface, Viewport};

/// Columns message text is indented by
pub const BODY_INDENT: u16 = 2;

/// One visible row of the timeline pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineLine {
    DateSeparator(NaiveDate),
    OlderMessages(usize),
    NewerMessages(usize),
    Loading,
    Header {
        sender: String,
        time: NaiveDateTime,
    },
    Body {
        text: String,
        media: bool,
    },
    Placeholder(Placeholder),
}

#[derive(Debug, Clone, Default)]
pub struct TerminalViewport {
    /// Pane size in columns and rows
    width: u16,
    height: u16,
    scroll_top: u32,
    /// Rows of each node, in surface order
    rows: Vec<u32>,
    /// Measured rows by node identity and header flag, valid for the current width
    measured: HashMap<(NodeId, bool), u32>,
}

impl TerminalViewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// The pane was resized. Re-measures everything when the width changed.
    pub fn resize(&mut self, width: u16, height: u16, surface: &Surface) {
        if width != self.width {
            self.measured.clear();
        }
        self.width = width;
        self.height = height;
        self.measure(surface);
        self.set_scroll_top(self.scroll_top);
    }

    fn body_width(&self) -> usize {
        usize::from(self.width.saturating_sub(BODY_INDENT).max(1))
    }

    fn measure(&mut self, surface: &Surface) {
        let width = self.body_width();
        let mut prev: Option<&NodeKind> = None;
        let mut rows = Vec::with_capacity(surface.len());
        let mut measured = HashMap::with_capacity(surface.len());

        for node in surface.nodes() {
            let header = shows_header(prev, &node.kind);
            let key = (node.id, header);
            let height = match self.measured.get(&key) {
                Some(&height) => height,
                None => node_rows(&node.kind, header, width),
            };
            measured.insert(key, height);
            rows.push(height);
            prev = Some(&node.kind);
        }

        // Entries of nodes that left the surface are dropped here
        self.measured = measured;
        self.rows = rows;
    }

    fn content_rows(&self) -> u32 {
        self.rows.iter().sum()
    }

    /// First visible row
    pub fn top_row(&self) -> u32 {
        self.scroll_top / ROW_UNITS
    }

    /// Rows of the surface that fall inside the pane
    pub fn visible_lines(&self, surface: &Surface) -> Vec<TimelineLine> {
        let first = self.top_row();
        let last = first + u32::from(self.height);
        let width = self.body_width();

        let mut lines = Vec::with_capacity(usize::from(self.height));
        let mut row = 0u32;
        let mut prev: Option<&NodeKind> = None;
        for (node, &height) in surface.nodes().iter().zip(&self.rows) {
            if row >= last {
                break;
            }
            if row + height > first {
                let header = shows_header(prev, &node.kind);
                let node_lines = node_lines(&node.kind, header, width);
                let skip = first.saturating_sub(row) as usize;
                let take = (last - row.max(first)) as usize;
                lines.extend(node_lines.into_iter().skip(skip).take(take));
            }
            row += height;
            prev = Some(&node.kind);
        }
        lines
    }
}

impl Viewport for TerminalViewport {
    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height: self.content_rows() * ROW_UNITS,
            client_height: u32::from(self.height) * ROW_UNITS,
        }
    }

    fn set_scroll_top(&mut self, top: u32) {
        let metrics = self.metrics();
        let max = metrics.scroll_height.saturating_sub(metrics.client_height);
        self.scroll_top = top.min(max);
    }

    fn surface_changed(&mut self, surface: &Surface) {
        self.measure(surface);
    }

    fn layout(&mut self, _surface: &Surface) {}

    fn node_offset(&self, _surface: &Surface, pos: usize) -> u32 {
        self.rows.iter().take(pos).sum::<u32>() * ROW_UNITS
    }
}

/// Whether a message node starts with a sender line
fn shows_header(prev: Option<&NodeKind>, kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Message { group_start, .. } => {
            *group_start || !matches!(prev, Some(NodeKind::Message { .. }))
        }
        _ => false,
    }
}

fn node_rows(kind: &NodeKind, header: bool, width: usize) -> u32 {
    match kind {
        NodeKind::Message { message, .. } => {
            let body = wrap_text(&sanitize_text(message.display_text()), width)
                .len()
                .max(1);
            u32::from(header) + body as u32
        }
        _ => 1,
    }
}

fn node_lines(kind: &NodeKind, header: bool, width: usize) -> Vec<TimelineLine> {
    match kind {
        NodeKind::OlderMessages { remaining } => vec![TimelineLine::OlderMessages(*remaining)],
        NodeKind::NewerMessages { remaining } => vec![TimelineLine::NewerMessages(*remaining)],
        NodeKind::Loading => vec![TimelineLine::Loading],
        NodeKind::DateSeparator(day) => vec![TimelineLine::DateSeparator(*day)],
        NodeKind::Placeholder(p) => vec![TimelineLine::Placeholder(p.clone())],
        NodeKind::Message { message, .. } => {
            let mut lines = Vec::new();
            if header {
                lines.push(TimelineLine::Header {
                    sender: message.sender.clone(),
                    time: message.timestamp,
                });
            }
            let mut body = wrap_text(&sanitize_text(message.display_text()), width);
            if body.is_empty() {
                body.push(String::new());
            }
            lines.extend(body.into_iter().map(|text| TimelineLine::Body {
                text,
                media: message.is_media,
            }));
            lines
        }
    }
}

/// Wrap `text` to `width` display columns, breaking on spaces where possible.
///
/// Explicit newlines are kept; words wider than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_width = 0;

        for word in paragraph.split(' ') {
            let word_width = word.width();
            let sep = usize::from(!line.is_empty());

            if line_width + sep + word_width <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_width += sep + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            for c in word.chars() {
                let cw = c.width().unwrap_or(0);
                if line_width + cw > width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(c);
                line_width += cw;
            }
        }
        lines.push(line);
    }
    lines
}
