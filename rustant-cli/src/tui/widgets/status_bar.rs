//! Status bar widget showing keybinding hints and current mode.

use crate::tui::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

/// The current input mode of the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum InputMode {
    Normal,
    VimNormal,
    VimInsert,
    CommandPalette,
    Autocomplete,
    Approval,
}

impl InputMode {
    /// Short display label for the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "INSERT",
            Self::VimNormal => "VIM-N",
            Self::VimInsert => "VIM-I",
            Self::CommandPalette => "CMD",
            Self::Autocomplete => "AUTO",
            Self::Approval => "APPROVE",
        }
    }

    /// Whether vim mode is active (either normal or insert).
    #[allow(dead_code)]
    pub fn is_vim(&self) -> bool {
        matches!(self, Self::VimNormal | Self::VimInsert)
    }
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Metrics data for the status bar.
#[derive(Debug, Clone, Default)]
pub struct StatusBarData {
    /// Total tokens consumed so far.
    pub tokens_used: usize,
    /// Context window size in tokens.
    pub context_window: usize,
    /// Cumulative cost in USD.
    pub cost_usd: f64,
    /// Whether voice command mode is active.
    pub voice_active: bool,
    /// Whether meeting recording is active.
    pub meeting_active: bool,
}

/// Format a token count as a compact string (e.g., "12.4k", "1.2M").
fn format_tokens_compact(tokens: usize) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        format!("{}", tokens)
    }
}

/// Render the status bar.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    mode: InputMode,
    theme: &Theme,
    data: &StatusBarData,
) {
    let hints = match mode {
        InputMode::Normal | InputMode::VimInsert => {
            "[Enter] Send │ [/] Commands │ [@] Files │ [Esc] Cancel │ [Ctrl+C] Quit"
        }
        InputMode::VimNormal => "[i] Insert │ [/] Search │ [:] Command │ [q] Quit",
        InputMode::CommandPalette => "[↑↓] Navigate │ [Enter] Select │ [Esc] Close",
        InputMode::Autocomplete => "[↑↓] Navigate │ [Tab] Accept │ [Esc] Close",
        InputMode::Approval => "[y] Approve │ [n] Deny │ [d] Diff │ [?] Help",
    };

    // Build the metrics string for the right side
    let metrics = if data.context_window > 0 {
        format!(
            "{}/{} | ${:.4} ",
            format_tokens_compact(data.tokens_used),
            format_tokens_compact(data.context_window),
            data.cost_usd,
        )
    } else if data.tokens_used > 0 {
        format!(
            "{} | ${:.4} ",
            format_tokens_compact(data.tokens_used),
            data.cost_usd,
        )
    } else {
        String::new()
    };

    let mut left_spans = vec![
        Span::styled(
            format!(" {} ", mode.label()),
            theme
                .status_bar_style()
                .fg(theme.bg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ", theme.status_bar_style()),
    ];

    // Voice/meeting indicators
    if data.voice_active {
        left_spans.push(Span::styled(
            " MIC ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
        left_spans.push(Span::styled(" ", theme.status_bar_style()));
    }
    if data.meeting_active {
        left_spans.push(Span::styled(
            " REC ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));
        left_spans.push(Span::styled(" ", theme.status_bar_style()));
    }

    left_spans.push(Span::styled(hints, theme.status_bar_style()));

    let left_bar = Paragraph::new(Line::from(left_spans)).style(theme.status_bar_style());
    frame.render_widget(left_bar, area);

    // Render metrics right-aligned on top of the same area
    if !metrics.is_empty() {
        let right_bar = Paragraph::new(Line::from(Span::styled(
            metrics,
            theme.status_bar_style().add_modifier(Modifier::DIM),
        )))
        .alignment(Alignment::Right)
        .style(theme.status_bar_style());
        frame.render_widget(right_bar, area);
    }
}
