//! Custom theme for cliclack prompts

use crate::gaps::ScoreRating;
use cliclack::ThemeState;
use console::Style;

/// reelgap's theme with magenta branding
#[derive(Debug, Clone, Default)]
pub struct ReelgapTheme;

impl cliclack::Theme for ReelgapTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().magenta(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().magenta().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().magenta(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Initialize the global theme
pub fn init_theme() {
    cliclack::set_theme(ReelgapTheme);
}

/// Color for a completion score
pub fn score_style(score: f64) -> Style {
    match ScoreRating::for_score(score) {
        ScoreRating::Good => Style::new().green(),
        ScoreRating::Warning => Style::new().yellow(),
        ScoreRating::Bad => Style::new().red(),
    }
}
