use std::fmt::{self, Display};

use color_eyre::owo_colors::OwoColorize;

pub mod buf;

/// Coloured status dot for terminal output.
pub struct ColourDot(pub bool);

impl Display for ColourDot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let char = '●';

        if self.0 {
            write!(f, "{}", char.bright_green())
        } else {
            write!(f, "{}", char.bright_red())
        }
    }
}
