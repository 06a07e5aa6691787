use crate::config::ColorMode;
use std::io::IsTerminal;

/// Check if stdout is connected to a TTY
pub fn is_stdout_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stdin is connected to a TTY
pub fn is_stdin_tty() -> bool {
    std::io::stdin().is_terminal()
}

/// Determine if colors should be used based on CLI color mode and environment
pub fn should_use_colors_with_mode(color_mode: &ColorMode) -> bool {
    let no_color = std::env::var_os("NO_COLOR").is_some();
    let force_color = std::env::var_os("FORCE_COLOR").is_some();
    colors_enabled(color_mode, is_stdout_tty(), no_color, force_color)
}

/// NO_COLOR wins over everything, including `--force-color`
fn colors_enabled(color_mode: &ColorMode, tty: bool, no_color: bool, force_color: bool) -> bool {
    if no_color {
        return false;
    }
    match color_mode {
        ColorMode::Never => false,
        ColorMode::Always => true,
        ColorMode::Auto => tty || force_color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_decision() {
        assert!(colors_enabled(&ColorMode::Auto, true, false, false));
        assert!(!colors_enabled(&ColorMode::Auto, false, false, false));
        assert!(colors_enabled(&ColorMode::Auto, false, false, true));
        assert!(!colors_enabled(&ColorMode::Auto, true, true, false));

        assert!(colors_enabled(&ColorMode::Always, false, false, false));
        assert!(!colors_enabled(&ColorMode::Always, false, true, false));

        assert!(!colors_enabled(&ColorMode::Never, true, false, true));
    }
}
