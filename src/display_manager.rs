//! Picks the host the binary runs on
//!
//! The terminal host needs an interactive terminal on both ends; anything
//! else (pipes, CI, `--headless`) gets the headless host.

use crate::display_ratatui::TerminalHost;
use crate::error::{EngineError, EngineResult};
use crate::host::{HeadlessHost, Host};
use log::debug;

/// Host selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Terminal when interactive, headless otherwise
    #[default]
    Auto,
    /// Force the terminal host (fail if it can't start)
    Terminal,
    Headless,
}

impl DisplayMode {
    pub fn from_name(name: &str) -> Option<DisplayMode> {
        match name {
            "auto" => Some(DisplayMode::Auto),
            "terminal" | "ratatui" => Some(DisplayMode::Terminal),
            "headless" | "none" => Some(DisplayMode::Headless),
            _ => None,
        }
    }
}

/// Display environment capabilities
#[derive(Debug)]
pub struct DisplayCapabilities {
    pub has_terminal: bool,
    pub has_color: bool,
    pub is_interactive: bool,
}

impl DisplayCapabilities {
    pub fn detect() -> Self {
        Self {
            has_terminal: atty::is(atty::Stream::Stdout),
            has_color: std::env::var("COLORTERM").is_ok()
                || std::env::var("TERM").map_or(false, |t| t.contains("color")),
            is_interactive: atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout),
        }
    }

    pub fn supports_terminal(&self) -> bool {
        self.has_terminal && self.is_interactive
    }
}

/// Create the host for `mode`, falling back to headless in `Auto`
///
/// Returns the host with the mode it ended up in, `Terminal` or `Headless`.
pub fn create_host(mode: DisplayMode) -> EngineResult<(Box<dyn Host>, DisplayMode)> {
    let caps = DisplayCapabilities::detect();
    debug!("Display capabilities: {:?}", caps);
    choose_host(mode, &caps, || {
        TerminalHost::new().map(|host| Box::new(host) as Box<dyn Host>)
    })
}

fn headless() -> (Box<dyn Host>, DisplayMode) {
    (Box::new(HeadlessHost::new()), DisplayMode::Headless)
}

fn choose_host<F>(
    mode: DisplayMode,
    caps: &DisplayCapabilities,
    terminal: F,
) -> EngineResult<(Box<dyn Host>, DisplayMode)>
where
    F: FnOnce() -> EngineResult<Box<dyn Host>>,
{
    match mode {
        DisplayMode::Headless => {
            debug!("Using headless host");
            Ok(headless())
        }
        DisplayMode::Terminal => {
            if !caps.supports_terminal() {
                return Err(EngineError::Display(
                    "terminal host needs an interactive terminal".to_string(),
                ));
            }
            Ok((terminal()?, DisplayMode::Terminal))
        }
        DisplayMode::Auto => {
            if !caps.supports_terminal() {
                debug!("No interactive terminal, using headless host");
                return Ok(headless());
            }
            match terminal() {
                Ok(host) => Ok((host, DisplayMode::Terminal)),
                Err(e) => {
                    debug!("Terminal host failed ({}), falling back to headless", e);
                    Ok(headless())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn caps(interactive: bool) -> DisplayCapabilities {
        DisplayCapabilities {
            has_terminal: interactive,
            has_color: true,
            is_interactive: interactive,
        }
    }

    fn failing() -> EngineResult<Box<dyn Host>> {
        Err(EngineError::Display("no tty".to_string()))
    }

    #[test]
    fn test_auto_falls_back_to_headless() {
        let (_, mode) = choose_host(DisplayMode::Auto, &caps(true), failing).unwrap();
        assert_eq!(mode, DisplayMode::Headless);
        let (_, mode) = choose_host(DisplayMode::Auto, &caps(false), failing).unwrap();
        assert_eq!(mode, DisplayMode::Headless);
    }

    #[test]
    fn test_auto_prefers_terminal() {
        let terminal = || Ok(Box::new(HeadlessHost::new()) as Box<dyn Host>);
        let (_, mode) = choose_host(DisplayMode::Auto, &caps(true), terminal).unwrap();
        assert_eq!(mode, DisplayMode::Terminal);
    }

    #[test]
    fn test_forced_terminal_reports_failure() {
        let err = choose_host(DisplayMode::Terminal, &caps(false), failing).err();
        assert!(matches!(err, Some(EngineError::Display(_))));
        assert!(choose_host(DisplayMode::Terminal, &caps(true), failing).is_err());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(DisplayMode::from_name("ratatui"), Some(DisplayMode::Terminal));
        assert_eq!(DisplayMode::from_name("headless"), Some(DisplayMode::Headless));
        assert_eq!(DisplayMode::from_name("vga"), None);
    }
}
