use std::collections::HashMap;

pub const RESET: &str = "\x1b[0m";

/// Colors handed out, in order, to tags that are not color names
const PALETTE: [&str; 6] = [
    "\x1b[36m", // Cyan
    "\x1b[33m", // Yellow
    "\x1b[35m", // Magenta
    "\x1b[32m", // Green
    "\x1b[34m", // Blue
    "\x1b[91m", // Bright red
];

fn named_color(tag: &str) -> Option<&'static str> {
    let code = match tag.to_ascii_lowercase().as_str() {
        "black" => "\x1b[30m",
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" | "purple" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        "white" => "\x1b[37m",
        "gray" | "grey" => "\x1b[90m",
        _ => return None,
    };
    Some(code)
}

/// Maps color tags to ANSI codes. Color names map to themselves; any other
/// tag (a service name, a level) gets the next palette entry the first time
/// it is seen and keeps it for the rest of the output.
#[derive(Debug, Default)]
pub struct ColorAllocator {
    assigned: HashMap<String, &'static str>,
    next: usize,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// ANSI code for `tag`, or `None` for the empty tag
    pub fn code_for(&mut self, tag: &str) -> Option<&'static str> {
        if tag.is_empty() {
            return None;
        }
        if let Some(code) = named_color(tag) {
            return Some(code);
        }
        if let Some(code) = self.assigned.get(tag) {
            return Some(code);
        }
        let code = PALETTE[self.next % PALETTE.len()];
        self.next += 1;
        self.assigned.insert(tag.to_string(), code);
        Some(code)
    }
}

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn resolve(self, is_terminal: bool) -> bool {
        match self {
            ColorChoice::Auto => is_terminal,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        let mut colors = ColorAllocator::new();
        assert_eq!(colors.code_for("red"), Some("\x1b[31m"));
        assert_eq!(colors.code_for("Grey"), Some("\x1b[90m"));
        assert_eq!(colors.code_for(""), None);
    }

    #[test]
    fn test_tags_keep_first_assigned_color() {
        let mut colors = ColorAllocator::new();
        let api = colors.code_for("api");
        let db = colors.code_for("db");
        assert_ne!(api, db);
        assert_eq!(colors.code_for("api"), api);
        assert_eq!(api, Some(PALETTE[0]));
        assert_eq!(db, Some(PALETTE[1]));
    }

    #[test]
    fn test_resolve_choice() {
        assert!(ColorChoice::Auto.resolve(true));
        assert!(!ColorChoice::Auto.resolve(false));
        assert!(ColorChoice::Always.resolve(false));
        assert!(!ColorChoice::Never.resolve(true));
    }
}
