use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use weather_core::{Notifier, Region, Surface, ToastLevel};

/// Stdout as a display surface. Only the configured sections exist.
#[derive(Debug)]
pub struct TerminalSurface {
    sections: Vec<Region>,
    dark: Arc<AtomicBool>,
}

impl TerminalSurface {
    pub fn new(sections: Vec<Region>, dark: Arc<AtomicBool>) -> Self {
        Self { sections, dark }
    }

    fn heading(&self, region: Region) -> String {
        let title = match region {
            Region::Current => "Current conditions",
            Region::Hourly => "Next hours",
            Region::Daily => "Next days",
            Region::AirQuality => "Air quality",
        };
        // bright white on dark backgrounds, black on light ones
        let style = if self.dark.load(Ordering::Relaxed) { "1;97" } else { "1;30" };
        format!("\x1b[{style}m── {title} {}\x1b[0m", "─".repeat(40 - title.chars().count().min(40)))
    }
}

impl Surface for TerminalSurface {
    fn regions(&self) -> Vec<Region> {
        self.sections.clone()
    }

    fn write(&mut self, region: Region, content: &str) {
        println!("{}", self.heading(region));
        println!("{content}");
        println!();
    }
}

/// Toasts on stderr so they never interleave with rendered sections.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show(&self, message: &str, level: ToastLevel) {
        let marker = match level {
            ToastLevel::Info => "ℹ",
            ToastLevel::Success => "✔",
            ToastLevel::Error => "✖",
        };
        eprintln!("{marker} {message}");
    }

    fn set_busy(&self, busy: bool) {
        if busy {
            eprintln!("⏳ Loading...");
        }
    }
}
