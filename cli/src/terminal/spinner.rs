use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

static SPINNER: OnceLock<ProgressBar> = OnceLock::new();

fn get_spinner() -> &'static ProgressBar {
    SPINNER.get_or_init(init_spinner)
}

fn init_spinner() -> ProgressBar {
    let pb = ProgressBar::hidden();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["▁▂▃", "▂▃▅", "▃▅▇", "▅▇█", "▃▅▇", "▂▃▅", "▁▂▃"]);
    pb.set_style(style);
    pb
}

/// Shows the spinner while a scan of `duration` runs, counting down the
/// remaining seconds until [`stop`] is called.
pub fn start(label: &str, duration: Duration) {
    let pb = get_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(countdown(label, duration));

    let pb = pb.clone();
    let label = label.to_string();
    let started = Instant::now();
    thread::spawn(move || {
        loop {
            thread::sleep(COUNTDOWN_STEP);
            if pb.is_finished() || pb.is_hidden() {
                break;
            }
            let left = duration.saturating_sub(started.elapsed());
            if left.is_zero() {
                pb.set_message(format!("{}", "Importing the scan result...".italic()));
                break;
            }
            pb.set_message(countdown(&label, left));
        }
    });
}

fn countdown(label: &str, left: Duration) -> String {
    format!("{label}, about {} seconds left...", left.as_secs())
}

pub fn stop() {
    if let Some(pb) = SPINNER.get() {
        pb.finish_and_clear();
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
}

fn println(msg: &str) {
    let pb = get_spinner();
    if pb.is_hidden() {
        eprintln!("{msg}");
    } else {
        pb.println(msg);
    }
}

/// Routes log lines above the spinner while it is visible.
pub struct SpinnerWriter;

impl std::io::Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        println(msg.trim_end());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
