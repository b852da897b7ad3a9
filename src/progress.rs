//! Installation progress reporting.
//!
//! Installers never print on their own. They drive an [`InstallCallback`]
//! with status lines and item counts, sequentially, from the task that
//! started the installation.

use std::io::{self, Stdout, Write};

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver of installer notifications.
pub trait InstallCallback {
    /// A new human-readable status line.
    fn on_status(&mut self, status: &str) -> io::Result<()>;
    /// Number of items finished in the current phase.
    fn on_progress(&mut self, progress: i64) -> io::Result<()>;
    /// Item count of the phase that just started.
    fn on_max(&mut self, max: i64) -> io::Result<()>;
}

/// Plain text reporter: status lines verbatim, progress as `done/max`.
///
/// Progress is silent while the maximum is zero, which is also the state
/// before the first [`InstallCallback::on_max`]. Any other maximum,
/// negative included, is printed as given.
#[derive(Debug)]
pub struct ConsoleReporter<W = Stdout> {
    output: W,
    maximum: i64,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(output: W) -> Self {
        Self { output, maximum: 0 }
    }

    pub fn maximum(&self) -> i64 {
        self.maximum
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> InstallCallback for ConsoleReporter<W> {
    fn on_status(&mut self, status: &str) -> io::Result<()> {
        writeln!(self.output, "{status}")
    }

    fn on_progress(&mut self, progress: i64) -> io::Result<()> {
        if self.maximum == 0 {
            return Ok(());
        }
        writeln!(self.output, "{}/{}", progress, self.maximum)
    }

    fn on_max(&mut self, max: i64) -> io::Result<()> {
        self.maximum = max;
        Ok(())
    }
}

/// Reporter drawing an `indicatif` bar instead of text lines.
pub struct BarReporter {
    pb: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("{msg:30} [{wide_bar:.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallCallback for BarReporter {
    fn on_status(&mut self, status: &str) -> io::Result<()> {
        self.pb.set_message(status.to_owned());
        Ok(())
    }

    fn on_progress(&mut self, progress: i64) -> io::Result<()> {
        self.pb.set_position(progress.max(0) as u64);
        Ok(())
    }

    fn on_max(&mut self, max: i64) -> io::Result<()> {
        self.pb.set_length(max.max(0) as u64);
        self.pb.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(reporter: ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn progress_after_max_prints_ratio() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_max(10).unwrap();
        reporter.on_progress(3).unwrap();
        assert_eq!(output(reporter), "3/10\n");
    }

    #[test]
    fn progress_without_max_is_silent() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_progress(5).unwrap();
        assert_eq!(reporter.maximum(), 0);
        assert_eq!(output(reporter), "");
    }

    #[test]
    fn zero_max_suppresses_progress() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_max(4).unwrap();
        reporter.on_max(0).unwrap();
        for progress in [0, 1, 100, -1] {
            reporter.on_progress(progress).unwrap();
        }
        assert_eq!(output(reporter), "");
    }

    #[test]
    fn every_progress_in_range_is_printed_verbatim() {
        for max in [1, 7, 250] {
            let mut reporter = ConsoleReporter::new(Vec::new());
            reporter.on_max(max).unwrap();
            for progress in 0..=max {
                reporter.on_progress(progress).unwrap();
            }
            let expected: String = (0..=max).map(|p| format!("{p}/{max}\n")).collect();
            assert_eq!(output(reporter), expected);
        }
    }

    #[test]
    fn last_max_wins() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_max(10).unwrap();
        reporter.on_max(20).unwrap();
        reporter.on_progress(3).unwrap();
        assert_eq!(output(reporter), "3/20\n");
    }

    #[test]
    fn negative_max_is_kept() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_max(-2).unwrap();
        reporter.on_progress(1).unwrap();
        assert_eq!(output(reporter), "1/-2\n");
    }

    #[test]
    fn status_is_verbatim() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_status("Installing").unwrap();
        assert_eq!(output(reporter), "Installing\n");
    }

    #[test]
    fn reporters_do_not_share_state() {
        let mut first = ConsoleReporter::new(Vec::new());
        first.on_max(10).unwrap();
        let mut second = ConsoleReporter::new(Vec::new());
        second.on_progress(3).unwrap();
        assert_eq!(output(second), "");
    }

    #[test]
    fn bar_follows_max_and_progress() {
        let mut reporter = BarReporter::new();
        reporter.on_status("Download Libraries").unwrap();
        reporter.on_max(10).unwrap();
        reporter.on_progress(3).unwrap();
        assert_eq!(reporter.pb.message(), "Download Libraries");
        assert_eq!(reporter.pb.length(), Some(10));
        assert_eq!(reporter.pb.position(), 3);

        reporter.on_max(4).unwrap();
        assert_eq!(reporter.pb.length(), Some(4));
        assert_eq!(reporter.pb.position(), 0);

        reporter.on_progress(-5).unwrap();
        assert_eq!(reporter.pb.position(), 0);
        reporter.on_max(-1).unwrap();
        assert_eq!(reporter.pb.length(), Some(0));
        reporter.finish();
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_returned() {
        let mut reporter = ConsoleReporter::new(BrokenPipe);
        let err = reporter.on_status("Installing").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
