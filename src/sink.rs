use std::io::{self, Write};

/// Receives what the generation loop wants the user to see.
pub trait PresentationSink {
    /// Replaces the displayed content with `text`.
    fn show_text(&mut self, text: &str);

    /// Asks the user to acknowledge invalid input.
    fn show_warning(&mut self, title: &str, message: &str);

    /// Appends a failure notice below whatever is displayed.
    fn show_failure(&mut self, message: &str);
}

/// Sink that prints to a pair of writers, stdout and stderr by default.
pub struct ConsoleSink<O: Write, E: Write> {
    out: O,
    err: E,
    updates: usize,
}

impl ConsoleSink<io::Stdout, io::Stderr> {
    /// Prints updates to stdout and notices to stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    /// Creates a sink over arbitrary writers.
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            updates: 0,
        }
    }

    /// Number of times the displayed content was replaced.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Returns the underlying writers.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> PresentationSink for ConsoleSink<O, E> {
    fn show_text(&mut self, text: &str) {
        self.updates += 1;
        let result = writeln!(self.out, "--- revision {} ---", self.updates)
            .and_then(|_| writeln!(self.out, "{}", text))
            .and_then(|_| self.out.flush());
        if let Err(err) = result {
            log::error!("Failed to write output: {}", err);
        }
    }

    fn show_warning(&mut self, title: &str, message: &str) {
        if let Err(err) = writeln!(self.err, "{}: {}", title, message) {
            log::error!("Failed to write warning: {}", err);
        }
    }

    fn show_failure(&mut self, message: &str) {
        if let Err(err) = writeln!(self.err, "{}", message) {
            log::error!("Failed to write failure: {}", err);
        }
    }
}
