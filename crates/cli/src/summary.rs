use std::fmt::Write;

use playlist_dl_core::BatchResult;

/// Renders the end-of-run report.
pub fn render(result: &BatchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Download complete");
    let _ = writeln!(out, "  Succeeded: {}", result.succeeded);
    let _ = writeln!(out, "  Failed:    {}", result.failed);
    let _ = writeln!(out, "  Saved to:  {}", result.destination.display());

    if !result.failures.is_empty() {
        let _ = writeln!(out, "Failures:");
        for failure in &result.failures {
            let _ = writeln!(
                out,
                "  #{} {}: {}",
                failure.index + 1,
                failure.id,
                failure.reason
            );
        }
    }

    out
}
