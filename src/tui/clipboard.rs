use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

/// How long a clipboard owner stays alive after a write. X11 and Wayland serve
/// the selection from the owning process, so dropping it at once loses the text.
const HOLD_FOR: Duration = Duration::from_secs(2);

static CLIPBOARD: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

fn clipboard_worker() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                match arboard::Clipboard::new() {
                    Ok(mut cb) => match cb.set_text(text) {
                        Ok(()) => std::thread::sleep(HOLD_FOR),
                        Err(e) => tracing::warn!(error = %e, "clipboard write failed"),
                    },
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });
        tx
    })
}

/// Queue `text` for the clipboard without blocking the render loop.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_worker()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard worker stopped"))
}
