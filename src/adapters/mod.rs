// Adapters - External system implementations

use std::path::Path;

pub mod exec_ffmpeg;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod probe_ffprobe;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FfmpegCutAdapter;
#[cfg(feature = "libav")]
pub use probe_libav::LibavProbeAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use toml_config::{ProbeBackend, Settings};
pub use tracing_log::init_tracing;

/// Command for an external tool
///
/// On Unix the child gets its own process group so a terminal Ctrl-C only
/// reaches vtrim, which then lets the running cut finish. On Windows no
/// console window is opened.
pub(crate) fn tool_command(program: &Path) -> tokio::process::Command {
    let mut command = tokio::process::Command::new(program);
    #[cfg(unix)]
    {
        command.process_group(0);
    }
    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }
    command.kill_on_drop(true);
    command
}
