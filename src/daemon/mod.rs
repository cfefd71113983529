use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::thread;
use tracing::{error, info};

use crate::config::Config;
use crate::ipc::{DaemonCommand, DaemonResponse, DaemonStatus};
use crate::platform;
use crate::publisher::{InfoCenter, NowPlayingPublisher};

pub struct Daemon {
    config: Config,
}

/// Everything the accept loop owns. The publisher is the only writer to the
/// process-wide now playing slot.
struct DaemonState {
    publisher: NowPlayingPublisher<Box<dyn InfoCenter>>,
    publishes: u64,
    running: bool,
}

impl Daemon {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn run(&self) -> Result<()> {
        use interprocess::local_socket::prelude::*;
        use interprocess::local_socket::{GenericFilePath, ListenerOptions};

        let center = platform::info_center(&self.config)?;
        let mut state = DaemonState::new(NowPlayingPublisher::new(center));

        let socket_path = self.config.socket_path();

        // Remove stale socket
        if socket_path.exists() {
            fs::remove_file(&socket_path)?;
        }

        let name = socket_path.as_os_str().to_fs_name::<GenericFilePath>()?;
        let listener = ListenerOptions::new()
            .name(name)
            .create_sync()
            .with_context(|| "Failed to create socket listener")?;

        // Only a daemon that is actually listening advertises a pid.
        let pid_path = self.config.pid_path();
        fs::write(&pid_path, std::process::id().to_string())?;

        info!("Daemon started, listening on {}", socket_path.display());

        while state.running {
            match listener.accept() {
                Ok(conn) => {
                    if let Err(e) = handle_connection(conn, &mut state) {
                        error!("Connection error: {e}");
                    }
                }
                Err(e) => {
                    if state.running {
                        error!("Accept error: {e}");
                    }
                }
            }
        }

        let _ = fs::remove_file(&socket_path);
        let _ = fs::remove_file(&pid_path);

        info!("Daemon stopped");
        Ok(())
    }

    pub fn start_detached(config: &Config, config_path: &Path) -> Result<()> {
        use std::process::Command;

        let socket_path = config.socket_path();
        if socket_path.exists() {
            let client = crate::ipc::DaemonClient::new(&socket_path);
            if client.is_daemon_running() {
                anyhow::bail!("Daemon is already running");
            }
            fs::remove_file(&socket_path)?;
        }

        let exe = std::env::current_exe()?;

        let mut command = Command::new(&exe);
        command
            .arg("daemon")
            .arg("run")
            .env("NOWPLAYING_CONFIG", config_path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command
            .spawn()
            .with_context(|| "Failed to start daemon")?;

        for _ in 0..50 {
            if socket_path.exists() {
                return Ok(());
            }
            thread::sleep(std::time::Duration::from_millis(100));
        }

        anyhow::bail!("Daemon failed to start")
    }

    pub fn stop(config: &Config) -> Result<()> {
        let client = crate::ipc::DaemonClient::new(config.socket_path());
        if client.is_daemon_running() {
            client.shutdown()?;
            for _ in 0..50 {
                if !config.socket_path().exists() {
                    return Ok(());
                }
                thread::sleep(std::time::Duration::from_millis(100));
            }
        }
        Ok(())
    }

    pub fn is_running(config: &Config) -> bool {
        let client = crate::ipc::DaemonClient::new(config.socket_path());
        client.is_daemon_running()
    }
}

impl DaemonState {
    fn new(publisher: NowPlayingPublisher<Box<dyn InfoCenter>>) -> Self {
        Self {
            publisher,
            publishes: 0,
            running: true,
        }
    }

    fn handle_command(&mut self, command: DaemonCommand) -> DaemonResponse {
        match command {
            DaemonCommand::Publish { metadata } => {
                self.publisher.publish(&metadata);
                self.publishes += 1;
                info!("Now playing: {}", metadata.display_name());
                DaemonResponse::Ok
            }
            DaemonCommand::Clear => {
                self.publisher.clear();
                self.publishes += 1;
                info!("Now playing cleared");
                DaemonResponse::Ok
            }
            DaemonCommand::GetStatus => DaemonResponse::Status(DaemonStatus {
                pid: std::process::id(),
                backend: self.publisher.backend().to_string(),
                publishes: self.publishes,
            }),
            DaemonCommand::Shutdown => {
                self.running = false;
                DaemonResponse::Ok
            }
        }
    }
}

fn handle_connection(
    conn: interprocess::local_socket::Stream,
    state: &mut DaemonState,
) -> Result<()> {
    serve_request(BufReader::new(&conn), &conn, state)
}

/// Answer one newline-terminated command. Malformed input gets an error
/// response rather than dropping the connection.
fn serve_request(
    mut reader: impl BufRead,
    mut writer: impl Write,
    state: &mut DaemonState,
) -> Result<()> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let response = match serde_json::from_str::<DaemonCommand>(&line) {
        Ok(command) => state.handle_command(command),
        Err(e) => DaemonResponse::Error(format!("Invalid command: {e}")),
    };

    let response_json = serde_json::to_string(&response)?;
    writeln!(writer, "{response_json}")?;
    writer.flush()?;

    Ok(())
}
