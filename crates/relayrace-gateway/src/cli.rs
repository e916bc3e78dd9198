//! Execução de comandos externos com captura de stdout/stderr.

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Saída capturada de um comando que terminou com status zero
#[derive(Debug, Clone)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Falha de execução de um comando externo, preservando a saída capturada
/// para que o chamador possa classificar diagnósticos
#[derive(Debug, Error)]
pub enum CliError {
    #[error("falha ao iniciar '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("comando '{program}' terminou com status {status}\nstdout: {stdout}\nstderr: {stderr}")]
    NonZero {
        program: String,
        status: i32,
        stdout: String,
        stderr: String,
    },
}

/// Executa um comando e retorna stdout/stderr aparados.
pub async fn run_command(
    log_invocation: bool,
    program: &str,
    args: &[String],
) -> Result<CliOutput, CliError> {
    if log_invocation {
        debug!(program, args = %args.join(" "), "executando comando");
    }

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| CliError::Spawn {
            program: program.to_string(),
            source: e,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(CliError::NonZero {
            program: program.to_string(),
            status: output.status.code().unwrap_or(-1),
            stdout,
            stderr,
        });
    }

    Ok(CliOutput { stdout, stderr })
}
