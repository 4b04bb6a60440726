//! # External Optimizer Adapter Module
//!
//! Questo modulo modella l'ottimizzatore raster esterno come capability
//! iniettabile, così il motore di ricerca non dipende mai dal binario.
//!
//! ## Responsabilità:
//! - Trait `RasterOptimizer`: "comprimi questo file, eventualmente in modo
//!   lossy, e riporta la dimensione risultante"
//! - Implementazione `Gifsicle` basata su `tokio::process`
//! - Controllo disponibilità dell'eseguibile
//!
//! ## Contratto con il processo esterno:
//! - Viene sempre richiesto il massimo livello di ottimizzazione (`-O3`)
//! - `--lossy=N` solo quando il chiamante passa un livello di quality loss
//! - Solo l'exit status e il file prodotto fanno fede; stdout/stderr non
//!   vengono mai interpretati come dati

use crate::error::CompressError;
use crate::file_manager::FileManager;
use crate::platform::PlatformCommands;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Injected capability: lossy-capable raster optimization of a GIF file.
///
/// Object-safe so the search engine can hold `Arc<dyn RasterOptimizer>`
/// and tests can substitute an in-process fake.
pub trait RasterOptimizer: Send + Sync {
    /// Verify that the optimizer can actually run in this environment
    fn check_available(&self) -> BoxFuture<'_, Result<(), CompressError>>;

    /// Optimize `input` into `output` at maximum effort, with an optional
    /// quality-loss level (higher = more loss, smaller file). Returns the
    /// resulting size in KB.
    fn optimize<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
        lossy: Option<u32>,
    ) -> BoxFuture<'a, Result<f64, CompressError>>;
}

/// Production adapter around the `gifsicle` executable
#[derive(Debug, Default)]
pub struct Gifsicle;

impl Gifsicle {
    fn build_args(input: &Path, output: &Path, lossy: Option<u32>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-O3".into(),
            "--no-warnings".into(),
            "--no-conserve-memory".into(),
            "--no-comments".into(),
            "--no-names".into(),
        ];

        match lossy {
            Some(level) => args.push(format!("--lossy={level}").into()),
            // Lossless-relative runs can afford the slower, safer path
            None => args.push("--careful".into()),
        }

        args.push(input.as_os_str().to_os_string());
        args.push("-o".into());
        args.push(output.as_os_str().to_os_string());
        args
    }
}

impl RasterOptimizer for Gifsicle {
    fn check_available(&self) -> BoxFuture<'_, Result<(), CompressError>> {
        Box::pin(async {
            let platform = PlatformCommands::instance();
            if platform.is_command_available("gifsicle").await {
                Ok(())
            } else {
                Err(CompressError::MissingDependency(
                    "gifsicle is required for GIF compression. Please install it.".to_string(),
                ))
            }
        })
    }

    fn optimize<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
        lossy: Option<u32>,
    ) -> BoxFuture<'a, Result<f64, CompressError>> {
        Box::pin(async move {
            let platform = PlatformCommands::instance();
            let gifsicle_cmd = platform.get_command("gifsicle");
            let args = Self::build_args(input, output, lossy);

            debug!(
                "Running {} on {} (lossy: {:?})",
                gifsicle_cmd,
                input.display(),
                lossy
            );

            let result = Command::new(gifsicle_cmd).args(&args).output().await;

            let command_output = match result {
                Ok(command_output) => command_output,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(CompressError::MissingDependency(
                        "gifsicle not found on PATH".to_string(),
                    ));
                }
                Err(e) => return Err(CompressError::Io(e)),
            };

            if !command_output.status.success() {
                return Err(CompressError::ExternalTool(
                    String::from_utf8_lossy(&command_output.stderr)
                        .trim()
                        .to_string(),
                ));
            }

            FileManager::file_size_kb(output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossless_args() {
        let args = Gifsicle::build_args(Path::new("in.gif"), Path::new("out.gif"), None);

        assert_eq!(args[0], OsString::from("-O3"));
        assert!(args.contains(&OsString::from("--careful")));
        assert!(!args.iter().any(|a| a.to_string_lossy().starts_with("--lossy")));
        // Input precedes the output flag
        let input_pos = args.iter().position(|a| a == "in.gif").unwrap();
        let o_pos = args.iter().position(|a| a == "-o").unwrap();
        assert!(input_pos < o_pos);
        assert_eq!(args.last().unwrap(), &OsString::from("out.gif"));
    }

    #[test]
    fn test_lossy_args() {
        let args = Gifsicle::build_args(Path::new("in.gif"), Path::new("out.gif"), Some(90));

        assert!(args.contains(&OsString::from("--lossy=90")));
        assert!(!args.contains(&OsString::from("--careful")));
    }
}
