//! Surface observations: archive extraction, the external BUFR decoder, and report
//! collection.

use crate::decode::error::DecodeError;
use crate::decode::report_parser::parse_report;
use crate::types::download_task::DownloadTask;
use crate::types::observation::ObservationTable;
use async_compression::tokio::bufread::GzipDecoder;
use log::{debug, info, warn};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;

/// Decoder location used when the caller does not name one.
pub const DEFAULT_DECODER_EXE: &str = "rda-bufr-decode-ADPsfc/exe/bufrsurface.x";
/// Decoder configuration, relative to the directory above the executable's.
pub const DECODER_CONFIG: &str = "configs/bufrsurface_config_all";

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// `<exe dir>/../configs/bufrsurface_config_all`.
pub fn decoder_config_path(exe: &Path) -> PathBuf {
    exe.parent()
        .unwrap_or_else(|| Path::new("."))
        .join("..")
        .join(DECODER_CONFIG)
}

/// Unpacks a `.tar.gz` archive into `destination`, overwriting existing files.
pub async fn extract_archive(archive: &Path, destination: &Path) -> Result<(), DecodeError> {
    let extract_error = |e: std::io::Error| DecodeError::ArchiveExtract(archive.to_path_buf(), e);

    let file = fs::File::open(archive).await.map_err(extract_error)?;
    let mut decoder = GzipDecoder::new(BufReader::new(file));
    let mut tar_bytes = Vec::new();
    decoder
        .read_to_end(&mut tar_bytes)
        .await
        .map_err(extract_error)?;
    debug!("Decompressed {:?} to {} bytes", archive, tar_bytes.len());

    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || {
        tar::Archive::new(Cursor::new(tar_bytes)).unpack(&destination)
    })
    .await?
    .map_err(extract_error)
}

/// The `*.bufr` files directly inside `dir`, sorted by name.
pub async fn list_bufr_files(dir: &Path) -> Result<Vec<PathBuf>, DecodeError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| DecodeError::ArchiveExtract(dir.to_path_buf(), e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DecodeError::ArchiveExtract(dir.to_path_buf(), e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "bufr") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Runs `exe input <input>.txt config` and returns the report path.
///
/// A non-zero exit status is an error carrying the decoder's stderr.
pub async fn run_decoder(exe: &Path, input: &Path) -> Result<PathBuf, DecodeError> {
    let mut output_name = input.as_os_str().to_owned();
    output_name.push(".txt");
    let output_path = PathBuf::from(output_name);

    let output = Command::new(exe)
        .arg(input)
        .arg(&output_path)
        .arg(decoder_config_path(exe))
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| DecodeError::DecoderSpawn {
            exe: exe.to_path_buf(),
            file: input.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!("Decoder failed on {:?} with {}: {}", input, output.status, stderr);
        return Err(DecodeError::DecoderFailed {
            file: input.to_path_buf(),
            status: output.status,
            stderr,
        });
    }
    Ok(output_path)
}

/// Decodes every observation archive into one table, in task then file order.
pub async fn decode_obs(
    tasks: &[DownloadTask],
    archive_dir: &Path,
    decoder_exe: &Path,
) -> Result<ObservationTable, DecodeError> {
    let mut table = ObservationTable::default();
    for task in tasks {
        let Some(name) = task.file_name() else {
            debug!("Skipping {}, it has no file name", task.url);
            continue;
        };
        let archive = archive_dir.join(name);
        let unpacked = archive_dir.join(name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(name));
        extract_archive(&archive, &unpacked).await?;

        for bufr in list_bufr_files(&unpacked).await? {
            let report_path = run_decoder(decoder_exe, &bufr).await?;
            let text = fs::read_to_string(&report_path)
                .await
                .map_err(|e| DecodeError::ReportRead(report_path.clone(), e))?;
            let report = parse_report(&text, &report_path)?;
            debug!("{:?}: {} observations", report_path, report.height());
            table.append(&report)?;
        }
    }
    info!("Decoded {} observations from {} archives", table.height(), tasks.len());
    Ok(table)
}
